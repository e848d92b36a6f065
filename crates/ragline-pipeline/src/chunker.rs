//! Overlapping fixed-size text chunking

use ragline_core::{Error, Result};

/// Split `text` into overlapping windows of `size` characters, advancing the
/// window start by `size - overlap` each step. The final window may be
/// shorter than `size`. Empty text yields an empty vector.
///
/// Windows are measured in Unicode scalar values, not bytes, so multi-byte
/// text chunks cleanly. Pure function of its inputs: re-chunking identical
/// input yields identical output.
///
/// Fails with `Error::Validation` when `size == 0` or `overlap >= size`
/// (the window would stop advancing).
pub fn chunk(text: &str, size: usize, overlap: usize) -> Result<Vec<String>> {
    if size == 0 {
        return Err(Error::Validation("chunk size must be positive".to_string()));
    }
    if overlap >= size {
        return Err(Error::Validation(format!(
            "chunk overlap {overlap} must be smaller than chunk size {size}"
        )));
    }

    let chars: Vec<char> = text.chars().collect();
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        start += size - overlap;
    }
    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_advance_by_size_minus_overlap() {
        let text: String = ('a'..='z').cycle().take(1200).collect();
        let chunks = chunk(&text, 500, 100).unwrap();

        assert_eq!(chunks.len(), 3);
        let chars: Vec<char> = text.chars().collect();
        let expected: Vec<String> = [(0usize, 500usize), (400, 900), (800, 1200)]
            .iter()
            .map(|&(s, e)| chars[s..e].iter().collect())
            .collect();
        assert_eq!(chunks, expected);
    }

    #[test]
    fn last_chunk_ends_exactly_at_text_end() {
        let text = "0123456789";
        let chunks = chunk(text, 4, 1).unwrap();
        // starts 0, 3, 6, 9
        assert_eq!(chunks, vec!["0123", "3456", "6789", "9"]);
        assert!(text.ends_with(chunks.last().unwrap()));
    }

    #[test]
    fn zero_overlap_produces_disjoint_windows() {
        let chunks = chunk("abcdefgh", 3, 0).unwrap();
        assert_eq!(chunks, vec!["abc", "def", "gh"]);
        assert_eq!(chunks.concat(), "abcdefgh");
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(chunk("", 500, 100).unwrap().is_empty());
    }

    #[test]
    fn rechunking_is_idempotent() {
        let text = "the quick brown fox jumps over the lazy dog";
        let first = chunk(text, 10, 3).unwrap();
        let second = chunk(text, 10, 3).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn multibyte_text_chunks_on_character_boundaries() {
        let text = "αβγδε";
        let chunks = chunk(text, 2, 1).unwrap();
        assert_eq!(chunks, vec!["αβ", "βγ", "γδ", "δε", "ε"]);
    }

    #[test]
    fn non_advancing_parameters_fail_fast() {
        assert!(matches!(chunk("text", 0, 0), Err(Error::Validation(_))));
        assert!(matches!(chunk("text", 5, 5), Err(Error::Validation(_))));
        assert!(matches!(chunk("text", 5, 9), Err(Error::Validation(_))));
    }
}
