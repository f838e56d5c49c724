use crate::error::IngestError;

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_OVERLAP: usize = 50;

/// Sliding word-window parameters. `chunk_size` and `overlap` count
/// whitespace-delimited tokens, not characters.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

impl ChunkingConfig {
    /// The window must advance: `overlap >= chunk_size` would loop forever.
    pub fn validate(&self) -> Result<(), IngestError> {
        if self.chunk_size == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "chunk_size must be positive".to_string(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap {} must be smaller than chunk_size {}",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }

    pub fn step(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

/// Splits text into overlapping windows of `chunk_size` words, each window
/// advancing by `chunk_size - overlap` words. A text shorter than one window
/// yields exactly one chunk; whitespace-only windows are dropped. Purely a
/// function of its inputs.
pub fn chunk_text(text: &str, config: ChunkingConfig) -> Result<Vec<String>, IngestError> {
    config.validate()?;

    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Ok(Vec::new());
    }

    let mut chunks = Vec::new();
    let mut start = 0;
    while start < words.len() {
        let end = (start + config.chunk_size).min(words.len());
        let window = words[start..end].join(" ");
        if !window.trim().is_empty() {
            chunks.push(window);
        }
        if end == words.len() {
            break;
        }
        start += config.step();
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(chunk_size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig {
            chunk_size,
            overlap,
        }
    }

    #[test]
    fn overlap_equal_to_chunk_size_is_rejected() {
        let result = chunk_text("a b c", config(4, 4));
        assert!(matches!(result, Err(IngestError::InvalidChunkConfig(_))));
    }

    #[test]
    fn overlap_larger_than_chunk_size_is_rejected() {
        let result = chunk_text("a b c", config(4, 9));
        assert!(matches!(result, Err(IngestError::InvalidChunkConfig(_))));
    }

    #[test]
    fn short_text_yields_a_single_chunk_with_all_tokens() {
        let chunks = chunk_text("Topic: Cats. Cats are mammals.", ChunkingConfig::default())
            .expect("valid config");
        assert_eq!(chunks, vec!["Topic: Cats. Cats are mammals.".to_string()]);
    }

    #[test]
    fn windows_cover_every_token_in_order_and_overlap_exactly() {
        let words: Vec<String> = (0..25).map(|n| format!("w{n}")).collect();
        let text = words.join(" ");
        let chunks = chunk_text(&text, config(10, 3)).expect("valid config");

        // Step is 7, so windows start at 0, 7, 14, 21.
        assert_eq!(chunks.len(), 4);
        for (index, chunk) in chunks.iter().enumerate() {
            let tokens: Vec<&str> = chunk.split(' ').collect();
            assert_eq!(tokens[0], format!("w{}", index * 7));
        }

        // Adjacent windows share exactly `overlap` tokens.
        let first: Vec<&str> = chunks[0].split(' ').collect();
        let second: Vec<&str> = chunks[1].split(' ').collect();
        assert_eq!(&first[7..], &second[..3]);

        // Every token appears.
        let joined = chunks.join(" ");
        for word in &words {
            assert!(joined.contains(word.as_str()));
        }
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "one two three four five six seven eight nine ten";
        let first = chunk_text(text, config(4, 1)).expect("valid config");
        let second = chunk_text(text, config(4, 1)).expect("valid config");
        assert_eq!(first, second);
    }

    #[test]
    fn whitespace_only_text_yields_no_chunks() {
        let chunks = chunk_text("  \n\t ", ChunkingConfig::default()).expect("valid config");
        assert!(chunks.is_empty());
    }
}
