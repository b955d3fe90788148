use fancy_regex::Regex;
use lazy_static::lazy_static;
use tracing::debug;

use crate::base::{Id, Tokenizer};
use crate::counts::count_tokens;
use crate::error::{Error, Result};
use crate::vocabulary::VocabularyTable;

pub const GPT4_SPLIT_PATTERN: &str = r"'(?i:[sdmt]|ll|ve|re)|[^\r\n\p{L}\p{N}]?+\p{L}+|\p{N}{1,3}| ?[^\s\p{L}\p{N}]++[\r\n]*|\s*[\r\n]|\s+(?!\S)|\s+";

lazy_static! {
    static ref GPT4_SPLIT_COMPILED_PATTERN: Regex =
        Regex::new(GPT4_SPLIT_PATTERN).expect("GPT-4 split pattern is valid");
}

/// Splits text into chunks with a regex and maps every chunk through a
/// [`VocabularyTable`].
#[derive(Debug, Clone)]
pub struct RegexTokenizer {
    vocab: VocabularyTable,
    pattern: Regex,
}

impl RegexTokenizer {
    pub fn new() -> Self {
        Self::with_vocabulary(VocabularyTable::new())
    }

    pub fn with_vocabulary(vocab: VocabularyTable) -> Self {
        RegexTokenizer {
            vocab,
            pattern: GPT4_SPLIT_COMPILED_PATTERN.clone(),
        }
    }

    /// Uses `pattern` instead of the GPT-4 split pattern.
    pub fn with_pattern(vocab: VocabularyTable, pattern: &str) -> Result<Self> {
        Ok(RegexTokenizer {
            vocab,
            pattern: Regex::new(pattern)?,
        })
    }

    pub fn vocabulary(&self) -> &VocabularyTable {
        &self.vocab
    }

    pub fn into_vocabulary(self) -> VocabularyTable {
        self.vocab
    }

    /// Chunks of `text` as borrowed slices, in order.
    pub fn split<'t>(&self, text: &'t str) -> Result<Vec<&'t str>> {
        self.pattern
            .find_iter(text)
            .map(|m| m.map(|m| m.as_str()).map_err(Error::from))
            .collect()
    }

    /// Grows the vocabulary with the most frequent chunks of `text` until it
    /// holds `vocab_size` tokens. Returns the number of tokens added.
    pub fn train(&mut self, text: &str, vocab_size: usize) -> Result<usize> {
        let chunks = self.split(text)?;
        let counts = count_tokens(&chunks);
        debug!(
            chunks = chunks.len(),
            distinct = counts.len(),
            vocab_size,
            "counted chunks"
        );
        Ok(self.vocab.insert_most_frequent(&counts, vocab_size))
    }
}

impl Default for RegexTokenizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tokenizer for RegexTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<Id>> {
        let mut ids = Vec::new();
        for m in self.pattern.find_iter(text) {
            let m = m?;
            // look the chunk up in place rather than copying it out
            ids.push(self.vocab.lookup_span(text, m.start(), m.end()));
        }
        Ok(ids)
    }

    fn decode(&self, ids: &[Id]) -> Result<String> {
        ids.iter().map(|&id| self.vocab.token(id)).collect()
    }
}
