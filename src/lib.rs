mod base;
mod counts;
mod error;
mod regex;
mod vocabulary;

pub use base::{Id, Tokenizer, UNKNOWN_TOKEN};
pub use counts::count_tokens;
pub use error::{Error, Result};
pub use regex::{GPT4_SPLIT_PATTERN, RegexTokenizer};
pub use vocabulary::VocabularyTable;
