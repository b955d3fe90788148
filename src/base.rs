use crate::error::Result;

/// Dense identifier assigned to a token at insertion time.
pub type Id = usize;

/// Sentinel token standing in for anything the vocabulary does not know.
pub const UNKNOWN_TOKEN: &str = "<unk>";

pub trait Tokenizer {
    fn encode(&self, text: &str) -> Result<Vec<Id>>;
    fn decode(&self, ids: &[Id]) -> Result<String>;
}
