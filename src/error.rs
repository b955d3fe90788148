use thiserror::Error;

use crate::base::Id;

#[derive(Error, Debug)]
pub enum Error {
    #[error("required token {0:?} is missing from the supplied list")]
    MissingToken(String),

    #[error("token {token:?} appears at positions {first} and {second}")]
    DuplicateToken {
        token: String,
        first: Id,
        second: Id,
    },

    #[error("id {id} is out of range for a vocabulary of {len} tokens")]
    IdOutOfRange { id: Id, len: usize },

    #[error("split pattern failed: {0}")]
    Regex(#[from] fancy_regex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
