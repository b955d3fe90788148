//! Bidirectional token <-> id table.
//!
//! Ids are dense and follow insertion order. Storage is a single
//! [`IndexSet`], so the id of a token is its position in the set and the
//! two directions can never drift apart.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use indexmap::IndexSet;
use tracing::{debug, trace};

use crate::base::{Id, UNKNOWN_TOKEN};
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct VocabularyTable {
    tokens: IndexSet<String>,
    unknown: Id,
}

impl VocabularyTable {
    /// Creates a table holding only [`UNKNOWN_TOKEN`] at id 0.
    pub fn new() -> Self {
        let mut tokens = IndexSet::new();
        let (unknown, _) = tokens.insert_full(UNKNOWN_TOKEN.to_string());
        VocabularyTable { tokens, unknown }
    }

    /// Builds a table whose ids are the positions of `tokens`.
    ///
    /// The list must contain [`UNKNOWN_TOKEN`]; its position becomes the
    /// unknown id.
    pub fn from_tokens<I, S>(tokens: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_tokens_with_unknown(tokens, UNKNOWN_TOKEN)
    }

    /// Same as [`VocabularyTable::from_tokens`], with a caller-chosen
    /// unknown token.
    pub fn from_tokens_with_unknown<I, S>(tokens: I, unknown: &str) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let iter = tokens.into_iter();
        let mut set: IndexSet<String> = IndexSet::with_capacity(iter.size_hint().0);
        for token in iter {
            let token: String = token.into();
            if let Some(first) = set.get_index_of(&token) {
                return Err(Error::DuplicateToken {
                    token,
                    first,
                    second: set.len(),
                });
            }
            set.insert(token);
        }
        let unknown = set
            .get_index_of(unknown)
            .ok_or_else(|| Error::MissingToken(unknown.to_string()))?;
        debug!(len = set.len(), unknown, "loaded vocabulary");
        Ok(VocabularyTable {
            tokens: set,
            unknown,
        })
    }

    /// Id used for tokens missing from the table.
    pub fn unknown_id(&self) -> Id {
        self.unknown
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn contains<T: AsRef<str>>(&self, token: T) -> bool {
        self.tokens.contains(token.as_ref())
    }

    /// Returns the id of `token`, or the unknown id if it is absent.
    pub fn lookup<T: AsRef<str>>(&self, token: T) -> Id {
        self.lookup_with_fallback(token, self.unknown)
    }

    /// Returns the id of `token`, or `fallback` if it is absent.
    pub fn lookup_with_fallback<T: AsRef<str>>(&self, token: T, fallback: Id) -> Id {
        self.tokens.get_index_of(token.as_ref()).unwrap_or(fallback)
    }

    /// Looks up the bytes `start..end` of `buffer` without copying them.
    ///
    /// A range outside the buffer or off a char boundary cannot name a stored
    /// token, so it resolves to the unknown id.
    pub fn lookup_span(&self, buffer: &str, start: usize, end: usize) -> Id {
        self.lookup_span_with_fallback(buffer, start, end, self.unknown)
    }

    pub fn lookup_span_with_fallback(
        &self,
        buffer: &str,
        start: usize,
        end: usize,
        fallback: Id,
    ) -> Id {
        match buffer.get(start..end) {
            Some(view) => self.lookup_with_fallback(view, fallback),
            None => fallback,
        }
    }

    /// Appends `token` at the next id. Inserting a known token returns its
    /// existing id and leaves the table untouched.
    pub fn insert<T: AsRef<str>>(&mut self, token: T) -> Id {
        let token = token.as_ref();
        if let Some(id) = self.tokens.get_index_of(token) {
            return id;
        }
        let (id, _) = self.tokens.insert_full(token.to_string());
        trace!(id, token, "inserted token");
        id
    }

    /// Inserts the most frequent tokens of `counts` until the table holds
    /// `target_size` entries or the candidates run out.
    ///
    /// Higher counts win. Equal counts are taken in ascending lexicographic
    /// order of the token. Tokens already in the table are skipped and do not
    /// use up any of the target. Returns the number of tokens added.
    pub fn insert_most_frequent<I, K, C>(&mut self, counts: I, target_size: usize) -> usize
    where
        I: IntoIterator<Item = (K, C)>,
        K: Into<String>,
        C: Borrow<u64>,
    {
        if self.len() >= target_size {
            return 0;
        }

        let candidates: Vec<Candidate> = counts
            .into_iter()
            .map(|(token, count)| Candidate {
                count: *count.borrow(),
                token: token.into(),
            })
            .filter(|candidate| !self.tokens.contains(&candidate.token))
            .collect();
        let available = candidates.len();
        let mut queue = BinaryHeap::from(candidates);

        let mut inserted = 0;
        while self.len() < target_size {
            let Some(Candidate { token, count }) = queue.pop() else {
                break;
            };
            // the same token may have been offered more than once
            if self.tokens.contains(&token) {
                continue;
            }
            let (id, _) = self.tokens.insert_full(token);
            trace!(id, count, "selected frequent token");
            inserted += 1;
        }

        debug!(
            inserted,
            available,
            len = self.len(),
            target_size,
            "inserted most frequent tokens"
        );
        inserted
    }

    /// Bounds-checked reverse lookup.
    pub fn token(&self, id: Id) -> Result<&str> {
        self.tokens
            .get_index(id)
            .map(String::as_str)
            .ok_or(Error::IdOutOfRange {
                id,
                len: self.len(),
            })
    }

    /// Tokens in id order, for export.
    pub fn tokens(&self) -> impl ExactSizeIterator<Item = &str> + DoubleEndedIterator + '_ {
        self.tokens.iter().map(String::as_str)
    }

    /// `(id, token)` pairs in id order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (Id, &str)> + '_ {
        self.tokens().enumerate()
    }
}

impl Default for VocabularyTable {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a VocabularyTable {
    type Item = &'a str;
    type IntoIter = std::iter::Map<indexmap::set::Iter<'a, String>, fn(&'a String) -> &'a str>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens
            .iter()
            .map(String::as_str as fn(&'a String) -> &'a str)
    }
}

/// Heap entry for frequency selection. The greatest candidate has the highest
/// count, then the lexicographically smallest token.
#[derive(Debug, PartialEq, Eq)]
struct Candidate {
    count: u64,
    token: String,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| other.token.cmp(&self.token))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn counts(pairs: &[(&str, u64)]) -> HashMap<String, u64> {
        pairs.iter().map(|&(t, c)| (t.to_string(), c)).collect()
    }

    #[test]
    fn test_new_has_only_unknown() {
        let vocab = VocabularyTable::new();
        assert_eq!(vocab.len(), 1);
        assert_eq!(vocab.unknown_id(), 0);
        assert_eq!(vocab.token(0).unwrap(), UNKNOWN_TOKEN);
    }

    #[test]
    fn test_from_tokens() {
        let vocab = VocabularyTable::from_tokens(["<unk>", "the", "cat"]).unwrap();
        assert_eq!(vocab.lookup("the"), 1);
        assert_eq!(vocab.lookup("cat"), 2);
        assert_eq!(vocab.lookup("dog"), 0);
        assert_eq!(vocab.unknown_id(), 0);
    }

    #[test]
    fn test_from_tokens_unknown_not_first() {
        let vocab = VocabularyTable::from_tokens(["the", "cat", "<unk>"]).unwrap();
        assert_eq!(vocab.unknown_id(), 2);
        assert_eq!(vocab.lookup("dog"), 2);
    }

    #[test]
    fn test_from_tokens_missing_unknown() {
        let err = VocabularyTable::from_tokens(["the", "cat"]).unwrap_err();
        assert!(matches!(err, Error::MissingToken(ref t) if t == UNKNOWN_TOKEN));
    }

    #[test]
    fn test_from_tokens_duplicate() {
        let err = VocabularyTable::from_tokens(["<unk>", "the", "cat", "the"]).unwrap_err();
        match err {
            Error::DuplicateToken {
                token,
                first,
                second,
            } => {
                assert_eq!(token, "the");
                assert_eq!(first, 1);
                assert_eq!(second, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_custom_unknown() {
        let vocab = VocabularyTable::from_tokens_with_unknown(["[UNK]", "a"], "[UNK]").unwrap();
        assert_eq!(vocab.lookup("zzz"), 0);
        assert!(VocabularyTable::from_tokens_with_unknown(["<unk>"], "[UNK]").is_err());
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut vocab = VocabularyTable::new();
        assert_eq!(vocab.insert("hello"), 1);
        assert_eq!(vocab.insert("world"), 2);
        assert_eq!(vocab.insert("hello"), 1);
        assert_eq!(vocab.insert(UNKNOWN_TOKEN), 0);
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.tokens().collect::<Vec<_>>(), ["<unk>", "hello", "world"]);
    }

    #[test]
    fn test_lookup_owned_and_borrowed() {
        let mut vocab = VocabularyTable::new();
        vocab.insert(String::from("owned"));
        assert_eq!(vocab.lookup(String::from("owned")), 1);
        assert_eq!(vocab.lookup("owned"), 1);
        assert_eq!(vocab.lookup(std::borrow::Cow::Borrowed("owned")), 1);
    }

    #[test]
    fn test_lookup_with_fallback() {
        let vocab = VocabularyTable::from_tokens(["<unk>", "a"]).unwrap();
        assert_eq!(vocab.lookup_with_fallback("a", 99), 1);
        assert_eq!(vocab.lookup_with_fallback("b", 99), 99);
        assert_eq!(vocab.lookup("b"), 0);
    }

    #[test]
    fn test_lookup_span() {
        let vocab = VocabularyTable::from_tokens(["<unk>", "the", "cat"]).unwrap();
        let buffer = "the cat sat";
        assert_eq!(vocab.lookup_span(buffer, 0, 3), 1);
        assert_eq!(vocab.lookup_span(buffer, 4, 7), 2);
        assert_eq!(vocab.lookup_span(buffer, 8, 11), 0);
        assert_eq!(vocab.lookup_span_with_fallback(buffer, 8, 11, 7), 7);
    }

    #[test]
    fn test_lookup_span_invalid_range() {
        let vocab = VocabularyTable::from_tokens(["<unk>", "é"]).unwrap();
        assert_eq!(vocab.lookup_span("é", 0, 2), 1);
        assert_eq!(vocab.lookup_span("é", 0, 1), 0);
        assert_eq!(vocab.lookup_span("é", 0, 10), 0);
        assert_eq!(vocab.lookup_span("é", 2, 1), 0);
    }

    #[test]
    fn test_insert_most_frequent_picks_highest() {
        let mut vocab = VocabularyTable::new();
        let counts = counts(&[("a", 5), ("b", 3), ("c", 5), ("d", 1)]);
        assert_eq!(vocab.insert_most_frequent(&counts, 3), 2);
        assert_eq!(vocab.tokens().collect::<Vec<_>>(), ["<unk>", "a", "c"]);
        assert!(!vocab.contains("b"));
        assert!(!vocab.contains("d"));
    }

    #[test]
    fn test_insert_most_frequent_ties_are_lexicographic() {
        let mut vocab = VocabularyTable::new();
        let counts = counts(&[("pear", 2), ("apple", 2), ("fig", 2), ("kiwi", 9)]);
        assert_eq!(vocab.insert_most_frequent(&counts, 10), 4);
        assert_eq!(
            vocab.tokens().collect::<Vec<_>>(),
            ["<unk>", "kiwi", "apple", "fig", "pear"]
        );
    }

    #[test]
    fn test_insert_most_frequent_target_met() {
        let mut vocab = VocabularyTable::from_tokens(["<unk>", "x", "y"]).unwrap();
        let counts = counts(&[("a", 5)]);
        assert_eq!(vocab.insert_most_frequent(&counts, 3), 0);
        assert_eq!(vocab.insert_most_frequent(&counts, 1), 0);
        assert_eq!(vocab.len(), 3);
    }

    #[test]
    fn test_insert_most_frequent_skips_known() {
        let mut vocab = VocabularyTable::new();
        vocab.insert("a");
        let counts = counts(&[("a", 10), ("<unk>", 8), ("b", 1)]);
        assert_eq!(vocab.insert_most_frequent(&counts, 3), 1);
        assert_eq!(vocab.lookup("b"), 2);
    }

    #[test]
    fn test_insert_most_frequent_exhausts() {
        let mut vocab = VocabularyTable::new();
        let counts = vec![("a", 1u64), ("b", 2), ("a", 3)];
        assert_eq!(vocab.insert_most_frequent(counts, 100), 2);
        assert_eq!(vocab.tokens().collect::<Vec<_>>(), ["<unk>", "a", "b"]);
    }

    #[test]
    fn test_token_out_of_range() {
        let vocab = VocabularyTable::new();
        assert!(matches!(
            vocab.token(1),
            Err(Error::IdOutOfRange { id: 1, len: 1 })
        ));
    }

    #[test]
    fn test_iter_in_id_order() {
        let vocab = VocabularyTable::from_tokens(["<unk>", "b", "a"]).unwrap();
        let pairs: Vec<_> = vocab.iter().collect();
        assert_eq!(pairs, [(0, "<unk>"), (1, "b"), (2, "a")]);
        let tokens: Vec<_> = (&vocab).into_iter().collect();
        assert_eq!(tokens, ["<unk>", "b", "a"]);
    }
}
