use std::collections::HashMap;

/// Tallies how often each token occurs, ready for
/// [`VocabularyTable::insert_most_frequent`](crate::VocabularyTable::insert_most_frequent).
pub fn count_tokens<I, S>(tokens: I) -> HashMap<String, u64>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts = HashMap::new();
    for token in tokens {
        let token = token.as_ref();
        match counts.get_mut(token) {
            Some(count) => *count += 1,
            None => {
                counts.insert(token.to_string(), 1);
            }
        }
    }
    counts
}
