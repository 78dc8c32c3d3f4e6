use std::collections::{BTreeSet, HashSet};

/// Collapse exact duplicates, then drop every value contained in a strictly
/// longer survivor. Output is sorted.
///
/// The containment scan is quadratic in the number of unique values.
pub fn dedupe<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let unique: BTreeSet<String> = values.into_iter().map(Into::into).collect();

    let mut by_len: Vec<&str> = unique.iter().map(String::as_str).collect();
    by_len.sort_by_key(|value| value.len());

    let mut dominated: HashSet<&str> = HashSet::new();
    for (idx, shorter) in by_len.iter().copied().enumerate() {
        let covered = by_len[idx + 1..]
            .iter()
            .filter(|longer| longer.len() > shorter.len())
            .any(|longer| longer.contains(shorter));
        if covered {
            dominated.insert(shorter);
        }
    }

    unique
        .iter()
        .filter(|value| !dominated.contains(value.as_str()))
        .cloned()
        .collect()
}
