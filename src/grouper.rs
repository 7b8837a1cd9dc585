//! Splits the accepted files into partitions small enough for one build.
//!
//! Files are grouped by the first three segments of their corpus-relative path
//! (e.g. `test/std/containers`), and a group always ends up in a single partition.

use crate::selector::FileCandidate;
use std::collections::BTreeMap;

/// Number of leading path segments that make up a group key.
pub const KEY_SEGMENTS: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group<'files> {
    pub key: &'files str,
    pub files: Vec<&'files FileCandidate>,
}

/// A path with fewer than [`KEY_SEGMENTS`] segments is its own key.
pub fn group_key(relative: &str) -> &str {
    match relative.match_indices('/').nth(KEY_SEGMENTS - 1) {
        Some((i, _)) => &relative[..i],
        None => relative,
    }
}

/// Groups ordered by key, files within a group keep their order in `accepted`.
pub fn group(accepted: &[FileCandidate]) -> Vec<Group<'_>> {
    let mut groups = BTreeMap::<&str, Vec<&FileCandidate>>::new();
    for file in accepted {
        groups.entry(group_key(&file.relative)).or_default().push(file);
    }
    groups
        .into_iter()
        .map(|(key, files)| Group { key, files })
        .collect()
}

/// Fills the last partition until the next group doesn't fit, then starts a new one.
/// An empty partition takes any group, so a group bigger than `threshold` gets a
/// partition of its own.
pub fn partition<'files>(
    groups: impl IntoIterator<Item = Group<'files>>,
    threshold: usize,
) -> Vec<Vec<&'files FileCandidate>> {
    let mut res: Vec<Vec<&FileCandidate>> = vec![];
    for group in groups {
        match res.last_mut() {
            Some(last) if last.is_empty() || last.len() + group.files.len() <= threshold => {
                last.extend(group.files)
            }
            _ => res.push(group.files),
        }
    }
    res
}
