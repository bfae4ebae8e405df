//! Pure set algorithms over network maps and alphabets.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::types::Node;

#[derive(Default)]
struct DiffNode<'a> {
    current: Option<&'a Node>,
    candidate: Option<&'a Node>,
}

/// Splits membership change between the current map and the next epoch's
/// candidates into `(joined, dropped)`, keyed by node ID.
///
/// Output order is unspecified.
pub fn get_diff<'a, I>(current: &'a [Node], candidates: I) -> (Vec<&'a Node>, Vec<&'a Node>)
where
    I: IntoIterator<Item = &'a Node>,
{
    let mut by_id: HashMap<u64, DiffNode<'a>> = HashMap::with_capacity(current.len());
    for node in current {
        by_id.entry(node.id).or_default().current = Some(node);
    }

    let mut new_count = 0;
    for node in candidates {
        let entry = by_id.entry(node.id).or_default();
        if entry.current.is_none() && entry.candidate.is_none() {
            new_count += 1;
        }
        entry.candidate = Some(node);
    }

    let mut joined = Vec::with_capacity(new_count);
    let mut dropped = Vec::new();
    for entry in by_id.into_values() {
        match (entry.current, entry.candidate) {
            (Some(node), None) => dropped.push(node),
            (None, Some(node)) => joined.push(node),
            _ => {}
        }
    }
    (joined, dropped)
}

fn is_sorted(list: &[String]) -> bool {
    list.windows(2).all(|w| w[0] <= w[1])
}

/// Symmetric difference of two sorted key lists as `(only_in_a, only_in_b)`.
///
/// Inputs must be sorted ascending; unsorted input is sorted first and
/// logged, since the merge walk is meaningless otherwise.
pub fn compute_unique_alphabets(a: &[String], b: &[String]) -> (Vec<String>, Vec<String>) {
    let a = ensure_sorted(a, "a");
    let b = ensure_sorted(b, "b");

    let (mut i, mut j) = (0, 0);
    let mut unique_a = Vec::new();
    let mut unique_b = Vec::new();
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            i += 1;
            j += 1;
        } else if a[i] < b[j] {
            unique_a.push(a[i].clone());
            i += 1;
        } else {
            unique_b.push(b[j].clone());
            j += 1;
        }
    }
    unique_a.extend_from_slice(&a[i..]);
    unique_b.extend_from_slice(&b[j..]);
    (unique_a, unique_b)
}

fn ensure_sorted<'a>(list: &'a [String], side: &str) -> Cow<'a, [String]> {
    if is_sorted(list) {
        return Cow::Borrowed(list);
    }
    tracing::warn!(side, "alphabet list is not sorted, sorting a copy");
    let mut owned = list.to_vec();
    owned.sort();
    Cow::Owned(owned)
}
