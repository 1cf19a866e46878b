//! Route summarization: the smallest set of entries with the same longest-prefix-match behavior.

use std::sync::Arc;

use crate::node::{link_eq, Link, TrieNode};
use crate::prefix::Prefix;

/// Aggregate a tree under the given value-equality predicate.
///
/// The result answers every host lookup with a value equal (under `eq`) to the original tree's
/// answer, using as few entries as possible. Two things shrink the tree: an entry whose value
/// equals that of its nearest enclosing entry is dropped, and two sibling entries that exactly
/// split a covering prefix in half with equal values fuse into a single entry at that prefix,
/// shadowing any value stored there (the halves answer every lookup before it is consulted).
/// Subtrees that come out unchanged are shared, so aggregating an already-aggregated tree
/// returns the same root.
pub(crate) fn aggregate<P, T>(link: &Link<P, T>, eq: &dyn Fn(&T, &T) -> bool) -> Link<P, T>
where
    P: Prefix,
    T: Clone,
{
    summarize(link, None, eq)
}

/// Post-order recursion. `inherited` is the value of the nearest enclosing entry that survives
/// aggregation; anything below that compares equal to it is redundant.
fn summarize<P, T>(
    link: &Link<P, T>,
    inherited: Option<&T>,
    eq: &dyn Fn(&T, &T) -> bool,
) -> Link<P, T>
where
    P: Prefix,
    T: Clone,
{
    let Some(node) = link else { return None };

    let keep = match (&node.value, inherited) {
        (Some(v), Some(above)) if eq(v, above) => None,
        (v, _) => v.as_ref(),
    };
    // even a dropped entry dominates everything below it (its value equals `inherited`)
    let below = node.value.as_ref().or(inherited);
    let left = summarize(&node.children[0], below, eq);
    let right = summarize(&node.children[1], below, eq);
    let same_children =
        link_eq(&left, &node.children[0]) && link_eq(&right, &node.children[1]);

    // two equal halves make any value at this prefix itself unreachable, kept or not
    if let (Some(l), Some(r)) = (&left, &right) {
        if let Some(fused) = fused_value(&node.prefix, l, r, eq) {
            if inherited.map_or(false, |above| eq(above, fused)) {
                return None;
            }
            return Some(Arc::new(TrieNode::leaf(node.prefix.clone(), fused.clone())));
        }
    }

    match keep {
        Some(v) => {
            if same_children {
                link.clone()
            } else {
                Some(Arc::new(TrieNode::new(
                    node.prefix.clone(),
                    Some(v.clone()),
                    [left, right],
                )))
            }
        }
        None => match (left, right) {
            (None, None) => None,
            (Some(only), None) | (None, Some(only)) => Some(only),
            (Some(l), Some(r)) => {
                if node.value.is_none() && same_children {
                    link.clone()
                } else {
                    Some(Arc::new(TrieNode::new(
                        node.prefix.clone(),
                        None,
                        [Some(l), Some(r)],
                    )))
                }
            }
        },
    }
}

/// If the two children are single entries that each cover one half of `prefix` and carry equal
/// values, the pair is equivalent to one entry at `prefix` itself.
fn fused_value<'a, P, T>(
    prefix: &P,
    left: &'a Arc<TrieNode<P, T>>,
    right: &Arc<TrieNode<P, T>>,
    eq: &dyn Fn(&T, &T) -> bool,
) -> Option<&'a T>
where
    P: Prefix,
{
    let half = prefix.prefix_len() + 1;
    if left.size() != 1 || left.prefix.prefix_len() != half {
        return None;
    }
    if right.size() != 1 || right.prefix.prefix_len() != half {
        return None;
    }
    let l = left.value.as_ref()?;
    let r = right.value.as_ref()?;
    eq(l, r).then_some(l)
}
