//! Lock-step comparison of two trees.

use std::sync::Arc;

use crate::iter::walk;
use crate::node::{relate, Link, Relation};
use crate::prefix::Prefix;

/// Receives the events of a [`diff`](crate::PrefixTable::diff) in lexicographic prefix order.
///
/// Every method defaults to doing nothing, so an implementation only overrides the events it
/// cares about. Returning `false` from any callback aborts the comparison.
///
/// Entries present in both tables with equal values are only reported when
/// [`visits_unchanged`](DiffHandler::visits_unchanged) returns `true`. When it returns `false`
/// (the default), subtrees shared between the two tables are skipped wholesale by pointer
/// identity, which makes diffing two snapshots that diverge in a few places much cheaper than
/// walking either of them.
pub trait DiffHandler<P, T> {
    /// An entry of the left table that has no counterpart in the right one.
    fn removed(&mut self, _prefix: &P, _value: &T) -> bool {
        true
    }

    /// An entry of the right table that has no counterpart in the left one.
    fn added(&mut self, _prefix: &P, _value: &T) -> bool {
        true
    }

    /// A prefix present in both tables whose values are not equal.
    fn modified(&mut self, _prefix: &P, _left: &T, _right: &T) -> bool {
        true
    }

    /// A prefix present in both tables with equal values. Never called unless
    /// [`visits_unchanged`](DiffHandler::visits_unchanged) returns `true`.
    fn unchanged(&mut self, _prefix: &P, _value: &T) -> bool {
        true
    }

    /// Opt into the [`unchanged`](DiffHandler::unchanged) callback, disabling subtree skipping.
    fn visits_unchanged(&self) -> bool {
        false
    }
}

/// Walk both trees in lock step, reporting events to `handler` in lexicographic order.
///
/// Returns `false` iff a callback aborted the comparison.
pub(crate) fn diff<P, T, H>(
    left: &Link<P, T>,
    right: &Link<P, T>,
    handler: &mut H,
    eq: &dyn Fn(&T, &T) -> bool,
) -> bool
where
    P: Prefix,
    H: DiffHandler<P, T> + ?Sized,
{
    let (l, r) = match (left, right) {
        (None, None) => return true,
        (None, Some(_)) => return walk(right, &mut |p, v| handler.added(p, v)),
        (Some(_), None) => return walk(left, &mut |p, v| handler.removed(p, v)),
        (Some(l), Some(r)) => (l, r),
    };
    if Arc::ptr_eq(l, r) && !handler.visits_unchanged() {
        return true;
    }
    match relate(&l.prefix, &r.prefix) {
        Relation::Equal => {
            let go = match (&l.value, &r.value) {
                (Some(a), Some(b)) if eq(a, b) => {
                    !handler.visits_unchanged() || handler.unchanged(&l.prefix, a)
                }
                (Some(a), Some(b)) => handler.modified(&l.prefix, a, b),
                (Some(a), None) => handler.removed(&l.prefix, a),
                (None, Some(b)) => handler.added(&r.prefix, b),
                (None, None) => true,
            };
            go && diff(&l.children[0], &r.children[0], handler, eq)
                && diff(&l.children[1], &r.children[1], handler, eq)
        }
        Relation::Contains { right: slot } => {
            // everything under the left node except the subtree holding `r` is gone
            if let Some(v) = &l.value {
                if !handler.removed(&l.prefix, v) {
                    return false;
                }
            }
            if slot {
                walk(&l.children[0], &mut |p, v| handler.removed(p, v))
                    && diff(&l.children[1], right, handler, eq)
            } else {
                diff(&l.children[0], right, handler, eq)
                    && walk(&l.children[1], &mut |p, v| handler.removed(p, v))
            }
        }
        Relation::ContainedBy { right: slot } => {
            if let Some(v) = &r.value {
                if !handler.added(&r.prefix, v) {
                    return false;
                }
            }
            if slot {
                walk(&r.children[0], &mut |p, v| handler.added(p, v))
                    && diff(left, &r.children[1], handler, eq)
            } else {
                diff(left, &r.children[0], handler, eq)
                    && walk(&r.children[1], &mut |p, v| handler.added(p, v))
            }
        }
        Relation::Disjoint { first_right, .. } => {
            // the two trees cover disjoint ranges: the numerically smaller one goes first
            if first_right {
                walk(right, &mut |p, v| handler.added(p, v))
                    && walk(left, &mut |p, v| handler.removed(p, v))
            } else {
                walk(left, &mut |p, v| handler.removed(p, v))
                    && walk(right, &mut |p, v| handler.added(p, v))
            }
        }
    }
}
