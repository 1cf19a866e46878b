use std::collections::BTreeMap;

use super::*;
use crate::node::{is_valid, link_eq};
use crate::prefix::mask_from_len;
use crate::{DiffHandler, PrefixTable, PrefixTableMut};

type Net = (u8, u8);

fn build(entries: Vec<(TestNet, i32)>) -> PrefixTable<Net, i32> {
    let mut table = PrefixTableMut::new();
    for (p, v) in entries {
        table.insert_or_update(p.net(), v);
    }
    table.snapshot()
}

fn lpm(table: &PrefixTable<Net, i32>, host: u8) -> Option<i32> {
    table.longest_match(&(host, 8)).map(|(_, &v)| v)
}

qc!(aggregation_preserves_every_host_lookup, _aggregation_preserves_every_host_lookup);
fn _aggregation_preserves_every_host_lookup(entries: Vec<(TestNet, i32)>) -> bool {
    let table = build(entries);
    let summary = table.aggregate();
    is_valid(&summary.root)
        && summary.len() <= table.len()
        && (0..=255u8).all(|host| lpm(&table, host) == lpm(&summary, host))
}

qc!(aggregation_reaches_a_fixpoint, _aggregation_reaches_a_fixpoint);
fn _aggregation_reaches_a_fixpoint(entries: Vec<(TestNet, i32)>) -> bool {
    let once = build(entries).aggregate();
    let twice = once.aggregate();
    link_eq(&once.root, &twice.root)
}

// a two-bucket comparator makes redundancy and fusing common
qc!(aggregation_with_a_coarse_comparator, _aggregation_with_a_coarse_comparator);
fn _aggregation_with_a_coarse_comparator(entries: Vec<(TestNet, i32)>) -> bool {
    fn coarse(a: &i32, b: &i32) -> bool {
        a.rem_euclid(2) == b.rem_euclid(2)
    }
    let mut view: PrefixTableMut<Net, i32> = PrefixTableMut::with_comparator(coarse);
    for (p, v) in entries {
        view.insert_or_update(p.net(), v);
    }
    let table = view.snapshot();
    let summary = table.aggregate();
    is_valid(&summary.root)
        && (0..=255u8).all(|host| {
            match (lpm(&table, host), lpm(&summary, host)) {
                (None, None) => true,
                (Some(a), Some(b)) => coarse(&a, &b),
                _ => false,
            }
        })
}

qc!(mapping_the_identity_shares_the_tree, _mapping_the_identity_shares_the_tree);
fn _mapping_the_identity_shares_the_tree(entries: Vec<(TestNet, i32)>) -> bool {
    let table = build(entries);
    let mapped = table.map_values(|_, v| *v);
    link_eq(&table.root, &mapped.root)
}

qc!(mapping_transforms_every_value, _mapping_transforms_every_value);
fn _mapping_transforms_every_value(entries: Vec<(TestNet, i32)>) -> bool {
    let table = build(entries);
    let mapped = table.map_values(|&(_, len), v| v.wrapping_add(len as i32));
    mapped.len() == table.len()
        && table
            .iter()
            .zip(mapped.iter())
            .all(|((p, v), (q, w))| p == q && v.wrapping_add(p.1 as i32) == *w)
}

#[derive(Default)]
struct Events {
    removed: Vec<(Net, i32)>,
    added: Vec<(Net, i32)>,
    modified: Vec<(Net, i32, i32)>,
    unchanged: Vec<(Net, i32)>,
    with_unchanged: bool,
}

impl DiffHandler<Net, i32> for Events {
    fn removed(&mut self, p: &Net, v: &i32) -> bool {
        self.removed.push((*p, *v));
        true
    }
    fn added(&mut self, p: &Net, v: &i32) -> bool {
        self.added.push((*p, *v));
        true
    }
    fn modified(&mut self, p: &Net, l: &i32, r: &i32) -> bool {
        self.modified.push((*p, *l, *r));
        true
    }
    fn unchanged(&mut self, p: &Net, v: &i32) -> bool {
        self.unchanged.push((*p, *v));
        true
    }
    fn visits_unchanged(&self) -> bool {
        self.with_unchanged
    }
}

fn key(net: Net) -> Net {
    (net.0 & mask_from_len::<u8>(net.1), net.1)
}

qc!(diff_accounts_for_both_tables, _diff_accounts_for_both_tables);
fn _diff_accounts_for_both_tables(
    (left, right): (Vec<(TestNet, i32)>, Vec<(TestNet, i32)>),
) -> bool {
    let left = build(left);
    let right = build(right);
    let mut events = Events {
        with_unchanged: true,
        ..Default::default()
    };
    if !left.diff(&right, &mut events) {
        return false;
    }

    if events.removed.len() + events.modified.len() + events.unchanged.len() != left.len() {
        return false;
    }
    if events.added.len() + events.modified.len() + events.unchanged.len() != right.len() {
        return false;
    }

    // replaying the events on the left table must produce the right one
    let mut rebuilt: BTreeMap<Net, i32> = left.iter().map(|(&p, &v)| (key(p), v)).collect();
    for (p, _) in &events.removed {
        rebuilt.remove(&key(*p));
    }
    for (p, v) in &events.added {
        rebuilt.insert(key(*p), *v);
    }
    for (p, _, r) in &events.modified {
        rebuilt.insert(key(*p), *r);
    }
    let want: BTreeMap<Net, i32> = right.iter().map(|(&p, &v)| (key(p), v)).collect();
    rebuilt == want
}

qc!(pruned_diffs_report_the_same_changes, _pruned_diffs_report_the_same_changes);
fn _pruned_diffs_report_the_same_changes(
    (entries, edits): (Vec<(TestNet, i32)>, Vec<Operation<i32>>),
) -> bool {
    let base = build(entries);
    // derive the right table from the left one so that large parts stay shared
    let mut view = base.to_mut();
    for op in edits {
        match op {
            Operation::Insert(p, t) => {
                view.insert(p.net(), t);
            }
            Operation::Update(p, t) => {
                view.update(p.net(), t);
            }
            Operation::InsertOrUpdate(p, t) => view.insert_or_update(p.net(), t),
            Operation::Remove(p) => {
                view.remove(&p.net());
            }
            Operation::RemoveSubtree(p) => view.remove_subtree(&p.net()),
        }
    }
    let edited = view.snapshot();

    let mut full = Events {
        with_unchanged: true,
        ..Default::default()
    };
    base.diff(&edited, &mut full);
    let mut pruned = Events::default();
    base.diff(&edited, &mut pruned);

    pruned.unchanged.is_empty()
        && pruned.removed == full.removed
        && pruned.added == full.added
        && pruned.modified == full.modified
}

qc!(tables_equal_their_entry_lists, _tables_equal_their_entry_lists);
fn _tables_equal_their_entry_lists(entries: Vec<(TestNet, i32)>) -> bool {
    let table = build(entries);
    let rebuilt: PrefixTable<Net, i32> = table.iter().map(|(&p, &v)| (p, v)).collect();
    table.equal(&rebuilt) && table == rebuilt
}
