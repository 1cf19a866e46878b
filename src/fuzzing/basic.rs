use std::collections::BTreeMap;

use super::*;
use crate::node::is_valid;
use crate::prefix::mask_from_len;
use crate::PrefixTableMut;

type Net = (u8, u8);
type Model = BTreeMap<Net, i32>;

/// Apply one operation to both the table and the model.
fn apply(table: &mut PrefixTableMut<Net, i32>, model: &mut Model, op: Operation<i32>) {
    match op {
        Operation::Insert(p, t) => {
            let inserted = table.insert(p.net(), t);
            assert_eq!(inserted, !model.contains_key(&p.key()));
            model.entry(p.key()).or_insert(t);
        }
        Operation::Update(p, t) => {
            let updated = table.update(p.net(), t);
            assert_eq!(updated, model.contains_key(&p.key()));
            if let Some(v) = model.get_mut(&p.key()) {
                *v = t;
            }
        }
        Operation::InsertOrUpdate(p, t) => {
            table.insert_or_update(p.net(), t);
            model.insert(p.key(), t);
        }
        Operation::Remove(p) => {
            let removed = table.remove(&p.net());
            let was_entry = model.remove(&p.key()).is_some();
            // a prefix held by neither an entry nor a join is the only thing that fails
            assert_eq!(removed, was_entry || is_join(model, p));
        }
        Operation::RemoveSubtree(p) => {
            table.remove_subtree(&p.net());
            model.retain(|&net, _| !p.covers(net));
        }
    }
}

/// Whether the tree holds a join exactly at `p`: entries strictly below it on both sides.
fn is_join(model: &Model, p: TestNet) -> bool {
    let (net, len) = p.key();
    if len >= 8 {
        return false;
    }
    let half = |right: bool| {
        model.keys().any(|&(other, other_len)| {
            other_len > len
                && other & mask_from_len::<u8>(len) == net
                && (other & (0x80u8 >> len) != 0) == right
        })
    };
    half(false) && half(true)
}

fn contents(table: &PrefixTableMut<Net, i32>) -> Vec<(Net, i32)> {
    table
        .snapshot()
        .iter()
        .map(|(&(addr, len), &v)| ((addr & mask_from_len::<u8>(len), len), v))
        .collect()
}

qc!(random_ops_match_a_map, _random_ops_match_a_map);
fn _random_ops_match_a_map(ops: Vec<Operation<i32>>) -> bool {
    let mut table = PrefixTableMut::new();
    let mut model = Model::new();
    for op in ops {
        apply(&mut table, &mut model, op);
        if !is_valid(&table.snapshot().root) {
            return false;
        }
    }
    // the iteration order doubles as the ordering check: the model is sorted by (network, len)
    contents(&table) == model.into_iter().collect::<Vec<_>>()
}

qc!(longest_match_agrees_with_a_scan, _longest_match_agrees_with_a_scan);
fn _longest_match_agrees_with_a_scan(ops: Vec<Operation<i32>>) -> bool {
    let mut table = PrefixTableMut::new();
    let mut model = Model::new();
    for op in ops {
        apply(&mut table, &mut model, op);
    }
    let snap = table.snapshot();
    (0..=255u8).all(|host| {
        let got = snap
            .longest_match(&(host, 8))
            .map(|(&(_, len), &v)| (len, v));
        let want = model
            .iter()
            .filter(|(&(net, len), _)| host & mask_from_len::<u8>(len) == net)
            .max_by_key(|(&(_, len), _)| len)
            .map(|(&(_, len), &v)| (len, v));
        got == want
    })
}

qc!(snapshots_stay_frozen, _snapshots_stay_frozen);
fn _snapshots_stay_frozen(ops: Vec<Operation<i32>>) -> bool {
    let mut table = PrefixTableMut::new();
    let mut model = Model::new();
    let mut frozen = Vec::new();
    for op in ops {
        apply(&mut table, &mut model, op);
        frozen.push((table.snapshot(), model.clone()));
    }
    // every snapshot still shows the state it was taken at
    frozen.into_iter().all(|(snap, model)| {
        let contents: Vec<(Net, i32)> = snap
            .iter()
            .map(|(&(addr, len), &v)| ((addr & mask_from_len::<u8>(len), len), v))
            .collect();
        contents == model.into_iter().collect::<Vec<_>>()
    })
}

qc!(exact_lookups_agree_with_the_map, _exact_lookups_agree_with_the_map);
fn _exact_lookups_agree_with_the_map((ops, probes): (Vec<Operation<i32>>, Vec<TestNet>)) -> bool {
    let mut table = PrefixTableMut::new();
    let mut model = Model::new();
    for op in ops {
        apply(&mut table, &mut model, op);
    }
    let snap = table.snapshot();
    probes.into_iter().all(|p| {
        snap.get(&p.net()).copied() == model.get(&p.key()).copied()
            && snap.contains_key(&p.net()) == model.contains_key(&p.key())
    })
}
