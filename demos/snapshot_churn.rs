use ipnet::Ipv4Net;
use prefix_table::*;
use rand::prelude::*;

/// Churn a table while holding on to periodic snapshots, then show that every snapshot still
/// answers like the moment it was taken.
fn main() {
    let mut table = PrefixTableMut::<Ipv4Net, u32>::new();
    let mut rng = thread_rng();
    let mut snapshots: Vec<(usize, PrefixTable<Ipv4Net, u32>)> = Vec::new();

    for round in 0..1_000_000usize {
        let len = rng.gen_range(1..=24);
        let addr: u32 = rng.gen::<u32>() & (!0u32 << (32 - len));
        let prefix = Ipv4Net::new(addr.into(), len).unwrap();

        if rng.gen_bool(0.7) {
            table.insert_or_update(prefix, rng.gen::<u8>() as u32);
        } else if rng.gen_bool(0.1) {
            table.remove_subtree(&prefix);
        } else {
            table.remove(&prefix);
        }

        if round % 100_000 == 0 {
            snapshots.push((table.len(), table.snapshot()));
        }
    }

    for (len_then, snap) in &snapshots {
        assert_eq!(snap.len(), *len_then);
    }
    println!(
        "final table: {} entries, aggregated: {} entries, {} live snapshots",
        table.len(),
        table.snapshot().aggregate().len(),
        snapshots.len()
    );
}
