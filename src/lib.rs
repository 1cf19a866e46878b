//! Persistent (copy-on-write) tables mapping IP prefixes to values. Lookups perform
//! longest-prefix match; tables can be compared, diffed, aggregated into their minimal
//! equivalent, and snapshotted for free.
//!
//! # Description of the Tree
//!
//! The table is a binary radix tree keyed by the bits of the network address. Each node carries a
//! prefix and, if it represents an entry, a value. A node without a value is a *join*: it only
//! exists to hold two disjoint subtrees below their longest common prefix, and it always has both
//! children (a join with one child is collapsed immediately). A child's prefix is strictly longer
//! than its parent's, and the child slot (left or right) is the address bit right after the
//! parent's prefix.
//!
//! All nodes are immutable and reference-counted. A modification clones only the nodes on the
//! path from the root to the touched prefix and shares every other subtree with the previous
//! version of the table. This is what makes snapshots O(1) and safe to read from any thread: a
//! snapshot is a pointer to a root that nobody will ever change.
//!
//! # The two handles
//!
//! - [`PrefixTable`] is an immutable snapshot. All read operations live here, together with the
//!   derived tables: [`aggregate`](PrefixTable::aggregate) (route summarization),
//!   [`map_values`](PrefixTable::map_values), and [`diff`](PrefixTable::diff).
//! - [`PrefixTableMut`] is the mutable view. It holds the current root in a shared cell and
//!   publishes every modification with an atomic compare-and-swap. Clones share the cell. Two
//!   clones modifying the table concurrently is a bug in the caller; the loser of the resulting
//!   race panics instead of silently dropping a write.
//!
//! Values are compared with `==` by default; both handles accept a custom equality predicate at
//! construction time, which is then used to detect no-op writes and drives aggregation, diffing,
//! mapping, and [`equal`](PrefixTable::equal).
//!
//! # Example
//!
//! ```
//! use prefix_table::{PrefixTable, PrefixTableMut};
//! use ipnet::Ipv4Net;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut rib: PrefixTableMut<Ipv4Net, &str> = PrefixTableMut::new();
//! rib.insert("10.0.0.0/16".parse()?, "peer1");
//! rib.insert("10.0.0.0/24".parse()?, "peer1");
//! rib.insert("10.0.0.0/32".parse()?, "peer2");
//!
//! // longest-prefix match
//! let (prefix, peer) = rib.snapshot().longest_match(&"10.0.0.1/32".parse()?)
//!     .map(|(p, v)| (*p, *v)).unwrap();
//! assert_eq!((prefix, peer), ("10.0.0.0/24".parse()?, "peer1"));
//!
//! // the /24 repeats what the /16 already says: aggregation drops it
//! let summary = rib.snapshot().aggregate();
//! assert_eq!(summary.len(), 2);
//!
//! // snapshots are unaffected by later modifications
//! let before = rib.snapshot();
//! rib.remove(&"10.0.0.0/32".parse()?);
//! assert_eq!(before.len(), 3);
//! assert_eq!(rib.len(), 2);
//! # Ok(())
//! # }
//! ```

mod aggregate;
mod diff;
mod error;
mod fmt;
mod iter;
mod node;
mod prefix;
#[cfg(feature = "serde")]
mod serde;
mod table;


pub use diff::DiffHandler;
pub use error::TableError;
pub use iter::{Iter, Keys, Values};
pub use prefix::Prefix;
pub use table::{EntryRef, PrefixTable, PrefixTableMut};
