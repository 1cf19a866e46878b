//! The two public handles over the trie: immutable snapshots and the mutable view.

use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::diff::DiffHandler;
use crate::iter::{Iter, Keys, Values};
use crate::node::{self, link_eq, size_of, InsertMode, Link, TrieNode};
use crate::prefix::Prefix;
use crate::{aggregate, diff, iter, TableError};

fn default_eq<T: PartialEq>(a: &T, b: &T) -> bool {
    a == b
}

/// An immutable table mapping IP prefixes to values, with longest-prefix-match lookups.
///
/// A `PrefixTable` is a snapshot: once you hold one, nothing can change what it contains. Taking
/// a snapshot of a [`PrefixTableMut`], or turning a snapshot into a new mutable view, copies a
/// single pointer; the tree itself is shared structurally between all handles that reference it.
/// Snapshots can be read from any number of threads without coordination.
///
/// ```
/// use prefix_table::PrefixTable;
/// use ipnet::Ipv4Net;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let table: PrefixTable<Ipv4Net, u32> = PrefixTable::from_iter([
///     ("10.0.0.0/8".parse()?, 1),
///     ("10.224.24.0/24".parse()?, 2),
/// ]);
/// assert_eq!(table.longest_match(&"10.224.24.1/32".parse()?), Some((&"10.224.24.0/24".parse()?, &2)));
/// assert_eq!(table.longest_match(&"10.1.2.3/32".parse()?), Some((&"10.0.0.0/8".parse()?, &1)));
/// assert_eq!(table.longest_match(&"11.0.0.0/32".parse()?), None);
/// # Ok(())
/// # }
/// ```
pub struct PrefixTable<P, T> {
    pub(crate) root: Link<P, T>,
    pub(crate) eq: fn(&T, &T) -> bool,
}

impl<P, T> Clone for PrefixTable<P, T> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            eq: self.eq,
        }
    }
}

impl<P, T> Default for PrefixTable<P, T>
where
    P: Prefix,
    T: PartialEq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P, T> PrefixTable<P, T>
where
    P: Prefix,
{
    /// Create an empty table comparing values with `==`.
    pub fn new() -> Self
    where
        T: PartialEq,
    {
        Self::with_comparator(default_eq)
    }

    /// Create an empty table with a custom value-equality predicate.
    ///
    /// The predicate decides what "the same value" means for overwrite detection,
    /// [`aggregate`](Self::aggregate), [`diff`](Self::diff), [`map_values`](Self::map_values),
    /// and [`equal`](Self::equal). It must be a pure total equivalence.
    pub fn with_comparator(cmp: fn(&T, &T) -> bool) -> Self {
        Self {
            root: None,
            eq: cmp,
        }
    }

    /// The number of entries in the table.
    #[inline(always)]
    pub fn len(&self) -> usize {
        size_of(&self.root) as usize
    }

    /// Whether the table has no entries.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Get the value stored under exactly this prefix. Host bits are ignored for matching.
    pub fn get(&self, prefix: &P) -> Option<&T> {
        node::lookup_exact(&self.root, prefix).and_then(|n| n.value.as_ref())
    }

    /// Get the stored prefix and value under exactly this prefix. The returned prefix may differ
    /// from the argument in its host bits: it is the address that was originally inserted.
    pub fn get_key_value(&self, prefix: &P) -> Option<(&P, &T)> {
        node::lookup_exact(&self.root, prefix).and_then(|n| n.entry())
    }

    /// Whether an entry is stored under exactly this prefix.
    pub fn contains_key(&self, prefix: &P) -> bool {
        node::lookup_exact(&self.root, prefix).is_some()
    }

    /// Longest-prefix match: the entry with the longest prefix containing `prefix`.
    ///
    /// ```
    /// use prefix_table::PrefixTable;
    /// use ipnet::Ipv4Net;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let table: PrefixTable<Ipv4Net, u32> = PrefixTable::from_iter([
    ///     ("192.168.0.0/16".parse()?, 1),
    ///     ("192.168.1.0/24".parse()?, 2),
    /// ]);
    /// assert_eq!(table.longest_match(&"192.168.1.1/32".parse()?), Some((&"192.168.1.0/24".parse()?, &2)));
    /// assert_eq!(table.longest_match(&"192.168.2.1/32".parse()?), Some((&"192.168.0.0/16".parse()?, &1)));
    /// # Ok(())
    /// # }
    /// ```
    pub fn longest_match(&self, prefix: &P) -> Option<(&P, &T)> {
        node::lookup_lpm(&self.root, prefix).and_then(|n| n.entry())
    }

    /// Iterate over all entries in lexicographic order.
    pub fn iter(&self) -> Iter<'_, P, T> {
        Iter::new(&self.root)
    }

    /// Iterate over all prefixes in lexicographic order.
    pub fn keys(&self) -> Keys<'_, P, T> {
        Keys { inner: self.iter() }
    }

    /// Iterate over all values, in lexicographic order of their prefixes.
    pub fn values(&self) -> Values<'_, P, T> {
        Values { inner: self.iter() }
    }

    /// Invoke `f` for every entry in lexicographic order, stopping early when it returns `false`.
    ///
    /// Returns `false` iff the walk was aborted.
    pub fn walk<F>(&self, mut f: F) -> bool
    where
        F: FnMut(&P, &T) -> bool,
    {
        iter::walk(&self.root, &mut f)
    }

    /// Compare this table (left) against `other` (right), reporting every difference to
    /// `handler` in lexicographic prefix order. See [`DiffHandler`] for the event set and the
    /// subtree-skipping rules.
    ///
    /// Returns `false` iff a callback aborted the comparison.
    pub fn diff<H>(&self, other: &Self, handler: &mut H) -> bool
    where
        H: DiffHandler<P, T> + ?Sized,
    {
        diff::diff(&self.root, &other.root, handler, &self.eq)
    }

    /// Summarize the table: the smallest table answering every host lookup like this one.
    ///
    /// Entries repeating the value of their closest enclosing entry are dropped, and adjacent
    /// entries that split a prefix in half with equal values are fused into it.
    ///
    /// ```
    /// use prefix_table::PrefixTable;
    /// use ipnet::Ipv4Net;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let table: PrefixTable<Ipv4Net, u32> = PrefixTable::from_iter([
    ///     ("10.0.0.0/25".parse()?, 7),
    ///     ("10.0.0.128/25".parse()?, 7),
    /// ]);
    /// let summary = table.aggregate();
    /// assert_eq!(summary.len(), 1);
    /// assert_eq!(summary.get(&"10.0.0.0/24".parse()?), Some(&7));
    /// # Ok(())
    /// # }
    /// ```
    pub fn aggregate(&self) -> Self
    where
        T: Clone,
    {
        Self {
            root: aggregate::aggregate(&self.root, &self.eq),
            eq: self.eq,
        }
    }

    /// A table with the same prefixes but every value passed through `f`.
    ///
    /// Subtrees whose values all map to equal ones are shared with `self` rather than rebuilt;
    /// mapping with a function that changes nothing returns a table sharing the entire tree.
    pub fn map_values<F>(&self, mut f: F) -> Self
    where
        T: Clone,
        F: FnMut(&P, &T) -> T,
    {
        Self {
            root: iter::map_values(&self.root, &mut f, &self.eq),
            eq: self.eq,
        }
    }

    /// Whether both tables hold the same entries, comparing values with this table's predicate.
    pub fn equal(&self, other: &Self) -> bool {
        node::equal(&self.root, &other.root, &self.eq)
    }

    /// A new mutable view starting from this snapshot. O(1).
    pub fn to_mut(&self) -> PrefixTableMut<P, T> {
        PrefixTableMut {
            cell: Arc::new(TableCell {
                root: ArcSwapOption::new(self.root.clone()),
                eq: self.eq,
            }),
        }
    }

    /// Run a batch of modifications in a scope.
    ///
    /// `f` receives a fresh mutable view of this table. If it returns `true`, the modified
    /// snapshot is returned; otherwise the modifications are discarded and `self` comes back
    /// unchanged.
    ///
    /// ```
    /// use prefix_table::PrefixTable;
    /// use ipnet::Ipv4Net;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let empty: PrefixTable<Ipv4Net, u32> = PrefixTable::new();
    /// let table = empty.build(|t| {
    ///     t.insert("10.0.0.0/8".parse().unwrap(), 1);
    ///     t.insert("10.1.0.0/16".parse().unwrap(), 2);
    ///     true
    /// });
    /// assert_eq!(table.len(), 2);
    /// assert!(empty.is_empty());
    /// # Ok(())
    /// # }
    /// ```
    pub fn build<F>(&self, f: F) -> Self
    where
        F: FnOnce(&mut PrefixTableMut<P, T>) -> bool,
    {
        let mut view = self.to_mut();
        if f(&mut view) {
            view.snapshot()
        } else {
            self.clone()
        }
    }
}

impl<P, T> PartialEq for PrefixTable<P, T>
where
    P: Prefix,
    T: PartialEq,
{
    /// Structural equality with `==` on values, regardless of any custom comparator.
    fn eq(&self, other: &Self) -> bool {
        node::equal(&self.root, &other.root, &default_eq)
    }
}

impl<P, T> FromIterator<(P, T)> for PrefixTable<P, T>
where
    P: Prefix,
    T: PartialEq + Clone,
{
    fn from_iter<I: IntoIterator<Item = (P, T)>>(iter: I) -> Self {
        let mut view = PrefixTableMut::new();
        view.extend(iter);
        view.snapshot()
    }
}

impl<'a, P, T> IntoIterator for &'a PrefixTable<P, T> {
    type Item = (&'a P, &'a T);
    type IntoIter = Iter<'a, P, T>;

    fn into_iter(self) -> Self::IntoIter {
        Iter::new(&self.root)
    }
}

struct TableCell<P, T> {
    root: ArcSwapOption<TrieNode<P, T>>,
    eq: fn(&T, &T) -> bool,
}

/// A mutable view over a prefix table.
///
/// The view owns a shared cell holding the current root. Every modification runs a pure
/// operation against the tree and installs the result with an atomic compare-and-swap; readers
/// holding snapshots are never affected. Clones of a view share the same cell, so a snapshot
/// taken from any clone observes modifications made through all of them.
///
/// Writes are single-writer: two clones racing their modifications is a bug in the caller, and
/// the loser of the resulting compare-and-swap race panics rather than silently dropping a write.
///
/// ```
/// use prefix_table::PrefixTableMut;
/// use ipnet::Ipv4Net;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut table: PrefixTableMut<Ipv4Net, u32> = PrefixTableMut::new();
/// assert!(table.insert("10.0.0.0/8".parse()?, 1));
/// assert!(!table.insert("10.0.0.0/8".parse()?, 2)); // already present
/// let before = table.snapshot();
/// table.remove(&"10.0.0.0/8".parse()?);
/// assert_eq!(before.len(), 1); // snapshots never change
/// assert_eq!(table.len(), 0);
/// # Ok(())
/// # }
/// ```
pub struct PrefixTableMut<P, T> {
    cell: Arc<TableCell<P, T>>,
}

impl<P, T> Clone for PrefixTableMut<P, T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<P, T> Default for PrefixTableMut<P, T>
where
    P: Prefix,
    T: PartialEq,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<P, T> PrefixTableMut<P, T>
where
    P: Prefix,
{
    /// Create an empty mutable view comparing values with `==`.
    pub fn new() -> Self
    where
        T: PartialEq,
    {
        Self::with_comparator(default_eq)
    }

    /// Create an empty mutable view with a custom value-equality predicate.
    pub fn with_comparator(cmp: fn(&T, &T) -> bool) -> Self {
        PrefixTable::with_comparator(cmp).to_mut()
    }

    /// Run a pure operation against the current root and publish its result.
    fn mutate<R, F>(&mut self, op: F) -> R
    where
        F: FnOnce(&Link<P, T>, fn(&T, &T) -> bool) -> (Link<P, T>, R),
    {
        let current = self.cell.root.load_full();
        let (next, out) = op(&current, self.cell.eq);
        if !link_eq(&next, &current) {
            let witnessed = self.cell.root.compare_and_swap(&current, next);
            if !link_eq(&witnessed, &current) {
                panic!("concurrent modification of a PrefixTableMut detected");
            }
        }
        out
    }

    /// Insert a new entry, or report [`TableError::AlreadyExists`] without touching the present
    /// one.
    pub fn try_insert(&mut self, prefix: P, value: T) -> Result<(), TableError>
    where
        T: Clone,
    {
        self.mutate(|root, eq| {
            match node::insert(root, prefix, value, InsertMode::InsertOnly, &eq) {
                Ok(next) => (next, Ok(())),
                Err(e) => (root.clone(), Err(e)),
            }
        })
    }

    /// Insert a new entry. Returns whether the insert happened; an entry already stored under
    /// the same prefix is left untouched.
    pub fn insert(&mut self, prefix: P, value: T) -> bool
    where
        T: Clone,
    {
        self.try_insert(prefix, value).is_ok()
    }

    /// Overwrite an existing entry, or report [`TableError::NotFound`].
    ///
    /// Writing a value equal (under the table's predicate) to the present one is a no-op that
    /// keeps the existing node, so snapshots taken before and after compare pointer-identical.
    pub fn try_update(&mut self, prefix: P, value: T) -> Result<(), TableError>
    where
        T: Clone,
    {
        self.mutate(|root, eq| {
            match node::insert(root, prefix, value, InsertMode::UpdateOnly, &eq) {
                Ok(next) => (next, Ok(())),
                Err(e) => (root.clone(), Err(e)),
            }
        })
    }

    /// Overwrite an existing entry. Returns whether the entry existed.
    pub fn update(&mut self, prefix: P, value: T) -> bool
    where
        T: Clone,
    {
        self.try_update(prefix, value).is_ok()
    }

    /// Insert the entry, overwriting whatever was stored under the prefix before.
    pub fn insert_or_update(&mut self, prefix: P, value: T)
    where
        T: Clone,
    {
        self.mutate(|root, eq| {
            match node::insert(root, prefix, value, InsertMode::Upsert, &eq) {
                Ok(next) => (next, ()),
                Err(_) => unreachable!("an unconditional insert cannot fail"),
            }
        })
    }

    /// Return the entry stored under `prefix`, inserting `value` there first if there is none.
    ///
    /// ```
    /// use prefix_table::PrefixTableMut;
    /// use ipnet::Ipv4Net;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let mut table: PrefixTableMut<Ipv4Net, u32> = PrefixTableMut::new();
    /// let prefix = "10.0.0.0/8".parse()?;
    /// assert_eq!(*table.get_or_insert(prefix, 1).value(), 1);
    /// assert_eq!(*table.get_or_insert(prefix, 2).value(), 1);
    /// # Ok(())
    /// # }
    /// ```
    pub fn get_or_insert(&mut self, prefix: P, value: T) -> EntryRef<P, T>
    where
        T: Clone,
    {
        self.mutate(|root, eq| {
            let (next, node) = node::get_or_insert(root, prefix, value, &eq);
            (next, EntryRef { node })
        })
    }

    /// Remove what is stored under exactly `prefix`, or report [`TableError::NotFound`] when no
    /// node with that prefix exists. Host bits in `prefix` are ignored for matching.
    pub fn try_remove(&mut self, prefix: &P) -> Result<(), TableError>
    where
        T: Clone,
    {
        self.mutate(|root, _| match node::remove(root, prefix, false) {
            Ok(next) => (next, Ok(())),
            Err(e) => (root.clone(), Err(e)),
        })
    }

    /// Remove the entry stored under exactly `prefix`. Returns whether the prefix was found.
    pub fn remove(&mut self, prefix: &P) -> bool
    where
        T: Clone,
    {
        self.try_remove(prefix).is_ok()
    }

    /// Remove every entry that `prefix` covers, including one stored under `prefix` itself.
    /// Removing a range with no entries in it is a no-op.
    pub fn remove_subtree(&mut self, prefix: &P)
    where
        T: Clone,
    {
        self.mutate(|root, _| match node::remove(root, prefix, true) {
            Ok(next) => (next, ()),
            Err(_) => unreachable!("a flattening removal cannot fail"),
        })
    }

    /// Get the entry stored under exactly this prefix.
    ///
    /// The returned [`EntryRef`] keeps the entry alive on its own; it stays valid (and
    /// unchanged) across later modifications of the view.
    pub fn get(&self, prefix: &P) -> Option<EntryRef<P, T>> {
        let root = self.cell.root.load();
        node::lookup_exact(&root, prefix).map(|n| EntryRef { node: n.clone() })
    }

    /// Longest-prefix match. See [`PrefixTable::longest_match`].
    pub fn longest_match(&self, prefix: &P) -> Option<EntryRef<P, T>> {
        let root = self.cell.root.load();
        node::lookup_lpm(&root, prefix).map(|n| EntryRef { node: n.clone() })
    }

    /// The number of entries in the table.
    pub fn len(&self) -> usize {
        size_of(&self.cell.root.load()) as usize
    }

    /// Whether the table has no entries.
    pub fn is_empty(&self) -> bool {
        self.cell.root.load().is_none()
    }

    /// An immutable snapshot of the current contents. O(1): later modifications of this view
    /// build new trees and never touch the nodes the snapshot references.
    pub fn snapshot(&self) -> PrefixTable<P, T> {
        PrefixTable {
            root: self.cell.root.load_full(),
            eq: self.cell.eq,
        }
    }
}

impl<P, T> PrefixTableMut<P, T> {
    pub(crate) fn root_link(&self) -> Link<P, T> {
        self.cell.root.load_full()
    }
}

impl<P, T> Extend<(P, T)> for PrefixTableMut<P, T>
where
    P: Prefix,
    T: Clone,
{
    fn extend<I: IntoIterator<Item = (P, T)>>(&mut self, iter: I) {
        for (p, v) in iter {
            self.insert_or_update(p, v);
        }
    }
}

/// A reference to a single table entry, detached from the table it came from.
///
/// The underlying node is immutable and reference-counted: the reference stays valid however the
/// table is modified afterwards.
pub struct EntryRef<P, T> {
    node: Arc<TrieNode<P, T>>,
}

impl<P, T> Clone for EntryRef<P, T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
        }
    }
}

impl<P, T> EntryRef<P, T> {
    /// The stored prefix, host bits included.
    pub fn prefix(&self) -> &P {
        &self.node.prefix
    }

    /// The stored value.
    pub fn value(&self) -> &T {
        self.node
            .value
            .as_ref()
            .expect("entry references only point at occupied nodes")
    }
}
