//! Formatting implementations for the table handles.

use std::fmt::{Debug, Formatter, Result};

use crate::iter::Iter;
use crate::table::{EntryRef, PrefixTable, PrefixTableMut};

impl<P: Debug, T: Debug> Debug for PrefixTable<P, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_map().entries(Iter::new(&self.root)).finish()
    }
}

impl<P: Debug, T: Debug> Debug for PrefixTableMut<P, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let root = self.root_link();
        f.debug_map().entries(Iter::new(&root)).finish()
    }
}

impl<P: Debug, T: Debug> Debug for EntryRef<P, T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_tuple("EntryRef")
            .field(self.prefix())
            .field(self.value())
            .finish()
    }
}
