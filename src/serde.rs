//! Serialization and deserialization as a plain entry list.

use ::serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Prefix, PrefixTable, PrefixTableMut};

impl<P: Serialize, T: Serialize> Serialize for PrefixTable<P, T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let entries: Vec<(&P, &T)> = self.into_iter().collect();
        entries.serialize(serializer)
    }
}

impl<'de, P, T> Deserialize<'de> for PrefixTable<P, T>
where
    P: Prefix + Deserialize<'de>,
    T: PartialEq + Clone + Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries: Vec<(P, T)> = Vec::deserialize(deserializer)?;
        Ok(Self::from_iter(entries))
    }
}

impl<P: Serialize, T: Serialize> Serialize for PrefixTableMut<P, T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let root = self.root_link();
        let entries: Vec<(&P, &T)> = crate::iter::Iter::new(&root).collect();
        entries.serialize(serializer)
    }
}

impl<'de, P, T> Deserialize<'de> for PrefixTableMut<P, T>
where
    P: Prefix + Deserialize<'de>,
    T: PartialEq + Clone + Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries: Vec<(P, T)> = Vec::deserialize(deserializer)?;
        let mut table = PrefixTableMut::new();
        table.extend(entries);
        Ok(table)
    }
}
