//! The generic `Prefix` abstraction that the trie is keyed by.

use ipnet::{Ipv4Net, Ipv6Net};
#[cfg(feature = "ipnetwork")]
use ipnetwork::{Ipv4Network, Ipv6Network};
use num_traits::{CheckedShr, PrimInt, Unsigned, Zero};

/// An IP network prefix: an address of a fixed bit width together with a prefix length.
///
/// Only the first `prefix_len` bits of the address identify the prefix. The remaining (host) bits
/// are carried along verbatim: the table hands back the exact address that was inserted, but never
/// uses host bits to compare, order, or look up prefixes.
pub trait Prefix: Clone + Sized {
    /// The fixed-width unsigned integer holding the address bits, in big-endian bit order (bit 0
    /// is the most significant). One of `u8`, `u16`, `u32`, `u64`, or `u128`.
    type Repr: Unsigned + PrimInt + Zero + CheckedShr;

    /// The raw address bits, host part included.
    fn repr(&self) -> Self::Repr;

    /// The prefix length.
    fn prefix_len(&self) -> u8;

    /// Build a prefix from raw address bits and a prefix length.
    fn from_repr_len(repr: Self::Repr, len: u8) -> Self;

    /// The network part of the address: `repr` with all host bits cleared. Re-implement this if
    /// your type already guarantees a masked representation.
    fn network(&self) -> Self::Repr {
        self.repr() & mask_from_len(self.prefix_len())
    }

    /// The zero-length prefix matching every address.
    fn zero() -> Self {
        Self::from_repr_len(Self::Repr::zero(), 0)
    }

    /// The longest prefix that contains both `self` and `other`.
    fn longest_common_prefix(&self, other: &Self) -> Self {
        let a = self.network();
        let b = other.network();
        let len = ((a ^ b).leading_zeros() as u8)
            .min(self.prefix_len())
            .min(other.prefix_len());
        Self::from_repr_len(a & mask_from_len(len), len)
    }

    /// Whether `other` lies within `self`'s address range. A prefix contains itself.
    fn contains(&self, other: &Self) -> bool {
        if self.prefix_len() > other.prefix_len() {
            return false;
        }
        other.repr() & mask_from_len(self.prefix_len()) == self.network()
    }

    /// Whether the network bit at position `bit` (counted from the most significant bit at
    /// position 0) is set. Host bits always read as zero.
    fn is_bit_set(&self, bit: u8) -> bool {
        let ones = !Self::Repr::zero();
        let mask = ones.checked_shr(bit as u32).unwrap_or_else(Self::Repr::zero)
            ^ ones
                .checked_shr(1u32 + bit as u32)
                .unwrap_or_else(Self::Repr::zero);
        mask & self.network() != Self::Repr::zero()
    }

    /// Whether `self` and `other` name the same prefix, ignoring host bits.
    fn eq(&self, other: &Self) -> bool {
        self.prefix_len() == other.prefix_len() && self.network() == other.network()
    }
}

/// A mask with the first `len` bits set.
pub(crate) fn mask_from_len<R>(len: u8) -> R
where
    R: PrimInt + Zero,
{
    if len as u32 == R::zero().count_zeros() {
        !R::zero()
    } else if len == 0 {
        R::zero()
    } else {
        !((!R::zero()) >> len as usize)
    }
}

/// Whether `key` belongs to the right (bit set) or left (bit cleared) subtree of a node with
/// prefix `branch`. Only meaningful when `branch` strictly contains `key`.
pub(crate) fn to_right<P: Prefix>(branch: &P, key: &P) -> bool {
    key.is_bit_set(branch.prefix_len())
}

impl Prefix for Ipv4Net {
    type Repr = u32;

    fn repr(&self) -> u32 {
        self.addr().into()
    }

    fn prefix_len(&self) -> u8 {
        self.prefix_len()
    }

    fn from_repr_len(repr: u32, len: u8) -> Self {
        Ipv4Net::new(repr.into(), len).unwrap()
    }

    fn network(&self) -> u32 {
        self.network().into()
    }

    fn zero() -> Self {
        Default::default()
    }
}

impl Prefix for Ipv6Net {
    type Repr = u128;

    fn repr(&self) -> u128 {
        self.addr().into()
    }

    fn prefix_len(&self) -> u8 {
        self.prefix_len()
    }

    fn from_repr_len(repr: u128, len: u8) -> Self {
        Ipv6Net::new(repr.into(), len).unwrap()
    }

    fn network(&self) -> u128 {
        self.network().into()
    }

    fn zero() -> Self {
        Default::default()
    }
}

#[cfg(feature = "ipnetwork")]
impl Prefix for Ipv4Network {
    type Repr = u32;

    fn repr(&self) -> u32 {
        self.ip().into()
    }

    fn prefix_len(&self) -> u8 {
        self.prefix()
    }

    fn from_repr_len(repr: u32, len: u8) -> Self {
        Ipv4Network::new(repr.into(), len).unwrap()
    }

    fn network(&self) -> u32 {
        self.network().into()
    }
}

#[cfg(feature = "ipnetwork")]
impl Prefix for Ipv6Network {
    type Repr = u128;

    fn repr(&self) -> u128 {
        self.ip().into()
    }

    fn prefix_len(&self) -> u8 {
        self.prefix()
    }

    fn from_repr_len(repr: u128, len: u8) -> Self {
        Ipv6Network::new(repr.into(), len).unwrap()
    }

    fn network(&self) -> u128 {
        self.network().into()
    }
}

/// Raw prefixes of any width, mostly useful for testing the tree at widths other than 32 or 128.
impl<R> Prefix for (R, u8)
where
    R: Unsigned + PrimInt + Zero + CheckedShr,
{
    type Repr = R;

    fn repr(&self) -> R {
        self.0
    }

    fn prefix_len(&self) -> u8 {
        self.1
    }

    fn from_repr_len(repr: R, len: u8) -> Self {
        (repr, len)
    }
}
