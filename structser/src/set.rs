use std::fmt;
use std::marker::PhantomData;

use crate::default::DefaultValue;
use crate::equality::Equatable;
use crate::reader::Reader;
use crate::serialize::Serializable;

/// A fieldless enumeration with a small, fixed set of members.
///
/// Ordinals are dense, starting at zero in declaration order.
pub trait Enumeration: Copy + 'static {
    const COUNT: usize;

    fn ordinal(self) -> usize;

    /// Member with the given ordinal, reduced modulo `COUNT`.
    fn from_ordinal(ordinal: usize) -> Self;
}

/// A deduplicated set of enumeration members stored as a bit mask.
///
/// On the wire the set takes `ceil(COUNT / 8)` bytes; the member with ordinal `i` is bit
/// `i % 8` of byte `i / 8`, least-significant bit first.
pub struct EnumSet<E> {
    bits: u64,
    _members: PhantomData<E>,
}

impl<E: Enumeration> EnumSet<E> {
    const ENCODED_LEN: usize = E::COUNT.div_ceil(8);

    const MASK: u64 = if E::COUNT >= 64 {
        u64::MAX
    } else {
        (1u64 << E::COUNT) - 1
    };

    pub fn new() -> Self {
        Self::from_bits(0)
    }

    /// Builds a set from a raw mask, ignoring bits beyond the member count.
    pub fn from_bits(bits: u64) -> Self {
        Self {
            bits: bits & Self::MASK,
            _members: PhantomData,
        }
    }

    pub fn bits(&self) -> u64 {
        self.bits
    }

    pub fn contains(&self, member: E) -> bool {
        self.bits & (1 << member.ordinal()) != 0
    }

    /// Returns true if the member was not already present.
    pub fn insert(&mut self, member: E) -> bool {
        let absent = !self.contains(member);
        self.bits |= 1 << member.ordinal();
        absent
    }

    /// Returns true if the member was present.
    pub fn remove(&mut self, member: E) -> bool {
        let present = self.contains(member);
        self.bits &= !(1 << member.ordinal());
        present
    }

    pub fn toggle(&mut self, member: E) {
        self.bits ^= 1 << member.ordinal();
    }

    pub fn len(&self) -> usize {
        self.bits.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.bits == 0
    }

    /// Members in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = E> + '_ {
        (0..E::COUNT)
            .filter(|ordinal| self.bits & (1 << ordinal) != 0)
            .map(E::from_ordinal)
    }
}

impl<E: Enumeration> Default for EnumSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for EnumSet<E> {
    fn clone(&self) -> Self {
        Self {
            bits: self.bits,
            _members: PhantomData,
        }
    }
}

impl<E> PartialEq for EnumSet<E> {
    fn eq(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}

impl<E> Eq for EnumSet<E> {}

impl<E: Enumeration + fmt::Debug> fmt::Debug for EnumSet<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<E: Enumeration> FromIterator<E> for EnumSet<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        let mut set = Self::new();
        for member in iter {
            set.insert(member);
        }
        set
    }
}

impl<E: Enumeration> Serializable for EnumSet<E> {
    const NESTING_DEPTH: usize = 2;

    fn decode(reader: &mut Reader<'_>) -> Self {
        let bytes = reader.read_bytes(Self::ENCODED_LEN);
        let bits = bytes
            .iter()
            .enumerate()
            .fold(0u64, |bits, (i, byte)| bits | (u64::from(*byte) << (8 * i)));
        Self::from_bits(bits)
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.bits.to_le_bytes()[..Self::ENCODED_LEN]);
    }

    fn encoded_size(&self) -> usize {
        Self::ENCODED_LEN
    }
}

impl<E: Enumeration> DefaultValue for EnumSet<E> {
    fn default_value() -> Self {
        Self::new()
    }
}

impl<E> Equatable for EnumSet<E> {
    fn equals(&self, other: &Self) -> bool {
        self.bits == other.bits
    }
}
