use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;

use structser::{DefaultValue, Equatable, Reader, Serializable};

use crate::context::MutationContext;
use crate::mutator::Mutatable;
use crate::random::RandomSource;

/// Per-type overrides for a [`Distinct`] value.
///
/// Every method defaults to the underlying type's behaviour, so a strategy only spells out
/// what it narrows. A strategy that overrides `decode` or `encode` owns the byte layout and
/// must keep `encoded_size` in agreement with `encode`.
pub trait Strategy<T: Mutatable> {
    fn decode(reader: &mut Reader<'_>) -> T {
        T::decode(reader)
    }

    fn encode(value: &T, out: &mut Vec<u8>) {
        value.encode(out);
    }

    fn encoded_size(value: &T) -> usize {
        value.encoded_size()
    }

    fn default_value() -> T {
        T::default_value()
    }

    fn equals(a: &T, b: &T) -> bool {
        a.equals(b)
    }

    fn mutate(value: &mut T, ctx: &mut MutationContext) -> bool {
        value.mutate(ctx)
    }

    fn post_process(value: &mut T, rand: &mut RandomSource) {
        value.post_process(rand);
    }

    /// Takes `other` wholesale, since mixing two in-domain values may leave the domain.
    fn cross_over(value: &mut T, other: &T, ctx: &mut MutationContext) -> bool {
        if Self::equals(value, other) {
            return false;
        }
        let growth = Self::encoded_size(other).saturating_sub(Self::encoded_size(value));
        if !ctx.try_grow(growth) {
            return false;
        }
        *value = other.clone();
        true
    }
}

/// A value of type `T` whose encoding, default and mutation are governed by strategy `S`.
pub struct Distinct<T, S> {
    value: T,
    _strategy: PhantomData<fn() -> S>,
}

impl<T, S> Distinct<T, S> {
    /// Wraps `value` as is. The caller is responsible for it lying in the strategy's domain.
    pub fn new(value: T) -> Self {
        Self {
            value,
            _strategy: PhantomData,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T, S> Deref for Distinct<T, S> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T: Clone, S> Clone for Distinct<T, S> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T: fmt::Debug, S> fmt::Debug for Distinct<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Distinct").field(&self.value).finish()
    }
}

impl<T: PartialEq, S> PartialEq for Distinct<T, S> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: Mutatable, S: Strategy<T>> Serializable for Distinct<T, S> {
    const NESTING_DEPTH: usize = T::NESTING_DEPTH;

    fn decode(reader: &mut Reader<'_>) -> Self {
        if reader.is_exhausted() {
            reader.mark_short();
            return Self::new(S::default_value());
        }
        Self::new(S::decode(reader))
    }

    fn encode(&self, out: &mut Vec<u8>) {
        S::encode(&self.value, out);
    }

    fn encoded_size(&self) -> usize {
        S::encoded_size(&self.value)
    }
}

impl<T: Mutatable, S: Strategy<T>> DefaultValue for Distinct<T, S> {
    fn default_value() -> Self {
        Self::new(S::default_value())
    }
}

impl<T: Mutatable, S: Strategy<T>> Equatable for Distinct<T, S> {
    fn equals(&self, other: &Self) -> bool {
        S::equals(&self.value, &other.value)
    }
}

impl<T: Mutatable, S: Strategy<T>> Mutatable for Distinct<T, S> {
    fn mutate(&mut self, ctx: &mut MutationContext) -> bool {
        S::mutate(&mut self.value, ctx)
    }

    fn post_process(&mut self, rand: &mut RandomSource) {
        S::post_process(&mut self.value, rand);
    }

    fn cross_over(&mut self, other: &Self, ctx: &mut MutationContext) -> bool {
        S::cross_over(&mut self.value, &other.value, ctx)
    }
}
