//! Ready-made strategies for [`Distinct`](crate::Distinct) values.

use std::marker::PhantomData;

use structser::{Equatable, Reader, Serializable, MAX_SEQUENCE_LEN};

use crate::bytes::{ByteArrayMutator, StdByteArrayMutator};
use crate::context::MutationContext;
use crate::distinct::Strategy;
use crate::mutator::Mutatable;
use crate::sampler::ChaoSampler;

/// Mutates a byte vector as an opaque byte string through a [`ByteArrayMutator`].
///
/// The encoding is the regular length-prefixed sequence encoding.
pub struct RawBytes<B = StdByteArrayMutator>(PhantomData<fn() -> B>);

impl<B: ByteArrayMutator> Strategy<Vec<u8>> for RawBytes<B> {
    fn mutate(value: &mut Vec<u8>, ctx: &mut MutationContext) -> bool {
        let original = value.clone();
        let mut mutator = B::new(ctx.rand().next_u64());
        mutator.mutate(value);

        let limit = std::cmp::min(original.len() + ctx.budget(), MAX_SEQUENCE_LEN);
        value.truncate(limit);
        ctx.try_grow(value.len().saturating_sub(original.len()));

        if *value != original {
            return true;
        }
        ctx.enforce_changes() && value.mutate(ctx)
    }
}

/// A fixed set of values for a [`ValuePool`].
pub trait Pool {
    type Item: Copy + 'static;

    const VALUES: &'static [Self::Item];
}

/// Restricts a value to the members of a [`Pool`].
///
/// The value keeps its natural encoding. Decoding a value outside the pool yields the first
/// pool member, which is also the default.
pub struct ValuePool<P>(PhantomData<fn() -> P>);

impl<P: Pool> ValuePool<P> {
    fn members<T>() -> impl Iterator<Item = T>
    where
        P::Item: Into<T>,
    {
        P::VALUES.iter().map(|item| (*item).into())
    }
}

impl<T, P> Strategy<T> for ValuePool<P>
where
    T: Mutatable,
    P: Pool,
    P::Item: Into<T>,
{
    fn decode(reader: &mut Reader<'_>) -> T {
        let value = T::decode(reader);
        if Self::members::<T>().any(|member| member.equals(&value)) {
            return value;
        }
        <Self as Strategy<T>>::default_value()
    }

    fn default_value() -> T {
        Self::members().next().unwrap_or_else(T::default_value)
    }

    fn mutate(value: &mut T, ctx: &mut MutationContext) -> bool {
        let size = value.encoded_size();
        let mut sampler = ChaoSampler::new();
        for member in Self::members::<T>() {
            if !member.equals(value) && ctx.can_grow(member.encoded_size().saturating_sub(size)) {
                sampler.add(ctx.rand(), member, 1);
            }
        }

        let Some(member) = sampler.get_sample() else {
            return false;
        };
        ctx.try_grow(member.encoded_size().saturating_sub(size));
        *value = member;
        true
    }
}

/// A fixed magic byte sequence for a [`Signature`].
pub trait Magic {
    const BYTES: &'static [u8];
}

/// A file or protocol signature: always exactly `M::BYTES`, written without a length prefix
/// and never mutated.
pub struct Signature<M>(PhantomData<fn() -> M>);

impl<M: Magic> Strategy<Vec<u8>> for Signature<M> {
    fn decode(reader: &mut Reader<'_>) -> Vec<u8> {
        reader.read_bytes(M::BYTES.len());
        M::BYTES.to_vec()
    }

    fn encode(_value: &Vec<u8>, out: &mut Vec<u8>) {
        out.extend_from_slice(M::BYTES);
    }

    fn encoded_size(_value: &Vec<u8>) -> usize {
        M::BYTES.len()
    }

    fn default_value() -> Vec<u8> {
        M::BYTES.to_vec()
    }

    fn equals(_a: &Vec<u8>, _b: &Vec<u8>) -> bool {
        true
    }

    fn mutate(_value: &mut Vec<u8>, _ctx: &mut MutationContext) -> bool {
        false
    }

    fn cross_over(_value: &mut Vec<u8>, _other: &Vec<u8>, _ctx: &mut MutationContext) -> bool {
        false
    }
}
