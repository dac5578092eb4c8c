use std::marker::PhantomData;

use structser::{decode, encode, Serializable};

use crate::config::{MutationSettings, MutatorConfig};
use crate::context::MutationContext;
use crate::mutator::Mutatable;
use crate::random::RandomSource;

/// Runs `target` on the value decoded from `data`.
///
/// Decoding never fails. Whatever the target does, including panicking, is passed through
/// to the caller untouched.
pub fn execute<T, F>(data: &[u8], target: F)
where
    T: Serializable,
    F: FnOnce(&T),
{
    let value: T = decode(data);
    target(&value);
}

/// Structure-aware mutation of encoded `T` values.
pub struct StructuredMutator<T> {
    settings: MutationSettings,
    _value: PhantomData<fn() -> T>,
}

impl<T: Mutatable> StructuredMutator<T> {
    pub fn new(settings: MutationSettings) -> Self {
        Self {
            settings,
            _value: PhantomData,
        }
    }

    /// A mutator using the process-wide configuration.
    pub fn from_global() -> Self {
        Self::new(MutatorConfig::global().mutation)
    }

    pub fn settings(&self) -> &MutationSettings {
        &self.settings
    }

    fn context(&self, data: &[u8], value: &T, max_len: usize, seed: u64) -> MutationContext {
        // A short buffer decodes to a value whose encoding may be longer than the buffer itself
        let current = std::cmp::max(data.len(), value.encoded_size());
        MutationContext::with_settings(
            RandomSource::new(seed),
            max_len.saturating_sub(current),
            max_len,
            self.settings,
        )
    }

    fn finish(&self, mut value: T, ctx: MutationContext) -> Vec<u8> {
        let max_len = ctx.max_len();
        let mut rand = ctx.into_rand();
        value.post_process(&mut rand);

        let mut out = encode(&value);
        if out.len() > max_len {
            tracing::debug!(
                encoded_len = out.len(),
                max_len,
                "truncating mutated value to the maximum length"
            );
            out.truncate(max_len);
        }
        out
    }

    /// Decodes `data`, mutates the value once, runs the post-processing hooks and returns the
    /// re-encoded result, never longer than `max_len`.
    pub fn mutate(&self, data: &[u8], max_len: usize, seed: u64) -> Vec<u8> {
        let mut value: T = decode(data);
        let mut ctx = self.context(data, &value, max_len, seed);
        let budget = ctx.budget();

        let changed = value.mutate(&mut ctx);
        tracing::trace!(
            input_len = data.len(),
            budget,
            changed,
            seed,
            "mutated structured value"
        );
        self.finish(value, ctx)
    }

    /// Mixes the value encoded in `other` into the value encoded in `data`. Falls back to a
    /// plain mutation when the crossover leaves the value unchanged.
    pub fn cross_over(&self, data: &[u8], other: &[u8], max_len: usize, seed: u64) -> Vec<u8> {
        let mut value: T = decode(data);
        let other: T = decode(other);
        let mut ctx = self.context(data, &value, max_len, seed);

        let mut changed = value.cross_over(&other, &mut ctx);
        if !changed && ctx.enforce_changes() {
            changed = value.mutate(&mut ctx);
        }
        tracing::trace!(input_len = data.len(), changed, seed, "crossed over structured values");
        self.finish(value, ctx)
    }
}

/// Mutates the encoded `T` in `data` with the process-wide configuration.
pub fn mutate<T: Mutatable>(data: &[u8], max_len: usize, seed: u64) -> Vec<u8> {
    StructuredMutator::<T>::from_global().mutate(data, max_len, seed)
}

/// Crosses over two encoded `T` values with the process-wide configuration.
pub fn cross_over<T: Mutatable>(data: &[u8], other: &[u8], max_len: usize, seed: u64) -> Vec<u8> {
    StructuredMutator::<T>::from_global().cross_over(data, other, max_len, seed)
}

/// In-place variant of [`mutate`] with libFuzzer's custom mutator calling convention: the
/// input is `data[..size]`, the result is written to the front of `data` and its length
/// returned.
pub fn mutate_in_place<T: Mutatable>(
    data: &mut [u8],
    size: usize,
    max_size: usize,
    seed: u32,
) -> usize {
    let size = std::cmp::min(size, data.len());
    let max_len = std::cmp::min(max_size, data.len());
    let out = mutate::<T>(&data[..size], max_len, u64::from(seed));
    data[..out.len()].copy_from_slice(&out);
    out.len()
}

/// In-place variant of [`cross_over`] with libFuzzer's custom crossover calling convention.
pub fn cross_over_into<T: Mutatable>(data1: &[u8], data2: &[u8], out: &mut [u8], seed: u32) -> usize {
    let crossed = cross_over::<T>(data1, data2, out.len(), u64::from(seed));
    out[..crossed.len()].copy_from_slice(&crossed);
    crossed.len()
}
