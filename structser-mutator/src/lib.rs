//! Type-directed mutation of `structser` values.
//!
//! A fuzzing input is decoded into a typed value, mutated with operators chosen by the value's
//! shape, and re-encoded. Every output is a valid encoding of the same type, so the target
//! never spends time rejecting malformed inputs.

pub mod bytes;
pub mod collection;
pub mod config;
pub mod context;
pub mod distinct;
pub mod driver;
pub mod error;
#[cfg(feature = "libfuzzer")]
pub mod libfuzzer;
mod macros;
pub mod mutator;
pub mod primitive;
pub mod random;
pub mod sampler;
pub mod strategies;

pub use structser;

#[cfg(feature = "libfuzzer")]
pub use libfuzzer_sys;

pub use bytes::{ByteArrayMutator, StdByteArrayMutator};
pub use config::{MutationSettings, MutatorConfig, CONFIG_ENV};
pub use context::MutationContext;
pub use distinct::{Distinct, Strategy};
pub use driver::{cross_over, cross_over_into, execute, mutate, mutate_in_place, StructuredMutator};
pub use error::Error;
#[cfg(feature = "libfuzzer")]
pub use libfuzzer::LibFuzzerByteArrayMutator;
pub use mutator::{adopt, cross_fields, mutate_fields, mutate_sum, switch_variant, Mutatable, SumType};
pub use random::RandomSource;
pub use sampler::ChaoSampler;
pub use strategies::{Magic, Pool, RawBytes, Signature, ValuePool};
