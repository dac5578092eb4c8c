//! AFL++ custom mutator for `structser` types.
//!
//! [`StructuredAflMutator`] implements AFL++'s custom mutator interface for any
//! [`Mutatable`] type. A fuzzing harness exports it from a `cdylib` with
//! [`export_structured_mutator!`] and loads the library through `AFL_CUSTOM_MUTATOR_LIBRARY`.
//!
//! Environment:
//! - `STRUCTSER_AFLPP_CONFIG`: TOML file with a [`MutatorConfig`].
//! - `STRUCTSER_AFLPP_DEBUG`: log to stderr (filtered by `RUST_LOG`, `debug` otherwise).
//! - `STRUCTSER_AFLPP_TOKENS`: token dictionary for [`LibAflByteArrayMutator`].

use std::path::Path;

use custom_mutator::CustomMutator;
use structser_mutator::{Mutatable, MutatorConfig, StructuredMutator};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "demo")]
pub mod demo;
mod havoc;

pub use custom_mutator;
pub use havoc::{LibAflByteArrayMutator, TOKENS_ENV};

pub const CONFIG_ENV: &str = "STRUCTSER_AFLPP_CONFIG";
pub const DEBUG_ENV: &str = "STRUCTSER_AFLPP_DEBUG";

#[derive(Debug, thiserror::Error)]
pub enum AflppError {
    #[error("failed to load mutator configuration")]
    Config(#[from] structser_mutator::Error),
}

fn init_debug_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    // AFL++ may initialize several mutator instances in one process
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub struct StructuredAflMutator<T> {
    mutator: StructuredMutator<T>,
    buffer: Vec<u8>,
    seed: u64,
    fuzz_count: u32,
}

impl<T: Mutatable> StructuredAflMutator<T> {
    pub fn with_config(config: &MutatorConfig, seed: u64) -> Self {
        Self {
            mutator: StructuredMutator::new(config.mutation),
            buffer: Vec::with_capacity(1024 * 1024),
            seed,
            fuzz_count: config.fuzz_count,
        }
    }
}

impl<T: Mutatable> CustomMutator for StructuredAflMutator<T> {
    type Error = AflppError;

    fn init(seed: u32) -> Result<Self, Self::Error>
    where
        Self: Sized,
    {
        if std::env::var_os(DEBUG_ENV).is_some() {
            init_debug_logging();
        }

        let config = match std::env::var_os(CONFIG_ENV) {
            Some(path) => MutatorConfig::load_from_file(Path::new(&path))?,
            None => MutatorConfig::default(),
        };
        tracing::debug!(?config, seed, "initialized structured AFL++ mutator");

        Ok(Self::with_config(&config, u64::from(seed)))
    }

    fn fuzz<'b, 's: 'b>(
        &'s mut self,
        buffer: &'b mut [u8],
        add_buff: Option<&[u8]>,
        max_size: usize,
    ) -> Result<Option<&'b [u8]>, Self::Error> {
        let mutated = match add_buff {
            Some(add_buff) => self.mutator.cross_over(buffer, add_buff, max_size, self.seed),
            None => self.mutator.mutate(buffer, max_size, self.seed),
        };
        self.seed = self.seed.wrapping_add(1);

        self.buffer.clear();
        self.buffer.extend_from_slice(&mutated);
        Ok(Some(&self.buffer))
    }

    fn fuzz_count(&mut self, _buffer: &[u8]) -> Result<u32, Self::Error> {
        Ok(self.fuzz_count)
    }
}

/// Exports a [`StructuredAflMutator`] for `$ty` as the AFL++ custom mutator of the current
/// `cdylib`. Use it once per library.
#[macro_export]
macro_rules! export_structured_mutator {
    ($ty:ty) => {
        type ExportedStructuredMutator = $crate::StructuredAflMutator<$ty>;
        $crate::custom_mutator::export_mutator!(ExportedStructuredMutator);
    };
}
