use std::sync::OnceLock;

use libafl::{
    corpus::NopCorpus,
    inputs::{BytesInput, HasMutatorBytes},
    mutators::{
        havoc_mutations, scheduled::StdScheduledMutator, tokens_mutations, Mutator, Tokens,
    },
    state::StdState,
    HasMetadata,
};
use libafl_bolts::{rands::StdRand, tuples::Merge};
use structser_mutator::ByteArrayMutator;

/// Environment variable naming a token dictionary for the havoc mutations.
pub const TOKENS_ENV: &str = "STRUCTSER_AFLPP_TOKENS";

/// The dictionary is read once per process, not once per mutation.
fn tokens() -> &'static Tokens {
    static TOKENS: OnceLock<Tokens> = OnceLock::new();
    TOKENS.get_or_init(|| {
        let mut tokens = Tokens::new();
        if let Ok(tokens_file) = std::env::var(TOKENS_ENV) {
            if let Err(err) = tokens.add_from_file(&tokens_file) {
                tracing::warn!(file = %tokens_file, error = %err, "ignoring unreadable token file");
            }
        }
        tokens
    })
}

/// Raw byte mutation through LibAFL's havoc and token mutations.
///
/// Use it as `Distinct<Vec<u8>, RawBytes<LibAflByteArrayMutator>>` for fields that are best
/// fuzzed as unstructured bytes.
pub struct LibAflByteArrayMutator {
    state: StdState<BytesInput, NopCorpus<BytesInput>, StdRand, NopCorpus<BytesInput>>,
}

impl LibAflByteArrayMutator {
    fn havoc(&mut self, bytes: &[u8]) -> BytesInput {
        let mut input = BytesInput::from(bytes.to_vec());
        let mut mutator = StdScheduledMutator::new(havoc_mutations().merge(tokens_mutations()));
        // A skipped mutation leaves the input as is, which callers detect themselves
        let _ = mutator.mutate(&mut self.state, &mut input);
        input
    }
}

impl ByteArrayMutator for LibAflByteArrayMutator {
    fn new(seed: u64) -> Self {
        // Only fails when a feedback cannot initialize its metadata, and there are none
        let mut state = StdState::new(
            StdRand::with_seed(seed),
            NopCorpus::new(),
            NopCorpus::new(),
            &mut (),
            &mut (),
        )
        .expect("state without feedbacks always initializes");
        state.add_metadata(tokens().clone());

        Self { state }
    }

    fn mutate(&mut self, bytes: &mut Vec<u8>) {
        let input = self.havoc(bytes);
        bytes.clear();
        bytes.extend(input.bytes());
    }

    fn mutate_in_place(&mut self, bytes: &mut [u8]) {
        let input = self.havoc(bytes);
        let input_bytes = input.bytes();
        let len_to_copy = std::cmp::min(bytes.len(), input_bytes.len());
        bytes[..len_to_copy].copy_from_slice(&input_bytes[..len_to_copy]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_place_keeps_length() {
        let mut mutator = LibAflByteArrayMutator::new(7);
        for len in 0..32 {
            let mut bytes = vec![0x41u8; len];
            mutator.mutate_in_place(&mut bytes);
            assert_eq!(bytes.len(), len);
        }
    }

    #[test]
    fn test_mutate_eventually_changes_bytes() {
        let mut mutator = LibAflByteArrayMutator::new(1);
        let original = b"structured input".to_vec();
        let changed = (0..32).any(|_| {
            let mut bytes = original.clone();
            mutator.mutate(&mut bytes);
            bytes != original
        });
        assert!(changed);
    }
}
