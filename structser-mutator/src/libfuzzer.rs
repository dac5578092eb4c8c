use crate::bytes::ByteArrayMutator;

/// Byte mutation through libFuzzer's own mutation engine, so raw byte strings benefit from
/// its dictionaries and comparison tracing.
pub struct LibFuzzerByteArrayMutator;

impl ByteArrayMutator for LibFuzzerByteArrayMutator {
    fn new(_seed: u64) -> Self {
        Self {}
    }

    fn mutate(&mut self, bytes: &mut Vec<u8>) {
        let size = bytes.len();
        // Leave libFuzzer room to grow the input
        let max_size = std::cmp::max(size * 2, 64);
        bytes.resize(max_size, 0);
        let new_size = libfuzzer_sys::fuzzer_mutate(bytes, size, max_size);
        bytes.truncate(new_size);
    }

    fn mutate_in_place(&mut self, bytes: &mut [u8]) {
        let size = bytes.len();
        let mut scratch = bytes.to_vec();
        let new_size = libfuzzer_sys::fuzzer_mutate(&mut scratch, size, size);
        // A shrunk result leaves the tail untouched
        bytes[..new_size].copy_from_slice(&scratch[..new_size]);
    }
}

/// Defines a libFuzzer target over a structured input type, together with the custom
/// mutator and crossover hooks that keep every generated input a valid encoding.
///
/// ```ignore
/// structser_mutator::structured_fuzz_target!(|request: &Request| {
///     handle(request);
/// });
/// ```
#[macro_export]
macro_rules! structured_fuzz_target {
    (|$value:ident : &$ty:ty| $body:block) => {
        $crate::libfuzzer_sys::fuzz_target!(|data: &[u8]| {
            $crate::execute::<$ty, _>(data, |$value: &$ty| $body);
        });

        $crate::libfuzzer_sys::fuzz_mutator!(
            |data: &mut [u8], size: usize, max_size: usize, seed: u32| {
                $crate::mutate_in_place::<$ty>(data, size, max_size, seed)
            }
        );

        $crate::libfuzzer_sys::fuzz_crossover!(
            |data1: &[u8], data2: &[u8], out: &mut [u8], seed: u32| {
                $crate::cross_over_into::<$ty>(data1, data2, out, seed)
            }
        );
    };
}
