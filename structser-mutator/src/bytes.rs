use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Raw byte mutation, used where a value is best treated as an opaque byte string.
pub trait ByteArrayMutator {
    fn new(seed: u64) -> Self;
    /// Mutates `bytes`, possibly changing its length.
    fn mutate(&mut self, bytes: &mut Vec<u8>);
    /// Mutates `bytes` without changing its length.
    fn mutate_in_place(&mut self, bytes: &mut [u8]);
}

/// A small havoc-style byte mutator that needs no fuzzer runtime.
pub struct StdByteArrayMutator {
    rng: SmallRng,
}

impl ByteArrayMutator for StdByteArrayMutator {
    fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    fn mutate(&mut self, bytes: &mut Vec<u8>) {
        match self.rng.gen_range(0..4) {
            0 => self.insert_bytes(bytes),
            1 => self.delete_bytes(bytes),
            _ => self.mutate_in_place(bytes),
        }
    }

    fn mutate_in_place(&mut self, bytes: &mut [u8]) {
        if bytes.is_empty() {
            return;
        }

        // Choose a random mutation strategy
        match self.rng.gen_range(0..5) {
            0 => self.bit_flip(bytes),
            1 => self.byte_flip(bytes),
            2 => self.random_byte(bytes),
            3 => self.add_or_subtract(bytes),
            _ => self.swap_bytes(bytes),
        }
    }
}

impl StdByteArrayMutator {
    // Flip random bits in random bytes
    fn bit_flip(&mut self, bytes: &mut [u8]) {
        let num_mutations = self.rng.gen_range(1..=bytes.len());
        for _ in 0..num_mutations {
            let idx = self.rng.gen_range(0..bytes.len());
            let bit = self.rng.gen_range(0..8);
            bytes[idx] ^= 1 << bit;
        }
    }

    fn byte_flip(&mut self, bytes: &mut [u8]) {
        let num_mutations = self.rng.gen_range(1..=bytes.len());
        for _ in 0..num_mutations {
            let idx = self.rng.gen_range(0..bytes.len());
            bytes[idx] ^= 0xFF;
        }
    }

    fn random_byte(&mut self, bytes: &mut [u8]) {
        let num_mutations = self.rng.gen_range(1..=bytes.len());
        for _ in 0..num_mutations {
            let idx = self.rng.gen_range(0..bytes.len());
            bytes[idx] = self.rng.gen::<u8>();
        }
    }

    fn add_or_subtract(&mut self, bytes: &mut [u8]) {
        let num_mutations = self.rng.gen_range(1..=bytes.len());
        for _ in 0..num_mutations {
            let idx = self.rng.gen_range(0..bytes.len());
            let delta = self.rng.gen_range(1..=4);
            if self.rng.gen_bool(0.5) {
                bytes[idx] = bytes[idx].wrapping_add(delta);
            } else {
                bytes[idx] = bytes[idx].wrapping_sub(delta);
            }
        }
    }

    fn swap_bytes(&mut self, bytes: &mut [u8]) {
        if bytes.len() < 2 {
            return;
        }
        let num_swaps = self.rng.gen_range(1..=bytes.len() / 2);
        for _ in 0..num_swaps {
            let idx1 = self.rng.gen_range(0..bytes.len());
            let idx2 = self.rng.gen_range(0..bytes.len());
            bytes.swap(idx1, idx2);
        }
    }

    // Insert a short run of random bytes
    fn insert_bytes(&mut self, bytes: &mut Vec<u8>) {
        let at = self.rng.gen_range(0..=bytes.len());
        let count = self.rng.gen_range(1..=8);
        let run: Vec<u8> = (0..count).map(|_| self.rng.gen()).collect();
        bytes.splice(at..at, run);
    }

    fn delete_bytes(&mut self, bytes: &mut Vec<u8>) {
        if bytes.is_empty() {
            return;
        }
        let at = self.rng.gen_range(0..bytes.len());
        let count = self.rng.gen_range(1..=bytes.len() - at);
        bytes.drain(at..at + count);
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    /// Overwrites everything with 0xFF, handy for asserting where raw mutation was applied.
    pub struct FillMutator;

    impl ByteArrayMutator for FillMutator {
        fn new(_seed: u64) -> Self {
            Self {}
        }

        fn mutate(&mut self, bytes: &mut Vec<u8>) {
            bytes.fill(0xFF);
        }

        fn mutate_in_place(&mut self, bytes: &mut [u8]) {
            bytes.fill(0xFF);
        }
    }

    #[test]
    fn test_in_place_keeps_length() {
        let mut mutator = StdByteArrayMutator::new(1);
        for len in 0..16 {
            let mut bytes = vec![0u8; len];
            mutator.mutate_in_place(&mut bytes);
            assert_eq!(bytes.len(), len);
        }
    }

    #[test]
    fn test_deterministic() {
        let mut a = StdByteArrayMutator::new(99);
        let mut b = StdByteArrayMutator::new(99);
        let mut x = b"structured".to_vec();
        let mut y = x.clone();
        for _ in 0..50 {
            a.mutate(&mut x);
            b.mutate(&mut y);
        }
        assert_eq!(x, y);
    }

    #[test]
    fn test_mutate_changes_length_sometimes() {
        let mut mutator = StdByteArrayMutator::new(5);
        let mut seen_other_len = false;
        for _ in 0..100 {
            let mut bytes = vec![0u8; 4];
            mutator.mutate(&mut bytes);
            seen_other_len |= bytes.len() != 4;
        }
        assert!(seen_other_len);
    }
}
