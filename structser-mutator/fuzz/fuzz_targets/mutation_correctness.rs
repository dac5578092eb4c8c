#![no_main]

use structser::{decode, encode, EnumSet, Equatable, Serializable};
use structser_mutator::{
    enumeration, product, sum, ByteArrayMutator, Distinct, MutationSettings, RawBytes,
    StructuredMutator,
};

use libfuzzer_sys::fuzz_target;

struct TestByteArrayMutator;

impl ByteArrayMutator for TestByteArrayMutator {
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

enumeration! {
    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Opcode { Load, Store, Jump, Halt }
}

product! {
    #[derive(Debug, Clone, PartialEq)]
    struct Tiny {
        flag: bool,                                 // smallest non-empty product
    }
}

product! {
    #[derive(Debug, Clone, PartialEq)]
    struct Empty {}
}

sum! {
    #[derive(Debug, Clone, PartialEq)]
    enum Instruction {
        Nop {},
        Unary { op: Opcode, operand: i64 },
        Block { body: Vec<Vec<u8>>, label: String },
        Raw { bytes: Distinct<Vec<u8>, RawBytes<TestByteArrayMutator>> },
    }
}

product! {
    #[derive(Debug, Clone, PartialEq)]
    struct Program {
        magic: [u8; 4],                             // array without prefix
        instructions: Vec<Instruction>,             // sequence of sums
        nested: Vec<Vec<Vec<u16>>>,                 // deeply nested sequences
        ops: EnumSet<Opcode>,
        tail: Option<(Tiny, Empty, f32, char)>,     // optional tuple of edge cases
        last: u8,
    }
}

// Every mutation and crossover must produce a valid encoding of `Program`
fuzz_target!(|data: &[u8]| {
    let mutator = StructuredMutator::<Program>::new(MutationSettings::default());
    let max_len = data.len() + 256;

    let mutated_bytes = mutator.mutate(data, max_len, 0);
    assert!(mutated_bytes.len() <= max_len);

    let value: Program = decode(&mutated_bytes);
    if mutated_bytes.len() < max_len {
        // Untruncated outputs are exact encodings
        assert_eq!(encode(&value), mutated_bytes);
        assert_eq!(value.encoded_size(), mutated_bytes.len());
    }

    let crossover_bytes = mutator.cross_over(data, &mutated_bytes, max_len, 1);
    assert!(crossover_bytes.len() <= max_len);
    let crossed: Program = decode(&crossover_bytes);
    assert!(decode::<Program>(&encode(&crossed)).equals(&crossed));
});
