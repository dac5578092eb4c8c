use proptest::prelude::*;

use structser::{decode, encode, DefaultValue, EnumSet, Equatable, Serializable};
use structser_mutator::{
    enumeration, product, sum, MutationContext, MutationSettings, Mutatable, StructuredMutator,
    SumType,
};

enumeration! {
    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Flag { Syn, Ack, Fin, Rst }
}

product! {
    #[derive(Debug, Clone, PartialEq)]
    struct Header {
        version: u8,
        flags: EnumSet<Flag>,
        window: Option<u16>,
    }
}

sum! {
    #[derive(Debug, Clone, PartialEq)]
    enum Frame {
        Nop {},
        Data { stream: u32, payload: Vec<u8> },
        Text { body: String, score: f64 },
        Batch { frames: Vec<(i16, bool)>, tags: [char; 2] },
    }
}

product! {
    #[derive(Debug, Clone, PartialEq)]
    struct Message {
        header: Header,
        frames: Vec<Frame>,
        trailer: Option<(u64, i8)>,
    }
}

fn mutated(seed: u64, rounds: usize) -> Message {
    let mut value = Message::default_value();
    let mut ctx = MutationContext::new(seed, 4096, 4096);
    for _ in 0..rounds {
        value.mutate(&mut ctx);
    }
    value
}

#[test]
fn test_every_frame_variant_is_reached() {
    let mut seen = [false; 4];
    let mut value = Frame::default_value();
    let mut ctx = MutationContext::new(3, 1 << 16, 1 << 16);
    for _ in 0..10_000 {
        value.mutate(&mut ctx);
        seen[value.variant_index()] = true;
    }
    assert_eq!(seen, [true; 4]);
}

#[test]
fn test_empty_input_decodes_to_default() {
    assert!(decode::<Message>(&[]).equals(&Message::default_value()));
    assert!(decode::<Frame>(&[]).equals(&Frame::default_value()));
    assert!(decode::<Header>(&[]).equals(&Header::default_value()));
}

#[test]
fn test_nesting_depth_is_finite() {
    assert!(<Message as Serializable>::NESTING_DEPTH > <Frame as Serializable>::NESTING_DEPTH);
}

proptest! {
    #[test]
    fn prop_mutated_values_roundtrip(seed in any::<u64>(), rounds in 1usize..32) {
        let value = mutated(seed, rounds);
        let bytes = encode(&value);
        prop_assert_eq!(bytes.len(), value.encoded_size());
        let decoded: Message = decode(&bytes);
        prop_assert!(decoded.equals(&value));
    }

    #[test]
    fn prop_decoding_is_total(data in proptest::collection::vec(any::<u8>(), 0..256)) {
        let value: Message = decode(&data);
        let bytes = encode(&value);
        prop_assert_eq!(bytes.len(), value.encoded_size());
        prop_assert!(decode::<Message>(&bytes).equals(&value));
    }

    #[test]
    fn prop_growth_stays_within_budget(
        seed in any::<u64>(),
        rounds in 0usize..16,
        budget in 0usize..64,
    ) {
        let mut value = mutated(seed, rounds);
        let before = value.encoded_size();
        let mut ctx = MutationContext::new(seed ^ 0x5eed, budget, before + budget);
        value.mutate(&mut ctx);
        prop_assert!(value.encoded_size() <= before + budget);
    }

    #[test]
    fn prop_enforced_mutation_changes_value(seed in any::<u64>(), rounds in 0usize..16) {
        let original = mutated(seed, rounds);
        let mut value = original.clone();
        let mut ctx = MutationContext::new(seed.wrapping_add(1), 4096, 4096);
        prop_assert!(value.mutate(&mut ctx));
        prop_assert!(!value.equals(&original));
    }

    #[test]
    fn prop_reported_change_is_real(seed in any::<u64>(), budget in 0usize..8) {
        let original = mutated(seed, 4);
        let mut value = original.clone();
        let mut ctx = MutationContext::new(seed, budget, 4096);
        if value.mutate(&mut ctx) {
            prop_assert!(!value.equals(&original));
        } else {
            prop_assert!(value.equals(&original));
        }
    }

    #[test]
    fn prop_driver_is_deterministic_and_bounded(
        data in proptest::collection::vec(any::<u8>(), 0..128),
        max_len in 0usize..256,
        seed in any::<u64>(),
    ) {
        let mutator = StructuredMutator::<Message>::new(MutationSettings::default());
        let first = mutator.mutate(&data, max_len, seed);
        prop_assert!(first.len() <= max_len);
        prop_assert_eq!(&first, &mutator.mutate(&data, max_len, seed));

        let crossed = mutator.cross_over(&data, &first, max_len, seed);
        prop_assert!(crossed.len() <= max_len);
    }
}
