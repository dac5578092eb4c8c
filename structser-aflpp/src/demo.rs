//! A loadable custom mutator for a small key-value protocol, built with `--features demo`.

use structser_mutator::{enumeration, product, sum, Distinct, RandomSource, RawBytes};

use crate::LibAflByteArrayMutator;

enumeration! {
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum Consistency { One, Quorum, All }
}

sum! {
    #[derive(Debug, Clone, PartialEq)]
    pub enum Operation {
        Get { key: String },
        Put { key: String, value: Distinct<Vec<u8>, RawBytes<LibAflByteArrayMutator>> },
        Delete { key: String, if_version: Option<u64> },
        Scan { start: String, limit: u16 },
    }
}

fn fix_batch_length(batch: &mut Batch, _rand: &mut RandomSource) {
    batch.count = batch.operations.len() as u32;
}

product! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Batch {
        pub consistency: Consistency,
        pub count: u32,
        pub operations: Vec<Operation>,
    }
    post_process = fix_batch_length;
}

crate::export_structured_mutator!(Batch);
