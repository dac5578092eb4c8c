//! Schemas bundled with the command line tool: a Bitcoin-style peer-to-peer message set.

use structser::EnumSet;
use structser_mutator::{
    enumeration, product, sum, Distinct, Magic, Pool, RandomSource, RawBytes, Signature,
    ValuePool,
};

enumeration! {
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum Service { Network, Bloom, Witness, CompactFilters, NetworkLimited }
}

enumeration! {
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub enum InventoryKind { Tx, Block, FilteredBlock, CompactBlock }
}

pub struct RejectCodes;

impl Pool for RejectCodes {
    type Item = u8;
    const VALUES: &'static [u8] = &[0x01, 0x10, 0x11, 0x12, 0x40, 0x41, 0x42, 0x43];
}

pub struct MainnetMagic;

impl Magic for MainnetMagic {
    const BYTES: &'static [u8] = &[0xF9, 0xBE, 0xB4, 0xD9];
}

product! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct TxIn {
        pub prev_txid: [u8; 32],
        pub prev_index: u32,
        pub script_sig: Distinct<Vec<u8>, RawBytes>,
        pub sequence: u32,
    }
}

product! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct TxOut {
        pub value: i64,
        pub script_pubkey: Distinct<Vec<u8>, RawBytes>,
    }
}

product! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Transaction {
        pub version: i32,
        pub inputs: Vec<TxIn>,
        pub outputs: Vec<TxOut>,
        pub lock_time: u32,
    }
}

fn clamp_start_height(message: &mut Message, _rand: &mut RandomSource) {
    if let Message::Version { start_height, .. } = message {
        *start_height = (*start_height).max(0);
    }
}

sum! {
    #[derive(Debug, Clone, PartialEq)]
    pub enum Message {
        Version {
            version: i32,
            services: EnumSet<Service>,
            user_agent: String,
            start_height: i32,
            relay: bool,
        },
        Verack {},
        Ping { nonce: u64 },
        Inv { items: Vec<(InventoryKind, [u8; 32])> },
        Tx { tx: Transaction },
        Reject { code: Distinct<u8, ValuePool<RejectCodes>>, reason: String },
    }
    post_process = clamp_start_height;
}

product! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Envelope {
        pub magic: Distinct<Vec<u8>, Signature<MainnetMagic>>,
        pub message: Message,
    }
}
