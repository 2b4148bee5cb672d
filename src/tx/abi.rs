//! Call data for embedded contracts.
//!
//! A call is the first 4 bytes of SHA3-256 over the method signature
//! followed by the arguments in 32-byte words. Static arguments occupy
//! their word directly; strings are written as an offset in the head and
//! a length-prefixed, zero-padded body in the tail.

use crate::address::{sha3, Hash};

const WORD: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbiValue {
    Hash(Hash),
    Str(String),
}

pub fn selector(signature: &str) -> [u8; 4] {
    let h = sha3(signature.as_bytes());
    [h[0], h[1], h[2], h[3]]
}

pub fn encode_call(signature: &str, args: &[AbiValue]) -> Vec<u8> {
    let mut head = Vec::with_capacity(args.len() * WORD);
    let mut tail = Vec::new();
    let head_len = args.len() * WORD;

    for arg in args {
        match arg {
            AbiValue::Hash(h) => head.extend_from_slice(h.as_bytes()),
            AbiValue::Str(s) => {
                head.extend_from_slice(&word_u64((head_len + tail.len()) as u64));
                tail.extend_from_slice(&word_u64(s.len() as u64));
                tail.extend_from_slice(s.as_bytes());
                let pad = (WORD - s.len() % WORD) % WORD;
                tail.resize(tail.len() + pad, 0);
            }
        }
    }

    let mut out = selector(signature).to_vec();
    out.extend_from_slice(&head);
    out.extend_from_slice(&tail);
    out
}

fn word_u64(v: u64) -> [u8; WORD] {
    let mut w = [0u8; WORD];
    w[WORD - 8..].copy_from_slice(&v.to_be_bytes());
    w
}
