//! Canonical signing payloads

mod vote_codec;

pub use vote_codec::*;
