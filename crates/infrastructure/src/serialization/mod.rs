//! Deterministic JSON encoding for files written by the client.
//!
//! Keys come out in `BTreeMap` order with 2-space indentation and a
//! trailing newline, so rewriting unchanged data yields identical bytes.

mod json;

pub use json::{SerializationError, from_json_bytes, to_json_stable, to_json_stable_bytes};
