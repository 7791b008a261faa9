//! Decimal string encodings for circuit-facing JSON
//!
//! Circuit toolchains read field elements as base-10 strings. Digests are
//! read as little-endian integers.

use crate::model::{Hash, Key, Value};
use serde::Serializer;

pub fn hash<S: Serializer>(hash: &Hash, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&hash.to_field())
}

pub fn hashes<S: Serializer>(hashes: &[Hash], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(hashes.iter().map(|hash| hash.to_field().to_string()))
}

pub fn key<S: Serializer>(key: &Key, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(key)
}

pub fn value<S: Serializer>(value: &Value, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}

pub fn pair<S: Serializer>(pair: &[Value; 2], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(pair.iter().map(Value::to_string))
}

pub fn pairs<S: Serializer>(pairs: &[[Value; 2]; 2], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(
        pairs
            .iter()
            .map(|pair| [pair[0].to_string(), pair[1].to_string()]),
    )
}
