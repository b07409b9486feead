//! Serde support for `Arc<T>` fields.
//!
//! Plan nodes hold their children behind `Arc` so subtrees can be shared
//! cheaply during planning. Serde cannot derive through `Arc` without the
//! `rc` feature, so fields use `#[serde(with = "serde_arc")]` and these
//! helpers serialize the inner value directly.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn serialize<S, T>(value: &Arc<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
    T: Serialize,
{
    T::serialize(value.as_ref(), serializer)
}

pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Arc<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Arc::new)
}
