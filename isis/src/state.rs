/// Unique identifier
pub trait Identifier: std::hash::Hash
    + std::fmt::Debug
    + serde::Serialize
    + serde::de::DeserializeOwned
    + Clone
    + Ord
    + Eq
    + Send
    + Sync
    + 'static
{
}

impl<T> Identifier for T where T: std::hash::Hash
    + std::fmt::Debug
    + serde::Serialize
    + serde::de::DeserializeOwned
    + Clone
    + Ord
    + Eq
    + Send
    + Sync
    + 'static
{
}

/// Application message that can be totally ordered.
///
/// All agreement bookkeeping is keyed by `id`, which must be unique
/// across every message submitted by every node.
pub trait Payload: Send
    + Sync
    + Clone
    + std::fmt::Debug
    + serde::Serialize
    + serde::de::DeserializeOwned
    + 'static
{
    type ID: Identifier;
    fn id(&self) -> Self::ID;
}
