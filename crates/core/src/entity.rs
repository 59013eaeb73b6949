//! Entity trait: records with a stable identity.

/// Anything persisted under its own identifier (users today).
pub trait Entity {
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> Self::Id;
}
