//! Pinning destination scopes and store keys.

use crate::ObjectId;
use std::sync::Arc;

/// A logical pinning destination / provider under which an object may
/// be pinned independently of other destinations.
///
/// The default scope (local node) is distinct from every named scope.
#[derive(
    Clone,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(transparent)]
pub struct Scope(Option<Arc<str>>);

impl Scope {
    /// The default (unnamed) pinning destination.
    pub const DEFAULT: Scope = Scope(None);

    /// Construct a named scope.
    pub fn named<S: Into<Arc<str>>>(name: S) -> Self {
        Self(Some(name.into()))
    }

    /// The scope name, if this is a named scope.
    pub fn name(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Is this the default scope?
    pub fn is_default(&self) -> bool {
        self.0.is_none()
    }
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0.as_deref() {
            None => f.write_str("default"),
            Some(s) => f.write_str(s),
        }
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

/// The key under which pin state is tracked: one object identity under
/// one pinning scope.
///
/// The job queue's single-flight invariant and the status store are both
/// keyed by this type.
#[derive(
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct PinKey {
    /// The pinnable object.
    pub object: ObjectId,

    /// The destination scope.
    #[serde(default)]
    pub scope: Scope,
}

impl PinKey {
    /// Construct a new pin key.
    pub fn new(object: ObjectId, scope: Scope) -> Self {
        Self { object, scope }
    }
}

impl std::fmt::Display for PinKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.object, self.scope)
    }
}

impl std::fmt::Debug for PinKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}
