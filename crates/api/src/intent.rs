//! Pin intent types.

use crate::{ObjectId, PinKey, Scope};

/// The operation an [Intent] will perform against the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PinOp {
    /// Request the backend retain the object.
    Add,
    /// Request the backend release the object.
    Delete,
    /// Check that a previously pinned object is still held.
    Validate,
}

/// One pending operation against one object under one scope.
///
/// Intents are value-like. Once submitted, ownership passes to the job
/// queue; on failure an intent is reborn with `attempt` incremented and
/// scheduled for delayed re-submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intent {
    /// The target object.
    pub object: ObjectId,

    /// The target scope.
    pub scope: Scope,

    /// The operation to perform.
    pub op: PinOp,

    /// How many times this intent has already failed.
    pub attempt: u32,
}

impl Intent {
    /// Construct a fresh add intent.
    pub fn add(object: ObjectId, scope: Scope) -> Self {
        Self {
            object,
            scope,
            op: PinOp::Add,
            attempt: 0,
        }
    }

    /// Construct a fresh delete intent.
    pub fn delete(object: ObjectId, scope: Scope) -> Self {
        Self {
            object,
            scope,
            op: PinOp::Delete,
            attempt: 0,
        }
    }

    /// Construct a fresh validate intent.
    pub fn validate(object: ObjectId, scope: Scope) -> Self {
        Self {
            object,
            scope,
            op: PinOp::Validate,
            attempt: 0,
        }
    }

    /// The key this intent targets. The job queue holds at most one
    /// intent per key across {queue, current}.
    pub fn key(&self) -> PinKey {
        PinKey::new(self.object.clone(), self.scope.clone())
    }

    /// Rebirth of a failed intent with the attempt count incremented.
    pub fn retry(mut self) -> Self {
        self.attempt += 1;
        self
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?}({}@{}, attempt {})",
            self.op, self.object, self.scope, self.attempt
        )
    }
}
