//! Pin backend types.

use crate::{BoxFut, ObjectId, PinResult, Scope};
use std::sync::Arc;

#[cfg(any(test, feature = "mockall"))]
use mockall::automock;

/// Outcome of a successful validate call against the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidateOutcome {
    /// The backend still holds the pin.
    Present,
    /// The backend no longer holds the pin, e.g. it was garbage
    /// collected remotely. This is drift, not an error.
    Absent,
}

/// The content-pinning backend this engine reconciles against.
///
/// All operations are asynchronous and fallible and may take seconds to
/// complete. The reconciler never issues two concurrent operations for
/// the same (object, scope) pair, implementations do not need to guard
/// against that.
#[cfg_attr(any(test, feature = "mockall"), automock)]
pub trait PinBackend: 'static + Send + Sync + std::fmt::Debug {
    /// Request the backend retain and serve the object under the given
    /// scope.
    fn add_pin(
        &self,
        object: ObjectId,
        scope: Scope,
    ) -> BoxFut<'_, PinResult<()>>;

    /// Request the backend release the object under the given scope.
    fn remove_pin(
        &self,
        object: ObjectId,
        scope: Scope,
    ) -> BoxFut<'_, PinResult<()>>;

    /// Check whether the backend actually still holds the pin.
    fn validate(
        &self,
        object: ObjectId,
        scope: Scope,
    ) -> BoxFut<'_, PinResult<ValidateOutcome>>;
}

/// Trait-object [PinBackend].
pub type DynPinBackend = Arc<dyn PinBackend>;
