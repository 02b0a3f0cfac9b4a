//! Desired-state source types.

use crate::{BoxFut, ObjectId, PinResult};
use std::sync::Arc;

#[cfg(any(test, feature = "mockall"))]
use mockall::automock;

/// One entry in the desired object set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredObject {
    /// The object identity.
    pub object: ObjectId,

    /// Whether this object is of a pinnable kind. The reconciler
    /// ignores non-pinnable objects entirely.
    pub pinnable: bool,
}

impl DesiredObject {
    /// Construct a pinnable desired object.
    pub fn pinnable(object: ObjectId) -> Self {
        Self {
            object,
            pinnable: true,
        }
    }
}

/// Supplies the current list of objects that should be pinned, e.g. a
/// wallet's owned-asset list.
///
/// May be called at arbitrary times by the reconciler. A single
/// reconcile pass operates on one point-in-time snapshot; mutations
/// during a pass are picked up by the next pass.
#[cfg_attr(any(test, feature = "mockall"), automock)]
pub trait DesiredSource: 'static + Send + Sync + std::fmt::Debug {
    /// Snapshot the desired object set.
    fn list_desired(&self) -> BoxFut<'_, PinResult<Vec<DesiredObject>>>;
}

/// Trait-object [DesiredSource].
pub type DynDesiredSource = Arc<dyn DesiredSource>;
