//! Persisted pin status types.

use crate::Timestamp;

/// The tracked status of one object under one scope.
///
/// Exactly one status value holds per [PinKey](crate::PinKey) at any
/// time. Transitions are driven only by the reconciler and its executor,
/// never by external actors.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub enum PinStatus {
    /// The object is tracked but not pinned.
    NotPinned,
    /// An add intent has been queued but not yet dispatched.
    PinningPending,
    /// An add operation is in flight at the backend.
    PinningInProgress,
    /// The backend holds a pin for this object.
    Pinned,
    /// The last add operation failed, a retry or the next reconcile
    /// pass will resume it.
    PinningFailed,
    /// A delete intent has been queued but not yet dispatched.
    UnpinningPending,
    /// A remove operation is in flight at the backend.
    UnpinningInProgress,
    /// The last remove operation failed, a retry or the next reconcile
    /// pass will resume it.
    UnpinningFailed,
}

impl PinStatus {
    /// Status indicates a pinning flow that was started and must be
    /// completed or cleanly retried.
    pub fn is_pinning(&self) -> bool {
        matches!(
            self,
            PinStatus::PinningPending
                | PinStatus::PinningInProgress
                | PinStatus::PinningFailed
        )
    }

    /// Status indicates an unpinning flow that was started and must be
    /// completed or cleanly retried.
    pub fn is_unpinning(&self) -> bool {
        matches!(
            self,
            PinStatus::UnpinningPending
                | PinStatus::UnpinningInProgress
                | PinStatus::UnpinningFailed
        )
    }
}

impl std::fmt::Display for PinStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PinStatus::NotPinned => "not_pinned",
            PinStatus::PinningPending => "pinning_pending",
            PinStatus::PinningInProgress => "pinning_in_progress",
            PinStatus::Pinned => "pinned",
            PinStatus::PinningFailed => "pinning_failed",
            PinStatus::UnpinningPending => "unpinning_pending",
            PinStatus::UnpinningInProgress => "unpinning_in_progress",
            PinStatus::UnpinningFailed => "unpinning_failed",
        };
        f.write_str(s)
    }
}

/// The record persisted per pin key.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct PinRecord {
    /// The current status.
    pub status: PinStatus,

    /// When a validate last confirmed the pin at the backend.
    ///
    /// Only meaningful while status is [PinStatus::Pinned].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_validated: Option<Timestamp>,
}

impl PinRecord {
    /// Construct a record with no validation time.
    pub fn new(status: PinStatus) -> Self {
        Self {
            status,
            last_validated: None,
        }
    }

    /// Construct a pinned record validated at the given time.
    pub fn pinned_at(last_validated: Timestamp) -> Self {
        Self {
            status: PinStatus::Pinned,
            last_validated: Some(last_validated),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn pinning_unpinning_partitions() {
        for s in [
            PinStatus::PinningPending,
            PinStatus::PinningInProgress,
            PinStatus::PinningFailed,
        ] {
            assert!(s.is_pinning());
            assert!(!s.is_unpinning());
        }
        for s in [
            PinStatus::UnpinningPending,
            PinStatus::UnpinningInProgress,
            PinStatus::UnpinningFailed,
        ] {
            assert!(s.is_unpinning());
            assert!(!s.is_pinning());
        }
        for s in [PinStatus::NotPinned, PinStatus::Pinned] {
            assert!(!s.is_pinning());
            assert!(!s.is_unpinning());
        }
    }

    #[test]
    fn record_serde() {
        let r = PinRecord::pinned_at(Timestamp::from_micros(42));
        let enc = serde_json::to_string(&r).unwrap();
        assert_eq!("{\"status\":\"pinned\",\"lastValidated\":42}", enc);
        let dec: PinRecord = serde_json::from_str(&enc).unwrap();
        assert_eq!(r, dec);

        // lastValidated is optional on the wire
        let dec: PinRecord =
            serde_json::from_str("{\"status\":\"notPinned\"}").unwrap();
        assert_eq!(PinRecord::new(PinStatus::NotPinned), dec);
    }
}
