//! Factories for generating instances of pinhold modules.

pub mod mem_status_store;
pub use mem_status_store::MemStatusStoreFactory;

pub mod core_reconciler;
pub use core_reconciler::CoreReconcilerFactory;
