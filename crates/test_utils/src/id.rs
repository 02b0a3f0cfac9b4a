//! Test utilities associated with ids.

use bytes::Bytes;
use pinhold_api::{id::Id, ObjectId};

use crate::random_bytes;

/// Create a random id.
pub fn random_id() -> Id {
    Id(Bytes::from(random_bytes(32)))
}

/// Create a random object id.
pub fn random_object_id() -> ObjectId {
    ObjectId(random_id())
}

/// Create a list of random object ids.
pub fn create_object_id_list(num: u16) -> Vec<ObjectId> {
    (0..num).map(|_| random_object_id()).collect()
}
