//! Domain model structs and DTOs.
//!
//! Each submodule contains a `FromRow` + `Serialize` entity struct matching
//! the database row, plus the `Deserialize` DTOs used for inserts and patches.

pub mod api_key;
pub mod camera;
pub mod detection_log;
pub mod face_image;
pub mod organization;
pub mod person;
pub mod stats;
