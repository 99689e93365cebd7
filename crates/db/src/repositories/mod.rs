//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that accept
//! `&PgPool` as the first argument. Operations used inside the reconciler's
//! transaction take `&mut PgConnection` instead.

pub mod api_key_repo;
pub mod camera_repo;
pub mod detection_log_repo;
pub mod face_image_repo;
pub mod organization_repo;
pub mod person_repo;
pub mod stats_repo;

pub use api_key_repo::ApiKeyRepo;
pub use camera_repo::CameraRepo;
pub use detection_log_repo::DetectionLogRepo;
pub use face_image_repo::FaceImageRepo;
pub use organization_repo::{OrganizationDependents, OrganizationRepo};
pub use person_repo::PersonRepo;
pub use stats_repo::StatsRepo;
