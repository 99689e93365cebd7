pub mod api_keys;
pub mod cameras;
pub mod faces;
pub mod info;
pub mod logs;
pub mod organizations;
pub mod persons;
pub mod reports;
pub mod sync;
