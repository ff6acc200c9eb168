pub mod download;
pub mod health;
pub mod lines;
pub mod transform;
pub mod upload;
