pub mod export_service;
pub mod import_service;
pub mod transformation_service;

pub use export_service::*;
pub use import_service::*;
pub use transformation_service::*;
