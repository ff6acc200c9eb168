pub mod config;
pub mod errors;
pub mod media_plan;
pub mod services;
pub mod session;

#[cfg(feature = "server")]
pub mod database;
#[cfg(feature = "server")]
pub mod server;
