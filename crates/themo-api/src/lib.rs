// themo-api: Async Rust client for the Themo smart thermostat cloud API

pub mod client;
pub mod device;
pub mod error;
pub mod models;
pub mod transport;

mod auth;

pub use client::ThemoClient;
pub use device::Device;
pub use error::Error;
pub use models::{ClientInfo, Environment, Mode, Schedule};
pub use transport::TransportConfig;
