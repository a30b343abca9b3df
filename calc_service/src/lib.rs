//! Console and HTTP front ends for the `calculator` crate.

pub mod config;
pub mod logger;
pub mod http;
pub mod handler;
pub mod server;
pub mod console;

pub use config::{Config, ConfigError};
pub use console::run_console;
pub use handler::{CalculateRequest, CalculateResponse, CALCULATE_PATH};
pub use logger::Logger;
pub use server::{Server, ServerStats};
