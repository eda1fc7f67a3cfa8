pub mod client;
pub mod connection;
pub mod consumer;
mod error;
pub mod producer;

pub use error::{Error, Result};
