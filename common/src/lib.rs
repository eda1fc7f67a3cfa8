//! Command set and wire codec shared by pylon clients and test brokers.

pub mod codec;
pub mod id;
pub mod protocol;
pub mod types;
