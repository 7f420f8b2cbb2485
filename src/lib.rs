//! gexpin - gx package pinning gateway
//!
//! Resolves a GitHub repository's last published gx version, has an IPFS
//! node fetch and pin it, and records the pin.

pub mod audit;
pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod netinfo;
pub mod package;
pub mod pin;
pub mod recent;
pub mod resolver;
pub mod server;
pub mod storage;

pub use error::{GexpinError, GexpinResult};
