//! Infrastructure Services
//!
//! - **client**: platform transport, reqwest implementation, retry, account calls
//! - **config**: deployment-time configuration and validation
//! - **errors**: the migration error taxonomy

pub mod client;
pub mod config;
pub mod errors;
