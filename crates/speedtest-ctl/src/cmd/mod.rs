//! CLI command modules.

pub mod http;
pub mod measure;
pub mod network;
pub mod share;
pub mod stats;
