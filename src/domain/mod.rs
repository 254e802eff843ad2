//! Handshake capture, capability reporting and the tools that expose them

pub mod handshake;
pub mod report;
pub mod tools;
