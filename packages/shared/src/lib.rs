//! Utilities shared by the Irori binaries and their tests.

pub mod logger;
pub mod time;
