//! Chronicle demo: wires the bank-account context onto the in-memory
//! runtime and drives it end to end.

pub mod config;
pub mod error;
pub mod runtime;
