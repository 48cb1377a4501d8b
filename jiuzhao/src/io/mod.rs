//! Side-effecting adapters: configuration files, subprocesses, the model
//! endpoint and prompt templates.

pub mod config;
pub mod model;
pub mod process;
pub mod prompt;
