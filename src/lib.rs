// Public API for integration tests and potential library usage

pub mod backend;
pub mod catalog;
pub mod challenge;
pub mod config;
pub mod protocol;
pub mod selector;
pub mod session;
pub mod state;
pub mod sync;
pub mod types;
pub mod ws;
