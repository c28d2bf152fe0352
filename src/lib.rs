//! Subtrans - streaming subtitle translation client
//!
//! Groups SRT segments into token-bounded batches and reassembles a
//! chat-completion event stream into complete subtitle blocks.

pub mod batch;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod session;
pub mod stream;
pub mod subtitle;
