//! Client library for the AI chat-bot backend.
//!
//! Covers code review submission, streamed and plain chat, support ticket
//! analysis, and the configuration, logging and interrupt plumbing shared
//! by front ends.

pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod interrupt;
pub mod logging;
pub mod providers;
pub mod review;
pub mod stream;
pub mod ticket;
