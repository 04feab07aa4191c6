//! EndyOS Library
//!
//! Command routing and caching core for the EndyOS voice assistant.

pub mod assistant;
pub mod cache;
pub mod commands;
pub mod config;
pub mod core;
pub mod error;
pub mod messages;
pub mod processor;
pub mod services;
pub mod tts;
