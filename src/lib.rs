//! LanguageTool proxy
//!
//! Exposes grammar and spell checking from a self-hosted LanguageTool
//! server through a small JSON contract for web clients.

pub mod adapter;
pub mod cache;
pub mod checker;
pub mod config;
pub mod engine;
pub mod error;
pub mod server;
