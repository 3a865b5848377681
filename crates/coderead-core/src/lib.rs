//! Core coderead library (renderer, providers, prompts, config).

pub mod analysis;
pub mod config;
pub mod input;
pub mod prompts;
pub mod providers;
pub mod render;
pub mod retry;
pub mod sink;
pub mod state;
