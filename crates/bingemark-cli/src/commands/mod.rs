//! Command handlers for the CLI

pub mod bookmark;
pub mod category;
pub mod config;
pub mod export;
pub mod import;
pub mod settings;
pub mod status;
pub mod tag;
