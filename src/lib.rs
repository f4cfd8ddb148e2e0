//! yt-match library - shared modules for all binaries.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod export;
pub mod lock;
pub mod models;
pub mod normalize;
pub mod progress;
pub mod provider;
pub mod queries;
pub mod report;
pub mod rescore;
pub mod scoring;
pub mod store;
