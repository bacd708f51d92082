// WikiStack - markdown wiki with tag-based page discovery

// Ent Framework - entity traits, builders, hooks and validation
pub mod ent_framework;

// Wiki entities - pages and authors
pub mod entities;

// Storage and HTTP plumbing
pub mod app_state;
pub mod config;
pub mod database;
pub mod middleware;
pub mod wiki_interface;

// Rendering
pub mod markdown;
pub mod views;

// Common utilities
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
