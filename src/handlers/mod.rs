//! HTTP and WebSocket request handlers
//!
//! This module organizes all API handlers into logical groups:
//! - `api` - Health check endpoint
//! - `voice` - Voice session WebSocket (recognition, agent, synthesis)

pub mod api;
pub mod voice;

// Re-export commonly used handlers for convenient access
pub use voice::voice_handler;
