//! Route configuration
//!
//! Each submodule builds one router; `main` merges them and applies the
//! shared middleware stack.

pub mod voice;

pub use voice::create_voice_router;
