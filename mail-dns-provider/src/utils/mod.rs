//! Utility modules.

/// Log truncation so record content and API bodies are never logged in full.
pub mod log_sanitizer;
