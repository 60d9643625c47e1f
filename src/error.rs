//! Error type for the navigation core.
//!
//! C callers only see an integer status or a NULL handle, so the message
//! for the last failing `gn_*` call is parked in a process-wide
//! [`LastError`] and read back through `gn_last_error()`. It stays valid
//! until a later call replaces or clears it.

use std::fmt;

/// Errors that can occur while driving the navigation core.
#[derive(Debug, thiserror::Error)]
pub enum NavError {
    /// The input device driver is missing or the device could not be opened.
    #[error("3D input device unavailable: {0}")]
    DeviceUnavailable(String),

    #[error("Device I/O failed: {0}")]
    DeviceIo(String),

    #[error("Renderer rejected viewpoint: {0}")]
    Render(String),

    #[error("Invalid navigation config: {0}")]
    InvalidConfig(String),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Camera matrix cannot be decomposed into a pose")]
    DegenerateMatrix,

    #[error("Timeout waiting for device events")]
    Timeout,

    #[error("Null pointer argument")]
    NullArgument,
}

/// Thread-safe last-error storage for the C FFI layer.
pub(crate) struct LastError {
    message: std::sync::Mutex<String>,
}

impl LastError {
    pub const fn new() -> Self {
        Self {
            message: std::sync::Mutex::new(String::new()),
        }
    }

    pub fn set(&self, err: &NavError) {
        if let Ok(mut msg) = self.message.lock() {
            *msg = fmt::format(format_args!("{}\0", err));
        }
    }

    pub fn clear(&self) {
        if let Ok(mut msg) = self.message.lock() {
            msg.clear();
        }
    }

    pub fn as_ptr(&self) -> *const std::ffi::c_char {
        match self.message.lock() {
            Ok(msg) if !msg.is_empty() => msg.as_ptr() as *const std::ffi::c_char,
            _ => std::ptr::null(),
        }
    }
}
