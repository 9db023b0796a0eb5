//! Error handling module
//!
//! This module defines the error types and result type aliases used in the application.

use thiserror::Error;
use std::io;

/// HAProxy Autoconf error type
#[derive(Error, Debug)]
pub enum MonitorError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// OpenSSL error
    #[error("OpenSSL error: {0}")]
    Ssl(#[from] openssl::error::ErrorStack),

    /// TLS handshake error
    #[error("TLS handshake error: {0}")]
    TlsHandshake(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid scan range bounds
    #[error("Invalid address range: {0}")]
    InvalidRange(String),

    /// Configuration sink rejected an apply
    #[error("Sink error: {0}")]
    Sink(String),

    /// Control-plane target directory error
    #[error("Tenant directory error: {0}")]
    TenantDirectory(String),
}

/// Result type alias
///
/// This is a `Result` type alias that uses our custom `MonitorError`.
pub type Result<T> = std::result::Result<T, MonitorError>;
