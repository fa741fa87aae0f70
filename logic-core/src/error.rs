//! Error kinds surfaced by the core (§7).

/// Errors the core can report to a caller.
///
/// `ConfigError` is returned synchronously from [`crate::config::CoreConfig::validate`]
/// and from [`crate::supervisor::Supervisor::configure`]; transport errors arrive on the
/// supervisor's error channel instead, since they're detected from the ingest thread.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("failed to open transport: {0}")]
    TransportOpenError(#[source] std::io::Error),

    #[error("write to transport rejected: {0}")]
    TransportWriteError(#[source] std::io::Error),

    #[error("read from transport failed: {0}")]
    TransportReadError(#[source] std::io::Error),

    #[error("invalid configuration: {0}")]
    ConfigError(String),
}
