use thiserror::Error;

/// Failures surfaced by the XR manager.
///
/// Every failure is delivered to the immediate caller through its callback and
/// broadcast as [`XrEvent::Error`](super::XrEvent::Error); none of them abort
/// the rest of the rendering pipeline, and nothing in this subsystem retries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XrError {
    /// The requested session type is not currently available on this device.
    #[error("XR session type is not available")]
    NotAvailable,
    /// A session is already active or being negotiated.
    #[error("XR session is already started")]
    AlreadyStarted,
    /// `end` was called with no live session.
    #[error("XR session is not initialized")]
    NotInitialized,
    /// The host rejected the session request.
    #[error("XR session request failed: {0}")]
    NegotiationFailed(String),
    /// The reference space request was rejected after session creation.
    #[error("XR reference space request failed: {0}")]
    ReferenceSpaceFailed(String),
    /// Pre-flight tracked image preparation failed.
    #[error("XR tracked image preparation failed: {0}")]
    ImagePreparationFailed(String),
    /// A session-type availability query failed; the cached flag is kept.
    #[error("XR availability query failed: {0}")]
    AvailabilityQuery(String),
}
