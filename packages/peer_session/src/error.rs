use tokio_tungstenite::tungstenite;

/// Failures of the local media capability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    #[error("access to camera/microphone was denied: {0}")]
    PermissionDenied(String),

    #[error("no camera or microphone available")]
    NoDevice,

    #[error("media endpoint unavailable: {0}")]
    Endpoint(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SignalingError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("signaling channel closed")]
    Closed,
}

/// Why a room client stopped participating.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Local capture failed. Terminal: the room was never joined.
    #[error("failed to acquire local media: {0}")]
    Media(#[from] MediaError),

    #[error(transparent)]
    Signaling(#[from] SignalingError),
}
