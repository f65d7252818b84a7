use super::error::PhotoError;

/// Counters for best-effort failures and dropped work, for debugging
/// capture sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDiagnostics {
    pub completed_captures: u64,
    pub failed_captures: u64,
    pub last_capture_error: Option<PhotoError>,
    pub focus_lock_failures: u64,
    pub camera_toggle_failures: u64,
    /// Capture callbacks that arrived for requests no longer registered
    /// (the session was reset while they were in flight).
    pub dropped_callbacks: u64,
}
