use super::error::SessionError;

/// Capture session state machine.
///
/// State transitions:
/// ```text
/// idle → starting → running ↔ paused
///           ↓          ↓        ↓
///         error ← ─ ─ ─┴─ ─ ─ ─ ┘   (unauthorized, configuration, runtime)
///
/// any ── stop() ──→ idle
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Starting,
    Running,
    Paused,
    Error(SessionError),
}

impl SessionState {
    /// Whether `start()` may be called: nothing is configured or pending.
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Idle | Self::Error(_))
    }

    pub fn is_starting(&self) -> bool {
        matches!(self, Self::Starting)
    }

    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self, Self::Paused)
    }

    /// Whether the hardware session has been configured and not yet torn
    /// down.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    pub fn error(&self) -> Option<&SessionError> {
        match self {
            Self::Error(error) => Some(error),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn active_states() {
        assert!(SessionState::Running.is_active());
        assert!(SessionState::Paused.is_active());
        assert!(!SessionState::Starting.is_active());
        assert!(!SessionState::Error(SessionError::NoCameraFound).is_active());
    }

    #[test]
    fn start_is_accepted_only_from_rest() {
        assert!(SessionState::Idle.can_start());
        assert!(SessionState::Error(SessionError::Unauthorized).can_start());
        assert!(!SessionState::Starting.can_start());
        assert!(!SessionState::Running.can_start());
        assert!(!SessionState::Paused.can_start());
    }

    #[test]
    fn error_accessor() {
        let state = SessionState::Error(SessionError::Unauthorized);
        assert_eq!(state.error(), Some(&SessionError::Unauthorized));
        assert_eq!(SessionState::Idle.error(), None);
    }
}
