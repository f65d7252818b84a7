/// Why the hardware suspended the capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterruptionReason {
    VideoDeviceNotAvailableInBackground,
    AudioDeviceInUseByAnotherClient,
    VideoDeviceInUseByAnotherClient,
    VideoDeviceNotAvailableWithMultipleForegroundApps,
    VideoDeviceNotAvailableDueToSystemPressure,
}

impl InterruptionReason {
    /// Maps the platform's raw reason code.
    pub fn from_raw(raw: i64) -> Option<Self> {
        let reason = match raw {
            1 => Self::VideoDeviceNotAvailableInBackground,
            2 => Self::AudioDeviceInUseByAnotherClient,
            3 => Self::VideoDeviceInUseByAnotherClient,
            4 => Self::VideoDeviceNotAvailableWithMultipleForegroundApps,
            5 => Self::VideoDeviceNotAvailableDueToSystemPressure,
            _ => return None,
        };
        Some(reason)
    }
}

/// An active hardware interruption of the capture session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionInterruption {
    pub reason: Option<InterruptionReason>,
}

impl SessionInterruption {
    pub fn new(reason: Option<InterruptionReason>) -> Self {
        Self { reason }
    }

    /// Interruptions caused by another client claiming the device end on
    /// their own; the others need user or system action.
    pub fn is_resumable(&self) -> bool {
        match self.reason {
            Some(InterruptionReason::AudioDeviceInUseByAnotherClient)
            | Some(InterruptionReason::VideoDeviceInUseByAnotherClient) => true,
            Some(InterruptionReason::VideoDeviceNotAvailableWithMultipleForegroundApps)
            | Some(InterruptionReason::VideoDeviceNotAvailableDueToSystemPressure)
            | Some(InterruptionReason::VideoDeviceNotAvailableInBackground)
            | None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_claimed_by_another_client_is_resumable() {
        let video = SessionInterruption::new(Some(InterruptionReason::VideoDeviceInUseByAnotherClient));
        let audio = SessionInterruption::new(Some(InterruptionReason::AudioDeviceInUseByAnotherClient));
        assert!(video.is_resumable());
        assert!(audio.is_resumable());
    }

    #[test]
    fn system_policy_reasons_are_not_resumable() {
        for reason in [
            InterruptionReason::VideoDeviceNotAvailableDueToSystemPressure,
            InterruptionReason::VideoDeviceNotAvailableWithMultipleForegroundApps,
            InterruptionReason::VideoDeviceNotAvailableInBackground,
        ] {
            assert!(!SessionInterruption::new(Some(reason)).is_resumable());
        }
        assert!(!SessionInterruption::new(None).is_resumable());
    }

    #[test]
    fn raw_reason_codes() {
        assert_eq!(
            InterruptionReason::from_raw(5),
            Some(InterruptionReason::VideoDeviceNotAvailableDueToSystemPressure)
        );
        assert_eq!(InterruptionReason::from_raw(0), None);
    }
}
