use crate::models::camera_models::{ExposureMode, FocusMode, Point};
use crate::models::error::PlatformError;
use crate::traits::hardware::CaptureDevice;

/// A focus and exposure change for one device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusRequest {
    pub point: Point,
    pub focus: FocusMode,
    pub exposure: ExposureMode,
    pub monitor_subject_area_changes: bool,
}

impl FocusRequest {
    /// Single-shot focus and exposure on `point`, watching for the subject
    /// to change afterwards.
    pub fn at_point(point: Point) -> Self {
        Self {
            point,
            focus: FocusMode::AutoFocus,
            exposure: ExposureMode::AutoExpose,
            monitor_subject_area_changes: true,
        }
    }

    /// Continuous focus and exposure at the frame center with monitoring
    /// off. Applied once after the subject area changed.
    pub fn recenter() -> Self {
        Self {
            point: Point::CENTER,
            focus: FocusMode::ContinuousAutoFocus,
            exposure: ExposureMode::ContinuousAutoExposure,
            monitor_subject_area_changes: false,
        }
    }
}

/// Holds a device's configuration lock until dropped.
struct ConfigurationLock<'a> {
    device: &'a dyn CaptureDevice,
}

impl<'a> ConfigurationLock<'a> {
    fn acquire(device: &'a dyn CaptureDevice) -> Result<Self, PlatformError> {
        device.lock_for_configuration()?;
        Ok(Self { device })
    }
}

impl Drop for ConfigurationLock<'_> {
    fn drop(&mut self) {
        self.device.unlock_for_configuration();
    }
}

/// Apply `request` to `device` under its configuration lock. Focus and
/// exposure are each only touched when the device supports both the point
/// of interest and the requested mode.
pub fn focus_and_expose(device: &dyn CaptureDevice, request: &FocusRequest) -> Result<(), PlatformError> {
    let _lock = ConfigurationLock::acquire(device)?;

    if device.is_focus_point_of_interest_supported() && device.is_focus_mode_supported(request.focus) {
        device.set_focus(request.point, request.focus);
    }

    if device.is_exposure_point_of_interest_supported()
        && device.is_exposure_mode_supported(request.exposure)
    {
        device.set_exposure(request.point, request.exposure);
    }

    device.set_subject_area_change_monitoring(request.monitor_subject_area_changes);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::camera_models::{DevicePosition, DeviceType};
    use crate::session::fakes::{DeviceCall, FakeDevice};
    use approx::assert_relative_eq;

    fn device() -> FakeDevice {
        FakeDevice::build("back-wide", DeviceType::BuiltInWideAngleCamera, DevicePosition::Back)
    }

    #[test]
    fn locks_configures_and_unlocks() {
        let device = device();
        let point = Point::new(0.25, 0.75);
        focus_and_expose(&device, &FocusRequest::at_point(point)).unwrap();

        assert_eq!(
            device.calls(),
            vec![
                DeviceCall::Lock,
                DeviceCall::Focus(point, FocusMode::AutoFocus),
                DeviceCall::Exposure(point, ExposureMode::AutoExpose),
                DeviceCall::Monitoring(true),
                DeviceCall::Unlock,
            ]
        );
    }

    #[test]
    fn skips_unsupported_focus_but_still_monitors() {
        let mut device = device();
        device.supports_focus = false;
        focus_and_expose(&device, &FocusRequest::recenter()).unwrap();

        let calls = device.calls();
        assert!(!calls.iter().any(|c| matches!(c, DeviceCall::Focus(..))));
        assert!(calls.contains(&DeviceCall::Monitoring(false)));
        assert_eq!(calls.last(), Some(&DeviceCall::Unlock));
    }

    #[test]
    fn lock_failure_leaves_device_untouched() {
        let mut device = device();
        device.lock_error = Some(PlatformError::new(-11852, "device busy"));

        let error = focus_and_expose(&device, &FocusRequest::at_point(Point::CENTER)).unwrap_err();
        assert_eq!(error.code, -11852);
        assert!(device.calls().is_empty());
    }

    #[test]
    fn recenter_targets_frame_center() {
        let request = FocusRequest::recenter();
        assert_relative_eq!(request.point.x, 0.5);
        assert_relative_eq!(request.point.y, 0.5);
        assert_eq!(request.focus, FocusMode::ContinuousAutoFocus);
        assert!(!request.monitor_subject_area_changes);
    }
}
