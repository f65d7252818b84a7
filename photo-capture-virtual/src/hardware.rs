//! Virtual hardware capture session.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use photo_capture_core::models::camera_models::Dimensions;
use photo_capture_core::models::error::PlatformError;
use photo_capture_core::models::interruption::InterruptionReason;
use photo_capture_core::session::notifications::{NotificationHub, Subscription};
use photo_capture_core::traits::hardware::{
    CaptureDevice, CaptureHardware, EventHandler, HardwareEvent, InputId, PhotoOutput, SessionPreset, Topic,
};

use crate::discovery::VirtualDiscovery;
use crate::photo_output::VirtualPhotoOutput;

#[derive(Debug)]
struct InputRecord {
    device_id: String,
    attached: bool,
}

#[derive(Debug, Default)]
struct HardwareState {
    configuring: u32,
    begin_count: usize,
    commit_count: usize,
    mutations: usize,
    unbracketed_mutations: usize,
    preset: Option<SessionPreset>,
    next_input: u64,
    inputs: BTreeMap<InputId, InputRecord>,
    photo_output_attached: bool,
    running: bool,
    start_count: usize,
    input_failures: HashMap<String, PlatformError>,
    rejected_devices: HashSet<String>,
    reject_photo_output: bool,
}

impl HardwareState {
    fn mutate(&mut self, what: &str) {
        self.mutations += 1;
        if self.configuring == 0 {
            self.unbracketed_mutations += 1;
            log::debug!("Virtual session mutated outside a configuration transaction: {}", what);
        }
    }
}

/// An in-process capture session.
///
/// Cloning yields another handle to the same session, so a test can keep
/// one while the capture session owns the other. Inputs resolve their
/// formats through the [`VirtualDiscovery`] the hardware was built with.
#[derive(Clone)]
pub struct VirtualCaptureHardware {
    state: Arc<Mutex<HardwareState>>,
    hub: NotificationHub,
    discovery: Arc<VirtualDiscovery>,
    output: VirtualPhotoOutput,
}

impl VirtualCaptureHardware {
    pub fn new(discovery: Arc<VirtualDiscovery>) -> Self {
        Self {
            state: Arc::new(Mutex::new(HardwareState::default())),
            hub: NotificationHub::new(),
            discovery,
            output: VirtualPhotoOutput::new(),
        }
    }

    /// Handle to the session's photo output.
    pub fn output(&self) -> VirtualPhotoOutput {
        self.output.clone()
    }

    // ---- scripting ----

    /// Make `create_input` fail for `device_id`.
    pub fn fail_input(&self, device_id: &str, error: PlatformError) {
        self.state.lock().input_failures.insert(device_id.to_string(), error);
    }

    /// Make `can_add_input` refuse inputs for `device_id`.
    pub fn reject_device(&self, device_id: &str) {
        self.state.lock().rejected_devices.insert(device_id.to_string());
    }

    pub fn reject_photo_output(&self, reject: bool) {
        self.state.lock().reject_photo_output = reject;
    }

    /// Post `event` to its subscribers on the calling thread. Returns the
    /// number of handlers invoked.
    pub fn post(&self, event: HardwareEvent) -> usize {
        self.hub.post(&event)
    }

    /// A runtime failure; the platform stops the session first.
    pub fn post_runtime_error(&self, cause: Option<PlatformError>) -> usize {
        self.state.lock().running = false;
        self.post(HardwareEvent::RuntimeError(cause))
    }

    pub fn post_interruption_began(&self, reason: Option<InterruptionReason>) -> usize {
        self.post(HardwareEvent::InterruptionBegan(reason))
    }

    pub fn post_interruption_ended(&self) -> usize {
        self.post(HardwareEvent::InterruptionEnded)
    }

    pub fn post_format_change(&self) -> usize {
        self.post(HardwareEvent::InputFormatChanged)
    }

    pub fn post_subject_area_change(&self, device_id: &str) -> usize {
        self.post(HardwareEvent::SubjectAreaChanged {
            device_id: device_id.to_string(),
        })
    }

    // ---- inspection ----

    pub fn preset(&self) -> Option<SessionPreset> {
        self.state.lock().preset
    }

    /// Ids of the devices whose inputs are attached, in creation order.
    pub fn attached_devices(&self) -> Vec<String> {
        self.state
            .lock()
            .inputs
            .values()
            .filter(|input| input.attached)
            .map(|input| input.device_id.clone())
            .collect()
    }

    pub fn has_photo_output(&self) -> bool {
        self.state.lock().photo_output_attached
    }

    pub fn start_count(&self) -> usize {
        self.state.lock().start_count
    }

    pub fn begin_count(&self) -> usize {
        self.state.lock().begin_count
    }

    pub fn commit_count(&self) -> usize {
        self.state.lock().commit_count
    }

    pub fn is_configuring(&self) -> bool {
        self.state.lock().configuring > 0
    }

    /// Every state-changing call so far. Subscribing does not count.
    pub fn mutation_count(&self) -> usize {
        self.state.lock().mutations
    }

    /// Input and output changes made outside begin/commit.
    pub fn unbracketed_mutations(&self) -> usize {
        self.state.lock().unbracketed_mutations
    }

    pub fn subscriber_count(&self, topic: &Topic) -> usize {
        self.hub.subscriber_count(topic)
    }

    pub fn total_subscribers(&self) -> usize {
        self.hub.total_subscribers()
    }
}

impl CaptureHardware for VirtualCaptureHardware {
    fn begin_configuration(&mut self) {
        let mut state = self.state.lock();
        state.configuring += 1;
        state.begin_count += 1;
        state.mutations += 1;
    }

    fn commit_configuration(&mut self) {
        let mut state = self.state.lock();
        if state.configuring == 0 {
            log::warn!("Virtual session committed without a matching begin");
            return;
        }
        state.configuring -= 1;
        state.commit_count += 1;
        state.mutations += 1;
    }

    fn set_preset(&mut self, preset: SessionPreset) {
        let mut state = self.state.lock();
        state.mutate("preset");
        state.preset = Some(preset);
    }

    fn create_input(&mut self, device: &Arc<dyn CaptureDevice>) -> Result<InputId, PlatformError> {
        let device_id = device.unique_id();
        let mut state = self.state.lock();
        if let Some(error) = state.input_failures.get(&device_id) {
            return Err(error.clone());
        }
        state.next_input += 1;
        let id = InputId(state.next_input);
        state.inputs.insert(
            id,
            InputRecord {
                device_id,
                attached: false,
            },
        );
        Ok(id)
    }

    fn can_add_input(&self, input: InputId) -> bool {
        let state = self.state.lock();
        let Some(record) = state.inputs.get(&input) else {
            return false;
        };
        let device_in_use = state
            .inputs
            .values()
            .any(|other| other.attached && other.device_id == record.device_id);
        !record.attached && !device_in_use && !state.rejected_devices.contains(&record.device_id)
    }

    fn add_input(&mut self, input: InputId) {
        let mut state = self.state.lock();
        state.mutate("add input");
        if let Some(record) = state.inputs.get_mut(&input) {
            record.attached = true;
        }
    }

    fn remove_input(&mut self, input: InputId) {
        let mut state = self.state.lock();
        state.mutate("remove input");
        state.inputs.remove(&input);
    }

    fn input_dimensions(&self, input: InputId) -> Option<Dimensions> {
        let device_id = self.state.lock().inputs.get(&input)?.device_id.clone();
        self.discovery.device(&device_id).map(|device| device.format())
    }

    fn can_add_photo_output(&self) -> bool {
        let state = self.state.lock();
        !state.photo_output_attached && !state.reject_photo_output
    }

    fn add_photo_output(&mut self) {
        let mut state = self.state.lock();
        state.mutate("add photo output");
        state.photo_output_attached = true;
    }

    fn remove_photo_output(&mut self) {
        let mut state = self.state.lock();
        state.mutate("remove photo output");
        state.photo_output_attached = false;
    }

    fn photo_output(&mut self) -> &mut dyn PhotoOutput {
        &mut self.output
    }

    fn start_running(&mut self) {
        let mut state = self.state.lock();
        if state.configuring > 0 {
            log::warn!("Virtual session started inside a configuration transaction");
        }
        state.mutations += 1;
        state.running = true;
        state.start_count += 1;
    }

    fn stop_running(&mut self) {
        let mut state = self.state.lock();
        state.mutations += 1;
        state.running = false;
    }

    fn is_running(&self) -> bool {
        self.state.lock().running
    }

    fn subscribe(&self, topic: Topic, handler: EventHandler) -> Subscription {
        self.hub.subscribe(topic, handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hardware() -> (Arc<VirtualDiscovery>, VirtualCaptureHardware) {
        let discovery = Arc::new(VirtualDiscovery::standard());
        let hardware = VirtualCaptureHardware::new(Arc::clone(&discovery));
        (discovery, hardware)
    }

    fn device(discovery: &VirtualDiscovery, id: &str) -> Arc<dyn CaptureDevice> {
        let device: Arc<dyn CaptureDevice> = discovery.device(id).unwrap();
        device
    }

    #[test]
    fn inputs_resolve_device_formats() {
        let (discovery, mut hardware) = hardware();
        let camera = device(&discovery, "back-wide");

        hardware.begin_configuration();
        let input = hardware.create_input(&camera).unwrap();
        assert!(hardware.can_add_input(input));
        hardware.add_input(input);
        hardware.commit_configuration();

        assert_eq!(hardware.attached_devices(), vec!["back-wide"]);
        assert_eq!(hardware.input_dimensions(input), Some(Dimensions::new(4032, 3024)));
        assert_eq!(hardware.unbracketed_mutations(), 0);
    }

    #[test]
    fn attached_devices_are_listed_in_input_order() {
        let (discovery, mut hardware) = hardware();
        let mic = device(&discovery, "mic");
        let camera = device(&discovery, "back-wide");

        hardware.begin_configuration();
        let first = hardware.create_input(&mic).unwrap();
        let second = hardware.create_input(&camera).unwrap();
        hardware.add_input(second);
        hardware.add_input(first);
        hardware.commit_configuration();

        assert!(first < second);
        assert_eq!(hardware.attached_devices(), vec!["mic", "back-wide"]);
    }

    #[test]
    fn same_device_cannot_be_added_twice() {
        let (discovery, mut hardware) = hardware();
        let camera = device(&discovery, "back-wide");

        let first = hardware.create_input(&camera).unwrap();
        hardware.add_input(first);
        let second = hardware.create_input(&camera).unwrap();
        assert!(!hardware.can_add_input(second));
        assert_eq!(hardware.unbracketed_mutations(), 1);
    }

    #[test]
    fn scripted_rejections() {
        let (discovery, mut hardware) = hardware();
        hardware.fail_input("mic", PlatformError::new(-11814, "busy"));
        hardware.reject_device("back-wide");
        hardware.reject_photo_output(true);

        assert_eq!(hardware.create_input(&device(&discovery, "mic")).unwrap_err().code, -11814);
        let camera = hardware.create_input(&device(&discovery, "back-wide")).unwrap();
        assert!(!hardware.can_add_input(camera));
        assert!(!hardware.can_add_photo_output());
    }

    #[test]
    fn subscribing_is_not_a_mutation() {
        let (_, hardware) = hardware();
        let subscription = hardware.subscribe(Topic::RuntimeError, Arc::new(|_: &HardwareEvent| {}));
        assert_eq!(hardware.mutation_count(), 0);
        assert_eq!(hardware.post_runtime_error(None), 1);

        drop(subscription);
        assert_eq!(hardware.total_subscribers(), 0);
    }

    #[test]
    fn clones_share_the_session() {
        let (_, mut hardware) = hardware();
        let observer = hardware.clone();
        hardware.start_running();
        assert!(observer.is_running());
        assert_eq!(observer.start_count(), 1);

        observer.post_runtime_error(None);
        assert!(!hardware.is_running());
    }
}
