//! # photo-capture-core
//!
//! Platform-agnostic camera capture session core library.
//!
//! Provides the session orchestrator, capture request tracking,
//! authorization, device selection, and photo persistence. Platform
//! backends implement the `CaptureHardware`, `DeviceDiscovery` and
//! `AuthorizationSource` traits and plug into the generic `CaptureSession`.
//!
//! ## Architecture
//!
//! ```text
//! photo-capture-core (this crate)
//! ├── traits/       ← CaptureHardware, PhotoOutput, CaptureDevice, PhotoCaptureDelegate, PhotoLibrary
//! ├── models/       ← SessionError, SessionState, Options, PhotoSettings, CapturedPhoto, etc.
//! ├── session/      ← CaptureSession (orchestrator), SerialQueue, Authorizer, DeviceCatalog, PhotoProcessor
//! └── storage/      ← DirectoryPhotoLibrary
//! ```

pub mod models;
pub mod session;
pub mod storage;
pub mod traits;

// Re-export key types at crate root for convenience.
pub use models::camera_models::{
    AutoToggle, BodyPosition, Camera, DeviceInfo, DevicePosition, DeviceType, Dimensions, ExposureMode,
    FlashMode, FocusMode, Lens, Mode, Point, Toggle,
};
pub use models::capture_item::{PhotoCaptureItem, PhotoCaptureState};
pub use models::captured_photo::{CapturedPhoto, DisplayImage, PhotoFrame, PhotoMetadata, RawImage};
pub use models::config::Options;
pub use models::diagnostics::SessionDiagnostics;
pub use models::error::{LibraryError, PhotoError, PlatformError, QueueError, SessionError};
pub use models::interruption::{InterruptionReason, SessionInterruption};
pub use models::orientation::{ImageOrientation, InterfaceOrientation, VideoOrientation};
pub use models::photo_settings::{
    PhotoCodec, PhotoSettings, PhotoSettingsOptions, ProcessingTimeRange, QualityPrioritization, RequestId,
    ResolvedPhotoSettings,
};
pub use models::state::SessionState;
pub use session::authorizer::{Authorizer, CaptureAuthorization, CompletionMode};
pub use session::catalog::DeviceCatalog;
pub use session::logging::SessionLogger;
pub use session::notifications::{NotificationHub, Subscription};
pub use session::orchestrator::{CaptureSession, Collaborators};
pub use session::published::{ListenerId, PhotoBroadcaster, Published, SessionObservables};
pub use session::queue::{QueueHandle, SerialQueue};
pub use storage::photo_library::DirectoryPhotoLibrary;
pub use traits::authorization::{AccessCallback, AuthorizationSource, AuthorizationStatus, MediaKind};
pub use traits::capture_delegate::{PhotoCaptureDelegate, PhotoCaptureEvent, ProcessedClip};
pub use traits::hardware::{
    CaptureDevice, CaptureHardware, DeviceDiscovery, EventHandler, HardwareEvent, InputId, PhotoOutput,
    SessionPreset, Topic,
};
pub use traits::image_normalizer::{ImageNormalizer, OrientationTagger};
pub use traits::orientation::{FixedOrientation, OrientationHandler, OrientationSource};
pub use traits::photo_library::{PhotoLibrary, SavedPhoto};
