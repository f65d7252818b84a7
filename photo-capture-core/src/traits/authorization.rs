/// What a permission applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Video,
    Audio,
}

/// Authorization state of one permission axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorizationStatus {
    NotDetermined,
    Restricted,
    Denied,
    Authorized,
}

impl AuthorizationStatus {
    /// Whether the status is final (no prompt will change it).
    pub fn is_determined(self) -> bool {
        !matches!(self, Self::NotDetermined)
    }
}

/// Callback with the user's answer to an access prompt.
pub type AccessCallback = Box<dyn FnOnce(bool) + Send + 'static>;

/// Platform permission checks for capture.
///
/// Equivalent to the OS privacy/TCC APIs: status checks are synchronous,
/// prompting is asynchronous and may answer on any thread.
pub trait AuthorizationSource: Send + Sync {
    fn status(&self, kind: MediaKind) -> AuthorizationStatus;

    /// Prompt the user for `kind`. `callback` receives `true` if access was
    /// granted.
    fn request_access(&self, kind: MediaKind, callback: AccessCallback);
}
