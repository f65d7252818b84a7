//! Virtual capture permissions.
//!
//! Statuses are set up front. Prompts either answer on the spot with a
//! scripted answer, or are held until the caller answers them, which stands
//! in for a user looking at a system dialog.

use std::collections::HashMap;

use parking_lot::Mutex;

use photo_capture_core::traits::authorization::{
    AccessCallback, AuthorizationSource, AuthorizationStatus, MediaKind,
};

/// How undetermined prompts are answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptBehavior {
    /// Answer immediately on the requesting thread.
    Answer(bool),
    /// Hold the prompt until [`VirtualAuthorization::answer`].
    Defer,
}

struct AuthorizationState {
    statuses: HashMap<MediaKind, AuthorizationStatus>,
    behavior: PromptBehavior,
    prompts: Vec<(MediaKind, AccessCallback)>,
    prompt_count: usize,
}

pub struct VirtualAuthorization {
    state: Mutex<AuthorizationState>,
}

impl VirtualAuthorization {
    pub fn new(video: AuthorizationStatus, audio: AuthorizationStatus, behavior: PromptBehavior) -> Self {
        Self {
            state: Mutex::new(AuthorizationState {
                statuses: HashMap::from([(MediaKind::Video, video), (MediaKind::Audio, audio)]),
                behavior,
                prompts: Vec::new(),
                prompt_count: 0,
            }),
        }
    }

    /// Both axes already authorized.
    pub fn granted() -> Self {
        Self::new(
            AuthorizationStatus::Authorized,
            AuthorizationStatus::Authorized,
            PromptBehavior::Answer(true),
        )
    }

    /// Both axes already denied.
    pub fn denied() -> Self {
        Self::new(
            AuthorizationStatus::Denied,
            AuthorizationStatus::Denied,
            PromptBehavior::Answer(false),
        )
    }

    /// Both axes undetermined; prompts are answered with `behavior`.
    pub fn undetermined(behavior: PromptBehavior) -> Self {
        Self::new(
            AuthorizationStatus::NotDetermined,
            AuthorizationStatus::NotDetermined,
            behavior,
        )
    }

    pub fn set_status(&self, kind: MediaKind, status: AuthorizationStatus) {
        self.state.lock().statuses.insert(kind, status);
    }

    /// Prompts shown so far.
    pub fn prompt_count(&self) -> usize {
        self.state.lock().prompt_count
    }

    /// Kinds with a prompt still waiting for an answer.
    pub fn pending_prompts(&self) -> Vec<MediaKind> {
        self.state.lock().prompts.iter().map(|(kind, _)| *kind).collect()
    }

    /// Answer every held prompt for `kind`. Returns how many were answered.
    pub fn answer(&self, kind: MediaKind, granted: bool) -> usize {
        let answered: Vec<AccessCallback> = {
            let mut state = self.state.lock();
            state.statuses.insert(kind, status_for(granted));
            let (matching, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut state.prompts)
                .into_iter()
                .partition(|(prompt_kind, _)| *prompt_kind == kind);
            state.prompts = rest;
            matching.into_iter().map(|(_, callback)| callback).collect()
        };

        let count = answered.len();
        for callback in answered {
            callback(granted);
        }
        count
    }
}

fn status_for(granted: bool) -> AuthorizationStatus {
    if granted {
        AuthorizationStatus::Authorized
    } else {
        AuthorizationStatus::Denied
    }
}

impl AuthorizationSource for VirtualAuthorization {
    fn status(&self, kind: MediaKind) -> AuthorizationStatus {
        self.state
            .lock()
            .statuses
            .get(&kind)
            .copied()
            .unwrap_or(AuthorizationStatus::NotDetermined)
    }

    fn request_access(&self, kind: MediaKind, callback: AccessCallback) {
        let mut state = self.state.lock();
        state.prompt_count += 1;
        match state.behavior {
            PromptBehavior::Answer(granted) => {
                state.statuses.insert(kind, status_for(granted));
                drop(state);
                callback(granted);
            }
            PromptBehavior::Defer => state.prompts.push((kind, callback)),
        }
    }
}
