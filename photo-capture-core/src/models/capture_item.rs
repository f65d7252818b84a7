use super::photo_settings::{PhotoSettings, RequestId};

/// Progress of an outstanding capture request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhotoCaptureState {
    Capturing,
    ContinuingIndeterminately,
    Finished,
}

/// One outstanding capture request, as published to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoCaptureItem {
    pub id: RequestId,
    pub state: PhotoCaptureState,
}

impl PhotoCaptureItem {
    pub fn new(settings: &PhotoSettings) -> Self {
        Self {
            id: settings.request_id,
            state: PhotoCaptureState::Capturing,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.state == PhotoCaptureState::Finished
    }

    /// Applies an indeterminate-processing signal. Once finished an item
    /// never moves again, and it never returns to `Capturing`.
    pub fn apply_processing_change(&mut self, is_processing: bool) {
        if self.is_finished() {
            return;
        }
        self.state = if is_processing {
            PhotoCaptureState::ContinuingIndeterminately
        } else {
            PhotoCaptureState::Finished
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> PhotoCaptureItem {
        PhotoCaptureItem {
            id: RequestId(42),
            state: PhotoCaptureState::Capturing,
        }
    }

    #[test]
    fn processing_moves_forward_only() {
        let mut item = item();
        item.apply_processing_change(true);
        assert_eq!(item.state, PhotoCaptureState::ContinuingIndeterminately);

        item.apply_processing_change(false);
        assert!(item.is_finished());

        item.apply_processing_change(true);
        assert!(item.is_finished());
    }
}
