pub mod authorization;
pub mod capture_delegate;
pub mod hardware;
pub mod image_normalizer;
pub mod orientation;
pub mod photo_library;
