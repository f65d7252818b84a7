pub mod camera_models;
pub mod capture_item;
pub mod captured_photo;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod interruption;
pub mod orientation;
pub mod photo_settings;
pub mod state;
