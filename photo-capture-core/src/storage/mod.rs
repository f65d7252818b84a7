pub mod photo_library;
