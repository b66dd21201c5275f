//! Reference-list discovery from image directories.

pub mod file_scanner;

pub use file_scanner::{is_image_extension, FileScanner, ScanConfig, ScanProgress, ScanResult};
