//! Justified-row gallery engine: image metadata resolution, row packing,
//! responsive relayout, and lightbox/carousel navigation.

pub mod config;
pub mod image_loader;
pub mod layout;
pub mod models;
pub mod navigation;
pub mod resolver;
pub mod scanner;

pub use config::FolioConfig;
