//! UI layer for desktop GUI: app shell, result images, and native dialogs.

pub mod alert;
pub mod app;
pub mod images;

pub use app::{AnalyzerApp, StartupConfig};
