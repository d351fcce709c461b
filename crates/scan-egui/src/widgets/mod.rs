//! Widgets for the viewer window.

pub mod record_toggle;
pub mod status_bar;

pub use record_toggle::RecordToggle;
pub use status_bar::StatusBar;
