//! TUI module: Terminal User Interface using Ratatui.
//!
//! A single screen with the fourteen-field patient form on the left and
//! the latest prediction on the right.

mod app;
mod styles;
mod ui;

pub use app::App;
pub use styles::MedicalTheme;
