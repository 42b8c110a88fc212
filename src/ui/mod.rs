//! User interface built with egui

pub mod app;
pub mod components;
pub mod state;
pub mod theme;

pub use app::SampuranaApp;
pub use state::AppState;
pub use theme::Theme;
