pub mod app;
pub mod dashboard;
pub mod favorites;
pub mod logging;
pub mod settings;
pub mod toast_log;
