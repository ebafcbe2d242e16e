// Application layer - Session controller and engine orchestration

pub mod container;
pub mod engine_adapter;
pub mod session_controller;

#[cfg(test)]
pub(crate) mod test_support;

pub use container::{AppContainer, DefaultAppContainer};
pub use engine_adapter::MediaEngineAdapter;
pub use session_controller::SessionController;
