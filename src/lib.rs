pub mod app;
pub mod cache;
pub mod config;
pub mod errors;
pub mod fetch;
pub mod handlers;
pub mod models;
pub mod orchestrator;
pub mod render;
pub mod sequencer;
pub mod state;
pub mod stats;
pub mod ui;
pub mod view_state;
pub mod year_index;

#[cfg(test)]
mod testing;

pub use app::router;
pub use config::resolve_config;
pub use orchestrator::{Event, Orchestrator, Outcome};
pub use state::AppState;
