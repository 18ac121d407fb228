pub mod activities;
pub mod app_state;
pub mod backend;
pub mod db;
pub mod error;
pub mod export;
pub mod format_goals;
pub mod goals;
pub mod ingest;
pub mod logging;
pub mod prompt;
pub mod session;
pub mod settings;
pub mod utils;

pub use app_state::{Action, AppState, Busy, Effect, Notice};
pub use error::{Error, Result};
pub use session::{Outcome, Session};
