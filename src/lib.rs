// Library surface for the CLI, integration tests and reuse.
// The binary in main.rs only parses arguments and prints.
pub mod app_dirs;
pub mod clock;
pub mod config;
pub mod display;
pub mod error;
pub mod export;
pub mod progress;
pub mod stats;
pub mod storage;
pub mod store;
pub mod tracker;

pub use clock::Clock;
pub use config::{SettingKey, Settings};
pub use error::{PersistenceError, TrackerError, ValidationError};
pub use tracker::{SessionDraft, Tracker};
