pub mod config;
pub mod pipeline;
pub mod state;
pub mod ui;

pub use config::{Config, ConfigError};
pub use state::{FeedController, ViewState};
