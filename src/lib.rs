pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::BoardConfig;

pub use adapters::{HttpBackend, SerialPortLink};
pub use core::{
    notification_channels, spawn_board, spawn_frame_reader, BoardHandle, BoardSnapshot,
    UiReceivers,
};
pub use domain::model::{Athlete, JudgeCommand, Submission};
pub use utils::error::{BoardError, Result};
