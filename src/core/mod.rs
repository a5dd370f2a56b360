pub mod board;
pub mod frame_reader;
pub mod notify;
pub mod protocol;
pub mod roster;
pub mod scoring;

pub use board::{spawn_board, BoardHandle, BoardMessage, BoardSnapshot};
pub use frame_reader::{spawn_frame_reader, FrameReader};
pub use notify::{notification_channels, NotificationBus, UiReceivers};
pub use roster::{AthleteRoster, RosterSync};
pub use scoring::{ScoringSnapshot, ScoringState, TimerState};
