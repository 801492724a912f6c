/// Sound library data model
pub mod library;

/// Hotkey tracking, matching and dispatch
pub mod hotkey;

/// Playback state machine and session management
pub mod playback;

/// Outbound notifications
pub mod events;

/// Shared configuration
pub mod state;

/// Application context wiring
pub mod context;

/// Utility modules
pub mod utils;

pub use context::AppContext;
