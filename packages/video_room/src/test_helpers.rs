use crate::AppState;
use crate::config::RoomConfig;

/// `AppState` with default config and a live registry actor.
pub fn test_app_state() -> AppState {
    AppState::new(RoomConfig::default())
}
