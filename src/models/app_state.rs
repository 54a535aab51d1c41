use actix::Addr;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::Room;
use crate::websocket::ChessWebSocket;

/// Application state shared between connections. Every room mutation
/// happens under the `rooms` lock, so submissions and timer ticks for the
/// same room never interleave partially.
pub struct AppState {
    pub rooms: Mutex<HashMap<String, Room>>,
    pub connections: Mutex<HashMap<String, Vec<String>>>,
    pub sessions: Mutex<HashMap<String, Addr<ChessWebSocket>>>,
}

impl AppState {
    pub fn new() -> Self {
        AppState {
            rooms: Mutex::new(HashMap::new()),
            connections: Mutex::new(HashMap::new()),
            sessions: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
