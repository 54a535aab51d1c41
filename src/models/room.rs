use std::time::Instant;

use crate::engine::{Color, GameState};

/// One game room: the rule state plus the connection ids seated on each
/// color. Seats empty out on disconnect; the room itself survives until
/// the last connection leaves.
pub struct Room {
    pub game: GameState,
    pub white_player: Option<String>,
    pub black_player: Option<String>,
}

impl Room {
    pub fn new(time_control_secs: u64) -> Self {
        Room {
            game: GameState::new(time_control_secs),
            white_player: None,
            black_player: None,
        }
    }

    pub fn player(&self, color: Color) -> &Option<String> {
        match color {
            Color::White => &self.white_player,
            Color::Black => &self.black_player,
        }
    }

    pub fn seat(&mut self, color: Color, id: String, now: Instant) {
        match color {
            Color::White => self.white_player = Some(id),
            Color::Black => self.black_player = Some(id),
        }
        if self.white_player.is_some() && self.black_player.is_some() {
            self.game.start_clocks(now);
        }
    }

    /// First free seat honoring the preference, None when full.
    pub fn free_seat(&self, preference: Option<Color>) -> Option<Color> {
        let open = |color: Color| self.player(color).is_none();
        if let Some(wanted) = preference {
            if open(wanted) {
                return Some(wanted);
            }
        }
        [Color::White, Color::Black].into_iter().find(|&c| open(c))
    }

    pub fn clear_seat(&mut self, connection_id: &str) {
        if self.white_player.as_deref() == Some(connection_id) {
            self.white_player = None;
        }
        if self.black_player.as_deref() == Some(connection_id) {
            self.black_player = None;
        }
    }

    pub fn color_of(&self, connection_id: &str) -> Option<Color> {
        if self.white_player.as_deref() == Some(connection_id) {
            Some(Color::White)
        } else if self.black_player.as_deref() == Some(connection_id) {
            Some(Color::Black)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seats_fill_by_preference_then_reject_when_full() {
        let now = Instant::now();
        let mut room = Room::new(0);
        assert_eq!(room.free_seat(Some(Color::Black)), Some(Color::Black));
        room.seat(Color::Black, "a".to_string(), now);
        assert_eq!(room.free_seat(Some(Color::Black)), Some(Color::White));
        room.seat(Color::White, "b".to_string(), now);
        assert_eq!(room.free_seat(None), None);
        assert_eq!(room.color_of("a"), Some(Color::Black));
        room.clear_seat("a");
        assert_eq!(room.free_seat(None), Some(Color::Black));
    }
}
