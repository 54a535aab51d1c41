use crate::engine::{Color, EndReason, GameResult, GameState};

/// Convert a color to its wire string
pub fn color_to_string(color: Color) -> String {
    match color {
        Color::White => "white".to_string(),
        Color::Black => "black".to_string(),
    }
}

/// Parse a client color preference; anything unrecognized means "no
/// preference".
pub fn parse_color(value: &str) -> Option<Color> {
    match value.to_ascii_lowercase().as_str() {
        "white" => Some(Color::White),
        "black" => Some(Color::Black),
        _ => None,
    }
}

/// Get the current game status as a string
pub fn status_string(game: &GameState) -> String {
    match game.result() {
        Some(GameResult::WhiteWins(reason)) => format!("white_wins_{}", reason_string(reason)),
        Some(GameResult::BlackWins(reason)) => format!("black_wins_{}", reason_string(reason)),
        Some(GameResult::Draw(reason)) => format!("draw_{}", reason_string(reason)),
        None => {
            if game.in_check(Color::White) && game.in_check(Color::Black) {
                "both_in_check".to_string()
            } else if game.in_check(Color::White) {
                "white_in_check".to_string()
            } else if game.in_check(Color::Black) {
                "black_in_check".to_string()
            } else {
                "in_progress".to_string()
            }
        }
    }
}

fn reason_string(reason: EndReason) -> &'static str {
    match reason {
        EndReason::Checkmate => "checkmate",
        EndReason::DoubleCheckmate => "double_checkmate",
        EndReason::Stalemate => "stalemate",
        EndReason::DoubleStalemate => "double_stalemate",
        EndReason::KingLost => "king_lost",
        EndReason::BothKingsLost => "both_kings_lost",
        EndReason::Timeout => "timeout",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_game_is_in_progress() {
        let game = GameState::new(0);
        assert_eq!(status_string(&game), "in_progress");
    }

    #[test]
    fn color_preference_parsing_is_lenient() {
        assert_eq!(parse_color("White"), Some(Color::White));
        assert_eq!(parse_color("black"), Some(Color::Black));
        assert_eq!(parse_color("random"), None);
    }
}
