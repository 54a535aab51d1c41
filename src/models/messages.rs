use actix::Message;
use serde::{Deserialize, Serialize};

use crate::engine::{CastlingRights, Color, GameResult, GameState, RoundPhase, Square};

/// Message sent from client to server
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClientMessage {
    pub message_type: String,
    pub game_id: Option<String>,
    pub color_preference: Option<String>,
    pub move_from: Option<String>,
    pub move_to: Option<String>,
    /// Promotion piece, either attached to a move or sent on its own in a
    /// `promote` message.
    pub promote_to: Option<String>,
    /// Square a standalone `promote` or `get_moves` message refers to.
    pub square: Option<String>,
    pub time_control_secs: Option<u64>,
}

/// Message sent from server to client
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ServerMessage {
    pub message_type: String,
    pub game_id: Option<String>,
    pub color: Option<String>,
    pub error: Option<String>,
    pub available_moves: Option<Vec<String>>,
    pub game: Option<GameSnapshot>,
}

impl ServerMessage {
    pub fn empty(message_type: &str) -> Self {
        ServerMessage {
            message_type: message_type.to_string(),
            game_id: None,
            color: None,
            error: None,
            available_moves: None,
            game: None,
        }
    }

    pub fn error(text: String) -> Self {
        ServerMessage {
            error: Some(text),
            ..ServerMessage::empty("error")
        }
    }
}

/// One occupied square in a snapshot.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PieceOnSquare {
    pub square: String,
    pub color: Color,
    pub kind: String,
    pub id: u8,
}

/// One side's move from the last resolved round, for client highlighting.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LastMove {
    pub color: Color,
    pub from: String,
    pub to: String,
    pub capture: bool,
    pub collision: bool,
}

/// Everything pushed to the room on every state change: position, check
/// flags, last moves, castling rights, en-passant targets, clocks and the
/// terminal result.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GameSnapshot {
    pub round: u32,
    pub phase: RoundPhase,
    pub status: String,
    pub pieces: Vec<PieceOnSquare>,
    pub check_white: bool,
    pub check_black: bool,
    pub last_moves: Vec<LastMove>,
    pub last_moved_white: Option<u8>,
    pub last_moved_black: Option<u8>,
    pub castling_white: CastlingRights,
    pub castling_black: CastlingRights,
    pub en_passant_white: Option<String>,
    pub en_passant_black: Option<String>,
    pub promotion_pending_white: Option<String>,
    pub promotion_pending_black: Option<String>,
    pub time_control_secs: u64,
    pub time_white_ms: u64,
    pub time_black_ms: u64,
    pub clock_white_active: bool,
    pub clock_black_active: bool,
    pub result: Option<GameResult>,
}

impl GameSnapshot {
    pub fn capture(game: &GameState) -> Self {
        let ctx = game.rule_context();
        let pieces = Square::all()
            .filter_map(|sq| {
                game.position().piece_at(sq).map(|piece| PieceOnSquare {
                    square: sq.to_string(),
                    color: piece.color,
                    kind: piece.kind.to_string(),
                    id: piece.id.0,
                })
            })
            .collect();
        let last_moves = game
            .last_report()
            .map(|report| {
                [Color::White, Color::Black]
                    .into_iter()
                    .map(|color| LastMove {
                        color,
                        from: report.moves[color].from.to_string(),
                        to: report.moves[color].to.to_string(),
                        capture: report.captured[color].is_some(),
                        collision: report.collision.is_some(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        GameSnapshot {
            round: game.round(),
            phase: game.phase(),
            status: super::utils::status_string(game),
            pieces,
            check_white: game.in_check(Color::White),
            check_black: game.in_check(Color::Black),
            last_moves,
            last_moved_white: game.last_moved(Color::White).map(|id| id.0),
            last_moved_black: game.last_moved(Color::Black).map(|id| id.0),
            castling_white: ctx.castling[Color::White],
            castling_black: ctx.castling[Color::Black],
            en_passant_white: ctx.ep_target[Color::White].map(|sq| sq.to_string()),
            en_passant_black: ctx.ep_target[Color::Black].map(|sq| sq.to_string()),
            promotion_pending_white: game.pending_promotion(Color::White).map(|sq| sq.to_string()),
            promotion_pending_black: game.pending_promotion(Color::Black).map(|sq| sq.to_string()),
            time_control_secs: game.time_control_secs(),
            time_white_ms: game.remaining_ms(Color::White),
            time_black_ms: game.remaining_ms(Color::Black),
            clock_white_active: game.clock_active(Color::White),
            clock_black_active: game.clock_active(Color::Black),
            result: game.result(),
        }
    }
}

/// Message type for WebSocket communication
#[derive(Message)]
#[rtype(result = "()")]
pub struct ChessWebSocketMessage(pub String);
