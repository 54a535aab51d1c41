//! The simultaneous-round rule engine.
//!
//! Both sides submit one move for the same round; neither submission sees
//! the other. Once both are complete the round resolves into a single
//! consistent position, handling captures whose target fled (swerves),
//! mutual annihilation on a shared destination (collisions), castling,
//! en passant and promotion, then re-evaluates check and terminal state.
//!
//! The engine is pure: no I/O, no logging, no clocks of its own beyond
//! the instants its callers hand it.

pub mod board;
pub mod error;
pub mod game;
pub mod legality;
pub mod outcome;
pub mod repeat;
pub mod resolve;

pub use board::{
    CastlingRights, Color, Move, PerColor, Piece, PieceId, PieceKind, Position, Square,
};
pub use error::Reject;
pub use game::{GameState, RoundPhase, RoundReport, SubmitOutcome};
pub use outcome::{EndReason, GameResult};
