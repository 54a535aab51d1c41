use thiserror::Error;

/// Why a submission was refused. Every rejection is deterministic for the
/// same inputs, is reported to the submitting side only, and leaves the
/// game state untouched.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reject {
    #[error("no piece on the source square")]
    NoPieceAtSource,
    #[error("that piece belongs to the opponent")]
    WrongColor,
    #[error("the same piece cannot move in two consecutive rounds")]
    RepeatedPiece,
    #[error("the move is not legal for that piece")]
    IllegalMove,
    #[error("the move would leave your king in check")]
    KingStillInCheck,
    #[error("a move is already submitted for this round")]
    AlreadySubmitted,
    #[error("no promotion is pending on that square")]
    SquareMismatch,
    #[error("no promotion is pending")]
    NoPendingPromotion,
    #[error("a pawn cannot promote to that piece")]
    InvalidPieceType,
    #[error("the game is already over")]
    GameOver,
    #[error("time control can only change before the first move is submitted")]
    TimeControlLocked,
}
