use serde::{Deserialize, Serialize};

use super::board::{Color, Position};
use super::legality::{has_any_legal_move, is_in_check, RuleContext};

/// Why the game ended; carried alongside the winner for user-facing
/// messaging.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    Checkmate,
    DoubleCheckmate,
    Stalemate,
    DoubleStalemate,
    KingLost,
    BothKingsLost,
    Timeout,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "winner", content = "reason")]
pub enum GameResult {
    WhiteWins(EndReason),
    BlackWins(EndReason),
    Draw(EndReason),
}

/// Decide whether the freshly resolved position ends the game. Runs once
/// per round; once a result is set it is permanent and no further rounds
/// resolve.
///
/// King elimination by collision is checked first and short-circuits the
/// mate logic: a side without a king has already lost, whatever else the
/// board says. Checkmate outranks the winner's own check — delivering mate
/// wins even while checked yourself. Only a double checkmate, or any
/// stalemate, is a draw.
pub fn evaluate(position: &Position, ctx: &RuleContext) -> Option<GameResult> {
    let white_king = position.has_king(Color::White);
    let black_king = position.has_king(Color::Black);
    match (white_king, black_king) {
        (false, false) => return Some(GameResult::Draw(EndReason::BothKingsLost)),
        (false, true) => return Some(GameResult::BlackWins(EndReason::KingLost)),
        (true, false) => return Some(GameResult::WhiteWins(EndReason::KingLost)),
        (true, true) => {}
    }

    let checked = |color| is_in_check(position, color, ctx);
    let stuck = |color| !has_any_legal_move(position, color, ctx, None);

    let white_mated = checked(Color::White) && stuck(Color::White);
    let black_mated = checked(Color::Black) && stuck(Color::Black);
    match (white_mated, black_mated) {
        (true, true) => return Some(GameResult::Draw(EndReason::DoubleCheckmate)),
        (true, false) => return Some(GameResult::BlackWins(EndReason::Checkmate)),
        (false, true) => return Some(GameResult::WhiteWins(EndReason::Checkmate)),
        (false, false) => {}
    }

    let white_stale = !checked(Color::White) && stuck(Color::White);
    let black_stale = !checked(Color::Black) && stuck(Color::Black);
    match (white_stale, black_stale) {
        (true, true) => Some(GameResult::Draw(EndReason::DoubleStalemate)),
        (true, false) | (false, true) => Some(GameResult::Draw(EndReason::Stalemate)),
        (false, false) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::board::{PieceKind, Square};
    use PieceKind::*;

    fn sq(name: &str) -> Square {
        name.parse().expect("valid square")
    }

    fn ctx() -> RuleContext {
        RuleContext::initial()
    }

    #[test]
    fn ongoing_game_has_no_result() {
        assert_eq!(evaluate(&Position::starting(), &ctx()), None);
    }

    #[test]
    fn lost_king_outranks_everything() {
        let position = Position::empty().with_piece(sq("e8"), Color::Black, King);
        assert_eq!(
            evaluate(&position, &ctx()),
            Some(GameResult::BlackWins(EndReason::KingLost))
        );
        assert_eq!(
            evaluate(&Position::empty(), &ctx()),
            Some(GameResult::Draw(EndReason::BothKingsLost))
        );
    }

    #[test]
    fn back_rank_mate_is_a_win() {
        let position = Position::empty()
            .with_piece(sq("h8"), Color::Black, King)
            .with_piece(sq("g7"), Color::Black, Pawn)
            .with_piece(sq("h7"), Color::Black, Pawn)
            .with_piece(sq("b8"), Color::White, Rook)
            .with_piece(sq("e1"), Color::White, King);
        assert_eq!(
            evaluate(&position, &ctx()),
            Some(GameResult::WhiteWins(EndReason::Checkmate))
        );
    }

    #[test]
    fn checkmate_wins_even_while_the_winner_is_in_check() {
        // Black is back-rank mated; white's king is checked by the d3
        // knight. The knight cannot reach the eighth rank to interpose, so
        // black has no answer to the mate, while white's king can still
        // run to d1. White wins outright, no draw.
        let position = Position::empty()
            .with_piece(sq("h8"), Color::Black, King)
            .with_piece(sq("g7"), Color::Black, Pawn)
            .with_piece(sq("h7"), Color::Black, Pawn)
            .with_piece(sq("b8"), Color::White, Rook)
            .with_piece(sq("d3"), Color::Black, Knight)
            .with_piece(sq("e1"), Color::White, King);
        assert_eq!(
            evaluate(&position, &ctx()),
            Some(GameResult::WhiteWins(EndReason::Checkmate))
        );
    }

    #[test]
    fn simultaneous_checkmates_draw() {
        // Mirrored smothered mates: knight checks cannot be blocked and
        // neither side can capture the checking knight, so both kings are
        // mated in the same position.
        let position = Position::empty()
            .with_piece(sq("h1"), Color::White, King)
            .with_piece(sq("g1"), Color::White, Rook)
            .with_piece(sq("g2"), Color::White, Pawn)
            .with_piece(sq("h2"), Color::White, Pawn)
            .with_piece(sq("f2"), Color::Black, Knight)
            .with_piece(sq("h8"), Color::Black, King)
            .with_piece(sq("g8"), Color::Black, Rook)
            .with_piece(sq("g7"), Color::Black, Pawn)
            .with_piece(sq("h7"), Color::Black, Pawn)
            .with_piece(sq("f7"), Color::White, Knight);
        assert_eq!(
            evaluate(&position, &ctx()),
            Some(GameResult::Draw(EndReason::DoubleCheckmate))
        );
    }

    #[test]
    fn stalemate_draws_even_one_sided() {
        let position = Position::empty()
            .with_piece(sq("a1"), Color::White, King)
            .with_piece(sq("b3"), Color::Black, Queen)
            .with_piece(sq("c2"), Color::Black, King);
        assert_eq!(
            evaluate(&position, &ctx()),
            Some(GameResult::Draw(EndReason::Stalemate))
        );
    }
}
