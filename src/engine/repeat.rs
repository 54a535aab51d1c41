use super::board::{Color, Piece, PieceId, PieceKind, Position};
use super::legality::{has_any_legal_move, is_in_check, RuleContext};

/// The "no repeated piece" rule: a color may not move the same piece
/// identity in two consecutive rounds. Two exceptions re-admit the repeat:
/// the king may always move again while its side is in check, and any piece
/// may move again when it is the only piece with a legal move left.
///
/// The king exception is tested first; the exhaustive enumeration in the
/// second exception is much more expensive.
pub fn repeat_permitted(
    position: &Position,
    color: Color,
    piece: Piece,
    last_moved: Option<PieceId>,
    ctx: &RuleContext,
) -> bool {
    if last_moved != Some(piece.id) {
        return true;
    }
    if piece.kind == PieceKind::King && is_in_check(position, color, ctx) {
        return true;
    }
    !has_any_legal_move(position, color, ctx, Some(piece.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::board::{Move, Square};
    use crate::engine::legality::is_legal;
    use PieceKind::*;

    fn sq(name: &str) -> Square {
        name.parse().expect("valid square")
    }

    fn ctx() -> RuleContext {
        RuleContext::initial()
    }

    #[test]
    fn fresh_piece_is_always_allowed() {
        let position = Position::starting();
        let knight = position.piece_at(sq("g1")).expect("knight");
        assert!(repeat_permitted(&position, Color::White, knight, None, &ctx()));
        assert!(repeat_permitted(
            &position,
            Color::White,
            knight,
            Some(PieceId(200)),
            &ctx()
        ));
    }

    #[test]
    fn consecutive_rounds_with_same_piece_are_rejected() {
        let position = Position::starting();
        let knight = position.piece_at(sq("g1")).expect("knight");
        assert!(!repeat_permitted(
            &position,
            Color::White,
            knight,
            Some(knight.id),
            &ctx()
        ));
    }

    #[test]
    fn checked_king_may_move_twice_in_a_row() {
        let position = Position::empty()
            .with_piece(sq("e1"), Color::White, King)
            .with_piece(sq("e2"), Color::White, Rook)
            .with_piece(sq("e8"), Color::Black, Queen)
            .with_piece(sq("a8"), Color::Black, King)
            .with_piece(sq("d8"), Color::Black, Rook);
        // Not in check: the rook shields e1, so the repeat stays barred.
        let king = position.piece_at(sq("e1")).expect("king");
        assert!(!repeat_permitted(
            &position,
            Color::White,
            king,
            Some(king.id),
            &ctx()
        ));
        // Remove the shield: the checked king escapes the rule.
        let mut checked = position.clone();
        checked.set(sq("e2"), None);
        assert!(repeat_permitted(
            &checked,
            Color::White,
            king,
            Some(king.id),
            &ctx()
        ));
    }

    #[test]
    fn sole_movable_piece_may_repeat() {
        // White's king is stuck in the corner with every escape covered;
        // the pawn is the only piece with a legal move, so it may move
        // again even though it moved last round.
        let position = Position::empty()
            .with_piece(sq("a1"), Color::White, King)
            .with_piece(sq("b3"), Color::Black, Queen)
            .with_piece(sq("c2"), Color::Black, King)
            .with_piece(sq("h3"), Color::White, Pawn);
        let pawn = position.piece_at(sq("h3")).expect("pawn");
        assert!(is_legal(
            &position,
            Color::White,
            Move::new(sq("h3"), sq("h4")),
            &ctx()
        ));
        assert!(repeat_permitted(
            &position,
            Color::White,
            pawn,
            Some(pawn.id),
            &ctx()
        ));
        // Give the king a safe square and the repeat is barred again.
        let mut freed = position.clone();
        freed.set(sq("b3"), None);
        assert!(!repeat_permitted(&freed, Color::White, pawn, Some(pawn.id), &ctx()));
    }
}
