use super::board::{CastlingRights, Color, Move, PerColor, Piece, PieceKind, Position, Square};
use super::legality::{relocate_castling_rook, RuleContext};

/// Everything a resolved round produced: the merged position plus the
/// bookkeeping deltas the next round's rule context needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub position: Position,
    /// En-passant targets for the *next* round, one per color that
    /// double-advanced this round. Stale targets are always dropped.
    pub ep_target: PerColor<Option<Square>>,
    /// Castling rights after this round's revocations.
    pub castling: PerColor<CastlingRights>,
    /// Set when both moves shared a destination; both movers vanished here.
    pub collision: Option<Square>,
    /// The opposing piece each color captured this round, if any.
    pub captured: PerColor<Option<Piece>>,
    /// Where each color's mover ended up; None when it vanished in a
    /// collision.
    pub landed: PerColor<Option<Square>>,
}

/// Merge two independently-legal moves into one consistent position.
///
/// Both moves were validated against the pre-round position; neither side
/// "moved first". Swerve questions are therefore always answered from the
/// pre-round placement, never from the half-updated copy.
pub fn resolve_round(
    position: &Position,
    ctx: &RuleContext,
    moves: PerColor<Move>,
) -> Resolution {
    resolve_round_ordered(position, ctx, moves, [Color::White, Color::Black])
}

/// The internal per-color processing order is observable only through
/// bugs; it is a parameter so tests can permute it and assert the outcome
/// is identical either way.
pub fn resolve_round_ordered(
    position: &Position,
    ctx: &RuleContext,
    moves: PerColor<Move>,
    order: [Color; 2],
) -> Resolution {
    let mut next = position.clone();
    let mut captured: PerColor<Option<Piece>> = PerColor::splat(None);

    let mover = PerColor::new(
        position
            .piece_at(moves[Color::White].from)
            .expect("white source validated upstream"),
        position
            .piece_at(moves[Color::Black].from)
            .expect("black source validated upstream"),
    );

    // 1. Castling first: it relocates a second piece (the rook), which the
    // generic vacate/occupy steps below know nothing about.
    for color in order {
        if is_castling(mover[color], moves[color]) {
            relocate_castling_rook(&mut next, color, moves[color].to.file() > moves[color].from.file());
        }
    }

    // 2. Record fresh en-passant targets; last round's are gone either way.
    let mut ep_target: PerColor<Option<Square>> = PerColor::splat(None);
    for color in order {
        let mv = moves[color];
        if mover[color].kind == PieceKind::Pawn
            && (mv.to.rank() as i8 - mv.from.rank() as i8).abs() == 2
        {
            ep_target[color] = mv.from.offset(0, color.forward());
        }
    }

    // 3. En-passant captures remove a pawn from a square that is neither
    // move's destination. A victim that itself moves away this round has
    // swerved and is spared.
    for color in order {
        let mv = moves[color];
        if is_en_passant(position, mover[color], mv, ctx, color) {
            let victim = mv
                .to
                .offset(0, -color.forward())
                .expect("en-passant victim square is on the board");
            if moves[color.opponent()].from != victim {
                captured[color] = next.take(victim);
            }
        }
    }

    // 4. Both movers leave their sources.
    for color in order {
        next.take(moves[color].from);
    }

    // 5. Shared destination: the pieces annihilate each other. Neither
    // occupies the square and neither counts as captured.
    if moves[Color::White].to == moves[Color::Black].to {
        let castling = revoke_rights(&next, ctx, &mover);
        return Resolution {
            position: next,
            ep_target,
            castling,
            collision: Some(moves[Color::White].to),
            captured,
            landed: PerColor::splat(None),
        };
    }

    // 6/7. Distinct destinations: each mover occupies its target. Whatever
    // opposing piece still sits there is captured; a defender that moved
    // away this round already vacated the slot (swerve, no capture).
    for color in order {
        let mv = moves[color];
        let mut piece = mover[color];
        if let Some(kind) = mv.promotion {
            if piece.kind == PieceKind::Pawn && mv.to.rank() == color.promotion_rank() {
                // The kind changes, the identity token does not.
                piece.kind = kind;
            }
        }
        if let Some(standing) = next.piece_at(mv.to) {
            if standing.color != color {
                captured[color] = Some(standing);
            }
        }
        next.set(mv.to, Some(piece));
    }

    let castling = revoke_rights(&next, ctx, &mover);
    Resolution {
        position: next,
        ep_target,
        castling,
        collision: None,
        captured,
        landed: PerColor::new(Some(moves[Color::White].to), Some(moves[Color::Black].to)),
    }
}

fn is_castling(piece: Piece, mv: Move) -> bool {
    piece.kind == PieceKind::King && (mv.to.file() as i8 - mv.from.file() as i8).abs() == 2
}

fn is_en_passant(
    position: &Position,
    piece: Piece,
    mv: Move,
    ctx: &RuleContext,
    color: Color,
) -> bool {
    piece.kind == PieceKind::Pawn
        && mv.from.file() != mv.to.file()
        && position.piece_at(mv.to).is_none()
        && ctx.capturable_ep(color) == Some(mv.to)
}

/// Revocation is monotonic: start from the standing rights and only clear.
/// A side loses both rights the moment its king moves, and one right the
/// moment the matching home square no longer holds its rook (moved,
/// captured, or annihilated).
fn revoke_rights(
    position: &Position,
    ctx: &RuleContext,
    mover: &PerColor<Piece>,
) -> PerColor<CastlingRights> {
    let mut castling = ctx.castling;
    for color in [Color::White, Color::Black] {
        if mover[color].kind == PieceKind::King {
            castling[color] = CastlingRights::none();
        }
        let back = color.back_rank();
        for (file, kingside) in [(7u8, true), (0u8, false)] {
            let home_rook = position
                .piece_at(Square::new(file, back))
                .map_or(false, |p| p.color == color && p.kind == PieceKind::Rook);
            if !home_rook {
                if kingside {
                    castling[color].kingside = false;
                } else {
                    castling[color].queenside = false;
                }
            }
        }
    }
    castling
}

#[cfg(test)]
mod tests {
    use super::*;
    use PieceKind::*;

    fn sq(name: &str) -> Square {
        name.parse().expect("valid square")
    }

    fn mv(from: &str, to: &str) -> Move {
        Move::new(sq(from), sq(to))
    }

    fn ctx() -> RuleContext {
        RuleContext::initial()
    }

    fn both_orders(
        position: &Position,
        ctx: &RuleContext,
        moves: PerColor<Move>,
    ) -> (Resolution, Resolution) {
        (
            resolve_round_ordered(position, ctx, moves, [Color::White, Color::Black]),
            resolve_round_ordered(position, ctx, moves, [Color::Black, Color::White]),
        )
    }

    #[test]
    fn opening_round_e4_e5() {
        let position = Position::starting();
        let resolution = resolve_round(
            &position,
            &ctx(),
            PerColor::new(mv("e2", "e4"), mv("e7", "e5")),
        );
        assert_eq!(
            resolution.position.piece_at(sq("e4")).map(|p| p.kind),
            Some(Pawn)
        );
        assert_eq!(
            resolution.position.piece_at(sq("e5")).map(|p| p.kind),
            Some(Pawn)
        );
        assert!(resolution.position.piece_at(sq("e2")).is_none());
        assert!(resolution.position.piece_at(sq("e7")).is_none());
        assert_eq!(resolution.captured, PerColor::splat(None));
        // Both double advances leave a target for the opponent.
        assert_eq!(resolution.ep_target[Color::White], Some(sq("e3")));
        assert_eq!(resolution.ep_target[Color::Black], Some(sq("e6")));
    }

    #[test]
    fn collision_removes_both_movers() {
        let position = Position::empty()
            .with_piece(sq("a1"), Color::White, Rook)
            .with_piece(sq("h5"), Color::Black, Rook)
            .with_piece(sq("e1"), Color::White, King)
            .with_piece(sq("e8"), Color::Black, King);
        let (a, b) = both_orders(&position, &ctx(), PerColor::new(mv("a1", "a5"), mv("h5", "a5")));
        assert_eq!(a, b);
        assert!(a.position.piece_at(sq("a5")).is_none());
        assert!(a.position.piece_at(sq("a1")).is_none());
        assert!(a.position.piece_at(sq("h5")).is_none());
        assert_eq!(a.collision, Some(sq("a5")));
        assert_eq!(a.captured, PerColor::splat(None));
        assert_eq!(a.landed, PerColor::splat(None));
    }

    #[test]
    fn swerve_spares_the_defender() {
        // White pawn takes aim at f6; the knight standing there leaves in
        // the same round. No capture, both destinations honored.
        let position = Position::empty()
            .with_piece(sq("e5"), Color::White, Pawn)
            .with_piece(sq("f6"), Color::Black, Knight)
            .with_piece(sq("e1"), Color::White, King)
            .with_piece(sq("e8"), Color::Black, King);
        let (a, b) = both_orders(&position, &ctx(), PerColor::new(mv("e5", "f6"), mv("f6", "g8")));
        assert_eq!(a, b);
        assert_eq!(a.position.piece_at(sq("f6")).map(|p| p.kind), Some(Pawn));
        assert_eq!(a.position.piece_at(sq("g8")).map(|p| p.kind), Some(Knight));
        assert_eq!(a.captured, PerColor::splat(None));
    }

    #[test]
    fn capture_lands_on_a_defender_that_stayed() {
        let position = Position::empty()
            .with_piece(sq("e5"), Color::White, Pawn)
            .with_piece(sq("f6"), Color::Black, Knight)
            .with_piece(sq("a7"), Color::Black, Pawn)
            .with_piece(sq("e1"), Color::White, King)
            .with_piece(sq("e8"), Color::Black, King);
        let resolution = resolve_round(
            &position,
            &ctx(),
            PerColor::new(mv("e5", "f6"), mv("a7", "a6")),
        );
        assert_eq!(
            resolution.position.piece_at(sq("f6")).map(|p| p.kind),
            Some(Pawn)
        );
        assert_eq!(
            resolution.captured[Color::White].map(|p| p.kind),
            Some(Knight)
        );
        assert_eq!(resolution.captured[Color::Black], None);
    }

    #[test]
    fn resolution_is_order_independent_with_mutual_captures() {
        // Each side captures the other's mover's neighbor while the movers
        // trade squares diagonally; permuted processing must agree.
        let position = Position::empty()
            .with_piece(sq("d4"), Color::White, Queen)
            .with_piece(sq("e5"), Color::Black, Queen)
            .with_piece(sq("d5"), Color::Black, Pawn)
            .with_piece(sq("e4"), Color::White, Pawn)
            .with_piece(sq("a1"), Color::White, King)
            .with_piece(sq("h8"), Color::Black, King);
        let (a, b) = both_orders(&position, &ctx(), PerColor::new(mv("d4", "d5"), mv("e5", "e4")));
        assert_eq!(a, b);
        assert_eq!(a.position.piece_at(sq("d5")).map(|p| p.kind), Some(Queen));
        assert_eq!(a.position.piece_at(sq("e4")).map(|p| p.kind), Some(Queen));
        assert_eq!(a.captured[Color::White].map(|p| p.kind), Some(Pawn));
        assert_eq!(a.captured[Color::Black].map(|p| p.kind), Some(Pawn));
    }

    #[test]
    fn mutual_swerve_when_movers_trade_squares() {
        // Rooks aimed at each other's squares pass in flight; neither is
        // captured.
        let position = Position::empty()
            .with_piece(sq("a1"), Color::White, Rook)
            .with_piece(sq("a8"), Color::Black, Rook)
            .with_piece(sq("e1"), Color::White, King)
            .with_piece(sq("e8"), Color::Black, King);
        let (a, b) = both_orders(&position, &ctx(), PerColor::new(mv("a1", "a8"), mv("a8", "a1")));
        assert_eq!(a, b);
        assert_eq!(
            a.position.piece_at(sq("a8")).map(|p| (p.color, p.kind)),
            Some((Color::White, Rook))
        );
        assert_eq!(
            a.position.piece_at(sq("a1")).map(|p| (p.color, p.kind)),
            Some((Color::Black, Rook))
        );
        assert_eq!(a.captured, PerColor::splat(None));
    }

    #[test]
    fn castling_moves_king_and_rook_atomically() {
        let position = Position::empty()
            .with_piece(sq("e1"), Color::White, King)
            .with_piece(sq("h1"), Color::White, Rook)
            .with_piece(sq("e8"), Color::Black, King)
            .with_piece(sq("a7"), Color::Black, Pawn);
        let resolution = resolve_round(
            &position,
            &ctx(),
            PerColor::new(mv("e1", "g1"), mv("a7", "a6")),
        );
        assert_eq!(
            resolution.position.piece_at(sq("g1")).map(|p| p.kind),
            Some(King)
        );
        assert_eq!(
            resolution.position.piece_at(sq("f1")).map(|p| p.kind),
            Some(Rook)
        );
        assert!(resolution.position.piece_at(sq("e1")).is_none());
        assert!(resolution.position.piece_at(sq("h1")).is_none());
        assert_eq!(resolution.castling[Color::White], CastlingRights::none());
    }

    #[test]
    fn en_passant_capture_removes_the_pawn_behind_the_target() {
        let position = Position::empty()
            .with_piece(sq("e5"), Color::White, Pawn)
            .with_piece(sq("d5"), Color::Black, Pawn)
            .with_piece(sq("h2"), Color::Black, Rook)
            .with_piece(sq("e1"), Color::White, King)
            .with_piece(sq("a8"), Color::Black, King);
        let mut context = ctx();
        context.ep_target[Color::Black] = Some(sq("d6"));
        let (a, b) = both_orders(&position, &context, PerColor::new(mv("e5", "d6"), mv("h2", "h3")));
        assert_eq!(a, b);
        assert!(a.position.piece_at(sq("d5")).is_none());
        assert_eq!(a.position.piece_at(sq("d6")).map(|p| p.kind), Some(Pawn));
        assert_eq!(a.captured[Color::White].map(|p| p.kind), Some(Pawn));
        // The used target is not carried into the next round.
        assert_eq!(a.ep_target, PerColor::splat(None));
    }

    #[test]
    fn en_passant_victim_that_flees_is_spared() {
        let position = Position::empty()
            .with_piece(sq("e5"), Color::White, Pawn)
            .with_piece(sq("d5"), Color::Black, Pawn)
            .with_piece(sq("e1"), Color::White, King)
            .with_piece(sq("a8"), Color::Black, King);
        let mut context = ctx();
        context.ep_target[Color::Black] = Some(sq("d6"));
        let (a, b) = both_orders(&position, &context, PerColor::new(mv("e5", "d6"), mv("d5", "d4")));
        assert_eq!(a, b);
        assert_eq!(a.position.piece_at(sq("d4")).map(|p| p.kind), Some(Pawn));
        assert_eq!(a.position.piece_at(sq("d6")).map(|p| p.kind), Some(Pawn));
        assert_eq!(a.captured, PerColor::splat(None));
    }

    #[test]
    fn promotion_changes_kind_but_keeps_identity() {
        let position = Position::empty()
            .with_piece(sq("a7"), Color::White, Pawn)
            .with_piece(sq("e1"), Color::White, King)
            .with_piece(sq("h8"), Color::Black, King)
            .with_piece(sq("h7"), Color::Black, Pawn);
        let pawn_id = position.piece_at(sq("a7")).map(|p| p.id);
        let resolution = resolve_round(
            &position,
            &ctx(),
            PerColor::new(
                Move::promoting(sq("a7"), sq("a8"), Queen),
                mv("h7", "h6"),
            ),
        );
        let promoted = resolution.position.piece_at(sq("a8")).expect("promoted piece");
        assert_eq!(promoted.kind, Queen);
        assert_eq!(Some(promoted.id), pawn_id);
    }

    #[test]
    fn rook_capture_on_home_square_revokes_that_side() {
        let position = Position::empty()
            .with_piece(sq("e1"), Color::White, King)
            .with_piece(sq("h1"), Color::White, Rook)
            .with_piece(sq("a1"), Color::White, Rook)
            .with_piece(sq("h8"), Color::Black, Rook)
            .with_piece(sq("e8"), Color::Black, King)
            .with_piece(sq("a2"), Color::White, Pawn);
        let resolution = resolve_round(
            &position,
            &ctx(),
            PerColor::new(mv("a2", "a3"), mv("h8", "h1")),
        );
        assert!(!resolution.castling[Color::White].kingside);
        assert!(resolution.castling[Color::White].queenside);
        // Black's own h-rook left home too.
        assert!(!resolution.castling[Color::Black].kingside);
    }

    #[test]
    fn king_collision_leaves_both_sides_kingless() {
        let position = Position::empty()
            .with_piece(sq("d4"), Color::White, King)
            .with_piece(sq("f4"), Color::Black, King);
        let (a, b) = both_orders(&position, &ctx(), PerColor::new(mv("d4", "e4"), mv("f4", "e4")));
        assert_eq!(a, b);
        assert!(!a.position.has_king(Color::White));
        assert!(!a.position.has_king(Color::Black));
        assert_eq!(a.collision, Some(sq("e4")));
    }
}
