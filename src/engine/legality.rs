use super::board::{
    CastlingRights, Color, Move, PerColor, Piece, PieceId, PieceKind, Position, Square,
};

/// Everything beyond piece placement that legality depends on: castling
/// rights and the per-color en-passant targets left by the previous round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleContext {
    pub castling: PerColor<CastlingRights>,
    /// Target recorded for the color that double-advanced last round,
    /// capturable only by its opponent and only this round.
    pub ep_target: PerColor<Option<Square>>,
}

impl RuleContext {
    pub fn initial() -> Self {
        RuleContext {
            castling: PerColor::splat(CastlingRights::initial()),
            ep_target: PerColor::splat(None),
        }
    }

    /// The en-passant square `by` may capture on: the one its opponent
    /// created. A color never captures on its own target.
    pub fn capturable_ep(&self, by: Color) -> Option<Square> {
        self.ep_target[by.opponent()]
    }
}

/// Is `mv` legal for `color` against this position, judged in isolation
/// (no knowledge of the other side's simultaneous move)?
///
/// Own-king safety is deliberately not checked here; callers that need it
/// go through [`leaves_king_exposed`] or the enumeration helpers.
pub fn is_legal(position: &Position, color: Color, mv: Move, ctx: &RuleContext) -> bool {
    is_legal_inner(position, color, mv, ctx, false)
}

/// One code path serves both real validation and the recursive attack
/// probe; `probing` suppresses castling (no infinite regress) and switches
/// pawns to capture geometry only.
fn is_legal_inner(
    position: &Position,
    color: Color,
    mv: Move,
    ctx: &RuleContext,
    probing: bool,
) -> bool {
    if mv.from == mv.to {
        return false;
    }
    let piece = match position.piece_at(mv.from) {
        Some(p) if p.color == color => p,
        _ => return false,
    };
    if let Some(target) = position.piece_at(mv.to) {
        if target.color == color {
            return false;
        }
    }

    let df = mv.to.file() as i8 - mv.from.file() as i8;
    let dr = mv.to.rank() as i8 - mv.from.rank() as i8;

    match piece.kind {
        PieceKind::Pawn => pawn_legal(position, color, mv, df, dr, ctx, probing),
        PieceKind::Knight => (df.abs() == 1 && dr.abs() == 2) || (df.abs() == 2 && dr.abs() == 1),
        PieceKind::Bishop => df.abs() == dr.abs() && path_clear(position, mv.from, mv.to),
        PieceKind::Rook => (df == 0 || dr == 0) && path_clear(position, mv.from, mv.to),
        PieceKind::Queen => {
            (df == 0 || dr == 0 || df.abs() == dr.abs()) && path_clear(position, mv.from, mv.to)
        }
        PieceKind::King => {
            if df.abs() <= 1 && dr.abs() <= 1 {
                return true;
            }
            !probing && dr == 0 && df.abs() == 2 && castling_legal(position, color, df > 0, ctx)
        }
    }
}

fn pawn_legal(
    position: &Position,
    color: Color,
    mv: Move,
    df: i8,
    dr: i8,
    ctx: &RuleContext,
    probing: bool,
) -> bool {
    let forward = color.forward();
    if probing {
        // Attack probe: only the capture diagonals threaten a square.
        return df.abs() == 1 && dr == forward;
    }
    if df == 0 {
        // Advances require empty squares and are never captures.
        if position.piece_at(mv.to).is_some() {
            return false;
        }
        if dr == forward {
            return true;
        }
        let start_rank = (color.back_rank() as i8 + forward) as u8;
        if dr == 2 * forward && mv.from.rank() == start_rank {
            let step = mv.from.offset(0, forward).expect("double advance stays on board");
            return position.piece_at(step).is_none();
        }
        return false;
    }
    if df.abs() == 1 && dr == forward {
        if position.piece_at(mv.to).is_some() {
            // Opponent occupancy was already verified by the caller.
            return true;
        }
        // Diagonal onto an empty square is only the en-passant capture.
        return ctx.capturable_ep(color) == Some(mv.to);
    }
    false
}

/// Squares strictly between `from` and `to` (same rank, file or diagonal)
/// are all empty.
fn path_clear(position: &Position, from: Square, to: Square) -> bool {
    let df = (to.file() as i8 - from.file() as i8).signum();
    let dr = (to.rank() as i8 - from.rank() as i8).signum();
    let mut sq = from;
    loop {
        sq = match sq.offset(df, dr) {
            Some(next) => next,
            None => return false,
        };
        if sq == to {
            return true;
        }
        if position.piece_at(sq).is_some() {
            return false;
        }
    }
}

fn castling_legal(position: &Position, color: Color, kingside: bool, ctx: &RuleContext) -> bool {
    let rights = ctx.castling[color];
    if (kingside && !rights.kingside) || (!kingside && !rights.queenside) {
        return false;
    }
    let back = color.back_rank();
    let king_home = Square::new(4, back);
    match position.piece_at(king_home) {
        Some(p) if p.color == color && p.kind == PieceKind::King => {}
        _ => return false,
    }
    let rook_home = Square::new(if kingside { 7 } else { 0 }, back);
    match position.piece_at(rook_home) {
        Some(p) if p.color == color && p.kind == PieceKind::Rook => {}
        _ => return false,
    }
    let between: &[u8] = if kingside { &[5, 6] } else { &[1, 2, 3] };
    if between
        .iter()
        .any(|&f| position.piece_at(Square::new(f, back)).is_some())
    {
        return false;
    }
    // The king may not castle out of, through, or into check.
    let transit: &[u8] = if kingside { &[4, 5, 6] } else { &[4, 3, 2] };
    let enemy = color.opponent();
    !transit
        .iter()
        .any(|&f| is_under_attack(position, Square::new(f, back), enemy, ctx))
}

/// Does any piece of `by` have a legal, non-castling attacking move onto
/// `square`? Used for check detection and the castling transit test.
pub fn is_under_attack(position: &Position, square: Square, by: Color, ctx: &RuleContext) -> bool {
    position
        .pieces(by)
        .any(|(from, _)| is_legal_inner(position, by, Move::new(from, square), ctx, true))
}

/// A color with no king (eliminated by collision) is never "in check"; it
/// has already lost.
pub fn is_in_check(position: &Position, color: Color, ctx: &RuleContext) -> bool {
    match position.king_square(color) {
        Some(king) => is_under_attack(position, king, color.opponent(), ctx),
        None => false,
    }
}

/// Apply `mv` for `color` to a copy of the position as if it were the only
/// move this round. Handles the rook relocation of castling, the en-passant
/// victim removal and promotion substitution, so the result is suitable for
/// own-king-safety probing.
pub fn apply_alone(position: &Position, color: Color, mv: Move, ctx: &RuleContext) -> Position {
    let mut next = position.clone();
    let mut piece = match next.take(mv.from) {
        Some(p) => p,
        None => return next,
    };
    if piece.kind == PieceKind::King && (mv.to.file() as i8 - mv.from.file() as i8).abs() == 2 {
        relocate_castling_rook(&mut next, color, mv.to.file() > mv.from.file());
    }
    if piece.kind == PieceKind::Pawn
        && position.piece_at(mv.to).is_none()
        && mv.from.file() != mv.to.file()
        && ctx.capturable_ep(color) == Some(mv.to)
    {
        // The captured pawn sits one rank behind the target square.
        if let Some(victim) = mv.to.offset(0, -color.forward()) {
            next.set(victim, None);
        }
    }
    if let Some(kind) = mv.promotion {
        piece.kind = kind;
    }
    next.set(mv.to, Some(piece));
    next
}

pub(crate) fn relocate_castling_rook(position: &mut Position, color: Color, kingside: bool) {
    let back = color.back_rank();
    let rook_from = Square::new(if kingside { 7 } else { 0 }, back);
    let rook_to = Square::new(if kingside { 5 } else { 3 }, back);
    if let Some(rook) = position.take(rook_from) {
        position.set(rook_to, Some(rook));
    }
}

/// Would this move, applied alone to the pre-round position, leave the
/// mover's own king attacked?
pub fn leaves_king_exposed(position: &Position, color: Color, mv: Move, ctx: &RuleContext) -> bool {
    let after = apply_alone(position, color, mv, ctx);
    is_in_check(&after, color, ctx)
}

/// Destinations the piece on `from` may legally move to, with own-king
/// safety enforced.
pub fn legal_moves_from(
    position: &Position,
    color: Color,
    from: Square,
    ctx: &RuleContext,
) -> Vec<Square> {
    Square::all()
        .filter(|&to| {
            let mv = Move::new(from, to);
            is_legal(position, color, mv, ctx) && !leaves_king_exposed(position, color, mv, ctx)
        })
        .collect()
}

/// Does `color` have any legal move at all, skipping pieces whose id is
/// `exclude`? The exclusion serves the repeat-move rule's "no other piece
/// can move" exception; terminal evaluation passes `None`.
pub fn has_any_legal_move(
    position: &Position,
    color: Color,
    ctx: &RuleContext,
    exclude: Option<PieceId>,
) -> bool {
    position
        .pieces(color)
        .filter(|(_, piece): &(Square, Piece)| Some(piece.id) != exclude)
        .any(|(from, _)| !legal_moves_from(position, color, from, ctx).is_empty())
}
