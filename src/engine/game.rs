use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::board::{Color, Move, PerColor, Piece, PieceId, PieceKind, Position, Square};
use super::error::Reject;
use super::legality::{
    is_in_check, is_legal, leaves_king_exposed, legal_moves_from, RuleContext,
};
use super::outcome::{evaluate, EndReason, GameResult};
use super::repeat::repeat_permitted;
use super::resolve::resolve_round;

/// One color's submission slot for the current round. Transitions are
/// `Empty -> AwaitingPromotion -> Ready` or `Empty -> Ready`; resolution
/// resets both slots to `Empty`. Events that do not match the current slot
/// state are rejected rather than reinterpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveSlot {
    Empty,
    /// Move stored but incomplete: the pawn reached the back rank and the
    /// promotion choice has not arrived yet.
    AwaitingPromotion(Move),
    Ready(Move),
}

impl MoveSlot {
    fn is_complete(&self) -> bool {
        matches!(self, MoveSlot::Ready(_))
    }
}

/// Derived round lifecycle, reported to clients. `BothSubmitted` is
/// transient: reaching it resolves the round synchronously, so observers
/// only ever see the other phases.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "phase", content = "color")]
pub enum RoundPhase {
    WaitingBoth,
    OneSubmitted(Color),
    PromotionPending(Color),
    BothSubmitted,
}

/// What a successful submission did.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Stored; the round waits for the partner move.
    Waiting,
    /// Stored, but the promotion choice is still owed.
    PromotionNeeded,
    /// Both sides were complete; the round resolved.
    Resolved(RoundReport),
}

/// Record of one resolved round; also the unit of history.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundReport {
    pub round: u32,
    pub moves: PerColor<Move>,
    pub captured: PerColor<Option<Piece>>,
    pub collision: Option<Square>,
    pub check: PerColor<bool>,
    pub result: Option<GameResult>,
}

/// Full rule state for one room. All mutation funnels through
/// `submit_move`, `choose_promotion` and `tick`; each is atomic and the
/// caller serializes access (one lock per room).
pub struct GameState {
    position: Position,
    ctx: RuleContext,
    slots: PerColor<MoveSlot>,
    last_moved: PerColor<Option<PieceId>>,
    check: PerColor<bool>,
    history: Vec<RoundReport>,
    round: u32,
    result: Option<GameResult>,
    /// Seconds per side; zero means untimed.
    time_control_secs: u64,
    remaining: PerColor<Duration>,
    clocks_started: bool,
    last_tick: Option<Instant>,
}

impl GameState {
    pub fn new(time_control_secs: u64) -> Self {
        GameState {
            position: Position::starting(),
            ctx: RuleContext::initial(),
            slots: PerColor::splat(MoveSlot::Empty),
            last_moved: PerColor::splat(None),
            check: PerColor::splat(false),
            history: Vec::new(),
            round: 0,
            result: None,
            time_control_secs,
            remaining: PerColor::splat(Duration::from_secs(time_control_secs)),
            clocks_started: false,
            last_tick: None,
        }
    }

    /// Both seats are filled; the clocks may run from here on.
    pub fn start_clocks(&mut self, now: Instant) {
        if !self.clocks_started {
            self.clocks_started = true;
            self.last_tick = Some(now);
        }
    }

    /// Time control is frozen once anything has been submitted for the
    /// first round.
    pub fn set_time_control(&mut self, secs: u64, now: Instant) -> Result<(), Reject> {
        let untouched = self.round == 0
            && self.result.is_none()
            && self.slots[Color::White] == MoveSlot::Empty
            && self.slots[Color::Black] == MoveSlot::Empty;
        if !untouched {
            return Err(Reject::TimeControlLocked);
        }
        self.time_control_secs = secs;
        self.remaining = PerColor::splat(Duration::from_secs(secs));
        self.last_tick = Some(now);
        Ok(())
    }

    pub fn submit_move(
        &mut self,
        color: Color,
        mut mv: Move,
        now: Instant,
    ) -> Result<SubmitOutcome, Reject> {
        self.apply_elapsed(now);
        if self.result.is_some() {
            return Err(Reject::GameOver);
        }
        if self.slots[color] != MoveSlot::Empty {
            return Err(Reject::AlreadySubmitted);
        }
        let piece = match self.position.piece_at(mv.from) {
            None => return Err(Reject::NoPieceAtSource),
            Some(p) if p.color != color => return Err(Reject::WrongColor),
            Some(p) => p,
        };
        if !is_legal(&self.position, color, mv, &self.ctx) {
            return Err(Reject::IllegalMove);
        }
        if leaves_king_exposed(&self.position, color, mv, &self.ctx) {
            return Err(if self.check[color] {
                Reject::KingStillInCheck
            } else {
                Reject::IllegalMove
            });
        }
        if !repeat_permitted(&self.position, color, piece, self.last_moved[color], &self.ctx) {
            return Err(Reject::RepeatedPiece);
        }

        let promoting =
            piece.kind == PieceKind::Pawn && mv.to.rank() == color.promotion_rank();
        if promoting {
            match mv.promotion {
                Some(kind) if !kind.is_promotion_choice() => {
                    return Err(Reject::InvalidPieceType)
                }
                Some(_) => {}
                None => {
                    self.slots[color] = MoveSlot::AwaitingPromotion(mv);
                    return Ok(SubmitOutcome::PromotionNeeded);
                }
            }
        } else {
            // A stray promotion choice on a non-promoting move is noise.
            mv.promotion = None;
        }

        self.slots[color] = MoveSlot::Ready(mv);
        Ok(self.try_resolve(now))
    }

    /// Attach the promotion choice owed for `square`, completing that
    /// side's move for the round.
    pub fn choose_promotion(
        &mut self,
        color: Color,
        square: Square,
        kind: PieceKind,
        now: Instant,
    ) -> Result<SubmitOutcome, Reject> {
        self.apply_elapsed(now);
        if self.result.is_some() {
            return Err(Reject::GameOver);
        }
        let mv = match self.slots[color] {
            MoveSlot::AwaitingPromotion(mv) => mv,
            _ => return Err(Reject::NoPendingPromotion),
        };
        if mv.to != square {
            return Err(Reject::SquareMismatch);
        }
        if !kind.is_promotion_choice() {
            return Err(Reject::InvalidPieceType);
        }
        self.slots[color] = MoveSlot::Ready(Move { promotion: Some(kind), ..mv });
        Ok(self.try_resolve(now))
    }

    /// Advance the clocks by wall-clock time since the previous tick.
    /// Returns the result when this very tick ended the game.
    pub fn tick(&mut self, now: Instant) -> Option<GameResult> {
        let before = self.result;
        self.apply_elapsed(now);
        match before {
            None => self.result,
            Some(_) => None,
        }
    }

    fn try_resolve(&mut self, now: Instant) -> SubmitOutcome {
        let (white_mv, black_mv) = match (self.slots[Color::White], self.slots[Color::Black]) {
            (MoveSlot::Ready(w), MoveSlot::Ready(b)) => (w, b),
            _ => return SubmitOutcome::Waiting,
        };

        let white_id = self.position.piece_at(white_mv.from).map(|p| p.id);
        let black_id = self.position.piece_at(black_mv.from).map(|p| p.id);
        self.last_moved = PerColor::new(white_id, black_id);

        let moves = PerColor::new(white_mv, black_mv);
        let resolution = resolve_round(&self.position, &self.ctx, moves);
        self.position = resolution.position;
        self.ctx.castling = resolution.castling;
        self.ctx.ep_target = resolution.ep_target;
        self.check = PerColor::new(
            is_in_check(&self.position, Color::White, &self.ctx),
            is_in_check(&self.position, Color::Black, &self.ctx),
        );
        self.round += 1;
        self.result = evaluate(&self.position, &self.ctx);

        let report = RoundReport {
            round: self.round,
            moves,
            captured: resolution.captured,
            collision: resolution.collision,
            check: self.check,
            result: self.result,
        };
        self.history.push(report.clone());

        // New round: slots clear, both clocks resume together.
        self.slots = PerColor::splat(MoveSlot::Empty);
        self.last_tick = Some(now);
        SubmitOutcome::Resolved(report)
    }

    /// Charge elapsed wall-clock time to every running clock. Uses actual
    /// elapsed time, never a fixed decrement, so irregular tick scheduling
    /// cannot drift the clocks.
    fn apply_elapsed(&mut self, now: Instant) {
        let last = match self.last_tick {
            Some(t) => t,
            None => return,
        };
        self.last_tick = Some(now);
        if self.result.is_some() || !self.clocks_started || self.time_control_secs == 0 {
            return;
        }
        let elapsed = now.saturating_duration_since(last);
        let mut flag_fell = PerColor::splat(false);
        for color in [Color::White, Color::Black] {
            if self.clock_active(color) {
                let left = self.remaining[color].saturating_sub(elapsed);
                self.remaining[color] = left;
                flag_fell[color] = left.is_zero();
            }
        }
        self.result = match (flag_fell[Color::White], flag_fell[Color::Black]) {
            (true, true) => Some(GameResult::Draw(EndReason::Timeout)),
            (true, false) => Some(GameResult::BlackWins(EndReason::Timeout)),
            (false, true) => Some(GameResult::WhiteWins(EndReason::Timeout)),
            (false, false) => None,
        };
    }

    /// A clock runs while its side still owes a complete move for the
    /// current round.
    pub fn clock_active(&self, color: Color) -> bool {
        self.clocks_started
            && self.result.is_none()
            && self.time_control_secs > 0
            && !self.slots[color].is_complete()
    }

    /// Legal destinations for the piece on `from`, as `color` sees them:
    /// empty when the square is not that color's piece or when the
    /// repeat-move rule bars the piece this round.
    pub fn moves_from(&self, color: Color, from: Square) -> Vec<Square> {
        let piece = match self.position.piece_at(from) {
            Some(p) if p.color == color => p,
            _ => return Vec::new(),
        };
        if !repeat_permitted(&self.position, color, piece, self.last_moved[color], &self.ctx) {
            return Vec::new();
        }
        legal_moves_from(&self.position, color, from, &self.ctx)
    }

    pub fn phase(&self) -> RoundPhase {
        for color in [Color::White, Color::Black] {
            if matches!(self.slots[color], MoveSlot::AwaitingPromotion(_)) {
                return RoundPhase::PromotionPending(color);
            }
        }
        match (
            self.slots[Color::White].is_complete(),
            self.slots[Color::Black].is_complete(),
        ) {
            (false, false) => RoundPhase::WaitingBoth,
            (true, false) => RoundPhase::OneSubmitted(Color::White),
            (false, true) => RoundPhase::OneSubmitted(Color::Black),
            (true, true) => RoundPhase::BothSubmitted,
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn rule_context(&self) -> &RuleContext {
        &self.ctx
    }

    pub fn in_check(&self, color: Color) -> bool {
        self.check[color]
    }

    pub fn last_moved(&self, color: Color) -> Option<PieceId> {
        self.last_moved[color]
    }

    pub fn pending_promotion(&self, color: Color) -> Option<Square> {
        match self.slots[color] {
            MoveSlot::AwaitingPromotion(mv) => Some(mv.to),
            _ => None,
        }
    }

    pub fn last_report(&self) -> Option<&RoundReport> {
        self.history.last()
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn result(&self) -> Option<GameResult> {
        self.result
    }

    pub fn time_control_secs(&self) -> u64 {
        self.time_control_secs
    }

    pub fn remaining_ms(&self, color: Color) -> u64 {
        self.remaining[color].as_millis() as u64
    }
}
