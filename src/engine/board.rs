use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// Side of the board.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    #[inline]
    pub const fn opponent(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    #[inline]
    pub const fn index(&self) -> usize {
        *self as usize
    }

    /// Rank direction pawns of this color advance in (+1 for white).
    #[inline]
    pub const fn forward(&self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// Rank index (0-based) of this color's back rank.
    #[inline]
    pub const fn back_rank(&self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// Rank index of the opponent's back rank, where pawns promote.
    #[inline]
    pub const fn promotion_rank(&self) -> u8 {
        self.opponent().back_rank()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// A pair of values indexed by color.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerColor<T>(pub [T; 2]);

impl<T> PerColor<T> {
    pub fn new(white: T, black: T) -> Self {
        PerColor([white, black])
    }
}

impl<T: Clone> PerColor<T> {
    pub fn splat(value: T) -> Self {
        PerColor([value.clone(), value])
    }
}

impl<T> Index<Color> for PerColor<T> {
    type Output = T;
    fn index(&self, color: Color) -> &T {
        &self.0[color.index()]
    }
}

impl<T> IndexMut<Color> for PerColor<T> {
    fn index_mut(&mut self, color: Color) -> &mut T {
        &mut self.0[color.index()]
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Rook,
    Knight,
    Bishop,
    Queen,
    King,
}

impl PieceKind {
    /// Piece kinds a pawn may promote to.
    pub const fn is_promotion_choice(&self) -> bool {
        matches!(
            self,
            PieceKind::Rook | PieceKind::Knight | PieceKind::Bishop | PieceKind::Queen
        )
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PieceKind::Pawn => "pawn",
            PieceKind::Rook => "rook",
            PieceKind::Knight => "knight",
            PieceKind::Bishop => "bishop",
            PieceKind::Queen => "queen",
            PieceKind::King => "king",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for PieceKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pawn" => Ok(PieceKind::Pawn),
            "rook" => Ok(PieceKind::Rook),
            "knight" => Ok(PieceKind::Knight),
            "bishop" => Ok(PieceKind::Bishop),
            "queen" => Ok(PieceKind::Queen),
            "king" => Ok(PieceKind::King),
            _ => Err(()),
        }
    }
}

/// Stable identity token for a piece. Assigned once at game start and kept
/// through every move, including promotion (the kind changes, the id does
/// not). The repeat-move rule tracks ids, never squares.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceId(pub u8);

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
    pub id: PieceId,
}

/// A board coordinate, rank-major: a1 = 0, b1 = 1, ..., h8 = 63.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square(u8);

impl Square {
    #[inline]
    pub const fn new(file: u8, rank: u8) -> Self {
        debug_assert!(file < 8 && rank < 8);
        Square(rank * 8 + file)
    }

    #[inline]
    pub const fn from_index(index: u8) -> Self {
        debug_assert!(index < 64);
        Square(index)
    }

    #[inline]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn file(&self) -> u8 {
        self.0 % 8
    }

    #[inline]
    pub const fn rank(&self) -> u8 {
        self.0 / 8
    }

    /// Offset by (file delta, rank delta), None when off the board.
    pub fn offset(&self, df: i8, dr: i8) -> Option<Square> {
        let file = self.file() as i8 + df;
        let rank = self.rank() as i8 + dr;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            Some(Square::new(file as u8, rank as u8))
        } else {
            None
        }
    }

    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).map(Square::from_index)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            (b'a' + self.file()) as char,
            (b'1' + self.rank()) as char
        )
    }
}

impl FromStr for Square {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let file = chars.next().ok_or(())?.to_ascii_lowercase();
        let rank = chars.next().ok_or(())?;
        if chars.next().is_some() {
            return Err(());
        }
        if !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
            return Err(());
        }
        Ok(Square::new(file as u8 - b'a', rank as u8 - b'1'))
    }
}

/// A move as submitted by one side. The promotion choice may be attached
/// later; a pawn move to the back rank is incomplete without one.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl Move {
    pub fn new(from: Square, to: Square) -> Self {
        Move {
            from,
            to,
            promotion: None,
        }
    }

    pub fn promoting(from: Square, to: Square, kind: PieceKind) -> Self {
        Move {
            from,
            to,
            promotion: Some(kind),
        }
    }
}

/// Castling availability for one color. Revocation is monotonic; rights are
/// never restored once cleared.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastlingRights {
    pub kingside: bool,
    pub queenside: bool,
}

impl CastlingRights {
    pub const fn initial() -> Self {
        CastlingRights {
            kingside: true,
            queenside: true,
        }
    }

    pub const fn none() -> Self {
        CastlingRights {
            kingside: false,
            queenside: false,
        }
    }
}

/// Piece placement: a mailbox of 64 slots. Moving a piece rewrites slots
/// only; the `Piece` records themselves (and their ids) travel unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    squares: [Option<Piece>; 64],
}

impl Position {
    pub fn empty() -> Self {
        Position {
            squares: [None; 64],
        }
    }

    /// Standard starting arrangement. Ids run 0..16 for white (back rank
    /// a1..h1, then pawns a2..h2) and 16..32 for black, mirrored.
    pub fn starting() -> Self {
        const BACK: [PieceKind; 8] = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];
        let mut position = Position::empty();
        let mut id = 0u8;
        for color in [Color::White, Color::Black] {
            let back = color.back_rank();
            let pawn_rank = (back as i8 + color.forward()) as u8;
            for (file, kind) in BACK.iter().enumerate() {
                position.set(
                    Square::new(file as u8, back),
                    Some(Piece {
                        color,
                        kind: *kind,
                        id: PieceId(id),
                    }),
                );
                id += 1;
            }
            for file in 0..8 {
                position.set(
                    Square::new(file, pawn_rank),
                    Some(Piece {
                        color,
                        kind: PieceKind::Pawn,
                        id: PieceId(id),
                    }),
                );
                id += 1;
            }
        }
        position
    }

    #[inline]
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.squares[square.index()]
    }

    #[inline]
    pub fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.squares[square.index()] = piece;
    }

    /// Remove and return whatever occupies the square.
    #[inline]
    pub fn take(&mut self, square: Square) -> Option<Piece> {
        self.squares[square.index()].take()
    }

    /// Occupied squares of one color.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| {
            self.piece_at(sq)
                .filter(|p| p.color == color)
                .map(|p| (sq, p))
        })
    }

    /// The square of this color's king, if it still exists. Kings can be
    /// eliminated by a collision, after which that side has lost.
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.pieces(color)
            .find(|(_, p)| p.kind == PieceKind::King)
            .map(|(sq, _)| sq)
    }

    pub fn has_king(&self, color: Color) -> bool {
        self.king_square(color).is_some()
    }
}

#[cfg(test)]
impl Position {
    /// Builder for ad-hoc test positions; ids are handed out sequentially
    /// per call so every placed piece has a distinct identity.
    pub fn with_piece(mut self, square: Square, color: Color, kind: PieceKind) -> Self {
        let used = Square::all()
            .filter_map(|sq| self.piece_at(sq))
            .map(|p| p.id.0)
            .max()
            .map_or(0, |m| m + 1);
        self.set(
            square,
            Some(Piece {
                color,
                kind,
                id: PieceId(used),
            }),
        );
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().expect("valid square")
    }

    #[test]
    fn square_round_trips_through_strings() {
        for name in ["a1", "e4", "h8", "c7"] {
            assert_eq!(sq(name).to_string(), name);
        }
        assert!("i1".parse::<Square>().is_err());
        assert!("a9".parse::<Square>().is_err());
        assert!("e44".parse::<Square>().is_err());
    }

    #[test]
    fn square_offsets_respect_edges() {
        assert_eq!(sq("a1").offset(-1, 0), None);
        assert_eq!(sq("h8").offset(0, 1), None);
        assert_eq!(sq("e4").offset(1, 1), Some(sq("f5")));
    }

    #[test]
    fn starting_position_has_32_distinct_ids() {
        let position = Position::starting();
        let mut ids: Vec<u8> = Square::all()
            .filter_map(|s| position.piece_at(s))
            .map(|p| p.id.0)
            .collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 32);
    }

    #[test]
    fn starting_position_places_kings_on_e_file() {
        let position = Position::starting();
        assert_eq!(position.king_square(Color::White), Some(sq("e1")));
        assert_eq!(position.king_square(Color::Black), Some(sq("e8")));
    }

    #[test]
    fn color_with_no_king_reports_none() {
        let position = Position::empty().with_piece(sq("e1"), Color::White, PieceKind::King);
        assert!(position.has_king(Color::White));
        assert!(!position.has_king(Color::Black));
    }
}
