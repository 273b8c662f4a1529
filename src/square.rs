use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

use thiserror::Error;

use crate::piece::Color;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SquareError {
    #[error("square index {0} is outside 0..=63")]
    OutOfRange(usize),
    #[error("invalid coordinate '{0}'")]
    InvalidCoordinate(String),
}

/// A square on the board, stored as its index.
///
/// Index 0 is a8 and index 63 is h1: rows run top to bottom from White's
/// point of view, files run left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square(u8);

impl Square {
    pub fn new(index: usize) -> Result<Self, SquareError> {
        if index < 64 {
            Ok(Square(index as u8))
        } else {
            Err(SquareError::OutOfRange(index))
        }
    }

    /// Builds a square from a file (0..8) and a row counted from the top (0..8).
    pub fn from_file_row(file: u8, row: u8) -> Option<Self> {
        if file < 8 && row < 8 {
            Some(Square(row * 8 + file))
        } else {
            None
        }
    }

    pub fn from_coordinates(file: char, rank: char) -> Result<Self, SquareError> {
        index_of(file, rank).map(|index| Square(index as u8))
    }

    /// All 64 squares in storage order.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64u8).map(Square)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn file(self) -> u8 {
        self.0 % 8
    }

    /// Row counted from the top of the board: row 0 holds rank 8.
    pub fn row(self) -> u8 {
        self.0 / 8
    }

    pub fn color(self) -> Color {
        if (self.file() + self.row()) % 2 == 0 {
            Color::Light
        } else {
            Color::Dark
        }
    }

    pub fn coordinates(self) -> (char, char) {
        ((b'a' + self.file()) as char, (b'8' - self.row()) as char)
    }

    /// Moves `horizontal` squares sideways, then `vertical` (a multiple of 8)
    /// up or down. Returns `None` if either leg leaves the board.
    pub fn step(self, vertical: i8, horizontal: i8) -> Option<Square> {
        let from = self.0 as i16;
        let across = from + horizontal as i16;
        if !is_valid_horizontal(from, across) {
            return None;
        }
        let target = across + vertical as i16;
        if !is_valid_vertical(target) {
            return None;
        }
        Some(Square(target as u8))
    }

    /// Moves one square in `direction` as seen by `color`.
    pub fn towards(self, direction: Direction, color: Color) -> Option<Square> {
        let delta = direction.delta(color);
        match direction {
            Direction::Forward | Direction::Back => self.step(delta, 0),
            Direction::Left | Direction::Right => self.step(0, delta),
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (file, rank) = self.coordinates();
        write!(f, "{}{}", file, rank)
    }
}

impl FromStr for Square {
    type Err = SquareError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(file), Some(rank), None) => Square::from_coordinates(file, rank),
            _ => Err(SquareError::InvalidCoordinate(s.to_string())),
        }
    }
}

pub fn coordinates_of(index: usize) -> Result<(char, char), SquareError> {
    Square::new(index).map(Square::coordinates)
}

pub fn index_of(file: char, rank: char) -> Result<usize, SquareError> {
    let invalid = || SquareError::InvalidCoordinate(format!("{}{}", file, rank));
    if !('a'..='h').contains(&file) || !('1'..='8').contains(&rank) {
        return Err(invalid());
    }
    let file = file as usize - 'a' as usize;
    let row = '8' as usize - rank as usize;
    Ok(row * 8 + file)
}

/// A sideways step must stay on the row it started from.
pub fn is_valid_horizontal(from: i16, to: i16) -> bool {
    (0..64).contains(&to) && to / 8 == from / 8
}

pub fn is_valid_vertical(to: i16) -> bool {
    (0..64).contains(&to)
}

/// Board directions as index deltas from White's side. Dark negates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Back,
    Right,
    Left,
}

impl Direction {
    pub const fn white_delta(self) -> i8 {
        match self {
            Direction::Forward => -8,
            Direction::Back => 8,
            Direction::Right => 1,
            Direction::Left => -1,
        }
    }

    pub fn delta(self, color: Color) -> i8 {
        match color {
            Color::Light => self.white_delta(),
            Color::Dark => -self.white_delta(),
        }
    }
}

/// A set of squares packed into a bitboard.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SquareSet(u64);

impl SquareSet {
    pub const EMPTY: SquareSet = SquareSet(0);

    pub fn insert(&mut self, square: Square) {
        self.0 |= 1u64 << square.0;
    }

    pub fn remove(&mut self, square: Square) {
        self.0 &= !(1u64 << square.0);
    }

    pub fn contains(&self, square: Square) -> bool {
        (self.0 >> square.0) & 1 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(&self) -> SquareSetIter {
        SquareSetIter(self.0)
    }
}

impl fmt::Debug for SquareSet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set()
            .entries(self.iter().map(|sq| sq.to_string()))
            .finish()
    }
}

impl BitOr for SquareSet {
    type Output = SquareSet;

    fn bitor(self, rhs: SquareSet) -> SquareSet {
        SquareSet(self.0 | rhs.0)
    }
}

impl BitOrAssign for SquareSet {
    fn bitor_assign(&mut self, rhs: SquareSet) {
        self.0 |= rhs.0;
    }
}

impl FromIterator<Square> for SquareSet {
    fn from_iter<I: IntoIterator<Item = Square>>(iter: I) -> Self {
        let mut set = SquareSet::EMPTY;
        for square in iter {
            set.insert(square);
        }
        set
    }
}

impl IntoIterator for SquareSet {
    type Item = Square;
    type IntoIter = SquareSetIter;

    fn into_iter(self) -> SquareSetIter {
        SquareSetIter(self.0)
    }
}

/// Yields squares in ascending index order.
pub struct SquareSetIter(u64);

impl Iterator for SquareSetIter {
    type Item = Square;

    fn next(&mut self) -> Option<Square> {
        if self.0 == 0 {
            return None;
        }
        let index = self.0.trailing_zeros() as u8;
        self.0 &= self.0 - 1;
        Some(Square(index))
    }
}
