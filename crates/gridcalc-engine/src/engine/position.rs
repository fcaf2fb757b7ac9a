//! Cell positions and sheet extents.
//!
//! Provides bidirectional conversion between spreadsheet-style references
//! (e.g., "A1", "B2", "AA100") and zero-indexed row/column coordinates.
//!
//! # Examples
//!
//! ```
//! use gridcalc_engine::engine::Position;
//!
//! let pos = Position::from_str("B3").unwrap();
//! assert_eq!(pos.col, 1); // 0-indexed
//! assert_eq!(pos.row, 2);
//! assert_eq!(pos.to_string(), "B3");
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Number of addressable rows in a sheet.
pub const MAX_ROWS: i32 = 16384;
/// Number of addressable columns in a sheet.
pub const MAX_COLS: i32 = 16384;

/// A zero-indexed cell address.
///
/// Ordering is row-major, which is also the print order of a sheet.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Position {
    pub row: i32,
    pub col: i32,
}

impl Position {
    pub const fn new(row: i32, col: i32) -> Position {
        Position { row, col }
    }

    pub fn is_valid(&self) -> bool {
        (0..MAX_ROWS).contains(&self.row) && (0..MAX_COLS).contains(&self.col)
    }

    /// Parse a position from spreadsheet notation (e.g., "A1", "B2", "AA10").
    /// Returns None if the input is malformed or lies outside the sheet.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(name: &str) -> Option<Position> {
        Self::parse_a1(name)
    }

    fn parse_a1(name: &str) -> Option<Position> {
        let caps = a1_re().captures(name)?;
        let letters = &caps["letters"];
        let numbers = &caps["numbers"];

        let mut col_acc = 0i32;
        for c in letters.to_ascii_uppercase().bytes() {
            let digit = (c - b'A') as i32 + 1;
            col_acc = col_acc.checked_mul(26)?.checked_add(digit)?;
        }
        let col = col_acc.checked_sub(1)?;
        let row = numbers.parse::<i32>().ok()?.checked_sub(1)?;

        let pos = Position::new(row, col);
        pos.is_valid().then_some(pos)
    }

    /// Convert column index to spreadsheet-style letters (0 -> A, 25 -> Z, 26 -> AA).
    pub fn col_to_letters(col: i32) -> String {
        let mut result = String::new();
        let mut n = col as i64 + 1;
        while n > 0 {
            n -= 1;
            result.insert(0, (b'A' + (n % 26) as u8) as char);
            n /= 26;
        }
        result
    }
}

fn a1_re() -> &'static Regex {
    static A1_RE: OnceLock<Regex> = OnceLock::new();
    A1_RE.get_or_init(|| {
        Regex::new(r"^(?<letters>[A-Za-z]{1,3})(?<numbers>[0-9]{1,5})$")
            .expect("A1 reference regex must compile")
    })
}

impl std::str::FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_a1(s).ok_or_else(|| format!("Invalid cell reference: {}", s))
    }
}

impl fmt::Display for Position {
    /// Invalid positions render as the empty string.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.is_valid() {
            return Ok(());
        }
        write!(f, "{}{}", Position::col_to_letters(self.col), self.row + 1)
    }
}

/// Exclusive extent of a rectangular region, in cells.
#[derive(Clone, Copy, Debug, Default, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub rows: i32,
    pub cols: i32,
}

impl Size {
    pub const fn new(rows: i32, cols: i32) -> Size {
        Size { rows, cols }
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str_single_letter_columns() {
        let a1 = Position::from_str("A1").unwrap();
        assert_eq!(a1, Position::new(0, 0));

        let b1 = Position::from_str("B1").unwrap();
        assert_eq!(b1, Position::new(0, 1));

        let z1 = Position::from_str("Z1").unwrap();
        assert_eq!(z1, Position::new(0, 25));
    }

    #[test]
    fn test_from_str_multi_letter_columns() {
        assert_eq!(Position::from_str("AA1").unwrap().col, 26);
        assert_eq!(Position::from_str("AZ1").unwrap().col, 51);
        assert_eq!(Position::from_str("BA1").unwrap().col, 52);
        assert_eq!(Position::from_str("AB12").unwrap(), Position::new(11, 27));
    }

    #[test]
    fn test_from_str_case_insensitive() {
        assert_eq!(Position::from_str("c7"), Position::from_str("C7"));
    }

    #[test]
    fn test_from_str_invalid_inputs() {
        assert!(Position::from_str("").is_none());
        assert!(Position::from_str("123").is_none());
        assert!(Position::from_str("ABC").is_none());
        assert!(Position::from_str("A0").is_none());
        assert!(Position::from_str("1A").is_none());
        assert!(Position::from_str("A 1").is_none());
        assert!(Position::from_str("A-1").is_none());
    }

    #[test]
    fn test_from_str_rejects_out_of_bounds() {
        // XFD is the last column (16384), row 16384 the last row.
        assert_eq!(
            Position::from_str("XFD16384"),
            Some(Position::new(MAX_ROWS - 1, MAX_COLS - 1))
        );
        assert!(Position::from_str("XFE1").is_none());
        assert!(Position::from_str("A16385").is_none());
        assert!(Position::from_str("ZZZZ1").is_none());
        assert!(Position::from_str("A123456").is_none());
    }

    #[test]
    fn test_validity() {
        assert!(Position::new(0, 0).is_valid());
        assert!(!Position::new(-1, 0).is_valid());
        assert!(!Position::new(0, -1).is_valid());
        assert!(!Position::new(MAX_ROWS, 0).is_valid());
        assert!(!Position::new(0, MAX_COLS).is_valid());
        assert!(!Position::new(-1, -1).is_valid());
    }

    #[test]
    fn test_display_round_trips_common_refs() {
        for name in ["A1", "Z9", "AA10", "AZ100", "XFD16384"] {
            assert_eq!(Position::from_str(name).unwrap().to_string(), name);
        }
        assert_eq!(Position::new(-1, -1).to_string(), "");
    }

    #[test]
    fn test_row_major_ordering() {
        let mut positions = vec![
            Position::new(1, 0),
            Position::new(0, 2),
            Position::new(0, 1),
        ];
        positions.sort();
        assert_eq!(
            positions,
            vec![Position::new(0, 1), Position::new(0, 2), Position::new(1, 0)]
        );
    }
}
