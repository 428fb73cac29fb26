//! A1-style cell addresses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A parsed A1-style cell reference, e.g. `B2`.
///
/// Column and row are both 1-based, matching the coordinate convention
/// of the spreadsheet layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CellRef {
    /// Column index, 1-based (A = 1).
    pub col: u32,
    /// Row index, 1-based.
    pub row: u32,
}

impl CellRef {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    /// Coordinate tuple accepted by umya-spreadsheet cell accessors.
    pub fn coordinate(&self) -> (u32, u32) {
        (self.col, self.row)
    }
}

impl FromStr for CellRef {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let letters: String = s.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
        let digits = &s[letters.len()..];

        if letters.is_empty() || digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(format!("'{s}' is not an A1-style cell address"));
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
            if col > 16_384 {
                return Err(format!("column in '{s}' is out of range"));
            }
        }

        let row: u32 = digits
            .parse()
            .map_err(|_| format!("row in '{s}' is out of range"))?;
        if row == 0 {
            return Err(format!("row in '{s}' must be 1 or greater"));
        }

        Ok(Self { col, row })
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut col = self.col;
        let mut letters = Vec::new();
        while col > 0 {
            let rem = (col - 1) % 26;
            letters.push((b'A' + rem as u8) as char);
            col = (col - 1) / 26;
        }
        letters.reverse();
        let letters: String = letters.into_iter().collect();
        write!(f, "{}{}", letters, self.row)
    }
}

impl TryFrom<String> for CellRef {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CellRef> for String {
    fn from(cell: CellRef) -> String {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_simple_addresses() {
        assert_eq!("A1".parse::<CellRef>().unwrap(), CellRef::new(1, 1));
        assert_eq!("B2".parse::<CellRef>().unwrap(), CellRef::new(2, 2));
        assert_eq!("Z10".parse::<CellRef>().unwrap(), CellRef::new(26, 10));
    }

    #[test]
    fn parses_multi_letter_columns() {
        assert_eq!("AA1".parse::<CellRef>().unwrap(), CellRef::new(27, 1));
        assert_eq!("AB3".parse::<CellRef>().unwrap(), CellRef::new(28, 3));
    }

    #[test]
    fn lowercase_is_accepted() {
        assert_eq!("c4".parse::<CellRef>().unwrap(), CellRef::new(3, 4));
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<CellRef>().is_err());
        assert!("B".parse::<CellRef>().is_err());
        assert!("2".parse::<CellRef>().is_err());
        assert!("B0".parse::<CellRef>().is_err());
        assert!("B2C".parse::<CellRef>().is_err());
    }

    #[test]
    fn round_trips_through_display() {
        for s in ["A1", "B2", "Z99", "AA1", "XFD1"] {
            let cell: CellRef = s.parse().unwrap();
            assert_eq!(cell.to_string(), s);
        }
    }
}
