use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::AtsError;

/// A fiscal period in the SRI's `MM/YYYY` convention.
///
/// The month keeps its leading zero (`06/2024`, never `6/2024`); parsing
/// rejects anything that does not match `^(0[1-9]|1[0-2])/\d{4}$`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FiscalPeriod {
    month: u32,
    year: i32,
}

impl FiscalPeriod {
    /// Build a period from numeric parts. Month must be 1-12.
    pub fn new(month: u32, year: i32) -> Result<Self, AtsError> {
        if !(1..=12).contains(&month) || !(0..=9999).contains(&year) {
            return Err(AtsError::InvalidPeriod(format!("{month:02}/{year:04}")));
        }
        Ok(Self { month, year })
    }

    /// Month number, 1-12.
    pub fn month(&self) -> u32 {
        self.month
    }

    /// Four-digit year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// Month as the declaration header renders it: `"06"`.
    pub fn month_str(&self) -> String {
        format!("{:02}", self.month)
    }

    /// Year as the declaration header renders it: `"2024"`.
    pub fn year_str(&self) -> String {
        format!("{:04}", self.year)
    }

    /// Filename suffix shared by the XML and the archive: `"062024"`.
    pub fn file_suffix(&self) -> String {
        format!("{:02}{:04}", self.month, self.year)
    }
}

impl FromStr for FiscalPeriod {
    type Err = AtsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AtsError::InvalidPeriod(s.to_string());

        let bytes = s.as_bytes();
        if bytes.len() != 7 || bytes[2] != b'/' {
            return Err(invalid());
        }
        if !bytes[..2].iter().all(u8::is_ascii_digit)
            || !bytes[3..].iter().all(u8::is_ascii_digit)
        {
            return Err(invalid());
        }

        let month: u32 = s[..2].parse().map_err(|_| invalid())?;
        let year: i32 = s[3..].parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) {
            return Err(invalid());
        }
        Ok(Self { month, year })
    }
}

impl fmt::Display for FiscalPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{:04}", self.month, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_periods() {
        let p: FiscalPeriod = "06/2024".parse().unwrap();
        assert_eq!(p.month(), 6);
        assert_eq!(p.year(), 2024);
        assert_eq!(p.to_string(), "06/2024");
        assert_eq!(p.file_suffix(), "062024");

        let p: FiscalPeriod = "12/1999".parse().unwrap();
        assert_eq!(p.month(), 12);
    }

    #[test]
    fn rejects_malformed_periods() {
        for bad in [
            "13/2024", "00/2024", "6/2024", "06-2024", "062024", "06/24", "06/20245", "ab/2024",
            "06/20a4", "",
        ] {
            assert!(
                bad.parse::<FiscalPeriod>().is_err(),
                "expected '{bad}' to be rejected"
            );
        }
    }

    #[test]
    fn new_enforces_month_range() {
        assert!(FiscalPeriod::new(0, 2024).is_err());
        assert!(FiscalPeriod::new(13, 2024).is_err());
        assert!(FiscalPeriod::new(1, 2024).is_ok());
    }
}
