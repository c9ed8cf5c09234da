//! Date-of-birth disambiguation.
//!
//! When a card only prints the year of birth, the server asks for the full
//! date. The answer is checked here before anything is sent: it must be a
//! real `yyyy-mm-dd` date whose year is textually the server's year.

use crate::error::DobError;
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{4})-(\d{2})-(\d{2})$").expect("static regex"));

/// A validated date in the `dd/mm/yyyy` form the server expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DobFull {
    pub day: String,
    pub month: String,
    pub year: String,
}

impl fmt::Display for DobFull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.day, self.month, self.year)
    }
}

/// Subtitle of the date-of-birth prompt.
pub fn dob_prompt(yob: &str) -> String {
    format!("Aadhaar contains only Year of Birth ({yob}). Please enter full date of birth.")
}

/// Validate the chosen date against the server-provided year.
pub fn validate_dob(input: Option<&str>, yob: &str) -> Result<DobFull, DobError> {
    let iso = match input.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return Err(DobError::Missing),
    };

    let caps = ISO_DATE.captures(iso).ok_or_else(|| DobError::Malformed {
        input: iso.to_string(),
    })?;
    let (year, month, day) = (&caps[1], &caps[2], &caps[3]);

    if !is_calendar_date(year, month, day) {
        return Err(DobError::Malformed {
            input: iso.to_string(),
        });
    }

    if year != yob.trim() {
        return Err(DobError::YearMismatch {
            expected: yob.trim().to_string(),
            picked: year.to_string(),
        });
    }

    Ok(DobFull {
        day: day.to_string(),
        month: month.to_string(),
        year: year.to_string(),
    })
}

fn is_calendar_date(year: &str, month: &str, day: &str) -> bool {
    let (Ok(y), Ok(m), Ok(d)) = (year.parse::<u32>(), month.parse::<u32>(), day.parse::<u32>())
    else {
        return false;
    };
    let leap = (y % 4 == 0 && y % 100 != 0) || y % 400 == 0;
    let days = match m {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if leap => 29,
        2 => 28,
        _ => return false,
    };
    (1..=days).contains(&d)
}
