use chrono::{FixedOffset, Offset, Utc};
use lazy_static::lazy_static;

/// Name of the environment variable holding the default offset for date/time literals.
pub const UTC_OFFSET_VARIABLE: &str = "FORTHIC_UTC_OFFSET";

lazy_static! {
    // The environment is only read once per process.
    static ref ENVIRONMENT_CONFIG: InterpreterConfig = InterpreterConfig::read_environment();
}

/// Settings that change how an interpreter treats its input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Offset applied to date-time literals that do not carry one of their own.
    utc_offset: FixedOffset,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig::new()
    }
}

impl InterpreterConfig {
    /// The default configuration, date-time literals without an offset are read as UTC.
    pub fn new() -> InterpreterConfig {
        InterpreterConfig {
            utc_offset: utc(),
        }
    }

    /// Configuration taken from the process environment.  See `UTC_OFFSET_VARIABLE`.
    pub fn from_env() -> InterpreterConfig {
        ENVIRONMENT_CONFIG.clone()
    }

    pub fn with_utc_offset(mut self, utc_offset: FixedOffset) -> InterpreterConfig {
        self.utc_offset = utc_offset;
        self
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }

    fn read_environment() -> InterpreterConfig {
        let config = InterpreterConfig::new();

        match std::env::var(UTC_OFFSET_VARIABLE) {
            Ok(text) => match parse_utc_offset(&text) {
                Some(offset) => config.with_utc_offset(offset),
                None => {
                    log_warn!(
                        "Ignoring {}={:?}, expected Z, UTC or +HH:MM.",
                        UTC_OFFSET_VARIABLE,
                        text
                    );
                    config
                }
            },
            Err(_) => config,
        }
    }
}

fn utc() -> FixedOffset {
    Utc.fix()
}

/// Parse a UTC offset in the forms `Z`, `UTC`, `+HH:MM`, `-HH:MM`, `+HHMM` or `+HH`.
pub fn parse_utc_offset(text: &str) -> Option<FixedOffset> {
    let text = text.trim();

    if text.eq_ignore_ascii_case("z") || text.eq_ignore_ascii_case("utc") {
        return Some(utc());
    }

    let sign = match text.chars().next()? {
        '+' => 1,
        '-' => -1,
        _ => return None,
    };

    let digits: String = text[1..].chars().filter(|c| *c != ':').collect();

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (
            digits[..2].parse::<i32>().ok()?,
            digits[2..].parse::<i32>().ok()?,
        ),
        _ => return None,
    };

    if minutes >= 60 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_offsets() {
        assert_eq!(parse_utc_offset("Z"), FixedOffset::east_opt(0));
        assert_eq!(parse_utc_offset("+05:30"), FixedOffset::east_opt(5 * 3600 + 30 * 60));
        assert_eq!(parse_utc_offset("-0800"), FixedOffset::west_opt(8 * 3600));
        assert_eq!(parse_utc_offset("+02"), FixedOffset::east_opt(2 * 3600));
        assert_eq!(parse_utc_offset("05:30"), None);
        assert_eq!(parse_utc_offset("+05:75"), None);
    }

    #[test]
    fn builder_sets_the_offset() {
        let offset = FixedOffset::east_opt(3600).unwrap();
        let config = InterpreterConfig::new().with_utc_offset(offset);

        assert_eq!(config.utc_offset(), offset);
        assert_eq!(InterpreterConfig::new().utc_offset(), FixedOffset::east_opt(0).unwrap());
    }
}
