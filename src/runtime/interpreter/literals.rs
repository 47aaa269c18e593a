use crate::runtime::{config::InterpreterConfig, data_structures::value::Value};
use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Timelike, Utc};
use std::rc::Rc;

/// A literal handler receives the raw text of a word that was not found in any module and either
/// parses it into a value or declines with None.
pub type LiteralHandler = dyn Fn(&str) -> Option<Value>;

/// The built-in literal handlers in the order they are tried.
pub fn default_literal_handlers(config: &InterpreterConfig) -> Vec<Rc<LiteralHandler>> {
    let utc_offset = config.utc_offset();

    let mut handlers: Vec<Rc<LiteralHandler>> = Vec::new();

    handlers.push(Rc::new(to_bool));
    handlers.push(Rc::new(to_float));
    handlers.push(Rc::new(move |text: &str| to_zoned_datetime(text, utc_offset)));
    handlers.push(Rc::new(to_date));
    handlers.push(Rc::new(to_time));
    handlers.push(Rc::new(to_int));

    handlers
}

/// `TRUE` and `FALSE`.
pub fn to_bool(text: &str) -> Option<Value> {
    match text {
        "TRUE" => Some(Value::Bool(true)),
        "FALSE" => Some(Value::Bool(false)),
        _ => None,
    }
}

/// Floating point numbers must contain a decimal point, `1.5`, `-2.`, `3.0e8`.
pub fn to_float(text: &str) -> Option<Value> {
    if !text.contains('.') {
        return None;
    }

    let first = text.chars().next()?;

    if !(first.is_ascii_digit() || first == '-' || first == '+' || first == '.') {
        return None;
    }

    text.parse::<f64>().ok().map(Value::Float)
}

/// Integers with an optional sign, underscores may be used to group digits, `1_000`.
pub fn to_int(text: &str) -> Option<Value> {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);

    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || !digits.chars().all(|c| c.is_ascii_digit() || c == '_')
    {
        return None;
    }

    text.replace('_', "").parse::<i64>().ok().map(Value::Int)
}

/// Dates in the form `YYYY-MM-DD`.
pub fn to_date(text: &str) -> Option<Value> {
    parse_date(text).map(Value::Date)
}

/// Times of day, `9:30`, `14:05:10`, `9:30 PM` written as `9:30PM`.
pub fn to_time(text: &str) -> Option<Value> {
    parse_time(text).map(Value::Time)
}

/// Date-times in the form `YYYY-MM-DDTHH:MM[:SS]` followed by `Z`, an offset like `+05:00`, or
/// nothing.  An IANA zone name in brackets may follow, `2025-05-20T08:00[UTC]`.  Only UTC zone
/// names can be resolved, a date-time with a bracketed zone must otherwise give an explicit
/// offset.  Date-times without any offset use the configured default.
pub fn to_zoned_datetime(text: &str, default_offset: FixedOffset) -> Option<Value> {
    let (main, zone) = split_zone(text)?;
    let (date_text, time_text) = main.split_once('T')?;
    let date = parse_date(date_text)?;
    let (time_text, offset) = split_offset(time_text)?;
    let naive = NaiveDateTime::new(date, parse_clock(time_text)?);

    let offset = match (offset, zone) {
        (Some(offset), _) => offset,
        (None, Some(zone)) if is_utc_zone(zone) => Utc.fix(),
        (None, Some(_)) => return None,
        (None, None) => default_offset,
    };

    offset
        .from_local_datetime(&naive)
        .single()
        .map(Value::DateTime)
}

fn split_zone(text: &str) -> Option<(&str, Option<&str>)> {
    match text.strip_suffix(']') {
        Some(rest) => {
            let (main, zone) = rest.split_once('[')?;
            Some((main, Some(zone)))
        }
        None => Some((text, None)),
    }
}

fn is_utc_zone(zone: &str) -> bool {
    matches!(zone, "UTC" | "Etc/UTC" | "Z")
}

/// Split a trailing `Z` or `+HH:MM` offset from the time portion of a date-time.
fn split_offset(time_text: &str) -> Option<(&str, Option<FixedOffset>)> {
    if let Some(clock) = time_text.strip_suffix('Z') {
        return Some((clock, Some(Utc.fix())));
    }

    match time_text.find(['+', '-']) {
        Some(index) => {
            let offset = crate::runtime::config::parse_utc_offset(&time_text[index..])?;
            Some((&time_text[..index], Some(offset)))
        }
        None => Some((time_text, None)),
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let bytes = text.as_bytes();

    if bytes.len() != 10 || bytes[4] != b'-' || bytes[7] != b'-' {
        return None;
    }

    if !text.bytes().enumerate().all(|(index, b)| index == 4 || index == 7 || b.is_ascii_digit()) {
        return None;
    }

    let year = text[0..4].parse::<i32>().ok()?;
    let month = text[5..7].parse::<u32>().ok()?;
    let day = text[8..10].parse::<u32>().ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
}

/// `H:MM` or `HH:MM:SS` with no meridiem.
fn parse_clock(text: &str) -> Option<NaiveTime> {
    let parts: Vec<&str> = text.split(':').collect();

    if !(2..=3).contains(&parts.len())
        || parts.iter().any(|part| part.is_empty() || part.len() > 2)
        || !parts.iter().all(|part| part.bytes().all(|b| b.is_ascii_digit()))
    {
        return None;
    }

    if parts[1].len() != 2 || (parts.len() == 3 && parts[2].len() != 2) {
        return None;
    }

    let hour = parts[0].parse::<u32>().ok()?;
    let minute = parts[1].parse::<u32>().ok()?;
    let second = match parts.get(2) {
        Some(second) => second.parse::<u32>().ok()?,
        None => 0,
    };

    NaiveTime::from_hms_opt(hour, minute, second)
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    let upper = text.to_ascii_uppercase();

    let (clock, meridiem) = if let Some(clock) = upper.strip_suffix("AM") {
        (clock, Some(false))
    } else if let Some(clock) = upper.strip_suffix("PM") {
        (clock, Some(true))
    } else {
        (upper.as_str(), None)
    };

    let time = parse_clock(clock)?;

    match meridiem {
        None => Some(time),
        Some(is_pm) => {
            let hour = time.hour();

            if !(1..=12).contains(&hour) {
                return None;
            }

            let hour = match (hour, is_pm) {
                (12, false) => 0,
                (12, true) => 12,
                (hour, false) => hour,
                (hour, true) => hour + 12,
            };

            NaiveTime::from_hms_opt(hour, time.minute(), time.second())
        }
    }
}
