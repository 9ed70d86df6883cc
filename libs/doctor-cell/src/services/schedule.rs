use crate::models::{Doctor, Session, SessionBounds};

pub const MORNING_DEFAULT_START: &str = "09:00";
pub const MORNING_DEFAULT_END: &str = "13:00";
pub const EVENING_DEFAULT_START: &str = "14:00";
pub const EVENING_DEFAULT_END: &str = "18:00";

/// Resolve the canonical 24-hour bounds for one of a doctor's sessions.
///
/// Stored times arrive in several historical shapes (`HH:MM`, `HH:MM:SS`,
/// free-text `h:mm AM/PM`); each bound falls back to the legacy combined
/// schedule fields and then to the hard defaults, so the result is always
/// usable.
pub fn resolve_session_bounds(doctor: &Doctor, session: Session) -> SessionBounds {
    let (raw_start, raw_end, default_start, default_end) = match session {
        Session::Morning => (
            doctor.morning_start_time.as_deref(),
            doctor.morning_end_time.as_deref(),
            MORNING_DEFAULT_START,
            MORNING_DEFAULT_END,
        ),
        Session::Evening => (
            doctor.evening_start_time.as_deref(),
            doctor.evening_end_time.as_deref(),
            EVENING_DEFAULT_START,
            EVENING_DEFAULT_END,
        ),
    };

    let raw_start = raw_start.or(doctor.start_time.as_deref());
    let raw_end = raw_end.or(doctor.end_time.as_deref());

    SessionBounds {
        start: normalize_time(raw_start.unwrap_or(default_start), default_start),
        end: normalize_time(raw_end.unwrap_or(default_end), default_end),
    }
}

/// Normalize a stored clock time to 24-hour `HH:MM`, returning `fallback`
/// when the value cannot be read as a time at all.
pub fn normalize_time(raw: &str, fallback: &str) -> String {
    let trimmed = raw.trim();

    if is_hhmm(trimmed) {
        return trimmed.to_string();
    }

    // HH:MM:SS and longer timestamps truncate to the clock prefix.
    if trimmed.len() > 5 && trimmed.is_char_boundary(5) {
        let (prefix, rest) = trimmed.split_at(5);
        if is_hhmm(prefix) && rest.starts_with(':') {
            return prefix.to_string();
        }
    }

    parse_twelve_hour(trimmed).unwrap_or_else(|| fallback.to_string())
}

/// Render a 24-hour `HH:MM` time as `h:mm AM/PM` for session labels,
/// or return `fallback` when the input is not a 24-hour time.
pub fn format_for_display(time24: &str, fallback: &str) -> String {
    let Some((hour, minute)) = split_hhmm(time24) else {
        return fallback.to_string();
    };

    let (hour12, meridiem) = match hour {
        0 => (12, "AM"),
        1..=11 => (hour, "AM"),
        12 => (12, "PM"),
        _ => (hour - 12, "PM"),
    };

    format!("{}:{:02} {}", hour12, minute, meridiem)
}

/// Minutes since midnight for a normalized `HH:MM` time.
pub fn minutes_of_day(time24: &str) -> Option<i32> {
    split_hhmm(time24).map(|(hour, minute)| hour * 60 + minute)
}

fn is_hhmm(value: &str) -> bool {
    let bytes = value.as_bytes();
    let shape_ok = bytes.len() == 5
        && bytes[0].is_ascii_digit()
        && bytes[1].is_ascii_digit()
        && bytes[2] == b':'
        && bytes[3].is_ascii_digit()
        && bytes[4].is_ascii_digit();
    if !shape_ok {
        return false;
    }

    let hour = (bytes[0] - b'0') * 10 + (bytes[1] - b'0');
    let minute = (bytes[3] - b'0') * 10 + (bytes[4] - b'0');
    hour <= 23 && minute <= 59
}

fn split_hhmm(value: &str) -> Option<(i32, i32)> {
    if !is_hhmm(value) {
        return None;
    }
    let hour: i32 = value[..2].parse().ok()?;
    let minute: i32 = value[3..].parse().ok()?;
    Some((hour, minute))
}

/// Parse `h:mm` with an optional AM/PM suffix. 12 AM maps to hour 0,
/// 12 PM stays 12, PM adds 12 to hours 1-11.
fn parse_twelve_hour(raw: &str) -> Option<String> {
    let lower = raw.to_ascii_lowercase();
    let (body, is_pm) = if let Some(stripped) = lower.strip_suffix("am") {
        (stripped.trim_end(), Some(false))
    } else if let Some(stripped) = lower.strip_suffix("pm") {
        (stripped.trim_end(), Some(true))
    } else {
        (lower.as_str(), None)
    };

    let (hour_part, minute_part) = body.trim().split_once(':')?;
    let mut hour: i32 = hour_part.trim().parse().ok()?;
    let minute: i32 = minute_part.trim().parse().ok()?;

    if !(0..=23).contains(&hour) || !(0..=59).contains(&minute) {
        return None;
    }

    match is_pm {
        Some(false) if hour == 12 => hour = 0,
        Some(true) if (1..=11).contains(&hour) => hour += 12,
        _ => {}
    }

    if hour > 23 {
        return None;
    }

    Some(format!("{:02}:{:02}", hour, minute))
}
