//! Date and time specifiers, US English conventions.
//!
//! Single-letter specifiers (`d`, `D`, `f`, `F`, `g`, `G`, `M`, `Y`, `s`,
//! `t`, `T`, `o`) expand to fixed patterns; anything longer is a custom
//! pattern of `y`, `M`, `d`, `h`, `H`, `m`, `s`, `f`, `F` and `t` runs.

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, Month, OffsetDateTime, PrimitiveDateTime};

use super::FormatError;

/// `M/d/yyyy`
pub fn short_date(dt: PrimitiveDateTime) -> String {
    format!("{}/{}/{}", u8::from(dt.month()), dt.day(), dt.year())
}

/// `M/d/yyyy h:mm:ss tt`
pub fn general(dt: PrimitiveDateTime) -> String {
    format!(
        "{} {}:{:02}:{:02} {}",
        short_date(dt),
        hour12(dt.hour()),
        dt.minute(),
        dt.second(),
        meridiem(dt.hour())
    )
}

pub fn format_datetime(dt: PrimitiveDateTime, spec: &str) -> Result<String, FormatError> {
    let mut chars = spec.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        let pattern = match c {
            'd' => "M/d/yyyy",
            'D' => "dddd, MMMM d, yyyy",
            'f' => "dddd, MMMM d, yyyy h:mm tt",
            'F' => "dddd, MMMM d, yyyy h:mm:ss tt",
            'g' => "M/d/yyyy h:mm tt",
            'G' => "M/d/yyyy h:mm:ss tt",
            'M' | 'm' => "MMMM d",
            'Y' | 'y' => "MMMM yyyy",
            's' => "yyyy'-'MM'-'dd'T'HH':'mm':'ss",
            't' => "h:mm tt",
            'T' => "h:mm:ss tt",
            'o' | 'O' => "yyyy'-'MM'-'dd'T'HH':'mm':'ss'.'fffffff",
            other => {
                return Err(FormatError {
                    format: spec.to_string(),
                    message: format!("unsupported date specifier '{}'", other),
                })
            }
        };
        return format_custom(dt, pattern);
    }
    format_custom(dt, spec)
}

fn format_custom(dt: PrimitiveDateTime, pattern: &str) -> Result<String, FormatError> {
    let chars: Vec<char> = pattern.chars().collect();
    let mut out = String::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\'' | '"' => {
                let close = chars[i + 1..]
                    .iter()
                    .position(|q| *q == c)
                    .ok_or_else(|| FormatError {
                        format: pattern.to_string(),
                        message: "unterminated quoted literal".to_string(),
                    })?;
                out.extend(&chars[i + 1..i + 1 + close]);
                i += close + 2;
                continue;
            }
            '\\' => {
                let escaped = chars.get(i + 1).ok_or_else(|| FormatError {
                    format: pattern.to_string(),
                    message: "trailing escape character".to_string(),
                })?;
                out.push(*escaped);
                i += 2;
                continue;
            }
            '%' => {
                i += 1;
                continue;
            }
            _ => {}
        }

        let run = chars[i..].iter().take_while(|x| **x == c).count();
        i += run;
        match c {
            'y' => out.push_str(&year(dt.year(), run)),
            'M' => out.push_str(&month(dt.month(), run)),
            'd' => match run {
                1 => out.push_str(&dt.day().to_string()),
                2 => out.push_str(&format!("{:02}", dt.day())),
                3 => out.push_str(&abbrev(&dt.weekday().to_string())),
                _ => out.push_str(&dt.weekday().to_string()),
            },
            'h' => out.push_str(&pad(u32::from(hour12(dt.hour())), run)),
            'H' => out.push_str(&pad(u32::from(dt.hour()), run)),
            'm' => out.push_str(&pad(u32::from(dt.minute()), run)),
            's' => out.push_str(&pad(u32::from(dt.second()), run)),
            'f' | 'F' => {
                let digits = run.min(9);
                let fraction = format!("{:09}", dt.nanosecond());
                let mut text = fraction[..digits].to_string();
                if c == 'F' {
                    while text.ends_with('0') {
                        text.pop();
                    }
                    if text.is_empty() && out.ends_with('.') {
                        out.pop();
                    }
                }
                out.push_str(&text);
            }
            't' => {
                let tt = meridiem(dt.hour());
                if run == 1 {
                    out.push_str(&tt[..1]);
                } else {
                    out.push_str(tt);
                }
            }
            other => {
                for _ in 0..run {
                    out.push(other);
                }
            }
        }
    }
    Ok(out)
}

fn year(year: i32, run: usize) -> String {
    match run {
        1 => (year % 100).to_string(),
        2 => format!("{:02}", year % 100),
        n => format!("{:0width$}", year, width = n),
    }
}

fn month(month: Month, run: usize) -> String {
    match run {
        1 => u8::from(month).to_string(),
        2 => format!("{:02}", u8::from(month)),
        3 => abbrev(&month.to_string()),
        _ => month.to_string(),
    }
}

fn abbrev(name: &str) -> String {
    name.chars().take(3).collect()
}

fn pad(n: u32, run: usize) -> String {
    if run >= 2 {
        format!("{:02}", n)
    } else {
        n.to_string()
    }
}

fn hour12(hour: u8) -> u8 {
    match hour % 12 {
        0 => 12,
        h => h,
    }
}

fn meridiem(hour: u8) -> &'static str {
    if hour < 12 {
        "AM"
    } else {
        "PM"
    }
}

/// Read a date out of projection text.
///
/// Accepts RFC 3339, ISO-8601 local date-times (`T` or space separated,
/// optional fractional seconds), bare ISO dates and US `M/d/yyyy`.
pub fn parse_date_text(text: &str) -> Option<PrimitiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(odt) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(PrimitiveDateTime::new(odt.date(), odt.time()));
    }
    let local_formats = [
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
        format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    ];
    for fmt in local_formats {
        if let Ok(dt) = PrimitiveDateTime::parse(text, fmt) {
            return Some(dt);
        }
    }
    if let Ok(date) = Date::parse(text, format_description!("[year]-[month]-[day]")) {
        return Some(date.midnight());
    }
    us_short_date(text).map(Date::midnight)
}

fn us_short_date(text: &str) -> Option<Date> {
    let mut parts = text.split('/');
    let month: u8 = parts.next()?.trim().parse().ok()?;
    let day: u8 = parts.next()?.trim().parse().ok()?;
    let year: i32 = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() || year < 1000 {
        return None;
    }
    Date::from_calendar_date(year, Month::try_from(month).ok()?, day).ok()
}
