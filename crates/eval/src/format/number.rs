//! Numeric format specifiers.
//!
//! Standard specifiers are a letter plus an optional precision (`C0`, `N2`,
//! `F3`, `D6`, `P1`, `G`). Anything else is read as a custom pattern built
//! from `0`, `#`, `.`, `,`, `%`, quoted literals and `;` section breaks.
//! Rounding is always half away from zero.

use rust_decimal::{Decimal, RoundingStrategy};

use super::FormatError;

const MAX_PRECISION: u32 = 28;

/// True when `spec` reads as a numeric specifier rather than a date one.
pub fn is_numeric_spec(spec: &str) -> bool {
    if let Some((letter, _)) = standard(spec) {
        return matches!(letter.to_ascii_uppercase(), 'C' | 'N' | 'F' | 'D' | 'P' | 'G');
    }
    tokenize(spec)
        .map(|sections| {
            sections
                .iter()
                .flatten()
                .any(|t| matches!(t, Token::Digit { .. }))
        })
        .unwrap_or(false)
}

pub fn format_decimal(value: Decimal, spec: &str) -> Result<String, FormatError> {
    match standard(spec) {
        Some((letter, precision)) => format_standard(value, spec, letter, precision),
        None => format_custom(value, spec),
    }
}

/// Split `C2` into `('C', Some(2))`. A lone letter has no precision.
fn standard(spec: &str) -> Option<(char, Option<u32>)> {
    let mut chars = spec.chars();
    let letter = chars.next().filter(char::is_ascii_alphabetic)?;
    let rest = chars.as_str();
    if rest.is_empty() {
        return Some((letter, None));
    }
    if rest.len() <= 2 && rest.chars().all(|c| c.is_ascii_digit()) {
        return rest.parse().ok().map(|p| (letter, Some(p)));
    }
    None
}

fn format_standard(
    value: Decimal,
    spec: &str,
    letter: char,
    precision: Option<u32>,
) -> Result<String, FormatError> {
    let fixed = |default: u32| precision.unwrap_or(default).min(MAX_PRECISION);
    let text = match letter.to_ascii_uppercase() {
        'C' => {
            let (negative, digits) = fixed_digits(value, fixed(2));
            let body = format!("${}", group_fixed(&digits));
            signed(negative, body)
        }
        'N' => {
            let (negative, digits) = fixed_digits(value, fixed(2));
            signed(negative, group_fixed(&digits))
        }
        'F' => {
            let (negative, digits) = fixed_digits(value, fixed(2));
            signed(negative, digits)
        }
        'P' => {
            let scaled = value.checked_mul(Decimal::ONE_HUNDRED).ok_or_else(|| FormatError {
                format: spec.to_string(),
                message: "percent scaling overflowed".to_string(),
            })?;
            let (negative, digits) = fixed_digits(scaled, fixed(2));
            signed(negative, format!("{}%", group_fixed(&digits)))
        }
        'D' => {
            if !value.fract().is_zero() {
                return Err(FormatError {
                    format: spec.to_string(),
                    message: format!("{} is not an integer", value),
                });
            }
            let (negative, digits) = fixed_digits(value, 0);
            let width = precision.unwrap_or(0) as usize;
            signed(negative, format!("{:0>width$}", digits, width = width))
        }
        'G' => value.normalize().to_string(),
        _ => {
            return Err(FormatError {
                format: spec.to_string(),
                message: format!("unsupported numeric specifier '{}'", letter),
            })
        }
    };
    Ok(text)
}

/// Round to `scale` places and return the sign plus the unsigned digits.
/// A value that rounds to zero is never negative.
fn fixed_digits(value: Decimal, scale: u32) -> (bool, String) {
    let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(scale);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    (negative, rounded.abs().to_string())
}

fn signed(negative: bool, body: String) -> String {
    if negative {
        format!("-{}", body)
    } else {
        body
    }
}

/// Insert thousands separators into the integral part of `1234567.89`.
fn group_fixed(digits: &str) -> String {
    match digits.split_once('.') {
        Some((int, frac)) => format!("{}.{}", group(int), frac),
        None => group(digits),
    }
}

fn group(int: &str) -> String {
    let len = int.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in int.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ──────────────────────────────────────────────
// Custom patterns
// ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Digit { zero: bool },
    Point,
    Comma,
    Percent,
    Literal(String),
}

fn tokenize(spec: &str) -> Result<Vec<Vec<Token>>, FormatError> {
    let mut sections = vec![Vec::new()];
    let mut chars = spec.chars();
    while let Some(c) = chars.next() {
        let token = match c {
            '0' => Token::Digit { zero: true },
            '#' => Token::Digit { zero: false },
            '.' => Token::Point,
            ',' => Token::Comma,
            '%' => Token::Percent,
            ';' => {
                sections.push(Vec::new());
                continue;
            }
            '\\' => match chars.next() {
                Some(escaped) => Token::Literal(escaped.to_string()),
                None => {
                    return Err(FormatError {
                        format: spec.to_string(),
                        message: "trailing escape character".to_string(),
                    })
                }
            },
            '\'' | '"' => {
                let mut text = String::new();
                loop {
                    match chars.next() {
                        Some(q) if q == c => break,
                        Some(other) => text.push(other),
                        None => {
                            return Err(FormatError {
                                format: spec.to_string(),
                                message: "unterminated quoted literal".to_string(),
                            })
                        }
                    }
                }
                Token::Literal(text)
            }
            other => Token::Literal(other.to_string()),
        };
        if let Some(section) = sections.last_mut() {
            section.push(token);
        }
    }
    Ok(sections)
}

fn format_custom(value: Decimal, spec: &str) -> Result<String, FormatError> {
    let sections = tokenize(spec)?;
    let positive = &sections[0];
    let negative = sections.get(1).filter(|s| !s.is_empty());
    let zero = sections.get(2).filter(|s| !s.is_empty());

    let (section, explicit_sign) = if value.is_zero() {
        (zero.unwrap_or(positive), false)
    } else if value.is_sign_negative() {
        match negative {
            Some(neg) => (neg, true),
            None => (positive, false),
        }
    } else {
        (positive, false)
    };

    let (non_zero, body) = render_section(value.abs(), section, spec)?;
    let negative_value = value.is_sign_negative() && !explicit_sign && non_zero;
    Ok(signed(negative_value, body))
}

/// Format a non-negative value against one section. Returns whether the
/// rounded value is non-zero alongside the text.
fn render_section(value: Decimal, tokens: &[Token], spec: &str) -> Result<(bool, String), FormatError> {
    let point = tokens.iter().position(|t| *t == Token::Point);
    let (int_tokens, frac_tokens) = match point {
        Some(p) => (&tokens[..p], &tokens[p + 1..]),
        None => (tokens, &tokens[tokens.len()..]),
    };

    let last_digit = int_tokens
        .iter()
        .rposition(|t| matches!(t, Token::Digit { .. }));
    let first_digit = int_tokens
        .iter()
        .position(|t| matches!(t, Token::Digit { .. }));

    let mut grouping = false;
    let mut scale_commas = 0u32;
    for (i, t) in int_tokens.iter().enumerate() {
        if *t != Token::Comma {
            continue;
        }
        let digit_before = first_digit.is_some_and(|f| f < i);
        let digit_after = last_digit.is_some_and(|l| l > i);
        if digit_before && digit_after {
            grouping = true;
        } else if digit_before && !digit_after {
            scale_commas += 1;
        }
    }
    let percents = tokens.iter().filter(|t| **t == Token::Percent).count();

    let overflow = || FormatError {
        format: spec.to_string(),
        message: "value out of range for pattern".to_string(),
    };
    let mut scaled = value;
    for _ in 0..percents {
        scaled = scaled.checked_mul(Decimal::ONE_HUNDRED).ok_or_else(overflow)?;
    }
    for _ in 0..scale_commas {
        scaled = scaled.checked_div(Decimal::ONE_THOUSAND).ok_or_else(overflow)?;
    }

    let frac_slots: Vec<bool> = frac_tokens
        .iter()
        .filter_map(|t| match t {
            Token::Digit { zero } => Some(*zero),
            _ => None,
        })
        .collect();
    let scale = (frac_slots.len() as u32).min(MAX_PRECISION);
    let (_, digits) = fixed_digits(scaled, scale);
    let (int_digits, frac_digits) = match digits.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (digits, String::new()),
    };
    let non_zero = int_digits.chars().chain(frac_digits.chars()).any(|c| c != '0');

    // Trailing fractional zeros may be dropped down to the last '0' slot.
    let min_frac = frac_slots.iter().rposition(|z| *z).map_or(0, |p| p + 1);
    let mut frac_digits = frac_digits;
    while frac_digits.len() > min_frac && frac_digits.ends_with('0') {
        frac_digits.pop();
    }

    let min_int = match first_digit {
        Some(f) => int_tokens[f..]
            .iter()
            .skip_while(|t| !matches!(t, Token::Digit { zero: true }))
            .filter(|t| matches!(t, Token::Digit { .. }))
            .count(),
        None => 0,
    };
    let mut int_digits = if int_digits == "0" {
        String::new()
    } else {
        int_digits
    };
    while int_digits.len() < min_int {
        int_digits.insert(0, '0');
    }

    let mut out = match first_digit {
        Some(first) if grouping => {
            let mut s = literal_text(&int_tokens[..first]);
            s.push_str(&group(&int_digits));
            s.push_str(&literal_text(&int_tokens[first..]));
            s
        }
        Some(first) => fill_integral(int_tokens, first, &int_digits),
        None => {
            let mut s = literal_text(int_tokens);
            s.push_str(&int_digits);
            s
        }
    };

    if point.is_some() {
        let mut remaining = frac_digits.chars();
        let mut frac_out = String::new();
        let mut wrote_digit = false;
        for t in frac_tokens {
            match t {
                Token::Digit { .. } => {
                    if let Some(d) = remaining.next() {
                        frac_out.push(d);
                        wrote_digit = true;
                    }
                }
                other => frac_out.push_str(&token_literal(other)),
            }
        }
        if wrote_digit {
            out.push('.');
        }
        out.push_str(&frac_out);
    }
    Ok((non_zero, out))
}

/// Place digits into `#`/`0` slots right to left. The leftmost slot takes
/// any digits left over.
fn fill_integral(tokens: &[Token], first_digit: usize, digits: &str) -> String {
    let mut digits: Vec<char> = digits.chars().collect();
    let mut pieces: Vec<String> = Vec::new();
    for (i, t) in tokens.iter().enumerate().rev() {
        match t {
            Token::Digit { .. } if i == first_digit => {
                pieces.push(digits.drain(..).collect());
            }
            Token::Digit { .. } => {
                if let Some(d) = digits.pop() {
                    pieces.push(d.to_string());
                }
            }
            Token::Comma => {}
            other => pieces.push(token_literal(other)),
        }
    }
    pieces.reverse();
    pieces.concat()
}

fn literal_text(tokens: &[Token]) -> String {
    tokens
        .iter()
        .filter(|t| !matches!(t, Token::Digit { .. } | Token::Comma))
        .map(token_literal)
        .collect()
}

fn token_literal(token: &Token) -> String {
    match token {
        Token::Literal(s) => s.clone(),
        Token::Percent => "%".to_string(),
        Token::Point => ".".to_string(),
        Token::Comma => ",".to_string(),
        Token::Digit { .. } => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn fmt(v: &str, spec: &str) -> String {
        format_decimal(d(v), spec).unwrap()
    }

    #[test]
    fn currency() {
        assert_eq!(fmt("1234.5", "C0"), "$1,235");
        assert_eq!(fmt("1234.5", "C"), "$1,234.50");
        assert_eq!(fmt("-1234", "C2"), "-$1,234.00");
        assert_eq!(fmt("0.004", "C"), "$0.00");
        assert_eq!(fmt("-0.004", "C"), "$0.00");
    }

    #[test]
    fn number_fixed_percent() {
        assert_eq!(fmt("1234567.891", "N2"), "1,234,567.89");
        assert_eq!(fmt("1234567.891", "N0"), "1,234,568");
        assert_eq!(fmt("2.5", "F0"), "3");
        assert_eq!(fmt("-2.5", "F0"), "-3");
        assert_eq!(fmt("1234.5", "F3"), "1234.500");
        assert_eq!(fmt("0.125", "P"), "12.50%");
        assert_eq!(fmt("0.5", "P0"), "50%");
    }

    #[test]
    fn decimal_and_general() {
        assert_eq!(fmt("42", "D5"), "00042");
        assert_eq!(fmt("-42", "D"), "-42");
        assert!(format_decimal(d("4.2"), "D").is_err());
        assert_eq!(fmt("1500.00", "G"), "1500");
        assert_eq!(fmt("1500.25", "G5"), "1500.25");
    }

    #[test]
    fn custom_grouping_and_places() {
        assert_eq!(fmt("1234567.5", "#,##0.00"), "1,234,567.50");
        assert_eq!(fmt("0.5", "#,##0.00"), "0.50");
        assert_eq!(fmt("12.3456", "0.##"), "12.35");
        assert_eq!(fmt("12", "0.##"), "12");
        assert_eq!(fmt("7", "000"), "007");
        assert_eq!(fmt("1234.5", "$#,##0"), "$1,235");
    }

    #[test]
    fn custom_positional_fill() {
        assert_eq!(fmt("5551234567", "(###) ###-####"), "(555) 123-4567");
        assert_eq!(fmt("123456789", "###-##-####"), "123-45-6789");
    }

    #[test]
    fn custom_sections_and_literals() {
        assert_eq!(fmt("-5", "#,##0;(#,##0)"), "(5)");
        assert_eq!(fmt("5", "#,##0;(#,##0)"), "5");
        assert_eq!(fmt("0", "#,##0;(#,##0);'nil'"), "nil");
        assert_eq!(fmt("-5", "#,##0"), "-5");
        assert_eq!(fmt("0.25", "0%"), "25%");
        assert_eq!(fmt("1500000", "#,##0,,'M'"), "2M");
    }

    #[test]
    fn spec_classification() {
        assert!(is_numeric_spec("C0"));
        assert!(is_numeric_spec("#,##0.00"));
        assert!(!is_numeric_spec("MM/dd/yyyy"));
        assert!(!is_numeric_spec("T"));
    }

    #[test]
    fn unsupported_letter_is_an_error() {
        assert!(format_decimal(d("1"), "Q").is_err());
    }
}
