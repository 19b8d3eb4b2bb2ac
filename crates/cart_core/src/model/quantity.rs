//! Lenient quantity input normalization.
//!
//! # Invariants
//! - Coercion never fails: input that cannot be read as an integer becomes
//!   [`DEFAULT_QUANTITY`].
//! - Zero and negative integers pass through unchanged.

/// Quantity used when the caller's input is not an integer.
pub const DEFAULT_QUANTITY: i64 = 1;

/// Raw quantity as received from a request.
#[derive(Debug, Clone, PartialEq)]
pub enum QuantityInput {
    Integer(i64),
    Float(f64),
    Text(String),
    Missing,
}

impl QuantityInput {
    /// Normalizes the input to an integer quantity.
    ///
    /// Text is trimmed and read as a signed base-10 integer; floats are
    /// truncated toward zero.
    pub fn coerce(&self) -> i64 {
        match self {
            Self::Integer(value) => *value,
            Self::Float(value) => coerce_float(*value),
            Self::Text(value) => parse_integer_text(value).unwrap_or(DEFAULT_QUANTITY),
            Self::Missing => DEFAULT_QUANTITY,
        }
    }
}

impl From<i64> for QuantityInput {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for QuantityInput {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<u32> for QuantityInput {
    fn from(value: u32) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<usize> for QuantityInput {
    fn from(value: usize) -> Self {
        i64::try_from(value).map_or(Self::Missing, Self::Integer)
    }
}

impl From<f64> for QuantityInput {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for QuantityInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for QuantityInput {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<T: Into<QuantityInput>> From<Option<T>> for QuantityInput {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Missing, Into::into)
    }
}

/// Coerces any supported input into an integer quantity.
pub fn coerce_quantity(input: impl Into<QuantityInput>) -> i64 {
    input.into().coerce()
}

fn coerce_float(value: f64) -> i64 {
    if !value.is_finite() {
        return DEFAULT_QUANTITY;
    }
    let truncated = value.trunc();
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return DEFAULT_QUANTITY;
    }
    truncated as i64
}

fn parse_integer_text(raw: &str) -> Option<i64> {
    let trimmed = raw.trim();
    let (negative, digits) = match trimmed.as_bytes().first()? {
        b'-' => (true, &trimmed[1..]),
        b'+' => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    // Underscores may only separate digits.
    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
    {
        return None;
    }

    let mut value: i64 = 0;
    for ch in digits.chars().filter(|ch| *ch != '_') {
        let digit = i64::from(ch.to_digit(10)?);
        value = value.checked_mul(10)?;
        value = if negative {
            value.checked_sub(digit)?
        } else {
            value.checked_add(digit)?
        };
    }
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::{coerce_quantity, QuantityInput, DEFAULT_QUANTITY};

    #[test]
    fn integers_pass_through() {
        assert_eq!(coerce_quantity(3), 3);
        assert_eq!(coerce_quantity(0i64), 0);
        assert_eq!(coerce_quantity(-2), -2);
    }

    #[test]
    fn numeric_text_is_trimmed_and_parsed() {
        assert_eq!(coerce_quantity(" 4 "), 4);
        assert_eq!(coerce_quantity("+7"), 7);
        assert_eq!(coerce_quantity("-3"), -3);
        assert_eq!(coerce_quantity("1_000"), 1000);
    }

    #[test]
    fn malformed_text_defaults_to_one() {
        for raw in ["", "  ", "abc", "2.5", "1__0", "_1", "1_", "+", "-", "9223372036854775808"] {
            assert_eq!(coerce_quantity(raw), DEFAULT_QUANTITY, "input `{raw}`");
        }
    }

    #[test]
    fn floats_truncate_toward_zero() {
        assert_eq!(coerce_quantity(2.9), 2);
        assert_eq!(coerce_quantity(-2.9), -2);
        assert_eq!(coerce_quantity(f64::NAN), DEFAULT_QUANTITY);
        assert_eq!(coerce_quantity(f64::INFINITY), DEFAULT_QUANTITY);
    }

    #[test]
    fn missing_input_defaults_to_one() {
        assert_eq!(coerce_quantity(None::<i64>), DEFAULT_QUANTITY);
        assert_eq!(coerce_quantity(Some("5")), 5);
        assert_eq!(QuantityInput::Missing.coerce(), DEFAULT_QUANTITY);
    }

    #[test]
    fn i64_min_text_parses() {
        assert_eq!(coerce_quantity("-9223372036854775808"), i64::MIN);
    }
}
