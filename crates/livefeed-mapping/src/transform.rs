//! Value transformations
//!
//! Clock strings look like `"MM:SS.t"`; either the minutes or the tenths
//! component may be missing (`"SS.t"`, `"MM:SS"`).

use std::fmt;
use std::num::ParseIntError;

use livefeed_wire::value_kind;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Transformation applied to a source value before it lands in an entry
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
pub enum Transformation {
    /// Pass through anything except null
    #[default]
    None,
    TimeMinutes,
    TimeSeconds,
    TimeTenths,
    AppendOrdinalSuffix,
    AssertString,
    AssertNumber,
    AssertBoolean,
}

/// Transformation failure
#[derive(Error, Debug, PartialEq)]
pub enum TransformError {
    #[error("unexpected source type: {}", value_kind(.0))]
    UnexpectedSourceType(Value),

    #[error("data extraction failed")]
    DataExtractionFailed,

    #[error("failed to parse int: {0}")]
    ParseInt(#[from] ParseIntError),
}

impl TransformError {
    /// Source was null, i.e. the field has no data yet
    pub fn is_missing_data(&self) -> bool {
        matches!(self, TransformError::UnexpectedSourceType(Value::Null))
    }
}

impl fmt::Display for Transformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Transformation::None => "No transformation",
            Transformation::TimeMinutes => "Extract minutes from time",
            Transformation::TimeSeconds => "Extract seconds from time",
            Transformation::TimeTenths => "Extract tenths from time",
            Transformation::AppendOrdinalSuffix => "Append ordinal suffix to number",
            Transformation::AssertString => "Assert string",
            Transformation::AssertNumber => "Assert number",
            Transformation::AssertBoolean => "Assert boolean",
        })
    }
}

impl Transformation {
    pub const ALL: [Transformation; 8] = [
        Transformation::None,
        Transformation::TimeMinutes,
        Transformation::TimeSeconds,
        Transformation::TimeTenths,
        Transformation::AppendOrdinalSuffix,
        Transformation::AssertString,
        Transformation::AssertNumber,
        Transformation::AssertBoolean,
    ];

    pub fn transform(&self, value: &Value) -> Result<Value, TransformError> {
        match self {
            Transformation::None => {
                if value.is_null() {
                    Err(TransformError::UnexpectedSourceType(Value::Null))
                } else {
                    Ok(value.clone())
                }
            }
            Transformation::TimeMinutes => {
                let whole = whole_part(clock_str(value)?)?;
                let mut parts = whole.split(':');
                let first = parts.next().ok_or(TransformError::DataExtractionFailed)?;
                if parts.next().is_none() {
                    // No minutes component
                    return Ok(Value::from(0));
                }
                Ok(Value::from(first.trim().parse::<i64>()?))
            }
            Transformation::TimeSeconds => {
                let whole = whole_part(clock_str(value)?)?;
                let seconds = whole
                    .rsplit(':')
                    .next()
                    .ok_or(TransformError::DataExtractionFailed)?;
                Ok(Value::from(seconds.trim().parse::<i64>()?))
            }
            Transformation::TimeTenths => {
                let mut split = clock_str(value)?.splitn(2, '.');
                split.next();
                match split.next() {
                    // No tenths component
                    None => Ok(Value::from(0)),
                    Some(tenths) => Ok(Value::from(tenths.trim().parse::<i64>()?)),
                }
            }
            Transformation::AppendOrdinalSuffix => {
                let n = value
                    .as_i64()
                    .ok_or_else(|| TransformError::UnexpectedSourceType(value.clone()))?;
                Ok(Value::String(with_ordinal_suffix(n)))
            }
            Transformation::AssertString => assert_kind(value, Value::is_string),
            Transformation::AssertNumber => assert_kind(value, Value::is_number),
            Transformation::AssertBoolean => assert_kind(value, Value::is_boolean),
        }
    }
}

fn clock_str(value: &Value) -> Result<&str, TransformError> {
    value
        .as_str()
        .map(str::trim)
        .ok_or_else(|| TransformError::UnexpectedSourceType(value.clone()))
}

/// Clock without its tenths
fn whole_part(clock: &str) -> Result<&str, TransformError> {
    clock
        .split('.')
        .next()
        .ok_or(TransformError::DataExtractionFailed)
}

fn assert_kind(value: &Value, check: fn(&Value) -> bool) -> Result<Value, TransformError> {
    if check(value) {
        Ok(value.clone())
    } else {
        Err(TransformError::UnexpectedSourceType(value.clone()))
    }
}

/// 1st, 2nd, 3rd, 4th, 11th, 12th, 13th, 21st ...
pub fn with_ordinal_suffix(n: i64) -> String {
    let last_two = (n % 100).abs();
    let suffix = match (last_two % 10, last_two) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_none_rejects_null() {
        assert!(Transformation::None
            .transform(&Value::Null)
            .unwrap_err()
            .is_missing_data());
        assert_eq!(Transformation::None.transform(&json!(4)), Ok(json!(4)));
    }

    #[test]
    fn test_clock_components() {
        let clock = json!(" 12:34.5 ");
        assert_eq!(Transformation::TimeMinutes.transform(&clock), Ok(json!(12)));
        assert_eq!(Transformation::TimeSeconds.transform(&clock), Ok(json!(34)));
        assert_eq!(Transformation::TimeTenths.transform(&clock), Ok(json!(5)));

        let seconds_only = json!("9.8");
        assert_eq!(Transformation::TimeMinutes.transform(&seconds_only), Ok(json!(0)));
        assert_eq!(Transformation::TimeSeconds.transform(&seconds_only), Ok(json!(9)));
        assert_eq!(Transformation::TimeTenths.transform(&seconds_only), Ok(json!(8)));

        let no_tenths = json!("1:02");
        assert_eq!(Transformation::TimeMinutes.transform(&no_tenths), Ok(json!(1)));
        assert_eq!(Transformation::TimeSeconds.transform(&no_tenths), Ok(json!(2)));
        assert_eq!(Transformation::TimeTenths.transform(&no_tenths), Ok(json!(0)));

        // Leading field is the minutes, trailing field the seconds
        let three_fields = json!("1:02:03");
        assert_eq!(Transformation::TimeMinutes.transform(&three_fields), Ok(json!(1)));
        assert_eq!(Transformation::TimeSeconds.transform(&three_fields), Ok(json!(3)));
    }

    #[test]
    fn test_clock_errors() {
        assert!(matches!(
            Transformation::TimeSeconds.transform(&json!(12)),
            Err(TransformError::UnexpectedSourceType(_))
        ));
        assert!(matches!(
            Transformation::TimeMinutes.transform(&json!("ab:10")),
            Err(TransformError::ParseInt(_))
        ));
    }

    #[test]
    fn test_ordinal_suffix() {
        let cases = [
            (1, "1st"),
            (2, "2nd"),
            (3, "3rd"),
            (4, "4th"),
            (11, "11th"),
            (12, "12th"),
            (13, "13th"),
            (21, "21st"),
            (22, "22nd"),
            (101, "101st"),
            (111, "111th"),
        ];
        for (n, expected) in cases {
            assert_eq!(
                Transformation::AppendOrdinalSuffix.transform(&json!(n)),
                Ok(json!(expected))
            );
        }
        assert!(Transformation::AppendOrdinalSuffix
            .transform(&json!("1"))
            .is_err());
    }

    #[test]
    fn test_assertions() {
        assert_eq!(Transformation::AssertString.transform(&json!("a")), Ok(json!("a")));
        assert!(Transformation::AssertString.transform(&json!(1)).is_err());
        assert_eq!(Transformation::AssertNumber.transform(&json!(1.5)), Ok(json!(1.5)));
        assert!(Transformation::AssertNumber.transform(&json!(null)).is_err());
        assert_eq!(Transformation::AssertBoolean.transform(&json!(true)), Ok(json!(true)));
        assert!(Transformation::AssertBoolean.transform(&json!("true")).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = TransformError::UnexpectedSourceType(json!([1]));
        assert_eq!(err.to_string(), "unexpected source type: array");
    }

    proptest! {
        #[test]
        fn clock_parts_recombine(minutes in 0i64..100, seconds in 0i64..60, tenths in 0i64..10) {
            let clock = json!(format!("{}:{:02}.{}", minutes, seconds, tenths));
            prop_assert_eq!(Transformation::TimeMinutes.transform(&clock), Ok(json!(minutes)));
            prop_assert_eq!(Transformation::TimeSeconds.transform(&clock), Ok(json!(seconds)));
            prop_assert_eq!(Transformation::TimeTenths.transform(&clock), Ok(json!(tenths)));
        }
    }
}
