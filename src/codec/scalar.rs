//! Scalar text codecs

use super::fixed_point::FixedPoint;
use crate::core::{DatabaseError, Result, Value};
use crate::schema::ScalarType;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

/// Output format for TIMESTAMP
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// Output format for TIMESTAMP WITH TIME ZONE
pub const TIMESTAMP_TZ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%:z";

/// Output format for DATE
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Output format for TIME
pub const TIME_FORMAT: &str = "%H:%M:%S%.f";

const TIMESTAMP_INPUT_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

const TIMESTAMP_TZ_INPUT_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
];

/// Boolean wire text
pub fn format_bool(value: bool) -> &'static str {
    if value {
        "t"
    } else {
        "f"
    }
}

/// Floating point wire text, including the non-finite spellings
pub fn format_real(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "Infinity".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else {
        value.to_string()
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "t" | "true" | "y" | "yes" | "on" | "1" => Some(true),
        "f" | "false" | "n" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_INPUT_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

fn parse_timestamp_tz(raw: &str) -> Option<DateTime<FixedOffset>> {
    TIMESTAMP_TZ_INPUT_FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(raw, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok())
}

impl ScalarType {
    /// Decode one non-null wire cell
    pub fn decode_text(&self, raw: &str) -> Result<Value> {
        let sql_type = self.declared_name();
        let fail = |message: &str| DatabaseError::decode(&sql_type, raw, message);

        match self {
            ScalarType::Integer | ScalarType::Serial => raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| fail(&e.to_string())),
            ScalarType::Real => raw
                .trim()
                .parse::<f64>()
                .map(Value::Real)
                .map_err(|e| fail(&e.to_string())),
            ScalarType::Text | ScalarType::Varchar(_) => Ok(Value::Text(raw.to_string())),
            ScalarType::Char(_) => Ok(Value::Text(raw.trim_end_matches(' ').to_string())),
            ScalarType::Boolean => parse_bool(raw)
                .map(Value::Bool)
                .ok_or_else(|| fail("expected a boolean literal")),
            ScalarType::Timestamp => parse_timestamp(raw)
                .map(Value::Timestamp)
                .ok_or_else(|| fail("expected YYYY-MM-DD HH:MM:SS[.f]")),
            ScalarType::TimestampTz => parse_timestamp_tz(raw)
                .map(Value::TimestampTz)
                .ok_or_else(|| fail("expected YYYY-MM-DD HH:MM:SS[.f]+TZ")),
            ScalarType::Date => NaiveDate::parse_from_str(raw, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|e| fail(&e.to_string())),
            ScalarType::Time => NaiveTime::parse_from_str(raw, TIME_FORMAT)
                .map(Value::Time)
                .map_err(|e| fail(&e.to_string())),
            ScalarType::Json | ScalarType::Jsonb => serde_json::from_str(raw)
                .map(Value::Json)
                .map_err(|e| fail(&e.to_string())),
            ScalarType::Numeric { precision, scale } => {
                FixedPoint::parse_with(raw, *precision, *scale).map(Value::Numeric)
            }
        }
    }

    /// Encode one non-null host value into wire text
    ///
    /// Text supplied for a non-text type is parsed first, so it must be valid
    /// wire text for that type.
    pub fn encode_text(&self, value: &Value) -> Result<String> {
        if let Value::Text(text) = value {
            if !self.is_textual() {
                let decoded = self.decode_text(text)?;
                return self.encode_text(&decoded);
            }
        }

        let mismatch = || DatabaseError::type_mismatch(&self.declared_name(), value.type_name());

        match (self, value) {
            (ScalarType::Integer | ScalarType::Serial, Value::Int(v)) => Ok(v.to_string()),
            (ScalarType::Real, Value::Real(v)) => Ok(format_real(*v)),
            (ScalarType::Real, Value::Int(v)) => Ok(format_real(*v as f64)),
            (ScalarType::Real, Value::Numeric(v)) => Ok(format_real(v.to_f64())),
            (ScalarType::Text | ScalarType::Varchar(_) | ScalarType::Char(_), Value::Text(v)) => {
                Ok(v.clone())
            }
            (ScalarType::Boolean, Value::Bool(v)) => Ok(format_bool(*v).to_string()),
            (ScalarType::Timestamp, Value::Timestamp(v)) => {
                Ok(v.format(TIMESTAMP_FORMAT).to_string())
            }
            (ScalarType::TimestampTz, Value::TimestampTz(v)) => {
                Ok(v.format(TIMESTAMP_TZ_FORMAT).to_string())
            }
            (ScalarType::Date, Value::Date(v)) => Ok(v.format(DATE_FORMAT).to_string()),
            (ScalarType::Time, Value::Time(v)) => Ok(v.format(TIME_FORMAT).to_string()),
            (ScalarType::Json | ScalarType::Jsonb, Value::Json(v)) => Ok(v.to_string()),
            (ScalarType::Numeric { precision, scale }, Value::Numeric(v)) => Ok(v
                .change_precision_and_scale(*precision, *scale)?
                .to_sql_string()),
            (ScalarType::Numeric { precision, scale }, Value::Int(v)) => {
                Ok(FixedPoint::from_i64(*v)
                    .change_precision_and_scale(*precision, *scale)?
                    .to_sql_string())
            }
            (ScalarType::Numeric { precision, scale }, Value::Real(v)) => {
                Ok(FixedPoint::from_f64(*v, *precision, *scale)?.to_sql_string())
            }
            _ => Err(mismatch()),
        }
    }

    fn is_textual(&self) -> bool {
        matches!(
            self,
            ScalarType::Text | ScalarType::Varchar(_) | ScalarType::Char(_)
        )
    }
}
