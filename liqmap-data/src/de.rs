//! Lenient field deserializers.
//!
//! Upstream APIs mix JSON numbers and numeric strings for the same field. A field that is
//! missing, null, non-numeric or non-finite decodes to `None` so the row can be skipped
//! instead of failing the whole response.

use serde::{Deserialize, Deserializer, de::IgnoredAny};

#[derive(Deserialize)]
#[serde(untagged)]
enum Numeric {
    Int(i64),
    Float(f64),
    Str(String),
    Other(IgnoredAny),
}

/// Deserialize a number or numeric string as `Option<f64>`.
pub fn de_opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Numeric>::deserialize(deserializer)?;
    Ok(value
        .and_then(|value| match value {
            Numeric::Int(int) => Some(int as f64),
            Numeric::Float(float) => Some(float),
            Numeric::Str(str) => str.trim().parse::<f64>().ok(),
            Numeric::Other(_) => None,
        })
        .filter(|value| value.is_finite()))
}

/// Deserialize an integer, integral float or numeric string as `Option<i64>`.
pub fn de_opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Numeric>::deserialize(deserializer)?;
    Ok(value.and_then(|value| match value {
        Numeric::Int(int) => Some(int),
        Numeric::Float(float) if float.is_finite() && float.fract() == 0.0 => Some(float as i64),
        Numeric::Str(str) => str.trim().parse::<i64>().ok(),
        _ => None,
    }))
}

/// Deserialize a string or number as `String` (eg/ API status codes).
pub fn de_code<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Numeric::deserialize(deserializer)? {
        Numeric::Int(int) => int.to_string(),
        Numeric::Float(float) => float.to_string(),
        Numeric::Str(str) => str,
        Numeric::Other(_) => String::new(),
    })
}
