use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// Rounds half away from zero to `decimals` places for display.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub fn round_opt(value: Option<f64>, decimals: i32) -> Option<f64> {
    value.map(|v| round_to(v, decimals))
}

pub fn serialize_date<S>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    dt.format("%Y-%m-%d").to_string().serialize(serializer)
}
