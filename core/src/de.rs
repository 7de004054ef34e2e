//! Lenient scalar decoding for upstream payloads.
//!
//! The upstream encodes every number as a string (`"season": "2020"`) and
//! every time of day with a trailing `Z`. The helpers here accept both the
//! upstream encoding and plain JSON numbers, so an object's mapping view
//! decodes back into the same object.

use std::fmt::Display;
use std::str::FromStr;

use chrono::NaiveTime;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum StrOrNum<T> {
    Num(T),
    Str(String),
}

impl<T> StrOrNum<T>
where
    T: FromStr,
    T::Err: Display,
{
    fn into_value<E: serde::de::Error>(self) -> Result<T, E> {
        match self {
            StrOrNum::Num(n) => Ok(n),
            StrOrNum::Str(s) => s.trim().parse().map_err(E::custom),
        }
    }
}

/// A number that may arrive as a JSON number or a numeric string.
pub fn number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: Display,
{
    StrOrNum::<T>::deserialize(deserializer)?.into_value()
}

/// Like `number`, but `null` and the empty string decode to `None`.
pub fn optional_number<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: Display,
{
    match Option::<StrOrNum<T>>::deserialize(deserializer)? {
        None => Ok(None),
        Some(StrOrNum::Str(s)) if s.trim().is_empty() => Ok(None),
        Some(v) => v.into_value().map(Some),
    }
}

/// Pit stop durations: seconds (`"22.019"`) or minutes and seconds
/// (`"1:02.345"`), returned as seconds.
pub fn seconds<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match StrOrNum::<f64>::deserialize(deserializer)? {
        StrOrNum::Num(n) => Ok(n),
        StrOrNum::Str(s) => parse_seconds(&s).ok_or_else(|| D::Error::custom(format!("invalid duration {s:?}"))),
    }
}

pub(crate) fn parse_seconds(s: &str) -> Option<f64> {
    let s = s.trim();
    match s.split_once(':') {
        Some((minutes, rest)) => {
            let minutes: u32 = minutes.parse().ok()?;
            let secs: f64 = rest.parse().ok()?;
            Some(f64::from(minutes) * 60.0 + secs)
        }
        None => s.parse().ok(),
    }
}

pub(crate) fn parse_utc_time(s: &str) -> Option<NaiveTime> {
    s.trim().trim_end_matches('Z').parse().ok()
}

/// Optional UTC time of day, written as `HH:MM:SS[.fff]Z`.
pub mod optional_time {
    use super::*;
    use serde::de::Error as _;

    pub fn serialize<S>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(t) => serializer.serialize_str(&t.format("%H:%M:%S%.fZ").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(None),
            Some(s) if s.trim().is_empty() => Ok(None),
            Some(s) => parse_utc_time(&s)
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid time {s:?}"))),
        }
    }
}
