//! Result objects decoded from the `MRData` payload.
//!
//! # Design
//! One struct per upstream entity kind. Serde keys match the upstream names
//! exactly, so `to_map` reproduces the upstream vocabulary with typed values.
//! Optional upstream fields are `Option` and always serialized (as `null`
//! when absent), keeping every export view the same shape for a given type.
//! Unknown upstream keys are ignored.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::de;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Season {
    #[serde(deserialize_with = "de::number")]
    pub season: u16,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub driver_id: String,
    pub url: String,
    pub given_name: String,
    pub family_name: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    pub nationality: String,
    #[serde(default, deserialize_with = "de::optional_number")]
    pub permanent_number: Option<u32>,
    #[serde(default)]
    pub code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constructor {
    pub constructor_id: String,
    pub url: String,
    pub name: String,
    pub nationality: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(deserialize_with = "de::number")]
    pub lat: f64,
    #[serde(deserialize_with = "de::number")]
    pub long: f64,
    pub locality: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Circuit {
    pub circuit_id: String,
    pub url: String,
    pub circuit_name: String,
    #[serde(rename = "Location")]
    pub location: Location,
}

/// Date and optional start time of one weekend session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSchedule {
    pub date: NaiveDate,
    #[serde(default, with = "de::optional_time")]
    pub time: Option<NaiveTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Race {
    #[serde(deserialize_with = "de::number")]
    pub season: u16,
    #[serde(deserialize_with = "de::number")]
    pub round: u32,
    pub url: String,
    pub race_name: String,
    #[serde(rename = "Circuit")]
    pub circuit: Circuit,
    pub date: NaiveDate,
    #[serde(default, with = "de::optional_time")]
    pub time: Option<NaiveTime>,
    #[serde(rename = "FirstPractice", default)]
    pub first_practice: Option<SessionSchedule>,
    #[serde(rename = "SecondPractice", default)]
    pub second_practice: Option<SessionSchedule>,
    #[serde(rename = "ThirdPractice", default)]
    pub third_practice: Option<SessionSchedule>,
    #[serde(rename = "Qualifying", default)]
    pub qualifying: Option<SessionSchedule>,
    #[serde(rename = "Sprint", default)]
    pub sprint: Option<SessionSchedule>,
    /// Present only when the race came from a results query.
    #[serde(rename = "Results", default)]
    pub results: Vec<RaceResult>,
}

/// Finishing time relative to the winner, or total time for the winner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultTime {
    #[serde(default, deserialize_with = "de::optional_number")]
    pub millis: Option<u64>,
    #[serde(default)]
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageSpeed {
    #[serde(default)]
    pub units: Option<String>,
    #[serde(default, deserialize_with = "de::optional_number")]
    pub speed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastestLap {
    #[serde(default, deserialize_with = "de::optional_number")]
    pub rank: Option<u32>,
    #[serde(default, deserialize_with = "de::optional_number")]
    pub lap: Option<u32>,
    #[serde(rename = "Time", default)]
    pub time: Option<ResultTime>,
    #[serde(rename = "AverageSpeed", default)]
    pub average_speed: Option<AverageSpeed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceResult {
    #[serde(deserialize_with = "de::number")]
    pub number: u32,
    #[serde(deserialize_with = "de::number")]
    pub position: u32,
    pub position_text: String,
    #[serde(deserialize_with = "de::number")]
    pub points: f64,
    #[serde(rename = "Driver")]
    pub driver: Driver,
    #[serde(rename = "Constructor")]
    pub constructor: Constructor,
    #[serde(deserialize_with = "de::number")]
    pub grid: u32,
    #[serde(deserialize_with = "de::number")]
    pub laps: u32,
    pub status: String,
    #[serde(rename = "Time", default)]
    pub time: Option<ResultTime>,
    #[serde(rename = "FastestLap", default)]
    pub fastest_lap: Option<FastestLap>,
}

/// Sprint classifications carry the same fields as race results.
pub type SprintResult = RaceResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualifyingResult {
    #[serde(deserialize_with = "de::number")]
    pub number: u32,
    #[serde(deserialize_with = "de::number")]
    pub position: u32,
    #[serde(rename = "Driver")]
    pub driver: Driver,
    #[serde(rename = "Constructor")]
    pub constructor: Constructor,
    #[serde(rename = "Q1", default)]
    pub q1: Option<String>,
    #[serde(rename = "Q2", default)]
    pub q2: Option<String>,
    #[serde(rename = "Q3", default)]
    pub q3: Option<String>,
}

/// A driver's championship position. `position` is absent for drivers the
/// upstream lists as unclassified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverStanding {
    #[serde(default, deserialize_with = "de::optional_number")]
    pub position: Option<u32>,
    pub position_text: String,
    #[serde(deserialize_with = "de::number")]
    pub points: f64,
    #[serde(deserialize_with = "de::number")]
    pub wins: u32,
    #[serde(rename = "Driver")]
    pub driver: Driver,
    #[serde(rename = "Constructors", default)]
    pub constructors: Vec<Constructor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstructorStanding {
    #[serde(default, deserialize_with = "de::optional_number")]
    pub position: Option<u32>,
    pub position_text: String,
    #[serde(deserialize_with = "de::number")]
    pub points: f64,
    #[serde(deserialize_with = "de::number")]
    pub wins: u32,
    #[serde(rename = "Constructor")]
    pub constructor: Constructor,
}

/// A finishing status code and how often it occurred for the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Status {
    #[serde(deserialize_with = "de::number")]
    pub status_id: u32,
    pub status: String,
    #[serde(deserialize_with = "de::number")]
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    pub driver_id: String,
    #[serde(deserialize_with = "de::number")]
    pub position: u32,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lap {
    #[serde(deserialize_with = "de::number")]
    pub number: u32,
    #[serde(rename = "Timings", default)]
    pub timings: Vec<Timing>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PitStop {
    pub driver_id: String,
    #[serde(deserialize_with = "de::number")]
    pub lap: u32,
    #[serde(deserialize_with = "de::number")]
    pub stop: u32,
    pub time: String,
    /// Stationary time in seconds.
    #[serde(deserialize_with = "de::seconds")]
    pub duration: f64,
}
