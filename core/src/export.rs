//! Export views shared by every result object.
//!
//! All four views derive from the serde representation of the object, so
//! they are pure functions of its field values.

use serde::de::DeserializeOwned;
use serde::ser::Error as _;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::types::{
    AverageSpeed, Circuit, Constructor, ConstructorStanding, Driver, DriverStanding, FastestLap, Lap, Location,
    PitStop, QualifyingResult, Race, RaceResult, ResultTime, Season, SessionSchedule, Status, Timing,
};

/// Mapping, tuple, flattened and JSON views of a result object.
pub trait Record: Serialize + DeserializeOwned + Sized {
    /// Field name to value, in declaration order, nested objects as nested maps.
    fn to_map(&self) -> serde_json::Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(serde_json::Error::custom(format!("expected an object, got {other}"))),
        }
    }

    /// Field values in declaration order. Nested objects become nested
    /// sequences, so the length always equals the declared field count.
    fn to_tuple(&self) -> serde_json::Result<Vec<Value>> {
        Ok(self.to_map()?.into_iter().map(|(_, v)| into_tuple_value(v)).collect())
    }

    /// Single-level mapping with compound keys for nested objects.
    fn to_flat_map(&self) -> serde_json::Result<Map<String, Value>> {
        Ok(flatten(self.to_map()?, None))
    }

    fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Rebuild an object from its `to_map` view.
    fn from_map(map: Map<String, Value>) -> serde_json::Result<Self> {
        serde_json::from_value(Value::Object(map))
    }
}

impl Record for Season {}
impl Record for Driver {}
impl Record for Constructor {}
impl Record for Location {}
impl Record for Circuit {}
impl Record for SessionSchedule {}
impl Record for Race {}
impl Record for ResultTime {}
impl Record for AverageSpeed {}
impl Record for FastestLap {}
impl Record for RaceResult {}
impl Record for QualifyingResult {}
impl Record for DriverStanding {}
impl Record for ConstructorStanding {}
impl Record for Status {}
impl Record for Timing {}
impl Record for Lap {}
impl Record for PitStop {}

fn into_tuple_value(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Array(map.into_iter().map(|(_, v)| into_tuple_value(v)).collect()),
        Value::Array(items) => Value::Array(items.into_iter().map(into_tuple_value).collect()),
        other => other,
    }
}

/// Fold nested mappings into their parent.
///
/// A child key `k` under parent key `p` becomes `lowercase(p) + capitalize(k)`,
/// applied recursively, so `Circuit.Location.lat` becomes
/// `circuitlocationLat`. Sequences are kept as values. When `only` is given,
/// only mappings stored under one of those keys are folded.
pub fn flatten(map: Map<String, Value>, only: Option<&[&str]>) -> Map<String, Value> {
    let mut out = Map::new();
    flatten_into(&mut out, map, "", only);
    out
}

fn flatten_into(out: &mut Map<String, Value>, map: Map<String, Value>, parent: &str, only: Option<&[&str]>) {
    for (key, value) in map {
        let new_key = if parent.is_empty() {
            key.clone()
        } else {
            format!("{}{}", parent.to_lowercase(), capitalize(&key))
        };
        let fold = only.map_or(true, |keys| keys.contains(&key.as_str()));
        match value {
            Value::Object(nested) if fold => flatten_into(out, nested, &new_key, only),
            other => {
                out.insert(new_key, other);
            }
        }
    }
}

/// First character upper case, the rest lower case.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn race() -> Race {
        serde_json::from_value(json!({
            "season": "2020",
            "round": "3",
            "url": "https://en.wikipedia.org/wiki/2020_Hungarian_Grand_Prix",
            "raceName": "Hungarian Grand Prix",
            "Circuit": {
                "circuitId": "hungaroring",
                "url": "http://en.wikipedia.org/wiki/Hungaroring",
                "circuitName": "Hungaroring",
                "Location": { "lat": "47.5789", "long": "19.2486", "locality": "Budapest", "country": "Hungary" }
            },
            "date": "2020-07-19",
            "time": "13:10:00Z"
        }))
        .unwrap()
    }

    fn count_leaves(map: &Map<String, Value>) -> usize {
        map.values()
            .map(|v| match v {
                Value::Object(nested) => count_leaves(nested),
                _ => 1,
            })
            .sum()
    }

    #[test]
    fn to_map_preserves_declaration_order_and_nesting() {
        let map = race().to_map().unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            [
                "season", "round", "url", "raceName", "Circuit", "date", "time", "FirstPractice", "SecondPractice",
                "ThirdPractice", "Qualifying", "Sprint", "Results"
            ]
        );
        assert_eq!(map["season"], 2020);
        assert_eq!(map["Circuit"]["Location"]["locality"], "Budapest");
        assert_eq!(map["date"], "2020-07-19");
        assert_eq!(map["time"], "13:10:00Z");
        assert!(map["FirstPractice"].is_null());
    }

    #[test]
    fn to_tuple_length_matches_field_count() {
        let tuple = race().to_tuple().unwrap();
        assert_eq!(tuple.len(), 13);
        assert_eq!(tuple[3], "Hungarian Grand Prix");
        assert_eq!(tuple[4][2], "Hungaroring");
        assert_eq!(tuple[4][3][2], "Budapest");
        assert_eq!(tuple[12], json!([]));
    }

    #[test]
    fn map_view_round_trips() {
        let expected = race();
        let back = Race::from_map(expected.to_map().unwrap()).unwrap();
        assert_eq!(back, expected);
        assert_eq!(back.date, NaiveDate::from_ymd_opt(2020, 7, 19).unwrap());
    }

    fn decoded<T: DeserializeOwned>(resource: crate::query::Resource, body: &str) -> Vec<T> {
        let response = crate::http::HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: body.to_string(),
        };
        crate::client::ErgastClient::default()
            .parse_page(resource, response)
            .unwrap()
            .items
    }

    #[test]
    fn race_result_round_trips_through_nested_timing() {
        let results: Vec<RaceResult> =
            decoded(crate::query::Resource::Results, include_str!("../../test-vectors/results_last.json"));
        let winner = &results[0];
        let fastest = winner.fastest_lap.as_ref().unwrap();
        assert!(fastest.time.is_some());
        assert!(fastest.average_speed.is_some());

        for result in &results {
            let back = RaceResult::from_map(result.to_map().unwrap()).unwrap();
            assert_eq!(&back, result);
        }
        let map = winner.to_map().unwrap();
        let speed = fastest.average_speed.as_ref().unwrap().speed.unwrap();
        assert_eq!(map["FastestLap"]["AverageSpeed"]["speed"], speed);
    }

    #[test]
    fn pit_stop_round_trips_converted_duration() {
        let stops: Vec<PitStop> =
            decoded(crate::query::Resource::PitStops, include_str!("../../test-vectors/pitstops_last.json"));
        let long = &stops[1];
        assert!((long.duration - 61.52).abs() < 1e-9);

        let map = long.to_map().unwrap();
        assert_eq!(map["duration"], long.duration);
        let back = PitStop::from_map(map).unwrap();
        assert_eq!(&back, long);
        assert_eq!(PitStop::from_map(stops[0].to_map().unwrap()).unwrap(), stops[0]);
    }

    #[test]
    fn flat_map_uses_compound_keys() {
        let flat = race().to_flat_map().unwrap();
        assert_eq!(flat["circuitCircuitname"], "Hungaroring");
        assert_eq!(flat["circuitlocationLat"], 47.5789);
        assert_eq!(flat["raceName"], "Hungarian Grand Prix");
        assert!(!flat.contains_key("Circuit"));
    }

    #[test]
    fn flat_map_has_one_key_per_leaf() {
        let race = race();
        let map = race.to_map().unwrap();
        let flat = race.to_flat_map().unwrap();
        assert_eq!(flat.len(), count_leaves(&map));
        assert!(flat.values().all(|v| !v.is_object()));
    }

    #[test]
    fn flat_map_folds_present_sessions() {
        let mut race = race();
        race.first_practice = Some(SessionSchedule {
            date: NaiveDate::from_ymd_opt(2020, 7, 17).unwrap(),
            time: None,
        });
        let flat = race.to_flat_map().unwrap();
        assert_eq!(flat["firstpracticeDate"], "2020-07-17");
        assert!(flat["firstpracticeTime"].is_null());
        assert!(flat["SecondPractice"].is_null());
        assert_eq!(flat.len(), count_leaves(&race.to_map().unwrap()));
    }

    #[test]
    fn flatten_only_selected_keys() {
        let data = json!({
            "key_1": "value_1",
            "key_2": { "nested_key_1": "nested_value_1", "nested_key_2": "nested_value_2" },
            "key_3": { "nested_key_3": "nested_value_3" }
        });
        let Value::Object(map) = data else { unreachable!() };

        let partial = flatten(map.clone(), Some(&["key_2"]));
        assert_eq!(
            Value::Object(partial),
            json!({
                "key_1": "value_1",
                "key_2Nested_key_1": "nested_value_1",
                "key_2Nested_key_2": "nested_value_2",
                "key_3": { "nested_key_3": "nested_value_3" }
            })
        );

        let full = flatten(map, None);
        assert_eq!(full["key_3Nested_key_3"], "nested_value_3");
        assert_eq!(full.len(), 4);
    }

    #[test]
    fn to_json_is_compact_map_text() {
        let race = race();
        let text = race.to_json().unwrap();
        assert!(text.starts_with(r#"{"season":2020,"round":3,"#));
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, Value::Object(race.to_map().unwrap()));
    }

    #[test]
    fn capitalize_lowers_the_tail() {
        assert_eq!(capitalize("circuitName"), "Circuitname");
        assert_eq!(capitalize("Location"), "Location");
        assert_eq!(capitalize(""), "");
    }
}
