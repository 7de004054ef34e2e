//! Stateless HTTP request builder and response parser for the Ergast API.
//!
//! # Design
//! `ErgastClient` holds only a base URL and request headers and carries no
//! mutable state between calls. Building a request and parsing its response
//! are separate steps; a `Transport` performs the round-trip in between,
//! which keeps URL construction and payload decoding deterministic and easy
//! to test.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::query::{Query, Resource};
use crate::types::{
    Circuit, Constructor, ConstructorStanding, Driver, DriverStanding, Lap, PitStop, QualifyingResult, Race,
    RaceResult, Season, SprintResult, Status,
};

pub const DEFAULT_BASE_URL: &str = "https://api.jolpi.ca/ergast/f1";
pub const DEFAULT_USER_AGENT: &str = concat!("ergast-core/", env!("CARGO_PKG_VERSION"));

/// Where a resource's entities live inside `MRData`.
///
/// `nested` names a per-entry list to concatenate, for resources the upstream
/// reports per race (`Races[*].Results`) or per standings list. `leaf` names
/// the list inside each item that `MRData.total` counts, when it is not the
/// items themselves (`Laps[*].Timings`).
#[derive(Debug, Clone, Copy)]
struct Table {
    table: &'static str,
    list: &'static str,
    nested: Option<&'static str>,
    leaf: Option<&'static str>,
}

fn table_for(resource: Resource) -> Table {
    let (table, list, nested) = match resource {
        Resource::Seasons => ("SeasonTable", "Seasons", None),
        Resource::Races => ("RaceTable", "Races", None),
        Resource::Results => ("RaceTable", "Races", Some("Results")),
        Resource::Qualifying => ("RaceTable", "Races", Some("QualifyingResults")),
        Resource::Sprint => ("RaceTable", "Races", Some("SprintResults")),
        Resource::Drivers => ("DriverTable", "Drivers", None),
        Resource::Constructors => ("ConstructorTable", "Constructors", None),
        Resource::Circuits => ("CircuitTable", "Circuits", None),
        Resource::DriverStandings => ("StandingsTable", "StandingsLists", Some("DriverStandings")),
        Resource::ConstructorStandings => ("StandingsTable", "StandingsLists", Some("ConstructorStandings")),
        Resource::Status => ("StatusTable", "Status", None),
        Resource::Laps => ("RaceTable", "Races", Some("Laps")),
        Resource::PitStops => ("RaceTable", "Races", Some("PitStops")),
    };
    let leaf = match resource {
        Resource::Laps => Some("Timings"),
        _ => None,
    };
    Table {
        table,
        list,
        nested,
        leaf,
    }
}

/// One decoded page, with what the upstream reported about the whole result.
#[derive(Debug, Clone, PartialEq)]
pub struct Paged<T> {
    pub items: Vec<T>,
    /// `MRData.total`: rows matching the query across every page.
    pub total: u64,
    /// Rows on this page, counted the way `total` counts them.
    pub rows: u64,
    /// `season/round` of the race or standings list holding the first item.
    pub first_parent: Option<String>,
    /// `season/round` of the race or standings list holding the last item.
    pub last_parent: Option<String>,
}

impl<T> Paged<T> {
    /// Whether rows remain beyond this page, given the offset it started at.
    pub fn is_truncated(&self, offset: u64) -> bool {
        self.rows > 0 && offset + self.rows < self.total
    }
}

/// Synchronous, stateless client for the Ergast API.
#[derive(Debug, Clone)]
pub struct ErgastClient {
    base_url: String,
    user_agent: String,
    headers: Vec<(String, String)>,
}

impl ErgastClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            headers: Vec::new(),
        }
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    /// Send an extra header with every request, after the user agent.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, resource: Resource, query: &Query) -> String {
        format!("{}/{}", self.base_url, query.path(resource))
    }

    pub fn build(&self, resource: Resource, query: &Query) -> HttpRequest {
        let mut headers = vec![("user-agent".to_string(), self.user_agent.clone())];
        headers.extend(self.headers.iter().cloned());
        HttpRequest {
            method: HttpMethod::Get,
            path: self.url(resource, query),
            headers,
        }
    }

    /// Decode one page of `resource`, keeping the paging metadata that the
    /// `parse_*` methods drop.
    pub fn parse_page<T: DeserializeOwned>(
        &self,
        resource: Resource,
        response: HttpResponse,
    ) -> Result<Paged<T>, ApiError> {
        parse_table(response, resource)
    }

    pub fn parse_seasons(&self, response: HttpResponse) -> Result<Vec<Season>, ApiError> {
        parse_items(response, Resource::Seasons)
    }

    pub fn parse_races(&self, response: HttpResponse) -> Result<Vec<Race>, ApiError> {
        parse_items(response, Resource::Races)
    }

    pub fn parse_race_results(&self, response: HttpResponse) -> Result<Vec<RaceResult>, ApiError> {
        parse_items(response, Resource::Results)
    }

    pub fn parse_qualifying_results(&self, response: HttpResponse) -> Result<Vec<QualifyingResult>, ApiError> {
        parse_items(response, Resource::Qualifying)
    }

    pub fn parse_sprint_results(&self, response: HttpResponse) -> Result<Vec<SprintResult>, ApiError> {
        parse_items(response, Resource::Sprint)
    }

    pub fn parse_drivers(&self, response: HttpResponse) -> Result<Vec<Driver>, ApiError> {
        parse_items(response, Resource::Drivers)
    }

    pub fn parse_constructors(&self, response: HttpResponse) -> Result<Vec<Constructor>, ApiError> {
        parse_items(response, Resource::Constructors)
    }

    pub fn parse_circuits(&self, response: HttpResponse) -> Result<Vec<Circuit>, ApiError> {
        parse_items(response, Resource::Circuits)
    }

    pub fn parse_driver_standings(&self, response: HttpResponse) -> Result<Vec<DriverStanding>, ApiError> {
        parse_items(response, Resource::DriverStandings)
    }

    pub fn parse_constructor_standings(&self, response: HttpResponse) -> Result<Vec<ConstructorStanding>, ApiError> {
        parse_items(response, Resource::ConstructorStandings)
    }

    pub fn parse_statuses(&self, response: HttpResponse) -> Result<Vec<Status>, ApiError> {
        parse_items(response, Resource::Status)
    }

    pub fn parse_laps(&self, response: HttpResponse) -> Result<Vec<Lap>, ApiError> {
        parse_items(response, Resource::Laps)
    }

    pub fn parse_pit_stops(&self, response: HttpResponse) -> Result<Vec<PitStop>, ApiError> {
        parse_items(response, Resource::PitStops)
    }
}

impl Default for ErgastClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

/// Map non-2xx status codes to the appropriate `ApiError` variant.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    match response.status {
        404 => Err(ApiError::NotFound),
        status => Err(ApiError::HttpError {
            status,
            body: response.body.clone(),
        }),
    }
}

fn parse_items<T: DeserializeOwned>(response: HttpResponse, resource: Resource) -> Result<Vec<T>, ApiError> {
    parse_table(response, resource).map(|page| page.items)
}

fn parse_table<T: DeserializeOwned>(response: HttpResponse, resource: Resource) -> Result<Paged<T>, ApiError> {
    check_status(&response)?;
    let payload: Value = serde_json::from_str(&response.body)?;
    let data = payload
        .get("MRData")
        .and_then(Value::as_object)
        .ok_or_else(|| ApiError::Decode("missing MRData object".to_string()))?;

    let total = total(data.get("total"))?;
    if total == 0 {
        return Err(ApiError::EmptyResult);
    }

    let table = table_for(resource);
    let entries = data
        .get(table.table)
        .and_then(|t| t.get(table.list))
        .and_then(Value::as_array)
        .ok_or_else(|| ApiError::Decode(format!("missing {}.{}", table.table, table.list)))?;

    let mut page = Paged {
        items: Vec::new(),
        total,
        rows: 0,
        first_parent: None,
        last_parent: None,
    };
    for (i, entry) in entries.iter().enumerate() {
        match table.nested {
            None => {
                page.rows += leaf_rows(entry, table.leaf);
                page.items.push(decode(entry, || format!("{}[{i}]", table.list))?);
            }
            Some(key) => {
                let nested = entry
                    .get(key)
                    .and_then(Value::as_array)
                    .ok_or_else(|| ApiError::Decode(format!("missing {}[{i}].{key}", table.list)))?;
                if nested.is_empty() {
                    continue;
                }
                let parent = format!("{}/{}", entry["season"], entry["round"]);
                page.first_parent.get_or_insert_with(|| parent.clone());
                page.last_parent = Some(parent);
                for (j, item) in nested.iter().enumerate() {
                    page.rows += leaf_rows(item, table.leaf);
                    page.items.push(decode(item, || format!("{}[{i}].{key}[{j}]", table.list))?);
                }
            }
        }
    }
    Ok(page)
}

fn leaf_rows(item: &Value, leaf: Option<&str>) -> u64 {
    match leaf {
        None => 1,
        Some(key) => item.get(key).and_then(Value::as_array).map_or(0, |rows| rows.len() as u64),
    }
}

fn decode<T: DeserializeOwned>(value: &Value, at: impl FnOnce() -> String) -> Result<T, ApiError> {
    T::deserialize(value).map_err(|e| ApiError::Decode(format!("{}: {e}", at())))
}

fn total(value: Option<&Value>) -> Result<u64, ApiError> {
    let parsed = match value {
        Some(Value::String(s)) => s.parse().ok(),
        Some(Value::Number(n)) => n.as_u64(),
        _ => None,
    };
    parsed.ok_or_else(|| ApiError::Decode("missing or invalid MRData.total".to_string()))
}
