//! Endpoint descriptors: which resource to fetch and how to filter it.
//!
//! A `Query` only ever carries what the caller set. Defaults such as
//! "current season" or "last round" are applied by `Session` before the
//! request is built, never here.

use std::fmt;

/// One upstream resource category, each with a fixed path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Seasons,
    Races,
    Results,
    Qualifying,
    Sprint,
    Drivers,
    Constructors,
    Circuits,
    DriverStandings,
    ConstructorStandings,
    Status,
    Laps,
    PitStops,
}

impl Resource {
    pub fn segment(self) -> &'static str {
        match self {
            Resource::Seasons => "seasons",
            Resource::Races => "races",
            Resource::Results => "results",
            Resource::Qualifying => "qualifying",
            Resource::Sprint => "sprint",
            Resource::Drivers => "drivers",
            Resource::Constructors => "constructors",
            Resource::Circuits => "circuits",
            Resource::DriverStandings => "driverStandings",
            Resource::ConstructorStandings => "constructorStandings",
            Resource::Status => "status",
            Resource::Laps => "laps",
            Resource::PitStops => "pitstops",
        }
    }

    /// Segment used for the finishing or standing position filter.
    fn position_segment(self) -> &'static str {
        match self {
            Resource::DriverStandings
            | Resource::ConstructorStandings
            | Resource::Qualifying
            | Resource::Sprint => self.segment(),
            _ => Resource::Results.segment(),
        }
    }
}

/// Season selector: a calendar year or the season in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Year {
    Number(u16),
    Current,
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Year::Number(year) => write!(f, "{year}"),
            Year::Current => f.write_str("current"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Round {
    Number(u32),
    Last,
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Round::Number(round) => write!(f, "{round}"),
            Round::Last => f.write_str("last"),
        }
    }
}

/// Pagination window appended as query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 1000;

    fn query_string(&self) -> String {
        let params: Vec<String> = [("limit", self.limit), ("offset", self.offset)]
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| format!("{name}={v}")))
            .collect();
        if params.is_empty() {
            String::new()
        } else {
            format!("?{}", params.join("&"))
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: Some(Self::DEFAULT_LIMIT),
            offset: None,
        }
    }
}

/// Filter parameters for a single call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub season: Option<Year>,
    pub round: Option<Round>,
    pub circuit_id: Option<String>,
    pub constructor_id: Option<String>,
    pub driver_id: Option<String>,
    pub status_id: Option<u32>,
    pub lap: Option<u32>,
    pub position: Option<u32>,
    pub page: Page,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn season(mut self, year: u16) -> Self {
        self.season = Some(Year::Number(year));
        self
    }

    pub fn current_season(mut self) -> Self {
        self.season = Some(Year::Current);
        self
    }

    pub fn round(mut self, round: u32) -> Self {
        self.round = Some(Round::Number(round));
        self
    }

    pub fn last_round(mut self) -> Self {
        self.round = Some(Round::Last);
        self
    }

    pub fn circuit(mut self, circuit_id: impl Into<String>) -> Self {
        self.circuit_id = Some(circuit_id.into());
        self
    }

    pub fn constructor(mut self, constructor_id: impl Into<String>) -> Self {
        self.constructor_id = Some(constructor_id.into());
        self
    }

    pub fn driver(mut self, driver_id: impl Into<String>) -> Self {
        self.driver_id = Some(driver_id.into());
        self
    }

    pub fn status(mut self, status_id: u32) -> Self {
        self.status_id = Some(status_id);
        self
    }

    pub fn lap(mut self, lap: u32) -> Self {
        self.lap = Some(lap);
        self
    }

    pub fn position(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.page.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u32) -> Self {
        self.page.offset = Some(offset);
        self
    }

    /// Drop the default limit so the upstream applies its own.
    pub fn unpaged(mut self) -> Self {
        self.page = Page {
            limit: None,
            offset: None,
        };
        self
    }

    /// Resolve the path below the base URL, extension and query string included.
    ///
    /// Blank ids count as unset. A filter naming the requested resource becomes the resource's id
    /// (`drivers/hamilton`) instead of a separate filter segment.
    pub fn path(&self, resource: Resource) -> String {
        let mut segments: Vec<String> = Vec::new();
        if let Some(season) = self.season {
            segments.push(season.to_string());
        }
        if let Some(round) = self.round {
            segments.push(round.to_string());
        }

        let filters = [
            (Resource::Circuits.segment(), self.circuit_id.clone()),
            (Resource::Constructors.segment(), self.constructor_id.clone()),
            (Resource::Drivers.segment(), self.driver_id.clone()),
            (Resource::Laps.segment(), self.lap.map(|n| n.to_string())),
            (Resource::Status.segment(), self.status_id.map(|n| n.to_string())),
            (resource.position_segment(), self.position.map(|n| n.to_string())),
        ];

        let mut own_id = None;
        for (name, value) in filters {
            let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
                continue;
            };
            if name == resource.segment() {
                own_id = Some(value);
            } else {
                segments.push(name.to_string());
                segments.push(value);
            }
        }

        segments.push(resource.segment().to_string());
        if let Some(id) = own_id {
            segments.push(id);
        }

        format!("{}.json{}", segments.join("/"), self.page.query_string())
    }
}
