//! Public call surface: one `get_*` per entity kind.
//!
//! # Design
//! A `Session` pairs the stateless `ErgastClient` with a `Transport`. Each
//! call fills in the defaults its endpoint needs (for example "current
//! season, last round" for race results), builds the request, executes it
//! and decodes the payload. The upstream caps the page size below the
//! default limit, so a truncated page is followed by further requests until
//! the requested window is complete.
//!
//! Calls are synchronous and the session performs no throttling; callers
//! must stay within the upstream limit of four requests per second and two
//! hundred per hour. A call that needs several pages counts once per page.

use serde::de::DeserializeOwned;

use crate::cache::ResponseCache;
use crate::client::{ErgastClient, Paged};
use crate::config::{CacheConfig, ClientConfig};
use crate::error::ApiError;
use crate::query::{Query, Resource, Round, Year};
use crate::transport::{CachedTransport, Transport, UreqTransport};
use crate::types::{
    Circuit, Constructor, ConstructorStanding, Driver, DriverStanding, Lap, PitStop, QualifyingResult, Race,
    RaceResult, Season, SprintResult, Status,
};

pub struct Session<T = Box<dyn Transport>> {
    client: ErgastClient,
    transport: T,
    cache: Option<ResponseCache>,
}

impl Session {
    /// Build a session over ureq, cached unless `config.cache.enabled` is false.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = config.client();
        let live = UreqTransport::new();
        if !config.cache.enabled {
            let transport: Box<dyn Transport> = Box::new(live);
            return Ok(Self::with_transport(client, transport));
        }

        let cached = Session::cached(client, live, &config.cache)?;
        let transport: Box<dyn Transport> = Box::new(cached.transport);
        Ok(Self {
            client: cached.client,
            transport,
            cache: cached.cache,
        })
    }
}

impl<T: Transport> Session<CachedTransport<T>> {
    /// Wrap `inner` with the response cache described by `config`, ignoring
    /// `config.enabled`. Clears the store first when `force_clear` is set.
    pub fn cached(client: ErgastClient, inner: T, config: &CacheConfig) -> Result<Self, ApiError> {
        let cache = ResponseCache::open(&config.directory, config.expire_after())?;
        if config.force_clear {
            cache.clear().map_err(|e| {
                tracing::warn!(path = %cache.dir().display(), error = %e, "failed to clear response cache");
                ApiError::CacheDirectory(cache.dir().to_path_buf())
            })?;
        }
        Ok(Self {
            client,
            transport: CachedTransport::new(inner, cache.clone()),
            cache: Some(cache),
        })
    }
}

impl<T: Transport> Session<T> {
    pub fn with_transport(client: ErgastClient, transport: T) -> Self {
        Self {
            client,
            transport,
            cache: None,
        }
    }

    pub fn client(&self) -> &ErgastClient {
        &self.client
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The response cache, when the session was built with one.
    pub fn cache(&self) -> Option<&ResponseCache> {
        self.cache.as_ref()
    }

    /// Request pages of `resource` until the window `query.page` asks for,
    /// capped at `MRData.total`, has been received.
    fn fetch_pages<R: DeserializeOwned>(
        &self,
        resource: Resource,
        query: &Query,
    ) -> Result<Vec<Paged<R>>, ApiError> {
        let start = u64::from(query.page.offset.unwrap_or(0));
        let mut page_query = query.clone();
        let mut offset = start;
        let mut pages = Vec::new();
        loop {
            let request = self.client.build(resource, &page_query);
            let response = self.transport.execute(&request)?;
            let page: Paged<R> = self.client.parse_page(resource, response)?;

            let end = match query.page.limit {
                Some(limit) => page.total.min(start + u64::from(limit)),
                None => page.total,
            };
            let more = page.is_truncated(offset);
            offset += page.rows;
            pages.push(page);
            if !more || offset >= end {
                break;
            }

            tracing::debug!(resource = resource.segment(), offset, end, "following truncated page");
            page_query.page.offset = Some(page_bound(offset)?);
            if query.page.limit.is_some() {
                page_query.page.limit = Some(page_bound(end - offset)?);
            }
        }
        Ok(pages)
    }

    fn fetch<R: DeserializeOwned>(&self, resource: Resource, query: &Query) -> Result<Vec<R>, ApiError> {
        let pages = self.fetch_pages(resource, query)?;
        let count = pages.len();
        let items: Vec<R> = pages.into_iter().flat_map(|page| page.items).collect();
        tracing::debug!(resource = resource.segment(), pages = count, items = items.len(), "decoded");
        Ok(items)
    }

    /// Every season on record.
    pub fn get_seasons(&self, query: &Query) -> Result<Vec<Season>, ApiError> {
        self.fetch(Resource::Seasons, query)
    }

    /// Race calendar. Defaults to the current season.
    pub fn get_races(&self, query: &Query) -> Result<Vec<Race>, ApiError> {
        self.fetch(Resource::Races, &in_season(query))
    }

    /// Race classification. Defaults to the last race of the current season.
    pub fn get_race_results(&self, query: &Query) -> Result<Vec<RaceResult>, ApiError> {
        self.fetch(Resource::Results, &in_race(query))
    }

    /// Qualifying classification. Defaults to the last race of the current season.
    pub fn get_qualifying_results(&self, query: &Query) -> Result<Vec<QualifyingResult>, ApiError> {
        self.fetch(Resource::Qualifying, &in_race(query))
    }

    /// Sprint classifications. Defaults to every sprint of the current season.
    pub fn get_sprint_results(&self, query: &Query) -> Result<Vec<SprintResult>, ApiError> {
        self.fetch(Resource::Sprint, &in_season(query))
    }

    /// Drivers, all-time unless a season (and round) is given.
    pub fn get_drivers(&self, query: &Query) -> Result<Vec<Driver>, ApiError> {
        self.fetch(Resource::Drivers, query)
    }

    /// Constructors, all-time unless a season (and round) is given.
    pub fn get_constructors(&self, query: &Query) -> Result<Vec<Constructor>, ApiError> {
        self.fetch(Resource::Constructors, query)
    }

    /// Circuits, all-time unless a season (and round) is given.
    pub fn get_circuits(&self, query: &Query) -> Result<Vec<Circuit>, ApiError> {
        self.fetch(Resource::Circuits, query)
    }

    /// Drivers' championship after the given round, or at the end of the
    /// season. Defaults to the current season.
    pub fn get_driver_standings(&self, query: &Query) -> Result<Vec<DriverStanding>, ApiError> {
        self.fetch(Resource::DriverStandings, &in_season(query))
    }

    /// Constructors' championship, with the same defaults as driver standings.
    pub fn get_constructor_standings(&self, query: &Query) -> Result<Vec<ConstructorStanding>, ApiError> {
        self.fetch(Resource::ConstructorStandings, &in_season(query))
    }

    /// The drivers' champion of every season, oldest first.
    pub fn get_driver_champions(&self) -> Result<Vec<DriverStanding>, ApiError> {
        self.fetch(Resource::DriverStandings, &Query::new().position(1))
    }

    /// The constructors' champion of every season since 1958, oldest first.
    pub fn get_constructor_champions(&self) -> Result<Vec<ConstructorStanding>, ApiError> {
        self.fetch(Resource::ConstructorStandings, &Query::new().position(1))
    }

    /// Finishing status codes with their counts.
    pub fn get_finishing_statuses(&self, query: &Query) -> Result<Vec<Status>, ApiError> {
        self.fetch(Resource::Status, query)
    }

    /// Lap timings, available from 1996. Defaults to lap 1 of the last race
    /// of the current season.
    pub fn get_lap_times(&self, query: &Query) -> Result<Vec<Lap>, ApiError> {
        let mut query = in_race(query);
        query.lap.get_or_insert(1);

        // A lap whose timings straddle a page boundary arrives twice.
        let mut laps: Vec<Lap> = Vec::new();
        let mut last_parent = None;
        for page in self.fetch_pages::<Lap>(Resource::Laps, &query)? {
            let mut items = page.items.into_iter();
            if let Some(first) = items.next() {
                let same_race = last_parent.is_some() && last_parent == page.first_parent;
                match laps.last_mut() {
                    Some(last) if same_race && last.number == first.number => last.timings.extend(first.timings),
                    _ => laps.push(first),
                }
            }
            laps.extend(items);
            last_parent = page.last_parent;
        }
        Ok(laps)
    }

    /// Pit stops, available from 2012. Defaults to the last race of the
    /// current season.
    pub fn get_pit_stops(&self, query: &Query) -> Result<Vec<PitStop>, ApiError> {
        self.fetch(Resource::PitStops, &in_race(query))
    }
}

fn page_bound(n: u64) -> Result<u32, ApiError> {
    u32::try_from(n).map_err(|_| ApiError::Decode(format!("page bound {n} out of range")))
}

fn in_season(query: &Query) -> Query {
    let mut query = query.clone();
    query.season.get_or_insert(Year::Current);
    query
}

fn in_race(query: &Query) -> Query {
    let mut query = in_season(query);
    query.round.get_or_insert(Round::Last);
    query
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::Record;
    use crate::transport::tests::RecordingTransport;
    use serde_json::json;
    use std::time::Duration;
    use temp_dir::TempDir;

    const BASE_URL: &str = "http://mock/ergast/f1";
    const RACES_2020: &str = include_str!("../../test-vectors/races_2020.json");
    const RESULTS_LAST: &str = include_str!("../../test-vectors/results_last.json");
    const EMPTY: &str = include_str!("../../test-vectors/empty.json");

    fn session(live: &RecordingTransport) -> Session<&RecordingTransport> {
        Session::with_transport(ErgastClient::new(BASE_URL), live)
    }

    fn cache_config(dir: &TempDir, force_clear: bool) -> CacheConfig {
        CacheConfig {
            enabled: true,
            directory: dir.path().to_path_buf(),
            expire_after_secs: Some(3600),
            force_clear,
        }
    }

    #[test]
    fn races_for_2020_decode_two_races_with_circuits() {
        let live = RecordingTransport::new(200, RACES_2020);
        let races = session(&live).get_races(&Query::new().season(2020)).unwrap();

        assert_eq!(live.paths.borrow()[0], format!("{BASE_URL}/2020/races.json?limit=1000"));
        assert_eq!(races.len(), 2);
        for race in &races {
            assert!(!race.circuit.circuit_name.is_empty());
            assert!(race.results.is_empty());
            assert_eq!(race.to_tuple().unwrap().len(), 13);
        }
        assert_eq!(races[1].race_name, "Styrian Grand Prix");
    }

    #[test]
    fn defaults_are_applied_per_endpoint() {
        let live = RecordingTransport::new(200, EMPTY);
        let session = session(&live);
        let none = Query::new();

        let _ = session.get_race_results(&none);
        let _ = session.get_races(&none);
        let _ = session.get_drivers(&none);
        let _ = session.get_lap_times(&none);
        let _ = session.get_pit_stops(&Query::new().round(5));
        let _ = session.get_driver_champions();

        let paths = live.paths.borrow();
        let suffixes: Vec<&str> = paths.iter().map(|p| &p[BASE_URL.len() + 1..]).collect();
        assert_eq!(
            suffixes,
            [
                "current/last/results.json?limit=1000",
                "current/races.json?limit=1000",
                "drivers.json?limit=1000",
                "current/last/laps/1.json?limit=1000",
                "current/5/pitstops.json?limit=1000",
                "driverStandings/1.json?limit=1000",
            ]
        );
    }

    #[test]
    fn explicit_parameters_override_defaults() {
        let live = RecordingTransport::new(200, RESULTS_LAST);
        session(&live)
            .get_race_results(&Query::new().season(2021).round(22))
            .unwrap();
        assert!(live.paths.borrow()[0].ends_with("/2021/22/results.json?limit=1000"));
    }

    #[test]
    fn results_are_flattened_across_races() {
        let live = RecordingTransport::new(200, RESULTS_LAST);
        let results = session(&live).get_race_results(&Query::new()).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].driver.code.as_deref(), Some("VER"));
        let fastest = results[0].fastest_lap.as_ref().unwrap();
        assert_eq!(fastest.average_speed.as_ref().unwrap().speed, Some(220.859));
        assert!(results[1].fastest_lap.is_none());
    }

    fn drivers_page(total: usize, ids: std::ops::Range<usize>) -> String {
        let drivers: Vec<_> = ids
            .map(|i| {
                json!({ "driverId": format!("d{i}"), "url": "", "givenName": "A", "familyName": "B", "nationality": "C" })
            })
            .collect();
        json!({ "MRData": { "limit": "2", "total": total.to_string(), "DriverTable": { "Drivers": drivers } } }).to_string()
    }

    fn laps_page(total: usize, races: &[(&str, u32, &[&str])]) -> String {
        let races: Vec<_> = races
            .iter()
            .map(|(round, lap, drivers)| {
                let timings: Vec<_> = drivers
                    .iter()
                    .map(|id| json!({ "driverId": id, "position": "1", "time": "1:31.125" }))
                    .collect();
                json!({ "season": "2021", "round": round, "Laps": [{ "number": lap.to_string(), "Timings": timings }] })
            })
            .collect();
        json!({ "MRData": { "limit": "2", "total": total.to_string(), "RaceTable": { "Races": races } } }).to_string()
    }

    #[test]
    fn truncated_pages_are_followed_to_the_total() {
        let live = RecordingTransport::pages(&[drivers_page(5, 0..2), drivers_page(5, 2..4), drivers_page(5, 4..5)]);
        let drivers = session(&live).get_drivers(&Query::new()).unwrap();

        let ids: Vec<&str> = drivers.iter().map(|d| d.driver_id.as_str()).collect();
        assert_eq!(ids, ["d0", "d1", "d2", "d3", "d4"]);
        let paths = live.paths.borrow();
        let suffixes: Vec<&str> = paths.iter().map(|p| &p[BASE_URL.len() + 1..]).collect();
        assert_eq!(
            suffixes,
            [
                "drivers.json?limit=1000",
                "drivers.json?limit=3&offset=2",
                "drivers.json?limit=1&offset=4",
            ]
        );
    }

    #[test]
    fn explicit_window_stops_when_filled() {
        let live = RecordingTransport::pages(&[drivers_page(5, 1..3), drivers_page(5, 3..4)]);
        let drivers = session(&live).get_drivers(&Query::new().limit(3).offset(1)).unwrap();

        assert_eq!(drivers.len(), 3);
        assert_eq!(live.calls.get(), 2);
        assert!(live.paths.borrow()[1].ends_with("drivers.json?limit=1&offset=3"));
    }

    #[test]
    fn lap_split_across_pages_is_rejoined() {
        let live = RecordingTransport::pages(&[
            laps_page(4, &[("21", 1, &["hamilton", "verstappen"])]),
            laps_page(4, &[("21", 1, &["bottas"]), ("22", 1, &["hamilton"])]),
        ]);
        let laps = session(&live).get_lap_times(&Query::new().season(2021)).unwrap();

        assert_eq!(live.calls.get(), 2);
        assert_eq!(laps.len(), 2);
        let ids: Vec<&str> = laps[0].timings.iter().map(|t| t.driver_id.as_str()).collect();
        assert_eq!(ids, ["hamilton", "verstappen", "bottas"]);
        assert_eq!(laps[1].timings.len(), 1);
    }

    #[test]
    fn laps_of_different_races_stay_apart() {
        let live = RecordingTransport::pages(&[
            laps_page(2, &[("21", 1, &["hamilton"])]),
            laps_page(2, &[("22", 1, &["hamilton"])]),
        ]);
        let laps = session(&live).get_lap_times(&Query::new().season(2021)).unwrap();
        assert_eq!(laps.len(), 2);
    }

    #[test]
    fn identical_calls_within_expiry_hit_network_once() {
        let tmp = TempDir::new().unwrap();
        let live = RecordingTransport::new(200, RACES_2020);
        let session = Session::cached(ErgastClient::new(BASE_URL), &live, &cache_config(&tmp, false)).unwrap();

        let first = session.get_races(&Query::new().season(2020)).unwrap();
        let second = session.get_races(&Query::new().season(2020)).unwrap();
        assert_eq!(first, second);
        assert_eq!(live.calls.get(), 1);
    }

    #[test]
    fn calls_after_expiry_hit_network_again() {
        let tmp = TempDir::new().unwrap();
        let live = RecordingTransport::new(200, RACES_2020);
        let mut config = cache_config(&tmp, false);
        config.expire_after_secs = Some(0);
        let session = Session::cached(ErgastClient::new(BASE_URL), &live, &config).unwrap();

        session.get_races(&Query::new().season(2020)).unwrap();
        session.get_races(&Query::new().season(2020)).unwrap();
        assert_eq!(live.calls.get(), 2);
        assert_eq!(session.cache().unwrap().expire_after(), Some(Duration::ZERO));
    }

    #[test]
    fn force_clear_makes_next_call_live() {
        let tmp = TempDir::new().unwrap();
        let live = RecordingTransport::new(200, RACES_2020);
        let query = Query::new().season(2020);

        Session::cached(ErgastClient::new(BASE_URL), &live, &cache_config(&tmp, false))
            .unwrap()
            .get_races(&query)
            .unwrap();
        assert_eq!(live.calls.get(), 1);

        let reused = Session::cached(ErgastClient::new(BASE_URL), &live, &cache_config(&tmp, false)).unwrap();
        reused.get_races(&query).unwrap();
        assert_eq!(live.calls.get(), 1);

        let cleared = Session::cached(ErgastClient::new(BASE_URL), &live, &cache_config(&tmp, true)).unwrap();
        cleared.get_races(&query).unwrap();
        assert_eq!(live.calls.get(), 2);
    }

    #[test]
    fn missing_cache_directory_fails_construction() {
        let tmp = TempDir::new().unwrap();
        let config = ClientConfig {
            cache: CacheConfig {
                directory: tmp.path().join("missing"),
                ..CacheConfig::default()
            },
            ..ClientConfig::default()
        };
        assert!(matches!(Session::new(&config), Err(ApiError::CacheDirectory(_))));
    }

    #[test]
    fn disabled_cache_has_no_store() {
        let config = ClientConfig {
            cache: CacheConfig::disabled(),
            ..ClientConfig::default()
        };
        let session = Session::new(&config).unwrap();
        assert!(session.cache().is_none());
        assert_eq!(session.client().base_url(), "https://api.jolpi.ca/ergast/f1");
    }

    #[test]
    fn upstream_errors_pass_through() {
        let live = RecordingTransport::new(500, "upstream down");
        let err = session(&live).get_seasons(&Query::new()).unwrap_err();
        assert!(matches!(err, ApiError::HttpError { status: 500, .. }));
    }
}
