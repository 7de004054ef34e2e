//! Synchronous client for the Ergast motorsport statistics API.
//!
//! # Overview
//! `Session` is the entry point: one `get_*` call per entity kind, each
//! returning the decoded result objects in upstream order. Responses are
//! cached on disk with time-based expiry to stay clear of the upstream
//! rate limit.
//!
//! # Design
//! - `ErgastClient` is stateless: it turns a `Query` into an `HttpRequest`
//!   and an `HttpResponse` into typed objects, without touching the network.
//! - A `Transport` performs the round-trip. `UreqTransport` goes to the
//!   network; `CachedTransport` wraps any transport with a `ResponseCache`.
//! - Every result object implements `Record` for its mapping, tuple,
//!   flattened and JSON views.
//! - No throttling and no retries. Errors surface unchanged as `ApiError`.

pub mod cache;
pub mod client;
pub mod config;
mod de;
pub mod error;
pub mod export;
pub mod http;
pub mod query;
pub mod session;
pub mod transport;
pub mod types;

pub use cache::ResponseCache;
pub use client::{ErgastClient, Paged};
pub use config::{CacheConfig, ClientConfig};
pub use error::ApiError;
pub use export::{flatten, Record};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use query::{Page, Query, Resource, Round, Year};
pub use session::Session;
pub use transport::{CachedTransport, Transport, UreqTransport};
pub use types::{
    AverageSpeed, Circuit, Constructor, ConstructorStanding, Driver, DriverStanding, FastestLap, Lap, Location,
    PitStop, QualifyingResult, Race, RaceResult, ResultTime, Season, SessionSchedule, SprintResult, Status, Timing,
};
