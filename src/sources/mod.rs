//! Bundled suggestion sources
//!
//! A country table with simulated latency for demos and tests, and a JSON
//! endpoint source for wiring the widget to a real backend.

mod countries;
mod http;

pub use countries::{Country, CountrySearch, COUNTRIES, MAX_MATCHES};
pub use http::HttpSource;
