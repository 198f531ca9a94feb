//! Runtime configuration: cache TTL, poll cadence, library scanning.
//!
//! Schema types live in `config::schema`; `Settings::load` layers
//! environment variables over an optional TOML file over defaults.

mod load;
mod schema;

pub use schema::*;

#[cfg(test)]
mod tests;
