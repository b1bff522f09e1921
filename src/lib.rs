//! A small Rust client for the WOUDC (World Ozone and Ultraviolet Radiation
//! Data Centre) data service.
//!
//! This crate implements a `pywoudc`-style flow: build a filtered query
//! against a named feature collection of the WOUDC OGC API - Features
//! endpoint, fetch it, and hand back the parsed GeoJSON unmodified.
//!
//! ## Quick start
//! - Optionally configure the endpoint via environment variables
//!   (`WOUDC_API_URL`, `WOUDC_API_TIMEOUT`) or a `.woudcrc` file (supported
//!   in the current directory and in your home directory); the public
//!   endpoint is used by default.
//! - Call the metadata accessors, or [`Client::get_data`] with a
//!   [`DataQuery`].
//!
//! ```no_run
//! use anyhow::Result;
//! use woudc::{BoundingBox, Client, DataQuery};
//!
//! fn main() -> Result<()> {
//!     let client = Client::from_env()?;
//!
//!     for station in &client.stations()?.features {
//!         println!("{:?}", station.id);
//!     }
//!
//!     let query = DataQuery::new()
//!         .with_bbox(BoundingBox::new(-142.0, 42.0, -52.0, 84.0))
//!         .with_property("platform_id", "077");
//!     let ozone = client.get_data("totalozone", &query)?;
//!     println!("{} observations", ozone.features.len());
//!     Ok(())
//! }
//! ```
//!
//! For full usage and configuration details, see the crate README.

#![forbid(unsafe_code)]

mod client;
mod config;
mod error;
mod query;
mod util;

pub use client::{ABOUT_URL, Client, ClientConfig};
pub use query::{Bound, BoundingBox, DataQuery, Instant, SortOrder, TimeInterval};
