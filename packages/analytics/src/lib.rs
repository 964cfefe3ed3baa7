#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-region analytics for the urban risk index.
//!
//! Each stage is a pure function from immutable inputs to a new table
//! fragment keyed by region id:
//!
//! 1. [`aggregate`]: waste and flood counts with citywide shares, mean HDI
//! 2. [`master`]: left-joins every fragment onto the region set, filling
//!    misses with `0` (or the citywide mean HDI)
//! 3. [`score`]: min-max normalization, weighted composite score, and
//!    three-tier quantile classification
//! 4. [`narrative`]: rule-based alert text per region
//! 5. [`diagnostics`]: correlation and trend statistics over the result

pub mod aggregate;
pub mod diagnostics;
pub mod master;
pub mod narrative;
pub mod score;

pub use aggregate::CountShare;
pub use master::IndicatorFragments;
