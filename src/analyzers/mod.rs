//! Dataset building and emission aggregation.
//!
//! This module turns joined missions into the date-sorted cache and derives
//! the per-region cumulative series shown on the chart, filtered by the
//! selected travel modes.

pub mod aggregate;
pub mod analyzer;
pub mod palette;
pub mod selection;
pub mod types;
pub mod utility;
