//! Bookline Scheduling — the occupancy model behind calendar rendering
//! and booking, the conflict-checked appointment mutations, and the
//! period statistics aggregator.
//!
//! Both services are stateless between calls: occupancy is recomputed
//! from the store on every query, so there is no cache to invalidate.

pub mod engine;
pub mod stats;

pub use engine::{DayQuery, OccupiedSlot, RangeQuery, SchedulingEngine};
pub use stats::{StatsAggregator, StatsPeriod, StatsSummary};
