//! Dashboard analytics.
//!
//! Four independent computations, each a store read followed by a pure
//! reduction over the returned rows:
//! - [`counters`]: total votes, total clips, active categories
//! - [`battles`]: potential matchups per category
//! - [`popularity`]: categories ranked by votes received
//! - [`trends`]: votes per day over the trailing week
//!
//! [`AnalyticsAggregator`] runs them concurrently and assembles the snapshot.

pub mod aggregator;
pub mod battles;
pub mod counters;
pub mod popularity;
pub mod trends;

pub use aggregator::AnalyticsAggregator;
