//! Pure analysis passes over fetched match data

pub mod aggregator;
pub mod features;
pub mod first_time;
pub mod gaps;
pub mod outliers;
pub mod spells;
