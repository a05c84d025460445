pub mod chart;
pub mod compare;
pub mod stats;
pub mod trend;
