//! Stats module - numeric summaries for the charts

mod calculator;

pub use calculator::StatsCalculator;
