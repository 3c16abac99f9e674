//! Interval infrastructure

pub mod interval_analysis;

pub use interval_analysis::IntervalAnalysis;
