pub mod calendar;
pub mod engine;
pub mod stats;
