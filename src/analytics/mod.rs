//! Derived views over the store that feed the dashboard charts.
//! Each function takes plain slices so the caller decides how long the read lock lives.

pub mod categories;
pub mod forecast;
pub mod geo;
