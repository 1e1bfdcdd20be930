/// Built-in downtown Dallas tables, used when a configured file is missing
pub const TOWERS_CSV: &str = include_str!("../../data/towers.csv");
pub const INCIDENTS_CSV: &str = include_str!("../../data/incidents.csv");
pub const FORECAST_CSV: &str = include_str!("../../data/forecast.csv");
