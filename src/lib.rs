pub mod app;
pub mod braille;
pub mod clock;
pub mod config;
pub mod data;
pub mod emergency;
pub mod error;
pub mod evaluate;
pub mod forecast;
pub mod geo;
pub mod incident;
pub mod locate;
pub mod map;
pub mod records;
pub mod severity;
pub mod telemetry;
pub mod ui;
