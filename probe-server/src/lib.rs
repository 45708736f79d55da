pub mod config;
pub mod configurator;
pub mod descriptor;
pub mod dispatcher;
pub mod error;
pub mod routes;
pub mod telemetry;
