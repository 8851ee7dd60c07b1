pub mod conf;
pub mod telemetry;
