// Domain layer: event model and the ports implemented by triggers and backends.

pub mod model;
pub mod ports;
