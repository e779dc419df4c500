// Library for the binary and integration tests

pub mod aggregator;
pub mod collectors;
pub mod config;
pub mod error;
pub mod models;
pub mod poller;
pub mod probe;
pub mod routes;
pub mod units;
pub mod version;
pub mod worker;
