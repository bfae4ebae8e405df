//! NeoFS network exporter service.
//!
//! Polls a Neo chain through [`neo_exporter`] readers and republishes the
//! state as Prometheus gauges:
//!
//! - **Config** ([`config`]): YAML file with `NEO_EXPORTER_*` overrides
//! - **Metrics** ([`metrics`]): an explicit registry, one per process
//! - **Jobs** ([`job`]): FS chain and main chain scrapes, NEP-17 tracking
//! - **Monitor** ([`monitor`]): scrape loop plus the `/metrics` server
//! - **Bootstrap** ([`bootstrap`]): wires pools, readers and jobs from config

pub mod bootstrap;
pub mod config;
pub mod job;
pub mod metrics;
pub mod monitor;
pub mod routes;

pub use config::MonitorConfig;
pub use metrics::{ChainMode, Metrics};
pub use monitor::Monitor;
