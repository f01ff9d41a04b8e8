//! Broker client backed by librdkafka.

mod config;
mod consumer;
mod context;
mod dump;
mod metadata;
mod producer;

pub use config::{client_config, log_level_for};
pub use consumer::RdConsumer;
pub use context::KcatContext;
pub use dump::dump_config;
pub use producer::RdProducer;
