use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use kcat_api::ClientEvent;
use rdkafka::client::ClientContext;
use rdkafka::config::RDKafkaLogLevel;
use rdkafka::consumer::ConsumerContext;
use rdkafka::error::KafkaError;
use rdkafka::message::Message as _;
use rdkafka::producer::{DeliveryResult, ProducerContext};
use rdkafka::types::RDKafkaErrorCode;

/// Collects librdkafka callbacks as [`ClientEvent`]s.
///
/// Callbacks fire on the thread that calls `poll`, so the queue is drained
/// right after each poll by the owning client.
#[derive(Debug, Default)]
pub struct KcatContext {
    events: Mutex<VecDeque<ClientEvent>>,
}

impl KcatContext {
    pub fn take_events(&self) -> Vec<ClientEvent> {
        self.lock().drain(..).collect()
    }

    fn push(&self, event: ClientEvent) {
        self.lock().push_back(event);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<ClientEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ClientContext for KcatContext {
    fn log(&self, level: RDKafkaLogLevel, fac: &str, log_message: &str) {
        match level {
            RDKafkaLogLevel::Emerg
            | RDKafkaLogLevel::Alert
            | RDKafkaLogLevel::Critical
            | RDKafkaLogLevel::Error => {
                tracing::error!(target: "librdkafka", facility = fac, "{log_message}")
            }
            RDKafkaLogLevel::Warning => tracing::warn!(target: "librdkafka", facility = fac, "{log_message}"),
            RDKafkaLogLevel::Notice | RDKafkaLogLevel::Info => {
                tracing::info!(target: "librdkafka", facility = fac, "{log_message}")
            }
            RDKafkaLogLevel::Debug => tracing::debug!(target: "librdkafka", facility = fac, "{log_message}"),
        }
    }

    fn error(&self, error: KafkaError, reason: &str) {
        let fatal = matches!(error.rdkafka_error_code(), Some(RDKafkaErrorCode::AllBrokersDown));
        tracing::debug!(error = %error, reason, fatal, "client error callback");
        let reason = format!("{error}: {reason}");
        self.push(if fatal {
            ClientEvent::fatal(reason)
        } else {
            ClientEvent::error(reason)
        });
    }
}

impl ProducerContext for KcatContext {
    type DeliveryOpaque = ();

    fn delivery(&self, delivery_result: &DeliveryResult<'_>, _: Self::DeliveryOpaque) {
        let event = match delivery_result {
            Ok(msg) => ClientEvent::Delivered {
                partition: msg.partition(),
                offset: msg.offset(),
            },
            Err((e, msg)) => ClientEvent::DeliveryFailed {
                reason: format!("{e} (topic {} [{}])", msg.topic(), msg.partition()),
            },
        };
        self.push(event);
    }
}

impl ConsumerContext for KcatContext {}
