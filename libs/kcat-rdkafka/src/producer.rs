use std::time::Duration;

use kcat_api::{
    ClientError, ClientEvent, ClientProperties, ClusterMetadata, MetadataClient, ProducerClient, Record,
    SendError, SendFailure,
};
use rdkafka::error::KafkaError;
use rdkafka::producer::{BaseProducer, BaseRecord, Producer};
use rdkafka::types::RDKafkaErrorCode;

use crate::config::client_config;
use crate::context::KcatContext;
use crate::metadata::fetch_metadata;

/// Producer handle; also answers metadata queries for list mode.
pub struct RdProducer {
    producer: BaseProducer<KcatContext>,
}

impl RdProducer {
    pub fn new(props: &ClientProperties) -> Result<Self, ClientError> {
        let producer = client_config(props)
            .create_with_context(KcatContext::default())
            .map_err(|e| ClientError::config(format!("failed to create producer: {e}")))?;
        Ok(Self { producer })
    }
}

impl ProducerClient for RdProducer {
    fn send(&mut self, topic: &str, partition: Option<i32>, record: Record) -> Result<(), SendFailure> {
        // librdkafka copies key and payload, so the record only needs to
        // outlive the call
        let result = {
            let mut base = BaseRecord::<[u8], [u8]>::to(topic);
            if let Some(payload) = record.payload.as_deref() {
                base = base.payload(payload);
            }
            if let Some(key) = record.key.as_deref() {
                base = base.key(key);
            }
            if let Some(p) = partition {
                base = base.partition(p);
            }
            self.producer.send(base).map_err(|(e, _)| e)
        };

        match result {
            Ok(()) => Ok(()),
            Err(KafkaError::MessageProduction(RDKafkaErrorCode::QueueFull)) => {
                Err(SendFailure::new(SendError::QueueFull, record))
            }
            Err(e) => Err(SendFailure::new(SendError::Fatal(e.to_string()), record)),
        }
    }

    fn poll(&mut self, timeout: Duration) -> Vec<ClientEvent> {
        self.producer.poll(timeout);
        self.producer.context().take_events()
    }

    fn in_flight(&self) -> usize {
        usize::try_from(self.producer.in_flight_count()).unwrap_or(0)
    }
}

impl MetadataClient for RdProducer {
    fn metadata(&self, topic: Option<&str>, timeout: Duration) -> Result<ClusterMetadata, ClientError> {
        fetch_metadata(self.producer.client(), topic, timeout)
    }
}
