use std::time::Duration;

use kcat_api::{
    ClientError, ClientEvent, ClientProperties, ClusterMetadata, ConsumerClient, Message, MetadataClient,
    StartOffset,
};
use rdkafka::Offset;
use rdkafka::TopicPartitionList;
use rdkafka::consumer::{BaseConsumer, Consumer};
use rdkafka::error::{KafkaError, KafkaResult, RDKafkaErrorCode};
use rdkafka::message::{BorrowedMessage, Message as _};

use crate::config::client_config;
use crate::context::KcatContext;
use crate::metadata::fetch_metadata;

/// Group used for offset storage when none is configured.
pub const DEFAULT_GROUP_ID: &str = "kcat";

/// Consumer with manual partition assignment and explicit offset storage.
pub struct RdConsumer {
    consumer: BaseConsumer<KcatContext>,
    assignment: TopicPartitionList,
}

impl RdConsumer {
    pub fn new(props: &ClientProperties) -> Result<Self, ClientError> {
        let mut props = props.clone();
        props
            .set_default("group.id", DEFAULT_GROUP_ID)
            .set_default("enable.partition.eof", "true")
            .set_default("enable.auto.offset.store", "false");

        let consumer = client_config(&props)
            .create_with_context(KcatContext::default())
            .map_err(|e| ClientError::config(format!("failed to create consumer: {e}")))?;
        Ok(Self {
            consumer,
            assignment: TopicPartitionList::new(),
        })
    }

    fn convert(&self, result: KafkaResult<BorrowedMessage<'_>>) -> ClientEvent {
        match result {
            Ok(msg) => {
                let mut out = Message::new(msg.topic(), msg.partition(), msg.offset());
                out.key = msg.key().map(<[u8]>::to_vec);
                out.payload = msg.payload().map(<[u8]>::to_vec);
                ClientEvent::Message(out)
            }
            Err(KafkaError::PartitionEOF(partition)) => {
                let topic = self.assigned_topic(partition).unwrap_or_default();
                ClientEvent::PartitionEof {
                    offset: self.position(&topic, partition),
                    topic,
                    partition,
                }
            }
            Err(e) => ClientEvent::fatal(format!("Consumer error: {e}")),
        }
    }

    fn assigned_topic(&self, partition: i32) -> Option<String> {
        self.assignment
            .elements()
            .iter()
            .find(|e| e.partition() == partition)
            .map(|e| e.topic().to_string())
    }

    fn position(&self, topic: &str, partition: i32) -> i64 {
        self.consumer
            .position()
            .ok()
            .and_then(|tpl| tpl.find_partition(topic, partition).and_then(|e| e.offset().to_raw()))
            .map_or(0, |o| o.max(0))
    }
}

/// Offset to hand to librdkafka for a processed message at `offset`.
///
/// librdkafka commits stored offsets as-is and resumes from them, so the
/// next message to fetch is stored.
fn committed_offset(offset: i64) -> i64 {
    offset + 1
}

/// An invalid-argument refusal means offset storage is off by
/// configuration (`enable.auto.offset.store=true`), not a passing failure.
fn store_error(topic: &str, partition: i32, e: KafkaError) -> ClientError {
    let message = e.to_string();
    let err = match e {
        KafkaError::StoreOffset(RDKafkaErrorCode::InvalidArgument) => ClientError::config(message),
        _ => ClientError::consume(message),
    };
    err.with_context(format_args!("offset store {topic} [{partition}]"))
}

fn rd_offset(offset: StartOffset) -> Offset {
    match offset {
        StartOffset::Beginning => Offset::Beginning,
        StartOffset::End => Offset::End,
        StartOffset::Stored => Offset::Stored,
        StartOffset::Absolute(n) => Offset::Offset(n),
        StartOffset::Tail(n) => Offset::OffsetTail(n),
    }
}

impl ConsumerClient for RdConsumer {
    fn start(&mut self, topic: &str, partition: i32, offset: StartOffset) -> Result<(), ClientError> {
        self.assignment
            .add_partition_offset(topic, partition, rd_offset(offset))
            .map_err(|e| ClientError::consume(e.to_string()))?;
        self.consumer
            .assign(&self.assignment)
            .map_err(|e| ClientError::consume(e.to_string()))
    }

    fn stop(&mut self, topic: &str, partition: i32) -> Result<(), ClientError> {
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition(topic, partition);
        self.consumer
            .pause(&tpl)
            .map_err(|e| ClientError::consume(e.to_string()))
    }

    fn store_offset(&mut self, topic: &str, partition: i32, offset: i64) -> Result<(), ClientError> {
        self.consumer
            .store_offset(topic, partition, committed_offset(offset))
            .map_err(|e| store_error(topic, partition, e))
    }

    fn poll(&mut self, timeout: Duration, max_events: usize) -> Vec<ClientEvent> {
        let mut events = Vec::new();
        let mut wait = timeout;

        while events.len() < max_events {
            let Some(result) = self.consumer.poll(wait) else {
                break;
            };
            events.push(self.convert(result));
            wait = Duration::ZERO;
        }

        events.extend(self.consumer.context().take_events());
        events
    }
}

impl MetadataClient for RdConsumer {
    fn metadata(&self, topic: Option<&str>, timeout: Duration) -> Result<ClusterMetadata, ClientError> {
        fetch_metadata(self.consumer.client(), topic, timeout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kcat_api::ErrorKind;

    #[test]
    fn start_offsets_map_to_librdkafka() {
        assert_eq!(rd_offset(StartOffset::Beginning), Offset::Beginning);
        assert_eq!(rd_offset(StartOffset::End), Offset::End);
        assert_eq!(rd_offset(StartOffset::Stored), Offset::Stored);
        assert_eq!(rd_offset(StartOffset::Absolute(42)), Offset::Offset(42));
        assert_eq!(rd_offset(StartOffset::Tail(10)), Offset::OffsetTail(10));
    }

    #[test]
    fn stored_offset_points_past_the_processed_message() {
        // consumed 0..=4, the next run must fetch 5
        assert_eq!(committed_offset(4), 5);
        // EOF marker at 5 stores 4, resuming at the marker
        assert_eq!(committed_offset(5 - 1), 5);
    }

    #[test]
    fn disabled_offset_store_is_a_config_error() {
        let err = store_error("t", 0, KafkaError::StoreOffset(RDKafkaErrorCode::InvalidArgument));
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.message().starts_with("offset store t [0]: "));

        let err = store_error("t", 3, KafkaError::StoreOffset(RDKafkaErrorCode::UnknownPartition));
        assert_eq!(err.kind(), ErrorKind::Consume);
    }
}
