//! In-process broker for tests, built with the `testing` feature.
//!
//! Implements all three client traits over plain partition logs. Failure
//! modes (full queue, failed deliveries, fatal sends, injected client
//! errors, a disabled offset store) are switched on explicitly.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::time::Duration;

use kcat_api::{
    BrokerInfo, BrokerRef, ClientError, ClientEvent, ClusterMetadata, ConsumerClient, Message,
    MetadataClient, Ownership, ProducerClient, Record, SendError, SendFailure, StartOffset, TopicInfo,
};

/// A record as the broker accepted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRecord {
    pub topic: String,
    pub partition: i32,
    pub len: usize,
    pub ownership: Ownership,
}

#[derive(Debug)]
struct Assignment {
    topic: String,
    partition: i32,
    position: i64,
    eof_reported: bool,
}

#[derive(Debug)]
pub struct MemoryBroker {
    topics: BTreeMap<String, Vec<Vec<Message>>>,
    topic_errors: BTreeMap<String, String>,

    // produce side
    pending: VecDeque<(String, i32, Record)>,
    queue_capacity: usize,
    queue_full_rejections: usize,
    fail_deliveries: bool,
    next_send_error: Option<String>,
    round_robin: usize,
    sent: Vec<SentRecord>,

    // consume side
    assignments: Vec<Assignment>,
    paused: BTreeSet<(String, i32)>,
    stored: BTreeMap<(String, i32), i64>,
    store_disabled: bool,
    store_attempts: usize,
    cursor: usize,

    injected: VecDeque<ClientEvent>,
}

impl Default for MemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBroker {
    pub fn new() -> Self {
        Self {
            topics: BTreeMap::new(),
            topic_errors: BTreeMap::new(),
            pending: VecDeque::new(),
            queue_capacity: usize::MAX,
            queue_full_rejections: 0,
            fail_deliveries: false,
            next_send_error: None,
            round_robin: 0,
            sent: Vec::new(),
            assignments: Vec::new(),
            paused: BTreeSet::new(),
            stored: BTreeMap::new(),
            store_disabled: false,
            store_attempts: 0,
            cursor: 0,
            injected: VecDeque::new(),
        }
    }

    pub fn with_topic(mut self, name: &str, partitions: usize) -> Self {
        self.topics.insert(name.to_string(), vec![Vec::new(); partitions]);
        self
    }

    /// Report `error` for `topic` in metadata responses.
    pub fn with_topic_error(mut self, topic: &str, error: &str) -> Self {
        self.topic_errors.insert(topic.to_string(), error.to_string());
        self
    }

    /// Maximum number of undelivered records. `0` rejects every send.
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Reject the next `n` send attempts with a full queue.
    pub fn with_queue_full_rejections(mut self, n: usize) -> Self {
        self.queue_full_rejections = n;
        self
    }

    /// Every delivery reports failure.
    pub fn with_failed_deliveries(mut self, fail: bool) -> Self {
        self.fail_deliveries = fail;
        self
    }

    /// Refuse every offset store as a configuration error.
    pub fn with_offset_store_disabled(mut self) -> Self {
        self.store_disabled = true;
        self
    }

    /// Reject the next send with a non-retriable error.
    pub fn fail_next_send(&mut self, reason: &str) {
        self.next_send_error = Some(reason.to_string());
    }

    /// Queue an event for the next poll of either side.
    pub fn inject(&mut self, event: ClientEvent) {
        self.injected.push_back(event);
    }

    /// Append a message directly to a partition log.
    pub fn append(&mut self, topic: &str, partition: i32, key: Option<&[u8]>, payload: Option<&[u8]>) {
        let Some(log) = self.log_mut(topic, partition) else {
            return;
        };
        let mut msg = Message::new(topic, partition, log.len() as i64);
        msg.key = key.map(<[u8]>::to_vec);
        msg.payload = payload.map(<[u8]>::to_vec);
        log.push(msg);
    }

    pub fn messages(&self, topic: &str, partition: i32) -> &[Message] {
        self.log(topic, partition).map_or(&[], Vec::as_slice)
    }

    pub fn partition_payloads(&self, topic: &str, partition: i32) -> Vec<Vec<u8>> {
        self.messages(topic, partition)
            .iter()
            .map(|m| m.payload.clone().unwrap_or_default())
            .collect()
    }

    pub fn sent(&self) -> &[SentRecord] {
        &self.sent
    }

    pub fn stored_offset(&self, topic: &str, partition: i32) -> Option<i64> {
        self.stored.get(&(topic.to_string(), partition)).copied()
    }

    /// Calls to `store_offset`, refused ones included.
    pub fn store_attempts(&self) -> usize {
        self.store_attempts
    }

    pub fn is_paused(&self, topic: &str, partition: i32) -> bool {
        self.paused.contains(&(topic.to_string(), partition))
    }

    pub fn assigned(&self) -> Vec<(String, i32)> {
        self.assignments
            .iter()
            .map(|a| (a.topic.clone(), a.partition))
            .collect()
    }

    fn log(&self, topic: &str, partition: i32) -> Option<&Vec<Message>> {
        let index = usize::try_from(partition).ok()?;
        self.topics.get(topic)?.get(index)
    }

    fn log_mut(&mut self, topic: &str, partition: i32) -> Option<&mut Vec<Message>> {
        let index = usize::try_from(partition).ok()?;
        self.topics.get_mut(topic)?.get_mut(index)
    }

    fn deliver_pending(&mut self, events: &mut Vec<ClientEvent>) {
        while let Some((topic, partition, record)) = self.pending.pop_front() {
            if self.fail_deliveries {
                events.push(ClientEvent::DeliveryFailed {
                    reason: "Broker: Message delivery failed".to_string(),
                });
                continue;
            }
            let Some(log) = self.log_mut(&topic, partition) else {
                events.push(ClientEvent::DeliveryFailed {
                    reason: format!("Local: Unknown partition {topic} [{partition}]"),
                });
                continue;
            };
            let offset = log.len() as i64;
            log.push(Message {
                topic,
                partition,
                offset,
                key: record.key,
                payload: record.payload,
            });
            events.push(ClientEvent::Delivered { partition, offset });
        }
    }

    fn next_consume_event(&mut self) -> Option<ClientEvent> {
        let count = self.assignments.len();
        for step in 0..count {
            let index = (self.cursor + step) % count;
            let a = &self.assignments[index];
            if self.paused.contains(&(a.topic.clone(), a.partition)) {
                continue;
            }

            let len = self.log(&a.topic, a.partition).map_or(0, Vec::len) as i64;
            let a = &mut self.assignments[index];
            if a.position < len {
                let position = a.position;
                a.position += 1;
                a.eof_reported = false;
                self.cursor = (index + 1) % count;
                let (topic, partition) = (a.topic.clone(), a.partition);
                return self
                    .log(&topic, partition)
                    .and_then(|log| usize::try_from(position).ok().and_then(|i| log.get(i)))
                    .cloned()
                    .map(ClientEvent::Message);
            }
            if !a.eof_reported {
                a.eof_reported = true;
                self.cursor = (index + 1) % count;
                return Some(ClientEvent::PartitionEof {
                    topic: a.topic.clone(),
                    partition: a.partition,
                    offset: a.position,
                });
            }
        }
        None
    }
}

impl ProducerClient for MemoryBroker {
    fn send(&mut self, topic: &str, partition: Option<i32>, record: Record) -> Result<(), SendFailure> {
        if let Some(reason) = self.next_send_error.take() {
            return Err(SendFailure::new(SendError::Fatal(reason), record));
        }
        if self.queue_full_rejections > 0 {
            self.queue_full_rejections -= 1;
            return Err(SendFailure::new(SendError::QueueFull, record));
        }
        if self.pending.len() >= self.queue_capacity {
            return Err(SendFailure::new(SendError::QueueFull, record));
        }

        let Some(partitions) = self.topics.get(topic).map(Vec::len) else {
            return Err(SendFailure::new(
                SendError::Fatal(format!("Local: Unknown topic {topic}")),
                record,
            ));
        };
        let partition = match partition {
            Some(p) if usize::try_from(p).is_ok_and(|i| i < partitions) => p,
            Some(p) => {
                return Err(SendFailure::new(
                    SendError::Fatal(format!("Local: Unknown partition {topic} [{p}]")),
                    record,
                ));
            }
            None => {
                let p = self.round_robin % partitions.max(1);
                self.round_robin += 1;
                p as i32
            }
        };

        self.sent.push(SentRecord {
            topic: topic.to_string(),
            partition,
            len: record.payload_len(),
            ownership: record.ownership,
        });
        self.pending.push_back((topic.to_string(), partition, record));
        Ok(())
    }

    fn poll(&mut self, _timeout: Duration) -> Vec<ClientEvent> {
        let mut events: Vec<ClientEvent> = self.injected.drain(..).collect();
        self.deliver_pending(&mut events);
        events
    }

    fn in_flight(&self) -> usize {
        self.pending.len()
    }
}

impl ConsumerClient for MemoryBroker {
    fn start(&mut self, topic: &str, partition: i32, offset: StartOffset) -> Result<(), ClientError> {
        let Some(len) = self.log(topic, partition).map(Vec::len) else {
            return Err(ClientError::consume(format!(
                "Local: Unknown partition {topic} [{partition}]"
            )));
        };
        let len = len as i64;

        let position = match offset {
            StartOffset::Beginning => 0,
            StartOffset::End => len,
            // stored offsets name the last processed message
            StartOffset::Stored => self
                .stored_offset(topic, partition)
                .map_or(0, |o| (o + 1).min(len)),
            StartOffset::Absolute(o) => o.clamp(0, len),
            StartOffset::Tail(n) => (len - n).max(0),
        };

        self.paused.remove(&(topic.to_string(), partition));
        self.assignments.retain(|a| !(a.topic == topic && a.partition == partition));
        self.assignments.push(Assignment {
            topic: topic.to_string(),
            partition,
            position,
            eof_reported: false,
        });
        Ok(())
    }

    fn stop(&mut self, topic: &str, partition: i32) -> Result<(), ClientError> {
        self.paused.insert((topic.to_string(), partition));
        Ok(())
    }

    fn store_offset(&mut self, topic: &str, partition: i32, offset: i64) -> Result<(), ClientError> {
        self.store_attempts += 1;
        if self.store_disabled {
            return Err(ClientError::config("Local: Invalid argument or configuration"));
        }
        self.stored.insert((topic.to_string(), partition), offset);
        Ok(())
    }

    fn poll(&mut self, _timeout: Duration, max_events: usize) -> Vec<ClientEvent> {
        let mut events = Vec::new();
        while events.len() < max_events {
            if let Some(event) = self.injected.pop_front() {
                events.push(event);
                continue;
            }
            match self.next_consume_event() {
                Some(event) => events.push(event),
                None => break,
            }
        }
        events
    }
}

impl MetadataClient for MemoryBroker {
    fn metadata(&self, topic: Option<&str>, _timeout: Duration) -> Result<ClusterMetadata, ClientError> {
        let describe = |name: &str, partitions: &Vec<Vec<Message>>| {
            let mut info = TopicInfo::new(name, partitions.len() as i32);
            info.error = self.topic_errors.get(name).cloned();
            info
        };

        let topics = match topic {
            Some(name) => match self.topics.get(name) {
                Some(partitions) => vec![describe(name, partitions)],
                None => Vec::new(),
            },
            None => self
                .topics
                .iter()
                .map(|(name, partitions)| describe(name, partitions))
                .collect(),
        };

        Ok(ClusterMetadata {
            originating_broker: BrokerRef {
                id: 0,
                name: "memory:9092/0".to_string(),
            },
            brokers: vec![BrokerInfo {
                id: 0,
                host: "memory".to_string(),
                port: 9092,
            }],
            topics,
        })
    }
}
