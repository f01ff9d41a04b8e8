use std::time::Duration;

use crate::error::{ClientError, SendFailure};
use crate::event::ClientEvent;
use crate::metadata::ClusterMetadata;
use crate::offset::StartOffset;
use crate::record::Record;

/// Produce side of the broker client.
///
/// All methods are called from a single control loop; implementations may
/// run background I/O of their own but must keep `poll` bounded by `timeout`.
pub trait ProducerClient {
    /// Submit one record. `partition = None` lets the client pick one.
    ///
    /// Returns immediately. On rejection the record is handed back inside
    /// the [`SendFailure`].
    fn send(&mut self, topic: &str, partition: Option<i32>, record: Record) -> Result<(), SendFailure>;

    /// Wait at most `timeout` and return the completion events gathered.
    fn poll(&mut self, timeout: Duration) -> Vec<ClientEvent>;

    /// Number of accepted records still awaiting a delivery report.
    fn in_flight(&self) -> usize;
}

/// Consume side of the broker client.
pub trait ConsumerClient {
    /// Begin consuming `partition` of `topic` from `offset`.
    fn start(&mut self, topic: &str, partition: i32, offset: StartOffset) -> Result<(), ClientError>;

    /// Stop consuming `partition`; takes effect for subsequent polls.
    fn stop(&mut self, topic: &str, partition: i32) -> Result<(), ClientError>;

    /// Record `offset` as the last processed message of `partition`.
    ///
    /// A later start from [`StartOffset::Stored`] resumes at `offset + 1`.
    /// A refusal of kind [`ErrorKind::Config`](crate::ErrorKind::Config)
    /// means storage is off for the whole client.
    fn store_offset(&mut self, topic: &str, partition: i32, offset: i64) -> Result<(), ClientError>;

    /// Wait at most `timeout` for the first event, then gather whatever is
    /// immediately available, up to `max_events`.
    fn poll(&mut self, timeout: Duration, max_events: usize) -> Vec<ClientEvent>;
}

/// Cluster metadata query.
pub trait MetadataClient {
    /// Query one topic, or all topics when `topic` is `None`.
    fn metadata(&self, topic: Option<&str>, timeout: Duration) -> Result<ClusterMetadata, ClientError>;
}
