pub mod client;
pub mod error;
pub mod event;
pub mod metadata;
pub mod offset;
pub mod properties;
pub mod record;

pub use client::{ConsumerClient, MetadataClient, ProducerClient};
pub use error::{ClientError, ErrorKind, SendError, SendFailure};
pub use event::ClientEvent;
pub use metadata::{BrokerInfo, BrokerRef, ClusterMetadata, PartitionInfo, TopicInfo};
pub use offset::StartOffset;
pub use properties::ClientProperties;
pub use record::{Message, Ownership, Record};
