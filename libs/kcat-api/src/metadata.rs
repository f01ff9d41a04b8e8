use serde::Serialize;

/// Snapshot of cluster metadata as returned by a [`MetadataClient`](crate::MetadataClient).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClusterMetadata {
    pub originating_broker: BrokerRef,
    pub brokers: Vec<BrokerInfo>,
    pub topics: Vec<TopicInfo>,
}

/// The broker that answered the metadata request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BrokerRef {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokerInfo {
    pub id: i32,
    pub host: String,
    pub port: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicInfo {
    pub name: String,
    pub partitions: Vec<PartitionInfo>,
    /// Topic-level error reported by the broker, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// The error is transient (e.g. leader not yet elected).
    #[serde(skip)]
    pub retriable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionInfo {
    pub id: i32,
    pub leader: i32,
    pub replicas: Vec<i32>,
    pub isrs: Vec<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ClusterMetadata {
    pub fn topic(&self, name: &str) -> Option<&TopicInfo> {
        self.topics.iter().find(|t| t.name == name)
    }
}

impl TopicInfo {
    pub fn new(name: impl Into<String>, partition_count: i32) -> Self {
        Self {
            name: name.into(),
            partitions: (0..partition_count).map(PartitionInfo::new).collect(),
            error: None,
            retriable: false,
        }
    }

    pub fn partition_ids(&self) -> Vec<i32> {
        self.partitions.iter().map(|p| p.id).collect()
    }
}

impl PartitionInfo {
    pub fn new(id: i32) -> Self {
        Self {
            id,
            leader: 0,
            replicas: vec![0],
            isrs: vec![0],
            error: None,
        }
    }
}
