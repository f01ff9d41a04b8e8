use kcat_api::{ClientError, SendError};

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to produce message ({len} bytes): {source}")]
    Produce { len: usize, source: SendError },

    #[error("program terminated while producing message of {len} bytes")]
    Terminated { len: usize },

    #[error("failed to query metadata for topic {topic}: {source}")]
    Metadata { topic: String, source: ClientError },

    #[error("no such topic in cluster: {0}")]
    NoSuchTopic(String),

    #[error("topic {topic} error: {detail}")]
    Topic { topic: String, detail: String },

    #[error("topic {0} has no partitions")]
    NoPartitions(String),

    #[error("topic {topic} (with partitions {partitions:?}): partition {partition} does not exist")]
    PartitionNotFound {
        topic: String,
        partitions: Vec<i32>,
        partition: i32,
    },

    #[error("failed to start consuming topic {topic} [{partition}]: {source}")]
    Start {
        topic: String,
        partition: i32,
        source: ClientError,
    },

    #[error("{0}")]
    Broker(String),

    #[error("unable to read message: {0}")]
    Input(#[source] std::io::Error),

    #[error("tee write error for message of {len} bytes: {source}")]
    Tee { len: usize, source: std::io::Error },

    #[error("output error: {0}")]
    Output(#[source] std::io::Error),
}
