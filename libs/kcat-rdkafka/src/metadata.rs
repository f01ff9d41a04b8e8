use std::time::Duration;

use kcat_api::{BrokerInfo, BrokerRef, ClientError, ClusterMetadata, PartitionInfo, TopicInfo};
use rdkafka::client::{Client, ClientContext};
use rdkafka::metadata::{Metadata, MetadataPartition, MetadataTopic};
use rdkafka::types::{RDKafkaErrorCode, RDKafkaRespErr};

pub(crate) fn fetch_metadata<C: ClientContext>(
    client: &Client<C>,
    topic: Option<&str>,
    timeout: Duration,
) -> Result<ClusterMetadata, ClientError> {
    let md = client
        .fetch_metadata(topic, timeout)
        .map_err(|e| ClientError::metadata(format!("failed to acquire metadata: {e}")))?;
    Ok(convert(&md))
}

fn convert(md: &Metadata) -> ClusterMetadata {
    ClusterMetadata {
        originating_broker: BrokerRef {
            id: md.orig_broker_id(),
            name: md.orig_broker_name().to_string(),
        },
        brokers: md
            .brokers()
            .iter()
            .map(|b| BrokerInfo {
                id: b.id(),
                host: b.host().to_string(),
                port: b.port(),
            })
            .collect(),
        topics: md.topics().iter().map(convert_topic).collect(),
    }
}

fn convert_topic(t: &MetadataTopic) -> TopicInfo {
    let code = t.error().map(RDKafkaErrorCode::from);
    TopicInfo {
        name: t.name().to_string(),
        partitions: t.partitions().iter().map(convert_partition).collect(),
        error: code.map(|c| c.to_string()),
        retriable: code == Some(RDKafkaErrorCode::LeaderNotAvailable),
    }
}

fn convert_partition(p: &MetadataPartition) -> PartitionInfo {
    PartitionInfo {
        id: p.id(),
        leader: p.leader(),
        replicas: p.replicas().to_vec(),
        isrs: p.isr().to_vec(),
        error: p.error().map(describe),
    }
}

fn describe(err: RDKafkaRespErr) -> String {
    RDKafkaErrorCode::from(err).to_string()
}
