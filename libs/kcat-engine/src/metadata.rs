use std::io::{self, Write};

use kcat_api::ClusterMetadata;

/// Print cluster metadata in the classic kafkacat layout.
///
/// `topic` names the queried topic; `None` prints "all topics".
pub fn write_metadata_text<W: Write>(out: &mut W, md: &ClusterMetadata, topic: Option<&str>) -> io::Result<()> {
    writeln!(
        out,
        "Metadata for {} (from broker {}: {}):",
        topic.unwrap_or("all topics"),
        md.originating_broker.id,
        md.originating_broker.name
    )?;

    writeln!(out, " {} brokers:", md.brokers.len())?;
    for broker in &md.brokers {
        writeln!(out, "  broker {} at {}:{}", broker.id, broker.host, broker.port)?;
    }

    writeln!(out, " {} topics:", md.topics.len())?;
    for t in &md.topics {
        write!(out, "  topic \"{}\" with {} partitions:", t.name, t.partitions.len())?;
        if let Some(err) = &t.error {
            write!(out, " {err}")?;
            if t.retriable {
                write!(out, " (try again)")?;
            }
        }
        writeln!(out)?;

        for p in &t.partitions {
            write!(
                out,
                "    partition {}, leader {}, replicas: {}, isrs: {}",
                p.id,
                p.leader,
                join(&p.replicas),
                join(&p.isrs)
            )?;
            match &p.error {
                Some(err) => writeln!(out, ", {err}")?,
                None => writeln!(out)?,
            }
        }
    }
    Ok(())
}

/// Print cluster metadata as a single JSON document followed by a newline.
pub fn write_metadata_json<W: Write>(out: &mut W, md: &ClusterMetadata) -> io::Result<()> {
    serde_json::to_writer(&mut *out, md)?;
    writeln!(out)
}

fn join(ids: &[i32]) -> String {
    ids.iter().map(i32::to_string).collect::<Vec<_>>().join(",")
}
