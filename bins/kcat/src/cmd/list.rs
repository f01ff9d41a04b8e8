use std::io::{self, Write};

use kcat_api::MetadataClient;
use kcat_engine::consume::METADATA_TIMEOUT;
use kcat_engine::{write_metadata_json, write_metadata_text};
use kcat_rdkafka::RdProducer;

use super::config::Effective;
use super::error::CatError;

pub fn run(eff: &Effective) -> Result<bool, CatError> {
    let client = RdProducer::new(&eff.properties)?;
    let topic = (!eff.topic.is_empty()).then_some(eff.topic.as_str());

    let metadata = client.metadata(topic, METADATA_TIMEOUT)?;

    let mut out = io::stdout().lock();
    if eff.json {
        write_metadata_json(&mut out, &metadata)?;
    } else {
        write_metadata_text(&mut out, &metadata, topic)?;
    }
    out.flush()?;
    Ok(true)
}
