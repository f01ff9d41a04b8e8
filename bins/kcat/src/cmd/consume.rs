use std::io::{self, BufWriter};

use kcat_engine::{ConsumeOptions, RenderOptions, Renderer, RunContext, run_consumer};
use kcat_rdkafka::RdConsumer;

use super::config::Effective;
use super::error::CatError;

pub fn run(eff: &Effective, ctx: &RunContext) -> Result<bool, CatError> {
    let mut consumer = RdConsumer::new(&eff.properties)?;

    let options = ConsumeOptions {
        partition: eff.partition,
        offset: eff.offset,
        exit_eof: eff.exit_eof,
        limit: eff.count,
        ..ConsumeOptions::new(eff.topic.clone())
    };
    let render = RenderOptions {
        null_placeholder: eff.null_str.as_ref().map(|s| s.clone().into_bytes()),
        unbuffered: eff.unbuffered,
        json: eff.json,
    };
    let mut renderer = Renderer::new(eff.format.clone(), BufWriter::new(io::stdout().lock()), render);

    tracing::debug!(topic = %options.topic, partition = ?options.partition, offset = %options.offset, "consuming");
    let report = run_consumer(&mut consumer, &mut renderer, options, ctx)?;
    tracing::debug!(received = report.received, "consumer stopped");
    Ok(true)
}
