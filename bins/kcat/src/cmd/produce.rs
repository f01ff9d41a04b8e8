use std::fs::File;
use std::io::{self, BufRead, BufReader};

use kcat_engine::{ProduceInput, ProduceOptions, RunContext, run_producer};
use kcat_rdkafka::RdProducer;

use super::config::Effective;
use super::error::CatError;

pub fn run(eff: &Effective, ctx: &RunContext) -> Result<bool, CatError> {
    let mut producer = RdProducer::new(&eff.properties)?;

    let input: ProduceInput<Box<dyn BufRead>> = match eff.files.as_slice() {
        [path] if eff.line_file => {
            let file = File::open(path)
                .map_err(|e| CatError::Config(format!("cannot open {}: {e}", path.display())))?;
            ProduceInput::Stream(Box::new(BufReader::new(file)))
        }
        [] => ProduceInput::Stream(Box::new(io::stdin().lock())),
        files => ProduceInput::Files(files.to_vec()),
    };
    let tee = eff.framer.tee.then(|| io::stdout().lock());

    let options = ProduceOptions {
        topic: eff.topic.clone(),
        partition: eff.partition,
        framer: eff.framer,
        limit: eff.count,
    };

    tracing::debug!(topic = %options.topic, partition = ?options.partition, "producing");
    let report = run_producer(&mut producer, input, tee, &options, ctx)?;

    if report.stats.delivery_failed > 0 {
        tracing::error!(
            failed = report.stats.delivery_failed,
            sent = report.stats.sent,
            "messages failed delivery"
        );
    }
    if let Some(files) = report.files.filter(|f| f.failed > 0) {
        tracing::error!("failed to produce {}/{} files", files.failed, files.total());
    }
    Ok(report.is_success())
}
