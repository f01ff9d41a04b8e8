use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::time::Duration;

use kcat_api::{ClientEvent, ProducerClient, Record, SendFailure};

use crate::context::RunContext;
use crate::error::EngineError;
use crate::framer::{FileOutcome, Framer, FramerConfig, read_file_record};

/// Wait between attempts while the client's send queue is full.
pub const QUEUE_FULL_BACKOFF: Duration = Duration::from_millis(5);

/// Poll interval while waiting for outstanding deliveries.
pub const FLUSH_POLL: Duration = Duration::from_millis(50);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProduceStats {
    /// Records accepted by the client.
    pub sent: u64,
    /// Send attempts rejected with a full queue.
    pub queue_full: u64,
    pub delivered: u64,
    pub delivery_failed: u64,
}

// ═══════════════════════════════════════════════════════════════
//  Send loop
// ═══════════════════════════════════════════════════════════════

/// Submits records one at a time, retrying on backpressure.
pub struct SendLoop<'a, P> {
    client: &'a mut P,
    topic: String,
    partition: Option<i32>,
    ctx: RunContext,
    stats: ProduceStats,
}

impl<'a, P: ProducerClient> SendLoop<'a, P> {
    pub fn new(client: &'a mut P, topic: impl Into<String>, partition: Option<i32>, ctx: RunContext) -> Self {
        Self {
            client,
            topic: topic.into(),
            partition,
            ctx,
            stats: ProduceStats::default(),
        }
    }

    /// Submit `record`, retrying for as long as the client reports a full
    /// queue. Any other rejection is fatal, as is a shutdown request
    /// observed before the record was accepted.
    pub fn send(&mut self, record: Record) -> Result<(), EngineError> {
        let len = record.payload_len();
        let mut record = record;

        loop {
            if !self.ctx.is_running() {
                return Err(EngineError::Terminated { len });
            }

            match self.client.send(&self.topic, self.partition, record) {
                Ok(()) => {
                    self.stats.sent += 1;
                    break;
                }
                Err(SendFailure { error, record: returned }) if error.is_backpressure() => {
                    self.stats.queue_full += 1;
                    record = returned;
                    let events = self.client.poll(QUEUE_FULL_BACKOFF);
                    self.handle_events(events)?;
                }
                Err(SendFailure { error, .. }) => {
                    return Err(EngineError::Produce { len, source: error });
                }
            }
        }

        self.drain()
    }

    /// Collect completions without waiting.
    pub fn drain(&mut self) -> Result<(), EngineError> {
        let events = self.client.poll(Duration::ZERO);
        self.handle_events(events)
    }

    /// Wait until every accepted record has a delivery report, or until
    /// the run is aborted.
    pub fn flush(&mut self) -> Result<(), EngineError> {
        while !self.ctx.is_aborted() && self.client.in_flight() > 0 {
            let events = self.client.poll(FLUSH_POLL);
            self.handle_events(events)?;
        }

        let remaining = self.client.in_flight();
        if remaining > 0 {
            tracing::warn!(remaining, "aborted with messages still in flight");
        }
        Ok(())
    }

    pub fn stats(&self) -> ProduceStats {
        self.stats
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    fn handle_events(&mut self, events: Vec<ClientEvent>) -> Result<(), EngineError> {
        for event in events {
            match event {
                ClientEvent::Delivered { partition, offset } => {
                    self.stats.delivered += 1;
                    tracing::trace!(partition, offset, "message delivered");
                }
                ClientEvent::DeliveryFailed { reason } => {
                    self.stats.delivery_failed += 1;
                    tracing::info!(error = %reason, "delivery failed for message");
                }
                ClientEvent::Error { fatal: true, reason } => {
                    return Err(EngineError::Broker(reason));
                }
                ClientEvent::Error { fatal: false, reason } => {
                    tracing::warn!(error = %reason, "client error");
                }
                ClientEvent::Message(_) | ClientEvent::PartitionEof { .. } => {}
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════
//  Produce mode
// ═══════════════════════════════════════════════════════════════

/// Where produce mode reads its records from.
pub enum ProduceInput<R> {
    /// Delimited records from a stream (stdin or a single file).
    Stream(R),
    /// One record per file.
    Files(Vec<PathBuf>),
}

#[derive(Debug, Clone)]
pub struct ProduceOptions {
    pub topic: String,
    pub partition: Option<i32>,
    pub framer: FramerConfig,
    /// Stop after this many records were accepted.
    pub limit: Option<u64>,
}

/// Per-file outcomes of whole-file mode.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FilesReport {
    pub produced: usize,
    /// Empty files: nothing sent, not an error.
    pub skipped: usize,
    pub failed: usize,
}

impl FilesReport {
    pub fn total(&self) -> usize {
        self.produced + self.skipped + self.failed
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProduceReport {
    pub stats: ProduceStats,
    pub files: Option<FilesReport>,
}

impl ProduceReport {
    /// No delivery failed and every file was read.
    pub fn is_success(&self) -> bool {
        self.stats.delivery_failed == 0 && self.files.is_none_or(|f| f.failed == 0)
    }
}

/// Run produce mode to completion: send every input record, then wait for
/// outstanding deliveries.
pub fn run_producer<P, R, T>(
    client: &mut P,
    input: ProduceInput<R>,
    tee: Option<T>,
    options: &ProduceOptions,
    ctx: &RunContext,
) -> Result<ProduceReport, EngineError>
where
    P: ProducerClient,
    R: BufRead,
    T: Write,
{
    let mut sender = SendLoop::new(client, options.topic.clone(), options.partition, ctx.clone());

    let files = match input {
        ProduceInput::Stream(reader) => {
            let framer = Framer::new(reader, options.framer);
            produce_stream(framer, &mut sender, tee, options.limit)?;
            None
        }
        ProduceInput::Files(paths) => Some(produce_files(&paths, &mut sender)?),
    };

    sender.flush()?;

    let stats = sender.stats();
    tracing::debug!(
        sent = stats.sent,
        delivered = stats.delivered,
        failed = stats.delivery_failed,
        queue_full = stats.queue_full,
        "producer finished"
    );
    Ok(ProduceReport { stats, files })
}

fn produce_stream<P, R, T>(
    mut framer: Framer<R>,
    sender: &mut SendLoop<'_, P>,
    mut tee: Option<T>,
    limit: Option<u64>,
) -> Result<(), EngineError>
where
    P: ProducerClient,
    R: BufRead,
    T: Write,
{
    if limit == Some(0) {
        return Ok(());
    }

    while sender.context().is_running() {
        let Some(record) = framer.next_record().map_err(EngineError::Input)? else {
            break;
        };

        sender.send(record)?;

        if let Some(out) = tee.as_mut() {
            if let Some(frame) = framer.last_frame() {
                out.write_all(frame)
                    .map_err(|source| EngineError::Tee { len: frame.len(), source })?;
            }
        }

        if limit.is_some_and(|n| sender.stats().sent >= n) {
            break;
        }
    }

    if let Some(out) = tee.as_mut() {
        out.flush().map_err(|source| EngineError::Tee { len: 0, source })?;
    }
    Ok(())
}

fn produce_files<P: ProducerClient>(
    paths: &[PathBuf],
    sender: &mut SendLoop<'_, P>,
) -> Result<FilesReport, EngineError> {
    let mut report = FilesReport::default();

    for path in paths {
        match read_file_record(path) {
            Ok(FileOutcome::Record(record)) => {
                tracing::debug!(path = %path.display(), bytes = record.payload_len(), "producing file");
                sender.send(record)?;
                report.produced += 1;
            }
            Ok(FileOutcome::Empty) => {
                tracing::debug!(path = %path.display(), "skipping empty file");
                report.skipped += 1;
            }
            Err(e) => {
                tracing::info!(path = %path.display(), error = %e, "failed to read file");
                report.failed += 1;
            }
        }
    }

    if report.failed > 0 {
        tracing::info!(
            failed = report.failed,
            total = report.total(),
            "failed to produce from some files"
        );
    }
    Ok(report)
}
