use std::io::{self, Write};
use std::time::Duration;

use kcat_api::{ClientEvent, ConsumerClient, ErrorKind, Message, MetadataClient, StartOffset};

use crate::context::RunContext;
use crate::eof::{EofOutcome, PartitionEofTracker};
use crate::error::EngineError;
use crate::format::Renderer;

pub const METADATA_TIMEOUT: Duration = Duration::from_secs(5);
pub const POLL_TIMEOUT: Duration = Duration::from_millis(100);
pub const MAX_POLL_EVENTS: usize = 1000;

#[derive(Debug, Clone)]
pub struct ConsumeOptions {
    pub topic: String,
    /// Consume only this partition; `None` consumes all of them.
    pub partition: Option<i32>,
    pub offset: StartOffset,
    /// Stop once every wanted partition has reported end of stream.
    pub exit_eof: bool,
    /// Stop after this many messages.
    pub limit: Option<u64>,
    pub poll_timeout: Duration,
    pub max_events: usize,
}

impl ConsumeOptions {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            partition: None,
            offset: StartOffset::default(),
            exit_eof: false,
            limit: None,
            poll_timeout: POLL_TIMEOUT,
            max_events: MAX_POLL_EVENTS,
        }
    }
}

/// Why and where the receive loop stopped.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConsumeReport {
    pub received: u64,
    /// Partitions stopped after their end-of-stream marker.
    pub eof_partitions: usize,
    pub reached_eof: bool,
    pub reached_limit: bool,
    /// The output sink went away (broken pipe).
    pub output_closed: bool,
}

/// Look up `topic` and return its partition ids, checking that `partition`
/// (if given) is one of them.
pub fn resolve_partitions<M: MetadataClient + ?Sized>(
    client: &M,
    topic: &str,
    partition: Option<i32>,
) -> Result<Vec<i32>, EngineError> {
    let metadata = client
        .metadata(Some(topic), METADATA_TIMEOUT)
        .map_err(|source| EngineError::Metadata { topic: topic.to_string(), source })?;

    let info = metadata
        .topic(topic)
        .ok_or_else(|| EngineError::NoSuchTopic(topic.to_string()))?;

    if let Some(detail) = &info.error {
        return Err(EngineError::Topic {
            topic: topic.to_string(),
            detail: detail.clone(),
        });
    }
    if info.partitions.is_empty() {
        return Err(EngineError::NoPartitions(topic.to_string()));
    }

    let partitions = info.partition_ids();
    if let Some(p) = partition {
        if !partitions.contains(&p) {
            return Err(EngineError::PartitionNotFound {
                topic: topic.to_string(),
                partitions,
                partition: p,
            });
        }
    }
    Ok(partitions)
}

// ═══════════════════════════════════════════════════════════════
//  Receive loop
// ═══════════════════════════════════════════════════════════════

/// Polls the consumer and dispatches messages to the renderer and
/// end-of-stream markers to the [`PartitionEofTracker`].
pub struct ReceiveLoop<'a, C, W> {
    client: &'a mut C,
    renderer: &'a mut Renderer<W>,
    options: ConsumeOptions,
    ctx: RunContext,
    tracker: PartitionEofTracker,
    started: Vec<i32>,
    /// Cleared once the client refuses offset storage by configuration.
    store_offsets: bool,
    report: ConsumeReport,
    finished: bool,
}

impl<'a, C: ConsumerClient, W: Write> ReceiveLoop<'a, C, W> {
    /// `partitions` is the topic's full partition list, as returned by
    /// [`resolve_partitions`].
    pub fn new(
        client: &'a mut C,
        renderer: &'a mut Renderer<W>,
        options: ConsumeOptions,
        partitions: &[i32],
        ctx: RunContext,
    ) -> Self {
        let tracker = PartitionEofTracker::new(partitions, options.partition.is_some());
        let started = match options.partition {
            Some(p) => vec![p],
            None => partitions.to_vec(),
        };
        Self {
            client,
            renderer,
            options,
            ctx,
            tracker,
            started,
            store_offsets: true,
            report: ConsumeReport::default(),
            finished: false,
        }
    }

    /// Start every wanted partition, loop until done, then stop them again.
    pub fn run(mut self) -> Result<ConsumeReport, EngineError> {
        self.start()?;
        let result = self.poll_loop();
        self.stop_remaining();

        result?;
        match self.renderer.flush() {
            Err(e) if e.kind() != io::ErrorKind::BrokenPipe => return Err(EngineError::Output(e)),
            _ => {}
        }
        Ok(self.report)
    }

    fn start(&mut self) -> Result<(), EngineError> {
        let topic = self.options.topic.clone();
        for &partition in &self.started {
            self.client
                .start(&topic, partition, self.options.offset)
                .map_err(|source| EngineError::Start {
                    topic: topic.clone(),
                    partition,
                    source,
                })?;
            tracing::debug!(topic = %topic, partition, offset = %self.options.offset, "started partition");
        }
        Ok(())
    }

    fn poll_loop(&mut self) -> Result<(), EngineError> {
        if self.options.limit == Some(0) {
            self.report.reached_limit = true;
            return Ok(());
        }

        while self.ctx.is_running() && !self.finished {
            let events = self.client.poll(self.options.poll_timeout, self.options.max_events);
            for event in events {
                // the rest of the batch is dropped
                if self.finished {
                    break;
                }
                self.handle_event(event)?;
            }
        }
        Ok(())
    }

    fn handle_event(&mut self, event: ClientEvent) -> Result<(), EngineError> {
        match event {
            ClientEvent::Message(msg) => self.handle_message(&msg),
            ClientEvent::PartitionEof { topic, partition, offset } => {
                self.handle_eof(&topic, partition, offset);
                Ok(())
            }
            ClientEvent::Error { fatal: true, reason } => Err(EngineError::Broker(reason)),
            ClientEvent::Error { fatal: false, reason } => {
                tracing::warn!(error = %reason, "client error");
                Ok(())
            }
            ClientEvent::Delivered { .. } | ClientEvent::DeliveryFailed { .. } => Ok(()),
        }
    }

    fn handle_message(&mut self, msg: &Message) -> Result<(), EngineError> {
        if let Err(e) = self.renderer.render(msg) {
            if e.kind() == io::ErrorKind::BrokenPipe {
                tracing::debug!("output closed");
                self.report.output_closed = true;
                self.finished = true;
                return Ok(());
            }
            return Err(EngineError::Output(e));
        }

        self.report.received += 1;
        self.store(&msg.topic, msg.partition, msg.offset);

        if self.options.limit.is_some_and(|n| self.report.received >= n) {
            tracing::debug!(received = self.report.received, "message limit reached");
            self.report.reached_limit = true;
            self.finished = true;
        }
        Ok(())
    }

    fn handle_eof(&mut self, topic: &str, partition: i32, offset: i64) {
        if !self.options.exit_eof {
            tracing::info!(topic, partition, offset, "reached end of partition");
            self.store(topic, partition, crate::eof::resume_offset(offset));
            return;
        }

        let EofOutcome::Observed { resume_offset, done } = self.tracker.observe(partition, offset) else {
            return;
        };

        tracing::info!(topic, partition, offset, "reached end of partition");
        if let Err(e) = self.client.stop(topic, partition) {
            tracing::warn!(topic, partition, error = %e, "failed to stop partition");
        }
        self.store(topic, partition, resume_offset);
        self.report.eof_partitions += 1;

        if done {
            tracing::info!(
                topic,
                partitions = self.tracker.observed_count(),
                "reached end of all wanted partitions"
            );
            self.report.reached_eof = true;
            self.finished = true;
        }
    }

    fn store(&mut self, topic: &str, partition: i32, offset: i64) {
        if !self.store_offsets {
            return;
        }
        match self.client.store_offset(topic, partition, offset) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::Config => {
                tracing::warn!(error = %e, "offset store refused by client configuration, offsets will not be stored");
                self.store_offsets = false;
            }
            Err(e) => tracing::warn!(topic, partition, error = %e, "failed to store offset"),
        }
    }

    fn stop_remaining(&mut self) {
        let topic = self.options.topic.clone();
        for &partition in &self.started {
            if self.tracker.is_observed(partition) {
                continue;
            }
            if let Err(e) = self.client.stop(&topic, partition) {
                tracing::warn!(topic = %topic, partition, error = %e, "failed to stop partition");
            }
        }
    }
}

/// Run consume mode to completion: resolve the topic, start partitions,
/// render messages until the limit, end of stream or shutdown.
pub fn run_consumer<C, W>(
    client: &mut C,
    renderer: &mut Renderer<W>,
    options: ConsumeOptions,
    ctx: &RunContext,
) -> Result<ConsumeReport, EngineError>
where
    C: ConsumerClient + MetadataClient,
    W: Write,
{
    let partitions = resolve_partitions(&*client, &options.topic, options.partition)?;
    tracing::debug!(topic = %options.topic, partitions = partitions.len(), "topic resolved");

    let report = ReceiveLoop::new(client, renderer, options, &partitions, ctx.clone()).run()?;
    tracing::debug!(
        received = report.received,
        eof_partitions = report.eof_partitions,
        "consumer finished"
    );
    Ok(report)
}
