//! Consume mode against the in-process broker.

use kcat_api::StartOffset;
use kcat_engine::{
    CompiledFormat, ConsumeOptions, MemoryBroker, RenderOptions, Renderer, RunContext, run_consumer,
};

fn broker_with(partitions: &[&[&str]]) -> MemoryBroker {
    let mut broker = MemoryBroker::new().with_topic("t", partitions.len());
    for (p, payloads) in partitions.iter().enumerate() {
        for payload in payloads.iter() {
            broker.append("t", p as i32, None, Some(payload.as_bytes()));
        }
    }
    broker
}

fn renderer(fmt: &str) -> Renderer<Vec<u8>> {
    Renderer::new(CompiledFormat::compile(fmt).unwrap(), Vec::new(), RenderOptions::default())
}

fn lines(out: &Renderer<Vec<u8>>) -> Vec<String> {
    let mut lines: Vec<String> = String::from_utf8(out.get_ref().clone())
        .unwrap()
        .lines()
        .map(String::from)
        .collect();
    lines.sort();
    lines
}

#[test]
fn exit_at_eof_across_all_partitions() {
    let mut broker = broker_with(&[&["a", "b"], &[], &["c"]]);
    let mut out = renderer("%p/%o=%s\\n");
    let mut options = ConsumeOptions::new("t");
    options.exit_eof = true;

    let report = run_consumer(&mut broker, &mut out, options, &RunContext::new()).unwrap();

    assert!(report.reached_eof);
    assert_eq!(report.eof_partitions, 3);
    assert_eq!(report.received, 3);
    assert_eq!(lines(&out), vec!["0/0=a", "0/1=b", "2/0=c"]);

    assert_eq!(broker.stored_offset("t", 0), Some(1));
    assert_eq!(broker.stored_offset("t", 1), Some(0));
    assert_eq!(broker.stored_offset("t", 2), Some(0));
    for p in 0..3 {
        assert!(broker.is_paused("t", p));
    }
}

#[test]
fn explicit_partition_stops_after_its_own_eof() {
    let mut broker = broker_with(&[&["a"], &["b", "c"], &["d"]]);
    let mut out = renderer("%s\\n");
    let mut options = ConsumeOptions::new("t");
    options.partition = Some(1);
    options.exit_eof = true;

    let report = run_consumer(&mut broker, &mut out, options, &RunContext::new()).unwrap();

    assert!(report.reached_eof);
    assert_eq!(report.eof_partitions, 1);
    assert_eq!(out.get_ref().as_slice(), b"b\nc\n");
    assert_eq!(broker.assigned(), vec![("t".to_string(), 1)]);
}

#[test]
fn limit_counts_messages_across_partitions() {
    let mut broker = broker_with(&[&["a", "b"], &["c", "d"], &["e"]]);
    let mut out = renderer("%s\\n");
    let mut options = ConsumeOptions::new("t");
    options.limit = Some(3);
    options.exit_eof = true;

    let report = run_consumer(&mut broker, &mut out, options, &RunContext::new()).unwrap();
    assert!(report.reached_limit);
    assert_eq!(report.received, 3);
    assert_eq!(lines(&out).len(), 3);
}

#[test]
fn tail_offset() {
    let mut broker = broker_with(&[&["a", "b", "c"]]);
    let mut out = renderer("%o:%s\\n");
    let mut options = ConsumeOptions::new("t");
    options.offset = StartOffset::Tail(2);
    options.exit_eof = true;

    run_consumer(&mut broker, &mut out, options, &RunContext::new()).unwrap();
    assert_eq!(out.get_ref().as_slice(), b"1:b\n2:c\n");
}

#[test]
fn null_placeholder_and_lengths() {
    let mut broker = MemoryBroker::new().with_topic("t", 1);
    broker.append("t", 0, Some(b"k".as_slice()), None);
    let format = CompiledFormat::default_for("\\n", Some(":"), true).unwrap();
    let mut out = Renderer::new(
        format,
        Vec::new(),
        RenderOptions {
            null_placeholder: Some(b"NULL".to_vec()),
            ..Default::default()
        },
    );
    let mut options = ConsumeOptions::new("t");
    options.exit_eof = true;

    run_consumer(&mut broker, &mut out, options, &RunContext::new()).unwrap();
    assert_eq!(out.get_ref().as_slice(), b"0:k:NULL\n");
}

#[test]
fn shutdown_before_first_poll() {
    let mut broker = broker_with(&[&["a"]]);
    let mut out = renderer("%s\\n");
    let ctx = RunContext::new();
    ctx.shutdown();

    let report = run_consumer(&mut broker, &mut out, ConsumeOptions::new("t"), &ctx).unwrap();
    assert_eq!(report.received, 0);
    assert!(broker.is_paused("t", 0));
}
