use std::{net::UdpSocket, time::Duration};

use carbonstat::{Destination, InMemExporter, Registry, StatError, UdpExporter};
use proptest::prelude::*;

fn registry() -> Registry<InMemExporter> {
    Registry::new(Destination::default(), InMemExporter::new())
}

fn last_lines(stat: &Registry<InMemExporter>) -> Vec<String> {
    let packet = stat.exporter().last().expect("no packet sent");
    packet.lines().map(str::to_owned).collect()
}

#[test]
fn counter_is_flushed_then_reset() {
    let mut stat = registry();
    stat.metric("foo.count").unwrap().add(2.0).unwrap();
    stat.send_at(1_700_000_000).unwrap();

    assert_eq!(
        last_lines(&stat),
        ["heartbeat 0 1700000000", "foo.count 2 1700000000"]
    );
    assert_eq!(stat.metric("foo.count").unwrap().value(), 0.0);
}

#[test]
fn timer_reports_min_avg_max() {
    let mut stat = registry();
    let timer = stat.timer("foo.time").unwrap();
    timer.record(Duration::from_secs(3));
    timer.record(Duration::from_secs(5));
    stat.send_at(77).unwrap();

    assert_eq!(
        last_lines(&stat),
        [
            "heartbeat 0 77",
            "foo.time.min 3 77",
            "foo.time.avg 4 77",
            "foo.time.max 5 77"
        ]
    );
    assert!(timer.samples().is_empty());
}

#[test]
fn counters_keep_their_order() {
    let mut stat = registry();
    stat.metric("foo.count").unwrap().add(2.0).unwrap();
    stat.metric("bar.count").unwrap().add(1.0).unwrap();
    stat.send_at(5).unwrap();
    assert_eq!(
        last_lines(&stat),
        ["heartbeat 0 5", "bar.count 1 5", "foo.count 2 5"]
    );

    stat.metric("foo.count").unwrap().add(2.0).unwrap();
    stat.metric("bar.count").unwrap().add(1.0).unwrap();
    stat.send_at(6).unwrap();
    assert_eq!(
        last_lines(&stat),
        ["heartbeat 0 6", "bar.count 1 6", "foo.count 2 6"]
    );
}

#[test]
fn accumulating_counter_survives_flush() {
    let mut stat = registry();
    let metric = stat.metric("foo.total").unwrap();
    metric.set_accumulate(true);
    metric.add(1.0).unwrap();
    stat.send_at(1).unwrap();
    metric.add(1.0).unwrap();
    stat.send_at(2).unwrap();

    let packets: Vec<_> = stat.exporter().packets().map(|p| p.to_string()).collect();
    assert_eq!(
        packets,
        [
            "heartbeat 0 1\nfoo.total 1 1",
            "heartbeat 0 2\nfoo.total 2 2"
        ]
    );
}

#[test]
fn stop_without_start_is_rejected() {
    let mut stat = registry();
    let timer = stat.timer("foo.time").unwrap();
    let err = timer.stop().unwrap_err();
    assert!(err.is_invalid_state());
    assert!(timer.samples().is_empty());
}

#[test]
fn wrapper_times_each_call() {
    let mut stat = registry();
    let wrapper = stat.wrapper("job.run").unwrap();
    let mut job = wrapper.wrap(|| "done");
    for _ in 0..3 {
        assert_eq!(job().unwrap(), "done");
    }
    assert_eq!(stat.timer("job.run").unwrap().samples().len(), 3);

    stat.send_at(9).unwrap();
    let lines = last_lines(&stat);
    assert_eq!(lines.len(), 4);
    assert!(lines[1].starts_with("job.run.min "));
    assert!(lines[2].starts_with("job.run.avg "));
    assert!(lines[3].starts_with("job.run.max "));
    assert!(lines.iter().all(|line| line.ends_with(" 9")));
}

#[test]
fn mixed_entries() {
    let mut stat = registry();
    stat.metric("z.count").unwrap().incr();
    stat.timer("a.time")
        .unwrap()
        .record(Duration::from_millis(500));
    {
        let _scope = stat.timer("idle.time").unwrap().scope().unwrap();
        stat.send_at(3).unwrap();
    }
    assert_eq!(
        last_lines(&stat),
        [
            "heartbeat 0 3",
            "z.count 1 3",
            "a.time.min 0.5 3",
            "a.time.avg 0.5 3",
            "a.time.max 0.5 3"
        ]
    );
    // The scope ended after the flush, so its sample lands in the next window.
    assert_eq!(stat.timer("idle.time").unwrap().samples().len(), 1);
}

#[test]
fn kind_mismatch_is_an_error() {
    let mut stat = registry();
    stat.metric("foo").unwrap();
    let err = stat.timer("foo").unwrap_err();
    assert!(matches!(err, StatError::KindMismatch { .. }));
    assert_eq!(err.to_string(), "`foo` is registered as a metric, not a timer");
}

#[test]
fn sends_over_udp() {
    let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
    receiver
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    let port = receiver.local_addr().unwrap().port();

    let mut stat = Registry::new(Destination::new("127.0.0.1", port), UdpExporter::new());
    stat.metric("foo.count").unwrap().add(2.0).unwrap();
    stat.send().unwrap();

    let mut buf = [0; 1024];
    let (n, _) = receiver.recv_from(&mut buf).unwrap();
    let payload = std::str::from_utf8(&buf[..n]).unwrap();
    let lines: Vec<_> = payload.lines().collect();
    assert_eq!(lines.len(), 2);
    let timestamp = lines[0].strip_prefix("heartbeat 0 ").unwrap();
    assert!(timestamp.parse::<u64>().is_ok());
    assert_eq!(lines[1], format!("foo.count 2 {timestamp}"));
}

proptest! {
    #[test]
    fn flush_resets_unless_accumulating(
        deltas in prop::collection::vec(-1_000i64..1_000, 1..16),
        samples in prop::collection::vec(0u64..10_000, 1..16),
        accumulate in any::<bool>(),
    ) {
        let mut stat = registry();
        let metric = stat.metric("foo.count").unwrap();
        let timer = stat.timer("foo.time").unwrap();
        metric.set_accumulate(accumulate);
        timer.set_accumulate(accumulate);
        for &delta in &deltas {
            metric.add(delta as f64).unwrap();
        }
        for &millis in &samples {
            timer.record(Duration::from_millis(millis));
        }
        let value = metric.value();
        let recorded = timer.samples();

        stat.send_at(1).unwrap();
        prop_assert_eq!(stat.exporter().last().unwrap().len(), 5);
        if accumulate {
            prop_assert_eq!(metric.value(), value);
            prop_assert_eq!(timer.samples(), recorded);
        } else {
            prop_assert_eq!(metric.value(), 0.0);
            prop_assert!(timer.samples().is_empty());
        }
    }
}
