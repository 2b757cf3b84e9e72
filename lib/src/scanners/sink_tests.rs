use std::{
    collections::HashSet,
    fs::{self, OpenOptions},
    net::Ipv4Addr,
    sync::{Arc, mpsc},
    thread,
};

use pnet::util::MacAddr;

use super::*;

fn up(ip: Ipv4Addr) -> ProbeOutcome {
    ProbeOutcome::Up { ip, mac: None }
}

#[test]
fn records_host_up_and_notifies() {
    let (tx, rx) = mpsc::channel();
    let sink = ChannelSink::new(tx);
    let ip = Ipv4Addr::new(192, 168, 1, 10);
    let mac = MacAddr::new(0x00, 0x11, 0x22, 0x33, 0x44, 0x55);

    sink.record(ProbeMethod::Arp, ProbeOutcome::Up { ip, mac: Some(mac) })
        .unwrap();

    assert_eq!(sink.responded(), 1);

    let msg = rx.recv().unwrap();
    match msg {
        ScanMessage::HostUp(host) => {
            assert_eq!(host.ip, ip);
            assert_eq!(host.mac, Some(mac));
            assert_eq!(host.method, ProbeMethod::Arp);
            assert_eq!(host.count, 1);
        }
        _ => panic!("unexpected message: {:?}", msg),
    }
}

#[test]
fn ignores_down_outcomes() {
    let (tx, rx) = mpsc::channel();
    let sink = ChannelSink::new(tx);

    sink.record(ProbeMethod::Icmp, ProbeOutcome::Down).unwrap();

    assert_eq!(sink.responded(), 0);
    assert!(rx.try_recv().is_err());
}

#[test]
fn reports_send_failures_without_counting() {
    let (tx, rx) = mpsc::channel();
    let sink = ChannelSink::new(tx);
    let ip = Ipv4Addr::new(10, 0, 0, 9);

    sink.record(
        ProbeMethod::Icmp,
        ProbeOutcome::SendError {
            ip,
            cause: "network unreachable".to_string(),
        },
    )
    .unwrap();

    assert_eq!(sink.responded(), 0);

    let msg = rx.recv().unwrap();
    match msg {
        ScanMessage::SendFailed { ip: failed, error } => {
            assert_eq!(failed, ip);
            assert_eq!(error, "network unreachable");
        }
        _ => panic!("unexpected message: {:?}", msg),
    }
}

#[test]
fn emits_scanning_info() {
    let (tx, rx) = mpsc::channel();
    let sink = ChannelSink::new(tx);
    let ip = Ipv4Addr::new(10, 0, 0, 1);

    sink.scanning(ip).unwrap();

    let msg = rx.recv().unwrap();
    match msg {
        ScanMessage::Info(scanning) => assert_eq!(scanning.ip, ip),
        _ => panic!("unexpected message: {:?}", msg),
    }
}

#[test]
fn reports_worker_failures() {
    let (tx, rx) = mpsc::channel();
    let sink = ChannelSink::new(tx);

    sink.worker_failed(3, "permission denied".to_string())
        .unwrap();

    let msg = rx.recv().unwrap();
    match msg {
        ScanMessage::WorkerFailed { worker, error } => {
            assert_eq!(worker, 3);
            assert_eq!(error, "permission denied");
        }
        _ => panic!("unexpected message: {:?}", msg),
    }
}

#[test]
fn finish_sends_done() {
    let (tx, rx) = mpsc::channel();
    let sink = ChannelSink::new(tx);

    sink.finish(&ScanResult::default()).unwrap();

    assert!(matches!(rx.recv().unwrap(), ScanMessage::Done));
    assert!(rx.try_recv().is_err());
}

#[test]
fn finish_sends_aborted_before_done() {
    let (tx, rx) = mpsc::channel();
    let sink = ChannelSink::new(tx);

    sink.finish(&ScanResult {
        responded_count: 2,
        aborted_by_user: true,
    })
    .unwrap();

    assert!(matches!(rx.recv().unwrap(), ScanMessage::Aborted));
    assert!(matches!(rx.recv().unwrap(), ScanMessage::Done));
}

#[test]
fn errors_when_receiver_is_gone() {
    let (tx, rx) = mpsc::channel();
    let sink = ChannelSink::new(tx);
    drop(rx);

    let result = sink.record(ProbeMethod::Icmp, up(Ipv4Addr::new(10, 0, 0, 2)));

    assert!(matches!(result, Err(LanProbeError::NotifierSendError(_))));
}

#[test]
fn counts_concurrent_records_exactly() {
    let workers = 32;
    let (tx, rx) = mpsc::channel();
    let sink = Arc::new(ChannelSink::new(tx));

    let handles: Vec<_> = (0..workers)
        .map(|i| {
            let sink = Arc::clone(&sink);
            thread::spawn(move || {
                let ip = Ipv4Addr::new(10, 0, 1, i as u8 + 1);
                sink.record(ProbeMethod::Icmp, up(ip)).unwrap();
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(sink.responded(), workers);

    drop(sink);

    let counts: Vec<usize> = rx
        .iter()
        .filter_map(|msg| match msg {
            ScanMessage::HostUp(host) => Some(host.count),
            _ => None,
        })
        .collect();

    // counts are handed out under the same lock as the notification
    assert_eq!(counts, (1..=workers).collect::<Vec<_>>());

    let unique: HashSet<usize> = counts.into_iter().collect();
    assert_eq!(unique.len(), workers);
}

#[test]
fn mirrors_lines_to_log() {
    let file = tempfile::NamedTempFile::new().unwrap();
    let log = OpenOptions::new().append(true).open(file.path()).unwrap();

    let (tx, _rx) = mpsc::channel();
    let sink = ChannelSink::with_log(tx, Box::new(log));

    sink.record(ProbeMethod::Icmp, up(Ipv4Addr::new(192, 168, 0, 7)))
        .unwrap();
    sink.record(ProbeMethod::Icmp, ProbeOutcome::Down).unwrap();
    sink.record(
        ProbeMethod::Icmp,
        ProbeOutcome::SendError {
            ip: Ipv4Addr::new(192, 168, 0, 8),
            cause: "no route to host".to_string(),
        },
    )
    .unwrap();
    sink.finish(&ScanResult {
        responded_count: 1,
        aborted_by_user: true,
    })
    .unwrap();

    let contents = fs::read_to_string(file.path()).unwrap();
    let lines: Vec<&str> = contents.lines().collect();

    assert_eq!(
        lines,
        vec![
            "Host 192.168.0.7 is up (ICMP)",
            "Send failed for 192.168.0.8: no route to host",
            "Scan aborted by user.",
            "Scan complete. Hosts responding: 1",
        ]
    );
}

#[test]
fn mirrored_lines_are_never_interleaved() {
    let workers = 16;
    let file = tempfile::NamedTempFile::new().unwrap();
    let log = OpenOptions::new().append(true).open(file.path()).unwrap();

    let (tx, _rx) = mpsc::channel();
    let sink = ChannelSink::with_log(tx, Box::new(log));

    thread::scope(|s| {
        for i in 0..workers {
            let sink = &sink;
            s.spawn(move || {
                let ip = Ipv4Addr::new(172, 16, 0, i as u8 + 1);
                sink.record(ProbeMethod::Icmp, up(ip)).unwrap();
            });
        }
    });

    let contents = fs::read_to_string(file.path()).unwrap();
    let lines: Vec<&str> = contents.lines().collect();

    assert_eq!(lines.len(), workers);
    assert!(lines.iter().all(|l| {
        l.starts_with("Host 172.16.0.") && l.ends_with(" is up (ICMP)")
    }));
}
