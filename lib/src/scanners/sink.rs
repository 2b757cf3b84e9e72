//! Thread-safe reporting surface for probe outcomes

#[cfg(test)]
use mockall::automock;

use log::*;
use std::{
    io::Write,
    net::Ipv4Addr,
    sync::{Mutex, MutexGuard, mpsc},
};

use crate::error::{LanProbeError, Result};

use super::{
    HostUp, ProbeMethod, ProbeOutcome, ScanMessage, ScanResult, Scanning,
};

#[cfg_attr(test, automock)]
/// Receives the structured events produced by workers and the coordinator
///
/// Implementations decide how events are rendered or persisted. Every method
/// may be called concurrently from any number of workers.
pub trait ResultSink: Send + Sync {
    /// A worker is about to probe `ip`
    fn scanning(&self, ip: Ipv4Addr) -> Result<()>;

    /// A worker finished probing one target. An `Up` outcome increments the
    /// responded counter and emits the host up notification as one step.
    fn record(&self, method: ProbeMethod, outcome: ProbeOutcome) -> Result<()>;

    /// A worker could not start probing and has exited
    fn worker_failed(&self, worker_id: usize, error: String) -> Result<()>;

    /// Number of hosts recorded as up so far
    fn responded(&self) -> usize;

    /// Every worker has exited; emits the closing notifications
    fn finish(&self, result: &ScanResult) -> Result<()>;
}

struct SinkState {
    responded: usize,
    notifier: mpsc::Sender<ScanMessage>,
    log: Option<Box<dyn Write + Send>>,
}

impl SinkState {
    fn notify(&self, msg: ScanMessage) -> Result<()> {
        self.notifier
            .send(msg)
            .map_err(LanProbeError::from_channel_send_error)
    }

    fn mirror(&mut self, line: &str) -> Result<()> {
        if let Some(log) = self.log.as_mut() {
            writeln!(log, "{}", line)
                .and_then(|_| log.flush())
                .map_err(LanProbeError::LogWrite)?;
        }
        Ok(())
    }
}

/// [`ResultSink`] that pushes [`ScanMessage`]s over an mpsc channel and
/// optionally mirrors every human-readable line to an append-only log
///
/// The counter, the channel and the log share one lock, so the order of
/// host up messages always matches their count.
pub struct ChannelSink {
    state: Mutex<SinkState>,
}

impl ChannelSink {
    /// Returns a sink that only notifies over the channel
    pub fn new(notifier: mpsc::Sender<ScanMessage>) -> Self {
        Self {
            state: Mutex::new(SinkState {
                responded: 0,
                notifier,
                log: None,
            }),
        }
    }

    /// Returns a sink that notifies over the channel and copies each line
    /// into `log`
    pub fn with_log(
        notifier: mpsc::Sender<ScanMessage>,
        log: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            state: Mutex::new(SinkState {
                responded: 0,
                notifier,
                log: Some(log),
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, SinkState>> {
        self.state.lock().map_err(|e| LanProbeError::Lock {
            what: "result sink",
            error: e.to_string(),
        })
    }
}

impl ResultSink for ChannelSink {
    fn scanning(&self, ip: Ipv4Addr) -> Result<()> {
        debug!("probing {}", ip);
        self.lock()?.notify(ScanMessage::Info(Scanning { ip }))
    }

    fn record(&self, method: ProbeMethod, outcome: ProbeOutcome) -> Result<()> {
        match outcome {
            ProbeOutcome::Up { ip, mac } => {
                let mut state = self.lock()?;
                state.responded += 1;

                let host = HostUp {
                    ip,
                    mac,
                    method,
                    count: state.responded,
                };

                debug!("{} [{}]", host, host.count);

                let mirrored = state.mirror(&host.to_string());
                state.notify(ScanMessage::HostUp(host))?;
                mirrored
            }
            ProbeOutcome::Down => Ok(()),
            ProbeOutcome::SendError { ip, cause } => {
                warn!("send failed for {}: {}", ip, cause);

                let mut state = self.lock()?;
                let mirrored =
                    state.mirror(&format!("Send failed for {}: {}", ip, cause));
                state.notify(ScanMessage::SendFailed { ip, error: cause })?;
                mirrored
            }
        }
    }

    fn worker_failed(&self, worker_id: usize, error: String) -> Result<()> {
        error!("worker {} failed: {}", worker_id, error);

        let mut state = self.lock()?;
        let mirrored =
            state.mirror(&format!("Worker {} failed: {}", worker_id, error));
        state.notify(ScanMessage::WorkerFailed {
            worker: worker_id,
            error,
        })?;
        mirrored
    }

    fn responded(&self) -> usize {
        match self.state.lock() {
            Ok(state) => state.responded,
            Err(poisoned) => poisoned.into_inner().responded,
        }
    }

    fn finish(&self, result: &ScanResult) -> Result<()> {
        let mut state = self.lock()?;
        let mut mirrored = Ok(());

        if result.aborted_by_user {
            mirrored = state.mirror("Scan aborted by user.");
            state.notify(ScanMessage::Aborted)?;
        }

        let summary = state.mirror(&format!(
            "Scan complete. Hosts responding: {}",
            result.responded_count
        ));

        // consumers wait for Done even when the log is broken
        state.notify(ScanMessage::Done)?;

        mirrored.and(summary)
    }
}

#[cfg(test)]
#[path = "./sink_tests.rs"]
mod tests;
