//! Provides the [`Scanner`] that fans a subnet out over a bounded pool of
//! probe workers

use derive_builder::Builder;
use log::*;
use std::{
    net::Ipv4Addr,
    sync::Arc,
    thread::{self, JoinHandle},
    time::Duration,
};

use crate::{
    error::{LanProbeError, Result},
    targets::{list::TargetList, range::AddressRange},
};

use super::{
    MAX_WORKERS, POLL_INTERVAL, ProberFactory, ScanResult, Scanner,
    queue::WorkQueue,
    sink::ResultSink,
    worker::{self, CancelToken, ScanContext},
};

/// Poll-able external cancellation signal
pub type CancelCheck = Arc<dyn Fn() -> bool + Send + Sync>;

/// Returns a [`CancelCheck`] that never requests cancellation
pub fn never_cancelled() -> CancelCheck {
    Arc::new(|| false)
}

/// Data structure representing a whole-subnet host discovery scan
///
/// A scan computes the usable host range of `network`/`netmask`, starts
/// `min(host count, max_workers)` workers over a shared [`WorkQueue`], then
/// polls every `poll_interval` until they all exit, checking `cancel_check`
/// on each poll. Cancellation is cooperative: in-flight probes always finish.
#[derive(Clone, Builder)]
pub struct ScanCoordinator {
    /// Any address inside the subnet to scan
    #[builder(setter(into))]
    network: Ipv4Addr,
    /// Subnet mask of the network to scan
    #[builder(setter(into))]
    netmask: Ipv4Addr,
    /// Creates each worker's prober and so selects the probe method
    prober_factory: Arc<dyn ProberFactory>,
    /// Receives every probe outcome
    sink: Arc<dyn ResultSink>,
    /// Checked once per poll interval while workers are running
    #[builder(default = "never_cancelled()")]
    cancel_check: CancelCheck,
    /// Upper bound on concurrent workers
    #[builder(default = "MAX_WORKERS")]
    max_workers: usize,
    /// How often completion and cancellation are checked
    #[builder(default = "POLL_INTERVAL")]
    poll_interval: Duration,
}

impl ScanCoordinator {
    /// Returns builder for ScanCoordinator
    pub fn builder() -> ScanCoordinatorBuilder {
        ScanCoordinatorBuilder::default()
    }

    /// Computes the host range and materializes the target list. Nothing is
    /// put on the wire.
    pub fn prepare(&self) -> Result<TargetList> {
        let range = AddressRange::from_network(self.network, self.netmask)?;

        info!(
            "scanning {} hosts ({}) using {}",
            range.len(),
            range,
            self.prober_factory.method()
        );

        TargetList::from_range(&range)
    }

    /// Probes every target, blocking until all workers have exited
    pub fn dispatch(&self, targets: &TargetList) -> Result<ScanResult> {
        let queue = WorkQueue::new(targets.len());
        let token = CancelToken::new();
        let worker_count = targets.len().min(self.max_workers.max(1));

        let ctx = ScanContext {
            targets,
            queue: &queue,
            sink: self.sink.as_ref(),
            token: &token,
        };

        let scanned = thread::scope(|s| -> Result<bool> {
            let mut handles = Vec::new();

            handles.try_reserve_exact(worker_count).map_err(|e| {
                LanProbeError::from_try_reserve_error("worker handles", e)
            })?;

            for worker_id in 0..worker_count {
                let ctx = &ctx;
                let factory = self.prober_factory.as_ref();

                let spawned = thread::Builder::new()
                    .name(format!("probe-worker-{}", worker_id))
                    .spawn_scoped(s, move || {
                        worker::run(ctx, factory, worker_id)
                    });

                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        warn!(
                            "started {} of {} workers: {}",
                            handles.len(),
                            worker_count,
                            e
                        );
                        break;
                    }
                }
            }

            debug!("dispatched {} workers", handles.len());

            let mut aborted = false;

            while !handles.iter().all(|h| h.is_finished()) {
                if !aborted && (self.cancel_check)() {
                    info!("cancelling scan, waiting for in-flight probes");
                    token.cancel();
                    aborted = true;
                }

                thread::sleep(self.poll_interval);
            }

            let mut probed = 0;

            for handle in handles {
                match handle.join() {
                    Ok(count) => probed += count,
                    Err(e) => {
                        error!("worker panicked: {}", LanProbeError::from(e))
                    }
                }
            }

            debug!("probed {} of {} targets", probed, targets.len());

            Ok(aborted)
        });

        self.complete(scanned)
    }

    // Consumers wait for the sink's Done message, so the sink is finished
    // even when the scan itself failed
    fn complete(&self, scanned: Result<bool>) -> Result<ScanResult> {
        let result = ScanResult {
            responded_count: self.sink.responded(),
            aborted_by_user: matches!(scanned, Ok(true)),
        };

        if let Err(e) = self.sink.finish(&result) {
            warn!("failed to report scan completion: {}", e);
        }

        scanned.map(|_| result)
    }

    /// Prepares and dispatches a scan on the calling thread
    pub fn run(&self) -> Result<ScanResult> {
        let targets = self.prepare()?;
        self.dispatch(&targets)
    }
}

// Implements the Scanner trait for ScanCoordinator
impl Scanner for ScanCoordinator {
    fn scan(&self) -> Result<JoinHandle<Result<ScanResult>>> {
        let targets = self.prepare()?;
        let self_clone = self.clone();

        // prevent blocking thread so messages can be freely sent to consumer
        thread::Builder::new()
            .name("scan-coordinator".into())
            .spawn(move || self_clone.dispatch(&targets))
            .map_err(|e| LanProbeError::ThreadError(e.to_string()))
    }
}

#[cfg(test)]
#[path = "./coordinator_tests.rs"]
mod tests;
