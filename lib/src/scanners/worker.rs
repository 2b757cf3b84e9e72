//! The loop every probe worker runs

use log::*;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::targets::list::TargetList;

use super::{ProberFactory, queue::WorkQueue, sink::ResultSink};

/// Cooperative stop signal shared by the coordinator and its workers
///
/// Workers check it between targets, so a probe already in flight always
/// runs to completion.
#[derive(Debug, Default)]
pub struct CancelToken(AtomicBool);

impl CancelToken {
    /// Returns a token that has not been cancelled
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks every worker to stop before claiming another target
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Returns true once [`CancelToken::cancel`] has been called
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Everything a worker borrows from the coordinator for one scan
pub struct ScanContext<'a> {
    /// Read-only list of addresses
    pub targets: &'a TargetList,
    /// Shared cursor over `targets`
    pub queue: &'a WorkQueue,
    /// Where outcomes are reported
    pub sink: &'a dyn ResultSink,
    /// Stop signal
    pub token: &'a CancelToken,
}

/// Runs one worker to completion and returns how many targets it probed
///
/// The worker creates its own prober, then claims targets until the queue is
/// exhausted or the token is cancelled. If the prober cannot be created the
/// failure is reported once and the worker exits without probing, leaving
/// the remaining targets to the other workers.
pub fn run(
    ctx: &ScanContext<'_>,
    factory: &dyn ProberFactory,
    worker_id: usize,
) -> usize {
    let method = factory.method();

    let mut prober = match factory.create(worker_id) {
        Ok(prober) => prober,
        Err(e) => {
            let reported = ctx.sink.worker_failed(worker_id, e.to_string());
            if let Err(report) = reported {
                error!("worker {}: {}", worker_id, report);
            }
            return 0;
        }
    };

    let mut probed = 0;

    while !ctx.token.is_cancelled() {
        let Some(index) = ctx.queue.claim_next() else {
            break;
        };

        let Some(target) = ctx.targets.get(index) else {
            break;
        };

        if let Err(e) = ctx.sink.scanning(target) {
            warn!("worker {}: {}", worker_id, e);
        }

        let outcome = prober.probe(index, target);
        probed += 1;

        if let Err(e) = ctx.sink.record(method, outcome) {
            warn!("worker {}: {}", worker_id, e);
        }
    }

    debug!("worker {} exiting after {} probes", worker_id, probed);

    probed
}

#[cfg(test)]
#[path = "./worker_tests.rs"]
mod tests;
