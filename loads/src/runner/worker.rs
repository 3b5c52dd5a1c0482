use crate::runner::StopHandle;
use loads_core::{Scenario, WorkerStatus};
use std::sync::Arc;
use tokio::task::yield_now;
use tokio::time::Instant;

/// When a worker is done.
#[derive(Clone)]
pub(crate) enum Bound {
    /// Every entry is a sub-phase of that many sequential hits.
    Hits(Arc<[u64]>),
    /// Loop until the phase deadline.
    Until(Instant),
}

/// One simulated user. Owns its status for its whole life.
pub(crate) struct Worker {
    pub scenario: Arc<dyn Scenario>,
    pub status: WorkerStatus,
    pub stop: StopHandle,
}

impl Worker {
    pub async fn run(mut self, bound: Bound) {
        if self.stop.is_stopped() {
            return;
        }

        match bound {
            Bound::Hits(hits) => self.run_hits(&hits).await,
            Bound::Until(deadline) => self.run_until(deadline).await,
        }
    }

    async fn run_hits(&mut self, hits: &[u64]) {
        for &nb_hits in hits {
            yield_now().await;
            self.status.nb_hits = nb_hits;

            for _ in 0..nb_hits {
                // NOTE: Checked between hits only; a dispatched hit always runs to completion.
                if self.stop.is_stopped() {
                    return;
                }
                self.status.current_hit += 1;
                self.scenario.call(&self.status).await;
                yield_now().await;
            }
        }
    }

    /// A hit running past `deadline` completes; no new one starts.
    async fn run_until(&mut self, deadline: Instant) {
        while !self.is_cancelled(deadline) {
            self.status.current_hit += 1;
            self.status.nb_hits = self.status.current_hit;
            self.scenario.call(&self.status).await;
            yield_now().await;
        }
    }

    fn is_cancelled(&self, deadline: Instant) -> bool {
        self.stop.is_stopped() || Instant::now() >= deadline
    }
}
