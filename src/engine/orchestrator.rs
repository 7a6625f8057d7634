// src/engine/orchestrator.rs

use std::sync::Arc;

use anyhow::anyhow;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{debug, info, warn};

use crate::errors::{ParrunError, Result};
use crate::exec::{merge_child_args, ChildArgSource, OutputSink, ProcessRunner, RunReport, StdioSink};
use crate::gate::OutputGate;
use crate::types::ProgramSpec;

/// Runs a set of programs concurrently and serializes their output.
///
/// Every program is started immediately. The orchestrator waits for all of
/// them to exit (a failing program never cancels its siblings), drains the
/// output gate once, waits for every runner to flush and release its slot and
/// then reports the first failure in exit order, if any.
pub struct Orchestrator {
    sink: Arc<dyn OutputSink>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator").finish_non_exhaustive()
    }
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new(Arc::new(StdioSink::new()))
    }
}

impl Orchestrator {
    pub fn new(sink: Arc<dyn OutputSink>) -> Self {
        Self { sink }
    }

    /// Run `programs` in parallel.
    ///
    /// With `forward_args`, `source` is consulted once and its flags are
    /// appended to every program that does not already pass them.
    pub async fn run_in_parallel(
        &self,
        programs: Vec<ProgramSpec>,
        forward_args: bool,
        source: &dyn ChildArgSource,
    ) -> Result<()> {
        if programs.is_empty() {
            debug!("no programs to run");
            return Ok(());
        }

        let inherited = if forward_args {
            source.child_args().await?
        } else {
            Vec::new()
        };
        debug!(count = inherited.len(), forward_args, "resolved forwarded arguments");

        let gate = OutputGate::new();
        let mut runners = JoinSet::new();
        let total = programs.len();

        for spec in programs {
            let args = if forward_args {
                merge_child_args(&spec.args, &inherited)
            } else {
                spec.args.clone()
            };
            let runner = ProcessRunner::new(spec, args, gate.clone(), Arc::clone(&self.sink));
            runners.spawn(runner.run());
        }

        let (deliveries, first_failure) = settle(&mut runners).await;

        // Every child has exited; nothing may stay parked behind the gate.
        // Runners woken here may write alongside a holder that is still
        // flushing, so from now on only single chunks stay intact.
        let woken = gate.drain_all();
        debug!(woken, "gate drained after settlement");

        // Each handle resolves at its runner's release, which is bounded by
        // the child's exit. Pipes kept open by grandchildren are not awaited.
        for delivery in deliveries {
            if let Err(e) = delivery.await {
                warn!(error = %e, "output delivery task failed");
            }
        }

        match first_failure {
            Some(err) => {
                info!(total, failed = ?err.program(), "parallel run failed");
                Err(err)
            }
            None => {
                info!(total, "all programs finished successfully");
                Ok(())
            }
        }
    }
}

/// Wait for every runner to report, in exit order.
///
/// Returns the output delivery handles and the first failure seen.
async fn settle(
    runners: &mut JoinSet<RunReport>,
) -> (Vec<JoinHandle<()>>, Option<ParrunError>) {
    let mut deliveries = Vec::new();
    let mut first_failure = None;

    while let Some(joined) = runners.join_next().await {
        let outcome = match joined {
            Ok(report) => {
                deliveries.extend(report.delivery);
                report.outcome.map_err(|err| {
                    debug!(program = %report.display_name, error = %err, "program settled with failure");
                    err
                })
            }
            Err(e) => Err(ParrunError::Other(anyhow!("runner task failed: {e}"))),
        };

        if let Err(err) = outcome {
            if first_failure.is_none() {
                first_failure = Some(err);
            } else {
                warn!(error = %err, "additional program failure");
            }
        }
    }

    (deliveries, first_failure)
}
