// src/exec/runner.rs

//! Single program runner.
//!
//! A runner spawns one child with stdin inherited and stdout/stderr piped,
//! then splits the work across three Tokio tasks:
//!
//! - two pumps read stdout and stderr as fast as the child writes, tag each
//!   chunk with the program prefix and push it into an unbounded channel, so
//!   the child itself is never slowed down by the gate;
//! - one delivery task waits for the runner's gate turn and then forwards the
//!   channel to the shared sink, releasing the gate once the child exited.
//!
//! The runner's own future resolves as soon as the child exits and carries
//! the delivery handle so the caller can wait for the release separately.

use std::process::Stdio;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{self, Duration, Instant};
use tracing::{debug, info, warn};

use crate::errors::{ParrunError, Result};
use crate::exec::sink::OutputSink;
use crate::exec::tagger::LineTagger;
use crate::gate::{Admission, GateTicket, OutputGate, SlotId};
use crate::types::{display_command, ProgramSpec, StreamKind};

const READ_BUF_SIZE: usize = 8 * 1024;

/// How long a holder keeps flushing after its program exited.
pub const EXIT_FLUSH_GRACE: Duration = Duration::from_millis(200);

/// A tagged chunk waiting to be written to the sink.
#[derive(Debug)]
struct TaggedChunk {
    stream: StreamKind,
    data: Vec<u8>,
}

/// What a runner reports back once its child exited.
#[derive(Debug)]
pub struct RunReport {
    pub display_name: String,
    pub outcome: Result<()>,
    /// Resolves once this child's gate slot was released. `None` when the
    /// child never started.
    pub delivery: Option<JoinHandle<()>>,
}

pub struct ProcessRunner {
    spec: ProgramSpec,
    args: Vec<String>,
    gate: OutputGate,
    sink: Arc<dyn OutputSink>,
}

impl ProcessRunner {
    /// `args` are the arguments actually passed to the child, i.e.
    /// `spec.args` after merging forwarded flags.
    pub fn new(
        spec: ProgramSpec,
        args: Vec<String>,
        gate: OutputGate,
        sink: Arc<dyn OutputSink>,
    ) -> Self {
        Self {
            spec,
            args,
            gate,
            sink,
        }
    }

    pub async fn run(self) -> RunReport {
        let display_name = self.spec.display_name();

        debug!(
            program = %display_name,
            "Spawning '{}'",
            display_command(&self.spec.program, &self.args)
        );

        let mut cmd = Command::new(&self.spec.program);
        cmd.args(&self.args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(cwd) = &self.spec.cwd {
            cmd.current_dir(cwd);
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(source) => {
                warn!(program = %display_name, error = %source, "failed to spawn program");
                return RunReport {
                    outcome: Err(ParrunError::Spawn {
                        display_name: display_name.clone(),
                        args: self.args,
                        source,
                    }),
                    display_name,
                    delivery: None,
                };
            }
        };

        let ticket = self.gate.acquire();
        let tagger = LineTagger::new(self.spec.prefix.clone());
        let (tx, rx) = mpsc::unbounded_channel::<TaggedChunk>();

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(pump(stdout, StreamKind::Stdout, tagger.clone(), tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(pump(stderr, StreamKind::Stderr, tagger, tx.clone()));
        }
        // Pumps own the only senders; the channel closes once both pipes hit EOF.
        drop(tx);

        let (exit_tx, exit_rx) = oneshot::channel();
        let delivery = tokio::spawn(deliver(
            ticket,
            rx,
            exit_rx,
            self.gate.clone(),
            Arc::clone(&self.sink),
            display_name.clone(),
        ));

        let status = child.wait().await;
        let _ = exit_tx.send(Instant::now());

        let outcome = match status.with_context(|| format!("waiting for process '{display_name}'")) {
            Ok(status) if status.success() => {
                info!(program = %display_name, exit_code = 0, "program exited");
                Ok(())
            }
            Ok(status) => {
                let code = status.code();
                info!(program = %display_name, exit_code = ?code, "program failed");
                Err(ParrunError::ProcessExit {
                    display_name: display_name.clone(),
                    args: self.args,
                    code,
                })
            }
            Err(err) => Err(ParrunError::Other(err)),
        };

        RunReport {
            display_name,
            outcome,
            delivery: Some(delivery),
        }
    }
}

/// Read one pipe to EOF, tagging every chunk as it arrives.
async fn pump<R>(
    mut reader: R,
    stream: StreamKind,
    tagger: LineTagger,
    tx: mpsc::UnboundedSender<TaggedChunk>,
) where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_BUF_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                // Keep reading even if delivery is gone so the child never
                // blocks on a full pipe.
                let _ = tx.send(TaggedChunk {
                    stream,
                    data: tagger.tag(&buf[..n]),
                });
            }
            Err(e) => {
                warn!(?stream, error = %e, "reading program output failed");
                break;
            }
        }
    }
}

/// Forward tagged chunks to the sink while holding the gate slot.
///
/// The active window ends when the child exits, not when its pipes close: a
/// grandchild may keep them open indefinitely. After exit the holder flushes
/// what is already buffered or still in the pipe, up to `EXIT_FLUSH_GRACE`,
/// then releases. Anything later is handed to [`forward_stray`].
async fn deliver(
    ticket: GateTicket,
    mut rx: mpsc::UnboundedReceiver<TaggedChunk>,
    mut exited: oneshot::Receiver<Instant>,
    gate: OutputGate,
    sink: Arc<dyn OutputSink>,
    program: String,
) {
    let slot = ticket.slot;

    if let Admission::Pending(turn) = ticket.admission {
        turn.wait().await;
    }
    debug!(program = %program, slot, "output live");

    let mut open = true;
    let exited_at = loop {
        tokio::select! {
            chunk = rx.recv(), if open => match chunk {
                Some(chunk) => write(&*sink, chunk, &program, slot).await,
                None => open = false,
            },
            at = &mut exited => break at.unwrap_or_else(|_| Instant::now()),
        }
    };

    let deadline = exited_at + EXIT_FLUSH_GRACE;
    while open {
        match time::timeout_at(deadline, rx.recv()).await {
            Ok(Some(chunk)) => write(&*sink, chunk, &program, slot).await,
            Ok(None) => open = false,
            Err(_) => break,
        }
    }

    gate.release(slot);

    if open {
        debug!(program = %program, slot, "pipes outlived the program; forwarding without the gate");
        tokio::spawn(forward_stray(rx, sink, program));
    }
}

/// Write output that arrives after the program exited and gave up its slot,
/// typically from a background grandchild holding the inherited pipe.
async fn forward_stray(
    mut rx: mpsc::UnboundedReceiver<TaggedChunk>,
    sink: Arc<dyn OutputSink>,
    program: String,
) {
    while let Some(chunk) = rx.recv().await {
        if let Err(e) = sink.write_chunk(chunk.stream, chunk.data).await {
            warn!(program = %program, error = %e, "writing late program output failed");
        }
    }
    debug!(program = %program, "late output closed");
}

async fn write(sink: &dyn OutputSink, chunk: TaggedChunk, program: &str, slot: SlotId) {
    if let Err(e) = sink.write_chunk(chunk.stream, chunk.data).await {
        warn!(program = %program, slot, error = %e, "writing program output failed");
    }
}
