// tests/parallel_run.rs
//
// End-to-end runs of real `/bin/sh` programs through the orchestrator, with
// output captured by a recording sink.

use std::error::Error;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::time::{Duration, Instant};

use parrun::engine::Orchestrator;
use parrun::errors::{ParrunError, Result as ParrunResult};
use parrun::exec::{ChildArg, ChildArgSource, StaticArgs};
use parrun::types::{ProgramSpec, StreamKind};
use parrun_test_utils::builders::sh;
use parrun_test_utils::memory_sink::MemorySink;
use parrun_test_utils::{init_tracing, with_timeout};

type TestResult = Result<(), Box<dyn Error>>;

fn orchestrator(sink: &MemorySink) -> Orchestrator {
    Orchestrator::new(Arc::new(sink.clone()))
}

/// Counts how often it is consulted.
#[derive(Default)]
struct CountingArgs {
    calls: AtomicUsize,
    args: Vec<ChildArg>,
}

impl ChildArgSource for CountingArgs {
    fn child_args(&self) -> Pin<Box<dyn Future<Output = ParrunResult<Vec<ChildArg>>> + Send + '_>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let args = self.args.clone();
        Box::pin(async move { Ok(args) })
    }
}

/// Once a program's chunks stop appearing, they must never reappear.
fn assert_contiguous(owners: &[&str]) {
    let mut finished: Vec<&str> = Vec::new();
    for window in owners.windows(2) {
        if window[0] != window[1] {
            finished.push(window[0]);
        }
        assert!(
            !finished.contains(&window[1]),
            "output of {} was interleaved: {owners:?}",
            window[1]
        );
    }
}

#[tokio::test]
async fn two_programs_succeed_without_interleaving() -> TestResult {
    init_tracing();

    let sink = MemorySink::new();
    let programs = vec![
        sh("[A] ", "echo hello from a"),
        sh("[B] ", "echo hello from b"),
    ];

    with_timeout(orchestrator(&sink).run_in_parallel(programs, true, &StaticArgs::none())).await?;

    let stdout = sink.text(StreamKind::Stdout);
    assert!(stdout.contains("[A] hello from a\n"), "stdout was {stdout:?}");
    assert!(stdout.contains("[B] hello from b\n"), "stdout was {stdout:?}");
    assert_contiguous(&sink.owners(&["[A] ", "[B] "]));

    Ok(())
}

#[tokio::test]
async fn failing_program_is_reported_and_others_still_print() -> TestResult {
    init_tracing();

    let sink = MemorySink::new();
    let programs = vec![
        sh("[A] ", "echo a line; sleep 0.2"),
        sh("[B] ", "exit 2"),
    ];

    let result =
        with_timeout(orchestrator(&sink).run_in_parallel(programs, false, &StaticArgs::none()))
            .await;

    match result {
        Err(ParrunError::ProcessExit {
            display_name,
            args,
            code,
        }) => {
            assert_eq!(display_name, "sh");
            assert_eq!(args, vec!["-c".to_string(), "exit 2".to_string()]);
            assert_eq!(code, Some(2));
        }
        other => panic!("expected ProcessExit, got {other:?}"),
    }

    assert_eq!(sink.payload(StreamKind::Stdout, "[A] "), "a line\n");

    Ok(())
}

#[tokio::test]
async fn queued_output_is_held_until_the_holder_finishes() -> TestResult {
    init_tracing();

    let sink = MemorySink::new();
    // A gets the slot first and writes twice well before exiting; B writes
    // right away but has to wait for its turn.
    let programs = vec![
        sh("[A] ", "echo a1; sleep 0.3; echo a2; sleep 0.3"),
        sh("[B] ", "echo b1; sleep 0.1; echo b2"),
    ];

    with_timeout(orchestrator(&sink).run_in_parallel(programs, false, &StaticArgs::none())).await?;

    let owners = sink.owners(&["[A] ", "[B] "]);
    assert_eq!(owners.first(), Some(&"[A] "));
    assert_contiguous(&owners);
    assert_eq!(sink.payload(StreamKind::Stdout, "[A] "), "a1\na2\n");
    assert_eq!(sink.payload(StreamKind::Stdout, "[B] "), "b1\nb2\n");

    Ok(())
}

#[tokio::test]
async fn no_output_is_lost_while_paused() -> TestResult {
    init_tracing();

    let sink = MemorySink::new();
    let programs = vec![
        sh("[slow] ", "sleep 0.3; echo done"),
        sh("[bulk] ", "seq 1 20000"),
        sh("[err] ", "seq 1 500 1>&2"),
    ];

    with_timeout(orchestrator(&sink).run_in_parallel(programs, false, &StaticArgs::none())).await?;

    let expected: String = (1..=20000).map(|n| format!("{n}\n")).collect();
    assert_eq!(sink.payload(StreamKind::Stdout, "[bulk] "), expected);

    let expected_err: String = (1..=500).map(|n| format!("{n}\n")).collect();
    assert_eq!(sink.payload(StreamKind::Stderr, "[err] "), expected_err);
    assert_eq!(sink.payload(StreamKind::Stdout, "[slow] "), "done\n");

    Ok(())
}

#[tokio::test]
async fn stdout_and_stderr_keep_their_streams() -> TestResult {
    init_tracing();

    let sink = MemorySink::new();
    let programs = vec![sh("[X] ", "echo out; sleep 0.05; echo err 1>&2")];

    with_timeout(orchestrator(&sink).run_in_parallel(programs, false, &StaticArgs::none())).await?;

    assert_eq!(sink.text(StreamKind::Stdout), "[X] out\n");
    assert_eq!(sink.text(StreamKind::Stderr), "[X] err\n");

    Ok(())
}

#[tokio::test]
async fn failure_does_not_cancel_siblings() -> TestResult {
    init_tracing();

    let sink = MemorySink::new();
    let programs = vec![
        sh("[P1] ", "sleep 0.3; echo p1 done"),
        sh("[P2] ", "exit 1"),
        sh("[P3] ", "sleep 0.3; echo p3 done"),
    ];

    let started = Instant::now();
    let result =
        with_timeout(orchestrator(&sink).run_in_parallel(programs, false, &StaticArgs::none()))
            .await;

    let err = result.expect_err("P2 must fail the run");
    assert!(err.to_string().contains("exit 1"), "unexpected error: {err}");
    assert!(started.elapsed() >= Duration::from_millis(300));
    assert_eq!(sink.payload(StreamKind::Stdout, "[P1] "), "p1 done\n");
    assert_eq!(sink.payload(StreamKind::Stdout, "[P3] "), "p3 done\n");

    Ok(())
}

#[tokio::test]
async fn first_failure_in_exit_order_wins() -> TestResult {
    init_tracing();

    let sink = MemorySink::new();
    let programs = vec![sh("", "sleep 0.3; exit 3"), sh("", "exit 4")];

    let result =
        with_timeout(orchestrator(&sink).run_in_parallel(programs, false, &StaticArgs::none()))
            .await;

    match result {
        Err(ParrunError::ProcessExit { code, .. }) => assert_eq!(code, Some(4)),
        other => panic!("expected ProcessExit, got {other:?}"),
    }

    Ok(())
}

#[tokio::test]
async fn queued_program_is_drained_when_holder_fails() -> TestResult {
    init_tracing();

    let sink = MemorySink::new();
    let programs = vec![
        sh("[H] ", "echo holding; sleep 0.2; exit 5"),
        sh("[Q] ", "echo queued 1; echo queued 2 1>&2"),
    ];

    let result =
        with_timeout(orchestrator(&sink).run_in_parallel(programs, false, &StaticArgs::none()))
            .await;

    assert!(matches!(result, Err(ParrunError::ProcessExit { code: Some(5), .. })));
    assert_eq!(sink.payload(StreamKind::Stdout, "[Q] "), "queued 1\n");
    assert_eq!(sink.payload(StreamKind::Stderr, "[Q] "), "queued 2\n");

    Ok(())
}

#[tokio::test]
async fn silent_program_finishing_while_queued_does_not_block() -> TestResult {
    init_tracing();

    let sink = MemorySink::new();
    let programs = vec![
        sh("[A] ", "sleep 0.2; echo a"),
        sh("[S] ", "true"),
        sh("[C] ", "echo c"),
    ];

    with_timeout(orchestrator(&sink).run_in_parallel(programs, false, &StaticArgs::none())).await?;

    assert_eq!(sink.payload(StreamKind::Stdout, "[A] "), "a\n");
    assert_eq!(sink.payload(StreamKind::Stdout, "[C] "), "c\n");
    assert!(sink.payload(StreamKind::Stdout, "[S] ").is_empty());

    Ok(())
}

#[tokio::test]
async fn background_grandchild_does_not_hold_the_run() -> TestResult {
    init_tracing();

    let sink = MemorySink::new();
    // The backgrounded `sleep` inherits A's stdout and keeps it open for 3s
    // after A itself exited.
    let programs = vec![
        sh("[A] ", "sleep 3 & echo a"),
        sh("[B] ", "echo b"),
    ];

    let started = Instant::now();
    with_timeout(orchestrator(&sink).run_in_parallel(programs, false, &StaticArgs::none())).await?;
    let elapsed = started.elapsed();

    assert!(
        elapsed < Duration::from_millis(1500),
        "run blocked {elapsed:?} after both programs exited"
    );
    assert_eq!(sink.payload(StreamKind::Stdout, "[A] "), "a\n");
    assert_eq!(sink.payload(StreamKind::Stdout, "[B] "), "b\n");

    Ok(())
}

#[tokio::test]
async fn grandchild_output_after_exit_is_still_tagged_and_written() -> TestResult {
    init_tracing();

    let sink = MemorySink::new();
    let programs = vec![sh("[L] ", "(sleep 0.5; echo late) & echo early")];

    with_timeout(orchestrator(&sink).run_in_parallel(programs, false, &StaticArgs::none())).await?;
    assert_eq!(sink.payload(StreamKind::Stdout, "[L] "), "early\n");

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(sink.payload(StreamKind::Stdout, "[L] "), "early\nlate\n");

    Ok(())
}

#[tokio::test]
async fn spawn_failure_is_distinguishable() -> TestResult {
    init_tracing();

    let sink = MemorySink::new();
    let programs = vec![
        ProgramSpec::new("/nonexistent/parrun-missing-program").args(["--x"]),
        sh("[ok] ", "echo still runs"),
    ];

    let result =
        with_timeout(orchestrator(&sink).run_in_parallel(programs, false, &StaticArgs::none()))
            .await;

    match result {
        Err(err @ ParrunError::Spawn { .. }) => {
            assert_eq!(err.program(), Some("parrun-missing-program"));
            assert!(err.to_string().starts_with("failed to spawn 'parrun-missing-program --x'"));
        }
        other => panic!("expected Spawn error, got {other:?}"),
    }
    assert_eq!(sink.payload(StreamKind::Stdout, "[ok] "), "still runs\n");

    Ok(())
}

#[tokio::test]
async fn forwarded_flags_reach_the_child() -> TestResult {
    init_tracing();

    let sink = MemorySink::new();
    let source = CountingArgs {
        args: vec![
            ChildArg::with_value("--level", "3"),
            ChildArg::flag("--quiet"),
            ChildArg::flag("--own"),
        ],
        ..CountingArgs::default()
    };
    // `sh -c 'echo "$@"' argv0 ...` echoes the remaining arguments.
    let programs = vec![
        ProgramSpec::new("/bin/sh")
            .args(["-c", "echo \"$@\"", "argv0", "--own"])
            .prefix("[F] "),
        ProgramSpec::new("/bin/sh")
            .args(["-c", "echo \"$@\"", "argv0"])
            .prefix("[G] "),
    ];

    with_timeout(orchestrator(&sink).run_in_parallel(programs, true, &source)).await?;

    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        sink.payload(StreamKind::Stdout, "[F] "),
        "--own --level 3 --quiet\n"
    );
    assert_eq!(
        sink.payload(StreamKind::Stdout, "[G] "),
        "--level 3 --quiet --own\n"
    );

    Ok(())
}

#[tokio::test]
async fn forwarding_disabled_skips_the_source() -> TestResult {
    init_tracing();

    let sink = MemorySink::new();
    let source = CountingArgs {
        args: vec![ChildArg::flag("--quiet")],
        ..CountingArgs::default()
    };
    let programs = vec![ProgramSpec::new("/bin/sh")
        .args(["-c", "echo \"[$#]\"", "argv0"])
        .prefix("[N] ")];

    with_timeout(orchestrator(&sink).run_in_parallel(programs, false, &source)).await?;

    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    assert_eq!(sink.payload(StreamKind::Stdout, "[N] "), "[0]\n");

    Ok(())
}

#[tokio::test]
async fn empty_program_list_succeeds() -> TestResult {
    init_tracing();

    let sink = MemorySink::new();
    let source = CountingArgs::default();

    orchestrator(&sink).run_in_parallel(Vec::new(), true, &source).await?;

    assert!(sink.chunks().is_empty());
    assert_eq!(source.calls.load(Ordering::SeqCst), 0);

    Ok(())
}

#[tokio::test]
async fn program_runs_in_its_working_directory() -> TestResult {
    init_tracing();

    let dir = tempfile::tempdir()?;
    let sink = MemorySink::new();
    let programs = vec![sh("[D] ", "pwd").cwd(dir.path())];

    with_timeout(orchestrator(&sink).run_in_parallel(programs, false, &StaticArgs::none())).await?;

    let printed = sink.payload(StreamKind::Stdout, "[D] ");
    let expected = dir.path().canonicalize()?;
    assert_eq!(std::path::Path::new(printed.trim()).canonicalize()?, expected);

    Ok(())
}
