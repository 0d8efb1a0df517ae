#![cfg(unix)]

use std::{
    io::Read,
    process::{Command, Stdio},
    thread,
    time::{Duration, Instant},
};

#[test]
fn ctrl_c_at_the_filter_prompt_exits_with_a_message() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("job_listings.csv");
    std::fs::write(&output, "Title,Skills Required\nData Analyst,\"['Python', 'Excel']\"\n").unwrap();

    let mut child = Command::new(env!("CARGO_BIN_EXE_job-scraper"))
        .arg("--config")
        .arg(dir.path().join("absent.toml"))
        .arg("--filter-only")
        .arg("--output")
        .arg(&output)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    // Held open so the prompt keeps waiting instead of seeing end of input.
    let _stdin = child.stdin.take();

    thread::sleep(Duration::from_secs(2));
    let sent = Command::new("kill").arg("-INT").arg(child.id().to_string()).status().unwrap();
    assert!(sent.success());

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() >= deadline {
            child.kill().unwrap();
            panic!("still running 10s after ctrl+c");
        }
        thread::sleep(Duration::from_millis(50));
    };

    let mut printed = String::new();
    child.stdout.take().unwrap().read_to_string(&mut printed).unwrap();
    assert!(status.success(), "exited with {status}");
    assert!(printed.contains("Enter skills to filter by"), "{printed}");
    assert!(printed.ends_with("\nInterrupted, exiting...\n"), "{printed}");
}
