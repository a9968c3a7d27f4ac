//! Ctrl-C handling of the `download` command.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::thread::sleep;
use std::time::{Duration, Instant};

const HANGING_STUB: &str = r#"#!/bin/sh
if [ "$1" = "--version" ]; then
  echo "2024.01.01"
  exit 0
fi
touch "$(dirname "$0")/started"
exec sleep 20
"#;

fn send_interrupt(child: &Child) {
    let status = Command::new("kill")
        .args(["-INT", &child.id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());
}

fn wait_for(path: &Path, timeout: Duration) {
    let deadline = Instant::now() + timeout;
    while !path.exists() {
        assert!(Instant::now() < deadline, "{} never appeared", path.display());
        sleep(Duration::from_millis(50));
    }
}

#[test]
fn second_interrupt_aborts_a_stuck_download() {
    let dir = tempfile::tempdir().unwrap();
    let stub = dir.path().join("yt-dlp");
    std::fs::write(&stub, HANGING_STUB).unwrap();
    std::fs::set_permissions(&stub, std::fs::Permissions::from_mode(0o755)).unwrap();
    std::fs::write(
        dir.path().join("config.yaml"),
        format!(
            "provider:\n  yt_dlp_path: {}\n  languages: [en]\n  allow_auto_captions: true\n  fallback_to_any_language: true\n  http_timeout_secs: 5\napp:\n  output_dir: null\n  item_delay_ms: 0\n  default_report_format: text\n",
            stub.display()
        ),
    )
    .unwrap();

    let mut child = Command::new(assert_cmd::cargo::cargo_bin("playlist-transcripts"))
        .args(["download", "--quiet", "PLrAXtmErZgOeiKm4sgNOknGvNjby9efdf"])
        .current_dir(dir.path())
        .env("HOME", dir.path())
        .env("XDG_CONFIG_HOME", dir.path().join(".config"))
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    // The playlist lookup is hanging inside the stub at this point
    wait_for(&dir.path().join("started"), Duration::from_secs(20));
    sleep(Duration::from_millis(200));

    send_interrupt(&child);
    sleep(Duration::from_millis(300));
    assert!(
        child.try_wait().unwrap().is_none(),
        "first interrupt should only request cancellation"
    );

    send_interrupt(&child);
    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() >= deadline {
            child.kill().unwrap();
            panic!("process kept running after the second interrupt");
        }
        sleep(Duration::from_millis(50));
    };

    assert_eq!(status.code(), Some(130));
}
