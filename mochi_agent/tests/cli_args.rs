//! CLI arg handling for mochi_agent
use std::process::Command;

#[test]
fn help_prints_usage_and_exits_cleanly() {
    let exe = env!("CARGO_BIN_EXE_mochi_agent");
    for flag in ["--help", "-h"] {
        let out = Command::new(exe).arg(flag).output().expect("run agent");
        assert!(out.status.success());
        let stdout = String::from_utf8_lossy(&out.stdout);
        assert!(stdout.contains("Usage:"), "{stdout}");
    }
}

#[test]
fn bad_port_is_reported_without_starting() {
    let out = assert_cmd::Command::cargo_bin("mochi_agent")
        .unwrap()
        .args(["--port", "seventy"])
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Invalid port"), "{stderr}");
}

#[test]
fn unexpected_argument_exits_non_zero() {
    let out = assert_cmd::Command::cargo_bin("mochi_agent")
        .unwrap()
        .arg("--bogus")
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Unexpected argument '--bogus'"), "{stderr}");
}

#[test]
fn short_and_long_port_flags_start_the_agent() {
    let exe = env!("CARGO_BIN_EXE_mochi_agent");
    for args in [["-p", "0"], ["--port", "0"]] {
        let mut child = Command::new(exe).args(args).spawn().expect("spawn agent");
        // Give it a moment to bind
        std::thread::sleep(std::time::Duration::from_millis(150));
        assert!(child.try_wait().unwrap().is_none(), "agent exited early");
        let _ = child.kill();
        let _ = child.wait();
    }
}
