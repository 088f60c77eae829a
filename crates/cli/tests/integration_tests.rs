//! Integration tests driving the `cli` binary itself over stdin/stdout, one
//! process per test. Covers the REPL surface: table creation, the
//! tenant/table-scoped SET/GET/DEL/SCAN commands, explicit FLUSH/COMPACT,
//! STATS, and recovery across process restarts.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::tempdir;

/// Writes a minimal TOML config pointing the engine at `wal_dir`/`data_dir`,
/// with a small flush size so a handful of SETs is enough to exercise the
/// background flush path without an explicit FLUSH.
fn write_config(path: &Path, wal_dir: &Path, data_dir: &Path, flush_size: u64) -> String {
    let text = format!(
        "[wal]\ndir = {:?}\n\n[storage]\ndata_dir = {:?}\n\n[memtable]\nflush_size = {flush_size}\n",
        wal_dir.to_str().unwrap(),
        data_dir.to_str().unwrap(),
    );
    fs::write(path, &text).unwrap();
    text
}

fn run_cli_command(config_path: &Path, commands: &str) -> String {
    let mut child = Command::new("cargo")
        .args(["run", "-p", "cli", "--", "--config", config_path.to_str().unwrap()])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn cli");

    {
        let stdin = child.stdin.as_mut().expect("failed to open stdin");
        stdin.write_all(commands.as_bytes()).expect("failed to write commands");
        stdin.write_all(b"EXIT\n").expect("failed to write EXIT");
    }

    let output = child.wait_with_output().expect("failed to read output");
    String::from_utf8_lossy(&output.stdout).to_string()
}

struct TestEnv {
    _dir: tempfile::TempDir,
    config_path: std::path::PathBuf,
}

impl TestEnv {
    fn new(flush_size: u64) -> Self {
        let dir = tempdir().unwrap();
        let wal_dir = dir.path().join("wal");
        let data_dir = dir.path().join("data");
        let config_path = dir.path().join("riptide.toml");
        write_config(&config_path, &wal_dir, &data_dir, flush_size);
        Self { _dir: dir, config_path }
    }

    fn run(&self, commands: &str) -> String {
        run_cli_command(&self.config_path, commands)
    }
}

#[test]
fn test_basic_set_get() {
    let env = TestEnv::new(64 * 1024 * 1024);
    let output = env.run("CREATE acme widgets\nSET acme widgets key1 value1\nGET acme widgets key1\n");

    assert!(output.contains("OK"));
    assert!(output.contains("value1"));
}

#[test]
fn test_multiple_keys() {
    let env = TestEnv::new(64 * 1024 * 1024);
    let commands = "CREATE acme widgets\nSET acme widgets a 1\nSET acme widgets b 2\nSET acme widgets c 3\n\
                     GET acme widgets a\nGET acme widgets b\nGET acme widgets c\n";
    let output = env.run(commands);

    assert!(output.contains("1"));
    assert!(output.contains("2"));
    assert!(output.contains("3"));
}

#[test]
fn test_overwrite_key() {
    let env = TestEnv::new(64 * 1024 * 1024);
    let commands =
        "CREATE acme widgets\nSET acme widgets mykey oldvalue\nGET acme widgets mykey\nSET acme widgets mykey newvalue\nGET acme widgets mykey\n";
    let output = env.run(commands);

    assert!(output.contains("oldvalue"));
    assert!(output.contains("newvalue"));
}

#[test]
fn test_delete_key() {
    let env = TestEnv::new(64 * 1024 * 1024);
    let commands = "CREATE acme widgets\nSET acme widgets delme value\nGET acme widgets delme\nDEL acme widgets delme\nGET acme widgets delme\n";
    let output = env.run(commands);

    assert!(output.contains("value"));
    assert!(output.contains("(nil)"));
}

#[test]
fn test_range_scan() {
    let env = TestEnv::new(64 * 1024 * 1024);
    let mut commands = String::from("CREATE acme widgets\n");
    for i in 0..10 {
        commands.push_str(&format!("SET acme widgets key{i:02} value{i}\n"));
    }
    commands.push_str("SCAN acme widgets\n");
    commands.push_str("SCAN acme widgets key03 key07\n");

    let output = env.run(&commands);

    assert!(output.contains("key00"));
    assert!(output.contains("key09"));
}

#[test]
fn test_flush_to_file() {
    let env = TestEnv::new(64 * 1024 * 1024);
    let commands = "CREATE acme widgets\nSET acme widgets a 1\nSET acme widgets b 2\nFLUSH acme widgets\nGET acme widgets a\nGET acme widgets b\n";
    let output = env.run(commands);

    assert!(output.contains("OK"));
    assert!(output.contains('1'));
    assert!(output.contains('2'));
}

#[test]
fn test_auto_flush_on_threshold() {
    // A tiny flush_size forces the background flush worker to seal and
    // flush the active memtable well before the test is done writing.
    let env = TestEnv::new(1024);
    let mut commands = String::from("CREATE acme widgets\n");
    for i in 0..50 {
        commands.push_str(&format!("SET acme widgets key{i:03} value_with_some_data_{i}\n"));
    }
    commands.push_str("SCAN acme widgets\n");

    let output = env.run(&commands);

    assert!(output.contains("key000"));
    assert!(output.contains("key049"));
}

#[test]
fn test_compaction() {
    let env = TestEnv::new(64 * 1024 * 1024);
    let mut commands = String::from("CREATE acme batches\n");
    for batch in 0..3 {
        for i in 0..5 {
            commands.push_str(&format!("SET acme batches batch{batch}_key{i} val{}\n", batch * 10 + i));
        }
        commands.push_str("FLUSH acme batches\n");
    }
    commands.push_str("COMPACT\n");
    for batch in 0..3 {
        for i in 0..5 {
            commands.push_str(&format!("GET acme batches batch{batch}_key{i}\n"));
        }
    }

    let output = env.run(&commands);

    assert!(output.contains("val0"));
    assert!(output.contains("val10"));
}

#[test]
fn test_tombstone_in_range_scan() {
    let env = TestEnv::new(64 * 1024 * 1024);
    let commands = "CREATE acme widgets\nSET acme widgets a 1\nSET acme widgets b 2\nSET acme widgets c 3\n\
                     SET acme widgets d 4\nDEL acme widgets b\nFLUSH acme widgets\nSCAN acme widgets\n";
    let output = env.run(commands);

    let scan_section: Vec<&str> =
        output.lines().skip_while(|l| !l.contains("SCAN") && !l.contains("->")).take_while(|l| !l.contains("entries")).collect();
    let entry_count = output.lines().filter(|l| l.contains("->")).count();
    assert_eq!(entry_count, 3, "expected a, c, d only (b is tombstoned): {scan_section:?}");
}

#[test]
fn test_stats_output() {
    let env = TestEnv::new(64 * 1024 * 1024);
    let commands = "CREATE acme widgets\nSET acme widgets x 1\nSET acme widgets y 2\nFLUSH acme widgets\nSTATS\n";
    let output = env.run(commands);

    assert!(output.contains("Engine") && output.contains("acme"));
}

#[test]
fn test_quit_command() {
    let env = TestEnv::new(64 * 1024 * 1024);
    let output = env.run("CREATE acme widgets\nSET acme widgets foo bar\nQUIT\n");

    assert!(output.contains("OK"));
    assert!(output.contains("bye"));
}

#[test]
fn test_persistence_across_restarts() {
    let env = TestEnv::new(64 * 1024 * 1024);
    env.run("CREATE acme widgets\nSET acme widgets persist_key persist_value\nFLUSH acme widgets\n");

    let output2 = env.run("GET acme widgets persist_key\n");
    assert!(output2.contains("persist_value"));
}

#[test]
fn test_large_value() {
    let env = TestEnv::new(64 * 1024 * 1024);
    let large_value = "x".repeat(500);
    let commands = format!("CREATE acme widgets\nSET acme widgets large_key {large_value}\nGET acme widgets large_key\n");
    let output = env.run(&commands);

    assert!(output.contains('x'));
}

#[test]
fn test_drop_table() {
    let env = TestEnv::new(64 * 1024 * 1024);
    let commands = "CREATE acme widgets\nSET acme widgets a 1\nDROP acme widgets\nGET acme widgets a\n";
    let output = env.run(commands);

    assert!(output.contains("OK"));
    assert!(output.contains("ERR get failed"));
}

#[test]
fn test_sequential_get_after_multiple_operations() {
    let env = TestEnv::new(64 * 1024 * 1024);
    let mut commands = String::from("CREATE acme widgets\n");
    for i in 0..20 {
        commands.push_str(&format!("SET acme widgets seq_key{i:02} value{i}\n"));
    }
    for _ in 0..3 {
        commands.push_str("FLUSH acme widgets\n");
    }
    for i in (0..20).step_by(2) {
        commands.push_str(&format!("SET acme widgets seq_key{i:02} updated{i}\n"));
    }
    for i in 0..20 {
        commands.push_str(&format!("GET acme widgets seq_key{i:02}\n"));
    }

    let output = env.run(&commands);

    assert!(output.contains("updated0"));
    assert!(output.contains("value1"));
}

#[test]
fn test_mixed_operations_stress() {
    let env = TestEnv::new(64 * 1024 * 1024);
    let mut commands = String::from("CREATE acme widgets\n");
    for i in 0..30 {
        match i % 4 {
            0 => commands.push_str(&format!("SET acme widgets stress_k{i} stress_v{i}\n")),
            1 => commands.push_str(&format!("GET acme widgets stress_k{i}\n")),
            2 => commands.push_str(&format!("DEL acme widgets stress_k{}\n", (i - 2).max(0))),
            _ => commands.push_str("FLUSH acme widgets\n"),
        }
    }
    commands.push_str("SCAN acme widgets\n");

    let output = env.run(&commands);

    assert!(!output.is_empty());
}
