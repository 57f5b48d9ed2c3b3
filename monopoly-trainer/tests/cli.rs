use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "monopoly-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_writes_json_report() {
    let exe = env!("CARGO_BIN_EXE_monopoly-trainer");
    let output_path = temp_path("json");
    let output = Command::new(exe)
        .args([
            "--episodes",
            "5",
            "--max-steps",
            "60",
            "--seeds",
            "11",
            "--report",
            "json",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Monopoly Monte Carlo Trainer"));
    let content = std::fs::read_to_string(output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("json report");
    assert_eq!(report["seeds"][0]["seed"], 11);
    assert_eq!(report["seeds"][0]["episodes"], 5);
}

#[test]
fn cli_streams_turn_log_and_value_table_per_seed() {
    let exe = env!("CARGO_BIN_EXE_monopoly-trainer");
    let log_path = temp_path("log").with_extension("csv");
    let table_path = temp_path("table").with_extension("json");
    let report_path = temp_path("md");
    let status = Command::new(exe)
        .args([
            "--episodes",
            "3",
            "--max-steps",
            "40",
            "--seeds",
            "1..2",
            "--report",
            "markdown",
            "--log-csv",
        ])
        .arg(&log_path)
        .arg("--q-table")
        .arg(&table_path)
        .arg("--output")
        .arg(&report_path)
        .status()
        .expect("run cli");
    assert!(status.success());

    for seed in [1, 2] {
        let stem = log_path.file_stem().unwrap().to_string_lossy().into_owned();
        let log = log_path.with_file_name(format!("{stem}-{seed}.csv"));
        let text = std::fs::read_to_string(&log).expect("read turn log");
        assert!(text.starts_with(
            "episode_id,step,player,position_before,dice_roll,landed_on_position,position_after"
        ));
        assert!(text.lines().count() > 1);

        let stem = table_path.file_stem().unwrap().to_string_lossy().into_owned();
        let table = table_path.with_file_name(format!("{stem}-{seed}.json"));
        let entries: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&table).expect("read table"))
                .expect("value table json");
        assert!(entries.as_array().is_some_and(|rows| !rows.is_empty()));
    }

    let report = std::fs::read_to_string(report_path).expect("read report");
    assert!(report.contains("# Monopoly Training Report"));
    assert!(report.contains("## Seed 2"));
}

#[test]
fn cli_rejects_out_of_range_epsilon() {
    let exe = env!("CARGO_BIN_EXE_monopoly-trainer");
    let output = Command::new(exe)
        .args(["--episodes", "1", "--epsilon", "1.5"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("epsilon"));
}
