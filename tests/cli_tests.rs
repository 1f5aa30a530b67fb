// Drives the spkmeans binary as a subprocess.

use std::io::Write;
use std::process::{Command, Output};

use tempfile::Builder;

fn spkmeans(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_spkmeans"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to launch spkmeans")
}

fn temp_file(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn stdout_of(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

#[test]
fn spk_prints_indices_then_centroids() {
    let input = temp_file(".txt", "0.0,0.0\n0.2,0.1\n8.0,8.0\n8.1,7.9\n");
    let output = spkmeans(&["2", "spk", input.path().to_str().unwrap()]);
    assert!(output.status.success());

    let text = stdout_of(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3, "unexpected output:\n{}", text);
    let indices: Vec<usize> = lines[0].split(',').map(|s| s.parse().unwrap()).collect();
    assert_eq!(indices.len(), 2);
    assert!(indices.iter().all(|&i| i < 4));
    for centroid in &lines[1..] {
        let values: Vec<&str> = centroid.split(',').collect();
        assert_eq!(values.len(), 2);
        assert!(values.iter().all(|v| v.split('.').nth(1).map(str::len) == Some(4)));
    }
}

#[test]
fn lnorm_prints_unit_diagonal() {
    let input = temp_file(".csv", "1,2\n2,1\n4,4\n");
    let output = spkmeans(&["0", "lnorm", input.path().to_str().unwrap()]);
    assert!(output.status.success());
    let text = stdout_of(&output);
    for (i, line) in text.lines().enumerate() {
        assert_eq!(line.split(',').nth(i), Some("1.0000"));
    }
}

#[test]
fn json_flag_emits_parseable_json() {
    let input = temp_file(".csv", "1,2\n2,1\n4,4\n");
    let output = spkmeans(&["0", "wam", input.path().to_str().unwrap(), "--json"]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["kind"], "matrix");
}

#[test]
fn config_file_is_applied() {
    let input = temp_file(".csv", "0.0,0.0\n0.2,0.1\n8.0,8.0\n8.1,7.9\n");
    let config = temp_file(".json", r#"{"seed": 3, "kmeans": {"max_iterations": 1}}"#);
    let output = spkmeans(&[
        "2",
        "spk",
        input.path().to_str().unwrap(),
        "--config",
        config.path().to_str().unwrap(),
        "--json",
    ]);
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["iterations"], 1);
    assert_eq!(value["assignments"].as_array().unwrap().len(), 4);
}

#[test]
fn invalid_input_reports_and_exits_with_one() {
    let good = temp_file(".csv", "1,2\n2,1\n");
    let bad_ext = temp_file(".dat", "1,2\n2,1\n");
    let cases: Vec<Vec<&str>> = vec![
        vec!["2", "bogus", good.path().to_str().unwrap()],
        vec!["2", "wam", bad_ext.path().to_str().unwrap()],
        vec!["1", "spk", good.path().to_str().unwrap()],
        vec!["notanumber", "wam", good.path().to_str().unwrap()],
        vec!["2", "wam"],
    ];
    for args in cases {
        let output = spkmeans(&args);
        assert_eq!(output.status.code(), Some(1), "args {:?}", args);
        assert_eq!(stdout_of(&output).trim(), "Invalid Input!", "args {:?}", args);
    }
}
