use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;

fn scratch_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("vinecop_cli_test_{}_{name}", std::process::id()));
    path
}

fn write_independent_data(path: &PathBuf) {
    let mut text = String::new();
    for i in 0..200_u32 {
        let u = (f64::from(i) + 0.5) / 200.0;
        let v = (f64::from((i * 37 + 11) % 200) + 0.5) / 200.0;
        text.push_str(&format!("{u},{v}\n"));
    }
    fs::write(path, text).unwrap();
}

#[test]
fn fit_then_inspect_then_simulate() {
    let data_path = scratch_path("data.csv");
    let model_path = scratch_path("model.json");
    let sim_path = scratch_path("sim.csv");
    write_independent_data(&data_path);

    Command::cargo_bin("vinecop")
        .unwrap()
        .args([
            "fit",
            data_path.to_str().unwrap(),
            "--criterion",
            "bic",
            "-o",
            model_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert!(model_path.exists());

    Command::cargo_bin("vinecop")
        .unwrap()
        .args(["inspect", model_path.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("family"));

    Command::cargo_bin("vinecop")
        .unwrap()
        .args([
            "simulate",
            model_path.to_str().unwrap(),
            "-n",
            "20",
            "--seed",
            "7",
            "-o",
            sim_path.to_str().unwrap(),
        ])
        .assert()
        .success();

    let simulated = fs::read_to_string(&sim_path).unwrap();
    assert_eq!(simulated.lines().count(), 20);

    let _ = fs::remove_file(&data_path);
    let _ = fs::remove_file(&model_path);
    let _ = fs::remove_file(&sim_path);
}

#[test]
fn missing_model_file_fails_cleanly() {
    Command::cargo_bin("vinecop")
        .unwrap()
        .args(["inspect", "/nonexistent/path/model.json"])
        .assert()
        .failure();
}

#[test]
fn verify_cli_help() {
    Command::cargo_bin("vinecop")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("fit"))
        .stdout(predicate::str::contains("simulate"))
        .stdout(predicate::str::contains("inspect"));
}
