use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

fn get_binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_dsynth"))
}

/// Write `content` to a per-test problem file in the temp directory
fn problem_file(name: &str, content: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("dsynth_{}_{}.syn", name, std::process::id()));
    fs::write(&path, content).expect("Failed to write problem file");
    path
}

fn run(args: &[&str]) -> Output {
    Command::new(get_binary_path())
        .args(args)
        .output()
        .expect("Failed to execute dsynth")
}

fn stdout_of(output: &Output) -> String {
    if !output.status.success() {
        panic!(
            "Command failed with status: {:?}\nstderr: {}\nstdout: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr),
            String::from_utf8_lossy(&output.stdout)
        );
    }
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_synth_basic_functionality() {
    let path = problem_file(
        "successor",
        "# successor\ninput x: int\noutput y: int\nconstraint y == x + 1\n",
    );
    let output = run(&["synth", path.to_str().unwrap()]);
    let _ = fs::remove_file(&path);
    let stdout = stdout_of(&output);

    assert!(stdout.contains("Solution found!"), "Should report a solution");
    assert!(stdout.contains("Program:"), "Should print the program");
    assert!(stdout.contains("Placeholder: no"), "Should not fall back");
    assert!(stdout.contains("Statistics:"), "Should print statistics");
    assert!(stdout.contains("Expansions:"), "Should count expansions");
}

#[test]
fn test_synth_show_and_dump_tree() {
    let path = problem_file(
        "abs",
        "input x: int\noutput y: int\nconstraint (x >= 0 && y == x) || (x < 0 && y == -x)\n",
    );
    let dump = std::env::temp_dir().join(format!("dsynth_tree_{}.json", std::process::id()));
    let output = run(&[
        "synth",
        path.to_str().unwrap(),
        "--show-tree",
        "--dump-tree",
        dump.to_str().unwrap(),
        "--cost-metric",
        "depth",
    ]);
    let _ = fs::remove_file(&path);
    let stdout = stdout_of(&output);

    assert!(stdout.contains("Derivation tree:"), "Should print the tree");
    assert!(stdout.contains("case-split"), "Tree should mention the case split");
    assert!(stdout.contains("Wrote derivation tree"), "Should confirm the dump");

    let json = fs::read_to_string(&dump).expect("Tree dump should exist");
    let _ = fs::remove_file(&dump);
    let value: serde_json::Value = serde_json::from_str(&json).expect("Dump should be JSON");
    assert!(value["tasks"].as_array().map_or(false, |t| t.len() > 1));
    assert!(value["alternatives"].is_array());
}

#[test]
fn test_synth_placeholder_when_stuck() {
    let path = problem_file("root", "input x: int\noutput y: int\nconstraint y * y == x\n");
    let output = run(&["synth", path.to_str().unwrap()]);
    let _ = fs::remove_file(&path);
    let stdout = stdout_of(&output);

    assert!(stdout.contains("Placeholder: yes"), "Should fall back to choose");
    assert!(stdout.contains("choose("), "Program should contain the placeholder");
}

#[test]
fn test_synth_expansion_budget() {
    let path = problem_file(
        "budget",
        "input x: int\noutput y: int\nconstraint (x >= 0 && y == x) || (x < 0 && y == -x)\n",
    );
    let output = run(&["synth", path.to_str().unwrap(), "--max-expansions", "0"]);
    let _ = fs::remove_file(&path);
    let stdout = stdout_of(&output);

    assert!(stdout.contains("Budget exceeded"), "Should report the budget");
    assert!(stdout.contains("Placeholder: yes"));
}

#[test]
fn test_synth_without_timeout() {
    let path = problem_file("unbounded", "input x: int\noutput y: int\nconstraint y == x - 2\n");
    let output = run(&["synth", path.to_str().unwrap(), "--timeout", "0"]);
    let _ = fs::remove_file(&path);
    let stdout = stdout_of(&output);

    assert!(stdout.contains("Solution found!"), "Zero timeout means no limit");
    assert!(stdout.contains("Placeholder: no"));
}

#[test]
fn test_synth_rejects_malformed_problem() {
    let path = problem_file("bad", "input x: int\noutput y: int\nconstraint y == z\n");
    let output = run(&["synth", path.to_str().unwrap()]);
    let _ = fs::remove_file(&path);

    assert!(!output.status.success(), "Undeclared variable should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("z"), "Error should name the variable: {}", stderr);
}

#[test]
fn test_decide_verdicts() {
    let stdout = stdout_of(&run(&["decide", "a && b ==> a", "--var", "a:bool", "--var", "b:bool"]));
    assert!(stdout.contains("Verdict: proved"), "Got: {}", stdout);

    let stdout = stdout_of(&run(&[
        "decide",
        "x < 3",
        "--var",
        "x: int",
        "--backend",
        "enumerative",
    ]));
    assert!(stdout.contains("Verdict: refuted"), "Got: {}", stdout);
    assert!(stdout.contains("Backends: enumerative"));
}

#[test]
fn test_invalid_arguments() {
    let output = run(&["decide", "x == x", "--backend", "oracle-of-delphi"]);
    assert!(!output.status.success(), "Unknown backend should be rejected");

    let output = run(&[]);
    assert!(!output.status.success(), "Missing subcommand should print help");
}
