//! CLI tests for the `scpi tree` subcommand.

use std::process::Command;

use assert_cmd::cargo;

fn scpi_cmd() -> Command {
    Command::new(cargo::cargo_bin!("scpi"))
}

#[test]
fn tree_dumps_the_demo_command_set() {
    let output = scpi_cmd().arg("tree").output().expect("run tree command");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json: serde_json::Value = serde_json::from_str(&stdout).expect("valid json");

    let commands = json["commands"].as_array().expect("commands array");
    assert_eq!(
        json["registered_commands"].as_u64().map(|n| n as usize),
        Some(commands.len())
    );
    let paths: Vec<&str> = commands
        .iter()
        .filter_map(|c| c["path"].as_str())
        .collect();
    assert!(paths.contains(&"*IDN?"));
    assert!(paths.contains(&"SYSTem:LED:BRIGhtness?"));
    assert!(paths.contains(&"OUTPut#:STATe"));
    assert_eq!(json["pending_errors"], 0);
}
