use std::process::{Command, Output};

const BIN: &str = env!("CARGO_BIN_EXE_deploy-contracts");

/// Runs the binary in an empty working directory (so no `.env` file gets
/// picked up) with the given environment.
fn deploy(env: &[(&str, &str)]) -> Output {
    let cwd = tempfile::tempdir().unwrap();
    let mut command = Command::new(BIN);
    command.current_dir(cwd.path());
    for var in [
        "RPC_ENDPOINT",
        "DEPLOYER_ADDRESS",
        "DEPLOYER_PRIVATE_KEY",
        "CHAIN_ID",
        "ARTIFACTS_DIR",
    ] {
        command.env_remove(var);
    }
    command.envs(env.iter().copied());
    command.output().unwrap()
}

fn console(output: &Output) -> String {
    format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

#[test]
fn missing_artifacts_exit_with_failure() {
    let artifacts = tempfile::tempdir().unwrap();

    let output = deploy(&[
        // Nothing listens on the discard port; reaching the network would
        // produce a different error.
        ("RPC_ENDPOINT", "http://127.0.0.1:9/rpc"),
        ("DEPLOYER_ADDRESS", "0x1"),
        ("DEPLOYER_PRIVATE_KEY", "0x2"),
        ("ARTIFACTS_DIR", artifacts.path().to_str().unwrap()),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let console = console(&output);
    assert_eq!(
        console.matches("Failed to read contract files").count(),
        1,
        "{console}"
    );
    assert!(
        console.contains("match_starknet_contracts_ERC20.contract_class.json"),
        "{console}"
    );
}

#[test]
fn missing_configuration_exits_with_failure() {
    let output = deploy(&[
        ("DEPLOYER_ADDRESS", "0x1"),
        ("DEPLOYER_PRIVATE_KEY", "0x2"),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let console = console(&output);
    assert_eq!(
        console.matches("RPC_ENDPOINT is not set").count(),
        1,
        "{console}"
    );
    assert!(!console.contains("Failed to read contract files"), "{console}");
}
