use {
    clap::Parser,
    std::{path::PathBuf, time::Duration},
    tracing::level_filters::LevelFilter,
};

#[derive(Parser)]
pub struct LoggingArguments {
    #[clap(long, env, default_value = "warn,deploy_contracts=info")]
    pub log_filter: String,

    /// Events at this level or more severe are written to stderr.
    #[clap(long, env, default_value = "error")]
    pub log_stderr_threshold: LevelFilter,

    /// Emit log events as JSON.
    #[clap(long, env)]
    pub use_json_logs: bool,
}

/// Declares the token contract and deploys the manager contract referencing
/// it.
#[derive(Parser)]
#[command(version)]
pub struct Arguments {
    #[clap(flatten)]
    pub logging: LoggingArguments,

    /// The Starknet JSON-RPC endpoint to connect to.
    #[clap(long, env, default_value = "")]
    pub rpc_endpoint: String,

    /// Address of the account paying for the declare and deploy transactions.
    #[clap(long, env, default_value = "")]
    pub deployer_address: String,

    /// Private key of the deployer account.
    #[clap(long, env, default_value = "", hide_env_values = true)]
    pub deployer_private_key: String,

    /// Chain ID as hex or Cairo short string (e.g. `SN_SEPOLIA`). Queried from
    /// the node when not set.
    #[clap(long, env)]
    pub chain_id: Option<String>,

    /// Directory containing the `*.contract_class.json` and
    /// `*.compiled_contract_class.json` build artifacts.
    #[clap(long, env, default_value = "target/dev")]
    pub artifacts_dir: PathBuf,

    /// Artifact name of the contract whose class hash gets passed to the
    /// manager constructor.
    #[clap(long, env, default_value = "match_starknet_contracts_ERC20")]
    pub token_contract: String,

    /// Artifact name of the contract that gets deployed.
    #[clap(
        long,
        env,
        default_value = "match_starknet_contracts_LifeSourceManager"
    )]
    pub manager_contract: String,

    /// Name of the manager constructor argument receiving the token class
    /// hash.
    #[clap(long, env, default_value = "class_hash")]
    pub class_hash_argument: String,

    /// How long to wait between polls for a transaction receipt.
    #[clap(
        long,
        env,
        default_value = "5s",
        value_parser = humantime::parse_duration,
    )]
    pub confirmation_poll_interval: Duration,
}

impl std::fmt::Display for Arguments {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let Self {
            logging,
            rpc_endpoint,
            deployer_address,
            deployer_private_key: _,
            chain_id,
            artifacts_dir,
            token_contract,
            manager_contract,
            class_hash_argument,
            confirmation_poll_interval,
        } = self;

        writeln!(f, "log_filter: {}", logging.log_filter)?;
        writeln!(f, "log_stderr_threshold: {}", logging.log_stderr_threshold)?;
        writeln!(f, "use_json_logs: {}", logging.use_json_logs)?;
        writeln!(f, "rpc_endpoint: {rpc_endpoint}")?;
        writeln!(f, "deployer_address: {deployer_address}")?;
        writeln!(f, "deployer_private_key: SECRET")?;
        writeln!(f, "chain_id: {chain_id:?}")?;
        writeln!(f, "artifacts_dir: {}", artifacts_dir.display())?;
        writeln!(f, "token_contract: {token_contract}")?;
        writeln!(f, "manager_contract: {manager_contract}")?;
        writeln!(f, "class_hash_argument: {class_hash_argument}")?;
        writeln!(f, "confirmation_poll_interval: {confirmation_poll_interval:?}")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_hides_private_key() {
        let args = Arguments::parse_from([
            "deploy-contracts",
            "--rpc-endpoint",
            "http://localhost:5050",
            "--deployer-address",
            "0x1234",
            "--deployer-private-key",
            "0xdeadbeef",
        ]);

        let printed = args.to_string();
        assert!(printed.contains("deployer_address: 0x1234"));
        assert!(printed.contains("deployer_private_key: SECRET"));
        assert!(!printed.contains("0xdeadbeef"));
    }

    #[test]
    fn parses_poll_interval() {
        let args = Arguments::parse_from([
            "deploy-contracts",
            "--confirmation-poll-interval",
            "250ms",
        ]);

        assert_eq!(args.confirmation_poll_interval, Duration::from_millis(250));
        assert_eq!(args.class_hash_argument, "class_hash");
    }
}
