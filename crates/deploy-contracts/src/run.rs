use {
    crate::{
        arguments::Arguments,
        artifact,
        chain::{Chain, StarknetChain},
        config::{self, Config},
        deploy::{self, ContractHandle, Contracts},
    },
    clap::Parser,
    std::process::ExitCode,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration")]
    Config(#[from] config::Error),
    #[error("Failed to read contract files")]
    Artifacts(#[from] artifact::Error),
    #[error(transparent)]
    Deploy(#[from] anyhow::Error),
}

/// Entry point of the binary.
pub async fn start(args: impl Iterator<Item = String>) -> ExitCode {
    // Settings may come from a `.env` file in the working directory.
    match dotenvy::dotenv() {
        Err(err) if !err.not_found() => eprintln!("ignoring unreadable .env file: {err}"),
        _ => (),
    }
    let args = Arguments::parse_from(args);
    observe::tracing::initialize(&logging_config(&args));
    tracing::info!("running deploy-contracts with arguments:\n{args}");

    let result = run(args).await;
    let status = exit_status(&result);
    match result {
        Ok(contract) => {
            tracing::debug!(
                constructor = ?contract.abi().constructor(),
                "bound contract handle"
            );
            println!(
                "Contract has been deployed with the address: {:#x}",
                contract.address()
            );
        }
        Err(err) => eprintln!("{}", report(err)),
    }
    ExitCode::from(status)
}

/// Validates the configuration, loads the artifacts and runs the deploy
/// pipeline. Nothing is sent to the node before both artifact pairs were
/// read successfully.
pub async fn run(args: Arguments) -> Result<ContractHandle, Error> {
    let config = Config::try_from(&args)?;
    println!("ACCOUNT_ADDRESS= {:#x}", config.deployer_address);

    let contracts = load_contracts(&config).await?;

    let chain = StarknetChain::connect(&config).await?;
    println!("Account {:#x} connected.", chain.deployer_address());

    Ok(deploy::execute(&chain, &contracts, &config.class_hash_argument).await?)
}

fn logging_config(args: &Arguments) -> observe::Config {
    let mut config = observe::Config::default().with_env_filter(&args.logging.log_filter);
    if let Some(level) = args.logging.log_stderr_threshold.into_level() {
        config = config.with_stderr_threshold(level);
    }
    if args.logging.use_json_logs {
        config = config.with_json_format();
    }
    config
}

async fn load_contracts(config: &Config) -> Result<Contracts, artifact::Error> {
    let dir = &config.artifacts_dir;
    Ok(Contracts {
        token: artifact::load(dir, &config.token_contract).await?,
        manager: artifact::load(dir, &config.manager_contract).await?,
    })
}

/// The error headline followed by its causes, e.g. `Failed to read contract
/// files` and the path that could not be read.
fn report(err: Error) -> String {
    format!("{:?}", anyhow::Error::from(err))
}

/// `0` on success, `1` on any failure.
pub fn exit_status<T>(result: &Result<T, Error>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            chain::{Deployment, MockChain},
            tests::fixtures,
        },
        starknet::core::types::Felt,
    };

    fn arguments(artifacts_dir: &std::path::Path) -> Arguments {
        Arguments::parse_from([
            "deploy-contracts",
            "--rpc-endpoint",
            // Nothing listens here, any request would fail.
            "http://127.0.0.1:9/rpc",
            "--deployer-address",
            "0x1",
            "--deployer-private-key",
            "0x2",
            "--chain-id",
            "SN_SEPOLIA",
            "--token-contract",
            fixtures::TOKEN,
            "--manager-contract",
            fixtures::MANAGER,
            "--artifacts-dir",
            artifacts_dir.to_str().unwrap(),
        ])
    }

    #[tokio::test]
    async fn missing_artifacts_fail_before_connecting() {
        let dir = tempfile::tempdir().unwrap();

        let result = run(arguments(dir.path())).await;

        assert!(matches!(
            result,
            Err(Error::Artifacts(artifact::Error::NotFound(_)))
        ));
        assert_eq!(exit_status(&result), 1);
        assert_eq!(
            result.unwrap_err().to_string(),
            "Failed to read contract files"
        );
    }

    #[test]
    fn logging_arguments_configure_observe() {
        let args = Arguments::parse_from([
            "deploy-contracts",
            "--log-filter",
            "debug",
            "--log-stderr-threshold",
            "warn",
            "--use-json-logs",
        ]);

        let config = format!("{:?}", logging_config(&args));

        assert!(config.contains(r#"env_filter: "debug""#), "{config}");
        assert!(config.contains("stderr_threshold: Some("), "{config}");
        assert!(config.contains("use_json_format: true"), "{config}");
    }

    #[test]
    fn reports_failures_once_with_their_cause() {
        let printed = report(Error::Config(config::Error::Missing("RPC_ENDPOINT")));

        assert!(printed.starts_with("invalid configuration"), "{printed}");
        assert_eq!(printed.matches("RPC_ENDPOINT is not set").count(), 1);

        let path = std::path::PathBuf::from("target/dev/token.contract_class.json");
        let printed = report(Error::Artifacts(artifact::Error::NotFound(path)));

        assert!(printed.starts_with("Failed to read contract files"), "{printed}");
        assert!(printed.contains("token.contract_class.json"), "{printed}");
    }

    #[tokio::test]
    async fn invalid_configuration_fails_first() {
        let mut args = arguments(std::path::Path::new("/nonexistent"));
        args.deployer_private_key = String::new();

        let result = run(args).await;

        assert!(matches!(
            result,
            Err(Error::Config(config::Error::Missing("DEPLOYER_PRIVATE_KEY")))
        ));
        assert_eq!(exit_status(&result), 1);
    }

    #[tokio::test]
    async fn full_sequence_succeeds() {
        let dir = fixtures::artifacts_dir();
        let config = Config::try_from(&arguments(dir.path())).unwrap();
        let contracts = load_contracts(&config).await.unwrap();
        let manager_class_hash = contracts.manager.class_hash;

        let mut chain = MockChain::new();
        chain.expect_is_declared().returning(|_| Ok(false));
        chain
            .expect_declare()
            .returning(|class, _| Ok(class.class_hash()));
        chain.expect_deploy().returning(|_, _, salt| {
            Ok(Deployment {
                address: salt + Felt::ONE,
                transaction_hash: salt,
            })
        });
        chain.expect_wait_for_transaction().returning(|_| Ok(()));
        chain
            .expect_class_hash_at()
            .returning(move |_| Ok(manager_class_hash));

        let result = deploy::execute(&chain, &contracts, &config.class_hash_argument)
            .await
            .map_err(Error::from);

        assert_eq!(exit_status(&result), 0);
        assert_ne!(result.unwrap().address(), Felt::ZERO);
    }
}
