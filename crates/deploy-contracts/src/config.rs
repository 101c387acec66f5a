//! Validated runtime configuration.
//!
//! The raw [`Arguments`] accept empty strings for the connection settings so
//! that missing environment variables surface here, with a message naming the
//! variable, before any file is read or request is sent.

use {
    crate::arguments::Arguments,
    starknet::core::{types::Felt, utils::cairo_short_string_to_felt},
    std::{path::PathBuf, time::Duration},
    url::Url,
};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("{name} is not a valid URL")]
    Url {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("{name} is not a valid field element: {reason}")]
    Felt { name: &'static str, reason: String },
    #[error("DEPLOYER_PRIVATE_KEY must not be zero")]
    ZeroPrivateKey,
}

pub struct Config {
    pub rpc_endpoint: Url,
    pub deployer_address: Felt,
    pub(crate) private_key: Felt,
    pub chain_id: Option<Felt>,
    pub artifacts_dir: PathBuf,
    pub token_contract: String,
    pub manager_contract: String,
    pub class_hash_argument: String,
    pub confirmation_poll_interval: Duration,
}

impl TryFrom<&Arguments> for Config {
    type Error = Error;

    fn try_from(args: &Arguments) -> Result<Self, Self::Error> {
        let rpc_endpoint = required("RPC_ENDPOINT", &args.rpc_endpoint)?;
        let rpc_endpoint = Url::parse(rpc_endpoint).map_err(|source| Error::Url {
            name: "RPC_ENDPOINT",
            source,
        })?;
        let deployer_address = felt(
            "DEPLOYER_ADDRESS",
            required("DEPLOYER_ADDRESS", &args.deployer_address)?,
        )?;
        let private_key = felt(
            "DEPLOYER_PRIVATE_KEY",
            required("DEPLOYER_PRIVATE_KEY", &args.deployer_private_key)?,
        )?;
        if private_key == Felt::ZERO {
            return Err(Error::ZeroPrivateKey);
        }
        // A blank `CHAIN_ID=` line counts as not configured.
        let chain_id = args
            .chain_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(chain_id)
            .transpose()?;

        Ok(Self {
            rpc_endpoint,
            deployer_address,
            private_key,
            chain_id,
            artifacts_dir: args.artifacts_dir.clone(),
            token_contract: args.token_contract.clone(),
            manager_contract: args.manager_contract.clone(),
            class_hash_argument: args.class_hash_argument.clone(),
            confirmation_poll_interval: args.confirmation_poll_interval,
        })
    }
}

fn required<'a>(name: &'static str, value: &'a str) -> Result<&'a str, Error> {
    match value.trim() {
        "" => Err(Error::Missing(name)),
        value => Ok(value),
    }
}

fn felt(name: &'static str, value: &str) -> Result<Felt, Error> {
    Felt::from_hex(value).map_err(|err| Error::Felt {
        name,
        reason: err.to_string(),
    })
}

/// Chain IDs are usually given as short strings (`SN_MAIN`, `SN_SEPOLIA`) but
/// hex encoded values are accepted too.
fn chain_id(value: &str) -> Result<Felt, Error> {
    if let Some(digits) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        return felt("CHAIN_ID", &format!("0x{digits}"));
    }
    cairo_short_string_to_felt(value).map_err(|err| Error::Felt {
        name: "CHAIN_ID",
        reason: err.to_string(),
    })
}
