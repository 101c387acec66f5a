//! Boundary to the Starknet node.
//!
//! The deploy pipeline only talks to the network through [`Chain`] so it can
//! be exercised against mocks.

use {
    crate::config::Config,
    anyhow::{Context, Result, anyhow},
    starknet::{
        accounts::{Account, ConnectedAccount, ExecutionEncoding, SingleOwnerAccount},
        contract::ContractFactory,
        core::types::{
            BlockId,
            BlockTag,
            ExecutionResult,
            Felt,
            FlattenedSierraClass,
            StarknetError,
        },
        providers::{
            Provider,
            ProviderError,
            jsonrpc::{HttpTransport, JsonRpcClient},
        },
        signers::{LocalWallet, SigningKey},
    },
    std::{sync::Arc, time::Duration},
};

/// A submitted deployment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deployment {
    pub address: Felt,
    pub transaction_hash: Felt,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Chain: Send + Sync {
    /// Address of the account sending the transactions.
    fn deployer_address(&self) -> Felt;

    /// Whether a class with this hash is known to the network.
    async fn is_declared(&self, class_hash: Felt) -> Result<bool>;

    /// Sends a declare transaction and returns its hash.
    async fn declare(
        &self,
        class: Arc<FlattenedSierraClass>,
        compiled_class_hash: Felt,
    ) -> Result<Felt>;

    /// Deploys an instance of a declared class through the Universal Deployer
    /// Contract.
    async fn deploy(&self, class_hash: Felt, calldata: Vec<Felt>, salt: Felt)
    -> Result<Deployment>;

    /// Polls until the transaction is included. Fails if it reverted.
    async fn wait_for_transaction(&self, transaction_hash: Felt) -> Result<()>;

    /// Hash of the class the contract at `address` is an instance of.
    async fn class_hash_at(&self, address: Felt) -> Result<Felt>;
}

type RpcAccount = SingleOwnerAccount<JsonRpcClient<HttpTransport>, LocalWallet>;

/// [`Chain`] implementation talking JSON-RPC to a node and signing with a
/// local key.
pub struct StarknetChain {
    account: RpcAccount,
    poll_interval: Duration,
}

impl StarknetChain {
    /// Sets up the deployer account. Only contacts the node if no chain ID
    /// was configured.
    pub async fn connect(config: &Config) -> Result<Self> {
        let provider = JsonRpcClient::new(HttpTransport::new(config.rpc_endpoint.clone()));
        let chain_id = match config.chain_id {
            Some(chain_id) => chain_id,
            None => provider
                .chain_id()
                .await
                .context("failed to fetch chain ID")?,
        };
        tracing::debug!(chain_id = %format!("{chain_id:#x}"), "using chain");

        let signer = LocalWallet::from(SigningKey::from_secret_scalar(config.private_key));
        let mut account = SingleOwnerAccount::new(
            provider,
            signer,
            config.deployer_address,
            chain_id,
            ExecutionEncoding::New,
        );
        // Nonces have to account for transactions this run already sent.
        account.set_block_id(BlockId::Tag(BlockTag::Pending));

        Ok(Self {
            account,
            poll_interval: config.confirmation_poll_interval,
        })
    }
}

#[async_trait::async_trait]
impl Chain for StarknetChain {
    fn deployer_address(&self) -> Felt {
        self.account.address()
    }

    async fn is_declared(&self, class_hash: Felt) -> Result<bool> {
        match self
            .account
            .provider()
            .get_class(BlockId::Tag(BlockTag::Pending), class_hash)
            .await
        {
            Ok(_) => Ok(true),
            Err(ProviderError::StarknetError(StarknetError::ClassHashNotFound)) => Ok(false),
            Err(err) => Err(err).context("failed to query class"),
        }
    }

    async fn declare(
        &self,
        class: Arc<FlattenedSierraClass>,
        compiled_class_hash: Felt,
    ) -> Result<Felt> {
        let result = self
            .account
            .declare_v3(class, compiled_class_hash)
            .send()
            .await
            .context("declare transaction failed")?;
        Ok(result.transaction_hash)
    }

    async fn deploy(
        &self,
        class_hash: Felt,
        calldata: Vec<Felt>,
        salt: Felt,
    ) -> Result<Deployment> {
        let factory = ContractFactory::new(class_hash, &self.account);
        let deployment = factory.deploy_v3(calldata, salt, true);
        let address = deployment.deployed_address();
        let result = deployment
            .send()
            .await
            .context("deploy transaction failed")?;
        Ok(Deployment {
            address,
            transaction_hash: result.transaction_hash,
        })
    }

    async fn wait_for_transaction(&self, transaction_hash: Felt) -> Result<()> {
        loop {
            match self
                .account
                .provider()
                .get_transaction_receipt(transaction_hash)
                .await
            {
                Ok(receipt) => {
                    return match receipt.receipt.execution_result() {
                        ExecutionResult::Succeeded => Ok(()),
                        ExecutionResult::Reverted { reason } => Err(anyhow!(
                            "transaction {transaction_hash:#x} reverted: {reason}"
                        )),
                    };
                }
                Err(ProviderError::StarknetError(StarknetError::TransactionHashNotFound)) => {
                    tracing::debug!(
                        tx = %format!("{transaction_hash:#x}"),
                        "transaction not yet received"
                    );
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(err) => return Err(err).context("failed to fetch transaction receipt"),
            }
        }
    }

    async fn class_hash_at(&self, address: Felt) -> Result<Felt> {
        self.account
            .provider()
            .get_class_hash_at(BlockId::Tag(BlockTag::Pending), address)
            .await
            .context("failed to query class hash of contract")
    }
}
