//! The deploy pipeline.
//!
//! Every step returns a value only the next step can consume:
//! [`declare_if_absent`] yields a [`Declared`] class which is the only way to
//! pass a class hash into [`ConstructorArgs`], the compiled [`Calldata`] is
//! required by [`declare_and_deploy`] and the resulting [`Deployed`] contract
//! is what a [`ContractHandle`] gets bound to.

use {
    crate::{
        abi::Abi,
        artifact::ArtifactPair,
        calldata::{Calldata, ConstructorArgs},
        chain::Chain,
    },
    anyhow::{Context, Result, ensure},
    starknet::core::types::Felt,
};

/// A class known to the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Declared {
    class_hash: Felt,
    /// Hash of the declare transaction, `None` if the class had been declared
    /// before.
    transaction_hash: Option<Felt>,
}

impl Declared {
    pub fn class_hash(&self) -> Felt {
        self.class_hash
    }

    pub fn transaction_hash(&self) -> Option<Felt> {
        self.transaction_hash
    }

    #[cfg(test)]
    pub(crate) fn existing(class_hash: Felt) -> Self {
        Self {
            class_hash,
            transaction_hash: None,
        }
    }
}

/// Salt mixed into the deployment address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Salt(Felt);

impl Salt {
    /// A uniformly random salt below 2^250, comfortably inside the field.
    pub fn random() -> Self {
        let mut bytes = rand::random::<[u8; 32]>();
        bytes[0] &= 0x03;
        Self(Felt::from_bytes_be(&bytes))
    }

    pub fn into_inner(self) -> Felt {
        self.0
    }
}

/// A deployed contract instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deployed {
    pub address: Felt,
    pub class_hash: Felt,
    pub salt: Salt,
    pub transaction_hash: Felt,
}

/// The two contracts taking part in a deployment.
#[derive(Clone, Debug)]
pub struct Contracts {
    /// Declared only, its class hash is a constructor argument of the manager.
    pub token: ArtifactPair,
    /// Declared and deployed.
    pub manager: ArtifactPair,
}

/// Declares the class unless the network already knows it. The class hash is
/// computed from the artifact, so repeated calls with the same artifact agree
/// on it whether or not a transaction was sent.
pub async fn declare_if_absent<C: Chain + ?Sized>(
    chain: &C,
    artifact: &ArtifactPair,
) -> Result<Declared> {
    let class_hash = artifact.class_hash;
    if chain.is_declared(class_hash).await? {
        tracing::info!(
            contract = %artifact.name,
            class_hash = %format!("{class_hash:#x}"),
            "class already declared"
        );
        return Ok(Declared {
            class_hash,
            transaction_hash: None,
        });
    }

    let transaction_hash = chain
        .declare(artifact.class.clone(), artifact.compiled_class_hash)
        .await
        .with_context(|| format!("failed to declare {}", artifact.name))?;
    tracing::info!(
        contract = %artifact.name,
        class_hash = %format!("{class_hash:#x}"),
        tx = %format!("{transaction_hash:#x}"),
        "declare transaction sent"
    );
    chain.wait_for_transaction(transaction_hash).await?;

    Ok(Declared {
        class_hash,
        transaction_hash: Some(transaction_hash),
    })
}

/// Declares the class if needed and deploys an instance of it.
pub async fn declare_and_deploy<C: Chain + ?Sized>(
    chain: &C,
    artifact: &ArtifactPair,
    calldata: Calldata,
    salt: Salt,
) -> Result<Deployed> {
    let declared = declare_if_absent(chain, artifact).await?;
    let deployment = chain
        .deploy(declared.class_hash(), calldata.into_inner(), salt.into_inner())
        .await
        .with_context(|| format!("failed to deploy {}", artifact.name))?;
    tracing::info!(
        contract = %artifact.name,
        address = %format!("{:#x}", deployment.address),
        tx = %format!("{:#x}", deployment.transaction_hash),
        "deploy transaction sent"
    );
    chain
        .wait_for_transaction(deployment.transaction_hash)
        .await?;

    Ok(Deployed {
        address: deployment.address,
        class_hash: declared.class_hash(),
        salt,
        transaction_hash: deployment.transaction_hash,
    })
}

/// Read-only view of a deployed contract.
#[derive(Clone, Debug)]
pub struct ContractHandle {
    address: Felt,
    class_hash: Felt,
    abi: Abi,
}

impl ContractHandle {
    pub fn bind(deployed: &Deployed, abi: Abi) -> Self {
        Self {
            address: deployed.address,
            class_hash: deployed.class_hash,
            abi,
        }
    }

    pub fn address(&self) -> Felt {
        self.address
    }

    pub fn abi(&self) -> &Abi {
        &self.abi
    }

    /// Checks that the network reports the expected class at the address.
    pub async fn confirm<C: Chain + ?Sized>(&self, chain: &C) -> Result<()> {
        let class_hash = chain.class_hash_at(self.address).await?;
        ensure!(
            class_hash == self.class_hash,
            "contract at {:#x} has class {class_hash:#x} instead of {:#x}",
            self.address,
            self.class_hash,
        );
        Ok(())
    }
}

/// Runs the whole pipeline: declare the token, deploy the manager with the
/// token class hash as constructor argument and confirm the deployment.
pub async fn execute<C: Chain + ?Sized>(
    chain: &C,
    contracts: &Contracts,
    class_hash_argument: &str,
) -> Result<ContractHandle> {
    let token = declare_if_absent(chain, &contracts.token).await?;
    match token.transaction_hash() {
        Some(tx) => tracing::info!(tx = %format!("{tx:#x}"), "token class declared"),
        None => tracing::info!("token class was already declared"),
    }
    let calldata = ConstructorArgs::new()
        .class_hash(class_hash_argument, &token)
        .compile(&contracts.manager.abi)
        .with_context(|| {
            format!(
                "failed to compile constructor calldata of {}",
                contracts.manager.name
            )
        })?;
    let deployed = declare_and_deploy(chain, &contracts.manager, calldata, Salt::random()).await?;

    let handle = ContractHandle::bind(&deployed, contracts.manager.abi.clone());
    handle.confirm(chain).await?;
    Ok(handle)
}
