//! Loading of compiled contract artifacts from a Scarb build output directory.
//!
//! Every contract comes as a pair of files: the Sierra class
//! (`<name>.contract_class.json`) which gets declared and the CASM class
//! (`<name>.compiled_contract_class.json`) whose hash is committed to by the
//! declare transaction.

use {
    crate::abi::Abi,
    starknet::core::types::{
        Felt,
        FlattenedSierraClass,
        contract::{CompiledClass, SierraClass},
    },
    std::{
        io,
        path::{Path, PathBuf},
        sync::Arc,
    },
};

const SIERRA_EXTENSION: &str = "contract_class.json";
const CASM_EXTENSION: &str = "compiled_contract_class.json";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("artifact {0:?} does not exist")]
    NotFound(PathBuf),
    #[error("failed to read artifact {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("artifact {path:?} is malformed")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to compute the class hash of {path:?}: {reason}")]
    Hash { path: PathBuf, reason: String },
}

/// Locations of the two build artifacts of a contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Paths {
    pub sierra: PathBuf,
    pub casm: PathBuf,
}

impl Paths {
    pub fn new(dir: &Path, name: &str) -> Self {
        Self {
            sierra: dir.join(format!("{name}.{SIERRA_EXTENSION}")),
            casm: dir.join(format!("{name}.{CASM_EXTENSION}")),
        }
    }
}

/// A contract ready to be declared.
#[derive(Clone, Debug)]
pub struct ArtifactPair {
    pub name: String,
    pub class: Arc<FlattenedSierraClass>,
    pub class_hash: Felt,
    pub compiled_class_hash: Felt,
    pub abi: Abi,
}

/// Reads and parses both artifacts of the contract `name`. Either both parts
/// are returned or none.
pub async fn load(dir: &Path, name: &str) -> Result<ArtifactPair, Error> {
    let paths = Paths::new(dir, name);
    tracing::debug!(?paths, "loading contract artifacts");

    let sierra = read(&paths.sierra).await?;
    let casm = read(&paths.casm).await?;

    let class = serde_json::from_str::<SierraClass>(&sierra).map_err(|source| Error::Malformed {
        path: paths.sierra.clone(),
        source,
    })?;
    let abi = Abi::from_sierra_json(&sierra).map_err(|source| Error::Malformed {
        path: paths.sierra.clone(),
        source,
    })?;
    let compiled = serde_json::from_str::<CompiledClass>(&casm).map_err(|source| Error::Malformed {
        path: paths.casm.clone(),
        source,
    })?;

    let class = class.flatten().map_err(|err| Error::Hash {
        path: paths.sierra.clone(),
        reason: err.to_string(),
    })?;
    let compiled_class_hash = compiled.class_hash().map_err(|err| Error::Hash {
        path: paths.casm.clone(),
        reason: err.to_string(),
    })?;

    Ok(ArtifactPair {
        name: name.to_string(),
        class_hash: class.class_hash(),
        class: Arc::new(class),
        compiled_class_hash,
        abi,
    })
}

async fn read(path: &Path) -> Result<String, Error> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => Error::NotFound(path.to_path_buf()),
            _ => Error::Io {
                path: path.to_path_buf(),
                source,
            },
        })
}

#[cfg(test)]
mod tests {
    use {super::*, crate::tests::fixtures};

    #[tokio::test]
    async fn loads_both_artifacts() {
        let dir = fixtures::artifacts_dir();

        let pair = load(dir.path(), fixtures::MANAGER).await.unwrap();

        assert_eq!(pair.name, fixtures::MANAGER);
        assert_ne!(pair.class_hash, Felt::ZERO);
        assert_ne!(pair.compiled_class_hash, Felt::ZERO);
        assert_eq!(pair.class.class_hash(), pair.class_hash);
        assert_eq!(pair.abi.constructor().len(), 1);
    }

    #[tokio::test]
    async fn identical_bytes_hash_identically() {
        let dir = fixtures::artifacts_dir();

        let first = load(dir.path(), fixtures::TOKEN).await.unwrap();
        let second = load(dir.path(), fixtures::TOKEN).await.unwrap();
        let other = load(dir.path(), fixtures::MANAGER).await.unwrap();

        assert_eq!(first.class_hash, second.class_hash);
        assert_eq!(first.compiled_class_hash, second.compiled_class_hash);
        assert_ne!(first.class_hash, other.class_hash);
    }

    #[tokio::test]
    async fn missing_casm_fails_the_whole_pair() {
        let dir = fixtures::artifacts_dir();
        let paths = Paths::new(dir.path(), fixtures::TOKEN);
        std::fs::remove_file(&paths.casm).unwrap();

        let err = load(dir.path(), fixtures::TOKEN).await.unwrap_err();

        assert!(matches!(err, Error::NotFound(path) if path == paths.casm));
    }

    #[tokio::test]
    async fn missing_sierra_fails_the_whole_pair() {
        let dir = fixtures::artifacts_dir();
        let paths = Paths::new(dir.path(), fixtures::TOKEN);
        std::fs::remove_file(&paths.sierra).unwrap();

        let err = load(dir.path(), fixtures::TOKEN).await.unwrap_err();

        assert!(matches!(err, Error::NotFound(path) if path == paths.sierra));
    }

    #[tokio::test]
    async fn malformed_casm_is_reported() {
        let dir = fixtures::artifacts_dir();
        let paths = Paths::new(dir.path(), fixtures::MANAGER);
        std::fs::write(&paths.casm, "{ \"prime\": ").unwrap();

        let err = load(dir.path(), fixtures::MANAGER).await.unwrap_err();

        assert!(matches!(err, Error::Malformed { path, .. } if path == paths.casm));
    }
}
