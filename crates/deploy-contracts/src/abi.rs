//! The part of a Cairo contract ABI needed to encode constructor calldata.

use serde::Deserialize;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Abi(Vec<Entry>);

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entry {
    Constructor { name: String, inputs: Vec<Member> },
    /// Functions, events, interfaces and type definitions.
    #[serde(other)]
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Member {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: String,
}

#[derive(Deserialize)]
struct Artifact {
    abi: Abi,
}

impl Abi {
    /// Extracts the ABI from the contents of a `*.contract_class.json` file.
    pub fn from_sierra_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<Artifact>(json).map(|artifact| artifact.abi)
    }

    /// The constructor inputs in declaration order. Contracts without a
    /// constructor take no arguments.
    pub fn constructor(&self) -> &[Member] {
        self.0
            .iter()
            .find_map(|entry| match entry {
                Entry::Constructor { inputs, .. } => Some(inputs.as_slice()),
                Entry::Other => None,
            })
            .unwrap_or_default()
    }
}
