//! Declares a token contract and deploys a manager contract that receives
//! the token's class hash as constructor argument.

pub mod abi;
pub mod arguments;
pub mod artifact;
pub mod calldata;
pub mod chain;
pub mod config;
pub mod deploy;
mod run;

pub use self::run::{Error, exit_status, run, start};
