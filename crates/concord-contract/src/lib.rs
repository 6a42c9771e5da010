//! Rule contract store.
//!
//! This crate is intentionally IO-free: it parses and validates contracts provided as
//! strings. Reading files is the caller's job.

#![forbid(unsafe_code)]

mod error;
mod model;
mod parse;
mod store;

pub use error::ContractError;
pub use model::{ContractDocV1, RuleDoc, SCHEMA_CONTRACT_V1};
pub use parse::{Contract, ContractFormat, ContractSource, load};
pub use store::ContractStore;

/// Parse a TOML contract document.
pub fn parse_contract_toml(input: &str) -> Result<Contract, ContractError> {
    load(ContractSource::Toml(input))
}

/// Parse a JSON contract document.
pub fn parse_contract_json(input: &str) -> Result<Contract, ContractError> {
    load(ContractSource::Json(input))
}
