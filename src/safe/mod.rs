//! Client for deployed Safe multisig wallets.
//!
//! [`SafeClient`] reads wallet metadata and takes a transaction through its
//! three steps: [`SafeClient::build`] fixes the nonce and computes the EIP-712
//! `safeTxHash`, [`SafeClient::sign`] attaches an owner signature, and
//! [`SafeClient::submit`] executes it once the threshold is met.

mod client;
mod contract;
mod typed_data;
mod types;

pub use client::SafeClient;
pub use contract::SUPPORTED_SAFE_VERSIONS;
pub use types::*;
