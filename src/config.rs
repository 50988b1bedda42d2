use crate::prelude::Result;
use crate::Error;
use ethers::signers::{LocalWallet, Signer};
use ethers::types::Address;
use std::env;
use std::fmt;

pub(crate) const RPC_URL_VAR: &str = "URL";
pub(crate) const PRIVATE_KEY_VAR: &str = "PK";
pub(crate) const SAFE_ADDRESS_VAR: &str = "SAFE_ACCOUNT";

/// Settings needed to drive a Safe: where the node is, who signs, and which Safe.
///
/// All three values are validated when the config is built, so a pipeline
/// never starts with a missing endpoint, key or wallet address.
#[derive(Clone)]
pub struct Config {
    pub rpc_url: String,
    /// Private key of a signer owning the Safe
    pub signer: LocalWallet,
    pub safe_address: Address,
}

impl Config {
    /// Loads `URL`, `PK` and `SAFE_ACCOUNT`, honouring a `.env` file if present.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let rpc_url = required_var(RPC_URL_VAR)?;
        let private_key = required_var(PRIVATE_KEY_VAR)?;
        let safe_address = required_var(SAFE_ADDRESS_VAR)?;

        Self::from_values(&rpc_url, &private_key, &safe_address)
    }

    pub fn from_values(rpc_url: &str, private_key: &str, safe_address: &str) -> Result<Self> {
        if rpc_url.trim().is_empty() {
            return Err(Error::Configuration(RPC_URL_VAR.to_string()));
        }
        let signer = private_key
            .trim()
            .trim_start_matches("0x")
            .parse::<LocalWallet>()
            .map_err(|e| Error::PrivateKeyParse(e.to_string()))?;
        let safe_address = safe_address.trim().parse::<Address>().map_err(|e| {
            Error::Configuration(format!("{SAFE_ADDRESS_VAR} is not an address: {e}"))
        })?;

        Ok(Config {
            rpc_url: rpc_url.trim().to_string(),
            signer,
            safe_address,
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("rpc_url", &self.rpc_url)
            .field("signer", &self.signer.address())
            .field("safe_address", &self.safe_address)
            .finish()
    }
}

fn required_var(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(Error::Configuration(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Throwaway key, never funded.
    const TEST_KEY: &str = "e908f86dbb4d55ac876378565aafeabc187f6690f046459397b17d9b9a19688e";

    #[test]
    fn test_from_values_accepts_prefixed_key() {
        let config = Config::from_values(
            "http://127.0.0.1:8545",
            &format!("0x{TEST_KEY}"),
            "0xdb6026ccc2bbed2725e2fb9b1b12785e89d9dfb3",
        )
        .unwrap();

        let expected: LocalWallet = TEST_KEY.parse().unwrap();
        assert_eq!(config.signer.address(), expected.address());
        assert_eq!(
            config.safe_address,
            "0xdb6026ccc2bbed2725e2fb9b1b12785e89d9dfb3"
                .parse::<Address>()
                .unwrap()
        );
    }

    #[test]
    fn test_from_values_rejects_empty_url() {
        let err = Config::from_values(" ", TEST_KEY, "0xdb6026ccc2bbed2725e2fb9b1b12785e89d9dfb3")
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(name) if name == RPC_URL_VAR));
    }

    #[test]
    fn test_from_values_rejects_bad_key() {
        let err = Config::from_values(
            "http://127.0.0.1:8545",
            "not-a-key",
            "0xdb6026ccc2bbed2725e2fb9b1b12785e89d9dfb3",
        )
        .unwrap_err();
        assert!(matches!(err, Error::PrivateKeyParse(_)));
    }

    #[test]
    fn test_from_values_rejects_bad_address() {
        let err = Config::from_values("http://127.0.0.1:8545", TEST_KEY, "0x1234").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_missing_var_is_named() {
        let err = required_var("SAFE_RANGER_UNSET_TEST_VAR").unwrap_err();
        assert!(matches!(err, Error::Configuration(name) if name == "SAFE_RANGER_UNSET_TEST_VAR"));
    }

    #[test]
    fn test_debug_hides_private_key() {
        let config = Config::from_values(
            "http://127.0.0.1:8545",
            TEST_KEY,
            "0xdb6026ccc2bbed2725e2fb9b1b12785e89d9dfb3",
        )
        .unwrap();
        assert!(!format!("{config:?}").contains(TEST_KEY));
    }
}
