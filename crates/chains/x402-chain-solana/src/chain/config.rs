use serde::{Deserialize, Serialize};
use solana_commitment_config::CommitmentConfig;
use solana_keypair::Keypair;
use std::fs;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;
use x402_types::config::LiteralOrEnv;
use x402_types::proto::PaymentPreference;

use crate::networks::SolanaCluster;
use crate::settlement::SubmitSettings;

/// Configuration of a Solana payer.
///
/// # Example
///
/// ```json
/// {
///   "network": "devnet",
///   "scheme": "exact",
///   "signer": "$SOLANA_PAYER_KEY",
///   "confirmationTimeoutSecs": 60
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayerConfig {
    /// Network tag matched against payment options.
    #[serde(default = "payer_config::default_network")]
    pub network: String,
    /// Scheme tag matched against payment options.
    #[serde(default = "payer_config::default_scheme")]
    pub scheme: String,
    /// JSON-RPC endpoint (optional for well-known clusters)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpc: Option<Url>,
    /// Payer keypair, base58 (64 bytes) or env var reference.
    pub signer: SolanaSignerConfig,
    /// Deadline for the confirmation wait, in seconds.
    #[serde(default = "payer_config::default_confirmation_timeout_secs")]
    pub confirmation_timeout_secs: u64,
    /// Resubmissions allowed after transient network failures.
    #[serde(default = "payer_config::default_max_retries")]
    pub max_retries: u32,
}

mod payer_config {
    pub fn default_network() -> String {
        "devnet".to_string()
    }
    pub fn default_scheme() -> String {
        "exact".to_string()
    }
    pub fn default_confirmation_timeout_secs() -> u64 {
        60
    }
    pub fn default_max_retries() -> u32 {
        3
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("Failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
    #[error("No RPC endpoint configured for unknown network '{0}'")]
    UnknownNetwork(String),
    #[error("Invalid signer key: {0}")]
    InvalidSigner(String),
}

impl PayerConfig {
    /// Load configuration from a JSON file.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
        let config = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn preference(&self) -> PaymentPreference {
        PaymentPreference::new(self.network.as_str(), self.scheme.as_str())
    }

    /// Returns the configured RPC endpoint, or the public endpoint of a known cluster.
    pub fn rpc_url(&self) -> Result<Url, ConfigError> {
        if let Some(rpc) = &self.rpc {
            return Ok(rpc.clone());
        }
        let cluster = SolanaCluster::from_network(&self.network)
            .ok_or_else(|| ConfigError::UnknownNetwork(self.network.clone()))?;
        Url::parse(cluster.rpc_url()).map_err(|_| ConfigError::UnknownNetwork(self.network.clone()))
    }

    pub fn keypair(&self) -> Result<Keypair, ConfigError> {
        Keypair::try_from(self.signer.as_bytes().as_slice())
            .map_err(|e| ConfigError::InvalidSigner(e.to_string()))
    }

    pub fn submit_settings(&self) -> SubmitSettings {
        SubmitSettings {
            max_retries: self.max_retries,
            confirmation_timeout: Duration::from_secs(self.confirmation_timeout_secs),
            commitment: CommitmentConfig::confirmed(),
            ..SubmitSettings::default()
        }
    }
}

// ============================================================================
// Solana Private Key
// ============================================================================

/// A validated Solana private key (64 bytes in standard Solana format).
///
/// - First 32 bytes: the Ed25519 secret key (seed)
/// - Last 32 bytes: the Ed25519 public key
///
/// The key is parsed from a base58-encoded 64-byte array, the format used by the
/// Solana CLI and wallets. [`Debug`] never prints the key material.
#[derive(Clone, PartialEq, Eq)]
pub struct SolanaPrivateKey([u8; 64]);

impl SolanaPrivateKey {
    /// Parse a base58 string into a private key.
    pub fn from_base58(s: &str) -> Result<Self, String> {
        let bytes = bs58::decode(s.trim())
            .into_vec()
            .map_err(|e| format!("Invalid base58: {}", e))?;

        let arr: [u8; 64] = bytes.as_slice().try_into().map_err(|_| {
            format!(
                "Private key must be 64 bytes (standard Solana format), got {} bytes",
                bytes.len()
            )
        })?;
        Ok(Self(arr))
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(&self.0).into_string()
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl std::fmt::Debug for SolanaPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SolanaPrivateKey(..)")
    }
}

impl Serialize for SolanaPrivateKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_base58())
    }
}

impl FromStr for SolanaPrivateKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base58(s)
    }
}

/// Signer configuration: a literal base58 key or an env var reference.
///
/// ```json
/// { "signer": "$SOLANA_PAYER_KEY" }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolanaSignerConfig(LiteralOrEnv<SolanaPrivateKey>);

impl SolanaSignerConfig {
    pub fn new(key: SolanaPrivateKey) -> Self {
        Self(LiteralOrEnv::from_literal(key))
    }
}

impl Deref for SolanaSignerConfig {
    type Target = SolanaPrivateKey;

    fn deref(&self) -> &Self::Target {
        self.0.inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_signer::Signer;

    fn keypair_base58() -> (Keypair, String) {
        let keypair = Keypair::new();
        let encoded = keypair.to_base58_string();
        (keypair, encoded)
    }

    #[test]
    fn test_defaults() {
        let (_, key) = keypair_base58();
        let json = format!(r#"{{"signer": "{key}"}}"#);
        let config: PayerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.network, "devnet");
        assert_eq!(config.scheme, "exact");
        assert_eq!(config.confirmation_timeout_secs, 60);
        assert_eq!(config.max_retries, 3);
        assert_eq!(
            config.rpc_url().unwrap().as_str(),
            "https://api.devnet.solana.com/"
        );
        let settings = config.submit_settings();
        assert_eq!(settings.max_retries, 3);
        assert_eq!(settings.confirmation_timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_keypair_is_restored() {
        let (keypair, key) = keypair_base58();
        let json = format!(r#"{{"network": "mainnet-beta", "signer": "{key}"}}"#);
        let config: PayerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.keypair().unwrap().pubkey(), keypair.pubkey());
        assert_eq!(
            config.rpc_url().unwrap().as_str(),
            "https://api.mainnet-beta.solana.com/"
        );
    }

    #[test]
    fn test_unknown_network_needs_rpc() {
        let (_, key) = keypair_base58();
        let json = format!(r#"{{"network": "localnet", "signer": "{key}"}}"#);
        let config: PayerConfig = serde_json::from_str(&json).unwrap();
        assert!(matches!(
            config.rpc_url(),
            Err(ConfigError::UnknownNetwork(network)) if network == "localnet"
        ));

        let json =
            format!(r#"{{"network": "localnet", "rpc": "http://127.0.0.1:8899", "signer": "{key}"}}"#);
        let config: PayerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.rpc_url().unwrap().as_str(), "http://127.0.0.1:8899/");
    }

    #[test]
    fn test_short_key_is_rejected() {
        let json = r#"{"signer": "3yZe7d"}"#;
        assert!(serde_json::from_str::<PayerConfig>(json).is_err());
    }

    #[test]
    fn test_debug_hides_key() {
        let (_, key) = keypair_base58();
        let private_key = SolanaPrivateKey::from_base58(&key).unwrap();
        assert_eq!(format!("{private_key:?}"), "SolanaPrivateKey(..)");
        assert_eq!(private_key.to_base58(), key);
    }
}
