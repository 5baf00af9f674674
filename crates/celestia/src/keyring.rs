//! Keyring-backed transaction signer.
//!
//! Keys are secp256k1. Account addresses are
//! `bech32("celestia", ripemd160(sha256(compressed_pubkey)))`.

use std::path::Path;
use std::sync::Arc;

use bech32::{Bech32, Hrp};
use dalc_types::{KeyringBackend, KeyringConfig};
use k256::ecdsa::signature::{Signer as _, Verifier as _};
use k256::ecdsa::{Signature, SigningKey, VerifyingKey};
use ripemd::Ripemd160;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{AccountSource, AccountState, DaError, Fee, PayForMessage, Result, Signer};

const ADDRESS_PREFIX: &str = "celestia";

/// Unsigned transaction body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxBody {
    /// Chain the transaction is valid on.
    pub chain_id: String,
    /// Signer's account number.
    pub account_number: u64,
    /// Signer's sequence at signing time.
    pub sequence: u64,
    /// Fee and gas limit.
    pub fee: Fee,
    /// Pay-for-message payload.
    pub message: PayForMessage,
}

/// Signed transaction as broadcast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedTx {
    /// Signed body.
    pub body: TxBody,
    /// Compressed SEC1 public key of the signer.
    pub public_key: Vec<u8>,
    /// ECDSA signature over SHA-256 of the bincode-encoded body.
    pub signature: Vec<u8>,
}

impl SignedTx {
    /// Check the signature against the embedded public key.
    ///
    /// # Errors
    ///
    /// Returns [`DaError::Signing`] if the key or signature is malformed or
    /// does not match the body.
    pub fn verify(&self) -> Result<()> {
        let key = VerifyingKey::from_sec1_bytes(&self.public_key)
            .map_err(|e| DaError::Signing(format!("invalid public key: {e}")))?;
        let signature = Signature::from_slice(&self.signature)
            .map_err(|e| DaError::Signing(format!("invalid signature: {e}")))?;
        let body = bincode::serialize(&self.body)
            .map_err(|e| DaError::EncodeFailed(e.to_string()))?;
        key.verify(&body, &signature)
            .map_err(|e| DaError::Signing(format!("signature mismatch: {e}")))
    }
}

/// Generate a fresh signing key.
#[must_use]
pub fn generate_key() -> SigningKey {
    SigningKey::random(&mut rand::thread_rng())
}

/// Load a hex-encoded secp256k1 key from `path`.
///
/// # Errors
///
/// Returns [`DaError::InvalidConfig`] if the file is missing or not a key.
pub fn load_key(path: &Path) -> Result<SigningKey> {
    let key_hex = std::fs::read_to_string(path).map_err(|e| {
        DaError::InvalidConfig(format!("failed to read key file {}: {e}", path.display()))
    })?;
    let key_bytes = hex::decode(key_hex.trim())
        .map_err(|e| DaError::InvalidConfig(format!("invalid hex in key file: {e}")))?;
    SigningKey::from_slice(&key_bytes)
        .map_err(|e| DaError::InvalidConfig(format!("invalid secp256k1 key: {e}")))
}

/// Bech32 account address of `key`.
///
/// # Errors
///
/// Returns [`DaError::Signing`] if the address cannot be encoded.
pub fn account_address(key: &SigningKey) -> Result<String> {
    let pubkey_bytes = key.verifying_key().to_sec1_bytes();
    let ripemd_hash = Ripemd160::digest(Sha256::digest(&pubkey_bytes));

    let hrp = Hrp::parse(ADDRESS_PREFIX)
        .map_err(|e| DaError::Signing(format!("invalid address prefix: {e}")))?;
    bech32::encode::<Bech32>(hrp, &ripemd_hash)
        .map_err(|e| DaError::Signing(format!("bech32 encoding failed: {e}")))
}

/// [`Signer`] holding one account key.
///
/// Account number and sequence are cached after
/// [`Signer::query_account_state`] and the sequence advances locally with each
/// signature.
pub struct KeyringSigner {
    key: SigningKey,
    address: String,
    chain_id: String,
    accounts: Arc<dyn AccountSource>,
    state: Mutex<Option<AccountState>>,
}

impl KeyringSigner {
    /// Create a signer for `key` on `chain_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the account address cannot be derived.
    pub fn new(
        key: SigningKey,
        chain_id: impl Into<String>,
        accounts: Arc<dyn AccountSource>,
    ) -> Result<Self> {
        let address = account_address(&key)?;
        Ok(Self {
            key,
            address,
            chain_id: chain_id.into(),
            accounts,
            state: Mutex::new(None),
        })
    }

    /// Create a signer from keyring configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file backend's key cannot be loaded.
    pub fn from_config(
        config: &KeyringConfig,
        chain_id: impl Into<String>,
        accounts: Arc<dyn AccountSource>,
    ) -> Result<Self> {
        let key = match config.backend {
            KeyringBackend::File => load_key(&config.key_file())?,
            KeyringBackend::Memory => generate_key(),
        };
        let signer = Self::new(key, chain_id, accounts)?;

        info!(
            backend = ?config.backend,
            account = %config.account_name,
            address = %signer.address,
            "Keyring loaded"
        );
        Ok(signer)
    }

    /// Account address of this signer.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait::async_trait]
impl Signer for KeyringSigner {
    async fn query_account_state(&self) -> Result<()> {
        let account = self.accounts.account(&self.address).await?;
        debug!(
            address = %self.address,
            account_number = account.account_number,
            sequence = account.sequence,
            "Refreshed account state"
        );
        let mut state = self.state.lock().await;
        let sequence = match *state {
            // transactions signed here but not yet included are ahead of the chain
            Some(local) if local.account_number == account.account_number => {
                local.sequence.max(account.sequence)
            }
            _ => account.sequence,
        };
        *state = Some(AccountState { sequence, ..account });
        Ok(())
    }

    async fn sign_and_encode(&self, payload: &PayForMessage, fee: &Fee) -> Result<Vec<u8>> {
        let mut state = self.state.lock().await;
        let Some(account) = state.as_mut() else {
            return Err(DaError::Signing(
                "account state unknown; query it before signing".into(),
            ));
        };

        let body = TxBody {
            chain_id: self.chain_id.clone(),
            account_number: account.account_number,
            sequence: account.sequence,
            fee: fee.clone(),
            message: payload.clone(),
        };
        let body_bytes =
            bincode::serialize(&body).map_err(|e| DaError::EncodeFailed(e.to_string()))?;
        let signature: Signature = self.key.sign(&body_bytes);

        let tx = SignedTx {
            body,
            public_key: self.key.verifying_key().to_sec1_bytes().to_vec(),
            signature: signature.to_bytes().to_vec(),
        };
        let encoded = bincode::serialize(&tx).map_err(|e| DaError::EncodeFailed(e.to_string()))?;

        account.sequence += 1;
        Ok(encoded)
    }
}
