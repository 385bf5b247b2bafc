//! Core data types for the TON signing protocol.
//!
//! All boundary records are request-scoped values: nothing here persists
//! across calls and nothing is shared between invocations.

use serde::{Deserialize, Serialize};

// =============================================================================
// Chain Constants
// =============================================================================

/// Workchain identifiers embedded in addresses and messages.
pub const WORKCHAIN_BASE: i8 = 0;
pub const WORKCHAIN_MASTER: i8 = -1;

/// Send-mode flag bits for the wallet contract's action phase.
pub mod send_mode {
    /// Sender pays transfer fees separately from the message value.
    pub const PAY_FEES_SEPARATELY: u8 = 1;
    /// Ignore errors in the action phase instead of bouncing.
    pub const IGNORE_ACTION_PHASE_ERRORS: u8 = 2;
    /// Carry the wallet's whole remaining balance with the message.
    pub const ATTACH_ALL_CONTRACT_BALANCE: u8 = 128;
}

// =============================================================================
// Wallet Version
// =============================================================================

/// On-chain wallet contract revision a message must conform to.
///
/// Only `V4R2` is wired up; every other variant is rejected with an
/// `invalid_params` error rather than silently mapped to a default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletVersion {
    V3R2,
    #[default]
    V4R2,
}

impl WalletVersion {
    pub fn is_supported(&self) -> bool {
        matches!(self, WalletVersion::V4R2)
    }
}

// =============================================================================
// Signing Input
// =============================================================================

/// A transfer request.
///
/// Carries either a raw private key (local signing) or no key material at all
/// (external/TSS signing expected). `public_key` is set only when a remote
/// signer will produce the signature.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SigningInput {
    #[serde(default, with = "crate::serde_bytes::hex")]
    pub private_key: Vec<u8>,
    #[serde(default, with = "crate::serde_bytes::hex")]
    pub public_key: Vec<u8>,
    pub action: Option<TransferAction>,
}

impl SigningInput {
    pub fn has_private_key(&self) -> bool {
        !self.private_key.is_empty()
    }

    pub fn has_public_key(&self) -> bool {
        !self.public_key.is_empty()
    }

    /// The underlying transfer of whichever action variant is active.
    pub fn transfer(&self) -> Option<&Transfer> {
        match &self.action {
            Some(TransferAction::Transfer(t)) => Some(t),
            Some(TransferAction::JettonTransfer(j)) => Some(&j.transfer),
            None => None,
        }
    }

    pub fn wallet_version(&self) -> Option<WalletVersion> {
        self.transfer().map(|t| t.wallet_version)
    }
}

/// Exactly one action variant is active per request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransferAction {
    Transfer(Transfer),
    JettonTransfer(JettonTransfer),
}

/// A plain TON transfer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transfer {
    pub wallet_version: WalletVersion,
    /// Destination address text (raw or user-friendly form).
    pub dest: String,
    /// Amount in nanoton.
    pub amount: u64,
    /// Account nonce of the sending wallet.
    pub sequence_number: u64,
    /// Send-mode flag byte, see [`send_mode`].
    pub mode: u8,
    /// Expiration unix timestamp in seconds.
    pub expire_at: u64,
    /// Free-text comment, may be empty.
    pub comment: String,
    /// Whether the internal message bounces on delivery failure.
    pub bounceable: bool,
}

/// A jetton (fungible token) transfer.
///
/// Wraps a plain transfer whose `comment` field is repurposed as the message
/// body forwarded to the token recipient.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JettonTransfer {
    pub transfer: Transfer,
    /// Token amount in the jetton's smallest unit.
    pub jetton_amount: u64,
    /// Owner address being debited.
    pub to_owner: String,
    /// Address that receives the transfer notification.
    pub response_address: String,
    /// TON amount forwarded to the recipient along with the tokens.
    pub forward_amount: u64,
    /// Opaque correlation id echoed back by the receiving contract.
    pub query_id: u64,
}

// =============================================================================
// Outputs
// =============================================================================

/// Preimage bytes and their SHA-256 digest, the hand-off record for
/// hardware-wallet, custody and threshold signers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreSigningOutput {
    #[serde(with = "crate::serde_bytes::hex")]
    pub data: Vec<u8>,
    #[serde(with = "crate::serde_bytes::hex32")]
    pub data_hash: [u8; 32],
}

/// A fully signed, ready-to-broadcast wallet message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningOutput {
    /// Base64-encoded bag-of-cells of the external message.
    pub encoded: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wallet_version_gating() {
        assert!(WalletVersion::V4R2.is_supported());
        assert!(!WalletVersion::V3R2.is_supported());
        assert_eq!(WalletVersion::default(), WalletVersion::V4R2);
    }

    #[test]
    fn test_signing_input_json_round_trip() {
        let json = r#"{
            "private_key": "c38f49de2fb13223a9e7d37d5d0ffbdd89a5eb7c8b0ee4d1c299f2cefe7dc4a0",
            "public_key": "",
            "action": {
                "type": "transfer",
                "wallet_version": "v4_r2",
                "dest": "EQBm--PFwDv1yCeS-QTJ-L8oiUpqo9IT1BwgVptlSq3ts90Q",
                "amount": 10,
                "sequence_number": 6,
                "mode": 3,
                "expire_at": 1671132440,
                "comment": "",
                "bounceable": true
            }
        }"#;

        let input: SigningInput = serde_json::from_str(json).unwrap();
        assert!(input.has_private_key());
        assert!(!input.has_public_key());

        let transfer = input.transfer().unwrap();
        assert_eq!(transfer.sequence_number, 6);
        assert_eq!(transfer.mode, 3);
        assert!(transfer.wallet_version.is_supported());

        let back = serde_json::to_string(&input).unwrap();
        assert!(back.contains("\"type\":\"transfer\""));
        assert!(back.contains("c38f49de"));
    }

    #[test]
    fn test_jetton_transfer_inner_transfer() {
        let input = SigningInput {
            action: Some(TransferAction::JettonTransfer(JettonTransfer {
                transfer: Transfer {
                    sequence_number: 1,
                    ..Transfer::default()
                },
                query_id: 69,
                ..JettonTransfer::default()
            })),
            ..SigningInput::default()
        };

        assert_eq!(input.transfer().unwrap().sequence_number, 1);
        assert_eq!(input.wallet_version(), Some(WalletVersion::V4R2));
    }

    #[test]
    fn test_missing_action() {
        let input = SigningInput::default();
        assert!(input.transfer().is_none());
        assert!(input.wallet_version().is_none());
    }
}
