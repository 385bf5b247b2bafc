//! Transaction signing orchestrator.
//!
//! Three paths share one message pipeline:
//! - local signing with the private key carried in the input,
//! - preimage derivation for hardware, custody and threshold signers,
//! - assembly around a signature produced elsewhere.
//!
//! The preimage builder is a pure function of the input: identical inputs
//! yield identical bytes no matter which path invoked it. The external
//! paths depend on that, so every message field is sourced from the one
//! `SigningInput` value and never re-derived elsewhere.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ed25519_dalek::SigningKey;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::address::TonAddress;
use crate::cell::{self, Cell};
use crate::error::{TonError, TonResult};
use crate::log_debug;
use crate::payload;
use crate::types::{
    JettonTransfer, SigningInput, SigningOutput, Transfer, TransferAction, WORKCHAIN_BASE,
};
use crate::wallet::{TransferParams, WalletV4R2};

// =============================================================================
// Preimage Builder
// =============================================================================

/// Canonical signing preimage: strict field concatenation with no length
/// prefixes or delimiters.
///
/// Plain transfer: destination text, amount, sequence number (both 64-bit
/// big-endian), mode byte, expiry (64-bit big-endian), comment bytes. A
/// jetton transfer appends response address text, owner text, token amount,
/// forward amount and query id to its inner transfer's encoding.
///
/// The byte stream is not uniquely decodable (adjacent variable-length
/// fields carry no separator); it is consumed only as hash input and never
/// parsed back. A missing action yields an empty sequence, rejected by the
/// operations upstream.
pub fn build_preimage(input: &SigningInput) -> Vec<u8> {
    let mut preimage = Vec::new();
    match &input.action {
        Some(TransferAction::Transfer(transfer)) => {
            append_transfer(&mut preimage, transfer);
        }
        Some(TransferAction::JettonTransfer(jetton)) => {
            append_transfer(&mut preimage, &jetton.transfer);
            append_jetton(&mut preimage, jetton);
        }
        None => {}
    }
    preimage
}

/// SHA-256 digest of a preimage, the value an external signer actually
/// signs.
pub fn preimage_hash(preimage: &[u8]) -> [u8; 32] {
    Sha256::digest(preimage).into()
}

fn append_transfer(out: &mut Vec<u8>, transfer: &Transfer) {
    append_text(out, &transfer.dest);
    append_be64(out, transfer.amount);
    append_be64(out, transfer.sequence_number);
    append_byte(out, transfer.mode);
    append_be64(out, transfer.expire_at);
    append_text(out, &transfer.comment);
}

fn append_jetton(out: &mut Vec<u8>, jetton: &JettonTransfer) {
    append_text(out, &jetton.response_address);
    append_text(out, &jetton.to_owner);
    append_be64(out, jetton.jetton_amount);
    append_be64(out, jetton.forward_amount);
    append_be64(out, jetton.query_id);
}

// One explicit encoder per field kind, composed in the fixed order above.

fn append_text(out: &mut Vec<u8>, value: &str) {
    out.extend_from_slice(value.as_bytes());
}

fn append_be64(out: &mut Vec<u8>, value: u64) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn append_byte(out: &mut Vec<u8>, value: u8) {
    out.push(value);
}

// =============================================================================
// Signing Paths
// =============================================================================

/// Sign a transfer with the private key carried in the input and encode
/// the external message as base64.
pub fn sign(input: &SigningInput) -> TonResult<SigningOutput> {
    if !input.has_private_key() {
        if input.has_public_key() {
            return Err(TonError::invalid_params(
                "only a public key was provided, use the externally-signed path",
            ));
        }
        return Err(TonError::invalid_params("no private key provided"));
    }

    let secret: Zeroizing<[u8; 32]> = Zeroizing::new(
        input
            .private_key
            .as_slice()
            .try_into()
            .map_err(|_| TonError::invalid_params("private key must be 32 bytes"))?,
    );
    let signing_key = SigningKey::from_bytes(&secret);

    let transfer = input
        .transfer()
        .ok_or_else(|| TonError::invalid_params("missing transfer action"))?;
    if !transfer.wallet_version.is_supported() {
        return Err(TonError::invalid_params("Unsupported wallet version"));
    }

    let wallet = WalletV4R2::new(signing_key.verifying_key().to_bytes(), WORKCHAIN_BASE)?;
    let (params, body) = resolve_message(input)?;
    let message = wallet.signed_transfer(&signing_key, &params, body)?;

    log_debug!(
        "signer",
        "transfer signed",
        dest = transfer.dest,
        sequence_number = transfer.sequence_number,
    );

    encode(&message)
}

/// Assemble a signed message around a signature produced elsewhere.
pub fn sign_with_signature(
    input: &SigningInput,
    signature: &[u8],
    public_key: &[u8],
) -> TonResult<SigningOutput> {
    let message = message_with_signature(input, signature, public_key)?;
    encode(&message)
}

/// Shared tail of the externally-signed paths: validates the key material,
/// rebuilds the exact message the signature was produced over and folds
/// the signature into the envelope.
///
/// Every field comes from the same `SigningInput` that fed the preimage;
/// re-deriving any of them here would assemble a message whose signature
/// cannot verify on-chain.
pub(crate) fn message_with_signature(
    input: &SigningInput,
    signature: &[u8],
    public_key: &[u8],
) -> TonResult<Cell> {
    let signature: &[u8; 64] = signature
        .try_into()
        .map_err(|_| TonError::invalid_params("signature must be 64 bytes"))?;
    let public_key: [u8; 32] = public_key
        .try_into()
        .map_err(|_| TonError::invalid_params("public key must be 32 bytes"))?;

    let transfer = input
        .transfer()
        .ok_or_else(|| TonError::invalid_params("missing transfer action"))?;
    if !transfer.wallet_version.is_supported() {
        return Err(TonError::invalid_params("Unsupported wallet version"));
    }

    let wallet = WalletV4R2::new(public_key, WORKCHAIN_BASE)?;
    let (params, body) = resolve_message(input)?;

    log_debug!(
        "signer",
        "external signature folded in",
        dest = transfer.dest,
        sequence_number = transfer.sequence_number,
    );

    wallet
        .transfer_with_signature(signature, &params, body)
        .map_err(TonError::from)
}

// =============================================================================
// Message Resolution
// =============================================================================

/// Resolve the wire-level parameters and the body cell for the active
/// action variant.
fn resolve_message(input: &SigningInput) -> TonResult<(TransferParams, Arc<Cell>)> {
    let action = input
        .action
        .as_ref()
        .ok_or_else(|| TonError::invalid_params("missing transfer action"))?;

    match action {
        TransferAction::Transfer(transfer) => {
            let params = transfer_params(transfer)?;
            let body = payload::comment_payload(&transfer.comment)?;
            Ok((params, Arc::new(body)))
        }
        TransferAction::JettonTransfer(jetton) => {
            let params = transfer_params(&jetton.transfer)?;
            let to_owner: TonAddress = jetton.to_owner.parse()?;
            let response: TonAddress = jetton.response_address.parse()?;
            let body = payload::jetton_transfer_payload(
                &to_owner,
                &response,
                jetton.jetton_amount,
                jetton.forward_amount,
                &jetton.transfer.comment,
                jetton.query_id,
            )?;
            Ok((params, Arc::new(body)))
        }
    }
}

fn transfer_params(transfer: &Transfer) -> TonResult<TransferParams> {
    let mut dest: TonAddress = transfer.dest.parse()?;
    // the input's bounce flag wins over whatever form the address text used
    dest.bounceable = transfer.bounceable;

    Ok(TransferParams {
        dest,
        amount: transfer.amount,
        // the wallet contract carries 32-bit nonce and expiry fields
        sequence_number: transfer.sequence_number as u32,
        mode: transfer.mode,
        expire_at: transfer.expire_at as u32,
    })
}

fn encode(message: &Cell) -> TonResult<SigningOutput> {
    let boc = cell::serialize(message)?;
    Ok(SigningOutput {
        encoded: STANDARD.encode(boc),
    })
}
