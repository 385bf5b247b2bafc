//! TON Transaction Signing Core
//!
//! Builds, signs and serializes external messages for TON wallet
//! contracts.
//!
//! # Architecture
//!
//! This crate provides:
//! - **cell**: the cell data model, builder and bag-of-cells codec
//! - **address**: the raw and user-friendly address forms
//! - **payload**: message body payloads (text comment, jetton transfer)
//! - **wallet**: wallet contract state init and message envelopes
//! - **signer**: the preimage builder and the three signing paths
//! - **entry**: the public operation surface
//!
//! Every operation is a synchronous, side-effect-free transformation of a
//! [`types::SigningInput`] value into an output value; nothing persists
//! across calls, so concurrent invocations are independent.
//!
//! # Security
//!
//! This crate uses `zeroize` to clear private key copies from memory, and
//! the logging layer redacts key material and truncates addresses.
//!
//! # Example
//!
//! ```rust,ignore
//! use toncore::types::{SigningInput, Transfer, TransferAction};
//!
//! let input = SigningInput {
//!     private_key: hex::decode("...")?,
//!     action: Some(TransferAction::Transfer(Transfer {
//!         dest: "EQBm--PFwDv1yCeS-QTJ-L8oiUpqo9IT1BwgVptlSq3ts90Q".into(),
//!         amount: 10,
//!         sequence_number: 6,
//!         mode: 3,
//!         expire_at: 1671132440,
//!         bounceable: true,
//!         ..Transfer::default()
//!     })),
//!     ..SigningInput::default()
//! };
//! let output = toncore::sign(&input)?;
//! println!("boc: {}", output.encoded);
//! ```

// Core modules
pub mod address;
pub mod cell;
pub mod entry;
pub mod error;
pub mod logging;
pub mod payload;
pub mod serde_bytes;
pub mod signer;
pub mod types;
pub mod wallet;

// Re-export key types for convenience
pub use error::{ErrorCode, TonError, TonResult};
pub use types::{
    JettonTransfer, PreSigningOutput, SigningInput, SigningOutput, Transfer, TransferAction,
    WalletVersion,
};

// Re-export the operation surface at the crate root
pub use entry::{
    compile, derive_address, normalize_address, pre_image_hashes, sign, sign_with_signature,
    validate_address,
};
