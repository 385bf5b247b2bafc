//! Wallet contract implementations.
//!
//! Each revision owns its code cell, state init layout and message
//! envelope. Exactly one revision is wired up today; adding another means
//! adding a module here and a dispatch arm in the signer.

pub mod v4r2;

pub use v4r2::{TransferParams, WalletV4R2};
