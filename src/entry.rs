//! Public operations of the signing core.
//!
//! Four message operations share the orchestrator in [`crate::signer`]:
//! local signing, preimage derivation, batch completion and single
//! externally-signed completion. Three address helpers ride on the same
//! codec the signer uses. Every operation returns a complete value or a
//! complete error, never a half-populated envelope.

use crate::address::{AddressError, TonAddress};
use crate::cell;
use crate::error::{TonError, TonResult};
use crate::signer;
use crate::types::{PreSigningOutput, SigningInput, SigningOutput, WORKCHAIN_BASE};
use crate::wallet::WalletV4R2;

/// Sign a transfer with the private key carried in the input.
pub fn sign(input: &SigningInput) -> TonResult<SigningOutput> {
    signer::sign(input)
}

/// Produce the signing preimage and its digest for an external signer.
///
/// This is the hand-off point for hardware wallets, custody services and
/// threshold signer sets: sign the returned hash out of band, then bring
/// the signature back through [`compile`] or [`sign_with_signature`].
pub fn pre_image_hashes(input: &SigningInput) -> TonResult<PreSigningOutput> {
    if input.action.is_none() {
        return Err(TonError::invalid_params("missing transfer action"));
    }

    let data = signer::build_preimage(input);
    let data_hash = signer::preimage_hash(&data);
    Ok(PreSigningOutput { data, data_hash })
}

/// Complete a transfer from externally produced signatures, returning the
/// raw bag-of-cells bytes of the final message.
///
/// Signatures and public keys are paired positionally and must be
/// non-empty lists of equal length. The wallet contract verifies a single
/// key, so the first pair is folded into the message; further pairs are
/// accepted for forward compatibility but not consulted.
pub fn compile(
    input: &SigningInput,
    signatures: &[Vec<u8>],
    public_keys: &[Vec<u8>],
) -> TonResult<Vec<u8>> {
    if signatures.is_empty() || public_keys.is_empty() {
        return Err(TonError::invalid_params("empty signatures or public keys"));
    }
    if signatures.len() != public_keys.len() {
        return Err(TonError::invalid_params(
            "signatures size and public keys size not equal",
        ));
    }

    let message = signer::message_with_signature(input, &signatures[0], &public_keys[0])?;
    Ok(cell::serialize(&message)?)
}

/// Complete a transfer from one externally produced signature, returning
/// the same base64 envelope as [`sign`].
pub fn sign_with_signature(
    input: &SigningInput,
    signature: &[u8],
    public_key: &[u8],
) -> TonResult<SigningOutput> {
    signer::sign_with_signature(input, signature, public_key)
}

/// `true` when the text parses as either address form.
pub fn validate_address(address: &str) -> bool {
    address.parse::<TonAddress>().is_ok()
}

/// Re-render an address in canonical form: user-friendly, bounceable,
/// mainnet.
pub fn normalize_address(address: &str) -> TonResult<String> {
    let parsed: TonAddress = address
        .parse()
        .map_err(|e: AddressError| TonError::invalid_params(e.to_string()))?;
    Ok(parsed.to_user_friendly(true, false))
}

/// Derive the basechain wallet address controlled by an ed25519 public
/// key, in the default user-friendly form.
pub fn derive_address(public_key: &[u8]) -> TonResult<String> {
    let key: [u8; 32] = public_key
        .try_into()
        .map_err(|_| TonError::invalid_params("public key must be 32 bytes"))?;

    let wallet = WalletV4R2::new(key, WORKCHAIN_BASE)?;
    Ok(wallet.address().to_user_friendly(true, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::types::{Transfer, TransferAction};

    fn ordinary_input() -> SigningInput {
        SigningInput {
            action: Some(TransferAction::Transfer(Transfer {
                dest: "EQBm--PFwDv1yCeS-QTJ-L8oiUpqo9IT1BwgVptlSq3ts90Q".to_string(),
                amount: 10,
                sequence_number: 6,
                mode: 3,
                expire_at: 1671132440,
                bounceable: true,
                ..Transfer::default()
            })),
            ..SigningInput::default()
        }
    }

    #[test]
    fn test_pre_image_hashes_rejects_missing_action() {
        let err = pre_image_hashes(&SigningInput::default()).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParams);
    }

    #[test]
    fn test_pre_image_hashes_digest_matches_data() {
        let output = pre_image_hashes(&ordinary_input()).unwrap();
        assert_eq!(output.data.len(), 73);
        assert_eq!(output.data_hash, signer::preimage_hash(&output.data));
    }

    #[test]
    fn test_compile_list_validation() {
        let input = ordinary_input();
        let sig = vec![0u8; 64];
        let key = vec![0u8; 32];

        let err = compile(&input, &[], &[]).unwrap_err();
        assert_eq!(err.message, "empty signatures or public keys");

        let err = compile(&input, &[sig.clone()], &[]).unwrap_err();
        assert_eq!(err.message, "empty signatures or public keys");

        let err = compile(&input, &[sig.clone(), sig], &[key]).unwrap_err();
        assert_eq!(err.message, "signatures size and public keys size not equal");
    }

    #[test]
    fn test_validate_address() {
        assert!(validate_address(
            "EQBm--PFwDv1yCeS-QTJ-L8oiUpqo9IT1BwgVptlSq3ts90Q"
        ));
        assert!(validate_address(
            "0:66fbe3c5c03bf5c82792f904c9f8bf28894a6aa3d213d41c20569b654aadedb3"
        ));
        assert!(!validate_address(""));
        assert!(!validate_address(
            "EQBm--PFwDv1yCeS-QTJ-L8oiUpqo9IT1BwgVptlSq3ts90R"
        ));
    }

    #[test]
    fn test_normalize_address() {
        // non-bounceable text form renders back as the bounceable default
        assert_eq!(
            normalize_address("UQBm--PFwDv1yCeS-QTJ-L8oiUpqo9IT1BwgVptlSq3ts4DV").unwrap(),
            "EQBm--PFwDv1yCeS-QTJ-L8oiUpqo9IT1BwgVptlSq3ts90Q"
        );
        // raw form gains the user-friendly rendering
        assert_eq!(
            normalize_address("0:66fbe3c5c03bf5c82792f904c9f8bf28894a6aa3d213d41c20569b654aadedb3")
                .unwrap(),
            "EQBm--PFwDv1yCeS-QTJ-L8oiUpqo9IT1BwgVptlSq3ts90Q"
        );

        let err = normalize_address("junk").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParams);
    }

    #[test]
    fn test_derive_address() {
        let key =
            hex::decode("f42c77f931bea20ec5d0150731276bbb2e2860947661245b2319ef8133ee8d41")
                .unwrap();
        assert_eq!(
            derive_address(&key).unwrap(),
            "EQBm--PFwDv1yCeS-QTJ-L8oiUpqo9IT1BwgVptlSq3ts90Q"
        );

        let err = derive_address(&[0u8; 31]).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidParams);
    }
}
