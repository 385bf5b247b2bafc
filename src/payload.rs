//! Message body payloads carried inside transfer messages.
//!
//! Two body shapes exist:
//! - a text comment: op `0` followed by the raw UTF-8 bytes, or an empty
//!   cell when there is no comment,
//! - a TEP-74 jetton transfer: op `0x0f8a7ea5` plus the token routing
//!   fields, with the comment inlined as the forward payload.
//!
//! The body always travels as a reference cell of the internal message, so
//! builders here return a bare [`Cell`] for the caller to wrap.

use crate::address::TonAddress;
use crate::cell::{Cell, CellBuilder, CellResult};

/// Op code of a plain text-comment body.
const COMMENT_OP: u32 = 0;

/// TEP-74 `transfer` op code.
const JETTON_TRANSFER_OP: u32 = 0x0f8a7ea5;

/// Build the message body of a plain transfer.
pub fn comment_payload(comment: &str) -> CellResult<Cell> {
    let mut builder = CellBuilder::new();
    if !comment.is_empty() {
        builder.append_u32(COMMENT_OP).append_bytes(comment.as_bytes());
    }
    builder.build()
}

/// Build a TEP-74 jetton transfer body.
///
/// Layout: op, query id, token amount, destination owner, response address,
/// absent custom payload, forwarded TON amount, then the forward payload
/// inlined in the same cell (comment op + bytes when the comment is
/// non-empty). `response_address` receives the excess TON and the transfer
/// notification.
pub fn jetton_transfer_payload(
    to_owner: &TonAddress,
    response_address: &TonAddress,
    jetton_amount: u64,
    forward_amount: u64,
    comment: &str,
    query_id: u64,
) -> CellResult<Cell> {
    let mut builder = CellBuilder::new();
    builder
        .append_u32(JETTON_TRANSFER_OP)
        .append_u64(query_id)
        .append_coins(jetton_amount)
        .append_addr_std(to_owner.workchain, &to_owner.account_id)
        .append_addr_std(response_address.workchain, &response_address.account_id)
        .append_bit(false) // no custom payload
        .append_coins(forward_amount)
        .append_bit(false); // forward payload inline, not a reference
    if !comment.is_empty() {
        builder.append_u32(COMMENT_OP).append_bytes(comment.as_bytes());
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TO_OWNER: &str = "EQAFwMs5ha8OgZ9M4hQr80z9NkE7rGxUpE1hCFndiY6JnDx8";
    const RESPONSE: &str = "EQBaKIMq5Am2p_rfR1IFTwsNWHxBkOpLTmwUain5Fj4llTXk";

    #[test]
    fn test_empty_comment_is_empty_cell() {
        let cell = comment_payload("").unwrap();
        assert_eq!(cell.bit_len(), 0);
        assert!(cell.refs().is_empty());
    }

    #[test]
    fn test_comment_layout() {
        let cell = comment_payload("test comment").unwrap();
        assert_eq!(hex::encode(cell.data()), "000000007465737420636f6d6d656e74");
        assert_eq!(
            hex::encode(cell.repr_hash()),
            "9306e875bbe62dc091157df2811d1501422f2ba07f45bdcd72caa9a3cda83559"
        );
    }

    #[test]
    fn test_jetton_transfer_layout() {
        let to_owner: TonAddress = TO_OWNER.parse().unwrap();
        let response: TonAddress = RESPONSE.parse().unwrap();

        let cell =
            jetton_transfer_payload(&to_owner, &response, 1_000_000_000, 1, "", 69).unwrap();

        assert_eq!(cell.bit_len(), 680);
        assert_eq!(
            hex::encode(cell.data()),
            "0f8a7ea5000000000000004543b9aca008000b8196730b5e1d033e99c42857e6\
             99fa6c827758d8a9489ac210b3bb131d133900168a20cab9026da9feb7d1d481\
             53c2c3561f10643a92d39b051a8a7e458f89654202"
        );
        assert_eq!(
            hex::encode(cell.repr_hash()),
            "3b2599e2c200fabdb23529127524b206cbe8c696c0117f38c1d0ee2c4a184679"
        );
    }

    #[test]
    fn test_jetton_transfer_with_forward_comment() {
        let to_owner: TonAddress = TO_OWNER.parse().unwrap();
        let response: TonAddress = RESPONSE.parse().unwrap();

        let cell =
            jetton_transfer_payload(&to_owner, &response, 500_000_000, 1, "test comment", 0)
                .unwrap();

        // comment op + bytes ride at the tail of the same cell
        let data = hex::encode(cell.data());
        assert!(data.ends_with("000000007465737420636f6d6d656e74"));
        assert_eq!(
            hex::encode(cell.repr_hash()),
            "18f8e90bb6ec6467bbbf3f3827399aa0b73302bacf87ec610043760fd31debef"
        );
    }
}
