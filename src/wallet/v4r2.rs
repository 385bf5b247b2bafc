//! Wallet contract v4r2.
//!
//! Owns everything specific to this contract revision:
//! - the compiled contract code and the initial data layout,
//! - the address derived from the state-init hash,
//! - the signing payload the contract verifies on-chain,
//! - assembly of the external message envelope (with the state init
//!   attached on the very first, deploying transfer).
//!
//! The three public operations mirror the three signing paths: sign with a
//! local key, expose the unsigned payload for an external signer, or fold a
//! ready-made signature into the envelope.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey};

use crate::address::TonAddress;
use crate::cell::{self, Cell, CellBuilder, CellError, CellResult};

/// Subwallet id this revision embeds in its persistent data and checks in
/// every signed payload.
pub const WALLET_ID: u32 = 698_983_191;

/// Expiry sentinel carried by the deploying (sequence number zero) message.
const DEPLOY_EXPIRE_AT: u32 = u32::MAX;

/// Compiled v4r2 contract code, bag-of-cells form.
const CODE_BASE64: &str = "te6ccgICABQAAQAAAucAAAEU/wD0pBP0vPLICwABAgEgAAcAAgT48oMI1xgg0x/TH9MfAvgju/Jk7UTQ0x/TH9P/9ATRUUO68qFRUbryogX5AVQQZPkQ8qP4ACSkyMsfUkDLH1Iwy/9SEPQAye1U+A8B0wchwACfbFGTINdKltMH1AL7AOgw4CHAAeMAIcAC4wABwAORMOMNA6TIyx8Syx/L/wAGAAUABAADAAr0AMntVABsgQEI1xj6ANM/MFIkgQEI9Fnyp4IQZHN0cnB0gBjIywXLAlAFzxZQA/oCE8tqyx8Syz/Jc/sAAHCBAQjXGPoA0z/IVCBHgQEI9FHyp4IQbm90ZXB0gBjIywXLAlAGzxZQBPoCFMtqEssfyz/Jc/sAAgBu0gf6ANTUIvkABcjKBxXL/8nQd3SAGMjLBcsCIs8WUAX6AhTLaxLMzMlz+wDIQBSBAQj0UfKnAgIBSAARAAgCASAACgAJAFm9JCtvaiaECAoGuQ+gIYRw1AgIR6STfSmRDOaQPp/5g3gSgBt4EBSJhxWfMYQCASAADAALABG4yX7UTQ1wsfgCAVgAEAANAgEgAA8ADgAZrx32omhAEGuQ64WPwAAZrc52omhAIGuQ64X/wAA9sp37UTQgQFA1yH0BDACyMoHy//J0AGBAQj0Cm+hMYALm0AHQ0wMhcbCSXwTgItdJwSCSXwTgAtMfIYIQcGx1Z70ighBkc3RyvbCSXwXgA/pAMCD6RAHIygfL/8nQ7UTQgQFA1yH0BDBcgQEI9ApvoTGzkl8H4AXTP8glghBwbHVnupI4MOMNA4IQZHN0crqSXwbjDQATABIAilAEgQEI9Fkw7UTQgQFA1yDIAc8W9ADJ7VQBcrCOI4IQZHN0coMesXCAGFAFywVQA88WI/oCE8tqyx/LP8mAQPsAkl8D4gB4AfoA9AQw+CdvIjBQCqEhvvLgUIIQcGx1Z4MesXCAGFAEywUmzxZY+gIZ9ADLaRfLH1Jgyz8gyYBA+wAG";

/// Parse the embedded contract code into its cell tree.
pub fn code_cell() -> CellResult<Arc<Cell>> {
    let boc = STANDARD
        .decode(CODE_BASE64)
        .map_err(|_| CellError::UnsupportedBoc("wallet code constant"))?;
    cell::parse(&boc)
}

/// Resolved wire-level parameters of a single outgoing transfer.
#[derive(Debug, Clone)]
pub struct TransferParams {
    /// Parsed destination; its bounce flag drives the internal message.
    pub dest: TonAddress,
    /// Amount in nanoton.
    pub amount: u64,
    /// Account nonce of the sending wallet.
    pub sequence_number: u32,
    /// Send-mode flag byte.
    pub mode: u8,
    /// Expiration unix timestamp, ignored for the deploying message.
    pub expire_at: u32,
}

/// A v4r2 wallet instance: state init plus the address it hashes to.
pub struct WalletV4R2 {
    state_init: Arc<Cell>,
    address: TonAddress,
}

impl WalletV4R2 {
    pub fn new(public_key: [u8; 32], workchain: i8) -> CellResult<Self> {
        let code = code_cell()?;
        let data = initial_data_cell(&public_key)?;
        let state_init = Arc::new(state_init_cell(code, Arc::new(data))?);
        let address = TonAddress::new(workchain, state_init.repr_hash());
        Ok(Self {
            state_init,
            address,
        })
    }

    pub fn address(&self) -> &TonAddress {
        &self.address
    }

    pub fn state_init(&self) -> &Arc<Cell> {
        &self.state_init
    }

    /// The unsigned payload the contract verifies: subwallet id, expiry,
    /// sequence number, op, send mode, and the internal message as a
    /// reference. This cell's representation hash is what gets signed.
    pub fn signing_payload(
        &self,
        params: &TransferParams,
        body: Arc<Cell>,
    ) -> CellResult<Cell> {
        let expire_at = if params.sequence_number == 0 {
            DEPLOY_EXPIRE_AT
        } else {
            params.expire_at
        };

        let mut builder = CellBuilder::new();
        builder
            .append_u32(WALLET_ID)
            .append_u32(expire_at)
            .append_u32(params.sequence_number)
            .append_u8(0) // op: simple send
            .append_u8(params.mode)
            .append_ref(Arc::new(internal_message(params, body)?));
        builder.build()
    }

    /// Sign a transfer with a locally held key and wrap it into the
    /// external message envelope.
    pub fn signed_transfer(
        &self,
        private_key: &SigningKey,
        params: &TransferParams,
        body: Arc<Cell>,
    ) -> CellResult<Cell> {
        let payload = self.signing_payload(params, body)?;
        let signature = private_key.sign(&payload.repr_hash()).to_bytes();
        self.assemble(&signature, &payload, params.sequence_number)
    }

    /// Wrap a signature produced elsewhere around the same payload the
    /// local path would have signed.
    pub fn transfer_with_signature(
        &self,
        signature: &[u8; 64],
        params: &TransferParams,
        body: Arc<Cell>,
    ) -> CellResult<Cell> {
        let payload = self.signing_payload(params, body)?;
        self.assemble(signature, &payload, params.sequence_number)
    }

    fn assemble(
        &self,
        signature: &[u8; 64],
        payload: &Cell,
        sequence_number: u32,
    ) -> CellResult<Cell> {
        let mut body = CellBuilder::new();
        body.append_bytes(signature).append_cell(payload);
        let signed_body = body.build()?;

        let mut builder = CellBuilder::new();
        builder
            .append_bit(true) // ext_in_msg_info$10
            .append_bit(false)
            .append_addr_none() // source filled in by the network
            .append_addr_std(self.address.workchain, &self.address.account_id)
            .append_coins(0); // import fee
        if sequence_number == 0 {
            // the first message deploys the contract: state init rides along
            builder.append_bit(true).append_bit(true);
            builder.append_ref(self.state_init.clone());
        } else {
            builder.append_bit(false);
        }
        builder.append_bit(true); // body as reference
        builder.append_ref(Arc::new(signed_body));
        builder.build()
    }
}

/// Internal transfer message: flags, destination, amount, zeroed fee and
/// lt/time fields (the validator fills them in), body as a reference.
fn internal_message(params: &TransferParams, body: Arc<Cell>) -> CellResult<Cell> {
    let dest = &params.dest;
    let mut builder = CellBuilder::new();
    builder
        .append_bit(false) // int_msg_info$0
        .append_bit(true) // ihr disabled
        .append_bit(dest.bounceable)
        .append_bit(false) // not a bounce
        .append_addr_none() // source filled in by the network
        .append_addr_std(dest.workchain, &dest.account_id)
        .append_coins(params.amount)
        .append_bit(false) // no extra currencies
        .append_coins(0) // ihr fee
        .append_coins(0) // forwarding fee
        .append_u64(0) // created_lt
        .append_u32(0) // created_at
        .append_bit(false) // no state init
        .append_bit(true) // body as reference
        .append_ref(body);
    builder.build()
}

/// Initial persistent data: zero seqno, subwallet id, owner public key and
/// an empty plugin dictionary.
fn initial_data_cell(public_key: &[u8; 32]) -> CellResult<Cell> {
    let mut builder = CellBuilder::new();
    builder
        .append_u32(0)
        .append_u32(WALLET_ID)
        .append_bytes(public_key)
        .append_bit(false);
    builder.build()
}

fn state_init_cell(code: Arc<Cell>, data: Arc<Cell>) -> CellResult<Cell> {
    // no split depth, not special, code and data present, no libraries
    let mut builder = CellBuilder::new();
    builder
        .append_bit(false)
        .append_bit(false)
        .append_bit(true)
        .append_bit(true)
        .append_bit(false)
        .append_ref(code)
        .append_ref(data);
    builder.build()
}
