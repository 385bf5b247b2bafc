//! TON address codec.
//!
//! Addresses come in two text forms: raw (`workchain:hex_account_id`) and
//! user-friendly, a 48-character base64 string packing a tag byte (bounce
//! and testnet flags), the workchain, the 32-byte account id and a
//! crc16-xmodem checksum. Both alphabets (standard and url-safe) are
//! accepted on input; output is url-safe without padding.

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const USER_FRIENDLY_LEN: usize = 48;
const DECODED_LEN: usize = 36;

const TAG_BOUNCEABLE: u8 = 0x11;
const TAG_NON_BOUNCEABLE: u8 = 0x51;
const TAG_TEST_ONLY: u8 = 0x80;

/// Error types for address parsing
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    #[error("Invalid address length: {0}")]
    BadLength(usize),

    #[error("Invalid base64 in address")]
    BadBase64,

    #[error("Invalid address tag byte: {0:#04x}")]
    BadTag(u8),

    #[error("Invalid address checksum")]
    BadChecksum,

    #[error("Invalid raw address: {0}")]
    BadRawForm(String),

    #[error("Unsupported workchain: {0}")]
    BadWorkchain(i32),
}

/// A parsed TON address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TonAddress {
    /// Workchain id: 0 for the basechain, -1 for the masterchain.
    pub workchain: i8,
    /// 32-byte hash of the account's initial state.
    #[serde(with = "crate::serde_bytes::hex32")]
    pub account_id: [u8; 32],
    /// Bounce flag carried by the user-friendly form.
    pub bounceable: bool,
    /// Testnet flag carried by the user-friendly form.
    pub testnet: bool,
}

impl TonAddress {
    pub fn new(workchain: i8, account_id: [u8; 32]) -> Self {
        Self {
            workchain,
            account_id,
            bounceable: true,
            testnet: false,
        }
    }

    /// Render the user-friendly form with explicit flags, url-safe base64
    /// without padding.
    pub fn to_user_friendly(&self, bounceable: bool, testnet: bool) -> String {
        let mut data = Vec::with_capacity(DECODED_LEN);

        let mut tag = if bounceable {
            TAG_BOUNCEABLE
        } else {
            TAG_NON_BOUNCEABLE
        };
        if testnet {
            tag |= TAG_TEST_ONLY;
        }
        data.push(tag);
        data.push(self.workchain as u8);
        data.extend_from_slice(&self.account_id);

        let crc = crc16_xmodem(&data);
        data.extend_from_slice(&crc.to_be_bytes());

        URL_SAFE_NO_PAD.encode(data)
    }

    /// Render the raw form `workchain:hex_account_id`.
    pub fn to_raw(&self) -> String {
        format!("{}:{}", self.workchain, hex::encode(self.account_id))
    }

    fn from_user_friendly(s: &str) -> Result<Self, AddressError> {
        // url-safe and standard alphabets differ only in these two characters
        let bytes = if s.contains('-') || s.contains('_') {
            URL_SAFE_NO_PAD.decode(s)
        } else {
            STANDARD_NO_PAD.decode(s)
        }
        .map_err(|_| AddressError::BadBase64)?;

        if bytes.len() != DECODED_LEN {
            return Err(AddressError::BadLength(bytes.len()));
        }

        let crc = u16::from_be_bytes([bytes[34], bytes[35]]);
        if crc != crc16_xmodem(&bytes[..34]) {
            return Err(AddressError::BadChecksum);
        }

        let mut tag = bytes[0];
        let testnet = tag & TAG_TEST_ONLY != 0;
        tag &= !TAG_TEST_ONLY;
        let bounceable = match tag {
            TAG_BOUNCEABLE => true,
            TAG_NON_BOUNCEABLE => false,
            _ => return Err(AddressError::BadTag(bytes[0])),
        };

        let workchain = bytes[1] as i8;
        if workchain != 0 && workchain != -1 {
            return Err(AddressError::BadWorkchain(workchain as i32));
        }

        let mut account_id = [0u8; 32];
        account_id.copy_from_slice(&bytes[2..34]);

        Ok(Self {
            workchain,
            account_id,
            bounceable,
            testnet,
        })
    }

    fn from_raw(s: &str) -> Result<Self, AddressError> {
        let (wc_text, id_text) = s
            .split_once(':')
            .ok_or_else(|| AddressError::BadRawForm(s.to_string()))?;

        let workchain: i32 = wc_text
            .parse()
            .map_err(|_| AddressError::BadRawForm(s.to_string()))?;
        if workchain != 0 && workchain != -1 {
            return Err(AddressError::BadWorkchain(workchain));
        }

        if id_text.len() != 64 {
            return Err(AddressError::BadLength(id_text.len()));
        }
        let id_bytes = hex::decode(id_text).map_err(|_| AddressError::BadRawForm(s.to_string()))?;
        let mut account_id = [0u8; 32];
        account_id.copy_from_slice(&id_bytes);

        Ok(Self::new(workchain as i8, account_id))
    }
}

impl FromStr for TonAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() == USER_FRIENDLY_LEN {
            Self::from_user_friendly(s)
        } else {
            Self::from_raw(s)
        }
    }
}

impl fmt::Display for TonAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_user_friendly(self.bounceable, self.testnet))
    }
}

/// CRC16-XModem, the checksum of the user-friendly address form.
pub(crate) fn crc16_xmodem(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for byte in data {
        crc ^= (*byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ 0x1021;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}
