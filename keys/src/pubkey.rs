// Modern, minimalistic & standard-compliant cold wallet library.
//
// SPDX-License-Identifier: Apache-2.0
//
// Written in 2020-2024 by
//     Dr Maxim Orlovsky <orlovsky@lnp-bp.org>
//
// Copyright (C) 2020-2024 LNP/BP Standards Association. All rights reserved.
// Copyright (C) 2020-2024 Dr Maxim Orlovsky. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Raw ECDSA public keys of multisig participants.

use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use amplify::hex::{FromHex, ToHex};
use bc::secp256k1::{self, PublicKey};

/// Errors in hex-encoded strings.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum HexError {
    /// Invalid hex: odd-length string.
    OddLength,

    /// Invalid hex: only characters a-f, A-F and 0-9 allowed.
    InvalidChar,
}

/// Errors validating hex-encoded public keys.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum PubkeyError {
    /// Public key cannot be blank.
    Blank,

    #[display(inner)]
    #[from]
    Hex(HexError),

    /// Invalid public key: {0}
    #[from]
    Invalid(secp256k1::Error),
}

/// Checks that the string is an even-length sequence of hex digits. An empty
/// string is valid hex.
pub fn validate_hex(s: &str) -> Result<(), HexError> {
    if s.len() % 2 != 0 {
        return Err(HexError::OddLength);
    }
    if !s.bytes().all(|c| c.is_ascii_hexdigit()) {
        return Err(HexError::InvalidChar);
    }
    Ok(())
}

/// Checks that the string is a hex-encoded compressed or uncompressed
/// secp256k1 point.
pub fn validate_public_key(hex: &str) -> Result<(), PubkeyError> {
    SignerPk::from_str(hex).map(|_| ())
}

/// Detects whether a hex-encoded string is a valid public key in the 33-byte
/// compressed form. Strings which are not valid keys are never compressed.
pub fn is_compressed(hex: &str) -> bool {
    SignerPk::from_str(hex).is_ok_and(|pk| pk.is_compressed())
}

/// Compresses an uncompressed public key: takes the X coordinate and prefixes
/// it with `02` for even Y or `03` for odd Y. Does not check that the point is
/// on the curve.
pub fn compress_public_key(uncompressed: &[u8; 65]) -> [u8; 33] {
    let mut compressed = [0u8; 33];
    compressed[0] = if uncompressed[64] & 1 == 0 { 0x02 } else { 0x03 };
    compressed[1..].copy_from_slice(&uncompressed[1..33]);
    compressed
}

/// Validates a hex-encoded public key and returns its compressed hex form.
pub fn compress_public_key_hex(hex: &str) -> Result<String, PubkeyError> {
    let pk = SignerPk::from_str(hex)?;
    Ok(pk.to_compressed().to_string())
}

/// Public key of a multisig participant, which remembers whether it was
/// provided in compressed or uncompressed form, since both forms produce
/// different scripts.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct SignerPk {
    pubkey: PublicKey,
    compressed: bool,
}

impl SignerPk {
    pub fn compressed(pubkey: PublicKey) -> Self {
        SignerPk {
            pubkey,
            compressed: true,
        }
    }

    pub fn uncompressed(pubkey: PublicKey) -> Self {
        SignerPk {
            pubkey,
            compressed: false,
        }
    }

    /// Parses 33-byte compressed or 65-byte uncompressed key serialization.
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> Result<Self, secp256k1::Error> {
        let bytes = bytes.as_ref();
        let pubkey = PublicKey::from_slice(bytes)?;
        Ok(SignerPk {
            pubkey,
            compressed: bytes.len() == 33,
        })
    }

    pub fn pubkey(&self) -> PublicKey { self.pubkey }

    pub fn is_compressed(&self) -> bool { self.compressed }

    pub fn to_compressed(&self) -> Self { Self::compressed(self.pubkey) }

    pub fn serialize(&self) -> Vec<u8> {
        match self.compressed {
            true => self.pubkey.serialize().to_vec(),
            false => self.pubkey.serialize_uncompressed().to_vec(),
        }
    }
}

impl From<PublicKey> for SignerPk {
    fn from(pubkey: PublicKey) -> Self { SignerPk::compressed(pubkey) }
}

impl Ord for SignerPk {
    fn cmp(&self, other: &Self) -> Ordering { self.serialize().cmp(&other.serialize()) }
}

impl PartialOrd for SignerPk {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> { Some(self.cmp(other)) }
}

impl Display for SignerPk {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result { f.write_str(&self.serialize().to_hex()) }
}

impl FromStr for SignerPk {
    type Err = PubkeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(PubkeyError::Blank);
        }
        validate_hex(s)?;
        let bytes = Vec::<u8>::from_hex(s).map_err(|_| HexError::InvalidChar)?;
        Ok(SignerPk::from_bytes(bytes)?)
    }
}
