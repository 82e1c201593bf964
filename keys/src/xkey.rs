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

use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use amplify::{ByteArray, Bytes20, Bytes32, Bytes4, Wrapper};
use bc::secp256k1::{self, PublicKey, Scalar, Secp256k1};
use bitcoin_hashes::{hash160, sha512, Hash, HashEngine, Hmac, HmacEngine};
use invoice::{base58, Network};

use crate::{SignerPk, XpubPrefix};

/// Index starting from which BIP32 child numbers denote hardened derivation.
pub const HARDENED_INDEX_BOUNDARY: u32 = 1 << 31;

#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum XkeyDecodeError {
    /// wrong length of extended pubkey data ({0}).
    WrongExtendedKeyLength(usize),

    /// unknown extended key version {0:02x?}.
    UnknownKeyType([u8; 4]),

    /// extended key has version prefix {found} which is not valid for {network}.
    NetworkMismatch { found: XpubPrefix, network: Network },

    /// master key (depth 0) must have zero parent fingerprint.
    NonZeroParentFp,

    /// master key (depth 0) must have zero child number.
    NonZeroChildNumber,

    /// extended pubkey contains invalid public key - {0}
    #[from]
    InvalidPubkey(secp256k1::Error),
}

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum XkeyParseError {
    /// wrong Base58 encoding of extended pubkey data - {0}
    #[from]
    Base58(base58::Error),

    #[display(inner)]
    #[from]
    Decode(XkeyDecodeError),

    /// invalid derivation path '{0}'.
    InvalidPath(String),

    /// hardened index {0} can't be derived from an extended public key.
    HardenedDerivation(u32),

    /// derivation at depth {0} produced an invalid key.
    InvalidChild(u8),
}

/// BIP32 chain code used for hierarchical derivation
#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
#[wrapper(Deref, RangeOps)]
pub struct ChainCode(Bytes32);

impl AsRef<[u8]> for ChainCode {
    fn as_ref(&self) -> &[u8] { self.0.as_ref() }
}

impl From<[u8; 32]> for ChainCode {
    fn from(value: [u8; 32]) -> Self { Self(value.into()) }
}

/// First four bytes of the extended key identifier.
#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Default, Debug, Display, From)]
#[wrapper(RangeOps, Hex, FromStr)]
#[display(LowerHex)]
pub struct XpubFp(
    #[from]
    #[from([u8; 4])]
    Bytes4,
);

impl AsRef<[u8]> for XpubFp {
    fn as_ref(&self) -> &[u8] { self.0.as_ref() }
}

impl XpubFp {
    pub const fn master() -> Self { Self(Bytes4::zero()) }
}

/// HASH160 of the extended key public key.
#[derive(Wrapper, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Default, Debug, Display, From)]
#[wrapper(RangeOps, Hex, FromStr)]
#[display(LowerHex)]
pub struct XpubId(
    #[from]
    #[from([u8; 20])]
    Bytes20,
);

impl AsRef<[u8]> for XpubId {
    fn as_ref(&self) -> &[u8] { self.0.as_ref() }
}

/// BIP32 extended public key under any of SLIP-132 version prefixes.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Xpub {
    prefix: XpubPrefix,
    depth: u8,
    parent_fp: XpubFp,
    child_number: u32,
    chain_code: ChainCode,
    public_key: PublicKey,
}

impl Xpub {
    /// Decodes 78-byte BIP32 serialization.
    pub fn decode(data: impl Borrow<[u8]>) -> Result<Xpub, XkeyDecodeError> {
        let data = data.borrow();

        if data.len() != 78 {
            return Err(XkeyDecodeError::WrongExtendedKeyLength(data.len()));
        }

        let mut version = [0u8; 4];
        version.copy_from_slice(&data[0..4]);
        let prefix =
            XpubPrefix::from_version(version).ok_or(XkeyDecodeError::UnknownKeyType(version))?;

        let depth = data[4];

        let mut parent_fp = [0u8; 4];
        parent_fp.copy_from_slice(&data[5..9]);

        let mut child_number = [0u8; 4];
        child_number.copy_from_slice(&data[9..13]);
        let child_number = u32::from_be_bytes(child_number);

        if depth == 0 && parent_fp != [0u8; 4] {
            return Err(XkeyDecodeError::NonZeroParentFp);
        }
        if depth == 0 && child_number != 0 {
            return Err(XkeyDecodeError::NonZeroChildNumber);
        }

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&data[13..45]);

        let public_key = PublicKey::from_slice(&data[45..78])?;

        Ok(Xpub {
            prefix,
            depth,
            parent_fp: parent_fp.into(),
            child_number,
            chain_code: chain_code.into(),
            public_key,
        })
    }

    /// Decodes BIP32 serialization requiring the version bytes defined by
    /// BIP32 for the network (`xpub` or `tpub`).
    pub fn decode_for(data: impl Borrow<[u8]>, network: Network) -> Result<Xpub, XkeyDecodeError> {
        let xpub = Self::decode(data)?;
        if xpub.prefix != XpubPrefix::canonical(network) {
            return Err(XkeyDecodeError::NetworkMismatch {
                found: xpub.prefix,
                network,
            });
        }
        Ok(xpub)
    }

    pub fn encode(&self) -> [u8; 78] {
        let mut ret = [0; 78];
        ret[0..4].copy_from_slice(&self.prefix.version());
        ret[4] = self.depth;
        ret[5..9].copy_from_slice(self.parent_fp.as_ref());
        ret[9..13].copy_from_slice(&self.child_number.to_be_bytes());
        ret[13..45].copy_from_slice(self.chain_code.as_ref());
        ret[45..78].copy_from_slice(&self.public_key.serialize());
        ret
    }

    pub fn prefix(&self) -> XpubPrefix { self.prefix }

    pub fn network(&self) -> Network { self.prefix.network() }

    pub fn depth(&self) -> u8 { self.depth }

    pub fn child_number(&self) -> u32 { self.child_number }

    pub fn parent_fp(&self) -> XpubFp { self.parent_fp }

    pub fn chain_code(&self) -> ChainCode { self.chain_code }

    pub fn public_key(&self) -> PublicKey { self.public_key }

    pub fn to_signer_pk(&self) -> SignerPk { SignerPk::compressed(self.public_key) }

    /// Returns the same key under a different version prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: XpubPrefix) -> Self {
        self.prefix = prefix;
        self
    }

    /// Returns the HASH160 of the public key
    pub fn identifier(&self) -> XpubId {
        let hash = hash160::Hash::hash(&self.public_key.serialize());
        XpubId::from_byte_array(hash.to_byte_array())
    }

    pub fn fingerprint(&self) -> XpubFp {
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.identifier()[..4]);
        XpubFp::from_byte_array(bytes)
    }

    /// Public->Public child key derivation
    pub fn ckd_pub(&self, child_no: u32) -> Result<Xpub, XkeyParseError> {
        if child_no >= HARDENED_INDEX_BOUNDARY {
            return Err(XkeyParseError::HardenedDerivation(child_no));
        }
        let depth = self.depth.checked_add(1).ok_or(XkeyParseError::InvalidChild(self.depth))?;

        let mut hmac_engine: HmacEngine<sha512::Hash> =
            HmacEngine::new(self.chain_code.as_ref());
        hmac_engine.input(&self.public_key.serialize());
        hmac_engine.input(&child_no.to_be_bytes());
        let hmac = Hmac::<sha512::Hash>::from_engine(hmac_engine).to_byte_array();

        let mut tweak = [0u8; 32];
        tweak.copy_from_slice(&hmac[..32]);
        let tweak = Scalar::from_be_bytes(tweak).map_err(|_| XkeyParseError::InvalidChild(depth))?;
        let public_key = self
            .public_key
            .add_exp_tweak(&Secp256k1::verification_only(), &tweak)
            .map_err(|_| XkeyParseError::InvalidChild(depth))?;

        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&hmac[32..]);

        Ok(Xpub {
            prefix: self.prefix,
            depth,
            parent_fp: self.fingerprint(),
            child_number: child_no,
            chain_code: chain_code.into(),
            public_key,
        })
    }

    /// Derives a child extended public key following the path of normal
    /// (non-hardened) indexes.
    pub fn derive_pub(&self, path: impl AsRef<[u32]>) -> Result<Xpub, XkeyParseError> {
        path.as_ref().iter().try_fold(*self, |xpub, index| xpub.ckd_pub(*index))
    }
}

impl Display for Xpub {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        base58::encode_check_to_fmt(f, &self.encode())
    }
}

impl FromStr for Xpub {
    type Err = XkeyParseError;

    fn from_str(inp: &str) -> Result<Xpub, XkeyParseError> {
        let data = base58::decode_check(inp)?;
        Ok(Xpub::decode(data)?)
    }
}

/// Parses derivation path of normal indexes, like `m/0/1` or `0/1`. Hardened
/// segments are reported as [`XkeyParseError::HardenedDerivation`].
pub fn parse_derivation_path(path: &str) -> Result<Vec<u32>, XkeyParseError> {
    let full = path.trim();
    let path = match full.strip_prefix('m') {
        Some(rest) if rest.is_empty() => return Ok(vec![]),
        Some(rest) => {
            rest.strip_prefix('/').ok_or_else(|| XkeyParseError::InvalidPath(full.to_owned()))?
        }
        None if full.is_empty() => return Ok(vec![]),
        None => full,
    };
    path.split('/')
        .map(|seg| {
            if let Some(hardened) = seg.strip_suffix(['\'', 'h']) {
                let index = u32::from_str(hardened)
                    .map_err(|_| XkeyParseError::InvalidPath(seg.to_owned()))?;
                return Err(XkeyParseError::HardenedDerivation(
                    index.saturating_add(HARDENED_INDEX_BOUNDARY),
                ));
            }
            match u32::from_str(seg) {
                Ok(index) if index < HARDENED_INDEX_BOUNDARY => Ok(index),
                Ok(index) => Err(XkeyParseError::HardenedDerivation(index)),
                Err(_) => Err(XkeyParseError::InvalidPath(seg.to_owned())),
            }
        })
        .collect()
}

/// Derives a child public key from an extended public key which must be
/// valid for the network.
pub fn derive_child_public_key(
    xpub: &str,
    path: &str,
    network: Network,
) -> Result<SignerPk, XkeyParseError> {
    let data = base58::decode_check(xpub.trim())?;
    let xpub = Xpub::decode_for(data, network)?;
    let path = parse_derivation_path(path)?;
    Ok(xpub.derive_pub(path)?.to_signer_pk())
}
