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

//! SLIP-132 version prefixes of extended public keys and conversion between
//! them.

use std::str::FromStr;

use invoice::{base58, Network};

/// Version prefix of a Base58Check-encoded extended public key, as registered
/// in SLIP-132. The first four characters of an encoded key always spell the
/// prefix, since the version occupies the leading payload bytes.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
pub enum XpubPrefix {
    /// Mainnet P2PKH or P2SH (BIP32, BIP44)
    #[display("xpub")]
    Xpub,

    /// Mainnet P2WPKH in P2SH (BIP49)
    #[display("ypub")]
    Ypub,

    /// Mainnet P2WPKH (BIP84)
    #[display("zpub")]
    Zpub,

    /// Mainnet multi-signature P2WSH in P2SH
    #[display("Ypub")]
    YpubMultisig,

    /// Mainnet multi-signature P2WSH
    #[display("Zpub")]
    ZpubMultisig,

    /// Testnet P2PKH or P2SH (BIP32, BIP44)
    #[display("tpub")]
    Tpub,

    /// Testnet P2WPKH in P2SH (BIP49)
    #[display("upub")]
    Upub,

    /// Testnet P2WPKH (BIP84)
    #[display("vpub")]
    Vpub,

    /// Testnet multi-signature P2WSH in P2SH
    #[display("Upub")]
    UpubMultisig,

    /// Testnet multi-signature P2WSH
    #[display("Vpub")]
    VpubMultisig,
}

impl XpubPrefix {
    pub const ALL: [XpubPrefix; 10] = [
        XpubPrefix::Xpub,
        XpubPrefix::Ypub,
        XpubPrefix::Zpub,
        XpubPrefix::YpubMultisig,
        XpubPrefix::ZpubMultisig,
        XpubPrefix::Tpub,
        XpubPrefix::Upub,
        XpubPrefix::Vpub,
        XpubPrefix::UpubMultisig,
        XpubPrefix::VpubMultisig,
    ];

    /// Returns the four version bytes which start the serialized key.
    pub const fn version(self) -> [u8; 4] {
        match self {
            XpubPrefix::Xpub => [0x04, 0x88, 0xB2, 0x1E],
            XpubPrefix::Ypub => [0x04, 0x9D, 0x7C, 0xB2],
            XpubPrefix::Zpub => [0x04, 0xB2, 0x47, 0x46],
            XpubPrefix::YpubMultisig => [0x02, 0x95, 0xB4, 0x3F],
            XpubPrefix::ZpubMultisig => [0x02, 0xAA, 0x7E, 0xD3],
            XpubPrefix::Tpub => [0x04, 0x35, 0x87, 0xCF],
            XpubPrefix::Upub => [0x04, 0x4A, 0x52, 0x62],
            XpubPrefix::Vpub => [0x04, 0x5F, 0x1C, 0xF6],
            XpubPrefix::UpubMultisig => [0x02, 0x42, 0x89, 0xEF],
            XpubPrefix::VpubMultisig => [0x02, 0x57, 0x54, 0x83],
        }
    }

    pub fn from_version(version: [u8; 4]) -> Option<Self> {
        Self::ALL.into_iter().find(|prefix| prefix.version() == version)
    }

    pub fn network(self) -> Network {
        match self {
            XpubPrefix::Xpub
            | XpubPrefix::Ypub
            | XpubPrefix::Zpub
            | XpubPrefix::YpubMultisig
            | XpubPrefix::ZpubMultisig => Network::Mainnet,
            XpubPrefix::Tpub
            | XpubPrefix::Upub
            | XpubPrefix::Vpub
            | XpubPrefix::UpubMultisig
            | XpubPrefix::VpubMultisig => Network::Testnet,
        }
    }

    /// Prefix which BIP32 itself defines for the network, into which keys of
    /// all other prefix families are converted.
    pub const fn canonical(network: Network) -> Self {
        match network {
            Network::Mainnet => XpubPrefix::Xpub,
            Network::Testnet => XpubPrefix::Tpub,
        }
    }

    pub fn is_canonical(self) -> bool { self == Self::canonical(self.network()) }
}

#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display("unknown extended public key prefix '{0}'")]
pub struct UnknownPrefix(pub String);

impl FromStr for XpubPrefix {
    type Err = UnknownPrefix;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|prefix| prefix.to_string() == s)
            .ok_or_else(|| UnknownPrefix(s.to_owned()))
    }
}

/// Errors converting extended public keys between version prefixes.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum ConvertError {
    /// Invalid target version for extended public key conversion
    InvalidTarget,

    /// Invalid source version for extended public key conversion
    InvalidSource,

    /// Unable to convert extended public key: {0}
    #[from]
    Base58(base58::Error),
}

/// Extended public key re-encoded with a different version prefix.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct XpubConversion {
    pub key: String,
    pub source: XpubPrefix,
    pub target: XpubPrefix,
}

impl XpubConversion {
    /// Human-readable description of the performed conversion.
    pub fn message(&self) -> String {
        format!(
            "Your extended public key has been converted from {} to {}",
            self.source, self.target
        )
    }
}

/// Re-encodes an extended public key with the version bytes of the `target`
/// prefix given by its string name.
///
/// Only the version bytes are replaced; the rest of the payload is kept as is
/// and is not checked to be a valid BIP32 key.
pub fn convert_extended_public_key(
    key: &str,
    target: &str,
) -> Result<XpubConversion, ConvertError> {
    let target = XpubPrefix::from_str(target).map_err(|_| ConvertError::InvalidTarget)?;
    convert_xpub(key, target)
}

/// Re-encodes an extended public key with the version bytes of the `target`
/// prefix. Converting into the same prefix re-encodes the key as well.
pub fn convert_xpub(key: &str, target: XpubPrefix) -> Result<XpubConversion, ConvertError> {
    let source = key
        .get(..4)
        .and_then(|prefix| XpubPrefix::from_str(prefix).ok())
        .ok_or(ConvertError::InvalidSource)?;

    let mut data = base58::decode_check(key.trim())?;
    if data.len() < 4 {
        return Err(base58::Error::InvalidLength(data.len()).into());
    }
    data[..4].copy_from_slice(&target.version());

    trace!("re-encoding extended public key from {source} to {target}");
    Ok(XpubConversion {
        key: base58::encode_check(&data),
        source,
        target,
    })
}

#[cfg(feature = "serde")]
mod _serde {
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    use super::*;

    impl Serialize for XpubPrefix {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where S: Serializer {
            serializer.serialize_str(&self.to_string())
        }
    }

    impl<'de> Deserialize<'de> for XpubPrefix {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where D: Deserializer<'de> {
            let s = String::deserialize(deserializer)?;
            XpubPrefix::from_str(&s).map_err(de::Error::custom)
        }
    }
}
