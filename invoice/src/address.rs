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

//! Bitcoin addresses: parsing of outputs supplied by the wallet coordinator
//! and encoding of multisig script addresses.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use bc::{
    InvalidPubkey, OutputPk, PubkeyHash, ScriptHash, ScriptPubkey, WPubkeyHash, WScriptHash,
    WitnessVer,
};
use bech32::u5;

use crate::{base58, Network};

/// Mainnet (bitcoin) pubkey address prefix.
pub const PUBKEY_ADDRESS_PREFIX_MAIN: u8 = 0; // 0x00
/// Mainnet (bitcoin) script address prefix.
pub const SCRIPT_ADDRESS_PREFIX_MAIN: u8 = 5; // 0x05
/// Test (tesnet, signet, regtest) pubkey address prefix.
pub const PUBKEY_ADDRESS_PREFIX_TEST: u8 = 111; // 0x6f
/// Test (tesnet, signet, regtest) script address prefix.
pub const SCRIPT_ADDRESS_PREFIX_TEST: u8 = 196; // 0xc4

/// Errors creating address from scriptPubkey.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum AddressError {
    /// scriptPubkey contains invalid BIP340 output pubkey.
    InvalidTaprootKey,
    /// scriptPubkey can't be represented with any known address standard.
    UnsupportedScriptPubkey,
}

/// Errors parsing address strings.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum AddressParseError {
    /// wrong Base58 encoding of address data - {0}
    #[from]
    Base58(base58::Error),

    /// wrong Bech32 encoding of address data - {0}
    #[from]
    Bech32(bech32::Error),

    /// address has an invalid version code {0:#04x}.
    InvalidAddressVersion(u8),

    /// segwit address has an invalid witness version {0:#04x}.
    InvalidWitnessVersion(u8),

    /// segwit address has an empty data part.
    EmptyWitnessProgram,

    /// segwit v{0} program has an invalid length of {1} bytes.
    InvalidProgramLength(u8, usize),

    /// address has an unsupported future witness version {0}.
    FutureWitnessVersion(WitnessVer),

    /// address has an invalid Bech32 variant {0:?}.
    InvalidBech32Variant(bech32::Variant),

    /// unrecognized address format in '{0}'.
    UnrecognizableFormat(String),

    /// wrong BIP340 public key
    #[from(InvalidPubkey<32>)]
    WrongPublicKeyData,

    /// unrecognized address type string; must be one of `P2PKH`, `P2SH`,
    /// `P2WPKH`, `P2WSH`, `P2TR`
    UnrecognizedAddressType,
}

/// Bitcoin address: a payload bound to the network it is valid on.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
pub struct Address {
    /// Address payload (see [`AddressPayload`]).
    pub payload: AddressPayload,

    /// A type of the network used by the address
    pub network: AddressNetwork,
}

impl Address {
    pub fn new(payload: AddressPayload, network: AddressNetwork) -> Self {
        Address { payload, network }
    }

    /// Constructs address for a given `scriptPubkey`, failing if the script
    /// has no standard address representation.
    pub fn with(
        script: &ScriptPubkey,
        network: impl Into<AddressNetwork>,
    ) -> Result<Self, AddressError> {
        let payload = AddressPayload::from_script(script)?;
        Ok(Address::new(payload, network.into()))
    }

    /// Returns script corresponding to the given address.
    pub fn script_pubkey(self) -> ScriptPubkey { self.payload.script_pubkey() }

    /// Returns if the address is testnet-, signet- or regtest-specific.
    pub fn is_testnet(self) -> bool { self.network.is_testnet() }

    /// Detects whether a wallet on `network` may pay to this address.
    pub fn is_valid_for(self, network: Network) -> bool { network.accepts(self.network) }

    /// Detects address type.
    pub fn address_type(self) -> AddressType { self.payload.address_type() }

    fn base58_prefix(self) -> Option<u8> {
        Some(match (self.payload, self.network) {
            (AddressPayload::Pkh(_), AddressNetwork::Mainnet) => PUBKEY_ADDRESS_PREFIX_MAIN,
            (AddressPayload::Sh(_), AddressNetwork::Mainnet) => SCRIPT_ADDRESS_PREFIX_MAIN,
            (AddressPayload::Pkh(_), _) => PUBKEY_ADDRESS_PREFIX_TEST,
            (AddressPayload::Sh(_), _) => SCRIPT_ADDRESS_PREFIX_TEST,
            _ => return None,
        })
    }

    fn witness_program(self) -> (WitnessVer, bech32::Variant, Vec<u8>) {
        match self.payload {
            AddressPayload::Wpkh(hash) => {
                (WitnessVer::V0, bech32::Variant::Bech32, AsRef::<[u8]>::as_ref(&hash).to_vec())
            }
            AddressPayload::Wsh(hash) => {
                (WitnessVer::V0, bech32::Variant::Bech32, AsRef::<[u8]>::as_ref(&hash).to_vec())
            }
            AddressPayload::Tr(pk) => {
                (WitnessVer::V1, bech32::Variant::Bech32m, pk.to_byte_array().to_vec())
            }
            AddressPayload::Pkh(_) | AddressPayload::Sh(_) => {
                unreachable!("legacy payloads are encoded with base58")
            }
        }
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if let Some(prefix) = self.base58_prefix() {
            let mut data = [0u8; 21];
            data[0] = prefix;
            match self.payload {
                AddressPayload::Pkh(PubkeyHash(hash)) | AddressPayload::Sh(ScriptHash(hash)) => {
                    data[1..].copy_from_slice(hash.as_ref())
                }
                _ => unreachable!("only legacy payloads have base58 prefix"),
            }
            return base58::encode_check_to_fmt(f, &data);
        }

        let (version, variant, program) = self.witness_program();
        let mut s = String::with_capacity(74);
        let mut writer = bech32::Bech32Writer::new(self.network.bech32_hrp(), variant, &mut s)?;
        let ver = u5::try_from_u8(version.version_no()).map_err(|_| fmt::Error)?;
        bech32::WriteBase32::write_u5(&mut writer, ver)?;
        bech32::ToBase32::write_base32(&program, &mut writer)?;
        writer.finalize()?;
        if f.alternate() {
            f.write_str(&s.to_ascii_uppercase())
        } else {
            f.write_str(&s)
        }
    }
}

fn parse_base58(s: &str) -> Result<Address, AddressParseError> {
    if s.len() > 50 {
        return Err(base58::Error::InvalidLength(s.len() * 11 / 15).into());
    }
    let data = base58::decode_check(s)?;
    if data.len() != 21 {
        return Err(base58::Error::InvalidLength(data.len()).into());
    }

    let mut hash = [0u8; 20];
    hash.copy_from_slice(&data[1..]);
    let (payload, network) = match data[0] {
        PUBKEY_ADDRESS_PREFIX_MAIN => (AddressPayload::Pkh(hash.into()), AddressNetwork::Mainnet),
        SCRIPT_ADDRESS_PREFIX_MAIN => (AddressPayload::Sh(hash.into()), AddressNetwork::Mainnet),
        PUBKEY_ADDRESS_PREFIX_TEST => (AddressPayload::Pkh(hash.into()), AddressNetwork::Testnet),
        SCRIPT_ADDRESS_PREFIX_TEST => (AddressPayload::Sh(hash.into()), AddressNetwork::Testnet),
        x => return Err(AddressParseError::InvalidAddressVersion(x)),
    };
    Ok(Address::new(payload, network))
}

fn parse_bech32(
    network: AddressNetwork,
    data: &[u5],
    variant: bech32::Variant,
) -> Result<Address, AddressParseError> {
    let (ver, data) = data.split_first().ok_or(AddressParseError::EmptyWitnessProgram)?;
    let ver = ver.to_u8();
    let version = WitnessVer::from_version_no(ver)
        .map_err(|_| AddressParseError::InvalidWitnessVersion(ver))?;
    let program: Vec<u8> = bech32::FromBase32::from_base32(data)?;

    let payload = match (version, variant, program.len()) {
        (WitnessVer::V0, bech32::Variant::Bech32, 20) => {
            let mut hash = [0u8; 20];
            hash.copy_from_slice(&program);
            AddressPayload::Wpkh(hash.into())
        }
        (WitnessVer::V0, bech32::Variant::Bech32, 32) => {
            let mut hash = [0u8; 32];
            hash.copy_from_slice(&program);
            AddressPayload::Wsh(hash.into())
        }
        (WitnessVer::V1, bech32::Variant::Bech32m, 32) => {
            let mut key = [0u8; 32];
            key.copy_from_slice(&program);
            AddressPayload::Tr(OutputPk::from_byte_array(key)?)
        }
        (WitnessVer::V0, bech32::Variant::Bech32, len)
        | (WitnessVer::V1, bech32::Variant::Bech32m, len) => {
            return Err(AddressParseError::InvalidProgramLength(ver, len));
        }
        (WitnessVer::V0 | WitnessVer::V1, wrong, _) => {
            return Err(AddressParseError::InvalidBech32Variant(wrong));
        }
        (future, ..) => return Err(AddressParseError::FutureWitnessVersion(future)),
    };
    Ok(Address::new(payload, network))
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Ok((hrp, data, variant)) = bech32::decode(s) else {
            return parse_base58(s)
                .map_err(|_| AddressParseError::UnrecognizableFormat(s.to_owned()));
        };
        let network = match hrp.to_ascii_lowercase().as_str() {
            "bc" => AddressNetwork::Mainnet,
            "tb" => AddressNetwork::Testnet,
            "bcrt" => AddressNetwork::Regtest,
            _ => return Err(AddressParseError::UnrecognizableFormat(s.to_owned())),
        };
        parse_bech32(network, &data, variant)
    }
}

/// Internal address content. Consists of serialized hashes or x-only key value.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, From)]
pub enum AddressPayload {
    /// P2PKH payload.
    #[from]
    Pkh(PubkeyHash),

    /// P2SH and SegWit nested P2WPKH/WSH-in-P2SH payloads.
    #[from]
    Sh(ScriptHash),

    /// P2WPKH payload.
    #[from]
    Wpkh(WPubkeyHash),

    /// P2WSH payload.
    #[from]
    Wsh(WScriptHash),

    /// P2TR payload.
    #[from]
    Tr(OutputPk),
}

impl AddressPayload {
    /// Constructs [`Address`] from the payload.
    pub fn into_address(self, network: AddressNetwork) -> Address { Address::new(self, network) }

    /// Constructs payload from a given `scriptPubkey`.
    pub fn from_script(script: &ScriptPubkey) -> Result<Self, AddressError> {
        Ok(if script.is_p2pkh() {
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(&script[3..23]);
            AddressPayload::Pkh(PubkeyHash::from(bytes))
        } else if script.is_p2sh() {
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(&script[2..22]);
            AddressPayload::Sh(ScriptHash::from(bytes))
        } else if script.is_p2wpkh() {
            let mut bytes = [0u8; 20];
            bytes.copy_from_slice(&script[2..]);
            AddressPayload::Wpkh(WPubkeyHash::from(bytes))
        } else if script.is_p2wsh() {
            let mut bytes = [0u8; 32];
            bytes.copy_from_slice(&script[2..]);
            AddressPayload::Wsh(WScriptHash::from(bytes))
        } else if script.is_p2tr() {
            let mut bytes = [0u8; 32];
            bytes.copy_from_slice(&script[2..]);
            AddressPayload::Tr(
                OutputPk::from_byte_array(bytes).map_err(|_| AddressError::InvalidTaprootKey)?,
            )
        } else {
            return Err(AddressError::UnsupportedScriptPubkey);
        })
    }

    /// Returns script corresponding to the given address.
    pub fn script_pubkey(self) -> ScriptPubkey {
        match self {
            AddressPayload::Pkh(hash) => ScriptPubkey::p2pkh(hash),
            AddressPayload::Sh(hash) => ScriptPubkey::p2sh(hash),
            AddressPayload::Wpkh(hash) => ScriptPubkey::p2wpkh(hash),
            AddressPayload::Wsh(hash) => ScriptPubkey::p2wsh(hash),
            AddressPayload::Tr(output_key) => ScriptPubkey::p2tr_tweaked(output_key),
        }
    }

    /// Detects address type.
    pub fn address_type(self) -> AddressType {
        match self {
            AddressPayload::Pkh(_) => AddressType::P2pkh,
            AddressPayload::Sh(_) => AddressType::P2sh,
            AddressPayload::Wpkh(_) => AddressType::P2wpkh,
            AddressPayload::Wsh(_) => AddressType::P2wsh,
            AddressPayload::Tr(_) => AddressType::P2tr,
        }
    }
}

/// Address type
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display)]
pub enum AddressType {
    /// Pay-to-public key hash
    #[display("P2PKH")]
    P2pkh,

    /// Pay-to-script hash
    #[display("P2SH")]
    P2sh,

    /// Pay-to-witness public key hash
    #[display("P2WPKH")]
    P2wpkh,

    /// Pay-to-witness script hash
    #[display("P2WSH")]
    P2wsh,

    /// Pay-to-taproot
    #[display("P2TR")]
    P2tr,
}

impl FromStr for AddressType {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_uppercase().as_str() {
            "P2PKH" => AddressType::P2pkh,
            "P2SH" => AddressType::P2sh,
            "P2WPKH" => AddressType::P2wpkh,
            "P2WSH" => AddressType::P2wsh,
            "P2TR" => AddressType::P2tr,
            _ => return Err(AddressParseError::UnrecognizedAddressType),
        })
    }
}

/// Network an address is encoded for.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum AddressNetwork {
    /// Bitcoin mainnet
    Mainnet,

    /// Bitcoin testnet and signet
    Testnet,

    /// Bitcoin regtest networks
    Regtest,
}

impl AddressNetwork {
    /// Detects whether the network is a kind of test network (testnet, signet,
    /// regtest).
    pub fn is_testnet(self) -> bool { self != Self::Mainnet }

    pub fn bech32_hrp(self) -> &'static str {
        match self {
            AddressNetwork::Mainnet => "bc",
            AddressNetwork::Testnet => "tb",
            AddressNetwork::Regtest => "bcrt",
        }
    }
}

#[cfg(feature = "serde")]
mod _serde {
    use serde_crate::{de, Deserialize, Deserializer, Serialize, Serializer};

    use super::*;

    impl Serialize for Address {
        fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
        where S: Serializer {
            serializer.serialize_str(&self.to_string())
        }
    }

    impl<'de> Deserialize<'de> for Address {
        fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
        where D: Deserializer<'de> {
            let s = String::deserialize(deserializer)?;
            Address::from_str(&s)
                .map_err(|err| de::Error::custom(format!("invalid bitcoin address '{s}'; {err}")))
        }
    }
}
