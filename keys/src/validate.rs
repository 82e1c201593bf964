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

//! Validation of extended public keys against a network and normalization of
//! SLIP-132 keys into the BIP32 form expected by the network.

use invoice::{base58, Network};

use crate::{convert_xpub, ConvertError, XkeyParseError, Xpub, XpubConversion, XpubPrefix};

/// Minimal length of a Base58Check-encoded extended public key.
pub const MIN_XPUB_LEN: usize = 111;

/// Reasons an extended public key is not valid for a network.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum XpubValidationError {
    /// Extended public key cannot be blank.
    Blank,

    /// Extended public key length is too short.
    TooShort,

    /// Extended public key must begin with {0}.
    WrongPrefix(&'static str),

    /// Invalid extended public key: {0}
    #[from]
    #[from(base58::Error)]
    Invalid(XkeyParseError),
}

fn check_length(key: &str) -> Result<(), XpubValidationError> {
    if key.is_empty() {
        return Err(XpubValidationError::Blank);
    }
    if key.len() < MIN_XPUB_LEN {
        return Err(XpubValidationError::TooShort);
    }
    Ok(())
}

fn check_prefix(key: &str, network: Network) -> Result<(), XpubValidationError> {
    let accepted = match network {
        Network::Mainnet => &[XpubPrefix::Xpub][..],
        Network::Testnet => &[XpubPrefix::Xpub, XpubPrefix::Tpub][..],
    };
    let prefix = key.get(..4).unwrap_or_default();
    if accepted.iter().any(|p| p.to_string() == prefix) {
        return Ok(());
    }
    Err(XpubValidationError::WrongPrefix(match network {
        Network::Mainnet => "'xpub'",
        Network::Testnet => "'xpub' or 'tpub'",
    }))
}

/// Checks that the extended public key can be used on the network as is.
///
/// Checks run in order and the first failure is reported: presence, minimal
/// length, prefix allowed for the network and, finally, BIP32 deserialization
/// with the network version bytes.
pub fn validate_extended_public_key(
    key: &str,
    network: Network,
) -> Result<(), XpubValidationError> {
    check_length(key)?;
    check_prefix(key, network)?;
    let data = base58::decode_check(key)?;
    Xpub::decode_for(data, network).map_err(XkeyParseError::from)?;
    Ok(())
}

/// Extended public key ready for use on a network.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum XpubNormalization {
    /// The key was already valid for the network and is returned unchanged.
    AlreadyCanonical(String),

    /// The key was converted into the network canonical prefix.
    Converted(XpubConversion),
}

impl XpubNormalization {
    pub fn key(&self) -> &str {
        match self {
            XpubNormalization::AlreadyCanonical(key) => key,
            XpubNormalization::Converted(conversion) => &conversion.key,
        }
    }

    /// Message to show to the user; empty if no conversion took place.
    pub fn message(&self) -> String {
        match self {
            XpubNormalization::AlreadyCanonical(_) => none!(),
            XpubNormalization::Converted(conversion) => conversion.message(),
        }
    }

    pub fn into_key(self) -> String {
        match self {
            XpubNormalization::AlreadyCanonical(key) => key,
            XpubNormalization::Converted(conversion) => conversion.key,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(inner)]
pub enum NormalizationFailure {
    #[from]
    Validation(XpubValidationError),

    #[from]
    Conversion(ConvertError),
}

/// Failed normalization, which keeps the key originally provided.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display("{reason}")]
pub struct NormalizationError {
    pub key: String,
    pub reason: NormalizationFailure,
}

/// Validates the extended public key for the network, converting it into the
/// network canonical prefix (`xpub` or `tpub`) if it is not valid as is.
pub fn convert_and_validate_extended_public_key(
    key: &str,
    network: Network,
) -> Result<XpubNormalization, NormalizationError> {
    let fail = |reason: NormalizationFailure| NormalizationError {
        key: key.to_owned(),
        reason,
    };

    check_length(key).map_err(|err| fail(err.into()))?;
    let err = match validate_extended_public_key(key, network) {
        Ok(()) => return Ok(XpubNormalization::AlreadyCanonical(key.to_owned())),
        Err(err) => err,
    };

    let conversion =
        convert_xpub(key, XpubPrefix::canonical(network)).map_err(|err| fail(err.into()))?;
    // re-encoding into the same prefix reproduces the input: the conversion
    // result is returned as is and the key is not validated again
    if conversion.key == key {
        warn!(
            "extended public key already has {} prefix and was left unchanged despite failed \
             validation: {err}",
            conversion.target
        );
        return Ok(XpubNormalization::Converted(conversion));
    }
    validate_extended_public_key(&conversion.key, network).map_err(|err| fail(err.into()))?;

    debug!("extended public key converted from {} to {}", conversion.source, conversion.target);
    Ok(XpubNormalization::Converted(conversion))
}
