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

use std::str::FromStr;

use keys::{
    convert_and_validate_extended_public_key, convert_extended_public_key,
    derive_child_public_key, validate_extended_public_key, validate_public_key, Network,
    NormalizationFailure, Xpub, XpubNormalization, XpubPrefix, XpubValidationError,
};

// BIP32 test vector 1: m and m/0'
const XPUB: &str = "xpub661MyMwAqRbcFtXgS5sYJABqqG9YLmC4Q1Rdap9gSE8NqtwybGhePY2gZ29ESFjqJoCu1Rupje8YtGqsefD265TMg7usUDFdp6W1EGMcet8";
const XPUB_0H: &str = "xpub68Gmy5EdvgibQVfPdqkBBCHxA5htiqg55crXYuXoQRKfDBFA1WEjWgP6LHhwBZeNK1VTsfTFUHCdrfp1bgwQ9xv5ski8PX9rL2dZXvgGDnw";

#[test]
fn mainnet_key_used_on_testnet() {
    assert!(matches!(
        validate_extended_public_key(XPUB, Network::Testnet),
        Err(XpubValidationError::Invalid(_))
    ));

    let normalized = convert_and_validate_extended_public_key(XPUB, Network::Testnet).unwrap();
    let XpubNormalization::Converted(ref conversion) = normalized else {
        panic!("key must be converted");
    };
    assert_eq!(conversion.source, XpubPrefix::Xpub);
    assert_eq!(conversion.target, XpubPrefix::Tpub);
    assert!(normalized.key().starts_with("tpub"));
    assert_eq!(
        normalized.message(),
        "Your extended public key has been converted from xpub to tpub"
    );
    assert_eq!(validate_extended_public_key(normalized.key(), Network::Testnet), Ok(()));

    // converted key describes the same public key
    let tpub = Xpub::from_str(normalized.key()).unwrap();
    let xpub = Xpub::from_str(XPUB).unwrap();
    assert_eq!(tpub.public_key(), xpub.public_key());
    assert_eq!(tpub.chain_code(), xpub.chain_code());
    assert_eq!(tpub.with_prefix(XpubPrefix::Xpub), xpub);
}

#[test]
fn slip132_key_normalized_on_mainnet() {
    for prefix in ["ypub", "zpub", "Ypub", "Zpub", "tpub"] {
        let converted = convert_extended_public_key(XPUB, prefix).unwrap();
        assert!(converted.key.starts_with(prefix));

        let normalized =
            convert_and_validate_extended_public_key(&converted.key, Network::Mainnet).unwrap();
        assert_eq!(normalized.key(), XPUB);
        assert_eq!(
            normalized.message(),
            format!("Your extended public key has been converted from {prefix} to xpub")
        );
    }

    let normalized = convert_and_validate_extended_public_key(XPUB, Network::Mainnet).unwrap();
    assert_eq!(normalized, XpubNormalization::AlreadyCanonical(XPUB.to_owned()));
    assert_eq!(normalized.message(), "");
}

#[test]
fn normalization_keeps_original_key() {
    let err = convert_and_validate_extended_public_key("xpub", Network::Mainnet).unwrap_err();
    assert_eq!(err.key, "xpub");
    assert_eq!(err.reason, NormalizationFailure::Validation(XpubValidationError::TooShort));
    assert_eq!(err.to_string(), "Extended public key length is too short.");

    let blank = convert_and_validate_extended_public_key("", Network::Testnet).unwrap_err();
    assert_eq!(blank.to_string(), "Extended public key cannot be blank.");
}

#[test]
fn child_keys_for_multisig() {
    let tpub = convert_extended_public_key(XPUB_0H, "tpub").unwrap().key;

    let mainnet = derive_child_public_key(XPUB_0H, "m/1", Network::Mainnet).unwrap();
    let testnet = derive_child_public_key(&tpub, "1", Network::Testnet).unwrap();
    assert_eq!(mainnet, testnet);
    assert!(mainnet.is_compressed());
    assert_eq!(validate_public_key(&mainnet.to_string()), Ok(()));

    assert!(derive_child_public_key(XPUB_0H, "m/1", Network::Testnet).is_err());
    assert!(derive_child_public_key(XPUB_0H, "m/1h", Network::Mainnet).is_err());
}
