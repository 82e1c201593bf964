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

//! Public key and extended public key handling for multisig wallets: raw key
//! validation and compression, SLIP-132 version prefix conversion, BIP32
//! structural validation and public derivation.

#[macro_use]
extern crate amplify;
#[macro_use]
extern crate log;
#[cfg(feature = "serde")]
extern crate serde_crate as serde;

mod pubkey;
mod prefix;
mod xkey;
mod validate;

pub use bc::secp256k1;
pub use invoice::{base58, Network};
pub use prefix::{
    convert_extended_public_key, convert_xpub, ConvertError, UnknownPrefix, XpubConversion,
    XpubPrefix,
};
pub use pubkey::{
    compress_public_key, compress_public_key_hex, is_compressed, validate_hex,
    validate_public_key, HexError, PubkeyError, SignerPk,
};
pub use validate::{
    convert_and_validate_extended_public_key, validate_extended_public_key, NormalizationError,
    NormalizationFailure, XpubNormalization, XpubValidationError, MIN_XPUB_LEN,
};
pub use xkey::{
    derive_child_public_key, parse_derivation_path, ChainCode, XkeyDecodeError, XkeyParseError,
    Xpub, XpubFp, XpubId, HARDENED_INDEX_BOUNDARY,
};
