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

//! Multisig transaction assembly and signature merging for P2SH, P2SH-P2WSH
//! and P2WSH inputs, together with validation and SLIP-132 conversion of the
//! keys multisig wallets are built from.

#[macro_use]
extern crate amplify;
#[macro_use]
extern crate log;
#[cfg(feature = "serde")]
#[macro_use]
extern crate serde_crate as serde;

mod inputs;
mod outputs;
mod transaction;
mod signature;
mod sign;

pub use descriptors::*;
pub use inputs::{validate_multisig_inputs, InputError, TransactionInput};
pub use invoice::{Address, AddressNetwork, AddressParseError, AddressType, Network};
pub use keys::*;
pub use outputs::{validate_outputs, OutputError, TransactionOutput, MAX_MONEY};
pub use sign::{signed_multisig_transaction, signed_multisig_transaction_with, SignError};
pub use signature::{
    multisig_signature_hash, signature_with_sighash_all, strip_sighash_type, EcdsaSigResolver,
    SigResolver, SignatureError,
};
pub use transaction::{unsigned_multisig_transaction, TxError};
pub use {bc, descriptors, invoice, keys};
