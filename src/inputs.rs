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

use std::collections::HashSet;
use std::str::FromStr;

use bc::{Outpoint, Sats, Txid, Vout};
use descriptors::MultisigDescriptor;
use keys::validate_hex;

/// Errors in the set of transaction inputs.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum InputError {
    /// at least one input is required.
    NoInputs,

    /// input {index} has invalid transaction id '{txid}'; it must be a
    /// 64-character hex string.
    InvalidTxid { index: usize, txid: String },

    /// input {index} spends output {txid}:{vout} already spent by input
    /// {previous}.
    Duplicate {
        index: usize,
        previous: usize,
        txid: String,
        vout: u32,
    },
}

/// Multisig output spent by the transaction.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct TransactionInput {
    /// Hex-encoded id of the transaction which created the output.
    pub txid: String,

    /// Number of the output in the transaction.
    pub index: u32,

    /// Value of the spent output. Required to sign segwit inputs.
    pub amount: Option<Sats>,

    /// Multisig condition locking the output.
    pub multisig: MultisigDescriptor,
}

impl TransactionInput {
    pub fn new(txid: impl ToString, index: u32, multisig: MultisigDescriptor) -> Self {
        TransactionInput {
            txid: txid.to_string(),
            index,
            amount: None,
            multisig,
        }
    }

    #[must_use]
    pub fn with_amount(mut self, amount: Sats) -> Self {
        self.amount = Some(amount);
        self
    }

    pub(crate) fn outpoint(&self, no: usize) -> Result<Outpoint, InputError> {
        let invalid = || InputError::InvalidTxid {
            index: no,
            txid: self.txid.clone(),
        };
        if self.txid.len() != 64 || validate_hex(&self.txid).is_err() {
            return Err(invalid());
        }
        let txid = Txid::from_str(&self.txid).map_err(|_| invalid())?;
        Ok(Outpoint::new(txid, Vout::from_u32(self.index)))
    }
}

/// Checks that there is at least one input, all inputs reference outputs by
/// valid transaction ids, and no output is spent twice.
pub fn validate_multisig_inputs(inputs: &[TransactionInput]) -> Result<(), InputError> {
    if inputs.is_empty() {
        return Err(InputError::NoInputs);
    }
    let mut spent = HashSet::with_capacity(inputs.len());
    for (no, input) in inputs.iter().enumerate() {
        input.outpoint(no)?;
        let key = (input.txid.to_lowercase(), input.index);
        if !spent.insert(key) {
            let previous = inputs
                .iter()
                .position(|prev| {
                    prev.txid.eq_ignore_ascii_case(&input.txid) && prev.index == input.index
                })
                .unwrap_or_default();
            return Err(InputError::Duplicate {
                index: no,
                previous,
                txid: input.txid.clone(),
                vout: input.index,
            });
        }
    }
    Ok(())
}
