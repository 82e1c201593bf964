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

use bc::{Sats, ScriptCode, ScriptPubkey, Sighash, SighashCache, SighashError, SighashType, TxOut};
use invoice::Network;
use keys::SignerPk;
use secp256k1::{ecdsa, Message, SECP256K1};

use crate::{unsigned_multisig_transaction, TransactionInput, TransactionOutput, TxError};

/// Consensus byte for `SIGHASH_ALL` signature hash type.
pub const SIGHASH_ALL: u8 = 0x01;

/// Errors resolving signatures to public keys.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum SignatureError {
    /// invalid transaction - {0}
    #[from]
    Tx(TxError),

    /// transaction has no input {0}.
    InputIndex(usize),

    /// segwit input {0} doesn't specify amount of the spent output, which is
    /// required for computing signature hash.
    NoAmount(usize),

    /// number of spent outputs doesn't match number of transaction inputs.
    PrevoutsMismatch,

    /// unable to compute signature hash - {0}
    #[from]
    Sighash(SighashError),

    /// signature is not a valid DER-encoded ECDSA signature - {0}
    #[from]
    InvalidDer(secp256k1::Error),
}

/// Resolves signature provided for a transaction input to the public key of
/// the input multisig descriptor which has created it.
pub trait SigResolver {
    /// Returns `Ok(None)` if none of the input keys matches the signature.
    fn resolve(
        &self,
        network: Network,
        inputs: &[TransactionInput],
        outputs: &[TransactionOutput],
        index: usize,
        signature: &[u8],
    ) -> Result<Option<SignerPk>, SignatureError>;
}

/// Resolves signatures by verifying them as `SIGHASH_ALL` ECDSA signatures
/// against each of the input public keys in their descriptor order.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct EcdsaSigResolver;

impl SigResolver for EcdsaSigResolver {
    fn resolve(
        &self,
        network: Network,
        inputs: &[TransactionInput],
        outputs: &[TransactionOutput],
        index: usize,
        signature: &[u8],
    ) -> Result<Option<SignerPk>, SignatureError> {
        let input = inputs.get(index).ok_or(SignatureError::InputIndex(index))?;
        let mut sig = ecdsa::Signature::from_der(strip_sighash_type(signature))?;
        sig.normalize_s();
        let msg = Message::from(multisig_signature_hash(network, inputs, outputs, index)?);
        let pk = input
            .multisig
            .public_keys()
            .iter()
            .find(|pk| SECP256K1.verify_ecdsa(&msg, &sig, &pk.pubkey()).is_ok())
            .copied();
        Ok(pk)
    }
}

/// Computes `SIGHASH_ALL` signature hash for the input `index` of the
/// transaction spending `inputs` to `outputs`.
///
/// P2SH inputs use legacy algorithm with the multisig script as the script
/// code; segwit inputs use BIP143 algorithm and require the input amount.
pub fn multisig_signature_hash(
    network: Network,
    inputs: &[TransactionInput],
    outputs: &[TransactionOutput],
    index: usize,
) -> Result<Sighash, SignatureError> {
    let input = inputs.get(index).ok_or(SignatureError::InputIndex(index))?;
    let tx = unsigned_multisig_transaction(network, inputs, outputs)?;
    let prevouts = inputs
        .iter()
        .map(|input| {
            TxOut::new(input.multisig.script_pubkey(), input.amount.unwrap_or(Sats::ZERO))
        })
        .collect::<Vec<_>>();
    let mut sig_hasher =
        SighashCache::new(tx, prevouts).map_err(|_| SignatureError::PrevoutsMismatch)?;

    let sighash_type = SighashType::all();
    let sighash = match input.multisig.witness_script() {
        Some(witness_script) => {
            let amount = input.amount.ok_or(SignatureError::NoAmount(index))?;
            let script_code = ScriptCode::with_p2wsh(&witness_script);
            sig_hasher.segwit_sighash(index, &script_code, amount, sighash_type)?
        }
        None => {
            let script_code = ScriptPubkey::from_checked(input.multisig.multisig_script());
            sig_hasher.legacy_sighash(index, &script_code, sighash_type)?
        }
    };
    Ok(sighash)
}

/// Removes trailing sighash type byte from a DER-encoded signature, if the
/// byte is present.
///
/// The presence is detected from the DER sequence length, which doesn't
/// account for the sighash byte.
pub fn strip_sighash_type(signature: &[u8]) -> &[u8] {
    match signature.get(1) {
        Some(len) if *len as usize + 2 < signature.len() => &signature[..signature.len() - 1],
        _ => signature,
    }
}

/// Returns signature with any present sighash type replaced with
/// `SIGHASH_ALL`.
pub fn signature_with_sighash_all(signature: &[u8]) -> Vec<u8> {
    let mut sig = strip_sighash_type(signature).to_vec();
    sig.push(SIGHASH_ALL);
    sig
}

#[cfg(test)]
mod test {
    use amplify::hex::FromHex;

    use super::*;

    const DER: &str = "3044022058f5f6d37aeca1c8b3ce2a2e4c7ae9c5d3bc6e5b0a5b3a6e0a24c6d5f4b3c2a102201\
                       c2a3b4d5e6f708192a3b4c5d6e7f8091a2b3c4d5e6f708192a3b4c5d6e7f809";

    #[test]
    fn strip_sighash() {
        let der = Vec::<u8>::from_hex(DER).unwrap();
        assert_eq!(der.len(), 0x44 + 2);
        assert_eq!(strip_sighash_type(&der), &der[..]);

        let mut with_sighash = der.clone();
        with_sighash.push(0x01);
        assert_eq!(strip_sighash_type(&with_sighash), &der[..]);

        let mut with_anyone_can_pay = der.clone();
        with_anyone_can_pay.push(0x81);
        assert_eq!(signature_with_sighash_all(&with_anyone_can_pay), with_sighash);
        assert_eq!(signature_with_sighash_all(&der), with_sighash);
    }

    #[test]
    fn strip_short() {
        assert_eq!(strip_sighash_type(&[]), &[] as &[u8]);
        assert_eq!(strip_sighash_type(&[0x30]), &[0x30]);
    }
}
