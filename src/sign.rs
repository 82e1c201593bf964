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

use amplify::hex::FromHex;
use bc::{Tx, Witness};
use descriptors::{MultisigAddressType, MultisigDescriptor, MultisigError, PushScript};
use indexmap::IndexMap;
use invoice::Network;
use keys::SignerPk;

use crate::{
    signature_with_sighash_all, unsigned_multisig_transaction, EcdsaSigResolver, SigResolver, SignatureError, TransactionInput, TransactionOutput, TxError,
};

/// Errors merging signatures into a multisig transaction.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum SignError {
    #[display(inner)]
    #[from]
    Tx(TxError),

    /// no signatures provided.
    NoSignatures,

    /// signer {row} provided {received} signatures while the transaction has
    /// {required} inputs.
    ShortSignatureRow {
        row: usize,
        required: usize,
        received: usize,
    },

    /// insufficient signatures for input {input}: {required} signatures are
    /// required, but only {received} were provided.
    InsufficientSignatures {
        input: usize,
        required: usize,
        received: usize,
    },

    /// signature {signature} for input {input} is not a hex string.
    InvalidHex { input: usize, signature: String },

    /// unable to verify signature {signature} for input {input} - {reason}
    UnresolvedSignature {
        input: usize,
        signature: String,
        reason: SignatureError,
    },

    /// signature {signature} for input {input} doesn't match any of the input
    /// public keys.
    UnknownSignature { input: usize, signature: String },

    /// duplicate signature {signature} for input {input}: the public key
    /// {pubkey} has already signed the input.
    DuplicateSignature {
        input: usize,
        signature: String,
        pubkey: SignerPk,
    },

    /// input {input} descriptor {descriptor} doesn't define the script
    /// required for spending.
    NoScript {
        input: usize,
        descriptor: MultisigDescriptor,
    },

    #[display(inner)]
    #[from]
    Descriptor(MultisigError),
}

/// Constructs transaction spending multisig `inputs` to `outputs` and
/// completes each of its inputs with the provided signatures.
///
/// `signatures` contains one row per signer; each row provides hex-encoded
/// signature (or nothing) for each of the transaction inputs, in the input
/// order. Signatures are matched to the input public keys by verifying them
/// against the transaction signature hash.
pub fn signed_multisig_transaction(
    network: Network,
    inputs: &[TransactionInput],
    outputs: &[TransactionOutput],
    signatures: &[Vec<Option<String>>],
) -> Result<Tx, SignError> {
    signed_multisig_transaction_with(&EcdsaSigResolver, network, inputs, outputs, signatures)
}

/// Same as [`signed_multisig_transaction`], but matches signatures to public
/// keys with a custom `resolver`.
pub fn signed_multisig_transaction_with(
    resolver: &impl SigResolver,
    network: Network,
    inputs: &[TransactionInput],
    outputs: &[TransactionOutput],
    signatures: &[Vec<Option<String>>],
) -> Result<Tx, SignError> {
    let mut tx = unsigned_multisig_transaction(network, inputs, outputs)?;

    if signatures.is_empty() {
        return Err(SignError::NoSignatures);
    }
    for (row, sigs) in signatures.iter().enumerate() {
        if sigs.len() < inputs.len() {
            return Err(SignError::ShortSignatureRow {
                row,
                required: inputs.len(),
                received: sigs.len(),
            });
        }
    }

    for (index, input) in inputs.iter().enumerate() {
        let descriptor = &input.multisig;
        let required = descriptor.required_signers();
        let candidates = signatures
            .iter()
            .filter_map(|row| row[index].as_deref())
            .filter(|sig| !sig.is_empty())
            .collect::<Vec<_>>();
        if candidates.len() < required {
            return Err(SignError::InsufficientSignatures {
                input: index,
                required,
                received: candidates.len(),
            });
        }

        let mut key_sigs = IndexMap::<SignerPk, Vec<u8>>::with_capacity(candidates.len());
        for hex in candidates {
            let sig = Vec::<u8>::from_hex(hex).map_err(|_| SignError::InvalidHex {
                input: index,
                signature: hex.to_owned(),
            })?;
            let pubkey = resolver
                .resolve(network, inputs, outputs, index, &sig)
                .map_err(|reason| SignError::UnresolvedSignature {
                    input: index,
                    signature: hex.to_owned(),
                    reason,
                })?
                .filter(|pk| descriptor.public_keys().contains(pk))
                .ok_or_else(|| SignError::UnknownSignature {
                    input: index,
                    signature: hex.to_owned(),
                })?;
            if key_sigs.contains_key(&pubkey) {
                return Err(SignError::DuplicateSignature {
                    input: index,
                    signature: hex.to_owned(),
                    pubkey,
                });
            }
            key_sigs.insert(pubkey, signature_with_sighash_all(&sig));
        }

        // CHECKMULTISIG consumes signatures in the order of the keys
        let ordered = descriptor
            .public_keys()
            .iter()
            .filter_map(|pk| key_sigs.get(pk))
            .cloned()
            .collect::<Vec<_>>();
        if ordered.len() < required {
            return Err(SignError::InsufficientSignatures {
                input: index,
                required,
                received: ordered.len(),
            });
        }
        if ordered.len() > required {
            debug!(
                "input {index} has {} valid signatures, only the first {required} are used",
                ordered.len()
            );
        }
        let sigs = &ordered[..required];

        let txin = &mut tx.inputs[index];
        match descriptor.address_type() {
            MultisigAddressType::P2sh => {
                let mut satisfaction = PushScript::new();
                satisfaction.push_zero();
                for sig in sigs {
                    satisfaction.push_slice(sig);
                }
                txin.sig_script = descriptor.p2sh_unlocking_script(&satisfaction)?;
            }
            MultisigAddressType::P2shP2wsh | MultisigAddressType::P2wsh => {
                let witness_script = descriptor.witness_script().ok_or_else(|| {
                    SignError::NoScript {
                        input: index,
                        descriptor: descriptor.clone(),
                    }
                })?;
                let mut stack = Vec::with_capacity(required + 2);
                stack.push(vec![]);
                stack.extend(sigs.iter().cloned());
                stack.push(witness_script.to_vec());
                txin.witness = Witness::from_consensus_stack(stack);

                if descriptor.address_type() == MultisigAddressType::P2shP2wsh {
                    txin.sig_script = descriptor.p2sh_unlocking_script(&PushScript::new())?;
                }
            }
        }
        debug!(
            "input {index} of {} type is completed with {required} signatures",
            descriptor.address_type()
        );
    }

    Ok(tx)
}
