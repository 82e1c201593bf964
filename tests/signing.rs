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

use amplify::hex::ToHex;
use bpmsig::secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use bpmsig::{
    multisig_signature_hash, signed_multisig_transaction, unsigned_multisig_transaction,
    MultisigAddressType, MultisigDescriptor, Network, PushScript, SignError, SignerPk,
    TransactionInput, TransactionOutput,
};
use bc::{Sats, SigScript, Witness};

const TXID1: &str = "65c4a6b2c3c25ad2d4e0d8a4dbce4c1e2a5ff6a1c66f78c3f0e9e91a9b5e6f31";
const TXID2: &str = "0e3e2357e806b6cdb1f70b54c3a3a17b6714ee1f0e68bebb44a74b1efd512098";

fn secret(seed: u8) -> SecretKey { SecretKey::from_slice(&[seed; 32]).unwrap() }

fn signer_pk(seed: u8) -> SignerPk {
    SignerPk::compressed(PublicKey::from_secret_key(&Secp256k1::signing_only(), &secret(seed)))
}

fn descriptor(address_type: MultisigAddressType) -> MultisigDescriptor {
    MultisigDescriptor::new(address_type, 2, [signer_pk(1), signer_pk(2), signer_pk(3)]).unwrap()
}

fn payee() -> TransactionOutput {
    let destination = MultisigDescriptor::new(MultisigAddressType::P2wsh, 1, [signer_pk(9)])
        .unwrap()
        .address(Network::Testnet)
        .unwrap();
    TransactionOutput::new(destination, Sats(90_000))
}

fn inputs(address_type: MultisigAddressType) -> Vec<TransactionInput> {
    vec![
        TransactionInput::new(TXID1, 0, descriptor(address_type)).with_amount(Sats(60_000)),
        TransactionInput::new(TXID2, 5, descriptor(address_type)).with_amount(Sats(40_000)),
    ]
}

fn sign(
    seed: u8,
    inputs: &[TransactionInput],
    outputs: &[TransactionOutput],
    index: usize,
) -> Vec<u8> {
    let sighash = multisig_signature_hash(Network::Testnet, inputs, outputs, index).unwrap();
    let mut sig = secret(seed).sign_ecdsa(Message::from(sighash)).serialize_der().to_vec();
    sig.push(0x01);
    sig
}

fn signer_row(
    seed: u8,
    inputs: &[TransactionInput],
    outputs: &[TransactionOutput],
) -> Vec<Option<String>> {
    (0..inputs.len())
        .map(|index| Some(sign(seed, inputs, outputs, index).to_hex()))
        .collect()
}

#[test]
fn p2sh_signatures_ordered_by_keys() {
    let inputs = inputs(MultisigAddressType::P2sh);
    let outputs = [payee()];
    // signers submit in the order opposite to the key order
    let signatures = [signer_row(3, &inputs, &outputs), signer_row(1, &inputs, &outputs)];

    let tx = signed_multisig_transaction(Network::Testnet, &inputs, &outputs, &signatures).unwrap();
    let unsigned = unsigned_multisig_transaction(Network::Testnet, &inputs, &outputs).unwrap();
    // legacy txid commits to the scriptSig, so it changes once signed
    assert_ne!(tx.txid(), unsigned.txid());
    assert_eq!(tx.version, unsigned.version);
    assert_eq!(tx.lock_time, unsigned.lock_time);
    assert_eq!(tx.outputs, unsigned.outputs);
    assert_eq!(tx.inputs.len(), unsigned.inputs.len());
    for (signed, blank) in tx.inputs.iter().zip(unsigned.inputs.iter()) {
        assert_eq!(signed.prev_output, blank.prev_output);
        assert_eq!(signed.sequence, blank.sequence);
        assert_eq!(blank.sig_script, SigScript::new());
    }

    for (index, txin) in tx.inputs.iter().enumerate() {
        let (descriptor, sigs) =
            MultisigDescriptor::from_p2sh_unlocking_script(&txin.sig_script.to_vec()).unwrap();
        assert_eq!(descriptor, inputs[index].multisig);
        assert_eq!(sigs, vec![
            sign(1, &inputs, &outputs, index),
            sign(3, &inputs, &outputs, index)
        ]);
        assert_eq!(txin.witness, Witness::new());
    }
}

#[test]
fn p2wsh_witness() {
    let inputs = inputs(MultisigAddressType::P2wsh);
    let outputs = [payee()];
    let mut absent = signer_row(1, &inputs, &outputs);
    absent[1] = None;
    let signatures = [
        signer_row(2, &inputs, &outputs),
        absent,
        signer_row(3, &inputs, &outputs),
    ];

    let tx = signed_multisig_transaction(Network::Testnet, &inputs, &outputs, &signatures).unwrap();

    let witness_script = inputs[0].multisig.witness_script().unwrap().to_vec();
    assert_eq!(tx.inputs[0].sig_script, SigScript::new());
    assert_eq!(
        tx.inputs[0].witness,
        Witness::from_consensus_stack(vec![
            vec![],
            sign(1, &inputs, &outputs, 0),
            sign(2, &inputs, &outputs, 0),
            witness_script.clone(),
        ])
    );
    assert_eq!(
        tx.inputs[1].witness,
        Witness::from_consensus_stack(vec![
            vec![],
            sign(2, &inputs, &outputs, 1),
            sign(3, &inputs, &outputs, 1),
            witness_script,
        ])
    );
}

#[test]
fn p2sh_p2wsh_witness_and_redeem_script() {
    let inputs = inputs(MultisigAddressType::P2shP2wsh);
    let outputs = [payee()];
    let signatures = [signer_row(2, &inputs, &outputs), signer_row(1, &inputs, &outputs)];

    let tx = signed_multisig_transaction(Network::Testnet, &inputs, &outputs, &signatures).unwrap();

    let descriptor = &inputs[0].multisig;
    let mut redeem_push = PushScript::new();
    redeem_push.push_slice(&descriptor.redeem_script().unwrap().to_vec());
    assert_eq!(tx.inputs[0].sig_script, SigScript::from(redeem_push));
    assert_eq!(
        tx.inputs[0].witness,
        Witness::from_consensus_stack(vec![
            vec![],
            sign(1, &inputs, &outputs, 0),
            sign(2, &inputs, &outputs, 0),
            descriptor.witness_script().unwrap().to_vec(),
        ])
    );
}

#[test]
fn insufficient_signatures() {
    let inputs = inputs(MultisigAddressType::P2wsh);
    let outputs = [payee()];
    let mut partial = signer_row(2, &inputs, &outputs);
    partial[1] = Some(String::new());
    let signatures = [signer_row(1, &inputs, &outputs), partial];

    let err = signed_multisig_transaction(Network::Testnet, &inputs, &outputs, &signatures)
        .unwrap_err();
    assert_eq!(err, SignError::InsufficientSignatures {
        input: 1,
        required: 2,
        received: 1
    });
}

#[test]
fn foreign_and_duplicate_signatures() {
    let inputs = inputs(MultisigAddressType::P2sh);
    let outputs = [payee()];

    let foreign = signer_row(7, &inputs, &outputs);
    let signatures = [signer_row(1, &inputs, &outputs), foreign.clone()];
    assert_eq!(
        signed_multisig_transaction(Network::Testnet, &inputs, &outputs, &signatures),
        Err(SignError::UnknownSignature {
            input: 0,
            signature: foreign[0].clone().unwrap()
        })
    );

    let duplicate = signer_row(2, &inputs, &outputs);
    let signatures = [duplicate.clone(), signer_row(3, &inputs, &outputs), duplicate.clone()];
    assert_eq!(
        signed_multisig_transaction(Network::Testnet, &inputs, &outputs, &signatures),
        Err(SignError::DuplicateSignature {
            input: 0,
            signature: duplicate[0].clone().unwrap(),
            pubkey: signer_pk(2)
        })
    );

    // signature for the other input doesn't verify for this one
    let mut swapped = signer_row(1, &inputs, &outputs);
    swapped.swap(0, 1);
    let signatures = [swapped.clone(), signer_row(2, &inputs, &outputs)];
    assert_eq!(
        signed_multisig_transaction(Network::Testnet, &inputs, &outputs, &signatures),
        Err(SignError::UnknownSignature {
            input: 0,
            signature: swapped[0].clone().unwrap()
        })
    );
}

#[test]
fn segwit_input_requires_amount() {
    let mut inputs = inputs(MultisigAddressType::P2wsh);
    inputs[0].amount = None;
    let outputs = [payee()];
    assert!(multisig_signature_hash(Network::Testnet, &inputs, &outputs, 0).is_err());
    assert!(multisig_signature_hash(Network::Testnet, &inputs, &outputs, 1).is_ok());
}
