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

use bc::{LockTime, SeqNo, Tx, TxIn, TxOut, TxVer, VarIntArray};
use invoice::Network;

use crate::{
    validate_multisig_inputs, validate_outputs, InputError, OutputError, TransactionInput,
    TransactionOutput,
};

/// Sequence number of the constructed inputs, disabling both relative time
/// locks and replace-by-fee signalling.
pub const SEQ_NO_FINAL: u32 = 0xFFFF_FFFF;

#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(inner)]
pub enum TxError {
    #[from]
    Inputs(InputError),

    #[from]
    Outputs(OutputError),
}

/// Constructs version 1 transaction spending the given multisig `inputs` to
/// the `outputs`, both in the order they are provided. Inputs of the returned
/// transaction carry no unlocking data.
pub fn unsigned_multisig_transaction(
    network: Network,
    inputs: &[TransactionInput],
    outputs: &[TransactionOutput],
) -> Result<Tx, TxError> {
    validate_multisig_inputs(inputs)?;
    validate_outputs(network, outputs)?;

    let mut txins = Vec::with_capacity(inputs.len());
    for (no, input) in inputs.iter().enumerate() {
        txins.push(TxIn {
            prev_output: input.outpoint(no)?,
            sig_script: none!(),
            sequence: SeqNo::from_consensus_u32(SEQ_NO_FINAL),
            witness: empty!(),
        });
    }
    let mut txouts = Vec::with_capacity(outputs.len());
    for (no, output) in outputs.iter().enumerate() {
        txouts.push(TxOut::new(output.script_pubkey(no, network)?, output.amount));
    }

    trace!(
        "constructed unsigned transaction with {} inputs and {} outputs",
        txins.len(),
        txouts.len()
    );
    Ok(Tx {
        version: TxVer::V1,
        inputs: VarIntArray::from_collection_unsafe(txins),
        outputs: VarIntArray::from_collection_unsafe(txouts),
        lock_time: LockTime::ZERO,
    })
}

#[cfg(test)]
mod test {
    use bc::{Sats, SigScript, Witness};
    use descriptors::{MultisigAddressType, MultisigDescriptor};
    use keys::secp256k1::{PublicKey, Secp256k1, SecretKey};
    use keys::SignerPk;

    use super::*;

    const TXID1: &str = "65c4a6b2c3c25ad2d4e0d8a4dbce4c1e2a5ff6a1c66f78c3f0e9e91a9b5e6f31";
    const TXID2: &str = "0e3e2357e806b6cdb1f70b54c3a3a17b6714ee1f0e68bebb44a74b1efd512098";
    const ADDRESS: &str = "bc1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3qccfmv3";

    fn multisig() -> MultisigDescriptor {
        let secp = Secp256k1::signing_only();
        let keys = (1u8..=3).map(|seed| {
            let sk = SecretKey::from_slice(&[seed; 32]).unwrap();
            SignerPk::compressed(PublicKey::from_secret_key(&secp, &sk))
        });
        MultisigDescriptor::new(MultisigAddressType::P2sh, 2, keys).unwrap()
    }

    #[test]
    fn skeleton() {
        let inputs = [
            TransactionInput::new(TXID1, 3, multisig()),
            TransactionInput::new(TXID2, 0, multisig()),
        ];
        let outputs = [
            TransactionOutput::new(ADDRESS, Sats(5_000)),
            TransactionOutput::new("3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy", Sats(7_000)),
        ];
        let tx = unsigned_multisig_transaction(Network::Mainnet, &inputs, &outputs).unwrap();

        assert_eq!(tx.version, TxVer::V1);
        assert_eq!(tx.lock_time, LockTime::ZERO);
        assert_eq!(tx.inputs.len(), 2);
        assert_eq!(tx.outputs.len(), 2);
        for (txin, input) in tx.inputs.iter().zip(&inputs) {
            assert_eq!(txin.prev_output, input.outpoint(0).unwrap());
            assert_eq!(txin.sequence, SeqNo::from_consensus_u32(SEQ_NO_FINAL));
            assert_eq!(txin.sig_script, SigScript::new());
            assert_eq!(txin.witness, Witness::new());
        }
        assert_eq!(tx.outputs[0].value, Sats(5_000));
        assert_eq!(tx.outputs[1].value, Sats(7_000));
        assert_eq!(
            tx.outputs[0].script_pubkey,
            outputs[0].script_pubkey(0, Network::Mainnet).unwrap()
        );
    }

    #[test]
    fn invalid_parts() {
        let outputs = [TransactionOutput::new(ADDRESS, Sats(5_000))];
        assert_eq!(
            unsigned_multisig_transaction(Network::Mainnet, &[], &outputs),
            Err(TxError::Inputs(InputError::NoInputs))
        );
        let inputs = [TransactionInput::new(TXID1, 0, multisig())];
        assert_eq!(
            unsigned_multisig_transaction(Network::Mainnet, &inputs, &[]),
            Err(TxError::Outputs(OutputError::NoOutputs))
        );
        assert!(matches!(
            unsigned_multisig_transaction(Network::Testnet, &inputs, &outputs),
            Err(TxError::Outputs(OutputError::WrongNetwork { .. }))
        ));
    }
}
