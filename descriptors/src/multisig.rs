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

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use amplify::confinement::{self, Confined};
use bc::{secp256k1, OpCode, RedeemScript, ScriptPubkey, SigScript, WitnessScript};
use invoice::{Address, AddressError, Network};
use keys::{PubkeyError, SignerPk};

use crate::script::{instructions, Instruction, PushScript, ScriptError};

/// Maximal number of public keys in a multisig with standard scripts.
pub const MAX_MULTISIG_KEYS: usize = 15;

/// Consensus limit on the size of a P2SH redeem script.
pub const MAX_REDEEM_SCRIPT_SIZE: usize = 520;

/// How the multisig script is committed to in the output and provided when
/// spending.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(crate = "serde_crate"))]
pub enum MultisigAddressType {
    /// Legacy pay-to-script-hash (BIP16)
    #[display("P2SH")]
    #[cfg_attr(feature = "serde", serde(rename = "P2SH"))]
    P2sh,

    /// Segwit v0 script hash nested in P2SH (BIP141)
    #[display("P2SH-P2WSH")]
    #[cfg_attr(feature = "serde", serde(rename = "P2SH-P2WSH"))]
    P2shP2wsh,

    /// Native segwit v0 script hash (BIP141)
    #[display("P2WSH")]
    #[cfg_attr(feature = "serde", serde(rename = "P2WSH"))]
    #[default]
    P2wsh,
}

impl MultisigAddressType {
    /// Detects whether spending requires a witness.
    pub fn is_segwit(self) -> bool { self != MultisigAddressType::P2sh }

    /// Detects whether spending requires a redeem script in the scriptSig.
    pub fn has_redeem_script(self) -> bool { self != MultisigAddressType::P2wsh }
}

#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display("unknown multisig address type '{0}'; must be one of P2SH, P2SH-P2WSH, P2WSH")]
pub struct UnknownAddressType(pub String);

impl FromStr for MultisigAddressType {
    type Err = UnknownAddressType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_uppercase().replace('_', "-").as_str() {
            "P2SH" => MultisigAddressType::P2sh,
            "P2SH-P2WSH" => MultisigAddressType::P2shP2wsh,
            "P2WSH" => MultisigAddressType::P2wsh,
            _ => return Err(UnknownAddressType(s.to_owned())),
        })
    }
}

/// Errors constructing multisig descriptors.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum MultisigError {
    /// multisig requires from 1 to 15 public keys, while {0} were provided.
    KeyCount(usize),

    /// {threshold}-of-{total} is not a valid multisig threshold.
    Threshold { threshold: u8, total: usize },

    /// {0} multisig requires compressed public keys, but {1} is uncompressed.
    UncompressedKey(MultisigAddressType, SignerPk),

    /// redeem script has {0} bytes, exceeding 520 bytes limit.
    RedeemScriptTooLarge(usize),

    /// {0} descriptor has no redeem script.
    NoRedeemScript(MultisigAddressType),

    /// invalid public key in the multisig script - {0}
    #[from]
    InvalidKey(secp256k1::Error),

    #[display(inner)]
    #[from]
    Script(ScriptError),
}

impl From<confinement::Error> for MultisigError {
    fn from(err: confinement::Error) -> Self {
        match err {
            confinement::Error::Undersize { len, .. } | confinement::Error::Oversize { len, .. } => {
                MultisigError::KeyCount(len)
            }
            _ => MultisigError::KeyCount(0),
        }
    }
}

/// Errors validating public keys of a multisig participant.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum MultisigPkError {
    #[display(inner)]
    #[from]
    Pubkey(PubkeyError),

    /// P2SH-P2WSH and P2WSH addresses require compressed public keys.
    Uncompressed,
}

/// Validates hex-encoded public key for use in a multisig of the given type.
pub fn validate_multisig_public_key(
    hex: &str,
    address_type: MultisigAddressType,
) -> Result<(), MultisigPkError> {
    let pk = SignerPk::from_str(hex)?;
    if address_type.is_segwit() && !pk.is_compressed() {
        return Err(MultisigPkError::Uncompressed);
    }
    Ok(())
}

/// M-of-N multisig spending condition.
///
/// The order of public keys is significant: it defines the script and,
/// thus, the address, and signatures must be provided in the same order
/// when spending.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct MultisigDescriptor {
    address_type: MultisigAddressType,
    threshold: u8,
    keys: Confined<Vec<SignerPk>, 1, MAX_MULTISIG_KEYS>,
}

impl MultisigDescriptor {
    pub fn new(
        address_type: MultisigAddressType,
        threshold: u8,
        keys: impl IntoIterator<Item = SignerPk>,
    ) -> Result<Self, MultisigError> {
        let keys = keys.into_iter().collect::<Vec<_>>();
        let total = keys.len();
        let keys = Confined::try_from(keys)?;
        if threshold == 0 || threshold as usize > total {
            return Err(MultisigError::Threshold { threshold, total });
        }
        if address_type.is_segwit() {
            if let Some(pk) = keys.iter().find(|pk| !pk.is_compressed()) {
                return Err(MultisigError::UncompressedKey(address_type, *pk));
            }
        }
        let descriptor = MultisigDescriptor {
            address_type,
            threshold,
            keys,
        };
        if address_type == MultisigAddressType::P2sh {
            let len = descriptor.multisig_script_len();
            if len > MAX_REDEEM_SCRIPT_SIZE {
                return Err(MultisigError::RedeemScriptTooLarge(len));
            }
        }
        Ok(descriptor)
    }

    /// Constructs descriptor with keys sorted lexicographically by their
    /// serialization (BIP67).
    pub fn with_sorted_keys(
        address_type: MultisigAddressType,
        threshold: u8,
        keys: impl IntoIterator<Item = SignerPk>,
    ) -> Result<Self, MultisigError> {
        let mut keys = keys.into_iter().collect::<Vec<_>>();
        keys.sort();
        Self::new(address_type, threshold, keys)
    }

    /// Reconstructs descriptor from a multisig script
    /// `OP_m <pubkey>... OP_n OP_CHECKMULTISIG`.
    pub fn from_multisig_script(
        address_type: MultisigAddressType,
        script: &[u8],
    ) -> Result<Self, MultisigError> {
        let instrs = instructions(script)?;
        let [Instruction::Num(m), keys @ .., Instruction::Num(n), Instruction::Op(op)] =
            instrs.as_slice()
        else {
            return Err(ScriptError::NotMultisig.into());
        };
        if *op != bc::opcodes::OP_CHECKMULTISIG || *m < 1 || *n as usize != keys.len() {
            return Err(ScriptError::NotMultisig.into());
        }
        let keys = keys
            .iter()
            .map(|instr| match instr {
                Instruction::Push(data) => Ok(SignerPk::from_bytes(data)?),
                _ => Err(MultisigError::Script(ScriptError::NotMultisig)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(address_type, *m as u8, keys)
    }

    /// Reconstructs P2SH descriptor and the provided signatures from a
    /// complete legacy unlocking script `OP_0 <sig>... <redeem script>`.
    pub fn from_p2sh_unlocking_script(
        sig_script: &[u8],
    ) -> Result<(Self, Vec<Vec<u8>>), MultisigError> {
        let mut pushes = PushScript::from_bytes(sig_script)?.pushes()?;
        let redeem_script = pushes.pop().ok_or(ScriptError::NoRedeemScript)?;
        let descriptor = Self::from_multisig_script(MultisigAddressType::P2sh, &redeem_script)?;
        let sigs = match pushes.split_first() {
            Some((dummy, sigs)) if dummy.is_empty() => sigs.to_vec(),
            _ => return Err(ScriptError::NotMultisig.into()),
        };
        Ok((descriptor, sigs))
    }

    pub fn address_type(&self) -> MultisigAddressType { self.address_type }

    /// Number of signatures required to spend (M).
    pub fn required_signers(&self) -> usize { self.threshold as usize }

    /// Number of participant keys (N).
    pub fn total_signers(&self) -> usize { self.keys.len() }

    /// Participant keys in script order.
    pub fn public_keys(&self) -> &[SignerPk] { self.keys.as_slice() }

    fn multisig_script_len(&self) -> usize {
        3 + self.keys.iter().map(|pk| pk.serialize().len() + 1).sum::<usize>()
    }

    fn multisig_redeem_script(&self) -> RedeemScript {
        let mut redeem_script = RedeemScript::with_capacity(self.multisig_script_len());
        redeem_script.push_num(self.threshold);
        for key in self.keys.iter() {
            redeem_script.push_slice(&key.serialize());
        }
        redeem_script.push_num(self.keys.len() as u8);
        redeem_script.push_opcode(OpCode::CheckMultiSig);
        redeem_script
    }

    fn multisig_witness_script(&self) -> WitnessScript {
        let mut witness_script = WitnessScript::with_capacity(self.multisig_script_len());
        witness_script.push_num(self.threshold);
        for key in self.keys.iter() {
            witness_script.push_slice(&key.serialize());
        }
        witness_script.push_num(self.keys.len() as u8);
        witness_script.push_opcode(OpCode::CheckMultiSig);
        witness_script
    }

    /// Serialized `OP_m <pubkey>... OP_n OP_CHECKMULTISIG` script.
    pub fn multisig_script(&self) -> Vec<u8> { self.multisig_redeem_script().to_vec() }

    /// Script hashed into P2SH output: the multisig script for P2SH and the
    /// segwit v0 program for P2SH-P2WSH.
    pub fn redeem_script(&self) -> Option<RedeemScript> {
        match self.address_type {
            MultisigAddressType::P2sh => Some(self.multisig_redeem_script()),
            MultisigAddressType::P2shP2wsh => {
                Some(self.multisig_witness_script().to_redeem_script())
            }
            MultisigAddressType::P2wsh => None,
        }
    }

    /// Multisig script committed to by segwit outputs.
    pub fn witness_script(&self) -> Option<WitnessScript> {
        match self.address_type {
            MultisigAddressType::P2sh => None,
            MultisigAddressType::P2shP2wsh | MultisigAddressType::P2wsh => {
                Some(self.multisig_witness_script())
            }
        }
    }

    pub fn script_pubkey(&self) -> ScriptPubkey {
        match self.address_type {
            MultisigAddressType::P2sh => self.multisig_redeem_script().to_script_pubkey(),
            MultisigAddressType::P2shP2wsh => {
                self.multisig_witness_script().to_redeem_script().to_script_pubkey()
            }
            MultisigAddressType::P2wsh => self.multisig_witness_script().to_script_pubkey(),
        }
    }

    pub fn address(&self, network: Network) -> Result<Address, AddressError> {
        Address::with(&self.script_pubkey(), network)
    }

    /// Completes the unlocking script of a P2SH or P2SH-P2WSH input by
    /// appending the redeem script push to the `satisfaction`, which must
    /// contain only data pushes.
    pub fn p2sh_unlocking_script(
        &self,
        satisfaction: &PushScript,
    ) -> Result<SigScript, MultisigError> {
        let redeem_script =
            self.redeem_script().ok_or(MultisigError::NoRedeemScript(self.address_type))?;
        let mut sig_script = satisfaction.clone();
        sig_script.push_slice(&redeem_script.to_vec());
        Ok(sig_script.into())
    }
}

impl Display for MultisigDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.address_type {
            MultisigAddressType::P2sh => f.write_str("sh(")?,
            MultisigAddressType::P2shP2wsh => f.write_str("sh(wsh(")?,
            MultisigAddressType::P2wsh => f.write_str("wsh(")?,
        }
        write!(f, "multi({}", self.threshold)?;
        for key in self.keys.iter() {
            write!(f, ",{key}")?;
        }
        f.write_str(")")?;
        match self.address_type {
            MultisigAddressType::P2shP2wsh => f.write_str("))"),
            _ => f.write_str(")"),
        }
    }
}

#[cfg(test)]
mod test {
    use amplify::hex::ToHex;
    use bc::secp256k1::{PublicKey, Secp256k1, SecretKey};

    use super::*;

    fn pk(seed: u8) -> SignerPk {
        let sk = SecretKey::from_slice(&[seed; 32]).unwrap();
        SignerPk::compressed(PublicKey::from_secret_key(&Secp256k1::signing_only(), &sk))
    }

    fn descriptor(address_type: MultisigAddressType) -> MultisigDescriptor {
        MultisigDescriptor::new(address_type, 2, [pk(3), pk(1), pk(2)]).unwrap()
    }

    #[test]
    fn multisig_script() {
        let d = descriptor(MultisigAddressType::P2sh);
        let script = d.multisig_script();
        assert_eq!(script.len(), 3 + 3 * 34);
        assert_eq!(script[0], 0x52);
        assert_eq!(script[1], 33);
        assert_eq!(script[2..35], pk(3).serialize()[..]);
        assert_eq!(script[script.len() - 2], 0x53);
        assert_eq!(script[script.len() - 1], 0xae);
        assert_eq!(d.redeem_script().unwrap().to_vec(), script);
        assert!(d.witness_script().is_none());
        assert_eq!(d.public_keys(), &[pk(3), pk(1), pk(2)]);
        assert_eq!(d.required_signers(), 2);
        assert_eq!(d.total_signers(), 3);
    }

    #[test]
    fn script_pubkeys() {
        let sh = descriptor(MultisigAddressType::P2sh).script_pubkey();
        assert!(sh.is_p2sh());
        let wsh = descriptor(MultisigAddressType::P2wsh).script_pubkey();
        assert!(wsh.is_p2wsh());
        let sh_wsh = descriptor(MultisigAddressType::P2shP2wsh);
        assert!(sh_wsh.script_pubkey().is_p2sh());
        let redeem = sh_wsh.redeem_script().unwrap().to_vec();
        assert_eq!(redeem.len(), 34);
        assert_eq!(&redeem[..2], &[0x00, 0x20]);
        assert_eq!(
            sh_wsh.witness_script().unwrap().to_vec(),
            descriptor(MultisigAddressType::P2wsh).multisig_script()
        );
    }

    #[test]
    fn addresses() {
        let addr = descriptor(MultisigAddressType::P2wsh).address(Network::Mainnet).unwrap();
        assert!(addr.to_string().starts_with("bc1q"));
        let addr = descriptor(MultisigAddressType::P2sh).address(Network::Testnet).unwrap();
        assert!(addr.to_string().starts_with('2'));
        let addr = descriptor(MultisigAddressType::P2shP2wsh).address(Network::Mainnet).unwrap();
        assert!(addr.to_string().starts_with('3'));
    }

    #[test]
    fn construction_errors() {
        assert_eq!(
            MultisigDescriptor::new(MultisigAddressType::P2wsh, 3, [pk(1), pk(2)]),
            Err(MultisigError::Threshold {
                threshold: 3,
                total: 2
            })
        );
        assert_eq!(
            MultisigDescriptor::new(MultisigAddressType::P2wsh, 0, [pk(1)]),
            Err(MultisigError::Threshold {
                threshold: 0,
                total: 1
            })
        );
        assert_eq!(
            MultisigDescriptor::new(MultisigAddressType::P2wsh, 1, Vec::<SignerPk>::new()),
            Err(MultisigError::KeyCount(0))
        );
        assert_eq!(
            MultisigDescriptor::new(MultisigAddressType::P2wsh, 1, (1..=16).map(pk)),
            Err(MultisigError::KeyCount(16))
        );
        let uncompressed = SignerPk::uncompressed(pk(1).pubkey());
        assert_eq!(
            MultisigDescriptor::new(MultisigAddressType::P2shP2wsh, 1, [uncompressed]),
            Err(MultisigError::UncompressedKey(MultisigAddressType::P2shP2wsh, uncompressed))
        );
        assert!(MultisigDescriptor::new(MultisigAddressType::P2sh, 1, [uncompressed]).is_ok());
        let many = (1..=8).map(|seed| SignerPk::uncompressed(pk(seed).pubkey()));
        assert_eq!(
            MultisigDescriptor::new(MultisigAddressType::P2sh, 2, many),
            Err(MultisigError::RedeemScriptTooLarge(3 + 8 * 66))
        );
    }

    #[test]
    fn sorted_keys() {
        let d = MultisigDescriptor::with_sorted_keys(MultisigAddressType::P2wsh, 2, [
            pk(3),
            pk(1),
            pk(2),
        ])
        .unwrap();
        let keys = d.public_keys().iter().map(SignerPk::serialize).collect::<Vec<_>>();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }

    #[test]
    fn script_reconstruction() {
        let d = descriptor(MultisigAddressType::P2sh);
        assert_eq!(
            MultisigDescriptor::from_multisig_script(
                MultisigAddressType::P2sh,
                &d.multisig_script()
            ),
            Ok(d.clone())
        );
        assert_eq!(
            MultisigDescriptor::from_multisig_script(MultisigAddressType::P2sh, &[0x51, 0xae]),
            Err(MultisigError::Script(ScriptError::NotMultisig))
        );
    }

    #[test]
    fn p2sh_unlocking() {
        let d = descriptor(MultisigAddressType::P2sh);
        let sigs = vec![vec![0x30; 71], vec![0x31; 72]];
        let mut satisfaction = PushScript::new();
        satisfaction.push_zero();
        for sig in &sigs {
            satisfaction.push_slice(sig);
        }
        let sig_script = d.p2sh_unlocking_script(&satisfaction).unwrap();
        let (restored, restored_sigs) =
            MultisigDescriptor::from_p2sh_unlocking_script(&sig_script.to_vec()).unwrap();
        assert_eq!(restored, d);
        assert_eq!(restored_sigs, sigs);

        let wsh = descriptor(MultisigAddressType::P2wsh);
        assert_eq!(
            wsh.p2sh_unlocking_script(&satisfaction),
            Err(MultisigError::NoRedeemScript(MultisigAddressType::P2wsh))
        );
    }

    #[test]
    fn public_key_validation() {
        let uncompressed = SignerPk::uncompressed(pk(1).pubkey()).to_string();
        assert_eq!(validate_multisig_public_key(&uncompressed, MultisigAddressType::P2sh), Ok(()));
        let err =
            validate_multisig_public_key(&uncompressed, MultisigAddressType::P2wsh).unwrap_err();
        assert_eq!(
            err.to_string(),
            "P2SH-P2WSH and P2WSH addresses require compressed public keys."
        );
        assert_eq!(
            validate_multisig_public_key("", MultisigAddressType::P2wsh),
            Err(MultisigPkError::Pubkey(PubkeyError::Blank))
        );
        assert_eq!(pk(1).serialize().to_hex().len(), 66);
    }

    #[test]
    fn address_type_names() {
        for ty in [
            MultisigAddressType::P2sh,
            MultisigAddressType::P2shP2wsh,
            MultisigAddressType::P2wsh,
        ] {
            assert_eq!(MultisigAddressType::from_str(&ty.to_string()), Ok(ty));
        }
        assert_eq!(
            MultisigAddressType::from_str("p2sh_p2wsh"),
            Ok(MultisigAddressType::P2shP2wsh)
        );
        assert!(MultisigAddressType::from_str("P2TR").is_err());
    }
}
