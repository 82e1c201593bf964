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

use bc::{Sats, ScriptPubkey};
use invoice::{Address, AddressParseError, Network};

/// Total supply of bitcoin in satoshis.
pub const MAX_MONEY: Sats = Sats(21_000_000 * 100_000_000);

/// Errors in the set of transaction outputs.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum OutputError {
    /// at least one output is required.
    NoOutputs,

    /// output {index} has invalid address '{address}' - {reason}
    InvalidAddress {
        index: usize,
        address: String,
        reason: AddressParseError,
    },

    /// output {index} address {address} is not valid for {network}.
    WrongNetwork {
        index: usize,
        address: String,
        network: Network,
    },

    /// output {0} has zero amount.
    ZeroAmount(usize),

    /// output {index} amount of {amount} sats exceeds total bitcoin supply.
    AmountTooLarge { index: usize, amount: u64 },
}

/// Payment created by the transaction.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize), serde(crate = "serde_crate"))]
pub struct TransactionOutput {
    /// Destination address.
    pub address: String,

    /// Amount to send.
    pub amount: Sats,
}

impl TransactionOutput {
    pub fn new(address: impl ToString, amount: Sats) -> Self {
        TransactionOutput {
            address: address.to_string(),
            amount,
        }
    }

    pub(crate) fn script_pubkey(
        &self,
        index: usize,
        network: Network,
    ) -> Result<ScriptPubkey, OutputError> {
        let address =
            Address::from_str(&self.address).map_err(|reason| OutputError::InvalidAddress {
                index,
                address: self.address.clone(),
                reason,
            })?;
        if !address.is_valid_for(network) {
            return Err(OutputError::WrongNetwork {
                index,
                address: self.address.clone(),
                network,
            });
        }
        if self.amount == Sats::ZERO {
            return Err(OutputError::ZeroAmount(index));
        }
        if self.amount.0 > MAX_MONEY.0 {
            return Err(OutputError::AmountTooLarge {
                index,
                amount: self.amount.0,
            });
        }
        Ok(address.script_pubkey())
    }
}

/// Checks that there is at least one output, and that each output pays a
/// positive amount to an address of the given network.
pub fn validate_outputs(network: Network, outputs: &[TransactionOutput]) -> Result<(), OutputError> {
    if outputs.is_empty() {
        return Err(OutputError::NoOutputs);
    }
    for (index, output) in outputs.iter().enumerate() {
        output.script_pubkey(index, network)?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    const MAINNET_P2SH: &str = "3J98t1WpEZ73CNmQviecrnyiWrnqRhWNLy";
    const MAINNET_P2WSH: &str = "bc1qrp33g0q5c5txsp9arysrx4k6zdkfs4nce4xj0gdcccefvpysxf3qccfmv3";

    #[test]
    fn valid_outputs() {
        let outputs = [
            TransactionOutput::new(MAINNET_P2SH, Sats(10_000)),
            TransactionOutput::new(MAINNET_P2WSH, MAX_MONEY),
        ];
        assert_eq!(validate_outputs(Network::Mainnet, &outputs), Ok(()));
        assert_eq!(
            outputs[0].script_pubkey(0, Network::Mainnet).unwrap(),
            Address::from_str(MAINNET_P2SH).unwrap().script_pubkey()
        );
    }

    #[test]
    fn no_outputs() {
        assert_eq!(validate_outputs(Network::Testnet, &[]), Err(OutputError::NoOutputs));
    }

    #[test]
    fn invalid_address() {
        let outputs = [TransactionOutput::new("not-an-address", Sats(1))];
        assert!(matches!(
            validate_outputs(Network::Mainnet, &outputs),
            Err(OutputError::InvalidAddress { index: 0, .. })
        ));
    }

    #[test]
    fn wrong_network() {
        let outputs = [
            TransactionOutput::new(MAINNET_P2WSH, Sats(1)),
            TransactionOutput::new(MAINNET_P2SH, Sats(1)),
        ];
        assert_eq!(
            validate_outputs(Network::Testnet, &outputs),
            Err(OutputError::WrongNetwork {
                index: 0,
                address: MAINNET_P2WSH.to_owned(),
                network: Network::Testnet
            })
        );
    }

    #[test]
    fn wrong_amount() {
        let outputs = [TransactionOutput::new(MAINNET_P2SH, Sats::ZERO)];
        assert_eq!(validate_outputs(Network::Mainnet, &outputs), Err(OutputError::ZeroAmount(0)));

        let outputs = [
            TransactionOutput::new(MAINNET_P2SH, Sats(1)),
            TransactionOutput::new(MAINNET_P2SH, Sats(MAX_MONEY.0 + 1)),
        ];
        assert_eq!(
            validate_outputs(Network::Mainnet, &outputs),
            Err(OutputError::AmountTooLarge {
                index: 1,
                amount: MAX_MONEY.0 + 1
            })
        );
    }
}
