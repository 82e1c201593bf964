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

use crate::AddressNetwork;

/// Bitcoin network a multisig wallet operates on.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug, Display, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
#[display(lowercase)]
pub enum Network {
    /// Bitcoin mainnet
    #[default]
    Mainnet,

    /// Any of bitcoin test networks (testnet, signet, regtest)
    Testnet,
}

impl Network {
    /// Detects whether the network is a kind of test network.
    pub fn is_testnet(self) -> bool { self != Self::Mainnet }

    /// Checks whether an address of the given address network can be paid to
    /// from a wallet on this network. Test networks accept regtest addresses.
    pub fn accepts(self, address_network: AddressNetwork) -> bool {
        match self {
            Network::Mainnet => address_network == AddressNetwork::Mainnet,
            Network::Testnet => address_network.is_testnet(),
        }
    }
}

impl From<Network> for AddressNetwork {
    fn from(network: Network) -> Self {
        match network {
            Network::Mainnet => AddressNetwork::Mainnet,
            Network::Testnet => AddressNetwork::Testnet,
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display("unknown bitcoin network '{0}'")]
pub struct UnknownNetwork(pub String);

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "bitcoin" | "mainnet" => Network::Mainnet,
            "testnet" | "testnet3" | "testnet4" | "signet" | "regtest" => Network::Testnet,
            other => return Err(UnknownNetwork(other.to_owned())),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display_from_str() {
        assert_eq!(Network::Mainnet.to_string(), "mainnet");
        assert_eq!(Network::Testnet.to_string(), "testnet");
        assert_eq!(Network::from_str("bitcoin").unwrap(), Network::Mainnet);
        assert_eq!(Network::from_str("signet").unwrap(), Network::Testnet);
        assert_eq!(Network::from_str("litecoin"), Err(UnknownNetwork(s!("litecoin"))));
    }

    #[test]
    fn address_networks() {
        assert!(Network::Mainnet.accepts(AddressNetwork::Mainnet));
        assert!(!Network::Mainnet.accepts(AddressNetwork::Testnet));
        assert!(Network::Testnet.accepts(AddressNetwork::Testnet));
        assert!(Network::Testnet.accepts(AddressNetwork::Regtest));
        assert!(!Network::Testnet.accepts(AddressNetwork::Mainnet));
    }
}
