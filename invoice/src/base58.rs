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

//! Base58Check encoding with the four-byte double-SHA256 checksum used by
//! legacy addresses and BIP32 extended keys.

use std::fmt;

/// Errors decoding Base58Check strings.
#[derive(Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum Error {
    /// invalid base58 character '{0}' at position {1}.
    InvalidCharacter(char, usize),

    /// invalid checksum {0:08x}, expected {1:08x}.
    InvalidChecksum(u32, u32),

    /// invalid length of the decoded data ({0}).
    InvalidLength(usize),

    /// {0}
    Other(String),
}

impl From<bs58::decode::Error> for Error {
    fn from(err: bs58::decode::Error) -> Self {
        match err {
            bs58::decode::Error::InvalidCharacter { character, index } => {
                Error::InvalidCharacter(character, index)
            }
            bs58::decode::Error::NonAsciiCharacter { index } => Error::InvalidCharacter('?', index),
            bs58::decode::Error::InvalidChecksum {
                checksum,
                expected_checksum,
            } => Error::InvalidChecksum(
                u32::from_be_bytes(checksum),
                u32::from_be_bytes(expected_checksum),
            ),
            bs58::decode::Error::NoChecksum => Error::InvalidLength(0),
            other => Error::Other(other.to_string()),
        }
    }
}

/// Decodes a Base58Check string, returning the payload without the checksum.
pub fn decode_check(s: &str) -> Result<Vec<u8>, Error> {
    Ok(bs58::decode(s).with_check(None).into_vec()?)
}

/// Encodes the payload as a Base58Check string.
pub fn encode_check(data: &[u8]) -> String { bs58::encode(data).with_check().into_string() }

/// Writes Base58Check encoding of the payload into a formatter.
pub fn encode_check_to_fmt(f: &mut fmt::Formatter, data: &[u8]) -> fmt::Result {
    f.write_str(&encode_check(data))
}
