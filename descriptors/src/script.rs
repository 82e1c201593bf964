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

//! Push-only scripts, which is the form of all standard unlocking scripts.

use bc::SigScript;

const OP_0: u8 = 0x00;
const OP_PUSHDATA1: u8 = 0x4c;
const OP_PUSHDATA2: u8 = 0x4d;
const OP_PUSHDATA4: u8 = 0x4e;
const OP_1NEGATE: u8 = 0x4f;
const OP_1: u8 = 0x51;
const OP_16: u8 = 0x60;

/// Errors parsing scripts.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display, Error)]
#[display(doc_comments)]
pub enum ScriptError {
    /// script ends unexpectedly at byte {0}.
    UnexpectedEnd(usize),

    /// script is not a standard multisig script.
    NotMultisig,

    /// unlocking script contains non-push opcode {0:#04x}.
    NonPushOpcode(u8),

    /// unlocking script does not end with a redeem script push.
    NoRedeemScript,
}

/// Single instruction of a script.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Instruction<'script> {
    /// Data push, including `OP_0` pushing an empty vector.
    Push(&'script [u8]),

    /// Small integer pushed with `OP_1NEGATE`, `OP_1`..`OP_16`.
    Num(i8),

    /// Any other opcode.
    Op(u8),
}

impl Instruction<'_> {
    pub fn is_push(&self) -> bool { !matches!(self, Instruction::Op(_)) }
}

/// Splits script into instructions.
pub fn instructions(script: &[u8]) -> Result<Vec<Instruction>, ScriptError> {
    let mut res = vec![];
    let mut pos = 0usize;
    while pos < script.len() {
        let op = script[pos];
        pos += 1;
        let len = match op {
            OP_0 => {
                res.push(Instruction::Push(&[]));
                continue;
            }
            0x01..=0x4b => op as usize,
            OP_PUSHDATA1 | OP_PUSHDATA2 | OP_PUSHDATA4 => {
                let width = match op {
                    OP_PUSHDATA1 => 1,
                    OP_PUSHDATA2 => 2,
                    _ => 4,
                };
                let bytes = script.get(pos..pos + width).ok_or(ScriptError::UnexpectedEnd(pos))?;
                pos += width;
                let mut len = [0u8; 4];
                len[..width].copy_from_slice(bytes);
                u32::from_le_bytes(len) as usize
            }
            OP_1NEGATE => {
                res.push(Instruction::Num(-1));
                continue;
            }
            OP_1..=OP_16 => {
                res.push(Instruction::Num((op - OP_1 + 1) as i8));
                continue;
            }
            other => {
                res.push(Instruction::Op(other));
                continue;
            }
        };
        let data = pos
            .checked_add(len)
            .and_then(|end| script.get(pos..end))
            .ok_or(ScriptError::UnexpectedEnd(script.len()))?;
        res.push(Instruction::Push(data));
        pos += len;
    }
    Ok(res)
}

/// Script consisting only of data pushes.
#[derive(Clone, Eq, PartialEq, Hash, Debug, Default)]
pub struct PushScript(Vec<u8>);

impl PushScript {
    pub fn new() -> Self { PushScript::default() }

    /// Pushes empty vector with `OP_0`.
    pub fn push_zero(&mut self) { self.0.push(OP_0); }

    /// Pushes data using the minimal push opcode.
    pub fn push_slice(&mut self, data: &[u8]) {
        match data.len() {
            0 => self.0.push(OP_0),
            len @ 0x01..=0x4b => self.0.push(len as u8),
            len @ 0x4c..=0xff => {
                self.0.push(OP_PUSHDATA1);
                self.0.push(len as u8);
            }
            len @ 0x100..=0xffff => {
                self.0.push(OP_PUSHDATA2);
                self.0.extend((len as u16).to_le_bytes());
            }
            len => {
                self.0.push(OP_PUSHDATA4);
                self.0.extend((len as u32).to_le_bytes());
            }
        }
        self.0.extend_from_slice(data);
    }

    /// Parses script, failing if it contains anything except data pushes.
    pub fn from_bytes(script: &[u8]) -> Result<Self, ScriptError> {
        for instr in instructions(script)? {
            if let Instruction::Op(op) = instr {
                return Err(ScriptError::NonPushOpcode(op));
            }
        }
        Ok(PushScript(script.to_vec()))
    }

    /// Returns data pushed by the script. Small integers are returned in
    /// their minimal encoding.
    pub fn pushes(&self) -> Result<Vec<Vec<u8>>, ScriptError> {
        instructions(&self.0)?
            .into_iter()
            .map(|instr| match instr {
                Instruction::Push(data) => Ok(data.to_vec()),
                Instruction::Num(-1) => Ok(vec![0x81]),
                Instruction::Num(n) => Ok(vec![n as u8]),
                Instruction::Op(op) => Err(ScriptError::NonPushOpcode(op)),
            })
            .collect()
    }

    pub fn as_slice(&self) -> &[u8] { &self.0 }

    pub fn into_vec(self) -> Vec<u8> { self.0 }

    pub fn to_sig_script(&self) -> SigScript { SigScript::from_unsafe(self.0.clone()) }
}

impl From<PushScript> for SigScript {
    fn from(script: PushScript) -> Self { SigScript::from_unsafe(script.0) }
}
