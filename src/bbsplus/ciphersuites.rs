// Copyright 2025 Fondazione LINKS

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at

//     http://www.apache.org/licenses/LICENSE-2.0

// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use digest::HashMarker;
use elliptic_curve::hash2curve::{ExpandMsg, ExpandMsgXmd, ExpandMsgXof};
use sha2::Sha256;
use sha3::Shake256;

/// Hash and domain separation parameters shared by signer, holder and verifier.
///
/// Every tag is derived from [`BbsCiphersuite::ID`], so two parties agree on the
/// generators and on every Fiat-Shamir challenge as long as they pick the same suite.
pub trait BbsCiphersuite: Send + Sync + 'static {
    const ID: &'static [u8];
    const GENERATOR_DST: &'static [u8];
    const MAP_MSG_DST: &'static [u8];
    const H2S: &'static [u8];
    const NONCE_DST: &'static [u8];
    const BLIND_DST: &'static [u8];
    /// Minimum length of seed material for key generation
    const IKM_LEN: usize = 32;
    /// Bytes of uniform output reduced into one scalar
    const EXPAND_LEN: usize = 48;
    type HashAlg: HashMarker;
    type Expander: ExpandMsg<'static>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bls12381Shake256 {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bls12381Sha256 {}

impl BbsCiphersuite for Bls12381Shake256 {
    const ID: &'static [u8] = b"BBS_BLS12381G1_XOF:SHAKE-256_SSWU_RO_";
    const GENERATOR_DST: &'static [u8] = b"BBS_BLS12381G1_XOF:SHAKE-256_SSWU_RO_SIG_GENERATOR_DST_";
    const MAP_MSG_DST: &'static [u8] = b"BBS_BLS12381G1_XOF:SHAKE-256_SSWU_RO_MAP_MSG_TO_SCALAR_AS_HASH_";
    const H2S: &'static [u8] = b"BBS_BLS12381G1_XOF:SHAKE-256_SSWU_RO_H2S_";
    const NONCE_DST: &'static [u8] = b"BBS_BLS12381G1_XOF:SHAKE-256_SSWU_RO_PROOF_NONCE_";
    const BLIND_DST: &'static [u8] = b"BBS_BLS12381G1_XOF:SHAKE-256_SSWU_RO_BLIND_H2S_";
    type HashAlg = Shake256;
    type Expander = ExpandMsgXof<Self::HashAlg>;
}

impl BbsCiphersuite for Bls12381Sha256 {
    const ID: &'static [u8] = b"BBS_BLS12381G1_XMD:SHA-256_SSWU_RO_";
    const GENERATOR_DST: &'static [u8] = b"BBS_BLS12381G1_XMD:SHA-256_SSWU_RO_SIG_GENERATOR_DST_";
    const MAP_MSG_DST: &'static [u8] = b"BBS_BLS12381G1_XMD:SHA-256_SSWU_RO_MAP_MSG_TO_SCALAR_AS_HASH_";
    const H2S: &'static [u8] = b"BBS_BLS12381G1_XMD:SHA-256_SSWU_RO_H2S_";
    const NONCE_DST: &'static [u8] = b"BBS_BLS12381G1_XMD:SHA-256_SSWU_RO_PROOF_NONCE_";
    const BLIND_DST: &'static [u8] = b"BBS_BLS12381G1_XMD:SHA-256_SSWU_RO_BLIND_H2S_";
    type HashAlg = Sha256;
    type Expander = ExpandMsgXmd<Self::HashAlg>;
}
