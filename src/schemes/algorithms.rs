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


use crate::{
    bbsplus::keys::PublicKey,
    keys::bls_key::{DeterministicPublicKey, G1PublicKey, SecretKey},
};

/// BLS key pair with the public key in G2, usable as a BBS+ issuer key.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BlsG2;

/// BLS key pair with the public key in G1.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BlsG1;

/// BBS+ key pair: the BLS secret together with the message generators derived from `w`.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Bbs;

pub trait Scheme: Eq + Clone + 'static + Sized {
    type PrivKey;
    type PubKey;
}

impl Scheme for BlsG2 {
    type PrivKey = SecretKey;
    type PubKey = DeterministicPublicKey;
}

impl Scheme for BlsG1 {
    type PrivKey = SecretKey;
    type PubKey = G1PublicKey;
}

impl Scheme for Bbs {
    type PrivKey = SecretKey;
    type PubKey = PublicKey;
}
