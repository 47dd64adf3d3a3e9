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


//! BBS+ signatures over BLS12-381, following the construction of Au, Susilo and Mu
//! as later refined by Camenisch, Drijvers and Lehmann.
//!
//! A signature `(A, e, s)` binds an ordered list of messages to a BLS key `w = x * g2`.
//! From it the holder derives zero-knowledge proofs that disclose any subset of the
//! messages, and with the `blind` feature a signer can sign messages it only knows
//! through a Pedersen commitment.
//! - **Deterministic generators**: every message generator is hashed to the curve from
//!   `w` and the message count, so a BLS public key alone fixes the BBS+ key.
//! - **Selective disclosure**: [`proof::create_proof`] reveals the chosen messages and
//!   hides the rest; the proof is unlinkable to the signature it came from.
//! - **Multi proofs**: [`proof::create_proof_multi`] proves several signatures under one
//!   challenge and can show that hidden messages across them are equal.
//! # Usage
//! ```toml
//! zkbbs = { version = "0.1", default-features = false, features = ["blind"] }
//! ```

#[cfg(feature = "blind")]
/// Module for blind signatures
pub mod blind;
/// Module for ciphersuites
pub mod ciphersuites;
#[cfg(feature = "blind")]
/// Module for commitments
pub mod commitment;
/// Module for generators
pub mod generators;
/// Module for keys
pub mod keys;
/// Module for messages
pub mod message;
/// Module for the sigma protocol over vector commitments
pub mod pok_vc;
/// Module for proofs
pub mod proof;
/// Module for signatures
pub mod signature;
