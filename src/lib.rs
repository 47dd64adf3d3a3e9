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


#![allow(non_snake_case)]

//! BBS+ multi-message signatures with selective disclosure proofs and blind issuance.
//!
//! The [`api`] module offers a byte oriented surface over the default
//! [`bbsplus::ciphersuites::Bls12381Sha256`] suite; the typed building blocks live in [`bbsplus`].

/// Flat byte oriented operations
pub mod api;
/// BBS+ signature scheme
pub mod bbsplus;
/// Errors
pub mod errors;
/// Keys
pub mod keys;
/// Schemes
pub mod schemes;
/// Utilities
pub mod utils;
