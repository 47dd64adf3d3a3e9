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

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a cryptographic check did not pass.
///
/// This is an expected outcome rather than a program error, so the verifying
/// operations hand it back as data (see [`crate::api::VerifyResponse`]).
/// Categories are coarse: nothing tells the caller which equation or which
/// response was wrong.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationFailure {
    #[error("Malformed signature")]
    MalformedSignature,
    #[error("Number of messages does not match the public key")]
    MessageCountMismatch,
    #[error("Pairing check failed")]
    PairingCheckFailed,
    #[error("Proof of knowledge verification failed")]
    ProofOfKnowledgeFailed,
}

#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("Seed must be at least {0} bytes")]
    InvalidSeedLength(usize),
    #[error("Message count must be greater than zero")]
    InvalidMessageCount,
    #[error("Expected {expected} messages, got {actual}")]
    MessageCountMismatch { expected: usize, actual: usize },
    #[error("Invalid disclosure index {0}")]
    InvalidDisclosureIndex(usize),
    #[error("Invalid proof request: {0}")]
    InvalidProofRequest(String),

    #[error("Invalid key")]
    KeyDeserializationError,
    #[error("Public key contains an identity element")]
    MalformedPublicKey,
    #[error("Error during deserialization: {0}")]
    DeserializationError(String),
    #[error("Error during hash to scalar computation")]
    HashToScalarError,

    #[error("Invalid commitment proof")]
    InvalidCommitmentProof,
    #[error("Degenerate randomness, retries exhausted")]
    DegenerateRandomness,
    #[error("Blinding factor does not match the blinded commitment")]
    UnblindingMismatch,

    #[error("Error during computation of a Proof of Knowledge of a Signature: {0}")]
    ProofGenError(String),

    #[error("Verification failed: {0}")]
    Verification(#[from] VerificationFailure),
}
