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


//! Byte oriented entry points over [`Bls12381Sha256`].
//!
//! Verification outcomes come back as a [`VerifyResponse`]; an `Err` means the call
//! itself was malformed (bad key bytes, inconsistent lengths).

#[cfg(feature = "blind")]
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[cfg(feature = "blind")]
use crate::bbsplus::{
    blind::BlindSignature,
    commitment::{BlindSignatureContext, BlindingFactor},
};
use crate::{
    bbsplus::{
        ciphersuites::Bls12381Sha256,
        keys::PublicKey,
        message::SignatureMessage,
        proof::{self, ProofOfKnowledge, ProofRequest as TypedProofRequest},
        signature::Signature,
    },
    errors::{Error, VerificationFailure},
    keys::{
        bls_key::{DeterministicPublicKey, G1PublicKey, SecretKey},
        pair::KeyPair,
    },
    schemes::algorithms::{Bbs, BlsG1, BlsG2},
};

type Suite = Bls12381Sha256;

pub const SIGNATURE_LENGTH: usize = Signature::BYTES;
#[cfg(feature = "blind")]
pub const BLIND_SIGNATURE_LENGTH: usize = BlindSignature::BYTES;
pub const SECRET_KEY_LENGTH: usize = SecretKey::BYTES;
pub const G1_PUBLIC_KEY_LENGTH: usize = G1PublicKey::BYTES;
pub const G2_PUBLIC_KEY_LENGTH: usize = DeterministicPublicKey::BYTES;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<VerificationFailure>,
}

impl VerifyResponse {
    pub fn success() -> Self {
        Self {
            verified: true,
            error: None,
        }
    }

    pub fn failure(error: VerificationFailure) -> Self {
        Self {
            verified: false,
            error: Some(error),
        }
    }

    pub fn to_json(&self) -> Result<String, Error> {
        serde_json::to_string(self).map_err(|e| Error::DeserializationError(e.to_string()))
    }

    /// Folds a verification outcome into a response, passing other errors through.
    fn from_outcome(outcome: Result<(), Error>) -> Result<Self, Error> {
        match outcome {
            Ok(()) => Ok(Self::success()),
            Err(Error::Verification(failure)) => Ok(Self::failure(failure)),
            Err(e) => Err(e),
        }
    }
}

impl From<Result<(), VerificationFailure>> for VerifyResponse {
    fn from(outcome: Result<(), VerificationFailure>) -> Self {
        match outcome {
            Ok(()) => Self::success(),
            Err(failure) => Self::failure(failure),
        }
    }
}

/// One statement of [`create_proof_multi`]
#[derive(Clone, Copy, Debug)]
pub struct ProofRequest<'a> {
    pub signature: &'a [u8],
    pub public_key: &'a PublicKey,
    pub messages: &'a [Vec<u8>],
    pub revealed: &'a [usize],
}

pub fn generate_bls12381_g2_key_pair(seed: Option<&[u8]>) -> Result<KeyPair<BlsG2>, Error> {
    KeyPair::<BlsG2>::generate(seed, &mut rand::thread_rng())
}

pub fn generate_bls12381_g1_key_pair(seed: Option<&[u8]>) -> Result<KeyPair<BlsG1>, Error> {
    KeyPair::<BlsG1>::generate(seed, &mut rand::thread_rng())
}

pub fn bls12381_to_bbs(
    keypair: &KeyPair<BlsG2>,
    message_count: usize,
) -> Result<KeyPair<Bbs>, Error> {
    keypair.to_bbs::<Suite>(message_count)
}

pub fn bls_public_key_to_bbs(public_key: &[u8], message_count: usize) -> Result<PublicKey, Error> {
    DeterministicPublicKey::from_bytes(public_key)?.to_public_key::<Suite>(message_count)
}

pub fn sign<M: AsRef<[u8]>>(
    keypair: &KeyPair<Bbs>,
    messages: &[M],
) -> Result<[u8; SIGNATURE_LENGTH], Error> {
    Signature::sign::<Suite, _, M>(messages, keypair, &mut rand::thread_rng())
        .map(|s| s.to_bytes())
}

pub fn bls_sign<M: AsRef<[u8]>>(
    keypair: &KeyPair<BlsG2>,
    messages: &[M],
) -> Result<[u8; SIGNATURE_LENGTH], Error> {
    Signature::bls_sign::<Suite, _, M>(messages, keypair, &mut rand::thread_rng())
        .map(|s| s.to_bytes())
}

pub fn verify<M: AsRef<[u8]>>(
    public_key: &PublicKey,
    messages: &[M],
    signature: &[u8],
) -> Result<VerifyResponse, Error> {
    public_key.validate()?;
    let signature = match Signature::from_bytes(signature) {
        Ok(signature) => signature,
        Err(_) => return Ok(VerifyResponse::failure(VerificationFailure::MalformedSignature)),
    };
    let messages = SignatureMessage::messages_to_scalar::<Suite, M>(messages)?;
    Ok(signature.verify(&messages, public_key).into())
}

/// Verify against a 96 byte BLS public key; the generators follow from the message count.
pub fn bls_verify<M: AsRef<[u8]>>(
    public_key: &[u8],
    messages: &[M],
    signature: &[u8],
) -> Result<VerifyResponse, Error> {
    if public_key.is_empty() {
        return Err(Error::KeyDeserializationError);
    }
    if messages.is_empty() {
        return Ok(VerifyResponse::failure(VerificationFailure::MessageCountMismatch));
    }
    let public_key = bls_public_key_to_bbs(public_key, messages.len())?;
    verify(&public_key, messages, signature)
}

pub fn create_proof<M: AsRef<[u8]>>(
    signature: &[u8],
    public_key: &PublicKey,
    messages: &[M],
    revealed: &[usize],
    nonce: &[u8],
) -> Result<Vec<u8>, Error> {
    let signature = Signature::from_bytes(signature)?;
    let messages = SignatureMessage::messages_to_scalar::<Suite, M>(messages)?;
    proof::create_proof::<Suite, _>(
        &signature,
        public_key,
        &messages,
        revealed,
        nonce,
        &mut rand::thread_rng(),
    )
    .map(|p| p.to_bytes())
}

/// Verify a proof; `revealed_messages` are the disclosed values in index order.
pub fn verify_proof<M: AsRef<[u8]>>(
    public_key: &PublicKey,
    proof: &[u8],
    revealed_messages: &[M],
    nonce: &[u8],
) -> Result<VerifyResponse, Error> {
    public_key.validate()?;
    let proof = match ProofOfKnowledge::from_bytes(proof) {
        Ok(proof) => proof,
        Err(_) => return Ok(VerifyResponse::failure(VerificationFailure::ProofOfKnowledgeFailed)),
    };
    let revealed = SignatureMessage::messages_to_scalar::<Suite, M>(revealed_messages)?;
    VerifyResponse::from_outcome(proof::verify_proof::<Suite>(public_key, &proof, &revealed, nonce))
}

/// Verify a proof against a BLS public key, deriving the generators from the proof header.
pub fn bls_verify_proof<M: AsRef<[u8]>>(
    public_key: &[u8],
    proof: &[u8],
    revealed_messages: &[M],
    nonce: &[u8],
) -> Result<VerifyResponse, Error> {
    let w = DeterministicPublicKey::from_bytes(public_key)?;
    let message_count = match ProofOfKnowledge::from_bytes(proof) {
        Ok(p) => p.message_count(),
        Err(_) => return Ok(VerifyResponse::failure(VerificationFailure::ProofOfKnowledgeFailed)),
    };
    verify_proof(&w.to_public_key::<Suite>(message_count)?, proof, revealed_messages, nonce)
}

pub fn create_proof_multi(
    requests: &[ProofRequest<'_>],
    nonce: &[u8],
    equivalences: &[Vec<(usize, usize)>],
) -> Result<Vec<Vec<u8>>, Error> {
    let signatures = requests
        .iter()
        .map(|r| Signature::from_bytes(r.signature))
        .collect::<Result<Vec<_>, _>>()?;
    let messages = requests
        .iter()
        .map(|r| SignatureMessage::messages_to_scalar::<Suite, _>(r.messages))
        .collect::<Result<Vec<_>, _>>()?;

    let typed: Vec<TypedProofRequest<'_>> = requests
        .iter()
        .zip(signatures.iter())
        .zip(messages.iter())
        .map(|((r, signature), messages)| TypedProofRequest {
            signature,
            public_key: r.public_key,
            messages,
            revealed: r.revealed,
        })
        .collect();

    let mut rng = rand::thread_rng();
    let proofs = proof::create_proof_multi::<Suite, _>(&typed, nonce, equivalences, &mut rng)?;
    Ok(proofs.iter().map(|p| p.to_bytes()).collect())
}

pub fn verify_proof_multi(
    public_keys: &[PublicKey],
    proofs: &[Vec<u8>],
    revealed_messages: &[Vec<Vec<u8>>],
    nonce: &[u8],
    equivalences: &[Vec<(usize, usize)>],
) -> Result<VerifyResponse, Error> {
    for pk in public_keys {
        pk.validate()?;
    }
    let proofs = match proofs
        .iter()
        .map(|p| ProofOfKnowledge::from_bytes(p))
        .collect::<Result<Vec<_>, _>>()
    {
        Ok(proofs) => proofs,
        Err(_) => return Ok(VerifyResponse::failure(VerificationFailure::ProofOfKnowledgeFailed)),
    };
    let revealed = revealed_messages
        .iter()
        .map(|msgs| SignatureMessage::messages_to_scalar::<Suite, _>(msgs.as_slice()))
        .collect::<Result<Vec<_>, _>>()?;

    VerifyResponse::from_outcome(proof::verify_proof_multi::<Suite>(
        public_keys,
        &proofs,
        &revealed,
        nonce,
        equivalences,
    ))
}

/// Commit to the hidden messages; the context goes to the signer, the factor stays with the holder.
#[cfg(feature = "blind")]
pub fn blind_signature_request(
    public_key: &PublicKey,
    hidden: &BTreeMap<usize, Vec<u8>>,
    nonce: &[u8],
) -> Result<(Vec<u8>, BlindingFactor), Error> {
    let hidden = hash_map_messages(hidden)?;
    let (ctx, factor) = BlindSignatureContext::new::<Suite, _>(
        public_key,
        &hidden,
        nonce,
        &mut rand::thread_rng(),
    )?;
    Ok((ctx.to_bytes(), factor))
}

#[cfg(feature = "blind")]
pub fn verify_blind_signature_request(
    context: &[u8],
    public_key: &PublicKey,
    nonce: &[u8],
) -> Result<bool, Error> {
    match BlindSignatureContext::from_bytes(context) {
        Ok(ctx) => ctx.verify::<Suite>(public_key, nonce),
        Err(_) => Ok(false),
    }
}

#[cfg(feature = "blind")]
pub fn blind_sign(
    keypair: &KeyPair<Bbs>,
    known: &BTreeMap<usize, Vec<u8>>,
    context: &[u8],
    nonce: &[u8],
) -> Result<[u8; BLIND_SIGNATURE_LENGTH], Error> {
    let ctx =
        BlindSignatureContext::from_bytes(context).map_err(|_| Error::InvalidCommitmentProof)?;
    let known = hash_map_messages(known)?;
    BlindSignature::new::<Suite, _>(&ctx, &known, keypair, nonce, &mut rand::thread_rng())
        .map(|b| b.to_bytes())
}

#[cfg(feature = "blind")]
pub fn unblind_signature(
    blind_signature: &[u8],
    factor: &BlindingFactor,
) -> Result<[u8; SIGNATURE_LENGTH], Error> {
    BlindSignature::from_bytes(blind_signature)?
        .to_unblinded(factor)
        .map(|s| s.to_bytes())
}

#[cfg(feature = "blind")]
fn hash_map_messages(
    messages: &BTreeMap<usize, Vec<u8>>,
) -> Result<BTreeMap<usize, SignatureMessage>, Error> {
    messages
        .iter()
        .map(|(&i, m)| SignatureMessage::hash::<Suite>(m).map(|s| (i, s)))
        .collect()
}
