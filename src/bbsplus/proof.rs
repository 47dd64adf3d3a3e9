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


use std::collections::{BTreeMap, BTreeSet};

use bls12_381_plus::{
    multi_miller_loop, G1Affine, G1Projective, G2Affine, G2Prepared, G2Projective, Gt, Scalar,
};
use elliptic_curve::{group::Curve, hash2curve::ExpandMsg};
use ff::Field;
use rand::{rngs::StdRng, CryptoRng, RngCore, SeedableRng};
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{
    ciphersuites::BbsCiphersuite,
    keys::PublicKey,
    message::{HiddenMessage, ProofMessage, SignatureMessage},
    pok_vc::{ProofG1, ProverCommittedG1, ProverCommittingG1},
    signature::{compute_b, Signature},
};
use crate::{
    errors::{Error, VerificationFailure},
    utils::util::bbsplus_utils::{
        hash_to_scalar, nonce_to_bytes, serialize_g1, ByteReader, ScalarExt,
    },
};

/// Prover state after committing to both sigma relations, waiting for the challenge.
///
/// With `A' = A * r1`, `Abar = B * r1 - A' * e`, `d = B * r1 - h0 * r2`, `r3 = 1 / r1`
/// and `s' = s - r2 * r3` the prover shows knowledge of
///
/// 1. `Abar - d = A' * (-e) + h0 * r2`
/// 2. `-(g1 + sum_revealed(h_i * m_i)) = d * (-r3) + h0 * s' + sum_hidden(h_j * m_j)`
#[derive(Clone, Debug)]
pub struct PoKOfSignature {
    a_prime: G1Projective,
    a_bar: G1Projective,
    d: G1Projective,
    h0: G1Projective,
    w: G2Projective,
    message_count: usize,
    pok_vc_1: ProverCommittedG1,
    secrets_1: Vec<Scalar>,
    pok_vc_2: ProverCommittedG1,
    secrets_2: Vec<Scalar>,
    revealed: BTreeMap<usize, SignatureMessage>,
}

impl PoKOfSignature {
    pub fn init<R>(
        signature: &Signature,
        pk: &PublicKey,
        messages: &[ProofMessage],
        rng: &mut R,
    ) -> Result<Self, Error>
    where
        R: RngCore + CryptoRng,
    {
        if messages.len() != pk.message_count() {
            return Err(Error::MessageCountMismatch {
                expected: pk.message_count(),
                actual: messages.len(),
            });
        }
        if messages.len() > u16::MAX as usize {
            return Err(Error::InvalidProofRequest(
                "too many messages for a proof header".to_owned(),
            ));
        }

        let scalars: Vec<SignatureMessage> = messages.iter().map(|m| m.message()).collect();
        signature
            .verify(&scalars, pk)
            .map_err(|f| Error::ProofGenError(format!("signature does not verify: {}", f)))?;

        let r1 = random_nonzero(rng);
        let r2 = Scalar::random(&mut *rng);
        let r3 = Option::<Scalar>::from(r1.invert()).ok_or(Error::DegenerateRandomness)?;

        let b = compute_b(&signature.s, &scalars, pk);
        let b_r1 = b * r1;
        let a_prime = signature.a * r1;
        let a_bar = b_r1 - a_prime * signature.e;
        let d = b_r1 - pk.h0 * r2;
        let s_prime = signature.s - r2 * r3;

        let mut committing_1 = ProverCommittingG1::new();
        committing_1.commit(a_prime, None, rng);
        committing_1.commit(pk.h0, None, rng);
        let secrets_1 = vec![-signature.e, r2];

        let mut committing_2 = ProverCommittingG1::new();
        committing_2.commit(d, None, rng);
        committing_2.commit(pk.h0, None, rng);
        let mut secrets_2 = vec![-r3, s_prime];

        let mut revealed = BTreeMap::new();
        for (i, (msg, h)) in messages.iter().zip(pk.h.iter()).enumerate() {
            match msg {
                ProofMessage::Revealed(m) => {
                    revealed.insert(i, *m);
                }
                ProofMessage::Hidden(hidden) => {
                    committing_2.commit(*h, hidden.blinding(), rng);
                    secrets_2.push(hidden.message().0);
                }
            }
        }

        Ok(Self {
            a_prime,
            a_bar,
            d,
            h0: pk.h0,
            w: pk.w,
            message_count: messages.len(),
            pok_vc_1: committing_1.finish(),
            secrets_1,
            pok_vc_2: committing_2.finish(),
            secrets_2,
            revealed,
        })
    }

    /// Bytes this statement contributes to the Fiat-Shamir challenge.
    pub fn challenge_contribution(&self) -> Vec<u8> {
        challenge_bytes(
            &[
                self.a_prime,
                self.a_bar,
                self.d,
                self.h0,
                self.pok_vc_1.commitment,
                self.pok_vc_2.commitment,
            ],
            &self.revealed,
            &self.w,
        )
    }

    pub fn gen_proof(self, challenge: &Scalar) -> Result<ProofOfKnowledge, Error> {
        let proof_vc_1 = self.pok_vc_1.gen_proof(challenge, &self.secrets_1)?;
        let proof_vc_2 = self.pok_vc_2.gen_proof(challenge, &self.secrets_2)?;
        Ok(ProofOfKnowledge {
            message_count: self.message_count,
            revealed: self.revealed.keys().copied().collect(),
            proof: PoKOfSignatureProof {
                a_prime: self.a_prime,
                a_bar: self.a_bar,
                d: self.d,
                challenge: *challenge,
                proof_vc_1,
                proof_vc_2,
            },
        })
    }
}

/// The responded proof: the randomized signature, the challenge and both response vectors.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PoKOfSignatureProof {
    a_prime: G1Projective,
    a_bar: G1Projective,
    d: G1Projective,
    challenge: Scalar,
    proof_vc_1: ProofG1,
    proof_vc_2: ProofG1,
}

impl PoKOfSignatureProof {
    pub fn challenge(&self) -> Scalar {
        self.challenge
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = serialize_g1(&[self.a_prime, self.a_bar, self.d]);
        bytes.extend_from_slice(&self.challenge.to_bytes_be());
        self.proof_vc_1
            .responses
            .iter()
            .chain(self.proof_vc_2.responses.iter())
            .for_each(|r| bytes.extend_from_slice(&r.to_bytes_be()));
        bytes
    }

    pub fn from_bytes(data: &[u8], hidden_count: usize) -> Result<Self, Error> {
        let expected = 3 * G1Affine::COMPRESSED_BYTES + (5 + hidden_count) * Scalar::BYTES;
        if data.len() != expected {
            return Err(Error::DeserializationError(format!(
                "proof must be {} bytes, got {}",
                expected,
                data.len()
            )));
        }
        let mut reader = ByteReader::new(data);
        let a_prime = reader.g1()?;
        let a_bar = reader.g1()?;
        let d = reader.g1()?;
        let challenge = reader.scalar()?;
        let responses_1 = (0..2).map(|_| reader.scalar()).collect::<Result<Vec<_>, _>>()?;
        let responses_2 = (0..2 + hidden_count)
            .map(|_| reader.scalar())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            a_prime,
            a_bar,
            d,
            challenge,
            proof_vc_1: ProofG1 { responses: responses_1 },
            proof_vc_2: ProofG1 { responses: responses_2 },
        })
    }

    /// Rebuild the prover's commitments from the responses and return this
    /// statement's challenge bytes.
    pub(crate) fn challenge_contribution(
        &self,
        pk: &PublicKey,
        revealed: &BTreeMap<usize, SignatureMessage>,
    ) -> Result<Vec<u8>, Error> {
        let statement_1 = self.a_bar - self.d;
        let t1 = self
            .proof_vc_1
            .commitment(&[self.a_prime, pk.h0], &statement_1, &self.challenge)?;

        let mut bases_2 = vec![self.d, pk.h0];
        let mut disclosed = G1Projective::GENERATOR;
        for (i, h) in pk.h.iter().enumerate() {
            match revealed.get(&i) {
                Some(m) => disclosed += h * m.0,
                None => bases_2.push(*h),
            }
        }
        let t2 = self
            .proof_vc_2
            .commitment(&bases_2, &(-disclosed), &self.challenge)?;

        Ok(challenge_bytes(
            &[self.a_prime, self.a_bar, self.d, pk.h0, t1, t2],
            revealed,
            &pk.w,
        ))
    }

    /// `A' != 1` and `e(A', w) == e(Abar, g2)`
    pub(crate) fn verify_pairing(&self, pk: &PublicKey) -> Result<(), VerificationFailure> {
        if bool::from(self.a_prime.is_identity()) {
            return Err(VerificationFailure::ProofOfKnowledgeFailed);
        }
        let term1 = (&self.a_prime.to_affine(), &G2Prepared::from(pk.w.to_affine()));
        let term2 = (&self.a_bar.to_affine(), &G2Prepared::from(-G2Affine::generator()));
        if multi_miller_loop(&[term1, term2]).final_exponentiation() == Gt::IDENTITY {
            Ok(())
        } else {
            Err(VerificationFailure::ProofOfKnowledgeFailed)
        }
    }

    /// Response for the hidden message at absolute index `msg_idx`.
    pub fn get_resp_for_message(
        &self,
        msg_idx: usize,
        revealed: &BTreeSet<usize>,
    ) -> Result<Scalar, Error> {
        if revealed.contains(&msg_idx) {
            return Err(Error::InvalidProofRequest(format!(
                "message {} is revealed",
                msg_idx
            )));
        }
        let position = msg_idx - revealed.range(..msg_idx).count();
        self.proof_vc_2
            .responses
            .get(2 + position)
            .copied()
            .ok_or_else(|| Error::InvalidProofRequest(format!("no message at index {}", msg_idx)))
    }
}

/// Wire form of a proof: `u16_be(L) || revealed bitvector || proof`.
///
/// The bitvector has one bit per message, most significant bit first.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ProofOfKnowledge {
    message_count: usize,
    revealed: BTreeSet<usize>,
    proof: PoKOfSignatureProof,
}

impl ProofOfKnowledge {
    pub fn message_count(&self) -> usize {
        self.message_count
    }

    pub fn revealed(&self) -> &BTreeSet<usize> {
        &self.revealed
    }

    pub fn proof(&self) -> &PoKOfSignatureProof {
        &self.proof
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = (self.message_count as u16).to_be_bytes().to_vec();
        bytes.extend_from_slice(&revealed_to_bitvector(self.message_count, &self.revealed));
        bytes.extend_from_slice(&self.proof.to_bytes());
        bytes
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        let mut reader = ByteReader::new(data);
        let message_count = reader.u16()? as usize;
        if message_count == 0 {
            return Err(Error::InvalidMessageCount);
        }
        let bitvector = reader.take((message_count + 7) / 8)?;
        let revealed = bitvector_to_revealed(message_count, bitvector)?;
        let proof = PoKOfSignatureProof::from_bytes(
            reader.take(reader.remaining())?,
            message_count - revealed.len(),
        )?;
        Ok(Self {
            message_count,
            revealed,
            proof,
        })
    }

    fn revealed_map(
        &self,
        revealed_messages: &[SignatureMessage],
    ) -> Result<BTreeMap<usize, SignatureMessage>, VerificationFailure> {
        if revealed_messages.len() != self.revealed.len() {
            return Err(VerificationFailure::MessageCountMismatch);
        }
        Ok(self
            .revealed
            .iter()
            .copied()
            .zip(revealed_messages.iter().copied())
            .collect())
    }

    /// Challenge bytes recomputed from the proof, plus the pairing check.
    fn verified_contribution(
        &self,
        pk: &PublicKey,
        revealed_messages: &[SignatureMessage],
    ) -> Result<Vec<u8>, VerificationFailure> {
        if self.message_count != pk.message_count() {
            return Err(VerificationFailure::MessageCountMismatch);
        }
        let revealed = self.revealed_map(revealed_messages)?;
        self.proof.verify_pairing(pk)?;
        self.proof
            .challenge_contribution(pk, &revealed)
            .map_err(|_| VerificationFailure::ProofOfKnowledgeFailed)
    }
}

/// One statement of a multi-signature proof.
#[derive(Clone, Copy, Debug)]
pub struct ProofRequest<'a> {
    pub signature: &'a Signature,
    pub public_key: &'a PublicKey,
    pub messages: &'a [SignatureMessage],
    pub revealed: &'a [usize],
}

/// Prove possession of `signature`, disclosing the messages at `revealed`.
pub fn create_proof<CS, R>(
    signature: &Signature,
    pk: &PublicKey,
    messages: &[SignatureMessage],
    revealed: &[usize],
    nonce: &[u8],
    rng: &mut R,
) -> Result<ProofOfKnowledge, Error>
where
    CS: BbsCiphersuite,
    CS::Expander: for<'a> ExpandMsg<'a>,
    R: RngCore + CryptoRng,
{
    if messages.len() != pk.message_count() {
        return Err(Error::MessageCountMismatch {
            expected: pk.message_count(),
            actual: messages.len(),
        });
    }
    let proof_messages = ProofMessage::from_disclosure(messages, revealed)?;
    create_proof_with_messages::<CS, R>(signature, pk, &proof_messages, nonce, rng)
}

/// Like [`create_proof`], with per message control over the blindings.
pub fn create_proof_with_messages<CS, R>(
    signature: &Signature,
    pk: &PublicKey,
    messages: &[ProofMessage],
    nonce: &[u8],
    rng: &mut R,
) -> Result<ProofOfKnowledge, Error>
where
    CS: BbsCiphersuite,
    CS::Expander: for<'a> ExpandMsg<'a>,
    R: RngCore + CryptoRng,
{
    let pok = PoKOfSignature::init(signature, pk, messages, rng)?;
    let challenge = compute_challenge::<CS>(&[pok.challenge_contribution()], nonce)?;
    pok.gen_proof(&challenge)
}

pub fn verify_proof<CS>(
    pk: &PublicKey,
    proof: &ProofOfKnowledge,
    revealed_messages: &[SignatureMessage],
    nonce: &[u8],
) -> Result<(), Error>
where
    CS: BbsCiphersuite,
    CS::Expander: for<'a> ExpandMsg<'a>,
{
    let contribution = proof.verified_contribution(pk, revealed_messages)?;
    let challenge = compute_challenge::<CS>(&[contribution], nonce)?;

    if challenge != proof.proof.challenge {
        log::debug!("proof rejected: challenge mismatch");
        return Err(VerificationFailure::ProofOfKnowledgeFailed.into());
    }
    log::debug!("proof verified, {} revealed", proof.revealed.len());
    Ok(())
}

/// Prove several signatures under one shared challenge.
///
/// Each class in `equivalences` lists `(statement, message index)` pairs whose hidden
/// messages are shown to be equal.
pub fn create_proof_multi<CS, R>(
    requests: &[ProofRequest<'_>],
    nonce: &[u8],
    equivalences: &[Vec<(usize, usize)>],
    rng: &mut R,
) -> Result<Vec<ProofOfKnowledge>, Error>
where
    CS: BbsCiphersuite,
    CS::Expander: for<'a> ExpandMsg<'a>,
    R: RngCore + CryptoRng,
{
    if requests.is_empty() {
        return Err(Error::InvalidProofRequest("no statements".to_owned()));
    }

    let mut proof_messages = requests
        .iter()
        .map(|req| {
            if req.messages.len() != req.public_key.message_count() {
                return Err(Error::MessageCountMismatch {
                    expected: req.public_key.message_count(),
                    actual: req.messages.len(),
                });
            }
            ProofMessage::from_disclosure(req.messages, req.revealed)
        })
        .collect::<Result<Vec<_>, _>>()?;

    apply_equivalences(&mut proof_messages, equivalences, rng)?;

    let statement_rngs = (0..requests.len())
        .map(|_| StdRng::from_rng(&mut *rng))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| Error::ProofGenError(e.to_string()))?;

    #[cfg(feature = "parallel")]
    let poks = requests
        .par_iter()
        .zip(proof_messages.par_iter())
        .zip(statement_rngs.into_par_iter())
        .map(|((req, messages), mut r)| {
            PoKOfSignature::init(req.signature, req.public_key, messages, &mut r)
        })
        .collect::<Result<Vec<_>, _>>()?;
    #[cfg(not(feature = "parallel"))]
    let poks = requests
        .iter()
        .zip(proof_messages.iter())
        .zip(statement_rngs)
        .map(|((req, messages), mut r)| {
            PoKOfSignature::init(req.signature, req.public_key, messages, &mut r)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let contributions: Vec<Vec<u8>> = poks.iter().map(|p| p.challenge_contribution()).collect();
    let challenge = compute_challenge::<CS>(&contributions, nonce)?;

    poks.into_iter().map(|p| p.gen_proof(&challenge)).collect()
}

/// All proofs must share one challenge, open their statements and agree on every equivalence class.
pub fn verify_proof_multi<CS>(
    public_keys: &[PublicKey],
    proofs: &[ProofOfKnowledge],
    revealed_messages: &[Vec<SignatureMessage>],
    nonce: &[u8],
    equivalences: &[Vec<(usize, usize)>],
) -> Result<(), Error>
where
    CS: BbsCiphersuite,
    CS::Expander: for<'a> ExpandMsg<'a>,
{
    if proofs.is_empty()
        || proofs.len() != public_keys.len()
        || proofs.len() != revealed_messages.len()
    {
        return Err(Error::InvalidProofRequest(
            "proofs, public keys and revealed messages must have the same non-zero length"
                .to_owned(),
        ));
    }

    let challenge = proofs[0].proof.challenge;
    if proofs.iter().any(|p| p.proof.challenge != challenge) {
        return Err(VerificationFailure::ProofOfKnowledgeFailed.into());
    }

    #[cfg(feature = "parallel")]
    let contributions = proofs
        .par_iter()
        .zip(public_keys.par_iter())
        .zip(revealed_messages.par_iter())
        .map(|((proof, pk), revealed)| proof.verified_contribution(pk, revealed))
        .collect::<Result<Vec<_>, _>>()?;
    #[cfg(not(feature = "parallel"))]
    let contributions = proofs
        .iter()
        .zip(public_keys.iter())
        .zip(revealed_messages.iter())
        .map(|((proof, pk), revealed)| proof.verified_contribution(pk, revealed))
        .collect::<Result<Vec<_>, _>>()?;

    if compute_challenge::<CS>(&contributions, nonce)? != challenge {
        log::debug!("multi proof rejected: challenge mismatch");
        return Err(VerificationFailure::ProofOfKnowledgeFailed.into());
    }

    for class in equivalences {
        let mut responses = class.iter().map(|&(statement, idx)| {
            let proof = proofs.get(statement).ok_or_else(|| {
                Error::InvalidProofRequest(format!("no statement {}", statement))
            })?;
            proof.proof.get_resp_for_message(idx, &proof.revealed)
        });
        if let Some(first) = responses.next() {
            let first = first?;
            for resp in responses {
                if resp? != first {
                    log::debug!("multi proof rejected: equivalence class broken");
                    return Err(VerificationFailure::ProofOfKnowledgeFailed.into());
                }
            }
        }
    }

    log::debug!("multi proof verified over {} statements", proofs.len());
    Ok(())
}

fn apply_equivalences<R>(
    proof_messages: &mut [Vec<ProofMessage>],
    equivalences: &[Vec<(usize, usize)>],
    rng: &mut R,
) -> Result<(), Error>
where
    R: RngCore + CryptoRng,
{
    let mut assigned = BTreeSet::new();
    for class in equivalences {
        let blinding = Scalar::random(&mut *rng);
        let mut value: Option<SignatureMessage> = None;

        for &(statement, idx) in class {
            if !assigned.insert((statement, idx)) {
                return Err(Error::InvalidProofRequest(format!(
                    "message ({}, {}) appears in more than one equivalence class",
                    statement, idx
                )));
            }
            let slot = proof_messages
                .get_mut(statement)
                .and_then(|msgs| msgs.get_mut(idx))
                .ok_or_else(|| {
                    Error::InvalidProofRequest(format!("no message ({}, {})", statement, idx))
                })?;
            let message = match slot {
                ProofMessage::Hidden(hidden) => hidden.message(),
                ProofMessage::Revealed(_) => {
                    return Err(Error::InvalidProofRequest(format!(
                        "message ({}, {}) is revealed",
                        statement, idx
                    )))
                }
            };
            if value.map_or(false, |v| v != message) {
                return Err(Error::InvalidProofRequest(
                    "equivalent messages differ".to_owned(),
                ));
            }
            value = Some(message);
            *slot = ProofMessage::Hidden(HiddenMessage::ExternalBlinding(message, blinding));
        }
    }
    Ok(())
}

/// `hash_to_scalar(contribution_1 || .. || contribution_n || nonce_bytes, H2S)`
fn compute_challenge<CS>(contributions: &[Vec<u8>], nonce: &[u8]) -> Result<Scalar, Error>
where
    CS: BbsCiphersuite,
    CS::Expander: for<'a> ExpandMsg<'a>,
{
    let mut bytes = contributions.concat();
    bytes.extend_from_slice(&nonce_to_bytes::<CS>(nonce)?);
    log::trace!("challenge over {} bytes", bytes.len());
    hash_to_scalar::<CS>(&bytes, CS::H2S)
}

/// `points || u64(R) || (u64(i) || m_i)* || w`
fn challenge_bytes(
    points: &[G1Projective],
    revealed: &BTreeMap<usize, SignatureMessage>,
    w: &G2Projective,
) -> Vec<u8> {
    let mut bytes = serialize_g1(points);
    bytes.extend_from_slice(&(revealed.len() as u64).to_be_bytes());
    for (i, m) in revealed {
        bytes.extend_from_slice(&(*i as u64).to_be_bytes());
        bytes.extend_from_slice(&m.to_bytes());
    }
    bytes.extend_from_slice(&w.to_affine().to_compressed());
    bytes
}

fn revealed_to_bitvector(total: usize, revealed: &BTreeSet<usize>) -> Vec<u8> {
    let mut bytes = vec![0u8; (total + 7) / 8];
    for &i in revealed {
        if let Some(byte) = bytes.get_mut(i / 8) {
            *byte |= 0x80 >> (i % 8);
        }
    }
    bytes
}

fn bitvector_to_revealed(total: usize, bits: &[u8]) -> Result<BTreeSet<usize>, Error> {
    let mut revealed = BTreeSet::new();
    for (byte_idx, byte) in bits.iter().enumerate() {
        for bit in 0..8 {
            if byte & (0x80 >> bit) == 0 {
                continue;
            }
            let i = byte_idx * 8 + bit;
            if i >= total {
                return Err(Error::DeserializationError(
                    "revealed bit set past the message count".to_owned(),
                ));
            }
            revealed.insert(i);
        }
    }
    Ok(revealed)
}

fn random_nonzero<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    loop {
        let r = Scalar::random(&mut *rng);
        if !bool::from(r.is_zero()) {
            return r;
        }
    }
}
