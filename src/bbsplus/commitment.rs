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


use std::{collections::BTreeMap, fmt};

use bls12_381_plus::{G1Affine, G1Projective, G2Projective, Scalar};
use elliptic_curve::{group::Curve, hash2curve::ExpandMsg};
use ff::Field;
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use super::{
    ciphersuites::BbsCiphersuite,
    keys::PublicKey,
    message::SignatureMessage,
    pok_vc::{ProofG1, ProverCommittingG1},
};
use crate::{
    errors::Error,
    utils::util::bbsplus_utils::{
        hash_to_scalar, nonce_to_bytes, serialize_g1, ByteReader, ScalarExt,
    },
};

/// What the holder sends to the signer: `C = h0 * s' + sum(h_i * m_i)` over the hidden
/// messages, and a proof of knowledge of its opening bound to the signer's nonce.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BlindSignatureContext {
    commitment: G1Projective,
    hidden: Vec<usize>,
    challenge: Scalar,
    proof_of_hidden_messages: ProofG1,
}

/// Holder secret `s'` that turns the blind signature into an ordinary one.
///
/// Keeps `h0` and the hidden part `sum(h_i * m_i)` next to `s'`, so the opening of the
/// commitment can be recomputed at unblinding time.
#[derive(Clone, PartialEq, Eq)]
pub struct BlindingFactor {
    s_prime: Scalar,
    h0: G1Projective,
    hidden_part: G1Projective,
}

impl BlindingFactor {
    pub const BYTES: usize = Scalar::BYTES + 2 * G1Affine::COMPRESSED_BYTES;

    pub(crate) fn s_prime(&self) -> Scalar {
        self.s_prime
    }

    /// `C = h0 * s' + sum(h_i * m_i)`, recomputed from the opening.
    pub fn commitment(&self) -> G1Projective {
        self.h0 * self.s_prime + self.hidden_part
    }

    /// `s' || h0 || sum(h_i * m_i)`
    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        let mut out = [0u8; Self::BYTES];
        out[..32].copy_from_slice(&self.s_prime.to_bytes_be());
        out[32..80].copy_from_slice(&self.h0.to_affine().to_compressed());
        out[80..].copy_from_slice(&self.hidden_part.to_affine().to_compressed());
        out
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        if data.len() != Self::BYTES {
            return Err(Error::DeserializationError(format!(
                "blinding factor must be {} bytes, got {}",
                Self::BYTES,
                data.len()
            )));
        }
        let mut reader = ByteReader::new(data);
        Ok(Self {
            s_prime: reader.scalar()?,
            h0: reader.g1()?,
            hidden_part: reader.g1()?,
        })
    }
}

impl fmt::Debug for BlindingFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlindingFactor")
            .field("s_prime", &"****")
            .field("h0", &self.h0)
            .field("hidden_part", &self.hidden_part)
            .finish()
    }
}

impl Zeroize for BlindingFactor {
    fn zeroize(&mut self) {
        self.s_prime.zeroize();
    }
}

impl Drop for BlindingFactor {
    fn drop(&mut self) {
        self.zeroize();
    }
}

impl BlindSignatureContext {
    /// Commit to `hidden` (index to message) under `pk` and prove the opening.
    pub fn new<CS, R>(
        pk: &PublicKey,
        hidden: &BTreeMap<usize, SignatureMessage>,
        nonce: &[u8],
        rng: &mut R,
    ) -> Result<(Self, BlindingFactor), Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
        R: RngCore + CryptoRng,
    {
        if hidden.is_empty() {
            return Err(Error::InvalidProofRequest(
                "no hidden messages to commit to".to_owned(),
            ));
        }
        if let Some(&i) = hidden.keys().find(|&&i| i >= pk.message_count()) {
            return Err(Error::InvalidDisclosureIndex(i));
        }

        let s_prime = Scalar::random(&mut *rng);
        let mut committing = ProverCommittingG1::new();
        committing.commit(pk.h0, None, rng);
        let mut secrets = vec![s_prime];
        let mut hidden_part = G1Projective::IDENTITY;

        for (&i, m) in hidden {
            committing.commit(pk.h[i], None, rng);
            secrets.push(m.0);
            hidden_part += pk.h[i] * m.0;
        }
        let commitment = pk.h0 * s_prime + hidden_part;

        let committed = committing.finish();
        let indices: Vec<usize> = hidden.keys().copied().collect();
        let challenge = blind_challenge::<CS>(
            &committed.commitment,
            &commitment,
            &bases(pk, &indices),
            &indices,
            &pk.w,
            nonce,
        )?;
        let proof_of_hidden_messages = committed.gen_proof(&challenge, &secrets)?;

        Ok((
            Self {
                commitment,
                hidden: indices,
                challenge,
                proof_of_hidden_messages,
            },
            BlindingFactor {
                s_prime,
                h0: pk.h0,
                hidden_part,
            },
        ))
    }

    pub fn commitment(&self) -> G1Projective {
        self.commitment
    }

    pub fn hidden(&self) -> &[usize] {
        &self.hidden
    }

    /// Check the proof of opening against `pk` and `nonce`.
    pub fn verify<CS>(&self, pk: &PublicKey, nonce: &[u8]) -> Result<bool, Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
    {
        if bool::from(self.commitment.is_identity()) {
            return Ok(false);
        }
        if self.hidden.is_empty()
            || self.hidden.iter().any(|&i| i >= pk.message_count())
            || self.hidden.windows(2).any(|w| w[0] >= w[1])
        {
            return Ok(false);
        }
        if self.proof_of_hidden_messages.responses.len() != self.hidden.len() + 1 {
            return Ok(false);
        }

        let bases = bases(pk, &self.hidden);
        let t = self
            .proof_of_hidden_messages
            .commitment(&bases, &self.commitment, &self.challenge)?;
        let challenge =
            blind_challenge::<CS>(&t, &self.commitment, &bases, &self.hidden, &pk.w, nonce)?;

        let verified = challenge == self.challenge;
        log::debug!("blind signature request verified: {}", verified);
        Ok(verified)
    }

    /// `C || challenge || u32(n) || u32(index)* || responses`
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = self.commitment.to_affine().to_compressed().to_vec();
        out.extend_from_slice(&self.challenge.to_bytes_be());
        out.extend_from_slice(&(self.hidden.len() as u32).to_be_bytes());
        for &i in &self.hidden {
            out.extend_from_slice(&(i as u32).to_be_bytes());
        }
        for r in &self.proof_of_hidden_messages.responses {
            out.extend_from_slice(&r.to_bytes_be());
        }
        out
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        let mut reader = ByteReader::new(data);
        let commitment = reader.g1()?;
        let challenge = reader.scalar()?;
        let count = reader.take(4)?;
        let count = u32::from_be_bytes([count[0], count[1], count[2], count[3]]) as usize;

        let expected = count
            .checked_mul(4 + Scalar::BYTES)
            .and_then(|n| n.checked_add(Scalar::BYTES));
        if expected != Some(reader.remaining()) {
            return Err(Error::DeserializationError(
                "blind signature context length does not match its index count".to_owned(),
            ));
        }

        let hidden = (0..count)
            .map(|_| {
                reader
                    .take(4)
                    .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]) as usize)
            })
            .collect::<Result<Vec<_>, _>>()?;
        let responses = (0..count + 1)
            .map(|_| reader.scalar())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            commitment,
            hidden,
            challenge,
            proof_of_hidden_messages: ProofG1 { responses },
        })
    }
}

fn bases(pk: &PublicKey, indices: &[usize]) -> Vec<G1Projective> {
    std::iter::once(pk.h0)
        .chain(indices.iter().map(|&i| pk.h[i]))
        .collect()
}

/// `hash_to_scalar(T || C || h0 || h_i* || u64(n) || u64(i)* || w || nonce_bytes, BLIND_DST)`
fn blind_challenge<CS>(
    t: &G1Projective,
    commitment: &G1Projective,
    bases: &[G1Projective],
    indices: &[usize],
    w: &G2Projective,
    nonce: &[u8],
) -> Result<Scalar, Error>
where
    CS: BbsCiphersuite,
    CS::Expander: for<'a> ExpandMsg<'a>,
{
    let mut bytes = serialize_g1(&[*t, *commitment]);
    bytes.extend_from_slice(&serialize_g1(bases));
    bytes.extend_from_slice(&(indices.len() as u64).to_be_bytes());
    for &i in indices {
        bytes.extend_from_slice(&(i as u64).to_be_bytes());
    }
    bytes.extend_from_slice(&w.to_affine().to_compressed());
    bytes.extend_from_slice(&nonce_to_bytes::<CS>(nonce)?);
    hash_to_scalar::<CS>(&bytes, CS::BLIND_DST)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bbsplus::ciphersuites::Bls12381Sha256, keys::bls_key::DeterministicPublicKey,
    };
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn setup() -> (PublicKey, BTreeMap<usize, SignatureMessage>, ChaCha20Rng) {
        let pk = DeterministicPublicKey(G2Projective::GENERATOR * Scalar::from(21u64))
            .to_public_key::<Bls12381Sha256>(4)
            .unwrap();
        let hidden = [(0usize, "link secret"), (2, "dob")]
            .iter()
            .map(|(i, m)| (*i, SignatureMessage::hash::<Bls12381Sha256>(m.as_bytes()).unwrap()))
            .collect();
        (pk, hidden, ChaCha20Rng::from_seed([31u8; 32]))
    }

    #[test]
    fn request_verifies_only_under_its_nonce() {
        let (pk, hidden, mut rng) = setup();
        let (ctx, factor) =
            BlindSignatureContext::new::<Bls12381Sha256, _>(&pk, &hidden, b"nonce", &mut rng).unwrap();
        assert_eq!(factor.commitment(), ctx.commitment());
        assert!(ctx.verify::<Bls12381Sha256>(&pk, b"nonce").unwrap());
        assert!(!ctx.verify::<Bls12381Sha256>(&pk, b"other").unwrap());

        let decoded = BlindSignatureContext::from_bytes(&ctx.to_bytes()).unwrap();
        assert_eq!(decoded, ctx);
    }

    #[test]
    fn tampered_commitment_is_rejected() {
        let (pk, hidden, mut rng) = setup();
        let (mut ctx, _) =
            BlindSignatureContext::new::<Bls12381Sha256, _>(&pk, &hidden, b"", &mut rng).unwrap();
        ctx.commitment += G1Projective::GENERATOR;
        assert!(!ctx.verify::<Bls12381Sha256>(&pk, b"").unwrap());
        ctx.commitment = G1Projective::IDENTITY;
        assert!(!ctx.verify::<Bls12381Sha256>(&pk, b"").unwrap());
    }

    #[test]
    fn bad_requests_fail() {
        let (pk, _, mut rng) = setup();
        let empty = BTreeMap::new();
        assert!(matches!(
            BlindSignatureContext::new::<Bls12381Sha256, _>(&pk, &empty, b"", &mut rng),
            Err(Error::InvalidProofRequest(_))
        ));
        let mut out_of_range = BTreeMap::new();
        out_of_range.insert(4usize, SignatureMessage::from_scalar(Scalar::ONE));
        assert!(matches!(
            BlindSignatureContext::new::<Bls12381Sha256, _>(&pk, &out_of_range, b"", &mut rng),
            Err(Error::InvalidDisclosureIndex(4))
        ));
    }

    #[test]
    fn blinding_factor_debug_hides_the_secret() {
        let (pk, hidden, mut rng) = setup();
        let (_, factor) =
            BlindSignatureContext::new::<Bls12381Sha256, _>(&pk, &hidden, b"", &mut rng).unwrap();
        assert!(format!("{:?}", factor).contains("****"));
        assert_eq!(BlindingFactor::from_bytes(&factor.to_bytes()).unwrap(), factor);
        assert!(BlindingFactor::from_bytes(&factor.to_bytes()[..80]).is_err());
    }

    #[test]
    fn zeroized_factor_no_longer_opens_the_commitment() {
        let (pk, hidden, mut rng) = setup();
        let (ctx, mut factor) =
            BlindSignatureContext::new::<Bls12381Sha256, _>(&pk, &hidden, b"", &mut rng).unwrap();
        assert_eq!(factor.commitment(), ctx.commitment());

        factor.zeroize();
        assert_eq!(factor.s_prime(), Scalar::ZERO);
        assert_ne!(factor.commitment(), ctx.commitment());
    }
}
