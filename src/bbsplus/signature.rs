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


use bls12_381_plus::{
    multi_miller_loop, G1Affine, G1Projective, G2Affine, G2Prepared, G2Projective, Gt, Scalar,
};
use elliptic_curve::{group::Curve, hash2curve::ExpandMsg};
use ff::Field;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use super::{ciphersuites::BbsCiphersuite, keys::PublicKey, message::SignatureMessage};
use crate::{
    errors::{Error, VerificationFailure},
    keys::{bls_key::SecretKey, pair::KeyPair},
    schemes::algorithms::{Bbs, BlsG2},
    utils::util::bbsplus_utils::{parse_g1_projective, ScalarExt},
};

/// Redraws allowed when `x + e` is zero or `A` lands on the identity
pub(crate) const MAX_DEGENERATE_RETRIES: usize = 3;

/// BBS+ signature `(A, e, s)` with `A = (g1 + h0 * s + sum(h_i * m_i)) * 1 / (x + e)`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct Signature {
    pub(crate) a: G1Projective,
    pub(crate) e: Scalar,
    pub(crate) s: Scalar,
}

impl Signature {
    pub const BYTES: usize = G1Affine::COMPRESSED_BYTES + 2 * Scalar::BYTES;

    pub fn a(&self) -> G1Projective {
        self.a
    }

    pub fn e(&self) -> Scalar {
        self.e
    }

    pub fn s(&self) -> Scalar {
        self.s
    }

    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        let mut bytes = [0u8; Self::BYTES];
        bytes[0..48].copy_from_slice(&self.a.to_affine().to_compressed());
        bytes[48..80].copy_from_slice(&self.e.to_bytes_be());
        bytes[80..112].copy_from_slice(&self.s.to_bytes_be());
        bytes
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        if data.len() != Self::BYTES {
            return Err(Error::DeserializationError(format!(
                "signature must be {} bytes, got {}",
                Self::BYTES,
                data.len()
            )));
        }
        let a = parse_g1_projective(&data[0..48])?;
        let e = Scalar::from_bytes_be(&data[48..80])?;
        let s = Scalar::from_bytes_be(&data[80..112])?;
        Ok(Self { a, e, s })
    }

    /// Sign already mapped messages. Their count must match the key.
    pub fn new<R>(
        messages: &[SignatureMessage],
        sk: &SecretKey,
        pk: &PublicKey,
        rng: &mut R,
    ) -> Result<Self, Error>
    where
        R: RngCore + CryptoRng,
    {
        check_message_count(messages.len(), pk)?;

        for attempt in 0..=MAX_DEGENERATE_RETRIES {
            let e = Scalar::random(&mut *rng);
            let s = Scalar::random(&mut *rng);
            let b = compute_b(&s, messages, pk);

            match core_sign(sk, &b, &e) {
                Some(a) => return Ok(Self { a, e, s }),
                None => log::warn!("degenerate signature randomness, attempt {}", attempt + 1),
            }
        }
        Err(Error::DegenerateRandomness)
    }

    /// Map each octet string with the suite's `MAP_MSG_DST`, then sign.
    pub fn sign<CS, R, M>(
        messages: &[M],
        keypair: &KeyPair<Bbs>,
        rng: &mut R,
    ) -> Result<Self, Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
        R: RngCore + CryptoRng,
        M: AsRef<[u8]>,
    {
        let messages = SignatureMessage::messages_to_scalar::<CS, M>(messages)?;
        Self::new(&messages, keypair.private_key(), keypair.public_key(), rng)
    }

    /// Sign with a BLS key; the generators are derived from `w` and the message count.
    pub fn bls_sign<CS, R, M>(
        messages: &[M],
        keypair: &KeyPair<BlsG2>,
        rng: &mut R,
    ) -> Result<Self, Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
        R: RngCore + CryptoRng,
        M: AsRef<[u8]>,
    {
        let bbs_keypair = keypair.to_bbs::<CS>(messages.len())?;
        Self::sign::<CS, R, M>(messages, &bbs_keypair, rng)
    }

    /// Pairing check `e(A, w + g2 * e) * e(B, -g2) == 1`.
    pub fn verify(
        &self,
        messages: &[SignatureMessage],
        pk: &PublicKey,
    ) -> Result<(), VerificationFailure> {
        if messages.len() != pk.message_count() {
            return Err(VerificationFailure::MessageCountMismatch);
        }
        if bool::from(self.a.is_identity()) {
            return Err(VerificationFailure::MalformedSignature);
        }

        let b = compute_b(&self.s, messages, pk);
        let a2 = pk.w + G2Projective::GENERATOR * self.e;

        let term1 = (&self.a.to_affine(), &G2Prepared::from(a2.to_affine()));
        let term2 = (&b.to_affine(), &G2Prepared::from(-G2Affine::generator()));

        let pairing = multi_miller_loop(&[term1, term2]).final_exponentiation();

        if pairing == Gt::IDENTITY {
            Ok(())
        } else {
            Err(VerificationFailure::PairingCheckFailed)
        }
    }
}

pub(crate) fn check_message_count(actual: usize, pk: &PublicKey) -> Result<(), Error> {
    if actual != pk.message_count() {
        return Err(Error::MessageCountMismatch {
            expected: pk.message_count(),
            actual,
        });
    }
    Ok(())
}

/// `B = g1 + h0 * s + sum(h_i * m_i)`
pub(crate) fn compute_b(s: &Scalar, messages: &[SignatureMessage], pk: &PublicKey) -> G1Projective {
    let mut points = Vec::with_capacity(messages.len() + 2);
    let mut scalars = Vec::with_capacity(messages.len() + 2);
    points.extend_from_slice(&[G1Projective::GENERATOR, pk.h0]);
    scalars.extend_from_slice(&[Scalar::ONE, *s]);
    for (m, h) in messages.iter().zip(pk.h.iter()) {
        points.push(*h);
        scalars.push(m.0);
    }
    G1Projective::sum_of_products(&points, &scalars)
}

/// `A = B * 1 / (x + e)`, `None` when the randomness is degenerate.
pub(crate) fn core_sign(sk: &SecretKey, b: &G1Projective, e: &Scalar) -> Option<G1Projective> {
    let exp = Option::<Scalar>::from((sk.0 + e).invert())?;
    let a = b * exp;
    if bool::from(a.is_identity()) {
        None
    } else {
        Some(a)
    }
}
