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


use std::collections::BTreeMap;

use bls12_381_plus::{G1Affine, G1Projective, Scalar};
use elliptic_curve::{group::Curve, hash2curve::ExpandMsg};
use ff::Field;
use rand::{CryptoRng, RngCore};

use super::{
    ciphersuites::BbsCiphersuite,
    commitment::{BlindSignatureContext, BlindingFactor},
    keys::PublicKey,
    message::SignatureMessage,
    signature::{core_sign, Signature, MAX_DEGENERATE_RETRIES},
};
use crate::{
    errors::Error,
    keys::pair::KeyPair,
    schemes::algorithms::Bbs,
    utils::util::bbsplus_utils::parse_g1_projective,
};

/// Signature over a commitment: `(A, e, s'')` and the commitment it was issued for.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct BlindSignature {
    a: G1Projective,
    e: Scalar,
    s: Scalar,
    commitment: G1Projective,
}

impl BlindSignature {
    pub const BYTES: usize = Signature::BYTES + G1Affine::COMPRESSED_BYTES;

    /// Sign the holder's commitment together with the `known` messages.
    ///
    /// The commitment proof is checked first, then `known` and the committed indices must
    /// cover every message slot of `pk` exactly once.
    pub fn new<CS, R>(
        ctx: &BlindSignatureContext,
        known: &BTreeMap<usize, SignatureMessage>,
        keypair: &KeyPair<Bbs>,
        nonce: &[u8],
        rng: &mut R,
    ) -> Result<Self, Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
        R: RngCore + CryptoRng,
    {
        let pk = keypair.public_key();
        if !ctx.verify::<CS>(pk, nonce)? {
            return Err(Error::InvalidCommitmentProof);
        }
        check_partition(pk, known, ctx.hidden())?;

        let (points, scalars): (Vec<G1Projective>, Vec<Scalar>) =
            known.iter().map(|(&i, m)| (pk.h[i], m.0)).unzip();
        let partial = G1Projective::GENERATOR
            + ctx.commitment()
            + G1Projective::sum_of_products(&points, &scalars);

        for attempt in 0..=MAX_DEGENERATE_RETRIES {
            let e = Scalar::random(&mut *rng);
            let s = Scalar::random(&mut *rng);
            let b = partial + pk.h0 * s;

            match core_sign(keypair.private_key(), &b, &e) {
                Some(a) => {
                    return Ok(Self {
                        a,
                        e,
                        s,
                        commitment: ctx.commitment(),
                    })
                }
                None => log::warn!(
                    "degenerate blind signature randomness, attempt {}",
                    attempt + 1
                ),
            }
        }
        Err(Error::DegenerateRandomness)
    }

    pub fn commitment(&self) -> G1Projective {
        self.commitment
    }

    /// `s = s'' + s'`.
    ///
    /// The factor's opening `h0 * s' + sum(h_i * m_i)` must equal the commitment that was
    /// signed, so a factor from another request or with a damaged `s'` is refused.
    pub fn to_unblinded(self, factor: &BlindingFactor) -> Result<Signature, Error> {
        if factor.commitment() != self.commitment {
            return Err(Error::UnblindingMismatch);
        }
        Ok(Signature {
            a: self.a,
            e: self.e,
            s: self.s + factor.s_prime(),
        })
    }

    /// Unblind and check the result against every message.
    pub fn complete_signature(
        self,
        pk: &PublicKey,
        messages: &[SignatureMessage],
        factor: &BlindingFactor,
    ) -> Result<Signature, Error> {
        let signature = self.to_unblinded(factor)?;
        signature
            .verify(messages, pk)
            .map_err(|_| Error::UnblindingMismatch)?;
        Ok(signature)
    }

    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        let mut out = [0u8; Self::BYTES];
        let signature = Signature {
            a: self.a,
            e: self.e,
            s: self.s,
        };
        out[..Signature::BYTES].copy_from_slice(&signature.to_bytes());
        out[Signature::BYTES..].copy_from_slice(&self.commitment.to_affine().to_compressed());
        out
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, Error> {
        if data.len() != Self::BYTES {
            return Err(Error::DeserializationError(format!(
                "blind signature must be {} bytes, got {}",
                Self::BYTES,
                data.len()
            )));
        }
        let signature = Signature::from_bytes(&data[..Signature::BYTES])?;
        Ok(Self {
            a: signature.a,
            e: signature.e,
            s: signature.s,
            commitment: parse_g1_projective(&data[Signature::BYTES..])?,
        })
    }
}

fn check_partition(
    pk: &PublicKey,
    known: &BTreeMap<usize, SignatureMessage>,
    hidden: &[usize],
) -> Result<(), Error> {
    let mut covered = vec![false; pk.message_count()];
    for &i in known.keys().chain(hidden.iter()) {
        match covered.get_mut(i) {
            Some(slot) if !*slot => *slot = true,
            _ => return Err(Error::InvalidDisclosureIndex(i)),
        }
    }
    match covered.iter().position(|c| !c) {
        Some(missing) => Err(Error::InvalidDisclosureIndex(missing)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        bbsplus::ciphersuites::Bls12381Sha256, schemes::algorithms::BlsG2,
    };
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    fn msg(s: &str) -> SignatureMessage {
        SignatureMessage::hash::<Bls12381Sha256>(s.as_bytes()).unwrap()
    }

    fn keypair(rng: &mut ChaCha20Rng) -> KeyPair<Bbs> {
        KeyPair::<BlsG2>::generate(None, rng)
            .unwrap()
            .to_bbs::<Bls12381Sha256>(3)
            .unwrap()
    }

    #[test]
    fn blind_sign_then_unblind_verifies() {
        let mut rng = ChaCha20Rng::from_seed([41u8; 32]);
        let kp = keypair(&mut rng);
        let mut hidden = BTreeMap::new();
        hidden.insert(1usize, msg("secret"));
        let mut known = BTreeMap::new();
        known.insert(0usize, msg("name"));
        known.insert(2usize, msg("issuer"));

        let (ctx, factor) =
            BlindSignatureContext::new::<Bls12381Sha256, _>(kp.public_key(), &hidden, b"n", &mut rng)
                .unwrap();
        let blind = BlindSignature::new::<Bls12381Sha256, _>(&ctx, &known, &kp, b"n", &mut rng).unwrap();
        assert_eq!(BlindSignature::from_bytes(&blind.to_bytes()).unwrap(), blind);

        let all = [msg("name"), msg("secret"), msg("issuer")];
        let signature = blind.complete_signature(kp.public_key(), &all, &factor).unwrap();
        assert!(signature.verify(&all, kp.public_key()).is_ok());
    }

    #[test]
    fn overlapping_or_missing_indices_fail() {
        let mut rng = ChaCha20Rng::from_seed([42u8; 32]);
        let kp = keypair(&mut rng);
        let mut hidden = BTreeMap::new();
        hidden.insert(1usize, msg("secret"));
        let (ctx, _) =
            BlindSignatureContext::new::<Bls12381Sha256, _>(kp.public_key(), &hidden, b"", &mut rng)
                .unwrap();

        let mut overlap = BTreeMap::new();
        overlap.insert(0usize, msg("a"));
        overlap.insert(1usize, msg("b"));
        overlap.insert(2usize, msg("c"));
        assert_eq!(
            BlindSignature::new::<Bls12381Sha256, _>(&ctx, &overlap, &kp, b"", &mut rng),
            Err(Error::InvalidDisclosureIndex(1))
        );

        let mut missing = BTreeMap::new();
        missing.insert(0usize, msg("a"));
        assert_eq!(
            BlindSignature::new::<Bls12381Sha256, _>(&ctx, &missing, &kp, b"", &mut rng),
            Err(Error::InvalidDisclosureIndex(2))
        );
    }

    #[test]
    fn wrong_nonce_is_an_invalid_commitment() {
        let mut rng = ChaCha20Rng::from_seed([43u8; 32]);
        let kp = keypair(&mut rng);
        let mut hidden = BTreeMap::new();
        hidden.insert(0usize, msg("secret"));
        let (ctx, _) =
            BlindSignatureContext::new::<Bls12381Sha256, _>(kp.public_key(), &hidden, b"a", &mut rng)
                .unwrap();
        let mut known = BTreeMap::new();
        known.insert(1usize, msg("x"));
        known.insert(2usize, msg("y"));
        assert_eq!(
            BlindSignature::new::<Bls12381Sha256, _>(&ctx, &known, &kp, b"b", &mut rng),
            Err(Error::InvalidCommitmentProof)
        );
    }

    #[test]
    fn foreign_blinding_factor_is_a_mismatch() {
        let mut rng = ChaCha20Rng::from_seed([44u8; 32]);
        let kp = keypair(&mut rng);
        let mut hidden = BTreeMap::new();
        hidden.insert(0usize, msg("secret"));
        let mut known = BTreeMap::new();
        known.insert(1usize, msg("x"));
        known.insert(2usize, msg("y"));

        let (ctx, _) =
            BlindSignatureContext::new::<Bls12381Sha256, _>(kp.public_key(), &hidden, b"", &mut rng)
                .unwrap();
        let (_, other_factor) =
            BlindSignatureContext::new::<Bls12381Sha256, _>(kp.public_key(), &hidden, b"", &mut rng)
                .unwrap();
        let blind = BlindSignature::new::<Bls12381Sha256, _>(&ctx, &known, &kp, b"", &mut rng).unwrap();
        assert_eq!(blind.to_unblinded(&other_factor), Err(Error::UnblindingMismatch));
    }

    #[test]
    fn damaged_blinding_secret_is_a_mismatch() {
        let mut rng = ChaCha20Rng::from_seed([45u8; 32]);
        let kp = keypair(&mut rng);
        let mut hidden = BTreeMap::new();
        hidden.insert(2usize, msg("secret"));
        let mut known = BTreeMap::new();
        known.insert(0usize, msg("x"));
        known.insert(1usize, msg("y"));

        let (ctx, factor) =
            BlindSignatureContext::new::<Bls12381Sha256, _>(kp.public_key(), &hidden, b"", &mut rng)
                .unwrap();
        let blind = BlindSignature::new::<Bls12381Sha256, _>(&ctx, &known, &kp, b"", &mut rng).unwrap();

        let mut bytes = factor.to_bytes();
        bytes[31] ^= 0x01;
        let damaged = BlindingFactor::from_bytes(&bytes).unwrap();
        assert_eq!(blind.clone().to_unblinded(&damaged), Err(Error::UnblindingMismatch));

        let all = [msg("x"), msg("y"), msg("secret")];
        let signature = blind.to_unblinded(&factor).unwrap();
        assert!(signature.verify(&all, kp.public_key()).is_ok());
    }
}
