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


use std::fmt;

use bls12_381_plus::{G1Affine, G1Projective, G2Affine, G2Projective, Scalar};
use elliptic_curve::{group::Curve, hash2curve::ExpandMsg};
use ff::Field;
use hkdf::Hkdf;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::{
    bbsplus::{ciphersuites::BbsCiphersuite, keys::PublicKey},
    errors::Error,
    keys::pair::KeyPair,
    schemes::algorithms::{Bbs, BlsG1, BlsG2},
    utils::util::bbsplus_utils::{parse_g1_projective, parse_g2_projective, ScalarExt},
};

/// Minimum length of a caller supplied seed
pub const SEED_MIN_LENGTH: usize = 32;

const KEYGEN_SALT: &[u8] = b"BLS-SIG-KEYGEN-SALT-";
const KEYGEN_OKM_LEN: usize = 48;

/// BLS secret scalar `x`, shared by the BLS and BBS+ key pairs.
///
/// Never printed by `Debug` and wiped when dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct SecretKey(pub(crate) Scalar);

impl SecretKey {
    pub const BYTES: usize = Scalar::BYTES;

    /// Big-endian encoding of the secret scalar
    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        self.0.to_bytes_be()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let s = Scalar::from_bytes_be(bytes).map_err(|_| Error::KeyDeserializationError)?;
        if bool::from(s.is_zero()) {
            return Err(Error::KeyDeserializationError);
        }
        Ok(Self(s))
    }

    pub fn public_key(&self) -> DeterministicPublicKey {
        DeterministicPublicKey(G2Projective::GENERATOR * self.0)
    }

    pub fn g1_public_key(&self) -> G1PublicKey {
        G1PublicKey(G1Projective::GENERATOR * self.0)
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(****)")
    }
}

impl Zeroize for SecretKey {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

impl Drop for SecretKey {
    fn drop(&mut self) {
        self.zeroize();
    }
}

/// BLS public key `w = x * g2`, the root every BBS+ generator is derived from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DeterministicPublicKey(pub(crate) G2Projective);

impl DeterministicPublicKey {
    pub const BYTES: usize = G2Affine::COMPRESSED_BYTES;

    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        self.0.to_affine().to_compressed()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let w = parse_g2_projective(bytes).map_err(|_| Error::KeyDeserializationError)?;
        if bool::from(w.is_identity()) {
            return Err(Error::MalformedPublicKey);
        }
        Ok(Self(w))
    }

    pub fn encode(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Expand `w` into a BBS+ public key for `message_count` messages.
    pub fn to_public_key<CS>(&self, message_count: usize) -> Result<PublicKey, Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
    {
        PublicKey::derive::<CS>(self.0, message_count)
    }
}

/// BLS public key `x * g1`
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct G1PublicKey(pub(crate) G1Projective);

impl G1PublicKey {
    pub const BYTES: usize = G1Affine::COMPRESSED_BYTES;

    pub fn to_bytes(&self) -> [u8; Self::BYTES] {
        self.0.to_affine().to_compressed()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let p = parse_g1_projective(bytes).map_err(|_| Error::KeyDeserializationError)?;
        if bool::from(p.is_identity()) {
            return Err(Error::MalformedPublicKey);
        }
        Ok(Self(p))
    }

    pub fn encode(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl KeyPair<BlsG2> {
    /// Generate a key pair from `seed`, or from fresh randomness when no seed is given.
    ///
    /// The same seed always yields the same key pair.
    pub fn generate<R>(seed: Option<&[u8]>, rng: &mut R) -> Result<Self, Error>
    where
        R: RngCore + CryptoRng,
    {
        let sk = key_gen(seed, rng)?;
        let pk = sk.public_key();
        Ok(Self { public: pk, private: sk })
    }

    /// Attach the generators for `message_count` messages to this key.
    pub fn to_bbs<CS>(&self, message_count: usize) -> Result<KeyPair<Bbs>, Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
    {
        let public = self.public.to_public_key::<CS>(message_count)?;
        Ok(KeyPair { public, private: self.private.clone() })
    }
}

impl KeyPair<BlsG1> {
    pub fn generate<R>(seed: Option<&[u8]>, rng: &mut R) -> Result<Self, Error>
    where
        R: RngCore + CryptoRng,
    {
        let sk = key_gen(seed, rng)?;
        let pk = sk.g1_public_key();
        Ok(Self { public: pk, private: sk })
    }
}

/// BLS KeyGen: HKDF-SHA256 over `seed || 0x00`, re-salting until the scalar is not zero.
pub(crate) fn key_gen<R>(seed: Option<&[u8]>, rng: &mut R) -> Result<SecretKey, Error>
where
    R: RngCore + CryptoRng,
{
    let mut ikm = match seed {
        Some(seed) if seed.len() < SEED_MIN_LENGTH => {
            return Err(Error::InvalidSeedLength(SEED_MIN_LENGTH))
        }
        Some(seed) => seed.to_vec(),
        None => {
            let mut buf = vec![0u8; SEED_MIN_LENGTH];
            rng.fill_bytes(&mut buf);
            buf
        }
    };
    ikm.push(0u8);

    let info = (KEYGEN_OKM_LEN as u16).to_be_bytes();
    let mut salt = KEYGEN_SALT.to_vec();
    let mut okm = [0u8; KEYGEN_OKM_LEN];

    let sk = loop {
        let hk = Hkdf::<Sha256>::new(Some(salt.as_slice()), &ikm);
        hk.expand(&info, &mut okm)
            .map_err(|_| Error::KeyDeserializationError)?;
        let candidate = Scalar::from_okm(&okm);
        if !bool::from(candidate.is_zero()) {
            break candidate;
        }
        salt = Sha256::digest(&salt).to_vec();
    };

    okm.zeroize();
    ikm.zeroize();
    Ok(SecretKey(sk))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn seeded_keygen_is_deterministic() {
        let seed: Vec<u8> = (1..=32).collect();
        let mut rng = ChaCha20Rng::from_seed([0u8; 32]);
        let a = KeyPair::<BlsG2>::generate(Some(&seed), &mut rng).unwrap();
        let b = KeyPair::<BlsG2>::generate(Some(&seed), &mut rng).unwrap();
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.private_key().to_bytes(), b.private_key().to_bytes());

        assert_eq!(
            hex::encode(a.private_key().to_bytes()),
            "33b36397400ce7fc4ed11577712441d26fbe5b1f196082da888c6851bb660e7f"
        );
        assert_eq!(
            a.public_key().encode(),
            "a5c23d13b543cf8d52be80de64d9b51822f502efdb4e9fe58e59151abf76dafce97f8bbf6435ec942025bef5727863bf\
             0284fa119c3d4657b2770c31a06fbc1149565b418a3d3a84e442f868564c56a1f33ba8eb48575f79e0dd24565befd016"
        );
    }

    #[test]
    fn zeroize_clears_the_scalar() {
        let mut sk = SecretKey::from_bytes(&[3u8; 32]).unwrap();
        sk.zeroize();
        assert_eq!(sk.0, Scalar::ZERO);
    }

    #[test]
    fn short_seed_is_rejected() {
        let mut rng = ChaCha20Rng::from_seed([0u8; 32]);
        let err = KeyPair::<BlsG2>::generate(Some(&[7u8; 31]), &mut rng).unwrap_err();
        assert_eq!(err, Error::InvalidSeedLength(SEED_MIN_LENGTH));
    }

    #[test]
    fn g1_and_g2_keys_share_the_secret() {
        let seed = [9u8; 32];
        let mut rng = ChaCha20Rng::from_seed([1u8; 32]);
        let g2 = KeyPair::<BlsG2>::generate(Some(&seed), &mut rng).unwrap();
        let g1 = KeyPair::<BlsG1>::generate(Some(&seed), &mut rng).unwrap();
        assert_eq!(g1.private_key(), g2.private_key());
        assert_eq!(g1.public_key().to_bytes().len(), G1PublicKey::BYTES);
        assert_eq!(g2.public_key().to_bytes().len(), DeterministicPublicKey::BYTES);
    }

    #[test]
    fn secret_key_bytes_round_trip_and_debug_is_redacted() {
        let mut rng = ChaCha20Rng::from_seed([2u8; 32]);
        let kp = KeyPair::<BlsG2>::generate(None, &mut rng).unwrap();
        let bytes = kp.private_key().to_bytes();
        assert_eq!(&SecretKey::from_bytes(&bytes).unwrap(), kp.private_key());
        assert_eq!(format!("{:?}", kp.private_key()), "SecretKey(****)");
        assert!(SecretKey::from_bytes(&[0u8; 32]).is_err());
        assert!(SecretKey::from_bytes(&[1u8; 31]).is_err());
    }

    #[test]
    fn public_key_rejects_bad_lengths() {
        assert_eq!(
            DeterministicPublicKey::from_bytes(&[0u8; 95]),
            Err(Error::KeyDeserializationError)
        );
        assert_eq!(
            G1PublicKey::from_bytes(&[0u8; 47]),
            Err(Error::KeyDeserializationError)
        );
    }
}
