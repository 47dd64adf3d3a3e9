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


use bls12_381_plus::{G1Affine, G1Projective, G2Affine, G2Projective};
use elliptic_curve::{group::Curve, hash2curve::ExpandMsg};
use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use super::{ciphersuites::BbsCiphersuite, generators::Generators};
use crate::{
    errors::Error,
    keys::bls_key::DeterministicPublicKey,
    utils::util::bbsplus_utils::{parse_g2_projective, serialize_g1, ByteReader},
};

/// BBS+ public key: the BLS key `w` together with its message generators.
///
/// Compressed form: `w (96) || h0 (48) || u32_be(L) || h_1 .. h_L (48 each)`.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PublicKey {
    pub(crate) w: G2Projective,
    pub(crate) h0: G1Projective,
    pub(crate) h: Vec<G1Projective>,
}

impl PublicKey {
    pub(crate) fn derive<CS>(w: G2Projective, message_count: usize) -> Result<Self, Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
    {
        let generators = Generators::create::<CS>(&w, message_count)?;
        Ok(Self {
            w,
            h0: generators.h0,
            h: generators.message_generators,
        })
    }

    pub fn message_count(&self) -> usize {
        self.h.len()
    }

    pub fn deterministic_public_key(&self) -> DeterministicPublicKey {
        DeterministicPublicKey(self.w)
    }

    pub fn to_bytes_compressed_form(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            G2Affine::COMPRESSED_BYTES + 4 + (self.h.len() + 1) * G1Affine::COMPRESSED_BYTES,
        );
        out.extend_from_slice(&self.w.to_affine().to_compressed());
        out.extend_from_slice(&self.h0.to_affine().to_compressed());
        out.extend_from_slice(&(self.h.len() as u32).to_be_bytes());
        out.extend_from_slice(&serialize_g1(&self.h));
        out
    }

    pub fn from_bytes_compressed_form(data: &[u8]) -> Result<Self, Error> {
        let mut reader = ByteReader::new(data);
        let w = parse_g2_projective(reader.take(G2Affine::COMPRESSED_BYTES)?)?;
        let h0 = reader.g1()?;
        let count = reader.take(4)?;
        let count = u32::from_be_bytes([count[0], count[1], count[2], count[3]]) as usize;

        if count.checked_mul(G1Affine::COMPRESSED_BYTES) != Some(reader.remaining()) {
            return Err(Error::DeserializationError(
                "public key length does not match its message count".to_owned(),
            ));
        }
        let h = (0..count)
            .map(|_| reader.g1())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { w, h0, h })
    }

    /// Reject keys carrying an identity element or no message generators.
    pub fn validate(&self) -> Result<(), Error> {
        if self.h.is_empty() {
            return Err(Error::InvalidMessageCount);
        }
        let any_identity = bool::from(self.w.is_identity())
            || bool::from(self.h0.is_identity())
            || self.h.iter().any(|p| bool::from(p.is_identity()));
        if any_identity {
            return Err(Error::MalformedPublicKey);
        }
        Ok(())
    }
}

impl Serialize for PublicKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let h: Vec<String> = self
            .h
            .iter()
            .map(|p| hex::encode(p.to_affine().to_compressed()))
            .collect();

        let mut state = serializer.serialize_struct("PublicKey", 3)?;
        state.serialize_field("w", &hex::encode(self.w.to_affine().to_compressed()))?;
        state.serialize_field("h0", &hex::encode(self.h0.to_affine().to_compressed()))?;
        state.serialize_field("h", &h)?;
        state.end()
    }
}
