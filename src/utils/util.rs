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

pub mod bbsplus_utils {
    use crate::{bbsplus::ciphersuites::BbsCiphersuite, errors::Error};
    use bls12_381_plus::{G1Affine, G1Projective, G2Affine, G2Projective, Scalar};
    use elliptic_curve::{
        group::Curve,
        hash2curve::{ExpandMsg, Expander},
    };
    use ff::Field;

    /// Hash an octet string to a non-zero scalar.
    ///
    /// `expand_message(msg || I2OSP(counter, 1), dst, EXPAND_LEN)` is reduced modulo r,
    /// bumping the counter until the result is not zero.
    pub fn hash_to_scalar<CS>(msg_octets: &[u8], dst: &[u8]) -> Result<Scalar, Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
    {
        if dst.len() > 255 {
            return Err(Error::HashToScalarError);
        }

        let mut counter: u8 = 0;
        let mut uniform_bytes = vec![0u8; CS::EXPAND_LEN];

        loop {
            let msg_prime = [msg_octets, &[counter][..]].concat();
            CS::Expander::expand_message(&[msg_prime.as_slice()], &[dst], CS::EXPAND_LEN)
                .map_err(|_| Error::HashToScalarError)?
                .fill_bytes(&mut uniform_bytes);

            let okm: &[u8; 48] = uniform_bytes
                .as_slice()
                .try_into()
                .map_err(|_| Error::HashToScalarError)?;
            let hashed_scalar = Scalar::from_okm(okm);

            if !bool::from(hashed_scalar.is_zero()) {
                return Ok(hashed_scalar);
            }

            counter = counter.checked_add(1).ok_or(Error::HashToScalarError)?;
        }
    }

    /// Nonce bytes appended to every Fiat-Shamir transcript.
    ///
    /// An empty nonce maps to 32 zero bytes, anything else to its hash in the scalar field.
    pub fn nonce_to_bytes<CS>(nonce: &[u8]) -> Result<[u8; Scalar::BYTES], Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
    {
        if nonce.is_empty() {
            return Ok([0u8; Scalar::BYTES]);
        }
        Ok(hash_to_scalar::<CS>(nonce, CS::NONCE_DST)?.to_be_bytes())
    }

    /// Integer to big-endian octet string of length `len`
    pub fn i2osp(x: usize, len: usize) -> Vec<u8> {
        let bytes = (x as u64).to_be_bytes();
        if len >= bytes.len() {
            let mut out = vec![0u8; len - bytes.len()];
            out.extend_from_slice(&bytes);
            out
        } else {
            bytes[bytes.len() - len..].to_vec()
        }
    }

    pub fn serialize_g1(points: &[G1Projective]) -> Vec<u8> {
        let mut out = Vec::with_capacity(points.len() * G1Affine::COMPRESSED_BYTES);
        points
            .iter()
            .for_each(|p| out.extend_from_slice(&p.to_affine().to_compressed()));
        out
    }

    pub fn parse_g1_projective(slice: &[u8]) -> Result<G1Projective, Error> {
        let bytes: [u8; G1Affine::COMPRESSED_BYTES] = slice
            .try_into()
            .map_err(|_| Error::DeserializationError("G1 point must be 48 bytes".to_owned()))?;
        Option::<G1Affine>::from(G1Affine::from_compressed(&bytes))
            .map(G1Projective::from)
            .ok_or_else(|| Error::DeserializationError("invalid G1 point".to_owned()))
    }

    pub fn parse_g2_projective(slice: &[u8]) -> Result<G2Projective, Error> {
        let bytes: [u8; G2Affine::COMPRESSED_BYTES] = slice
            .try_into()
            .map_err(|_| Error::DeserializationError("G2 point must be 96 bytes".to_owned()))?;
        Option::<G2Affine>::from(G2Affine::from_compressed(&bytes))
            .map(G2Projective::from)
            .ok_or_else(|| Error::DeserializationError("invalid G2 point".to_owned()))
    }

    pub trait ScalarExt: Sized {
        fn to_bytes_be(&self) -> [u8; Scalar::BYTES];
        fn from_bytes_be(bytes: &[u8]) -> Result<Self, Error>;
    }

    impl ScalarExt for Scalar {
        fn to_bytes_be(&self) -> [u8; Scalar::BYTES] {
            self.to_be_bytes()
        }

        fn from_bytes_be(bytes: &[u8]) -> Result<Self, Error> {
            let bytes: [u8; Scalar::BYTES] = bytes
                .try_into()
                .map_err(|_| Error::DeserializationError("scalar must be 32 bytes".to_owned()))?;
            Option::<Scalar>::from(Scalar::from_be_bytes(&bytes))
                .ok_or_else(|| Error::DeserializationError("scalar out of range".to_owned()))
        }
    }

    /// Reads consecutive fixed size chunks out of an encoded proof or signature.
    pub struct ByteReader<'a> {
        data: &'a [u8],
        offset: usize,
    }

    impl<'a> ByteReader<'a> {
        pub fn new(data: &'a [u8]) -> Self {
            Self { data, offset: 0 }
        }

        pub fn take(&mut self, len: usize) -> Result<&'a [u8], Error> {
            let end = self
                .offset
                .checked_add(len)
                .filter(|&end| end <= self.data.len())
                .ok_or_else(|| Error::DeserializationError("unexpected end of input".to_owned()))?;
            let out = &self.data[self.offset..end];
            self.offset = end;
            Ok(out)
        }

        pub fn g1(&mut self) -> Result<G1Projective, Error> {
            parse_g1_projective(self.take(G1Affine::COMPRESSED_BYTES)?)
        }

        pub fn scalar(&mut self) -> Result<Scalar, Error> {
            Scalar::from_bytes_be(self.take(Scalar::BYTES)?)
        }

        pub fn u16(&mut self) -> Result<u16, Error> {
            let b = self.take(2)?;
            Ok(u16::from_be_bytes([b[0], b[1]]))
        }

        pub fn remaining(&self) -> usize {
            self.data.len() - self.offset
        }
    }

}
