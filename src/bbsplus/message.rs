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


use bls12_381_plus::Scalar;
use elliptic_curve::hash2curve::ExpandMsg;

use super::ciphersuites::BbsCiphersuite;
use crate::{
    errors::Error,
    utils::util::bbsplus_utils::{hash_to_scalar, ScalarExt},
};

/// A message mapped into the scalar field
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SignatureMessage(pub(crate) Scalar);

impl SignatureMessage {
    /// Map an arbitrary octet string to a scalar with `MAP_MSG_DST`.
    pub fn hash<CS>(data: &[u8]) -> Result<Self, Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
    {
        Ok(Self(hash_to_scalar::<CS>(data, CS::MAP_MSG_DST)?))
    }

    pub fn from_scalar(value: Scalar) -> Self {
        Self(value)
    }

    pub fn value(&self) -> Scalar {
        self.0
    }

    pub fn to_bytes(&self) -> [u8; Scalar::BYTES] {
        self.0.to_bytes_be()
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Ok(Self(Scalar::from_bytes_be(bytes)?))
    }

    pub fn messages_to_scalar<CS, M>(messages: &[M]) -> Result<Vec<Self>, Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
        M: AsRef<[u8]>,
    {
        messages
            .iter()
            .map(|m| Self::hash::<CS>(m.as_ref()))
            .collect()
    }
}

/// A hidden message and where its proof blinding comes from.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HiddenMessage {
    /// Fresh blinding drawn by the proof itself
    ProofSpecificBlinding(SignatureMessage),
    /// Caller supplied blinding; proofs sharing it show equal messages
    ExternalBlinding(SignatureMessage, Scalar),
}

impl HiddenMessage {
    pub fn message(&self) -> SignatureMessage {
        match self {
            Self::ProofSpecificBlinding(m) | Self::ExternalBlinding(m, _) => *m,
        }
    }

    pub(crate) fn blinding(&self) -> Option<Scalar> {
        match self {
            Self::ProofSpecificBlinding(_) => None,
            Self::ExternalBlinding(_, b) => Some(*b),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ProofMessage {
    Revealed(SignatureMessage),
    Hidden(HiddenMessage),
}

impl ProofMessage {
    pub fn message(&self) -> SignatureMessage {
        match self {
            Self::Revealed(m) => *m,
            Self::Hidden(h) => h.message(),
        }
    }

    pub fn is_revealed(&self) -> bool {
        matches!(self, Self::Revealed(_))
    }

    /// Split `messages` into revealed and hidden by `revealed` indices.
    ///
    /// Out of range and repeated indices are rejected.
    pub fn from_disclosure(
        messages: &[SignatureMessage],
        revealed: &[usize],
    ) -> Result<Vec<Self>, Error> {
        let mut seen = vec![false; messages.len()];
        for &i in revealed {
            match seen.get_mut(i) {
                Some(flag) if !*flag => *flag = true,
                _ => return Err(Error::InvalidDisclosureIndex(i)),
            }
        }
        Ok(messages
            .iter()
            .zip(seen)
            .map(|(m, is_revealed)| {
                if is_revealed {
                    Self::Revealed(*m)
                } else {
                    Self::Hidden(HiddenMessage::ProofSpecificBlinding(*m))
                }
            })
            .collect())
    }
}
