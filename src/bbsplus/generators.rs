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


use bls12_381_plus::{G1Projective, G2Projective};
use elliptic_curve::hash2curve::ExpandMsg;
use group::Curve;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::ciphersuites::BbsCiphersuite;
use crate::{errors::Error, utils::util::bbsplus_utils::i2osp};

/// The blinding generator `h0` and one generator per message slot.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Generators {
    pub h0: G1Projective,
    pub message_generators: Vec<G1Projective>,
}

impl Generators {
    /// Derive the `message_count + 1` generators bound to `w`.
    ///
    /// `gen_i = hash_to_curve_g1(w || I2OSP(i, 4) || I2OSP(0, 1) || I2OSP(L, 4), GENERATOR_DST)`,
    /// with `h0 = gen_0` and `h[i - 1] = gen_i`.
    pub fn create<CS>(w: &G2Projective, message_count: usize) -> Result<Self, Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
    {
        if message_count == 0 {
            return Err(Error::InvalidMessageCount);
        }
        if message_count > u32::MAX as usize {
            return Err(Error::InvalidMessageCount);
        }

        let w_bytes = w.to_affine().to_compressed();
        let suffix = [i2osp(0, 1), i2osp(message_count, 4)].concat();

        let derive = |i: usize| -> G1Projective {
            let data = [&w_bytes[..], &i2osp(i, 4), &suffix].concat();
            G1Projective::hash::<CS::Expander>(&data, CS::GENERATOR_DST)
        };

        #[cfg(feature = "parallel")]
        let mut points: Vec<G1Projective> =
            (0..=message_count).into_par_iter().map(derive).collect();
        #[cfg(not(feature = "parallel"))]
        let mut points: Vec<G1Projective> = (0..=message_count).map(derive).collect();

        log::debug!("derived {} generators", points.len());

        let message_generators = points.split_off(1);
        Ok(Self {
            h0: points[0],
            message_generators,
        })
    }
}
