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


//! Proof of knowledge of the openings of a vector Pedersen commitment in G1.
//!
//! [`ProverCommittingG1`] gathers generators and blindings, [`ProverCommittingG1::finish`]
//! fixes the commitment `T = sum(gen_i * blinding_i)` and [`ProverCommittedG1::gen_proof`]
//! turns a challenge `c` and the secrets into responses `blinding_i + c * secret_i`.
//! The verifier rebuilds `T` from the responses with [`ProofG1::commitment`].

use bls12_381_plus::{G1Projective, Scalar};
use ff::Field;
use rand::{CryptoRng, RngCore};

use crate::errors::Error;

#[derive(Clone, Debug, Default)]
pub struct ProverCommittingG1 {
    gens: Vec<G1Projective>,
    blindings: Vec<Scalar>,
}

#[derive(Clone, Debug)]
pub struct ProverCommittedG1 {
    gens: Vec<G1Projective>,
    blindings: Vec<Scalar>,
    pub commitment: G1Projective,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct ProofG1 {
    pub responses: Vec<Scalar>,
}

impl ProverCommittingG1 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws a fresh blinding when none is supplied. Returns the position of `gen`.
    pub fn commit<R>(&mut self, gen: G1Projective, blinding: Option<Scalar>, rng: &mut R) -> usize
    where
        R: RngCore + CryptoRng,
    {
        let blinding = blinding.unwrap_or_else(|| Scalar::random(&mut *rng));
        let idx = self.gens.len();
        self.gens.push(gen);
        self.blindings.push(blinding);
        idx
    }

    pub fn finish(self) -> ProverCommittedG1 {
        let commitment = G1Projective::sum_of_products(&self.gens, &self.blindings);
        ProverCommittedG1 {
            gens: self.gens,
            blindings: self.blindings,
            commitment,
        }
    }

    pub fn get_index(&self, idx: usize) -> Result<(&G1Projective, &Scalar), Error> {
        match (self.gens.get(idx), self.blindings.get(idx)) {
            (Some(g), Some(b)) => Ok((g, b)),
            _ => Err(Error::ProofGenError(format!(
                "index {} greater than size {}",
                idx,
                self.gens.len()
            ))),
        }
    }
}

impl ProverCommittedG1 {
    pub fn gen_proof(self, challenge: &Scalar, secrets: &[Scalar]) -> Result<ProofG1, Error> {
        if secrets.len() != self.gens.len() {
            return Err(Error::ProofGenError(format!(
                "{} bases and {} secrets",
                self.gens.len(),
                secrets.len()
            )));
        }
        let responses = self
            .blindings
            .iter()
            .zip(secrets)
            .map(|(b, x)| b + challenge * x)
            .collect();
        Ok(ProofG1 { responses })
    }
}

impl ProofG1 {
    /// `sum(bases_i * responses_i) - statement * challenge`, which equals the prover's
    /// commitment exactly when the responses open `statement` under `challenge`.
    pub fn commitment(
        &self,
        bases: &[G1Projective],
        statement: &G1Projective,
        challenge: &Scalar,
    ) -> Result<G1Projective, Error> {
        if bases.len() != self.responses.len() {
            return Err(Error::ProofGenError(format!(
                "{} bases and {} responses",
                bases.len(),
                self.responses.len()
            )));
        }
        Ok(G1Projective::sum_of_products(bases, &self.responses) - statement * challenge)
    }
}
