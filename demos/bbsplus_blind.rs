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


#[cfg(feature = "blind")]
mod bbsplus_blind_example {
    use std::collections::BTreeMap;

    use zkbbs::{api, errors::Error};

    pub(crate) fn bbsplus_blind_main() -> Result<(), Error> {
        let nonce = b"signer nonce";

        log::info!("Keypair Generation");
        let bls_keypair = api::generate_bls12381_g2_key_pair(None)?;
        let issuer_keypair = api::bls12381_to_bbs(&bls_keypair, 3)?;
        log::info!("PK: {}", bls_keypair.public_key().encode());

        log::info!("Holder commits to the link secret");
        let mut hidden = BTreeMap::new();
        hidden.insert(0usize, b"link secret".to_vec());
        let (context, blinding_factor) =
            api::blind_signature_request(issuer_keypair.public_key(), &hidden, nonce)?;
        log::info!("Commitment request: {}", hex::encode(&context));

        let valid = api::verify_blind_signature_request(&context, issuer_keypair.public_key(), nonce)?;
        log::info!("Commitment proof is VALID: {}", valid);

        log::info!("Blind Signature Computation...");
        let mut known = BTreeMap::new();
        known.insert(1usize, b"alice".to_vec());
        known.insert(2usize, b"2030-01-01".to_vec());
        let blind_signature = api::blind_sign(&issuer_keypair, &known, &context, nonce)?;
        log::info!("Blind Signature: {}", hex::encode(blind_signature));

        log::info!("Unblinding...");
        let signature = api::unblind_signature(&blind_signature, &blinding_factor)?;

        let messages = [b"link secret".to_vec(), b"alice".to_vec(), b"2030-01-01".to_vec()];
        let response = api::verify(issuer_keypair.public_key(), &messages, &signature)?;
        log::info!("Signature verification: {}", response.to_json()?);

        log::info!("Disclosing only the name...");
        let proof = api::create_proof(&signature, issuer_keypair.public_key(), &messages, &[1], b"verifier")?;
        let response = api::verify_proof(issuer_keypair.public_key(), &proof, &[b"alice".to_vec()], b"verifier")?;
        log::info!("Proof verification: {}", response.to_json()?);

        Ok(())
    }
}

#[cfg(feature = "blind")]
fn main() {
    use crate::bbsplus_blind_example::bbsplus_blind_main;

    dotenvy::dotenv().ok();
    env_logger::init();

    if let Err(e) = bbsplus_blind_main() {
        log::error!("{}", e);
    }
}

#[cfg(not(feature = "blind"))]
fn main() {}
