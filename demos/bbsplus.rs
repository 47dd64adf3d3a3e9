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


mod bbsplus_example {
    use elliptic_curve::hash2curve::ExpandMsg;
    use rand::Rng;
    use zkbbs::{
        bbsplus::{
            ciphersuites::BbsCiphersuite,
            message::SignatureMessage,
            proof::{create_proof, verify_proof},
            signature::Signature,
        },
        errors::Error,
        keys::pair::KeyPair,
        schemes::algorithms::BlsG2,
    };

    pub(crate) fn bbsplus_main<CS>() -> Result<(), Error>
    where
        CS: BbsCiphersuite,
        CS::Expander: for<'a> ExpandMsg<'a>,
    {
        const MSGS: [&str; 3] = [
            "9872ad089e452c7b6e283dfac2a80d58e8d0ff71cc4d5e310a1debdda4a45f02",
            "87a8bd656d49ee07b8110e1d8fd4f1dcef6fb9bc368c492d9bc8c4f98a739ac6",
            "96012096adda3f13dd4adbe4eea481a4c4b5717932b73b00e31807d3c5894b90",
        ];

        log::info!("Messages: {:?}", MSGS);

        const NONCE_HEX: &str = "11223344556677889900aabbccddeeff";
        let nonce = hex::decode(NONCE_HEX).unwrap();
        let revealed_message_indexes = [0usize, 2usize];

        let mut rng = rand::thread_rng();
        let seed: Vec<u8> = (0..CS::IKM_LEN).map(|_| rng.gen()).collect();

        log::info!("Keypair Generation");
        let bls_keypair = KeyPair::<BlsG2>::generate(Some(&seed), &mut rng)?;
        log::info!("PK: {}", bls_keypair.public_key().encode());

        log::info!("Computing Generators");
        let issuer_keypair = bls_keypair.to_bbs::<CS>(MSGS.len())?;

        let messages: Vec<Vec<u8>> = MSGS.iter().map(|m| hex::decode(m).unwrap()).collect();
        let msgs_scalars = SignatureMessage::messages_to_scalar::<CS, _>(&messages[..])?;

        log::info!("Signature Computation...");
        let signature = Signature::new(
            &msgs_scalars,
            issuer_keypair.private_key(),
            issuer_keypair.public_key(),
            &mut rng,
        )?;
        log::info!("Signature: {}", hex::encode(signature.to_bytes()));

        log::info!("Signature Verification...");
        let verify = signature.verify(&msgs_scalars, issuer_keypair.public_key());
        log::info!("Signature is VALID: {}", verify.is_ok());

        log::info!("Computation of a Zero-Knowledge proof-of-knowledge of a signature...");
        let proof = create_proof::<CS, _>(
            &signature,
            issuer_keypair.public_key(),
            &msgs_scalars,
            &revealed_message_indexes,
            &nonce,
            &mut rng,
        )?;
        log::info!("Proof: {}", hex::encode(proof.to_bytes()));

        let disclosed: Vec<SignatureMessage> = revealed_message_indexes
            .iter()
            .map(|&i| msgs_scalars[i])
            .collect();

        log::info!("Proof Verification...");
        let proof_result = verify_proof::<CS>(issuer_keypair.public_key(), &proof, &disclosed, &nonce);
        log::info!("Proof is VALID: {}", proof_result.is_ok());

        Ok(())
    }
}

fn main() {
    use crate::bbsplus_example::bbsplus_main;
    use std::env;
    use zkbbs::bbsplus::ciphersuites::{Bls12381Sha256, Bls12381Shake256};

    dotenvy::dotenv().ok();
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        println!(
            "Usage: {} <cipher_suite>
                Ciphersuites:
                    - BLS12-381-SHA-256
                    - BLS12-381-SHAKE-256",
            args[0]
        );
        return;
    }

    let cipher_suite = &args[1];

    let result = match cipher_suite.as_str() {
        "BLS12-381-SHA-256" => {
            log::info!("Ciphersuite: BLS12-381-SHA-256");
            bbsplus_main::<Bls12381Sha256>()
        }
        "BLS12-381-SHAKE-256" => {
            log::info!("Ciphersuite: BLS12-381-SHAKE-256");
            bbsplus_main::<Bls12381Shake256>()
        }
        _ => {
            println!("Unknown cipher suite: {}", cipher_suite);
            return;
        }
    };

    if let Err(e) = result {
        log::error!("{}", e);
    }
}
