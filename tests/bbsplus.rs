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


#![allow(non_snake_case)]

#[cfg(test)]
mod bbsplus_tests {
    use std::collections::BTreeMap;

    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;
    use zkbbs::{
        api::{self, ProofRequest, VerifyResponse},
        bbsplus::{
            ciphersuites::{Bls12381Sha256, Bls12381Shake256},
            message::SignatureMessage,
            proof,
            signature::Signature,
        },
        errors::{Error, VerificationFailure},
        keys::{
            bls_key::{DeterministicPublicKey, G1PublicKey, SecretKey},
            pair::KeyPair,
        },
        schemes::algorithms::{Bbs, BlsG2},
    };

    const SEED: [u8; 32] = [
        1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
        25, 26, 27, 28, 29, 30, 31, 32,
    ];

    const SEEDED_PUBLIC_KEY: &str = "a5c23d13b543cf8d52be80de64d9b51822f502efdb4e9fe58e59151abf76dafce97f8bbf6435ec942025bef5727863bf0284fa119c3d4657b2770c31a06fbc1149565b418a3d3a84e442f868564c56a1f33ba8eb48575f79e0dd24565befd016";
    const SEEDED_H0: &str = "9935cd65d28e081b0a9c41e3c687fed19d4b5d3f9f18c8d2cc8bc9253c0493a3a5c5a3b64be62f7a28a97c0ef9d28fd0";
    const SEEDED_H1: &str = "b6958119563f3c6e56850c323cd8d1732520bf63fa1af8cc90f2556407cba211897223150ec3e84aee631c06991996bc";
    const SEEDED_SIGNATURE: &str = "867e091449a65c047923b6662701db7e4d50d49b3fce70706bc79766d5b47a0fde30dfbb7d785cde3df5a294e44a25a96df353d8c2919d7c299a879715dff60713702ff27c16dec0918452060ddf280519199f54acfbee6dbb9a7953dced51fb1c56812938c44f098da20c3b15868b6c";

    fn init() {
        dotenvy::dotenv().ok();
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn issuer(seed: &[u8], message_count: usize) -> KeyPair<Bbs> {
        let kp = api::generate_bls12381_g2_key_pair(Some(seed)).unwrap();
        api::bls12381_to_bbs(&kp, message_count).unwrap()
    }

    fn bytes(msgs: &[&str]) -> Vec<Vec<u8>> {
        msgs.iter().map(|m| m.as_bytes().to_vec()).collect()
    }

    #[test]
    fn seeded_signature_is_deterministic() {
        init();
        let kp = issuer(&SEED, 3);
        let messages =
            SignatureMessage::messages_to_scalar::<Bls12381Sha256, _>(&["a", "b", "c"][..]).unwrap();

        let sig1 = Signature::new(
            &messages,
            kp.private_key(),
            kp.public_key(),
            &mut ChaCha20Rng::from_seed([7u8; 32]),
        )
        .unwrap();
        let sig2 = Signature::new(
            &messages,
            kp.private_key(),
            kp.public_key(),
            &mut ChaCha20Rng::from_seed([7u8; 32]),
        )
        .unwrap();

        let encoded = sig1.to_bytes();
        assert_eq!(encoded.len(), api::SIGNATURE_LENGTH);
        assert_eq!(encoded, sig2.to_bytes());
        log::info!("signature: {}", hex::encode(encoded));
        assert_eq!(hex::encode(encoded), SEEDED_SIGNATURE);

        let ok = api::verify(kp.public_key(), &["a", "b", "c"], &encoded).unwrap();
        assert_eq!(ok, VerifyResponse::success());

        let tampered = api::verify(kp.public_key(), &["a", "b", "d"], &encoded).unwrap();
        assert_eq!(
            tampered,
            VerifyResponse::failure(VerificationFailure::PairingCheckFailed)
        );
    }

    #[test]
    fn seeded_key_and_generators_match_fixture() {
        let kp = issuer(&SEED, 3);
        let encoded = kp.public_key().to_bytes_compressed_form();
        assert_eq!(encoded.len(), 96 + 48 + 4 + 3 * 48);

        assert_eq!(hex::encode(&encoded[..96]), SEEDED_PUBLIC_KEY);
        assert_eq!(hex::encode(&encoded[96..144]), SEEDED_H0);
        assert_eq!(&encoded[144..148], &[0, 0, 0, 3]);
        assert_eq!(hex::encode(&encoded[148..196]), SEEDED_H1);
        assert_eq!(
            kp.public_key().deterministic_public_key().encode(),
            SEEDED_PUBLIC_KEY
        );
    }

    #[test]
    fn same_seed_same_keys() {
        let a = api::generate_bls12381_g2_key_pair(Some(&SEED)).unwrap();
        let b = api::generate_bls12381_g2_key_pair(Some(&SEED)).unwrap();
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(a.public_key().to_bytes().len(), api::G2_PUBLIC_KEY_LENGTH);
        assert_eq!(a.private_key().to_bytes().len(), api::SECRET_KEY_LENGTH);

        let g1 = api::generate_bls12381_g1_key_pair(Some(&SEED)).unwrap();
        assert_eq!(g1.public_key().to_bytes().len(), api::G1_PUBLIC_KEY_LENGTH);

        assert_eq!(
            api::generate_bls12381_g2_key_pair(Some(&SEED[..16])).unwrap_err(),
            Error::InvalidSeedLength(32)
        );
    }

    #[test]
    fn key_deserialization_rejects_bad_lengths() {
        assert!(SecretKey::from_bytes(&[1u8; 33]).is_err());
        assert!(DeterministicPublicKey::from_bytes(&[0u8; 48]).is_err());
        assert!(G1PublicKey::from_bytes(&[0u8; 96]).is_err());
        assert!(api::bls_public_key_to_bbs(&[], 2).is_err());
        assert_eq!(
            api::bls_public_key_to_bbs(&issuer(&SEED, 1).public_key().deterministic_public_key().to_bytes(), 0),
            Err(Error::InvalidMessageCount)
        );
    }

    #[test]
    fn bls_sign_and_verify() {
        init();
        let kp = api::generate_bls12381_g2_key_pair(None).unwrap();
        let messages = bytes(&["one", "two"]);
        let signature = api::bls_sign(&kp, &messages).unwrap();

        let pk = kp.public_key().to_bytes();
        assert!(api::bls_verify(&pk, &messages, &signature).unwrap().verified);

        let response = api::bls_verify(&pk, &bytes(&["one", "three"]), &signature).unwrap();
        assert!(!response.verified);
    }

    #[test]
    fn signature_tampering_is_detected() {
        let kp = issuer(&SEED, 2);
        let messages = bytes(&["x", "y"]);
        let signature = api::sign(&kp, &messages).unwrap();

        for idx in [0usize, 47, 60, 100] {
            let mut tampered = signature;
            tampered[idx] ^= 0x01;
            let response = api::verify(kp.public_key(), &messages, &tampered).unwrap();
            assert!(!response.verified, "flipping byte {} went unnoticed", idx);
        }

        let short = api::verify(kp.public_key(), &messages, &signature[..111]).unwrap();
        assert_eq!(
            short,
            VerifyResponse::failure(VerificationFailure::MalformedSignature)
        );
        let count = api::verify(kp.public_key(), &bytes(&["x"]), &signature).unwrap();
        assert_eq!(
            count,
            VerifyResponse::failure(VerificationFailure::MessageCountMismatch)
        );
    }

    #[test]
    fn selective_disclosure_proof() {
        init();
        let kp = issuer(&SEED, 4);
        let messages = bytes(&["name", "age", "city", "id"]);
        let signature = api::sign(&kp, &messages).unwrap();

        let proof = api::create_proof(&signature, kp.public_key(), &messages, &[0, 2], b"nonce").unwrap();

        let ok = api::verify_proof(kp.public_key(), &proof, &bytes(&["name", "city"]), b"nonce").unwrap();
        assert_eq!(ok, VerifyResponse::success());

        let wrong_value =
            api::verify_proof(kp.public_key(), &proof, &bytes(&["name", "town"]), b"nonce").unwrap();
        assert!(!wrong_value.verified);

        let missing =
            api::verify_proof(kp.public_key(), &proof, &bytes(&["name"]), b"nonce").unwrap();
        assert_eq!(
            missing,
            VerifyResponse::failure(VerificationFailure::MessageCountMismatch)
        );

        let bls_pk = kp.public_key().deterministic_public_key().to_bytes();
        let via_bls =
            api::bls_verify_proof(&bls_pk, &proof, &bytes(&["name", "city"]), b"nonce").unwrap();
        assert!(via_bls.verified);
    }

    #[test]
    fn proof_is_bound_to_the_nonce() {
        let kp = issuer(&SEED, 2);
        let messages = bytes(&["a", "b"]);
        let signature = api::sign(&kp, &messages).unwrap();

        let proof = api::create_proof(&signature, kp.public_key(), &messages, &[1], b"n1").unwrap();
        assert!(api::verify_proof(kp.public_key(), &proof, &bytes(&["b"]), b"n1").unwrap().verified);
        assert_eq!(
            api::verify_proof(kp.public_key(), &proof, &bytes(&["b"]), b"n2").unwrap(),
            VerifyResponse::failure(VerificationFailure::ProofOfKnowledgeFailed)
        );
        assert!(!api::verify_proof(kp.public_key(), &proof, &bytes(&["b"]), b"").unwrap().verified);

        let empty_nonce = api::create_proof(&signature, kp.public_key(), &messages, &[], b"").unwrap();
        let none: Vec<Vec<u8>> = Vec::new();
        assert!(api::verify_proof(kp.public_key(), &empty_nonce, &none, b"").unwrap().verified);
    }

    #[test]
    fn proof_requests_are_validated() {
        let kp = issuer(&SEED, 2);
        let messages = bytes(&["a", "b"]);
        let signature = api::sign(&kp, &messages).unwrap();

        assert_eq!(
            api::create_proof(&signature, kp.public_key(), &messages, &[2], b""),
            Err(Error::InvalidDisclosureIndex(2))
        );
        assert_eq!(
            api::create_proof(&signature, kp.public_key(), &messages, &[0, 0], b""),
            Err(Error::InvalidDisclosureIndex(0))
        );
        assert!(matches!(
            api::create_proof(&signature, kp.public_key(), &bytes(&["a", "c"]), &[0], b""),
            Err(Error::ProofGenError(_))
        ));
    }

    #[test]
    fn proofs_are_unlinkable_and_tamper_evident() {
        let kp = issuer(&SEED, 3);
        let messages = bytes(&["a", "b", "c"]);
        let signature = api::sign(&kp, &messages).unwrap();

        let p1 = api::create_proof(&signature, kp.public_key(), &messages, &[1], b"n").unwrap();
        let p2 = api::create_proof(&signature, kp.public_key(), &messages, &[1], b"n").unwrap();
        assert_ne!(p1, p2);

        let mut tampered = p1.clone();
        let last = tampered.len() - 1;
        tampered[last] ^= 0x01;
        assert!(!api::verify_proof(kp.public_key(), &tampered, &bytes(&["b"]), b"n").unwrap().verified);
        assert!(!api::verify_proof(kp.public_key(), &p1[..p1.len() - 1], &bytes(&["b"]), b"n").unwrap().verified);
    }

    #[test]
    fn multi_proof_with_equivalent_hidden_messages() {
        init();
        let kp1 = issuer(&SEED, 3);
        let kp2 = issuer(&[9u8; 32], 2);
        let msgs1 = bytes(&["link secret", "alice", "passport"]);
        let msgs2 = bytes(&["link secret", "driving licence"]);
        let sig1 = api::sign(&kp1, &msgs1).unwrap();
        let sig2 = api::sign(&kp2, &msgs2).unwrap();

        let requests = [
            ProofRequest {
                signature: &sig1,
                public_key: kp1.public_key(),
                messages: &msgs1,
                revealed: &[2],
            },
            ProofRequest {
                signature: &sig2,
                public_key: kp2.public_key(),
                messages: &msgs2,
                revealed: &[1],
            },
        ];
        let equivalences = vec![vec![(0usize, 0usize), (1, 0)]];
        let proofs = api::create_proof_multi(&requests, b"batch", &equivalences).unwrap();
        assert_eq!(proofs.len(), 2);

        let keys = [kp1.public_key().clone(), kp2.public_key().clone()];
        let revealed = vec![bytes(&["passport"]), bytes(&["driving licence"])];

        let ok = api::verify_proof_multi(&keys, &proofs, &revealed, b"batch", &equivalences).unwrap();
        assert_eq!(ok, VerifyResponse::success());

        // alice and the link secret are different hidden values
        let broken = vec![vec![(0usize, 1usize), (1, 0)]];
        let response = api::verify_proof_multi(&keys, &proofs, &revealed, b"batch", &broken).unwrap();
        assert_eq!(
            response,
            VerifyResponse::failure(VerificationFailure::ProofOfKnowledgeFailed)
        );

        let nonce = api::verify_proof_multi(&keys, &proofs, &revealed, b"other", &equivalences).unwrap();
        assert!(!nonce.verified);
    }

    #[test]
    fn multi_proof_fails_as_a_batch() {
        let kp1 = issuer(&SEED, 2);
        let kp2 = issuer(&[3u8; 32], 2);
        let msgs1 = bytes(&["a", "b"]);
        let msgs2 = bytes(&["c", "d"]);
        let sig1 = api::sign(&kp1, &msgs1).unwrap();
        let sig2 = api::sign(&kp2, &msgs2).unwrap();

        let requests = [
            ProofRequest {
                signature: &sig1,
                public_key: kp1.public_key(),
                messages: &msgs1,
                revealed: &[0],
            },
            ProofRequest {
                signature: &sig2,
                public_key: kp2.public_key(),
                messages: &msgs2,
                revealed: &[0, 1],
            },
        ];
        let proofs = api::create_proof_multi(&requests, b"", &[]).unwrap();
        let keys = [kp1.public_key().clone(), kp2.public_key().clone()];

        let good = vec![bytes(&["a"]), bytes(&["c", "d"])];
        assert!(api::verify_proof_multi(&keys, &proofs, &good, b"", &[]).unwrap().verified);

        let one_bad = vec![bytes(&["a"]), bytes(&["c", "x"])];
        assert!(!api::verify_proof_multi(&keys, &proofs, &one_bad, b"", &[]).unwrap().verified);

        // a proof taken out of its batch no longer matches its challenge
        let alone = api::verify_proof(kp1.public_key(), &proofs[0], &bytes(&["a"]), b"").unwrap();
        assert!(!alone.verified);

        assert!(matches!(
            api::verify_proof_multi(&keys[..1], &proofs, &good, b"", &[]),
            Err(Error::InvalidProofRequest(_))
        ));
    }

    #[test]
    fn equivalence_over_differing_messages_is_refused() {
        let kp = issuer(&SEED, 2);
        let msgs1 = bytes(&["a", "b"]);
        let msgs2 = bytes(&["c", "d"]);
        let sig1 = api::sign(&kp, &msgs1).unwrap();
        let sig2 = api::sign(&kp, &msgs2).unwrap();
        let requests = [
            ProofRequest {
                signature: &sig1,
                public_key: kp.public_key(),
                messages: &msgs1,
                revealed: &[],
            },
            ProofRequest {
                signature: &sig2,
                public_key: kp.public_key(),
                messages: &msgs2,
                revealed: &[1],
            },
        ];
        assert!(matches!(
            api::create_proof_multi(&requests, b"", &[vec![(0, 0), (1, 0)]]),
            Err(Error::InvalidProofRequest(_))
        ));
        assert!(matches!(
            api::create_proof_multi(&requests, b"", &[vec![(0, 1), (1, 1)]]),
            Err(Error::InvalidProofRequest(_))
        ));
    }

    #[test]
    fn typed_proof_under_shake_suite() {
        let mut rng = ChaCha20Rng::from_seed([5u8; 32]);
        let kp = KeyPair::<BlsG2>::generate(Some(&SEED), &mut rng)
            .unwrap()
            .to_bbs::<Bls12381Shake256>(3)
            .unwrap();
        let messages =
            SignatureMessage::messages_to_scalar::<Bls12381Shake256, _>(&["a", "b", "c"][..]).unwrap();
        let signature = Signature::new(&messages, kp.private_key(), kp.public_key(), &mut rng).unwrap();

        let pok = proof::create_proof::<Bls12381Shake256, _>(
            &signature,
            kp.public_key(),
            &messages,
            &[0],
            b"shake",
            &mut rng,
        )
        .unwrap();
        let decoded = proof::ProofOfKnowledge::from_bytes(&pok.to_bytes()).unwrap();
        assert_eq!(decoded, pok);
        assert!(proof::verify_proof::<Bls12381Shake256>(kp.public_key(), &decoded, &messages[..1], b"shake").is_ok());
        assert!(proof::verify_proof::<Bls12381Sha256>(kp.public_key(), &decoded, &messages[..1], b"shake").is_err());
    }

    #[cfg(feature = "blind")]
    #[test]
    fn blind_issuance_end_to_end() {
        init();
        let kp = issuer(&SEED, 3);
        let nonce = b"issuer nonce";

        let mut hidden = BTreeMap::new();
        hidden.insert(0usize, b"link secret".to_vec());
        let (context, factor) = api::blind_signature_request(kp.public_key(), &hidden, nonce).unwrap();
        assert!(api::verify_blind_signature_request(&context, kp.public_key(), nonce).unwrap());
        assert!(!api::verify_blind_signature_request(&context, kp.public_key(), b"replayed").unwrap());

        let mut known = BTreeMap::new();
        known.insert(1usize, b"alice".to_vec());
        known.insert(2usize, b"2030-01-01".to_vec());
        let blind = api::blind_sign(&kp, &known, &context, nonce).unwrap();
        assert_eq!(blind.len(), api::BLIND_SIGNATURE_LENGTH);

        let signature = api::unblind_signature(&blind, &factor).unwrap();
        let all = bytes(&["link secret", "alice", "2030-01-01"]);
        assert!(api::verify(kp.public_key(), &all, &signature).unwrap().verified);

        let proof = api::create_proof(&signature, kp.public_key(), &all, &[1], b"v").unwrap();
        assert!(api::verify_proof(kp.public_key(), &proof, &bytes(&["alice"]), b"v").unwrap().verified);
    }

    #[cfg(feature = "blind")]
    #[test]
    fn blind_issuance_rejects_bad_inputs() {
        let kp = issuer(&SEED, 2);
        let mut hidden = BTreeMap::new();
        hidden.insert(0usize, b"secret".to_vec());
        let (context, _) = api::blind_signature_request(kp.public_key(), &hidden, b"n").unwrap();
        let (_, other_factor) = api::blind_signature_request(kp.public_key(), &hidden, b"n").unwrap();

        let mut known = BTreeMap::new();
        known.insert(1usize, b"public".to_vec());

        assert_eq!(
            api::blind_sign(&kp, &known, &context, b"wrong"),
            Err(Error::InvalidCommitmentProof)
        );
        assert_eq!(
            api::blind_sign(&kp, &known, &context[..40], b"n"),
            Err(Error::InvalidCommitmentProof)
        );

        let blind = api::blind_sign(&kp, &known, &context, b"n").unwrap();
        assert_eq!(
            api::unblind_signature(&blind, &other_factor),
            Err(Error::UnblindingMismatch)
        );
    }

    #[cfg(feature = "blind")]
    #[test]
    fn unblinding_with_a_damaged_factor_fails() {
        use zkbbs::bbsplus::commitment::BlindingFactor;

        let kp = issuer(&SEED, 2);
        let mut hidden = BTreeMap::new();
        hidden.insert(0usize, b"secret".to_vec());
        let (context, factor) = api::blind_signature_request(kp.public_key(), &hidden, b"n").unwrap();
        let mut known = BTreeMap::new();
        known.insert(1usize, b"public".to_vec());
        let blind = api::blind_sign(&kp, &known, &context, b"n").unwrap();

        let mut factor_bytes = factor.to_bytes();
        factor_bytes[31] ^= 0x01;
        let damaged = BlindingFactor::from_bytes(&factor_bytes).unwrap();
        assert_eq!(
            api::unblind_signature(&blind, &damaged),
            Err(Error::UnblindingMismatch)
        );

        let signature = api::unblind_signature(&blind, &factor).unwrap();
        let all = bytes(&["secret", "public"]);
        assert!(api::verify(kp.public_key(), &all, &signature).unwrap().verified);
    }
}
