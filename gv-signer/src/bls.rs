//! BLS12-381 Signatures for Group Votes
//!
//! Wraps the blst min-pk variant: public keys are compressed G1 points
//! (48 bytes), signatures are compressed G2 points (96 bytes).
//!
//! Features:
//! - Key generation (random or from a 32-byte seed)
//! - Individual signing and verification
//! - Signature and public key aggregation
//! - Aggregate verification over heterogeneous messages
//! - Proof of possession for key registration

use std::collections::HashSet;

use blst::min_pk::{AggregatePublicKey, AggregateSignature, PublicKey, SecretKey, Signature};
use blst::BLST_ERROR;
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;
use zeroize::Zeroize;

use crate::error::{SignerError, SignerResult};

/// Ciphersuite tag used to hash vote messages to G2
pub const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// Ciphersuite tag used for proofs of possession
pub const POP_DST: &[u8] = b"BLS_POP_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

/// Compressed public key length (G1)
pub const PUBLIC_KEY_LEN: usize = 48;

/// Compressed signature length (G2)
pub const SIGNATURE_LEN: usize = 96;

/// Secret key length
pub const SECRET_KEY_LEN: usize = 32;

/// BLS secret key wrapper
#[derive(Clone)]
pub struct BlsSecretKey {
    inner: SecretKey,
    /// Key identifier (first 8 bytes of public key hex)
    pub kid: String,
}

impl BlsSecretKey {
    /// Generate a new random BLS secret key
    pub fn generate() -> SignerResult<Self> {
        let mut ikm = [0u8; 32];
        OsRng.fill_bytes(&mut ikm);
        let key = Self::from_seed(&ikm);
        ikm.zeroize();
        key
    }

    /// Derive a secret key from input keying material (at least 32 bytes)
    pub fn from_seed(ikm: &[u8]) -> SignerResult<Self> {
        let sk = SecretKey::key_gen(ikm, &[])
            .map_err(|e| SignerError::Crypto(format!("Key generation failed: {:?}", e)))?;
        Ok(Self::wrap(sk))
    }

    /// Create from raw scalar bytes (32 bytes, big-endian)
    pub fn from_bytes(bytes: &[u8]) -> SignerResult<Self> {
        if bytes.len() != SECRET_KEY_LEN {
            return Err(SignerError::FailsDecode(format!(
                "Invalid BLS secret key length: expected {}, got {}",
                SECRET_KEY_LEN,
                bytes.len()
            )));
        }
        let sk = SecretKey::from_bytes(bytes)
            .map_err(|e| SignerError::FailsDecode(format!("Invalid BLS secret key: {:?}", e)))?;
        Ok(Self::wrap(sk))
    }

    fn wrap(inner: SecretKey) -> Self {
        let kid = hex::encode(&inner.sk_to_pk().compress()[..8]);
        Self { inner, kid }
    }

    /// Get the corresponding public key
    pub fn public_key(&self) -> BlsPublicKey {
        BlsPublicKey {
            inner: self.inner.sk_to_pk(),
        }
    }

    /// Sign a message under the vote ciphersuite
    pub fn sign(&self, message: &[u8]) -> BlsSignature {
        BlsSignature {
            inner: self.inner.sign(message, DST, &[]),
        }
    }

    /// Export to bytes
    pub fn to_bytes(&self) -> [u8; SECRET_KEY_LEN] {
        self.inner.to_bytes()
    }
}

impl std::fmt::Debug for BlsSecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlsSecretKey").field("kid", &self.kid).finish()
    }
}

/// BLS public key wrapper
#[derive(Clone, Debug)]
pub struct BlsPublicKey {
    inner: PublicKey,
}

impl BlsPublicKey {
    /// Decode and validate a compressed public key (48 bytes)
    ///
    /// Rejects the identity point and points outside the prime-order subgroup.
    pub fn from_bytes(bytes: &[u8]) -> SignerResult<Self> {
        if bytes.len() != PUBLIC_KEY_LEN {
            return Err(SignerError::FailsDecode(format!(
                "Invalid BLS public key length: expected {}, got {}",
                PUBLIC_KEY_LEN,
                bytes.len()
            )));
        }
        let pk = PublicKey::key_validate(bytes)
            .map_err(|e| SignerError::FailsDecode(format!("Invalid BLS public key: {:?}", e)))?;
        Ok(Self { inner: pk })
    }

    /// Create from hex string
    pub fn from_hex(hex_str: &str) -> SignerResult<Self> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| SignerError::FailsDecode(format!("Invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Export to compressed bytes (48 bytes)
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LEN] {
        self.inner.compress()
    }

    /// Export to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }

    /// Verify a signature over `message`
    pub fn verify(&self, message: &[u8], signature: &BlsSignature) -> bool {
        signature.inner.verify(true, message, DST, &[], &self.inner, false)
            == BLST_ERROR::BLST_SUCCESS
    }
}

impl PartialEq for BlsPublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for BlsPublicKey {}

impl Serialize for BlsPublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for BlsPublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// BLS signature wrapper
#[derive(Clone, Debug)]
pub struct BlsSignature {
    inner: Signature,
}

impl BlsSignature {
    /// Decode and subgroup-check a compressed signature (96 bytes)
    pub fn from_bytes(bytes: &[u8]) -> SignerResult<Self> {
        if bytes.len() != SIGNATURE_LEN {
            return Err(SignerError::FailsDecode(format!(
                "Invalid BLS signature length: expected {}, got {}",
                SIGNATURE_LEN,
                bytes.len()
            )));
        }
        let sig = Signature::sig_validate(bytes, true)
            .map_err(|e| SignerError::FailsDecode(format!("Invalid BLS signature: {:?}", e)))?;
        Ok(Self { inner: sig })
    }

    /// Create from hex string
    pub fn from_hex(hex_str: &str) -> SignerResult<Self> {
        let bytes = hex::decode(hex_str)
            .map_err(|e| SignerError::FailsDecode(format!("Invalid hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Export to compressed bytes (96 bytes)
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        self.inner.compress()
    }

    /// Export to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl PartialEq for BlsSignature {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for BlsSignature {}

/// Generate a fresh random key pair
pub fn gen_keypair() -> SignerResult<(BlsSecretKey, BlsPublicKey)> {
    let sk = BlsSecretKey::generate()?;
    let pk = sk.public_key();
    Ok((sk, pk))
}

/// Sign `message` with `sk`
pub fn sign(sk: &BlsSecretKey, message: &[u8]) -> BlsSignature {
    sk.sign(message)
}

/// Verify a single signature
pub fn verify(pk: &BlsPublicKey, message: &[u8], signature: &BlsSignature) -> bool {
    pk.verify(message, signature)
}

/// Aggregate compressed signatures into one
///
/// Fails only when an input does not decode.
pub fn aggregate_signatures(signatures: &[&[u8]]) -> SignerResult<BlsSignature> {
    if signatures.is_empty() {
        return Err(SignerError::Crypto("No signatures to aggregate".to_string()));
    }

    let sigs: Vec<BlsSignature> = signatures
        .iter()
        .map(|bytes| BlsSignature::from_bytes(bytes))
        .collect::<SignerResult<Vec<_>>>()?;

    aggregate_decoded_signatures(&sigs)
}

/// Aggregate already-decoded signatures
pub fn aggregate_decoded_signatures(signatures: &[BlsSignature]) -> SignerResult<BlsSignature> {
    if signatures.is_empty() {
        return Err(SignerError::Crypto("No signatures to aggregate".to_string()));
    }

    let sig_refs: Vec<&Signature> = signatures.iter().map(|s| &s.inner).collect();
    let agg_sig = AggregateSignature::aggregate(&sig_refs, false)
        .map_err(|e| SignerError::Crypto(format!("Failed to aggregate signatures: {:?}", e)))?;

    Ok(BlsSignature {
        inner: agg_sig.to_signature(),
    })
}

/// Aggregate public keys by summing them in G1
///
/// No proof-of-possession check happens here; keys are expected to have been
/// admitted through [`verify_possession`].
pub fn aggregate_public_keys(pubkeys: &[BlsPublicKey]) -> SignerResult<BlsPublicKey> {
    if pubkeys.is_empty() {
        return Err(SignerError::Crypto("No public keys to aggregate".to_string()));
    }

    let pk_refs: Vec<&PublicKey> = pubkeys.iter().map(|pk| &pk.inner).collect();

    let agg_pk = AggregatePublicKey::aggregate(&pk_refs, false)
        .map_err(|e| SignerError::Crypto(format!("Failed to aggregate public keys: {:?}", e)))?;

    Ok(BlsPublicKey {
        inner: agg_pk.to_public_key(),
    })
}

/// Verify an aggregate signature over distinct (message, key set) pairs
///
/// Accepts iff `e(g2, agg_sig) == prod_i e(sum(pk_sets[i]), H(msgs[i]))`.
/// A malformed signature surfaces as [`SignerError::FailsDecode`]; a
/// cryptographic mismatch is `Ok(false)`.
pub fn aggregate_verify(
    msgs: &[Vec<u8>],
    msgs_must_be_distinct: bool,
    agg_sig: &[u8],
    pk_sets: &[Vec<BlsPublicKey>],
) -> SignerResult<bool> {
    let signature = BlsSignature::from_bytes(agg_sig)?;
    aggregate_verify_signature(msgs, msgs_must_be_distinct, &signature, pk_sets)
}

/// Same as [`aggregate_verify`] for an already-decoded signature
pub fn aggregate_verify_signature(
    msgs: &[Vec<u8>],
    msgs_must_be_distinct: bool,
    signature: &BlsSignature,
    pk_sets: &[Vec<BlsPublicKey>],
) -> SignerResult<bool> {
    if msgs.len() != pk_sets.len() {
        return Err(SignerError::LengthMismatch {
            msgs: msgs.len(),
            key_sets: pk_sets.len(),
        });
    }
    if msgs.is_empty() {
        return Ok(false);
    }

    if msgs_must_be_distinct {
        let mut seen = HashSet::with_capacity(msgs.len());
        if !msgs.iter().all(|m| seen.insert(m.as_slice())) {
            debug!(count = msgs.len(), "aggregate verify rejected duplicate messages");
            return Ok(false);
        }
    }

    let apks: Vec<BlsPublicKey> = pk_sets
        .iter()
        .map(|set| aggregate_public_keys(set))
        .collect::<SignerResult<Vec<_>>>()?;

    let msg_refs: Vec<&[u8]> = msgs.iter().map(|m| m.as_slice()).collect();
    let pk_refs: Vec<&PublicKey> = apks.iter().map(|pk| &pk.inner).collect();

    let result = signature
        .inner
        .aggregate_verify(true, &msg_refs, DST, &pk_refs, false);
    Ok(result == BLST_ERROR::BLST_SUCCESS)
}

/// Produce a proof of possession: a signature over the compressed public key
/// under the PoP tag
pub fn prove_possession(sk: &BlsSecretKey) -> BlsSignature {
    let pk_bytes = sk.public_key().to_bytes();
    BlsSignature {
        inner: sk.inner.sign(&pk_bytes, POP_DST, &[]),
    }
}

/// Check a proof of possession for `pk`
pub fn verify_possession(pk: &BlsPublicKey, proof: &BlsSignature) -> bool {
    let pk_bytes = pk.to_bytes();
    proof.inner.verify(true, &pk_bytes, POP_DST, &[], &pk.inner, false) == BLST_ERROR::BLST_SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded(i: u8) -> BlsSecretKey {
        BlsSecretKey::from_seed(&[i; 32]).unwrap()
    }

    #[test]
    fn test_bls_key_generation() {
        let (sk, pk) = gen_keypair().unwrap();

        assert!(!sk.kid.is_empty());
        assert_eq!(pk.to_bytes().len(), PUBLIC_KEY_LEN);
        assert_eq!(sk.public_key(), pk);
    }

    #[test]
    fn test_fixed_scalar_key() {
        let sk = BlsSecretKey::from_bytes(&[0x01; 32]).unwrap();
        let pk = sk.public_key();
        let sig = sign(&sk, b"vote");

        assert_eq!(sk.to_bytes(), [0x01; 32]);
        assert!(verify(&pk, b"vote", &sig));
    }

    #[test]
    fn test_bls_sign_and_verify() {
        let sk = seeded(7);
        let pk = sk.public_key();
        let message = b"proposal 1 yes";

        let signature = sk.sign(message);
        assert!(pk.verify(message, &signature));
        assert!(!pk.verify(b"proposal 1 no", &signature));
    }

    #[test]
    fn test_bls_serialization() {
        let sk = seeded(3);
        let pk = sk.public_key();
        let signature = sk.sign(b"Test message");

        let pk2 = BlsPublicKey::from_bytes(&pk.to_bytes()).unwrap();
        assert_eq!(pk, pk2);

        let sig2 = BlsSignature::from_hex(&signature.to_hex()).unwrap();
        assert_eq!(signature, sig2);
        assert_eq!(sig2.to_bytes().len(), SIGNATURE_LEN);

        let json = serde_json::to_string(&pk).unwrap();
        let pk3: BlsPublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(pk, pk3);
    }

    #[test]
    fn test_decode_failures() {
        assert!(matches!(
            BlsPublicKey::from_bytes(&[0u8; 47]),
            Err(SignerError::FailsDecode(_))
        ));
        assert!(matches!(
            BlsSignature::from_bytes(&[0u8; 95]),
            Err(SignerError::FailsDecode(_))
        ));
        // Not a valid compressed point encoding
        assert!(matches!(
            BlsSignature::from_bytes(&[0xffu8; 96]),
            Err(SignerError::FailsDecode(_))
        ));
    }

    #[test]
    fn test_same_message_aggregation() {
        let message = b"Aggregation test";
        let keys: Vec<BlsSecretKey> = (1..=3).map(seeded).collect();

        let sigs: Vec<[u8; SIGNATURE_LEN]> = keys.iter().map(|k| k.sign(message).to_bytes()).collect();
        let sig_refs: Vec<&[u8]> = sigs.iter().map(|s| s.as_slice()).collect();
        let agg_sig = aggregate_signatures(&sig_refs).unwrap();

        let pubkeys: Vec<BlsPublicKey> = keys.iter().map(|k| k.public_key()).collect();
        let agg_pk = aggregate_public_keys(&pubkeys).unwrap();

        assert!(agg_pk.verify(message, &agg_sig));
    }

    #[test]
    fn test_aggregate_verify_distinct_messages() {
        let keys: Vec<BlsSecretKey> = (1..=4).map(seeded).collect();
        let msgs: Vec<Vec<u8>> = (0..4).map(|i| format!("message {}", i).into_bytes()).collect();

        let sigs: Vec<BlsSignature> = keys.iter().zip(&msgs).map(|(k, m)| k.sign(m)).collect();
        let agg = aggregate_decoded_signatures(&sigs).unwrap();
        let pk_sets: Vec<Vec<BlsPublicKey>> = keys.iter().map(|k| vec![k.public_key()]).collect();

        assert!(aggregate_verify(&msgs, true, &agg.to_bytes(), &pk_sets).unwrap());

        // Swapping key sets breaks the pairing equation
        let mut swapped = pk_sets.clone();
        swapped.swap(0, 1);
        assert!(!aggregate_verify(&msgs, true, &agg.to_bytes(), &swapped).unwrap());
    }

    #[test]
    fn test_aggregate_verify_grouped_key_sets() {
        // Two voters on "yes", one on "no"
        let yes_keys = [seeded(1), seeded(2)];
        let no_key = seeded(3);
        let yes = b"yes".to_vec();
        let no = b"no".to_vec();

        let mut sigs: Vec<BlsSignature> = yes_keys.iter().map(|k| k.sign(&yes)).collect();
        sigs.push(no_key.sign(&no));
        let agg = aggregate_decoded_signatures(&sigs).unwrap();

        let pk_sets = vec![
            yes_keys.iter().map(|k| k.public_key()).collect::<Vec<_>>(),
            vec![no_key.public_key()],
        ];
        assert!(aggregate_verify(&[yes, no], true, &agg.to_bytes(), &pk_sets).unwrap());
    }

    #[test]
    fn test_aggregate_verify_duplicate_messages() {
        let k1 = seeded(1);
        let k2 = seeded(2);
        let msg = b"same".to_vec();
        let agg = aggregate_decoded_signatures(&[k1.sign(&msg), k2.sign(&msg)]).unwrap();
        let pk_sets = vec![vec![k1.public_key()], vec![k2.public_key()]];
        let msgs = vec![msg.clone(), msg];

        assert!(!aggregate_verify(&msgs, true, &agg.to_bytes(), &pk_sets).unwrap());
        assert!(aggregate_verify(&msgs, false, &agg.to_bytes(), &pk_sets).unwrap());
    }

    #[test]
    fn test_aggregate_verify_length_mismatch() {
        let k1 = seeded(1);
        let sig = k1.sign(b"a");
        let result = aggregate_verify(&[b"a".to_vec()], true, &sig.to_bytes(), &[]);
        assert!(matches!(result, Err(SignerError::LengthMismatch { .. })));
    }

    #[test]
    fn test_proof_of_possession() {
        let sk = seeded(9);
        let other = seeded(10);
        let proof = prove_possession(&sk);

        assert!(verify_possession(&sk.public_key(), &proof));
        assert!(!verify_possession(&other.public_key(), &proof));

        // A vote-suite signature over the key bytes is not a valid proof
        let forged = sk.sign(&sk.public_key().to_bytes());
        assert!(!verify_possession(&sk.public_key(), &forged));
    }
}
