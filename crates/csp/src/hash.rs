//! Hash-source algorithms and digest values.

use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::{alphabet, Engine as _};
use sha2::{Digest, Sha256, Sha384, Sha512};

/// Upper bound on a decoded digest. SHA-512 produces 64 bytes; anything
/// longer cannot be a digest we know how to compare.
pub const MAX_DIGEST_BYTES: usize = 64;

/// Hash-source values may carry 0-2 `=` padding characters, so decoding must
/// accept padded and unpadded input alike.
const BASE64_FORGIVING: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Digest algorithms a hash source may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashAlgorithm {
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Bit for this algorithm in a used-algorithms mask, so callers can skip
    /// digesting content when no hash source mentions the algorithm.
    pub fn bit(self) -> u8 {
        match self {
            HashAlgorithm::Sha1 => 1 << 0,
            HashAlgorithm::Sha256 => 1 << 1,
            HashAlgorithm::Sha384 => 1 << 2,
            HashAlgorithm::Sha512 => 1 << 3,
        }
    }
}

/// Recognized hash-source prefixes. The hyphenated spellings are synonyms
/// kept for compatibility with policies written against older drafts.
pub(crate) const SUPPORTED_HASH_PREFIXES: [(&str, HashAlgorithm); 7] = [
    ("sha256-", HashAlgorithm::Sha256),
    ("sha384-", HashAlgorithm::Sha384),
    ("sha512-", HashAlgorithm::Sha512),
    ("sha-256-", HashAlgorithm::Sha256),
    ("sha-384-", HashAlgorithm::Sha384),
    ("sha-512-", HashAlgorithm::Sha512),
    ("sha1-", HashAlgorithm::Sha1),
];

/// One (algorithm, digest) pair from a hash source, or computed from inline
/// content for comparison against a policy's hash sources.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CspHashValue {
    algorithm: HashAlgorithm,
    digest: Vec<u8>,
}

impl CspHashValue {
    pub fn new(algorithm: HashAlgorithm, digest: Vec<u8>) -> Self {
        Self { algorithm, digest }
    }

    /// Digest `content` with `algorithm`. Returns `None` for SHA-1, which is
    /// accepted in policies but which we refuse to compute for new content;
    /// callers holding a SHA-1 digest can still construct the value directly.
    pub fn from_content(algorithm: HashAlgorithm, content: &[u8]) -> Option<Self> {
        let digest = match algorithm {
            HashAlgorithm::Sha1 => return None,
            HashAlgorithm::Sha256 => Sha256::digest(content).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(content).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(content).to_vec(),
        };
        Some(Self { algorithm, digest })
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn digest(&self) -> &[u8] {
        &self.digest
    }
}

/// Decode a base64 hash value, tolerating the URL-safe alphabet and absent
/// padding. `None` means the value is not valid base64.
pub(crate) fn decode_hash_value(value: &str) -> Option<Vec<u8>> {
    let normalized: String = value
        .chars()
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    BASE64_FORGIVING.decode(normalized).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_accepts_padded_and_unpadded() {
        assert_eq!(decode_hash_value("aGk=").unwrap(), b"hi");
        assert_eq!(decode_hash_value("aGk").unwrap(), b"hi");
        assert!(decode_hash_value("a").is_none());
        assert!(decode_hash_value("ab cd").is_none());
    }

    #[test]
    fn test_decode_accepts_url_safe_alphabet() {
        // '-' and '_' decode as '+' and '/'.
        assert_eq!(decode_hash_value("-_8"), decode_hash_value("+/8"));
    }

    #[test]
    fn test_from_content_digest_lengths() {
        let content = b"alert('hi');";
        let sha256 = CspHashValue::from_content(HashAlgorithm::Sha256, content).unwrap();
        assert_eq!(sha256.digest().len(), 32);
        let sha384 = CspHashValue::from_content(HashAlgorithm::Sha384, content).unwrap();
        assert_eq!(sha384.digest().len(), 48);
        let sha512 = CspHashValue::from_content(HashAlgorithm::Sha512, content).unwrap();
        assert_eq!(sha512.digest().len(), 64);
        assert!(CspHashValue::from_content(HashAlgorithm::Sha1, content).is_none());
    }

    #[test]
    fn test_algorithm_bits_are_distinct() {
        let algorithms = [
            HashAlgorithm::Sha1,
            HashAlgorithm::Sha256,
            HashAlgorithm::Sha384,
            HashAlgorithm::Sha512,
        ];
        let mut mask = 0u8;
        for algorithm in algorithms {
            assert_eq!(mask & algorithm.bit(), 0);
            mask |= algorithm.bit();
        }
    }
}
