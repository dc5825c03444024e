//! Object identifiers and the algorithm tables keyed by them.

use const_oid::ObjectIdentifier;
use digest::Digest;
use sha2::{Sha256, Sha384, Sha512};
use spki::AlgorithmIdentifierOwned;

use crate::errors::Result;

/// `id-data`
pub const ID_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.1");
/// `id-signedData`
pub const ID_SIGNED_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.2");
/// `id-contentType` attribute
pub const ID_CONTENT_TYPE: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.3");
/// `id-messageDigest` attribute
pub const ID_MESSAGE_DIGEST: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.4");
/// `id-signingTime` attribute
pub const ID_SIGNING_TIME: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.5");
/// `id-ce-subjectKeyIdentifier` certificate extension
pub const ID_CE_SUBJECT_KEY_IDENTIFIER: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("2.5.29.14");

/// `rsaEncryption`
pub const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");
/// `sha1WithRSAEncryption`
pub const SHA1_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.5");
/// `sha256WithRSAEncryption`
pub const SHA256_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.11");
/// `sha384WithRSAEncryption`
pub const SHA384_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.12");
/// `sha512WithRSAEncryption`
pub const SHA512_WITH_RSA_ENCRYPTION: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.13");

/// `id-ecPublicKey`
pub const ID_EC_PUBLIC_KEY: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.2.1");
/// `ecdsa-with-SHA1`
pub const ECDSA_WITH_SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.4.1");
/// `ecdsa-with-SHA256`
pub const ECDSA_WITH_SHA256: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.2");
/// `ecdsa-with-SHA384`
pub const ECDSA_WITH_SHA384: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.3");
/// `ecdsa-with-SHA512`
pub const ECDSA_WITH_SHA512: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.2.840.10045.4.3.4");

/// `secp256r1` (NIST P-256)
pub const SECP256R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.10045.3.1.7");
/// `secp384r1` (NIST P-384)
pub const SECP384R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.34");
/// `secp521r1` (NIST P-521)
pub const SECP521R1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.132.0.35");

/// `id-sha1`
pub const ID_SHA1: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.3.14.3.2.26");
/// `id-sha256`
pub const ID_SHA256: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.1");
/// `id-sha384`
pub const ID_SHA384: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.2");
/// `id-sha512`
pub const ID_SHA512: ObjectIdentifier = ObjectIdentifier::new_unwrap("2.16.840.1.101.3.4.2.3");

/// Digest algorithms usable for signed attributes and message digests.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum HashAlgorithm {
    /// SHA-1, only with the `sha1` feature.
    Sha1,
    /// SHA-256
    Sha256,
    /// SHA-384
    Sha384,
    /// SHA-512
    Sha512,
}

const DIGEST_ALGORITHMS: [(ObjectIdentifier, HashAlgorithm); 4] = [
    (ID_SHA1, HashAlgorithm::Sha1),
    (ID_SHA256, HashAlgorithm::Sha256),
    (ID_SHA384, HashAlgorithm::Sha384),
    (ID_SHA512, HashAlgorithm::Sha512),
];

impl HashAlgorithm {
    /// Look up a digest algorithm by its OID.
    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        DIGEST_ALGORITHMS
            .iter()
            .find(|(known, _)| known == oid)
            .map(|(_, hash)| *hash)
    }

    /// OID identifying this digest algorithm.
    pub const fn oid(self) -> ObjectIdentifier {
        match self {
            HashAlgorithm::Sha1 => ID_SHA1,
            HashAlgorithm::Sha256 => ID_SHA256,
            HashAlgorithm::Sha384 => ID_SHA384,
            HashAlgorithm::Sha512 => ID_SHA512,
        }
    }

    /// `AlgorithmIdentifier` with absent parameters.
    pub fn algorithm_identifier(self) -> AlgorithmIdentifierOwned {
        AlgorithmIdentifierOwned {
            oid: self.oid(),
            parameters: None,
        }
    }

    /// Digest length in bytes.
    pub const fn output_size(self) -> usize {
        match self {
            HashAlgorithm::Sha1 => 20,
            HashAlgorithm::Sha256 => 32,
            HashAlgorithm::Sha384 => 48,
            HashAlgorithm::Sha512 => 64,
        }
    }

    /// Is an implementation of this algorithm compiled in?
    pub const fn is_available(self) -> bool {
        match self {
            HashAlgorithm::Sha1 => cfg!(feature = "sha1"),
            _ => true,
        }
    }

    /// Hash `data` in one shot.
    pub fn digest(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            HashAlgorithm::Sha1 => {
                #[cfg(feature = "sha1")]
                return Ok(sha1::Sha1::digest(data).to_vec());
                #[cfg(not(feature = "sha1"))]
                return Err(crate::Error::UnsupportedAlgorithm(ID_SHA1));
            }
            HashAlgorithm::Sha256 => Ok(Sha256::digest(data).to_vec()),
            HashAlgorithm::Sha384 => Ok(Sha384::digest(data).to_vec()),
            HashAlgorithm::Sha512 => Ok(Sha512::digest(data).to_vec()),
        }
    }
}

/// Signature algorithms, named the way X.509 names them.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SignatureAlgorithm {
    /// No known algorithm.
    Unknown,
    /// `sha1WithRSAEncryption`
    Sha1WithRsa,
    /// `sha256WithRSAEncryption`
    Sha256WithRsa,
    /// `sha384WithRSAEncryption`
    Sha384WithRsa,
    /// `sha512WithRSAEncryption`
    Sha512WithRsa,
    /// `ecdsa-with-SHA1`
    EcdsaWithSha1,
    /// `ecdsa-with-SHA256`
    EcdsaWithSha256,
    /// `ecdsa-with-SHA384`
    EcdsaWithSha384,
    /// `ecdsa-with-SHA512`
    EcdsaWithSha512,
}

const SIGNATURE_ALGORITHMS: [(ObjectIdentifier, SignatureAlgorithm); 8] = [
    (SHA1_WITH_RSA_ENCRYPTION, SignatureAlgorithm::Sha1WithRsa),
    (SHA256_WITH_RSA_ENCRYPTION, SignatureAlgorithm::Sha256WithRsa),
    (SHA384_WITH_RSA_ENCRYPTION, SignatureAlgorithm::Sha384WithRsa),
    (SHA512_WITH_RSA_ENCRYPTION, SignatureAlgorithm::Sha512WithRsa),
    (ECDSA_WITH_SHA1, SignatureAlgorithm::EcdsaWithSha1),
    (ECDSA_WITH_SHA256, SignatureAlgorithm::EcdsaWithSha256),
    (ECDSA_WITH_SHA384, SignatureAlgorithm::EcdsaWithSha384),
    (ECDSA_WITH_SHA512, SignatureAlgorithm::EcdsaWithSha512),
];

// Producers sometimes put the bare public key algorithm in
// `signatureAlgorithm`; the digest algorithm then names the hash.
const PUBLIC_KEY_AND_DIGEST_ALGORITHMS: [(ObjectIdentifier, HashAlgorithm, SignatureAlgorithm); 8] = [
    (RSA_ENCRYPTION, HashAlgorithm::Sha1, SignatureAlgorithm::Sha1WithRsa),
    (RSA_ENCRYPTION, HashAlgorithm::Sha256, SignatureAlgorithm::Sha256WithRsa),
    (RSA_ENCRYPTION, HashAlgorithm::Sha384, SignatureAlgorithm::Sha384WithRsa),
    (RSA_ENCRYPTION, HashAlgorithm::Sha512, SignatureAlgorithm::Sha512WithRsa),
    (ID_EC_PUBLIC_KEY, HashAlgorithm::Sha1, SignatureAlgorithm::EcdsaWithSha1),
    (ID_EC_PUBLIC_KEY, HashAlgorithm::Sha256, SignatureAlgorithm::EcdsaWithSha256),
    (ID_EC_PUBLIC_KEY, HashAlgorithm::Sha384, SignatureAlgorithm::EcdsaWithSha384),
    (ID_EC_PUBLIC_KEY, HashAlgorithm::Sha512, SignatureAlgorithm::EcdsaWithSha512),
];

impl SignatureAlgorithm {
    /// Look up a signature algorithm by its OID, yielding [`SignatureAlgorithm::Unknown`]
    /// when the OID is not a known signature algorithm.
    pub fn from_oid(oid: &ObjectIdentifier) -> Self {
        SIGNATURE_ALGORITHMS
            .iter()
            .find(|(known, _)| known == oid)
            .map_or(SignatureAlgorithm::Unknown, |(_, alg)| *alg)
    }

    /// Combine a public key algorithm OID with a digest algorithm OID.
    pub fn from_public_key_and_digest(
        public_key: &ObjectIdentifier,
        digest: &ObjectIdentifier,
    ) -> Self {
        let Some(hash) = HashAlgorithm::from_oid(digest) else {
            return SignatureAlgorithm::Unknown;
        };
        PUBLIC_KEY_AND_DIGEST_ALGORITHMS
            .iter()
            .find(|(key, h, _)| key == public_key && *h == hash)
            .map_or(SignatureAlgorithm::Unknown, |(_, _, alg)| *alg)
    }

    /// OID identifying this signature algorithm.
    pub fn oid(self) -> Option<ObjectIdentifier> {
        SIGNATURE_ALGORITHMS
            .iter()
            .find(|(_, alg)| *alg == self)
            .map(|(oid, _)| *oid)
    }

    /// Digest this algorithm signs with.
    pub fn hash(self) -> Option<HashAlgorithm> {
        PUBLIC_KEY_AND_DIGEST_ALGORITHMS
            .iter()
            .find(|(_, _, alg)| *alg == self)
            .map(|(_, hash, _)| *hash)
    }

    /// Public key algorithm this signature algorithm belongs to.
    pub fn public_key_algorithm(self) -> Option<ObjectIdentifier> {
        PUBLIC_KEY_AND_DIGEST_ALGORITHMS
            .iter()
            .find(|(_, _, alg)| *alg == self)
            .map(|(key, _, _)| *key)
    }
}

/// Signature algorithm OID to advertise for a key of type `public_key` signing with `hash`.
pub fn signature_algorithm_oid(
    public_key: &ObjectIdentifier,
    hash: HashAlgorithm,
) -> Option<ObjectIdentifier> {
    SignatureAlgorithm::from_public_key_and_digest(public_key, &hash.oid()).oid()
}
