//! Signing keys.

use rand_core::CryptoRngCore;
use spki::SubjectPublicKeyInfoOwned;

use crate::{errors::Result, oid::HashAlgorithm};

/// A private key able to sign a precomputed digest.
///
/// Implemented for [`rsa::RsaPrivateKey`] (PKCS#1 v1.5) and the ECDSA
/// signing keys of [`p256`] and [`p384`] when the matching features are
/// enabled. Other keys, such as ones held in hardware, can implement it
/// directly.
pub trait CmsSigner {
    /// Public key, used to find the signer's certificate.
    fn public_key(&self) -> Result<SubjectPublicKeyInfoOwned>;

    /// Sign `digest`, which was computed with `hash`.
    fn sign_digest(
        &self,
        rng: &mut dyn CryptoRngCore,
        digest: &[u8],
        hash: HashAlgorithm,
    ) -> Result<Vec<u8>>;
}

/// Subject public key info of any key that can encode one.
#[cfg(any(feature = "rsa", feature = "p256", feature = "p384"))]
fn subject_public_key_info<K: spki::EncodePublicKey>(
    key: &K,
) -> Result<SubjectPublicKeyInfoOwned> {
    use der::Decode;

    let der = key.to_public_key_der()?;
    Ok(SubjectPublicKeyInfoOwned::from_der(der.as_bytes())?)
}

#[cfg(feature = "rsa")]
pub(crate) fn pkcs1v15_padding(hash: HashAlgorithm) -> Result<rsa::Pkcs1v15Sign> {
    use rsa::Pkcs1v15Sign;

    match hash {
        HashAlgorithm::Sha1 => {
            #[cfg(feature = "sha1")]
            return Ok(Pkcs1v15Sign::new::<sha1::Sha1>());
            #[cfg(not(feature = "sha1"))]
            return Err(crate::Error::UnsupportedAlgorithm(hash.oid()));
        }
        HashAlgorithm::Sha256 => Ok(Pkcs1v15Sign::new::<sha2::Sha256>()),
        HashAlgorithm::Sha384 => Ok(Pkcs1v15Sign::new::<sha2::Sha384>()),
        HashAlgorithm::Sha512 => Ok(Pkcs1v15Sign::new::<sha2::Sha512>()),
    }
}

#[cfg(feature = "rsa")]
impl CmsSigner for rsa::RsaPrivateKey {
    fn public_key(&self) -> Result<SubjectPublicKeyInfoOwned> {
        subject_public_key_info(&self.to_public_key())
    }

    fn sign_digest(
        &self,
        mut rng: &mut dyn CryptoRngCore,
        digest: &[u8],
        hash: HashAlgorithm,
    ) -> Result<Vec<u8>> {
        self.sign_with_rng(&mut rng, pkcs1v15_padding(hash)?, digest)
            .map_err(|err| signature::Error::from_source(err).into())
    }
}

// ECDSA signatures are deterministic (RFC 6979), so `rng` goes unused.
#[cfg(any(feature = "p256", feature = "p384"))]
macro_rules! impl_ecdsa_signer {
    ($curve:ident) => {
        impl CmsSigner for $curve::ecdsa::SigningKey {
            fn public_key(&self) -> Result<SubjectPublicKeyInfoOwned> {
                subject_public_key_info(&$curve::PublicKey::from(self.verifying_key()))
            }

            fn sign_digest(
                &self,
                _rng: &mut dyn CryptoRngCore,
                digest: &[u8],
                _hash: HashAlgorithm,
            ) -> Result<Vec<u8>> {
                use signature::hazmat::PrehashSigner;

                let signature: $curve::ecdsa::Signature = self.sign_prehash(digest)?;
                Ok(signature.to_der().as_bytes().to_vec())
            }
        }
    };
}

#[cfg(feature = "p256")]
impl_ecdsa_signer!(p256);
#[cfg(feature = "p384")]
impl_ecdsa_signer!(p384);
