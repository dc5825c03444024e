//! Signature verification.
//!
//! Signers are bound to certificates carried in the `SignedData` itself.
//! Certificate paths are not validated.

use const_oid::ObjectIdentifier;
use der::Encode;
use spki::SubjectPublicKeyInfoOwned;
use tracing::debug;
use x509_cert::Certificate;

use crate::{
    errors::{Error, Result},
    oid::{SignatureAlgorithm, ID_DATA, ID_EC_PUBLIC_KEY, RSA_ENCRYPTION},
    signed_data::SignedData,
    signer_info::SignerInfo,
};

impl SignerInfo {
    /// Check this signer's signature over `content` of type `econtent_type`
    /// with the public key of `cert`.
    ///
    /// With signed attributes present, the content-type and message-digest
    /// attributes must match the content and the signature covers the
    /// attributes. Without them, only `id-data` content is accepted and the
    /// signature covers the content digest directly.
    pub fn verify(
        &self,
        cert: &Certificate,
        econtent_type: &ObjectIdentifier,
        content: &[u8],
    ) -> Result<()> {
        let hash = self.hash()?;
        let algorithm = self.x509_signature_algorithm();
        let signature_hash = algorithm
            .hash()
            .ok_or(Error::UnsupportedAlgorithm(self.signature_algorithm.oid))?;

        let signed = match &self.signed_attrs {
            Some(attrs) => {
                if self.content_type_attribute()? != *econtent_type {
                    return Err(Error::ContentTypeMismatch);
                }
                if self.message_digest_attribute()? != hash.digest(content)? {
                    return Err(Error::DigestMismatch);
                }
                attrs.marshaled_for_verification()?
            }
            None if *econtent_type == ID_DATA => content.to_vec(),
            None => return Err(Error::MissingAttributes),
        };

        let digest = signature_hash.digest(&signed)?;
        verify_digest(
            algorithm,
            &cert.tbs_certificate.subject_public_key_info,
            &digest,
            self.signature.as_bytes(),
        )
    }
}

impl SignedData {
    /// Verify every signer over the embedded content.
    ///
    /// Returns the certificate of each signer, in signer order.
    pub fn verify(&self) -> Result<Vec<Certificate>> {
        let content = self
            .encap_content_info
            .econtent_value()?
            .ok_or(Error::Detached)?;
        self.verify_content(&content)
    }

    /// Verify every signer over `content` supplied by the caller.
    ///
    /// Any embedded content is ignored.
    pub fn verify_detached(&self, content: &[u8]) -> Result<Vec<Certificate>> {
        self.verify_content(content)
    }

    fn verify_content(&self, content: &[u8]) -> Result<Vec<Certificate>> {
        if self.signer_infos.is_empty() {
            return Err(Error::NoSignerInfos);
        }
        let certs = self.x509_certificates()?.unwrap_or_default();
        let econtent_type = &self.encap_content_info.econtent_type;

        let mut signers = Vec::with_capacity(self.signer_infos.len());
        for (index, signer_info) in self.signer_infos.iter().enumerate() {
            let cert = signer_info.find_certificate(&certs)?;
            if let Err(err) = signer_info.verify(cert, econtent_type, content) {
                debug!(signer = index, error = %err, "signer verification failed");
                return Err(err);
            }
            signers.push(cert.clone());
        }
        Ok(signers)
    }
}

fn verify_digest(
    algorithm: SignatureAlgorithm,
    public_key: &SubjectPublicKeyInfoOwned,
    digest: &[u8],
    signature: &[u8],
) -> Result<()> {
    if algorithm.public_key_algorithm() != Some(public_key.algorithm.oid) {
        return Err(Error::UnsupportedPublicKey);
    }
    let public_key_der = public_key.to_der()?;

    if public_key.algorithm.oid == RSA_ENCRYPTION {
        verify_rsa(&public_key_der, algorithm, digest, signature)
    } else if public_key.algorithm.oid == ID_EC_PUBLIC_KEY {
        verify_ecdsa(public_key, &public_key_der, digest, signature)
    } else {
        Err(Error::UnsupportedPublicKey)
    }
}

#[cfg(feature = "rsa")]
fn verify_rsa(
    public_key_der: &[u8],
    algorithm: SignatureAlgorithm,
    digest: &[u8],
    signature: &[u8],
) -> Result<()> {
    use rsa::{pkcs8::DecodePublicKey, RsaPublicKey};

    let hash = algorithm.hash().ok_or(Error::UnsupportedPublicKey)?;
    let key = RsaPublicKey::from_public_key_der(public_key_der)?;
    key.verify(crate::signer::pkcs1v15_padding(hash)?, digest, signature)
        .map_err(|_| Error::Verification)
}

#[cfg(not(feature = "rsa"))]
fn verify_rsa(
    _public_key_der: &[u8],
    _algorithm: SignatureAlgorithm,
    _digest: &[u8],
    _signature: &[u8],
) -> Result<()> {
    Err(Error::UnsupportedPublicKey)
}

#[cfg(any(feature = "p256", feature = "p384"))]
macro_rules! verify_ecdsa_with {
    ($curve:ident, $public_key_der:expr, $digest:expr, $signature:expr) => {{
        use $curve::{
            ecdsa::{Signature, VerifyingKey},
            pkcs8::DecodePublicKey,
        };
        use signature::hazmat::PrehashVerifier;

        let key = VerifyingKey::from_public_key_der($public_key_der)?;
        let signature = Signature::from_der($signature).map_err(|_| Error::Verification)?;
        key.verify_prehash($digest, &signature)
            .map_err(|_| Error::Verification)
    }};
}

#[allow(unused_variables)]
fn verify_ecdsa(
    public_key: &SubjectPublicKeyInfoOwned,
    public_key_der: &[u8],
    digest: &[u8],
    signature: &[u8],
) -> Result<()> {
    let curve = public_key
        .algorithm
        .parameters
        .as_ref()
        .ok_or(Error::UnsupportedPublicKey)?
        .decode_as::<ObjectIdentifier>()?;

    #[cfg(feature = "p256")]
    if curve == crate::oid::SECP256R1 {
        return verify_ecdsa_with!(p256, public_key_der, digest, signature);
    }
    #[cfg(feature = "p384")]
    if curve == crate::oid::SECP384R1 {
        return verify_ecdsa_with!(p384, public_key_der, digest, signature);
    }
    debug!(%curve, "no verifier for curve");
    Err(Error::UnsupportedPublicKey)
}
