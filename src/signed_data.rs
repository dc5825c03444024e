//! `SignedData` and the signing flow.

use std::time::SystemTime;

use const_oid::ObjectIdentifier;
use der::{
    asn1::{Any, GeneralizedTime, OctetString, OctetStringRef, UtcTime},
    DateTime, DecodeValue, Encode, EncodeValue, Header, Length, Reader, Sequence, Tag,
    Tagged, TagNumber, Writer,
};
use rand_core::{CryptoRngCore, OsRng};
use spki::{AlgorithmIdentifierOwned, SubjectPublicKeyInfoOwned};
use tracing::{debug, trace};
use x509_cert::{time::Time, Certificate};

use crate::{
    attr::{Attribute, Attributes},
    content_info::{CmsVersion, ContentInfo, EncapsulatedContentInfo},
    encoding,
    errors::{Error, Result},
    oid::{
        self, HashAlgorithm, ID_CONTENT_TYPE, ID_EC_PUBLIC_KEY, ID_MESSAGE_DIGEST,
        ID_SIGNED_DATA, ID_SIGNING_TIME, SECP384R1, SECP521R1,
    },
    signer::CmsSigner,
    signer_info::{IssuerAndSerialNumber, SignerInfo},
};

const CERTIFICATES_TAG: Tag = Tag::ContextSpecific {
    constructed: true,
    number: TagNumber::N0,
};

const CRLS_TAG: Tag = Tag::ContextSpecific {
    constructed: true,
    number: TagNumber::N1,
};

/// Last year a signing time is written as `UTCTime`.
const UTC_TIME_MAX_YEAR: u16 = 2049;

/// Tunables for [`SignedData::add_signer_info_with`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SigningOptions {
    /// Digest to use instead of the one chosen from the signer's public key.
    pub digest_algorithm: Option<HashAlgorithm>,

    /// Signing time to record instead of the current time.
    pub signing_time: Option<SystemTime>,
}

/// Digest chosen for a signer's public key: SHA-384 for P-384, SHA-512 for
/// P-521, SHA-256 otherwise.
pub fn default_digest_algorithm(public_key: &SubjectPublicKeyInfoOwned) -> HashAlgorithm {
    if public_key.algorithm.oid != ID_EC_PUBLIC_KEY {
        return HashAlgorithm::Sha256;
    }
    let curve = public_key
        .algorithm
        .parameters
        .as_ref()
        .and_then(|params| params.decode_as::<ObjectIdentifier>().ok());
    match curve {
        Some(curve) if curve == SECP384R1 => HashAlgorithm::Sha384,
        Some(curve) if curve == SECP521R1 => HashAlgorithm::Sha512,
        _ => HashAlgorithm::Sha256,
    }
}

/// ```text
/// SignedData ::= SEQUENCE {
///     version CMSVersion,
///     digestAlgorithms DigestAlgorithmIdentifiers,
///     encapContentInfo EncapsulatedContentInfo,
///     certificates [0] IMPLICIT CertificateSet OPTIONAL,
///     crls [1] IMPLICIT RevocationInfoChoices OPTIONAL,
///     signerInfos SignerInfos }
/// ```
///
/// The `SET OF` fields keep the order they were received or added in and
/// are sorted by encoding when written.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignedData {
    /// Syntax version.
    pub version: CmsVersion,

    /// Digest algorithms used by the signers.
    pub digest_algorithms: Vec<AlgorithmIdentifierOwned>,

    /// Signed content.
    pub encap_content_info: EncapsulatedContentInfo,

    /// Certificate choices, undecoded. `None` when the field is absent.
    pub certificates: Option<Vec<Any>>,

    /// Revocation information, undecoded.
    pub crls: Option<Vec<Any>>,

    /// Signers.
    pub signer_infos: Vec<SignerInfo>,
}

impl SignedData {
    /// Empty `SignedData` around `encap_content_info`.
    ///
    /// The version is 1 for `id-data` content and 3 otherwise.
    pub fn new(encap_content_info: EncapsulatedContentInfo) -> Self {
        let version = if encap_content_info.is_type_data() {
            CmsVersion::V1
        } else {
            CmsVersion::V3
        };
        Self {
            version,
            digest_algorithms: Vec::new(),
            encap_content_info,
            certificates: None,
            crls: None,
            signer_infos: Vec::new(),
        }
    }

    /// Parse a BER or DER `ContentInfo` holding `SignedData`.
    pub fn from_ber(ber: &[u8]) -> Result<Self> {
        ContentInfo::parse(ber)?.signed_data_content()
    }

    /// Add `cert` to the certificate set.
    pub fn add_certificate(&mut self, cert: &Certificate) -> Result<()> {
        let cert = Any::encode_from(cert)?;
        let certificates = self.certificates.get_or_insert_with(Vec::new);
        if certificates.contains(&cert) {
            return Err(Error::DuplicateCertificate);
        }
        certificates.push(cert);
        Ok(())
    }

    /// Empty the certificate set, leaving the field present.
    pub fn clear_certificates(&mut self) {
        self.certificates = Some(Vec::new());
    }

    /// Drop the encapsulated content, producing a detached signature.
    pub fn detach(&mut self) {
        self.encap_content_info.econtent = None;
    }

    /// Sign the content with `signer`, using the operating system RNG and default options.
    ///
    /// See [`SignedData::add_signer_info_with`].
    pub fn add_signer_info<S>(&mut self, chain: &[Certificate], signer: &S) -> Result<()>
    where
        S: CmsSigner + ?Sized,
    {
        self.add_signer_info_with(chain, signer, &SigningOptions::default(), &mut OsRng)
    }

    /// Sign the content with `signer` and record a new signer info.
    ///
    /// `chain` must contain the certificate of `signer`'s public key; all of
    /// its certificates are added to the certificate set, and one that is
    /// already present fails with [`Error::DuplicateCertificate`].
    /// Signed attributes carry the content type, the content digest, and the
    /// signing time. Nothing is modified if any step fails.
    pub fn add_signer_info_with<S, R>(
        &mut self,
        chain: &[Certificate],
        signer: &S,
        options: &SigningOptions,
        rng: &mut R,
    ) -> Result<()>
    where
        S: CmsSigner + ?Sized,
        R: CryptoRngCore,
    {
        let chain_certificates = chain
            .iter()
            .map(Any::encode_from)
            .collect::<der::Result<Vec<_>>>()?;
        let certificates = self.certificates.as_deref().unwrap_or_default();
        for (i, cert) in chain_certificates.iter().enumerate() {
            if certificates.contains(cert) || chain_certificates[..i].contains(cert) {
                return Err(Error::DuplicateCertificate);
            }
        }

        let public_key = signer.public_key()?;
        let cert = find_signer_certificate(chain, &public_key)?;
        let sid = Any::encode_from(&IssuerAndSerialNumber::from_certificate(cert)?)?;

        let hash = options
            .digest_algorithm
            .unwrap_or_else(|| default_digest_algorithm(&public_key));
        let key_algorithm = &cert.tbs_certificate.subject_public_key_info.algorithm.oid;
        let signature_algorithm = oid::signature_algorithm_oid(key_algorithm, hash)
            .ok_or(Error::UnsupportedPublicKey)?;

        let content = self
            .encap_content_info
            .econtent_value()?
            .ok_or(Error::Detached)?;
        let message_digest = hash.digest(&content)?;
        let signing_time =
            encode_signing_time(options.signing_time.unwrap_or_else(SystemTime::now))?;

        let mut signed_attrs = Attributes::from(vec![
            Attribute::new(ID_SIGNING_TIME, &signing_time)?,
            Attribute::new(ID_MESSAGE_DIGEST, &OctetStringRef::new(&message_digest)?)?,
            Attribute::new(ID_CONTENT_TYPE, &self.encap_content_info.econtent_type)?,
        ]);
        signed_attrs.sort()?;

        let digest = hash.digest(&signed_attrs.marshaled_for_signing()?)?;
        let signature = signer.sign_digest(rng, &digest, hash)?;
        debug!(
            digest = ?hash,
            signature_algorithm = %signature_algorithm,
            "signed content"
        );

        let signer_info = SignerInfo {
            version: CmsVersion::V1,
            sid,
            digest_algorithm: hash.algorithm_identifier(),
            signed_attrs: Some(signed_attrs),
            signature_algorithm: AlgorithmIdentifierOwned {
                oid: signature_algorithm,
                parameters: None,
            },
            signature: OctetString::new(signature)?,
            unsigned_attrs: None,
        };

        self.certificates
            .get_or_insert_with(Vec::new)
            .extend(chain_certificates);
        self.add_digest_algorithm(hash.algorithm_identifier());
        self.signer_infos.push(signer_info);
        Ok(())
    }

    fn add_digest_algorithm(&mut self, algorithm: AlgorithmIdentifierOwned) {
        if !self
            .digest_algorithms
            .iter()
            .any(|known| known.oid == algorithm.oid)
        {
            self.digest_algorithms.push(algorithm);
        }
    }

    /// Decode the certificate set as X.509 certificates.
    ///
    /// Returns `Ok(None)` when the field is absent.
    pub fn x509_certificates(&self) -> Result<Option<Vec<Certificate>>> {
        let Some(certificates) = &self.certificates else {
            return Ok(None);
        };
        certificates
            .iter()
            .map(|raw| -> Result<Certificate> {
                if raw.tag() != Tag::Sequence {
                    return Err(Error::UnsupportedCertificate);
                }
                Ok(raw.decode_as::<Certificate>()?)
            })
            .collect::<Result<Vec<_>>>()
            .map(Some)
    }

    /// Wrap in a `ContentInfo` of type `id-signedData`.
    pub fn content_info(&self) -> Result<ContentInfo> {
        Ok(ContentInfo {
            content_type: ID_SIGNED_DATA,
            content: Any::encode_from(self)?,
        })
    }

    /// DER encoding of [`SignedData::content_info`].
    pub fn content_info_der(&self) -> Result<Vec<u8>> {
        let der = self.content_info()?.to_der()?;
        trace!(len = der.len(), "encoded SignedData");
        Ok(der)
    }
}

fn find_signer_certificate<'c>(
    chain: &'c [Certificate],
    public_key: &SubjectPublicKeyInfoOwned,
) -> Result<&'c Certificate> {
    let public_key = public_key.to_der()?;
    for cert in chain {
        if cert.tbs_certificate.subject_public_key_info.to_der()? == public_key {
            return Ok(cert);
        }
    }
    debug!(chain_len = chain.len(), "no certificate for signer public key");
    Err(Error::NoCertificate)
}

fn encode_signing_time(now: SystemTime) -> Result<Time> {
    let date_time = DateTime::from_system_time(now)?;
    if date_time.year() <= UTC_TIME_MAX_YEAR {
        Ok(UtcTime::from_date_time(date_time)?.into())
    } else {
        Ok(GeneralizedTime::from_date_time(date_time).into())
    }
}

impl<'a> DecodeValue<'a> for SignedData {
    fn decode_value<R: Reader<'a>>(reader: &mut R, header: Header) -> der::Result<Self> {
        reader.read_nested(header.length, |reader| {
            let version = reader.decode()?;
            let digest_algorithms = encoding::decode_set(reader)?;
            let encap_content_info = reader.decode()?;
            let certificates = encoding::decode_implicit_set(reader, CERTIFICATES_TAG)?;
            let crls = encoding::decode_implicit_set(reader, CRLS_TAG)?;
            let signer_infos = encoding::decode_set(reader)?;
            Ok(Self {
                version,
                digest_algorithms,
                encap_content_info,
                certificates,
                crls,
                signer_infos,
            })
        })
    }
}

impl EncodeValue for SignedData {
    fn value_len(&self) -> der::Result<Length> {
        self.version.encoded_len()?
            + encoding::set_len(&self.digest_algorithms)?
            + self.encap_content_info.encoded_len()?
            + encoding::optional_set_len(&self.certificates)?
            + encoding::optional_set_len(&self.crls)?
            + encoding::set_len(&self.signer_infos)?
    }

    fn encode_value(&self, writer: &mut impl Writer) -> der::Result<()> {
        self.version.encode(writer)?;
        encoding::encode_sorted_set(&self.digest_algorithms, Tag::Set, writer)?;
        self.encap_content_info.encode(writer)?;
        if let Some(certificates) = &self.certificates {
            encoding::encode_sorted_set(certificates, CERTIFICATES_TAG, writer)?;
        }
        if let Some(crls) = &self.crls {
            encoding::encode_sorted_set(crls, CRLS_TAG, writer)?;
        }
        encoding::encode_sorted_set(&self.signer_infos, Tag::Set, writer)
    }
}

impl<'a> Sequence<'a> for SignedData {}
