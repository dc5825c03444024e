//! `SignerInfo` and the signer identifier choices.

use const_oid::ObjectIdentifier;
use der::{
    asn1::{Any, AnyRef, GeneralizedTime, OctetString, OctetStringRef, UtcTime},
    Decode, DecodeValue, Encode, EncodeValue, Header, Length, Reader, Sequence, Tag, Tagged,
    TagNumber, Writer,
};
use num_bigint::BigInt;
use spki::AlgorithmIdentifierOwned;
use x509_cert::{time::Time, Certificate};

use crate::{
    attr::Attributes,
    ber::Tlv,
    content_info::CmsVersion,
    encoding::{self, decode_exact},
    errors::{Error, Result},
    oid::{
        HashAlgorithm, SignatureAlgorithm, ID_CE_SUBJECT_KEY_IDENTIFIER, ID_CONTENT_TYPE,
        ID_MESSAGE_DIGEST, ID_SIGNING_TIME,
    },
};

const SIGNED_ATTRS_TAG: Tag = Tag::ContextSpecific {
    constructed: true,
    number: TagNumber::N0,
};

const UNSIGNED_ATTRS_TAG: Tag = Tag::ContextSpecific {
    constructed: true,
    number: TagNumber::N1,
};

/// ```text
/// IssuerAndSerialNumber ::= SEQUENCE {
///     issuer Name,
///     serialNumber CertificateSerialNumber }
/// ```
///
/// The serial number is held as an integer, so encodings which differ only
/// in leading padding compare equal.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IssuerAndSerialNumber {
    /// Issuer `Name`, undecoded.
    pub issuer: Any,

    /// Certificate serial number.
    pub serial_number: BigInt,
}

impl IssuerAndSerialNumber {
    /// Identify `cert` by its issuer and serial number.
    pub fn from_certificate(cert: &Certificate) -> Result<Self> {
        Ok(Self {
            issuer: Any::from_der(&cert.tbs_certificate.issuer.to_der()?)?,
            serial_number: certificate_serial_number(cert)?,
        })
    }

    fn serial_number_any(&self) -> der::Result<Any> {
        Any::new(Tag::Integer, self.serial_number.to_signed_bytes_be())
    }
}

impl<'a> DecodeValue<'a> for IssuerAndSerialNumber {
    fn decode_value<R: Reader<'a>>(reader: &mut R, header: Header) -> der::Result<Self> {
        reader.read_nested(header.length, |reader| {
            let issuer = reader.decode()?;
            let serial_number: AnyRef<'a> = reader.decode()?;
            serial_number.tag().assert_eq(Tag::Integer)?;
            if serial_number.value().is_empty() {
                return Err(Tag::Integer.value_error());
            }
            Ok(Self {
                issuer,
                serial_number: BigInt::from_signed_bytes_be(serial_number.value()),
            })
        })
    }
}

impl EncodeValue for IssuerAndSerialNumber {
    fn value_len(&self) -> der::Result<Length> {
        self.issuer.encoded_len()? + self.serial_number_any()?.encoded_len()?
    }

    fn encode_value(&self, writer: &mut impl Writer) -> der::Result<()> {
        self.issuer.encode(writer)?;
        self.serial_number_any()?.encode(writer)
    }
}

impl<'a> Sequence<'a> for IssuerAndSerialNumber {}

/// Decoded `SignerIdentifier` choice.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SignerIdentifier {
    /// `issuerAndSerialNumber`, used by version 1 signer infos.
    IssuerAndSerialNumber(IssuerAndSerialNumber),

    /// `[0] subjectKeyIdentifier`, used by version 3 signer infos.
    SubjectKeyIdentifier(Vec<u8>),
}

/// ```text
/// SignerInfo ::= SEQUENCE {
///     version CMSVersion,
///     sid SignerIdentifier,
///     digestAlgorithm DigestAlgorithmIdentifier,
///     signedAttrs [0] IMPLICIT SignedAttributes OPTIONAL,
///     signatureAlgorithm SignatureAlgorithmIdentifier,
///     signature SignatureValue,
///     unsignedAttrs [1] IMPLICIT UnsignedAttributes OPTIONAL }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SignerInfo {
    /// Syntax version: 1 with an issuer and serial number, 3 with a subject key identifier.
    pub version: CmsVersion,

    /// Signer identifier, undecoded; see [`SignerInfo::sid`].
    pub sid: Any,

    /// Digest algorithm applied to the content and signed attributes.
    pub digest_algorithm: AlgorithmIdentifierOwned,

    /// Signed attributes in received order.
    pub signed_attrs: Option<Attributes>,

    /// Signature algorithm.
    pub signature_algorithm: AlgorithmIdentifierOwned,

    /// Signature value.
    pub signature: OctetString,

    /// Unsigned attributes in received order.
    pub unsigned_attrs: Option<Attributes>,
}

impl SignerInfo {
    /// Decode the signer identifier according to the version.
    pub fn sid(&self) -> Result<SignerIdentifier> {
        match self.version {
            CmsVersion::V1 => self
                .issuer_and_serial_number_sid()
                .map(SignerIdentifier::IssuerAndSerialNumber),
            CmsVersion::V3 => self
                .subject_key_identifier_sid()
                .map(SignerIdentifier::SubjectKeyIdentifier),
            version => Err(Error::UnsupportedVersion(version)),
        }
    }

    /// Decode the signer identifier as an issuer and serial number.
    pub fn issuer_and_serial_number_sid(&self) -> Result<IssuerAndSerialNumber> {
        if self.sid.tag() != Tag::Sequence {
            return Err(Error::WrongType);
        }
        decode_exact(&self.sid.to_der()?)
    }

    /// Decode the signer identifier as a subject key identifier.
    pub fn subject_key_identifier_sid(&self) -> Result<Vec<u8>> {
        match self.sid.tag() {
            Tag::ContextSpecific { number, .. } if number == TagNumber::N0 => {
                Ok(self.sid.value().to_vec())
            }
            _ => Err(Error::WrongType),
        }
    }

    /// Find the certificate in `certs` this signer identifies.
    pub fn find_certificate<'c>(&self, certs: &'c [Certificate]) -> Result<&'c Certificate> {
        match self.sid()? {
            SignerIdentifier::IssuerAndSerialNumber(sid) => {
                let issuer = sid.issuer.to_der()?;
                for cert in certs {
                    if cert.tbs_certificate.issuer.to_der()? == issuer
                        && certificate_serial_number(cert)? == sid.serial_number
                    {
                        return Ok(cert);
                    }
                }
            }
            SignerIdentifier::SubjectKeyIdentifier(key_id) => {
                for cert in certs {
                    if certificate_key_identifiers(cert).any(|id| id == key_id.as_slice()) {
                        return Ok(cert);
                    }
                }
            }
        }
        Err(Error::NoCertificate)
    }

    /// Digest algorithm, if it is one this crate implements.
    pub fn hash(&self) -> Result<HashAlgorithm> {
        let oid = self.digest_algorithm.oid;
        HashAlgorithm::from_oid(&oid)
            .filter(|hash| hash.is_available())
            .ok_or(Error::UnsupportedAlgorithm(oid))
    }

    /// Signature algorithm in X.509 terms.
    ///
    /// A bare public key algorithm is combined with the digest algorithm.
    pub fn x509_signature_algorithm(&self) -> SignatureAlgorithm {
        match SignatureAlgorithm::from_oid(&self.signature_algorithm.oid) {
            SignatureAlgorithm::Unknown => SignatureAlgorithm::from_public_key_and_digest(
                &self.signature_algorithm.oid,
                &self.digest_algorithm.oid,
            ),
            known => known,
        }
    }

    /// Value of the content-type signed attribute.
    pub fn content_type_attribute(&self) -> Result<ObjectIdentifier> {
        let value = self.only_signed_attribute(&ID_CONTENT_TYPE)?;
        if value.tag() != Tag::ObjectIdentifier {
            return Err(Error::BadClassOrTag);
        }
        Ok(value.decode_as()?)
    }

    /// Value of the message-digest signed attribute.
    pub fn message_digest_attribute(&self) -> Result<Vec<u8>> {
        let value = self.only_signed_attribute(&ID_MESSAGE_DIGEST)?;
        if value.tag() != Tag::OctetString {
            return Err(Error::BadClassOrTag);
        }
        Ok(value.decode_as::<OctetStringRef<'_>>()?.as_bytes().to_vec())
    }

    /// Value of the signing-time signed attribute, or `None` when absent.
    pub fn signing_time_attribute(&self) -> Result<Option<Time>> {
        let present = self
            .signed_attrs
            .as_ref()
            .map_or(false, |attrs| attrs.has_attribute(&ID_SIGNING_TIME));
        if !present {
            return Ok(None);
        }

        let value = self.only_signed_attribute(&ID_SIGNING_TIME)?;
        match value.tag() {
            Tag::UtcTime => Ok(Some(value.decode_as::<UtcTime>()?.into())),
            Tag::GeneralizedTime => Ok(Some(value.decode_as::<GeneralizedTime>()?.into())),
            _ => Err(Error::BadClassOrTag),
        }
    }

    fn only_signed_attribute(&self, oid: &ObjectIdentifier) -> Result<Any> {
        match &self.signed_attrs {
            Some(attrs) => attrs.only_value(oid),
            None => Err(Error::BadAttributeCount),
        }
    }
}

impl<'a> DecodeValue<'a> for SignerInfo {
    fn decode_value<R: Reader<'a>>(reader: &mut R, header: Header) -> der::Result<Self> {
        reader.read_nested(header.length, |reader| {
            let version = reader.decode()?;
            let sid = reader.decode()?;
            let digest_algorithm = reader.decode()?;
            let signed_attrs = decode_implicit_attributes(reader, SIGNED_ATTRS_TAG)?;
            let signature_algorithm = reader.decode()?;
            let signature = reader.decode()?;
            let unsigned_attrs = decode_implicit_attributes(reader, UNSIGNED_ATTRS_TAG)?;
            Ok(Self {
                version,
                sid,
                digest_algorithm,
                signed_attrs,
                signature_algorithm,
                signature,
                unsigned_attrs,
            })
        })
    }
}

impl EncodeValue for SignerInfo {
    fn value_len(&self) -> der::Result<Length> {
        self.version.encoded_len()?
            + self.sid.encoded_len()?
            + self.digest_algorithm.encoded_len()?
            + encoding::implicit_len(&self.signed_attrs)?
            + self.signature_algorithm.encoded_len()?
            + self.signature.encoded_len()?
            + encoding::implicit_len(&self.unsigned_attrs)?
    }

    fn encode_value(&self, writer: &mut impl Writer) -> der::Result<()> {
        self.version.encode(writer)?;
        self.sid.encode(writer)?;
        self.digest_algorithm.encode(writer)?;
        encoding::encode_implicit(&self.signed_attrs, SIGNED_ATTRS_TAG, writer)?;
        self.signature_algorithm.encode(writer)?;
        self.signature.encode(writer)?;
        // unsigned attributes are sorted; signed ones keep stored order
        match &self.unsigned_attrs {
            Some(attrs) => attrs.encode_sorted(UNSIGNED_ATTRS_TAG, writer),
            None => Ok(()),
        }
    }
}

impl<'a> Sequence<'a> for SignerInfo {}

fn decode_implicit_attributes<'a, R: Reader<'a>>(
    reader: &mut R,
    tag: Tag,
) -> der::Result<Option<Attributes>> {
    if reader.is_finished() || reader.peek_tag()? != tag {
        return Ok(None);
    }
    let header = Header::decode(reader)?;
    Attributes::decode_value(reader, header).map(Some)
}

/// Serial number of `cert` read from its INTEGER encoding.
fn certificate_serial_number(cert: &Certificate) -> Result<BigInt> {
    let der = cert.tbs_certificate.serial_number.to_der()?;
    let (integer, _) = Tlv::parse(&der)?;
    Ok(BigInt::from_signed_bytes_be(integer.content))
}

/// Key identifiers from the subject key identifier extensions of `cert`.
///
/// Extensions whose value is not an OCTET STRING are skipped.
fn certificate_key_identifiers(cert: &Certificate) -> impl Iterator<Item = &[u8]> {
    cert.tbs_certificate
        .extensions
        .iter()
        .flatten()
        .filter(|extension| extension.extn_id == ID_CE_SUBJECT_KEY_IDENTIFIER)
        .filter_map(|extension| OctetStringRef::from_der(extension.extn_value.as_bytes()).ok())
        .map(|key_id| key_id.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        attr::Attribute,
        oid::{ID_DATA, ID_EC_PUBLIC_KEY, ID_SHA256, ID_SIGNED_DATA, RSA_ENCRYPTION},
    };
    use hex_literal::hex;
    use x509_cert::der::DecodePem;

    const RSA_CERT: &str = include_str!("../tests/examples/rsa2048.crt");
    const CA_CERT: &str = include_str!("../tests/examples/ca-p256.crt");
    const P256_CERT: &str = include_str!("../tests/examples/p256.crt");

    fn certs() -> Vec<Certificate> {
        [CA_CERT, RSA_CERT, P256_CERT]
            .iter()
            .map(|pem| Certificate::from_pem(pem).unwrap())
            .collect()
    }

    fn signer_info(version: CmsVersion, sid: Any) -> SignerInfo {
        SignerInfo {
            version,
            sid,
            digest_algorithm: AlgorithmIdentifierOwned {
                oid: ID_SHA256,
                parameters: None,
            },
            signed_attrs: None,
            signature_algorithm: AlgorithmIdentifierOwned {
                oid: RSA_ENCRYPTION,
                parameters: None,
            },
            signature: OctetString::new(vec![1, 2, 3]).unwrap(),
            unsigned_attrs: None,
        }
    }

    fn key_id_sid(key_id: &[u8]) -> Any {
        Any::new(
            Tag::ContextSpecific {
                constructed: false,
                number: TagNumber::N0,
            },
            key_id.to_vec(),
        )
        .unwrap()
    }

    #[test]
    fn issuer_and_serial_number_lookup() {
        let certs = certs();
        let sid = IssuerAndSerialNumber::from_certificate(&certs[1]).unwrap();
        assert_eq!(sid.serial_number, BigInt::from(0x8a1b2c3du64));
        let si = signer_info(CmsVersion::V1, Any::encode_from(&sid).unwrap());
        assert_eq!(si.find_certificate(&certs).unwrap(), &certs[1]);
        assert_eq!(
            si.sid().unwrap(),
            SignerIdentifier::IssuerAndSerialNumber(sid)
        );
    }

    #[test]
    fn padded_serial_number() {
        let certs = certs();
        let issuer = certs[2].tbs_certificate.issuer.to_der().unwrap();
        // serial 0x2a with a redundant leading zero
        let mut value = issuer.clone();
        value.extend_from_slice(&hex!("02 02 00 2a"));
        let sid = Any::new(Tag::Sequence, value).unwrap();
        let si = signer_info(CmsVersion::V1, sid);
        assert_eq!(si.find_certificate(&certs).unwrap(), &certs[2]);
    }

    #[test]
    fn subject_key_identifier_lookup() {
        let certs = certs();
        let key_id = hex!("06FF265B93466D8669CDEFD0EB3E9BCDCCC6A1AD");
        let si = signer_info(CmsVersion::V3, key_id_sid(&key_id));
        assert_eq!(
            si.sid().unwrap(),
            SignerIdentifier::SubjectKeyIdentifier(key_id.to_vec())
        );
        assert_eq!(si.find_certificate(&certs).unwrap(), &certs[2]);

        let unknown = signer_info(CmsVersion::V3, key_id_sid(&[0x42; 20]));
        let err = unknown.find_certificate(&certs).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn malformed_key_identifier_skipped() {
        let mut certs = certs();
        let extensions = certs[0].tbs_certificate.extensions.as_mut().unwrap();
        let ski = extensions
            .iter_mut()
            .find(|extension| extension.extn_id == ID_CE_SUBJECT_KEY_IDENTIFIER)
            .unwrap();
        ski.extn_value = OctetString::new(hex!("05 00").to_vec()).unwrap();

        let key_id = hex!("06FF265B93466D8669CDEFD0EB3E9BCDCCC6A1AD");
        let si = signer_info(CmsVersion::V3, key_id_sid(&key_id));
        assert_eq!(si.find_certificate(&certs).unwrap(), &certs[2]);

        let unknown = signer_info(CmsVersion::V3, key_id_sid(&[0x42; 20]));
        assert!(matches!(
            unknown.find_certificate(&certs),
            Err(Error::NoCertificate)
        ));
    }

    #[test]
    fn version_and_sid_mismatch() {
        let certs = certs();
        let key_id = key_id_sid(&[0x42; 20]);
        assert!(matches!(
            signer_info(CmsVersion::V1, key_id.clone()).sid(),
            Err(Error::WrongType)
        ));
        let isn = Any::encode_from(&IssuerAndSerialNumber::from_certificate(&certs[0]).unwrap())
            .unwrap();
        assert!(matches!(
            signer_info(CmsVersion::V3, isn).sid(),
            Err(Error::WrongType)
        ));
        let err = signer_info(CmsVersion::V2, key_id).sid().unwrap_err();
        assert!(matches!(err, Error::UnsupportedVersion(CmsVersion::V2)));
        assert!(err.is_unsupported());
    }

    #[test]
    fn algorithms() {
        let mut si = signer_info(CmsVersion::V1, key_id_sid(&[1]));
        assert_eq!(si.hash().unwrap(), HashAlgorithm::Sha256);
        assert_eq!(
            si.x509_signature_algorithm(),
            SignatureAlgorithm::Sha256WithRsa
        );

        si.signature_algorithm.oid = ID_EC_PUBLIC_KEY;
        assert_eq!(
            si.x509_signature_algorithm(),
            SignatureAlgorithm::EcdsaWithSha256
        );

        si.digest_algorithm.oid = ID_DATA;
        assert_eq!(si.x509_signature_algorithm(), SignatureAlgorithm::Unknown);
        assert!(matches!(si.hash(), Err(Error::UnsupportedAlgorithm(oid)) if oid == ID_DATA));
    }

    #[test]
    fn signed_attribute_getters() {
        let mut si = signer_info(CmsVersion::V1, key_id_sid(&[1]));
        assert!(matches!(
            si.content_type_attribute(),
            Err(Error::BadAttributeCount)
        ));
        assert_eq!(si.signing_time_attribute().unwrap(), None);

        let time = UtcTime::from_unix_duration(core::time::Duration::from_secs(1_000_000_000))
            .unwrap();
        si.signed_attrs = Some(Attributes::from(vec![
            Attribute::new(ID_CONTENT_TYPE, &ID_SIGNED_DATA).unwrap(),
            Attribute::new(ID_MESSAGE_DIGEST, &OctetStringRef::new(&[7; 32]).unwrap()).unwrap(),
            Attribute::new(ID_SIGNING_TIME, &time).unwrap(),
        ]));
        assert_eq!(si.content_type_attribute().unwrap(), ID_SIGNED_DATA);
        assert_eq!(si.message_digest_attribute().unwrap(), vec![7; 32]);
        assert_eq!(si.signing_time_attribute().unwrap(), Some(Time::UtcTime(time)));

        si.signed_attrs = Some(Attributes::from(vec![
            Attribute::new(ID_CONTENT_TYPE, &OctetStringRef::new(b"x").unwrap()).unwrap(),
            Attribute::new(ID_SIGNING_TIME, &ID_DATA).unwrap(),
        ]));
        assert!(matches!(
            si.content_type_attribute(),
            Err(Error::BadClassOrTag)
        ));
        assert!(matches!(
            si.signing_time_attribute(),
            Err(Error::BadClassOrTag)
        ));
        assert!(matches!(
            si.message_digest_attribute(),
            Err(Error::BadAttributeCount)
        ));
    }

    #[test]
    fn encoding_round_trip() {
        let mut si = signer_info(CmsVersion::V3, key_id_sid(&[1, 2]));
        si.signed_attrs = Some(Attributes::from(vec![Attribute::new(
            ID_CONTENT_TYPE,
            &ID_DATA,
        )
        .unwrap()]));
        si.unsigned_attrs = Some(Attributes::new());
        let der = si.to_der().unwrap();
        assert_eq!(SignerInfo::from_der(&der).unwrap(), si);
    }

    #[test]
    fn unsigned_attributes_sorted_on_output() {
        let content_type = Attribute::new(ID_CONTENT_TYPE, &ID_DATA).unwrap();
        let digest = Attribute::new(
            ID_MESSAGE_DIGEST,
            &OctetStringRef::new(&[0xaa; 4]).unwrap(),
        )
        .unwrap();
        let received = Attributes::from(vec![content_type.clone(), digest.clone()]);

        let mut si = signer_info(CmsVersion::V3, key_id_sid(&[1, 2]));
        si.signed_attrs = Some(received.clone());
        si.unsigned_attrs = Some(received.clone());
        let parsed = SignerInfo::from_der(&si.to_der().unwrap()).unwrap();

        assert_eq!(parsed.signed_attrs, Some(received.clone()));
        assert_eq!(
            parsed.unsigned_attrs,
            Some(Attributes::from(vec![digest, content_type]))
        );
        assert_eq!(si.unsigned_attrs, Some(received));
    }
}
