//! Error types.

use const_oid::ObjectIdentifier;
use core::fmt;

use crate::content_info::CmsVersion;

/// Alias for [`core::result::Result`] with the `cms-signed` crate's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// ASN.1 DER decoding or encoding failed.
    Asn1(der::Error),

    /// Input was not well-formed BER.
    Ber(&'static str),

    /// A value carried an unexpected ASN.1 class or tag.
    BadClassOrTag,

    /// Bytes remained after the outermost value.
    TrailingData,

    /// Content type is not the one required by the operation.
    WrongType,

    /// An attribute was expected exactly once.
    BadAttributeCount,

    /// An attribute value set was expected to hold exactly one element.
    BadAttributeElementCount,

    /// Structure version is not supported.
    UnsupportedVersion(CmsVersion),

    /// Algorithm identifier is not supported.
    UnsupportedAlgorithm(ObjectIdentifier),

    /// Certificate choice other than an X.509 certificate.
    UnsupportedCertificate,

    /// Public key type or curve is not supported.
    UnsupportedPublicKey,

    /// No certificate matched the signer.
    NoCertificate,

    /// Certificate is already present.
    DuplicateCertificate,

    /// Content is detached from the structure.
    Detached,

    /// SignedData carries no signer infos.
    NoSignerInfos,

    /// Signed attributes are required but absent.
    MissingAttributes,

    /// Content-type attribute does not match the encapsulated content type.
    ContentTypeMismatch,

    /// Message-digest attribute does not match the content.
    DigestMismatch,

    /// Signature verification failed.
    Verification,

    /// Producing a signature failed.
    Signing(signature::Error),

    /// Public key could not be encoded or decoded.
    Spki(spki::Error),
}

impl Error {
    /// Is this error caused by a feature this crate does not support?
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedVersion(_)
                | Error::UnsupportedAlgorithm(_)
                | Error::UnsupportedCertificate
                | Error::UnsupportedPublicKey
        )
    }

    /// Is this error a failed certificate lookup?
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NoCertificate)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Asn1(err) => Some(err),
            Error::Signing(err) => Some(err),
            Error::Spki(err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Asn1(err) => write!(f, "cms: ASN.1 error: {}", err),
            Error::Ber(reason) => write!(f, "cms: malformed BER: {}", reason),
            Error::BadClassOrTag => write!(f, "cms: unexpected ASN.1 class or tag"),
            Error::TrailingData => write!(f, "cms: unexpected trailing data"),
            Error::WrongType => write!(f, "cms: wrong content type"),
            Error::BadAttributeCount => write!(f, "cms: attribute not present exactly once"),
            Error::BadAttributeElementCount => {
                write!(f, "cms: attribute value set does not hold exactly one element")
            }
            Error::UnsupportedVersion(version) => {
                write!(f, "cms: unsupported version {}", *version as u8)
            }
            Error::UnsupportedAlgorithm(oid) => write!(f, "cms: unsupported algorithm {}", oid),
            Error::UnsupportedCertificate => write!(f, "cms: unsupported certificate type"),
            Error::UnsupportedPublicKey => write!(f, "cms: unsupported public key"),
            Error::NoCertificate => write!(f, "cms: no matching certificate"),
            Error::DuplicateCertificate => write!(f, "cms: certificate already present"),
            Error::Detached => write!(f, "cms: content is detached"),
            Error::NoSignerInfos => write!(f, "cms: no signer infos"),
            Error::MissingAttributes => write!(f, "cms: signed attributes missing"),
            Error::ContentTypeMismatch => write!(f, "cms: content-type attribute mismatch"),
            Error::DigestMismatch => write!(f, "cms: message digest mismatch"),
            Error::Verification => write!(f, "cms: verification error"),
            Error::Signing(err) => write!(f, "cms: signing error: {}", err),
            Error::Spki(err) => write!(f, "cms: public key error: {}", err),
        }
    }
}

impl From<der::Error> for Error {
    fn from(err: der::Error) -> Error {
        Error::Asn1(err)
    }
}

impl From<signature::Error> for Error {
    fn from(err: signature::Error) -> Error {
        Error::Signing(err)
    }
}

impl From<spki::Error> for Error {
    fn from(err: spki::Error) -> Error {
        Error::Spki(err)
    }
}
