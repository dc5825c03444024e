#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc = include_str!("../README.md")]
#![doc(html_logo_url = "https://raw.githubusercontent.com/RustCrypto/meta/master/logo_small.png")]
#![warn(missing_docs)]

//! # Usage
//!
//! ## Signing
//!
//! The signer's certificate must be part of `chain`. Certificates in `chain`
//! are embedded in the output.
//!
#![cfg_attr(feature = "p256", doc = "```")]
#![cfg_attr(not(feature = "p256"), doc = "```ignore")]
//! use cms_signed::{EncapsulatedContentInfo, SignedData};
//! use cms_signed::x509_cert::Certificate;
//!
//! fn sign(chain: &[Certificate], key: &p256::ecdsa::SigningKey) -> cms_signed::Result<Vec<u8>> {
//!     let content = EncapsulatedContentInfo::new_data(b"hello world")?;
//!     let mut signed_data = SignedData::new(content);
//!     signed_data.add_signer_info(chain, key)?;
//!     signed_data.content_info_der()
//! }
//! ```
//!
//! ## Verification
//!
//! BER input, such as the output of OpenSSL, is accepted.
//!
//! ```
//! use cms_signed::SignedData;
//!
//! fn verify(ber: &[u8], detached: Option<&[u8]>) -> cms_signed::Result<()> {
//!     let signed_data = SignedData::from_ber(ber)?;
//!     let signers = match detached {
//!         Some(content) => signed_data.verify_detached(content)?,
//!         None => signed_data.verify()?,
//!     };
//!     for cert in &signers {
//!         println!("signed by {}", cert.tbs_certificate.subject);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Only the signature is checked against the embedded certificates.
//! Certificate paths, validity periods, and key usage are the caller's to
//! check.

#[cfg(doctest)]
pub struct ReadmeDoctests;

pub mod ber;
pub mod errors;
pub mod oid;

mod any_set;
mod attr;
mod content_info;
mod encoding;
mod signed_data;
mod signer;
mod signer_info;
mod verify;

pub use der;
pub use spki;
pub use x509_cert;

#[cfg(feature = "p256")]
pub use p256;
#[cfg(feature = "p384")]
pub use p384;
#[cfg(feature = "rsa")]
pub use rsa;

pub use crate::{
    any_set::AnySet,
    attr::{Attribute, Attributes},
    content_info::{CmsVersion, ContentInfo, EncapsulatedContentInfo},
    errors::{Error, Result},
    oid::{HashAlgorithm, SignatureAlgorithm},
    signed_data::{default_digest_algorithm, SignedData, SigningOptions},
    signer::CmsSigner,
    signer_info::{IssuerAndSerialNumber, SignerIdentifier, SignerInfo},
};
