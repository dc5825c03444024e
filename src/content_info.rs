//! `ContentInfo` and `EncapsulatedContentInfo`.

use const_oid::ObjectIdentifier;
use der::{
    asn1::{Any, OctetStringRef},
    Decode, DecodeValue, Encode, EncodeValue, Enumerated, Header, Length, Reader, Sequence, Tag,
    TagNumber, Writer,
};

use crate::{
    ber::{self, Tlv},
    encoding::decode_exact,
    errors::{Error, Result},
    oid::{ID_DATA, ID_SIGNED_DATA},
    signed_data::SignedData,
};

/// Universal tag number of `OCTET STRING`.
const OCTET_STRING: u8 = 0x04;

const ECONTENT_TAG: Tag = Tag::ContextSpecific {
    constructed: true,
    number: TagNumber::N0,
};

/// ```text
/// CMSVersion ::= INTEGER  { v0(0), v1(1), v2(2), v3(3), v4(4), v5(5) }
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, Enumerated)]
#[asn1(type = "INTEGER")]
#[repr(u8)]
#[allow(missing_docs)]
pub enum CmsVersion {
    V0 = 0,
    V1 = 1,
    V2 = 2,
    V3 = 3,
    V4 = 4,
    V5 = 5,
}

/// ```text
/// ContentInfo ::= SEQUENCE {
///     contentType ContentType,
///     content [0] EXPLICIT ANY DEFINED BY contentType }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct ContentInfo {
    /// Type of `content`.
    pub content_type: ObjectIdentifier,

    /// Content, undecoded.
    #[asn1(context_specific = "0", tag_mode = "EXPLICIT")]
    pub content: Any,
}

impl ContentInfo {
    /// Parse BER or DER. The whole input must be consumed.
    pub fn parse(ber: &[u8]) -> Result<Self> {
        let der = ber::to_der(ber)?;
        decode_exact(&der)
    }

    /// Decode the content as `SignedData`.
    pub fn signed_data_content(&self) -> Result<SignedData> {
        if self.content_type != ID_SIGNED_DATA {
            return Err(Error::WrongType);
        }
        decode_exact(&self.content.to_der()?)
    }
}

/// ```text
/// EncapsulatedContentInfo ::= SEQUENCE {
///     eContentType ContentType,
///     eContent [0] EXPLICIT OCTET STRING OPTIONAL }
/// ```
///
/// `econtent` holds the encoding found inside the `[0]` tag verbatim, since
/// BER producers may split the OCTET STRING into a constructed one.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncapsulatedContentInfo {
    /// Type of the encapsulated content.
    pub econtent_type: ObjectIdentifier,

    /// Encoded `OCTET STRING`, or `None` when the content is detached.
    pub econtent: Option<Vec<u8>>,
}

impl EncapsulatedContentInfo {
    /// Wrap `content` of type `econtent_type` as a primitive OCTET STRING.
    pub fn new(econtent_type: ObjectIdentifier, content: &[u8]) -> Result<Self> {
        Ok(Self {
            econtent_type,
            econtent: Some(OctetStringRef::new(content)?.to_der()?),
        })
    }

    /// Wrap `content` as `id-data`.
    pub fn new_data(content: &[u8]) -> Result<Self> {
        Self::new(ID_DATA, content)
    }

    /// Content bytes, with constructed OCTET STRING segments concatenated.
    ///
    /// Returns `Ok(None)` when the content is detached. Nested constructed
    /// segments are rejected.
    pub fn econtent_value(&self) -> Result<Option<Vec<u8>>> {
        let Some(econtent) = &self.econtent else {
            return Ok(None);
        };
        let (octets, rest) = Tlv::parse(econtent)?;
        if !rest.is_empty() {
            return Err(Error::TrailingData);
        }
        if !octets.is_universal(OCTET_STRING) {
            return Err(Error::BadClassOrTag);
        }
        if !octets.is_constructed() {
            return Ok(Some(octets.content.to_vec()));
        }

        let mut value = Vec::with_capacity(octets.content.len());
        let mut segments = octets.content;
        while !segments.is_empty() {
            let (segment, rest) = Tlv::parse(segments)?;
            if !segment.is_universal(OCTET_STRING) || segment.is_constructed() {
                return Err(Error::BadClassOrTag);
            }
            value.extend_from_slice(segment.content);
            segments = rest;
        }
        Ok(Some(value))
    }

    /// Is the content of type `id-data`?
    pub fn is_type_data(&self) -> bool {
        self.econtent_type == ID_DATA
    }

    /// Content bytes of `id-data` content.
    pub fn data_econtent_value(&self) -> Result<Option<Vec<u8>>> {
        if !self.is_type_data() {
            return Err(Error::WrongType);
        }
        self.econtent_value()
    }

    /// Is the content absent?
    pub fn is_detached(&self) -> bool {
        self.econtent.is_none()
    }
}

impl<'a> DecodeValue<'a> for EncapsulatedContentInfo {
    fn decode_value<R: Reader<'a>>(reader: &mut R, header: Header) -> der::Result<Self> {
        reader.read_nested(header.length, |reader| {
            let econtent_type = reader.decode()?;
            let econtent = if reader.is_finished() {
                None
            } else {
                let header = Header::decode(reader)?;
                header.tag.assert_eq(ECONTENT_TAG)?;
                Some(reader.read_slice(header.length)?.to_vec())
            };
            Ok(Self {
                econtent_type,
                econtent,
            })
        })
    }
}

impl EncodeValue for EncapsulatedContentInfo {
    fn value_len(&self) -> der::Result<Length> {
        let econtent_len = match &self.econtent {
            Some(econtent) => Length::try_from(econtent.len())?.for_tlv()?,
            None => Length::ZERO,
        };
        self.econtent_type.encoded_len()? + econtent_len
    }

    fn encode_value(&self, writer: &mut impl Writer) -> der::Result<()> {
        self.econtent_type.encode(writer)?;
        if let Some(econtent) = &self.econtent {
            Header::new(ECONTENT_TAG, Length::try_from(econtent.len())?)?.encode(writer)?;
            writer.write(econtent)?;
        }
        Ok(())
    }
}

impl<'a> Sequence<'a> for EncapsulatedContentInfo {}
