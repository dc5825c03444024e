//! Signed and unsigned attributes.

use const_oid::ObjectIdentifier;
use der::{
    asn1::Any, Decode, DecodeValue, Encode, EncodeValue, FixedTag, Header, Length, Reader,
    Sequence, Tag, Writer,
};

use crate::{
    any_set::AnySet,
    encoding,
    errors::{Error, Result},
};

/// ```text
/// Attribute ::= SEQUENCE {
///     attrType   OBJECT IDENTIFIER,
///     attrValues SET OF AttributeValue }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct Attribute {
    /// Attribute type.
    pub attr_type: ObjectIdentifier,

    /// Undecoded `SET OF AttributeValue`.
    pub raw_value: Any,
}

impl Attribute {
    /// Attribute whose value set holds the encoding of `value` alone.
    pub fn new<T: Encode>(attr_type: ObjectIdentifier, value: &T) -> Result<Self> {
        let element = Any::from_der(&value.to_der()?)?;
        Ok(Self {
            attr_type,
            raw_value: AnySet::new(element).to_any()?,
        })
    }

    /// Decode the value set.
    pub fn values(&self) -> Result<AnySet> {
        AnySet::from_any(&self.raw_value)
    }
}

/// Sequence of attributes in the order they were received or built.
///
/// Two encodings exist. [`Attributes::marshaled_for_signing`] sorts the
/// attributes as DER requires for a `SET OF`, which is what a signer hashes.
/// [`Attributes::marshaled_for_verification`] keeps the received order, which
/// is what a signer that does not sort has hashed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Attributes(Vec<Attribute>);

impl Attributes {
    /// Empty attribute list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute.
    pub fn push(&mut self, attribute: Attribute) {
        self.0.push(attribute);
    }

    /// Iterate over the attributes in stored order.
    pub fn iter(&self) -> core::slice::Iter<'_, Attribute> {
        self.0.iter()
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Is the list empty?
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decoded value sets of every attribute of type `oid`, in stored order.
    pub fn values(&self, oid: &ObjectIdentifier) -> Result<Vec<AnySet>> {
        self.iter()
            .filter(|attribute| attribute.attr_type == *oid)
            .map(Attribute::values)
            .collect()
    }

    /// Is at least one attribute of type `oid` present?
    pub fn has_attribute(&self, oid: &ObjectIdentifier) -> bool {
        self.iter().any(|attribute| attribute.attr_type == *oid)
    }

    /// The single value of the single attribute of type `oid`.
    ///
    /// Fails with [`Error::BadAttributeCount`] unless the attribute occurs
    /// exactly once, and with [`Error::BadAttributeElementCount`] unless its
    /// value set holds exactly one element.
    pub fn only_value(&self, oid: &ObjectIdentifier) -> Result<Any> {
        let mut values = self.values(oid)?;
        if values.len() != 1 {
            return Err(Error::BadAttributeCount);
        }
        let mut set = values.remove(0);
        if set.elements.len() != 1 {
            return Err(Error::BadAttributeElementCount);
        }
        Ok(set.elements.remove(0))
    }

    /// DER `SET OF` encoding with attributes sorted by their encodings.
    pub fn marshaled_for_signing(&self) -> Result<Vec<u8>> {
        let encoded = encoding::sorted_encodings(&self.0)?;
        let mut out = Header::new(Tag::Set, self.value_len()?)?.to_der()?;
        for attribute in encoded {
            out.extend_from_slice(&attribute);
        }
        Ok(out)
    }

    /// `SET OF` encoding with attributes in stored order.
    pub fn marshaled_for_verification(&self) -> Result<Vec<u8>> {
        Ok(self.to_der()?)
    }

    /// Write as `[n] IMPLICIT SET OF` carrying `tag`, sorted by encoding
    /// without reordering the stored list.
    pub(crate) fn encode_sorted(&self, tag: Tag, writer: &mut impl Writer) -> der::Result<()> {
        encoding::encode_sorted_set(&self.0, tag, writer)
    }

    /// Reorder the attributes by their DER encodings.
    pub fn sort(&mut self) -> Result<()> {
        let mut keyed = self
            .0
            .drain(..)
            .map(|attribute| -> Result<(Vec<u8>, Attribute)> {
                Ok((attribute.to_der()?, attribute))
            })
            .collect::<Result<Vec<_>>>()?;
        keyed.sort_by(|(a, _), (b, _)| a.cmp(b));
        self.0 = keyed.into_iter().map(|(_, attribute)| attribute).collect();
        Ok(())
    }
}

impl From<Vec<Attribute>> for Attributes {
    fn from(attributes: Vec<Attribute>) -> Self {
        Self(attributes)
    }
}

impl FromIterator<Attribute> for Attributes {
    fn from_iter<I: IntoIterator<Item = Attribute>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = core::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> DecodeValue<'a> for Attributes {
    fn decode_value<R: Reader<'a>>(reader: &mut R, header: Header) -> der::Result<Self> {
        encoding::decode_set_elements(reader, header).map(Self)
    }
}

impl EncodeValue for Attributes {
    fn value_len(&self) -> der::Result<Length> {
        encoding::elements_len(&self.0)
    }

    fn encode_value(&self, writer: &mut impl Writer) -> der::Result<()> {
        for attribute in &self.0 {
            attribute.encode(writer)?;
        }
        Ok(())
    }
}

impl FixedTag for Attributes {
    const TAG: Tag = Tag::Set;
}
