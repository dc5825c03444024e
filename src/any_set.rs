//! `SET OF ANY` codec.

use der::{
    asn1::Any, DecodeValue, Encode, EncodeValue, FixedTag, Header, Length, Reader, Tag, Tagged,
    Writer,
};

use crate::{
    encoding,
    errors::{Error, Result},
};

/// Decoded value of an attribute: an ordered `SET OF ANY`.
///
/// Elements keep the order they were encoded in and are written back in that order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AnySet {
    /// Elements in encoded order.
    pub elements: Vec<Any>,
}

impl AnySet {
    /// Set holding a single element.
    pub fn new(element: Any) -> Self {
        Self {
            elements: vec![element],
        }
    }

    /// Decode the elements of `raw`, which must be a universal `SET`.
    pub fn from_any(raw: &Any) -> Result<Self> {
        if raw.tag() != Tag::Set {
            return Err(Error::BadClassOrTag);
        }
        Ok(raw.decode_as()?)
    }

    /// Encode the elements, in order, as a universal `SET`.
    pub fn to_any(&self) -> Result<Any> {
        Ok(Any::encode_from(self)?)
    }

    /// The only element of the set.
    pub fn single(&self) -> Result<&Any> {
        match self.elements.as_slice() {
            [element] => Ok(element),
            _ => Err(Error::BadAttributeElementCount),
        }
    }
}

impl<'a> DecodeValue<'a> for AnySet {
    fn decode_value<R: Reader<'a>>(reader: &mut R, header: Header) -> der::Result<Self> {
        let elements = encoding::decode_set_elements(reader, header)?;
        Ok(Self { elements })
    }
}

impl EncodeValue for AnySet {
    fn value_len(&self) -> der::Result<Length> {
        encoding::elements_len(&self.elements)
    }

    fn encode_value(&self, writer: &mut impl Writer) -> der::Result<()> {
        for element in &self.elements {
            element.encode(writer)?;
        }
        Ok(())
    }
}

impl FixedTag for AnySet {
    const TAG: Tag = Tag::Set;
}
