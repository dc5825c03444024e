//! DER helpers shared by the CMS structures.
//!
//! `SET OF` fields are kept in the order they were received so that
//! signatures over them can be checked; they are sorted only when written.

use der::{Decode, Encode, EncodeValue, Header, Length, Reader, SliceReader, Tag, Writer};

use crate::errors::{Error, Result};

/// Decode a single `T` which must span all of `der`.
pub(crate) fn decode_exact<'a, T: Decode<'a>>(der: &'a [u8]) -> Result<T> {
    let mut reader = SliceReader::new(der)?;
    let value = T::decode(&mut reader)?;
    if !reader.is_finished() {
        return Err(Error::TrailingData);
    }
    Ok(value)
}

/// Decode the elements of a `SET OF` whose header was already read, in received order.
pub(crate) fn decode_set_elements<'a, R, T>(reader: &mut R, header: Header) -> der::Result<Vec<T>>
where
    R: Reader<'a>,
    T: Decode<'a>,
{
    reader.read_nested(header.length, |reader| {
        let mut elements = Vec::new();
        while !reader.is_finished() {
            elements.push(reader.decode()?);
        }
        Ok(elements)
    })
}

/// Decode a universal `SET OF`.
pub(crate) fn decode_set<'a, R, T>(reader: &mut R) -> der::Result<Vec<T>>
where
    R: Reader<'a>,
    T: Decode<'a>,
{
    let header = Header::decode(reader)?;
    header.tag.assert_eq(Tag::Set)?;
    decode_set_elements(reader, header)
}

/// Decode an optional `[n] IMPLICIT SET OF` carrying `tag`.
pub(crate) fn decode_implicit_set<'a, R, T>(reader: &mut R, tag: Tag) -> der::Result<Option<Vec<T>>>
where
    R: Reader<'a>,
    T: Decode<'a>,
{
    if reader.is_finished() || reader.peek_tag()? != tag {
        return Ok(None);
    }
    let header = Header::decode(reader)?;
    decode_set_elements(reader, header).map(Some)
}

/// Encoded length of the elements of a set, without its header.
pub(crate) fn elements_len<T: Encode>(elements: &[T]) -> der::Result<Length> {
    elements
        .iter()
        .try_fold(Length::ZERO, |len, elem| len + elem.encoded_len()?)
}

/// DER encodings of `elements`, sorted as `SET OF` requires.
pub(crate) fn sorted_encodings<T: Encode>(elements: &[T]) -> der::Result<Vec<Vec<u8>>> {
    let mut encoded = elements
        .iter()
        .map(Encode::to_der)
        .collect::<der::Result<Vec<_>>>()?;
    encoded.sort();
    Ok(encoded)
}

/// Encoded length of a set including its header.
pub(crate) fn set_len<T: Encode>(elements: &[T]) -> der::Result<Length> {
    elements_len(elements)?.for_tlv()
}

pub(crate) fn optional_set_len<T: Encode>(elements: &Option<Vec<T>>) -> der::Result<Length> {
    match elements {
        Some(elements) => set_len(elements),
        None => Ok(Length::ZERO),
    }
}

/// Write `elements` under `tag`, sorted by encoding.
pub(crate) fn encode_sorted_set<T: Encode>(
    elements: &[T],
    tag: Tag,
    writer: &mut impl Writer,
) -> der::Result<()> {
    Header::new(tag, elements_len(elements)?)?.encode(writer)?;
    for encoded in sorted_encodings(elements)? {
        writer.write(&encoded)?;
    }
    Ok(())
}

/// Length of an optional `[n] IMPLICIT` value including its header.
pub(crate) fn implicit_len<T: EncodeValue>(value: &Option<T>) -> der::Result<Length> {
    match value {
        Some(value) => value.value_len()?.for_tlv(),
        None => Ok(Length::ZERO),
    }
}

/// Write an optional value as `[n] IMPLICIT` carrying `tag`.
pub(crate) fn encode_implicit<T: EncodeValue>(
    value: &Option<T>,
    tag: Tag,
    writer: &mut impl Writer,
) -> der::Result<()> {
    if let Some(value) = value {
        Header::new(tag, value.value_len()?)?.encode(writer)?;
        value.encode_value(writer)?;
    }
    Ok(())
}
