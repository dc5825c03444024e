//! BER to DER normalization.
//!
//! Producers such as OpenSSL's streaming mode emit SignedData with
//! indefinite lengths and constructed OCTET STRINGs. The DER decoder used by
//! this crate accepts neither indefinite lengths nor non-minimal length
//! octets, so input is rewritten here first. Constructed string encodings
//! are preserved; they are reassembled where they are consumed.

use tracing::trace;

use crate::errors::{Error, Result};

/// Maximum nesting of constructed values.
const MAX_DEPTH: usize = 64;

/// Identifier bit marking a constructed encoding.
const CONSTRUCTED: u8 = 0x20;

/// Low identifier bits signalling a multi-byte tag number.
const HIGH_TAG_NUMBER: u8 = 0x1f;

const END_OF_CONTENTS: [u8; 2] = [0x00, 0x00];

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Len {
    Definite(usize),
    Indefinite,
}

/// Rewrite the first BER value in `ber` using definite, minimally encoded
/// lengths. Bytes after that value are copied through untouched.
pub fn to_der(ber: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(ber.len());
    let rest = normalize(ber, &mut out, 0)?;
    trace!(ber_len = ber.len(), der_len = out.len(), trailing = rest.len(), "normalized BER");
    out.extend_from_slice(rest);
    Ok(out)
}

/// Normalize one value from the front of `input` into `out` and return the remaining input.
fn normalize<'a>(input: &'a [u8], out: &mut Vec<u8>, depth: usize) -> Result<&'a [u8]> {
    if depth > MAX_DEPTH {
        return Err(Error::Ber("nesting too deep"));
    }

    let (identifier, input) = input.split_at(identifier_len(input)?);
    let constructed = identifier[0] & CONSTRUCTED != 0;
    let (length, length_len) = read_length(input)?;
    let input = &input[length_len..];
    out.extend_from_slice(identifier);

    match length {
        Len::Definite(len) if !constructed => {
            let content = input.get(..len).ok_or(Error::Ber("truncated content"))?;
            encode_length(len, out);
            out.extend_from_slice(content);
            Ok(&input[len..])
        }
        Len::Definite(len) => {
            let mut remaining = input.get(..len).ok_or(Error::Ber("truncated content"))?;
            let mut content = Vec::with_capacity(len);
            while !remaining.is_empty() {
                remaining = normalize(remaining, &mut content, depth + 1)?;
            }
            encode_length(content.len(), out);
            out.extend_from_slice(&content);
            Ok(&input[len..])
        }
        Len::Indefinite if !constructed => {
            Err(Error::Ber("indefinite length on primitive value"))
        }
        Len::Indefinite => {
            let mut remaining = input;
            let mut content = Vec::new();
            loop {
                if let Some(rest) = remaining.strip_prefix(&END_OF_CONTENTS) {
                    remaining = rest;
                    break;
                }
                if remaining.is_empty() {
                    return Err(Error::Ber("missing end-of-contents"));
                }
                remaining = normalize(remaining, &mut content, depth + 1)?;
            }
            encode_length(content.len(), out);
            out.extend_from_slice(&content);
            Ok(remaining)
        }
    }
}

fn identifier_len(input: &[u8]) -> Result<usize> {
    let first = *input.first().ok_or(Error::Ber("truncated identifier"))?;
    if first & HIGH_TAG_NUMBER != HIGH_TAG_NUMBER {
        return Ok(1);
    }
    input
        .iter()
        .skip(1)
        .position(|byte| byte & 0x80 == 0)
        .map(|i| i + 2)
        .ok_or(Error::Ber("truncated identifier"))
}

/// Returns the length and the number of length octets consumed.
fn read_length(input: &[u8]) -> Result<(Len, usize)> {
    let first = *input.first().ok_or(Error::Ber("truncated length"))?;
    match first {
        0x00..=0x7f => Ok((Len::Definite(first.into()), 1)),
        0x80 => Ok((Len::Indefinite, 1)),
        0xff => Err(Error::Ber("reserved length octet")),
        _ => {
            let count = usize::from(first & 0x7f);
            let octets = input
                .get(1..=count)
                .ok_or(Error::Ber("truncated length"))?;
            let len = octets.iter().try_fold(0usize, |len, byte| {
                len.checked_mul(256)
                    .and_then(|len| len.checked_add(usize::from(*byte)))
                    .ok_or(Error::Ber("length overflow"))
            })?;
            Ok((Len::Definite(len), count + 1))
        }
    }
}

fn encode_length(len: usize, out: &mut Vec<u8>) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|byte| **byte == 0).count();
    out.push(0x80 | (bytes.len() - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
}

/// A single definite-length TLV borrowed from DER input.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) struct Tlv<'a> {
    /// Identifier octets.
    pub identifier: &'a [u8],
    /// Content octets.
    pub content: &'a [u8],
}

impl<'a> Tlv<'a> {
    /// Split one definite-length value off the front of `input`.
    pub fn parse(input: &'a [u8]) -> Result<(Self, &'a [u8])> {
        let id_len = identifier_len(input)?;
        let (length, length_len) = read_length(&input[id_len..])?;
        let Len::Definite(len) = length else {
            return Err(Error::Ber("indefinite length"));
        };
        let start = id_len + length_len;
        let end = start
            .checked_add(len)
            .filter(|end| *end <= input.len())
            .ok_or(Error::Ber("truncated content"))?;
        let tlv = Tlv {
            identifier: &input[..id_len],
            content: &input[start..end],
        };
        Ok((tlv, &input[end..]))
    }

    /// Is this a universal-class value with the given low tag number?
    pub fn is_universal(&self, number: u8) -> bool {
        self.identifier.len() == 1 && self.identifier[0] & !CONSTRUCTED == number
    }

    pub fn is_constructed(&self) -> bool {
        self.identifier[0] & CONSTRUCTED != 0
    }
}
