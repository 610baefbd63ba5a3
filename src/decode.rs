use std::io::{self, Read};

use bytes::Bytes;
use encoding_rs::Encoding;
use flate2::read::{DeflateDecoder, GzDecoder};
use http::header::{HeaderMap, CONTENT_ENCODING};

use crate::{Error, Result};

type Decoder = fn(&[u8]) -> io::Result<Vec<u8>>;

/// Looks up the decoder registered for a `Content-Encoding` value.
fn decoder(encoding: &str) -> Option<Decoder> {
    match encoding.trim().to_ascii_lowercase().as_str() {
        "gzip" => Some(decode_gzip),
        "deflate" => Some(decode_deflate),
        _ => None,
    }
}

fn decode_gzip(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(data.len() * 2);
    GzDecoder::new(data).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Raw deflate, without zlib framing.
fn decode_deflate(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(data.len() * 2);
    DeflateDecoder::new(data).read_to_end(&mut buf)?;
    Ok(buf)
}

/// Decodes `data` by the part's `Content-Encoding`, unchanged when the header is absent.
pub(crate) fn decode_content(headers: &HeaderMap, data: Bytes) -> Result<Bytes> {
    let Some(value) = headers.get(CONTENT_ENCODING) else {
        return Ok(data);
    };

    let encoding = String::from_utf8_lossy(value.as_bytes());
    let decode = decoder(&encoding)
        .ok_or_else(|| Error::UnsupportedContentEncoding(encoding.to_string()))?;

    tracing::trace!("decoding {} bytes as {}", data.len(), encoding);

    Ok(decode(&data)?.into())
}

/// Whether `label` names ISO-8859-1, which `encoding_rs` resolves to windows-1252.
fn is_latin1(label: &str) -> bool {
    matches!(
        label.to_ascii_lowercase().replace('_', "-").as_str(),
        "latin1" | "latin-1" | "l1" | "iso-8859-1" | "iso8859-1" | "iso-ir-100" | "cp819"
    )
}

/// Decodes text in the charset named by `label`.
///
/// ISO-8859-1 maps every byte to the code point of the same value.
pub(crate) fn decode_text(data: &[u8], label: &str) -> Result<String> {
    let label = label.trim();
    if is_latin1(label) {
        return Ok(data.iter().map(|&b| char::from(b)).collect());
    }

    let encoding = Encoding::for_label(label.as_bytes())
        .ok_or_else(|| Error::UnknownCharset(label.to_owned()))?;

    encoding
        .decode_without_bom_handling_and_without_replacement(data)
        .map(|text| text.into_owned())
        .ok_or(Error::InvalidText(encoding.name()))
}
