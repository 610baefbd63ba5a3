use bytes::{Bytes, BytesMut};
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use httparse::{parse_headers, Status, EMPTY_HEADER};

use crate::{Error, Result};

pub(crate) const DASHES: [u8; 2] = [b'-', b'-']; // `--`
pub(crate) const CRLF: [u8; 2] = [b'\r', b'\n']; // `\r\n`
pub(crate) const LF: u8 = b'\n';

/// What a boundary line marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delimiter {
    /// `--boundary`, a part follows
    Next,
    /// `--boundary--`, end of the body
    Last,
}

pub(crate) fn parse_content_type(header: Option<&HeaderValue>) -> Option<mime::Mime> {
    header
        .map(HeaderValue::to_str)
        .and_then(Result::ok)
        .map(str::parse)
        .and_then(Result::ok)
}

pub(crate) fn is_multipart(headers: &HeaderMap) -> bool {
    parse_content_type(headers.get(CONTENT_TYPE)).is_some_and(|m| m.type_() == mime::MULTIPART)
}

/// Builds the `--boundary` token from a `multipart/*` Content-Type.
pub(crate) fn parse_boundary(headers: &HeaderMap) -> Result<Bytes> {
    let content_type = parse_content_type(headers.get(CONTENT_TYPE))
        .filter(|m| m.type_() == mime::MULTIPART)
        .ok_or(Error::NotMultipart)?;

    let boundary = content_type
        .get_param(mime::BOUNDARY)
        .map(|b| b.as_str())
        .filter(|b| !b.is_empty())
        .ok_or(Error::MissingBoundary)?;

    let mut delimiter = BytesMut::with_capacity(DASHES.len() + boundary.len());
    delimiter.extend_from_slice(&DASHES);
    delimiter.extend_from_slice(boundary.as_bytes());
    Ok(delimiter.freeze())
}

pub(crate) fn parse_charset(headers: &HeaderMap) -> Option<String> {
    parse_content_type(headers.get(CONTENT_TYPE))
        .and_then(|m| m.get_param(mime::CHARSET).map(|c| c.as_str().to_owned()))
}

pub(crate) fn parse_content_length(headers: &HeaderMap) -> Result<Option<u64>> {
    headers
        .get(CONTENT_LENGTH)
        .map(|v| {
            v.to_str()
                .ok()
                .and_then(|s| s.trim().parse().ok())
                .ok_or(Error::InvalidContentLength)
        })
        .transpose()
}

pub(crate) fn parse_part_headers(bytes: &[u8], max: usize) -> Result<HeaderMap> {
    let mut headers = vec![EMPTY_HEADER; max];
    match parse_headers(bytes, &mut headers) {
        Ok(Status::Complete((_, hs))) => {
            let mut header_map = HeaderMap::with_capacity(hs.len());
            for h in hs {
                header_map.append(
                    HeaderName::from_bytes(h.name.as_bytes()).map_err(|_| Error::InvalidHeader)?,
                    HeaderValue::from_bytes(h.value).map_err(|_| Error::InvalidHeader)?,
                );
            }
            Ok(header_map)
        }
        Err(httparse::Error::TooManyHeaders) => Err(Error::HeadersTooMany(max)),
        Ok(Status::Partial) | Err(_) => Err(Error::InvalidHeader),
    }
}

/// Strips one trailing `\r\n` or `\n`, reports whether there was one.
pub(crate) fn strip_eol(line: &[u8]) -> (&[u8], bool) {
    if let Some(rest) = line.strip_suffix(&CRLF) {
        (rest, true)
    } else if let Some(rest) = line.strip_suffix(&[LF]) {
        (rest, true)
    } else {
        (line, false)
    }
}

/// Classifies a raw line against the `--boundary` token.
///
/// The terminator is also accepted without a line ending, some servers end
/// the body right after `--boundary--`.
pub(crate) fn match_boundary(line: &[u8], boundary: &[u8]) -> Option<Delimiter> {
    let (stripped, terminated) = strip_eol(line);
    match stripped.strip_prefix(boundary)? {
        b"" if terminated => Some(Delimiter::Next),
        b"--" => Some(Delimiter::Last),
        _ => None,
    }
}
