use std::{collections::VecDeque, fmt};

use bytes::Bytes;
use http::HeaderMap;

use crate::{
    decode::decode_content,
    state::Content,
    utils::{parse_charset, parse_content_length},
    Result,
};

/// Reader for a single, non-multipart body part.
///
/// With a `Content-Length` header the part is read in chunks up to the
/// declared length, otherwise line by line until the next boundary. It is
/// also a [`Stream`](futures_util::stream::Stream) of those chunks or lines.
pub struct BodyPartReader<T> {
    pub(crate) headers: HeaderMap,
    pub(crate) boundary: Bytes,
    pub(crate) content: Content<T>,
    pub(crate) length: Option<u64>,
    pub(crate) read_bytes: u64,
    pub(crate) chunk_size: usize,
    pub(crate) eof: bool,
    pub(crate) last_chunk: Option<Bytes>,
    pub(crate) unread: VecDeque<Bytes>,
}

impl<T> BodyPartReader<T> {
    pub(crate) fn new(
        boundary: Bytes,
        headers: HeaderMap,
        content: Content<T>,
        chunk_size: usize,
    ) -> Result<Self> {
        let length = parse_content_length(&headers)?;

        Ok(Self {
            headers,
            boundary,
            content,
            length,
            // a zero chunk size would never make progress
            chunk_size: chunk_size.max(1),
            read_bytes: 0,
            eof: false,
            last_chunk: None,
            unread: VecDeque::new(),
        })
    }

    /// Gets the part headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Gets the declared `Content-Length`.
    pub fn length(&self) -> Option<u64> {
        self.length
    }

    /// Returns `true` once the part has been read to its end.
    pub fn at_eof(&self) -> bool {
        self.eof
    }

    /// Gets the `charset` parameter of `Content-Type`, or `default`.
    pub fn charset(&self, default: &str) -> String {
        parse_charset(&self.headers).unwrap_or_else(|| default.to_owned())
    }

    /// Decodes data by the `Content-Encoding` header, `gzip` and `deflate` are supported.
    pub fn decode(&self, data: Bytes) -> Result<Bytes> {
        decode_content(&self.headers, data)
    }

    pub(crate) fn take_unread(&mut self) -> VecDeque<Bytes> {
        std::mem::take(&mut self.unread)
    }
}

impl<T> fmt::Debug for BodyPartReader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BodyPartReader")
            .field("headers", &self.headers)
            .field("length", &self.length)
            .field("read_bytes", &self.read_bytes)
            .field("eof", &self.eof)
            .finish()
    }
}
