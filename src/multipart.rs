use std::{collections::VecDeque, fmt};

use bytes::Bytes;
use http::HeaderMap;

use crate::{
    state::{Content, State},
    utils::{is_multipart, parse_boundary},
    BodyPartReader, Limits, Result,
};

/// A part yielded by [`MultipartReader::next`].
pub enum Part<T> {
    /// A leaf part.
    Body(BodyPartReader<T>),
    /// A part which is a `multipart/*` body itself.
    Multipart(Box<MultipartReader<T>>),
}

impl<T> Part<T> {
    /// Gets the part headers.
    pub fn headers(&self) -> &HeaderMap {
        match self {
            Part::Body(part) => part.headers(),
            Part::Multipart(reader) => reader.headers(),
        }
    }

    /// Returns `true` once the part has been read to its end.
    pub fn at_eof(&self) -> bool {
        match self {
            Part::Body(part) => part.at_eof(),
            Part::Multipart(reader) => reader.at_eof(),
        }
    }

    /// Returns `true` for a nested multipart body.
    pub fn is_multipart(&self) -> bool {
        matches!(self, Part::Multipart(_))
    }

    /// Gets the leaf reader.
    pub fn as_body_mut(&mut self) -> Option<&mut BodyPartReader<T>> {
        match self {
            Part::Body(part) => Some(part),
            Part::Multipart(_) => None,
        }
    }

    /// Gets the nested multipart reader.
    pub fn as_multipart_mut(&mut self) -> Option<&mut MultipartReader<T>> {
        match self {
            Part::Body(_) => None,
            Part::Multipart(reader) => Some(reader.as_mut()),
        }
    }

    pub(crate) fn take_unread(&mut self) -> VecDeque<Bytes> {
        match self {
            Part::Body(part) => part.take_unread(),
            Part::Multipart(reader) => std::mem::take(&mut reader.unread),
        }
    }
}

impl<T> fmt::Debug for Part<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Part::Body(part) => f.debug_tuple("Body").field(part).finish(),
            Part::Multipart(reader) => f.debug_tuple("Multipart").field(reader).finish(),
        }
    }
}

/// Multipart body reader.
///
/// Parts are lent out one at a time by [`MultipartReader::next`]; a part which
/// was not read to its end is drained before the next one is parsed.
pub struct MultipartReader<T> {
    pub(crate) headers: HeaderMap,
    pub(crate) boundary: Bytes,
    pub(crate) content: Content<T>,
    pub(crate) limits: Limits,
    pub(crate) last_part: Option<Part<T>>,
    pub(crate) unread: VecDeque<Bytes>,
    pub(crate) total: usize,
    pub(crate) eof: bool,
}

impl<T> MultipartReader<T> {
    /// Creates a reader over `body`, `headers` must carry a `multipart/*`
    /// Content-Type with a `boundary` parameter.
    pub fn new(headers: HeaderMap, body: T) -> Result<Self> {
        Self::with_limits(headers, body, Limits::default())
    }

    /// Creates a reader with custom limits.
    pub fn with_limits(headers: HeaderMap, body: T, limits: Limits) -> Result<Self> {
        let content = Content::new(State::new(body, limits.clone()));
        Self::nested(headers, content, limits)
    }

    pub(crate) fn nested(headers: HeaderMap, content: Content<T>, limits: Limits) -> Result<Self> {
        let boundary = parse_boundary(&headers)?;

        Ok(Self {
            headers,
            boundary,
            content,
            limits,
            last_part: None,
            unread: VecDeque::new(),
            total: 0,
            eof: false,
        })
    }

    /// Gets the headers this reader was built from.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Gets the boundary.
    pub fn boundary(&self) -> &[u8] {
        &self.boundary[2..]
    }

    /// Returns `true` once the final boundary was reached.
    pub fn at_eof(&self) -> bool {
        self.eof
    }

    /// Counts the parts.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Gets the number of bytes pulled from the body so far.
    pub fn bytes_read(&self) -> u64 {
        self.content.len()
    }

    pub(crate) fn current_mut(&mut self) -> Option<&mut Part<T>> {
        self.last_part.as_mut()
    }

    /// Dispatches on the part's `Content-Type`, a `multipart/*` part gets a
    /// nested reader over the same stream.
    pub(crate) fn part_reader(&self, headers: HeaderMap) -> Result<Part<T>> {
        if is_multipart(&headers) {
            tracing::debug!("part {} is a nested multipart", self.total);
            let reader = Self::nested(headers, self.content.clone(), self.limits.clone())?;
            return Ok(Part::Multipart(Box::new(reader)));
        }

        tracing::debug!("part {} is a body part", self.total);
        BodyPartReader::new(
            self.boundary.clone(),
            headers,
            self.content.clone(),
            self.limits.chunk_size,
        )
        .map(Part::Body)
    }
}

impl<T> fmt::Debug for MultipartReader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartReader")
            .field("boundary", &String::from_utf8_lossy(self.boundary()))
            .field("eof", &self.eof)
            .field("total", &self.total)
            .field("state", &self.content)
            .finish()
    }
}
