use std::fmt;

use http::{response::Parts, HeaderMap, StatusCode};

use crate::{state::Content, Limits, MultipartReader, Result};

/// Ties a [`MultipartReader`] to the HTTP response it reads, the body is
/// released as soon as the final boundary is reached.
pub struct MultipartResponse<T> {
    pub(crate) head: Parts,
    pub(crate) reader: MultipartReader<T>,
    pub(crate) content: Content<T>,
    pub(crate) released: bool,
}

impl<T> MultipartResponse<T> {
    pub(crate) fn new(response: http::Response<T>, limits: Limits) -> Result<Self> {
        let (head, body) = response.into_parts();
        let reader = MultipartReader::with_limits(head.headers.clone(), body, limits)?;
        let content = reader.content.clone();

        Ok(Self {
            head,
            reader,
            content,
            released: false,
        })
    }

    /// Gets the response status.
    pub fn status(&self) -> StatusCode {
        self.head.status
    }

    /// Gets the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.head.headers
    }

    /// Gets the top-level reader.
    pub fn reader(&self) -> &MultipartReader<T> {
        &self.reader
    }

    /// Gets the top-level reader mutably, parts read through it do not release
    /// the response.
    pub fn reader_mut(&mut self) -> &mut MultipartReader<T> {
        &mut self.reader
    }

    /// Returns `true` when all response data had been read.
    pub fn at_eof(&self) -> bool {
        self.content.at_eof()
    }

    /// Returns `true` once the response body was released.
    pub fn is_released(&self) -> bool {
        self.released
    }
}

impl<T> MultipartReader<T> {
    /// Wraps a multipart HTTP response.
    pub fn from_response(response: http::Response<T>) -> Result<MultipartResponse<T>> {
        MultipartResponse::new(response, Limits::default())
    }

    /// Wraps a multipart HTTP response with custom limits.
    pub fn from_response_with_limits(
        response: http::Response<T>,
        limits: Limits,
    ) -> Result<MultipartResponse<T>> {
        MultipartResponse::new(response, limits)
    }
}

impl<T> fmt::Debug for MultipartResponse<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultipartResponse")
            .field("status", &self.head.status)
            .field("released", &self.released)
            .field("reader", &self.reader)
            .finish()
    }
}
