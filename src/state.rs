use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use bytes::{Bytes, BytesMut};
use memchr::memchr;

use crate::{
    utils::LF,
    Error, Limits, Result,
};

/// Default initial buffer capacity, 8KB
pub(crate) const DEFAULT_BUF_SIZE: usize = 8 * 1024;

/// IO State
///
/// Buffers the response body and hands it out line by line or in bounded chunks.
pub(crate) struct State<T> {
    pub(crate) io: T,
    pub(crate) eof: bool,
    pub(crate) length: u64,
    pub(crate) buffer: BytesMut,
    pub(crate) limits: Limits,
}

impl<T> State<T> {
    /// Creates new State.
    pub(crate) fn new(io: T, limits: Limits) -> Self {
        Self {
            io,
            limits,
            eof: false,
            length: 0,
            buffer: BytesMut::with_capacity(DEFAULT_BUF_SIZE),
        }
    }

    /// Gets io.
    pub(crate) fn io_mut(&mut self) -> &mut T {
        &mut self.io
    }

    /// Gets the number of bytes pulled from the body so far.
    pub(crate) fn len(&self) -> u64 {
        self.length
    }

    /// Whether the body is ended and everything buffered has been consumed.
    pub(crate) fn at_eof(&self) -> bool {
        self.eof && self.buffer.is_empty()
    }

    /// Takes a complete line, `\n` included.
    ///
    /// Once the stream is ended, the remainder is returned as is, and then
    /// empty lines forever.
    pub(crate) fn take_line(&mut self) -> Result<Option<Bytes>> {
        let found = memchr(LF, &self.buffer);
        let n = found.map_or(self.buffer.len(), |n| n + 1);

        if let Some(max) = self.limits.checked_line_size(n) {
            return Err(Error::LineTooLong(max));
        }

        if found.is_some() || self.eof {
            return Ok(Some(self.buffer.split_to(n).freeze()));
        }

        Ok(None)
    }

    /// Takes up to `n` buffered bytes, empty once the stream is ended.
    pub(crate) fn take_chunk(&mut self, n: usize) -> Option<Bytes> {
        if !self.buffer.is_empty() {
            let n = n.min(self.buffer.len());
            return Some(self.buffer.split_to(n).freeze());
        }

        self.eof.then(Bytes::new)
    }
}

impl<T> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("eof", &self.eof)
            .field("length", &self.length)
            .field("buffered", &self.buffer.len())
            .finish()
    }
}

/// The body stream shared by a multipart reader, its parts and nested readers.
pub(crate) struct Content<T>(Arc<Mutex<State<T>>>);

impl<T> Content<T> {
    pub(crate) fn new(state: State<T>) -> Self {
        Self(Arc::new(Mutex::new(state)))
    }

    pub(crate) fn try_lock(&self) -> Result<MutexGuard<'_, State<T>>> {
        self.0
            .try_lock()
            .map_err(|e| Error::TryLockError(e.to_string()))
    }

    fn lock(&self) -> MutexGuard<'_, State<T>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn at_eof(&self) -> bool {
        self.lock().at_eof()
    }

    pub(crate) fn len(&self) -> u64 {
        self.lock().len()
    }
}

impl<T> Clone for Content<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Content<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_lock() {
            Ok(state) => fmt::Debug::fmt(&*state, f),
            Err(_) => f.write_str("State { <locked> }"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(data: &'static [u8], eof: bool) -> State<()> {
        let mut state = State::new((), Limits::default());
        state.buffer.extend_from_slice(data);
        state.eof = eof;
        state
    }

    #[test]
    fn lines() {
        let mut state = state(b"one\r\ntwo\nthree", false);

        assert_eq!(state.take_line().unwrap().unwrap(), "one\r\n");
        assert_eq!(state.take_line().unwrap().unwrap(), "two\n");
        // waits for more data
        assert!(state.take_line().unwrap().is_none());

        state.eof = true;
        assert_eq!(state.take_line().unwrap().unwrap(), "three");
        assert_eq!(state.take_line().unwrap().unwrap(), "");
        assert!(state.at_eof());
    }

    #[test]
    fn line_too_long() {
        let mut state = state(b"0123456789", false);
        state.limits = Limits::default().line_size(4);

        assert!(matches!(state.take_line(), Err(Error::LineTooLong(4))));
    }

    #[test]
    fn chunks() {
        let mut state = state(b"hello", false);

        assert_eq!(state.take_chunk(2).unwrap(), "he");
        assert_eq!(state.take_chunk(10).unwrap(), "llo");
        assert!(state.take_chunk(10).is_none());

        state.eof = true;
        assert_eq!(state.take_chunk(10).unwrap(), "");
    }
}
