use std::{
    cmp,
    error::Error as StdError,
    pin::Pin,
    task::{Context, Poll},
};

use bytes::{Bytes, BytesMut};
use futures_util::{
    future::{poll_fn, BoxFuture},
    ready,
    stream::Stream,
};
use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

use crate::{
    decode::decode_text,
    state::{Content, State},
    utils::{match_boundary, parse_part_headers, strip_eol, Delimiter, CRLF},
    BodyPartReader, Error, MultipartReader, MultipartResponse, Part, Result,
};

impl<T, B, E> State<T>
where
    T: Stream<Item = Result<B, E>> + Unpin,
    B: Into<Bytes>,
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    /// Pulls the next chunk of the body into the buffer.
    fn poll_fill(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        if self.eof {
            return Poll::Ready(Ok(()));
        }

        trace!("polling data from stream");

        match Pin::new(self.io_mut()).poll_next(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(b))) => {
                let b: Bytes = b.into();
                let l = b.len() as u64;

                if let Some(max) = self.limits.checked_stream_size(self.length + l) {
                    return Poll::Ready(Err(Error::PayloadTooLarge(max)));
                }

                self.buffer.extend_from_slice(&b);
                self.length += l;
                Poll::Ready(Ok(()))
            }
            Poll::Ready(Some(Err(e))) => Poll::Ready(Err(Error::BoxError(e.into()))),
            Poll::Ready(None) => {
                trace!("stream is ended");
                self.eof = true;
                Poll::Ready(Ok(()))
            }
        }
    }

    pub(crate) fn poll_readline(&mut self, cx: &mut Context<'_>) -> Poll<Result<Bytes>> {
        loop {
            if let Some(line) = self.take_line()? {
                return Poll::Ready(Ok(line));
            }
            ready!(self.poll_fill(cx))?;
        }
    }

    pub(crate) fn poll_read(&mut self, cx: &mut Context<'_>, n: usize) -> Poll<Result<Bytes>> {
        loop {
            if let Some(chunk) = self.take_chunk(n) {
                return Poll::Ready(Ok(chunk));
            }
            ready!(self.poll_fill(cx))?;
        }
    }

    pub(crate) fn poll_drain(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        loop {
            self.buffer.clear();
            if self.eof {
                return Poll::Ready(Ok(()));
            }
            ready!(self.poll_fill(cx))?;
        }
    }
}

impl<T, B, E> Content<T>
where
    T: Stream<Item = Result<B, E>> + Unpin,
    B: Into<Bytes>,
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    /// Reads a line, `\n` included, empty at the end of the stream.
    pub(crate) async fn readline(&self) -> Result<Bytes> {
        poll_fn(|cx| self.try_lock()?.poll_readline(cx)).await
    }

    /// Reads up to `n` bytes, empty at the end of the stream.
    pub(crate) async fn read(&self, n: usize) -> Result<Bytes> {
        poll_fn(|cx| self.try_lock()?.poll_read(cx, n)).await
    }

    /// Reads the rest of the stream to the void.
    pub(crate) async fn drain(&self) -> Result<()> {
        poll_fn(|cx| self.try_lock()?.poll_drain(cx)).await
    }
}

impl<T, B, E> BodyPartReader<T>
where
    T: Stream<Item = Result<B, E>> + Unpin,
    B: Into<Bytes>,
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    /// Reads the whole part, `None` when it yields no data.
    pub async fn next(&mut self) -> Result<Option<Bytes>> {
        let data = self.read(false).await?;
        Ok((!data.is_empty()).then_some(data))
    }

    /// Reads the whole part, decoded by `Content-Encoding` if `decode` is set.
    pub async fn read(&mut self, decode: bool) -> Result<Bytes> {
        if self.eof {
            return Ok(Bytes::new());
        }

        let mut data = BytesMut::new();
        if self.length.is_some() {
            while !self.eof {
                data.extend_from_slice(&self.read_chunk(self.chunk_size).await?);
            }
        } else {
            while !self.eof {
                data.extend_from_slice(&self.readline().await?);
            }
        }

        trace!("part read {} bytes", data.len());

        let data = data.freeze();
        if decode {
            self.decode(data)
        } else {
            Ok(data)
        }
    }

    /// Reads a chunk of at most `size` bytes.
    ///
    /// Only for parts with a `Content-Length` header. Once the declared length
    /// is read, exactly one `\r\n` must follow. A zero `size` reads as one.
    pub async fn read_chunk(&mut self, size: usize) -> Result<Bytes> {
        poll_fn(|cx| self.poll_chunk(cx, size)).await
    }

    /// Reads a line of the part, line ending included.
    ///
    /// Only for parts without a `Content-Length` header. Empty once the
    /// boundary is reached.
    pub async fn readline(&mut self) -> Result<Bytes> {
        poll_fn(|cx| self.poll_line(cx)).await
    }

    /// Like [`read`](Self::read), but reads all the data to the void.
    pub async fn release(&mut self) -> Result<()> {
        if self.length.is_some() {
            while !self.eof {
                self.read_chunk(self.chunk_size).await?;
            }
        } else {
            while !self.eof {
                self.readline().await?;
            }
        }

        trace!("part released");

        Ok(())
    }

    /// Reads the part as text.
    ///
    /// `encoding` overrides the `charset` of `Content-Type`, which defaults to `latin1`.
    pub async fn text(&mut self, encoding: Option<&str>) -> Result<String> {
        let data = self.read(true).await?;
        let charset = encoding.map_or_else(|| self.charset("latin1"), str::to_owned);
        decode_text(&data, &charset)
    }

    /// Reads the part as JSON, `null` when the part is empty.
    ///
    /// `encoding` overrides the `charset` of `Content-Type`, which defaults to `utf-8`.
    pub async fn json(&mut self, encoding: Option<&str>) -> Result<Value> {
        Ok(self.json_as(encoding).await?.unwrap_or(Value::Null))
    }

    /// Reads the part as JSON into `D`, `None` when the part is empty.
    pub async fn json_as<D>(&mut self, encoding: Option<&str>) -> Result<Option<D>>
    where
        D: DeserializeOwned,
    {
        let data = self.read(true).await?;
        if data.is_empty() {
            return Ok(None);
        }

        let charset = encoding.map_or_else(|| self.charset("utf-8"), str::to_owned);
        let text = decode_text(&data, &charset)?;
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn poll_chunk(&mut self, cx: &mut Context<'_>, size: usize) -> Poll<Result<Bytes>> {
        if self.eof {
            return Poll::Ready(Ok(Bytes::new()));
        }

        let Some(length) = self.length else {
            return Poll::Ready(Err(Error::ModePreconditionViolation(
                "Content-Length required for chunked read",
            )));
        };

        let size = size.max(1);

        let mut state = self.content.try_lock()?;

        loop {
            if self.read_bytes == length {
                if ready!(state.poll_readline(cx))?[..] != CRLF {
                    self.eof = true;
                    return Poll::Ready(Err(Error::TruncatedOrOverlongPart));
                }

                self.eof = true;
                trace!("part read to its content length {}", length);

                // the last chunk is held back until the terminator arrived
                return Poll::Ready(Ok(self.last_chunk.take().unwrap_or_default()));
            }

            let size = cmp::min(size as u64, length - self.read_bytes) as usize;
            let chunk = ready!(state.poll_read(cx, size))?;

            // stream closed before the declared length
            if chunk.is_empty() {
                return Poll::Ready(Err(Error::TruncatedOrOverlongPart));
            }

            self.read_bytes += chunk.len() as u64;

            if self.read_bytes < length {
                return Poll::Ready(Ok(chunk));
            }

            self.last_chunk = Some(chunk);
        }
    }

    fn poll_line(&mut self, cx: &mut Context<'_>) -> Poll<Result<Bytes>> {
        if self.eof {
            return Poll::Ready(Ok(Bytes::new()));
        }

        if self.length.is_some() {
            return Poll::Ready(Err(Error::ModePreconditionViolation(
                "readline is unavailable for parts with Content-Length",
            )));
        }

        let line = ready!(self.content.try_lock()?.poll_readline(cx))?;

        if line.is_empty() {
            return Poll::Ready(Err(Error::UnexpectedEof));
        }

        if match_boundary(&line, &self.boundary).is_some() {
            trace!("part reached boundary");
            self.eof = true;
            // the boundary line is kept for the owning reader
            self.unread.push_back(line);
            return Poll::Ready(Ok(Bytes::new()));
        }

        Poll::Ready(Ok(line))
    }
}

impl<T, B, E> Stream for BodyPartReader<T>
where
    T: Stream<Item = Result<B, E>> + Unpin,
    B: Into<Bytes>,
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    type Item = Result<Bytes>;

    /// Chunks for parts with a `Content-Length`, lines for the others.
    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        let res = if this.length.is_some() {
            ready!(this.poll_chunk(cx, this.chunk_size))
        } else {
            ready!(this.poll_line(cx))
        };

        Poll::Ready(match res {
            Ok(data) if data.is_empty() => None,
            res => Some(res),
        })
    }
}

impl<T, B, E> Part<T>
where
    T: Stream<Item = Result<B, E>> + Unpin + Send,
    B: Into<Bytes>,
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    /// Reads the part to the void, a nested body up to its final boundary.
    pub fn release(&mut self) -> BoxFuture<'_, Result<()>> {
        Box::pin(async move {
            match self {
                Part::Body(part) => part.release().await,
                Part::Multipart(reader) => reader.release().await,
            }
        })
    }
}

impl<T, B, E> MultipartReader<T>
where
    T: Stream<Item = Result<B, E>> + Unpin + Send,
    B: Into<Bytes>,
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    /// Emits the next part, `None` after the final boundary.
    ///
    /// The previous part is drained first if it was not read to its end.
    pub async fn next(&mut self) -> Result<Option<&mut Part<T>>> {
        if self.advance().await? {
            Ok(self.current_mut())
        } else {
            Ok(None)
        }
    }

    /// Reads all the parts to the void till the final boundary.
    pub async fn release(&mut self) -> Result<()> {
        while self.advance().await? {
            if let Some(part) = self.last_part.as_mut() {
                part.release().await?;
            }
        }

        trace!("multipart released");

        Ok(())
    }

    /// Moves to the next part, `false` once the final boundary is read.
    pub(crate) async fn advance(&mut self) -> Result<bool> {
        if self.eof {
            return Ok(false);
        }

        self.release_last_part().await?;

        if self.read_boundary().await? == Delimiter::Last {
            debug!("final boundary reached after {} parts", self.total);
            self.eof = true;
            return Ok(false);
        }

        if let Some(max) = self.limits.checked_parts(self.total + 1) {
            return Err(Error::PartsTooMany(max));
        }

        let headers = self.read_headers().await?;
        let part = self.part_reader(headers)?;

        self.total += 1;
        self.last_part.replace(part);

        Ok(true)
    }

    async fn release_last_part(&mut self) -> Result<()> {
        if let Some(mut part) = self.last_part.take() {
            if !part.at_eof() {
                trace!("draining unread part");
                part.release().await?;
            }
            self.unread.extend(part.take_unread());
        }
        Ok(())
    }

    async fn read_boundary(&mut self) -> Result<Delimiter> {
        let line = match self.unread.pop_front() {
            Some(line) => line,
            None => self.content.readline().await?,
        };

        if line.is_empty() {
            return Err(Error::UnexpectedEof);
        }

        match_boundary(&line, &self.boundary).ok_or_else(|| Error::MalformedBoundaryLine {
            expected: String::from_utf8_lossy(&self.boundary).into_owned(),
            found: String::from_utf8_lossy(strip_eol(&line).0).into_owned(),
        })
    }

    async fn read_headers(&mut self) -> Result<HeaderMap> {
        let mut block = BytesMut::new();
        loop {
            let line = self.content.readline().await?;
            if line.is_empty() {
                return Err(Error::UnexpectedEof);
            }
            block.extend_from_slice(&line);
            if strip_eol(&line).0.is_empty() {
                break;
            }
        }

        let headers = parse_part_headers(&block, self.limits.headers)?;
        trace!("parse part headers {:?}", headers);
        Ok(headers)
    }
}

impl<T, B, E> MultipartResponse<T>
where
    T: Stream<Item = Result<B, E>> + Unpin + Send,
    B: Into<Bytes>,
    E: Into<Box<dyn StdError + Send + Sync>>,
{
    /// Emits the next part, releasing the response once the final boundary is read.
    pub async fn next(&mut self) -> Result<Option<&mut Part<T>>> {
        if self.released {
            return Ok(None);
        }

        if self.reader.advance().await? {
            return Ok(self.reader.current_mut());
        }

        self.release().await?;
        Ok(None)
    }

    /// Releases the response, reading all the remaining content to the void.
    pub async fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }

        self.content.drain().await?;
        self.released = true;

        debug!("response released after {} bytes", self.content.len());

        Ok(())
    }
}
