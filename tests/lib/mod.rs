#![allow(dead_code)]

use anyhow::Result;
use futures_util::io::Cursor;
use http::{
    header::{HeaderValue, CONTENT_TYPE},
    HeaderMap,
};

use couch_multipart::{Limits, MultipartReader};

mod limited;
pub use limited::Limited;

pub type Body = Limited<Cursor<Vec<u8>>>;

pub fn tracing_init() {
    // every test of a binary calls this, only the first one installs it
    let _ = tracing_subscriber::fmt()
        // From env var: `RUST_LOG`
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// An in-memory body, split into small random chunks.
pub fn body(data: impl Into<Vec<u8>>) -> Body {
    Limited::random_with(Cursor::new(data.into()), 16)
}

pub fn content_type(value: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(value));
    headers
}

pub fn reader(value: &'static str, data: impl Into<Vec<u8>>) -> Result<MultipartReader<Body>> {
    Ok(MultipartReader::new(content_type(value), body(data))?)
}

pub fn reader_with_limits(
    value: &'static str,
    data: impl Into<Vec<u8>>,
    limits: Limits,
) -> Result<MultipartReader<Body>> {
    Ok(MultipartReader::with_limits(
        content_type(value),
        body(data),
        limits,
    )?)
}
