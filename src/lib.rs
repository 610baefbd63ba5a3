//! Streaming reader for `multipart/*` HTTP response bodies.
//!
//! Document databases answer requests for documents with attachments, or for
//! several revisions at once, with `multipart/related` and `multipart/mixed`
//! bodies, possibly nested. [`MultipartReader`] walks such a body part by part
//! while it arrives; every part is drained before the next one is parsed, so a
//! skipped part never corrupts the ones after it.
//!
//! # Example
//!
//! ```rust
//! use bytes::Bytes;
//! use futures_util::stream;
//! use http::{header::CONTENT_TYPE, Response};
//!
//! use couch_multipart::{Error, MultipartReader, Part};
//!
//! async fn read() -> Result<(), Error> {
//!     let body: &'static [u8] = b"--XBOUND\r\n\
//!         Content-Type: application/json\r\n\
//!         \r\n\
//!         {\"_id\":\"doc\",\"_attachments\":{\"a.txt\":{\"follows\":true}}}\r\n\
//!         --XBOUND\r\n\
//!         Content-Type: text/plain; charset=utf-8\r\n\
//!         Content-Length: 5\r\n\
//!         \r\n\
//!         hello\r\n\
//!         --XBOUND--";
//!
//!     let chunks = stream::iter([Ok::<_, std::io::Error>(Bytes::from_static(body))]);
//!     let response = Response::builder()
//!         .header(CONTENT_TYPE, "multipart/related; boundary=XBOUND")
//!         .body(chunks)
//!         .expect("response");
//!
//!     let mut multipart = MultipartReader::from_response(response)?;
//!
//!     while let Some(part) = multipart.next().await? {
//!         match part {
//!             Part::Body(part) if part.length().is_none() => {
//!                 let doc = part.json(None).await?;
//!                 tracing::info!("document {}", doc["_id"]);
//!             }
//!             Part::Body(part) => {
//!                 let text = part.text(None).await?;
//!                 tracing::info!("attachment {}", text);
//!             }
//!             Part::Multipart(reader) => reader.release().await?,
//!         }
//!     }
//!
//!     assert!(multipart.is_released());
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(nonstandard_style)]
#![warn(missing_docs, unreachable_pub)]

mod decode;
mod error;
mod limits;
mod multipart;
mod part;
mod response;
mod state;
mod utils;

pub use multipart::{MultipartReader, Part};

pub use part::BodyPartReader;

pub use response::MultipartResponse;

pub use limits::Limits;

pub use error::Error;

pub(crate) type Result<T, E = Error> = std::result::Result<T, E>;

mod r#async;
