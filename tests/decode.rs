use std::io::Write;

use anyhow::Result;
use async_fs::File;
use flate2::{
    write::{DeflateEncoder, GzEncoder},
    Compression,
};
use serde::Deserialize;
use serde_json::json;

use couch_multipart::*;

mod lib;

use lib::{content_type, reader, tracing_init, Limited};

const MIXED: &str = "multipart/mixed; boundary=XBOUND";

const PLAINTEXT: &[u8] = b"{\"_id\":\"doc\",\"body\":\"line one\\nline two\"}\n\
and some trailing text, repeated: aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\r\n";

fn single(headers: &str, payload: &[u8]) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(b"--XBOUND\r\n");
    data.extend_from_slice(headers.as_bytes());
    data.extend_from_slice(b"\r\n");
    data.extend_from_slice(payload);
    data.extend_from_slice(b"\r\n--XBOUND--\r\n");
    data
}

#[tokio::test]
async fn gzip() -> Result<()> {
    tracing_init();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(PLAINTEXT)?;
    let compressed = encoder.finish()?;

    let headers = format!(
        "Content-Encoding: gzip\r\nContent-Length: {}\r\n",
        compressed.len()
    );
    let mut multipart = reader(MIXED, single(&headers, &compressed))?;

    let part = multipart.next().await?.and_then(Part::as_body_mut).unwrap();
    assert_eq!(part.read(true).await?, PLAINTEXT);

    Ok(())
}

#[tokio::test]
async fn deflate() -> Result<()> {
    tracing_init();

    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(PLAINTEXT)?;
    let compressed = encoder.finish()?;

    let headers = format!(
        "Content-Encoding: deflate\r\nContent-Length: {}\r\n",
        compressed.len()
    );
    let mut multipart = reader(MIXED, single(&headers, &compressed))?;

    let part = multipart.next().await?.and_then(Part::as_body_mut).unwrap();
    assert_eq!(part.read(true).await?, PLAINTEXT);

    Ok(())
}

#[tokio::test]
async fn raw_read_keeps_encoding() -> Result<()> {
    tracing_init();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(PLAINTEXT)?;
    let compressed = encoder.finish()?;

    let headers = format!(
        "Content-Encoding: gzip\r\nContent-Length: {}\r\n",
        compressed.len()
    );
    let mut multipart = reader(MIXED, single(&headers, &compressed))?;

    let part = multipart.next().await?.and_then(Part::as_body_mut).unwrap();
    let raw = part.read(false).await?;
    assert_eq!(raw, compressed);
    assert_eq!(part.decode(raw)?, PLAINTEXT);

    Ok(())
}

#[tokio::test]
async fn unsupported_encoding() -> Result<()> {
    tracing_init();

    let mut multipart = reader(
        MIXED,
        single("Content-Encoding: br\r\nContent-Length: 4\r\n", b"abcd"),
    )?;

    let part = multipart.next().await?.and_then(Part::as_body_mut).unwrap();
    assert!(matches!(
        part.read(true).await,
        Err(Error::UnsupportedContentEncoding(e)) if e == "br"
    ));

    Ok(())
}

#[tokio::test]
async fn text_charsets() -> Result<()> {
    tracing_init();

    let mut multipart = reader(
        MIXED,
        single("Content-Type: text/plain; charset=utf-8\r\n", "café".as_bytes()),
    )?;
    let part = multipart.next().await?.and_then(Part::as_body_mut).unwrap();
    assert_eq!(part.charset("latin1"), "utf-8");
    assert_eq!(part.text(None).await?, "café\r\n");

    // latin1 by default
    let mut multipart = reader(MIXED, single("Content-Type: text/plain\r\n", b"caf\xe9"))?;
    let part = multipart.next().await?.and_then(Part::as_body_mut).unwrap();
    assert_eq!(part.text(None).await?, "café\r\n");

    // every byte is its own code point, C1 controls included
    let mut multipart = reader(MIXED, single("Content-Length: 2\r\n", b"\x80\x9f"))?;
    let part = multipart.next().await?.and_then(Part::as_body_mut).unwrap();
    assert_eq!(part.text(None).await?, "\u{80}\u{9f}");

    // explicit encoding wins over the header
    let mut multipart = reader(
        MIXED,
        single("Content-Type: text/plain; charset=latin1\r\n", "café".as_bytes()),
    )?;
    let part = multipart.next().await?.and_then(Part::as_body_mut).unwrap();
    assert_eq!(part.text(Some("utf-8")).await?, "café\r\n");

    let mut multipart = reader(
        MIXED,
        single("Content-Type: text/plain; charset=x-unknown\r\n", b"abc"),
    )?;
    let part = multipart.next().await?.and_then(Part::as_body_mut).unwrap();
    assert!(matches!(
        part.text(None).await,
        Err(Error::UnknownCharset(c)) if c == "x-unknown"
    ));

    Ok(())
}

#[tokio::test]
async fn gzipped_text() -> Result<()> {
    tracing_init();

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all("naïve".as_bytes())?;
    let compressed = encoder.finish()?;

    let headers = format!(
        "Content-Type: text/plain; charset=utf-8\r\nContent-Encoding: gzip\r\nContent-Length: {}\r\n",
        compressed.len()
    );
    let mut multipart = reader(MIXED, single(&headers, &compressed))?;

    let part = multipart.next().await?.and_then(Part::as_body_mut).unwrap();
    assert_eq!(part.text(None).await?, "naïve");

    Ok(())
}

#[derive(Debug, Deserialize, PartialEq)]
struct Doc {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_rev")]
    rev: String,
}

#[tokio::test]
async fn json() -> Result<()> {
    tracing_init();

    let payload = br#"{"_id":"doc","_rev":"1-abc"}"#;

    let mut multipart = reader(MIXED, single("Content-Type: application/json\r\n", payload))?;
    let part = multipart.next().await?.and_then(Part::as_body_mut).unwrap();
    assert_eq!(part.json(None).await?, json!({"_id": "doc", "_rev": "1-abc"}));

    let mut multipart = reader(MIXED, single("Content-Type: application/json\r\n", payload))?;
    let part = multipart.next().await?.and_then(Part::as_body_mut).unwrap();
    assert_eq!(
        part.json_as::<Doc>(None).await?,
        Some(Doc {
            id: "doc".into(),
            rev: "1-abc".into()
        })
    );

    let mut multipart = reader(MIXED, single("Content-Type: application/json\r\n", b"{"))?;
    let part = multipart.next().await?.and_then(Part::as_body_mut).unwrap();
    assert!(matches!(part.json(None).await, Err(Error::Json(_))));

    Ok(())
}

#[tokio::test]
async fn next_chunks() -> Result<()> {
    tracing_init();

    let mut multipart = reader(MIXED, single("Content-Length: 5\r\n", b"hello"))?;
    let part = multipart.next().await?.and_then(Part::as_body_mut).unwrap();

    assert_eq!(part.next().await?.as_deref(), Some(&b"hello"[..]));
    assert_eq!(part.next().await?, None);

    Ok(())
}

#[tokio::test]
async fn document_with_attachments() -> Result<()> {
    tracing_init();

    let body = Limited::random(File::open("tests/fixtures/couchdb-attachments.txt").await?);
    let mut multipart =
        MultipartReader::new(content_type("multipart/related; boundary=abc123"), body)?;

    let doc = multipart.next().await?.and_then(Part::as_body_mut).unwrap();
    assert_eq!(doc.length(), None);
    let doc = doc.json(None).await?;
    assert_eq!(doc["_id"], "SpaghettiWithMeatballs");
    assert_eq!(doc["_attachments"]["recipe.txt"]["length"], 90);

    let recipe = multipart.next().await?.and_then(Part::as_body_mut).unwrap();
    assert_eq!(recipe.length(), Some(90));
    assert_eq!(
        recipe.text(None).await?,
        "1. Cook spaghetti\r\n2. Cook meatballs\r\n3. Mix them\r\n4. Add tomato sauce\r\n5. ...\r\n6. PROFIT!"
    );

    let photo = multipart.next().await?.and_then(Part::as_body_mut).unwrap();
    assert_eq!(photo.length(), Some(63));
    assert_eq!(
        photo.read(true).await?,
        b"\x89PNG fake image bytes\n--not a boundary\r\n".repeat(4)
    );

    assert!(multipart.next().await?.is_none());
    assert!(multipart.at_eof());
    assert_eq!(multipart.total(), 3);

    Ok(())
}
