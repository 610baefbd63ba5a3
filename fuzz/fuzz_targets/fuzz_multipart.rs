#![no_main]
use libfuzzer_sys::fuzz_target;

use std::convert::Infallible;
use std::time::Duration;

use bytes::Bytes;
use couch_multipart::MultipartReader;
use futures_util::stream::{once, Once};
use http::{header::CONTENT_TYPE, HeaderMap, HeaderValue};
use tokio::{runtime, time::timeout};

const PART_TIMEOUT: Duration = Duration::from_millis(10);

type Body = Once<std::future::Ready<Result<Bytes, Infallible>>>;

fuzz_target!(|data: &[u8]| {
    let body: Body = once(std::future::ready(Ok(Bytes::from(data.to_vec()))));

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("multipart/mixed; boundary=BOUNDARY"),
    );

    let rt = runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime");

    let Ok(multipart) = MultipartReader::new(headers, body) else {
        return;
    };

    async fn run(mut multipart: MultipartReader<Body>) {
        while let Ok(Some(part)) = multipart.next().await {
            if part.is_multipart() {
                let _ = timeout(PART_TIMEOUT, part.release()).await;
            } else if let Some(body) = part.as_body_mut() {
                let _ = timeout(PART_TIMEOUT, body.read(true)).await;
            }
        }
    }

    rt.block_on(run(multipart))
});
