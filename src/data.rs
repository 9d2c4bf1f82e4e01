use futures::stream::MapErr;
use futures::TryStreamExt;
use tokio::io::{AsyncReadExt, AsyncWrite, Take};
use tokio_util::io::StreamReader;

use crate::ThicketError;

/// The data stream of a request body.
///
/// Reading a body always happens against a limit; the only difference is
/// whether or not the caller is prepared to handle that limit.  The stream
/// reads at most one byte past the limit, which is how it tells a body that
/// is exactly at the limit apart from one that exceeds it.
#[derive(Debug)]
#[must_use = "this consumes the body of the request regardless of whether it is used"]
pub struct DataStream {
    stream: Take<StreamReader<HttpStream, hyper::body::Bytes>>,
}

type HttpStream = MapErr<hyper::Body, fn(hyper::Error) -> std::io::Error>;

impl DataStream {
    pub(crate) fn new(body: hyper::Body, limit: u64) -> Self {
        Self {
            stream: StreamReader::new(body.map_err(map_hyper_error as fn(_) -> _))
                .take(limit.saturating_add(1)),
        }
    }

    // Only meaningful once the stream has been drained.
    fn limit_exceeded(&self) -> bool {
        self.stream.limit() == 0
    }

    /// Streams the body into the given writer, returning the number of bytes
    /// written.
    ///
    /// # Errors
    /// Fails if the body cannot be read, or if it is larger than the limit.
    pub async fn into<W: AsyncWrite + Unpin>(mut self, writer: &mut W) -> Result<u64, ThicketError> {
        let written = tokio::io::copy(&mut self.stream, writer)
            .await
            .map_err(ThicketError::ReadBody)?;
        if self.limit_exceeded() {
            return Err(ThicketError::PayloadTooLarge(anyhow::anyhow!(
                "body exceeded {} bytes",
                written.saturating_sub(1)
            )));
        }
        Ok(written)
    }

    /// Reads the whole body into a buffer.
    ///
    /// # Errors
    /// Fails for the same reasons as [`DataStream::into`].
    pub async fn into_bytes(self) -> Result<Vec<u8>, ThicketError> {
        let mut buf = Vec::new();
        self.into(&mut buf).await?;
        Ok(buf)
    }

    /// Reads the whole body into a string.
    ///
    /// # Errors
    /// Fails for the same reasons as [`DataStream::into_bytes`], and also if
    /// the body is not valid UTF-8.
    pub async fn into_text(self) -> Result<String, ThicketError> {
        let bytes = self.into_bytes().await?;
        String::from_utf8(bytes).map_err(ThicketError::TextDeserialization)
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    /// Fails for the same reasons as [`DataStream::into_bytes`], and also if
    /// the body is not valid JSON for the given type.
    #[cfg(feature = "json")]
    #[cfg_attr(nightly, doc(cfg(feature = "json")))]
    pub async fn into_json<T: serde::de::DeserializeOwned>(self) -> Result<T, ThicketError> {
        let bytes = self.into_bytes().await?;
        serde_json::from_slice(&bytes[..]).map_err(ThicketError::JsonDeserialization)
    }
}

fn map_hyper_error(e: hyper::Error) -> std::io::Error {
    if e.is_closed() || e.is_incomplete_message() || e.is_canceled() {
        std::io::Error::new(std::io::ErrorKind::UnexpectedEof, e)
    } else {
        std::io::Error::new(std::io::ErrorKind::Other, e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_within_limit() {
        let stream = DataStream::new(hyper::Body::from("hello"), 5);
        assert_eq!(stream.into_text().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn rejects_over_limit() {
        let stream = DataStream::new(hyper::Body::from("hello, world"), 5);
        let error = stream.into_bytes().await.unwrap_err();
        assert!(matches!(error, ThicketError::PayloadTooLarge(_)), "{:?}", error);
    }

    #[tokio::test]
    async fn rejects_invalid_utf8() {
        let stream = DataStream::new(hyper::Body::from(vec![0xff, 0xfe]), 16);
        let error = stream.into_text().await.unwrap_err();
        assert!(matches!(error, ThicketError::TextDeserialization(_)));
    }
}
