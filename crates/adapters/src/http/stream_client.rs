use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use domain::alert::error::SyncError;
use domain::common::entity::Identity;
use futures::{Stream, StreamExt};
use ports::secondary::push_channel::{PushChannel, PushConnection};

use super::{alerts_path, connection_error};

type ChunkStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, reqwest::Error>> + Send>>;

/// Push channel over a long-lived HTTP response carrying newline-delimited
/// JSON. One alert document per line; blank lines are keep-alives.
///
/// The client carries a connect timeout only — the response body is
/// expected to stay open indefinitely.
pub struct HttpPushChannel {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpPushChannel {
    pub fn new(base_url: &str, token: Option<String>, connect_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .expect("failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }
}

impl PushChannel for HttpPushChannel {
    fn connect<'a>(
        &'a self,
        identity: &'a Identity,
    ) -> Pin<Box<dyn Future<Output = Result<Box<dyn PushConnection>, SyncError>> + Send + 'a>>
    {
        Box::pin(async move {
            let url = format!("{}{}/stream", self.base_url, alerts_path(identity));
            let mut req = self.client.get(&url);
            if let Some(ref token) = self.token {
                req = req.bearer_auth(token);
            }
            let resp = req
                .send()
                .await
                .map_err(|e| SyncError::ConnectionLost(connection_error(&self.base_url, &e)))?;
            if !resp.status().is_success() {
                return Err(SyncError::ConnectionLost(format!(
                    "stream request rejected with status {}",
                    resp.status()
                )));
            }
            tracing::debug!(identity = %identity, "push stream established");
            let chunks: ChunkStream =
                Box::pin(resp.bytes_stream().map(|chunk| chunk.map(|c| c.to_vec())));
            Ok(Box::new(NdjsonConnection::new(chunks)) as Box<dyn PushConnection>)
        })
    }
}

/// Reassembles complete lines out of arbitrarily chunked body bytes.
struct NdjsonConnection {
    chunks: ChunkStream,
    buffer: Vec<u8>,
    closed: bool,
}

impl NdjsonConnection {
    fn new(chunks: ChunkStream) -> Self {
        Self {
            chunks,
            buffer: Vec::new(),
            closed: false,
        }
    }

    /// Next complete non-blank line in the buffer, if any.
    fn take_line(&mut self) -> Option<Vec<u8>> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            if !line.iter().all(u8::is_ascii_whitespace) {
                return Some(line);
            }
        }
        None
    }

    /// Unterminated trailing line left when the body ends.
    fn take_remainder(&mut self) -> Option<Vec<u8>> {
        let rest = std::mem::take(&mut self.buffer);
        if rest.iter().all(u8::is_ascii_whitespace) {
            None
        } else {
            Some(rest)
        }
    }
}

impl PushConnection for NdjsonConnection {
    fn next_message(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = Option<Result<Vec<u8>, SyncError>>> + Send + '_>> {
        Box::pin(async move {
            loop {
                if let Some(line) = self.take_line() {
                    return Some(Ok(line));
                }
                if self.closed {
                    return self.take_remainder().map(Ok);
                }
                match self.chunks.next().await {
                    Some(Ok(chunk)) => self.buffer.extend_from_slice(&chunk),
                    Some(Err(e)) => {
                        self.closed = true;
                        return Some(Err(SyncError::ConnectionLost(format!(
                            "push stream failed: {e}"
                        ))));
                    }
                    None => self.closed = true,
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection_from(chunks: Vec<Result<Vec<u8>, reqwest::Error>>) -> NdjsonConnection {
        NdjsonConnection::new(Box::pin(futures::stream::iter(chunks)))
    }

    fn ok(bytes: &[u8]) -> Result<Vec<u8>, reqwest::Error> {
        Ok(bytes.to_vec())
    }

    #[tokio::test]
    async fn line_split_across_chunks_is_reassembled() {
        let mut conn = connection_from(vec![ok(b"{\"id\":"), ok(b"\"a1\"}\n")]);

        let msg = conn.next_message().await.unwrap().unwrap();
        assert_eq!(msg, b"{\"id\":\"a1\"}");
        assert!(conn.next_message().await.is_none());
    }

    #[tokio::test]
    async fn multiple_lines_in_one_chunk_are_delivered_in_order() {
        let mut conn = connection_from(vec![ok(b"{\"id\":\"a\"}\n{\"id\":\"b\"}\n")]);

        assert_eq!(conn.next_message().await.unwrap().unwrap(), b"{\"id\":\"a\"}");
        assert_eq!(conn.next_message().await.unwrap().unwrap(), b"{\"id\":\"b\"}");
        assert!(conn.next_message().await.is_none());
    }

    #[tokio::test]
    async fn blank_keepalive_lines_are_skipped() {
        let mut conn = connection_from(vec![ok(b"\n\r\n{\"id\":\"a\"}\n\n")]);

        assert_eq!(conn.next_message().await.unwrap().unwrap(), b"{\"id\":\"a\"}");
        assert!(conn.next_message().await.is_none());
    }

    #[tokio::test]
    async fn crlf_terminators_are_stripped() {
        let mut conn = connection_from(vec![ok(b"{\"id\":\"a\"}\r\n")]);

        assert_eq!(conn.next_message().await.unwrap().unwrap(), b"{\"id\":\"a\"}");
    }

    #[tokio::test]
    async fn unterminated_trailing_line_is_delivered_on_close() {
        let mut conn = connection_from(vec![ok(b"{\"id\":\"a\"}")]);

        assert_eq!(conn.next_message().await.unwrap().unwrap(), b"{\"id\":\"a\"}");
        assert!(conn.next_message().await.is_none());
    }

    #[tokio::test]
    async fn clean_end_of_body_reads_as_orderly_close() {
        let mut conn = connection_from(vec![ok(b"{\"id\":\"a\"}\n")]);

        assert!(conn.next_message().await.unwrap().is_ok());
        assert!(conn.next_message().await.is_none());
        // Close is sticky.
        assert!(conn.next_message().await.is_none());
    }
}
