use futures::{Stream, StreamExt};
use reqwest::{
    StatusCode,
    multipart::{Form, Part},
};
use tracing::{debug, instrument, warn};

use crate::{
    activity::ActivityLog,
    emotion::ServerChunk,
    error::{CoreError, Result},
    media::MediaAsset,
    types::EmotionSegment,
};

/// Splits a byte stream into complete lines, holding back the trailing
/// partial line until the next chunk arrives.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and drain every line it completes.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let Some(last_newline) = self.pending.iter().rposition(|&b| b == b'\n') else {
            return Vec::new();
        };

        let complete: Vec<u8> = self.pending.drain(..=last_newline).collect();
        complete[..complete.len() - 1]
            .split(|&b| b == b'\n')
            .map(|line| String::from_utf8_lossy(line).into_owned())
            .collect()
    }

    /// Bytes of the line still waiting for its newline.
    pub fn remainder(&self) -> &[u8] {
        &self.pending
    }
}

/// Parse one NDJSON line. Blank lines are ignored, malformed ones logged and skipped.
fn parse_line(line: &str) -> Option<EmotionSegment> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<ServerChunk>(trimmed) {
        Ok(chunk) => Some(chunk.into()),
        Err(e) => {
            warn!(error = %e, line = trimmed, "skipping malformed stream line");
            None
        }
    }
}

/// Drain an NDJSON byte stream into `accumulated`, invoking `on_chunk` for
/// every parsed segment in arrival order.
///
/// A transport error ends consumption; everything parsed before it stays in
/// `accumulated`. A trailing line without a newline is discarded.
pub async fn consume_ndjson<S, B, E, F>(
    stream: S,
    accumulated: &mut Vec<EmotionSegment>,
    on_chunk: &mut F,
) -> std::result::Result<(), E>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    F: FnMut(&EmotionSegment, &[EmotionSegment]),
{
    let mut stream = std::pin::pin!(stream);
    let mut buffer = LineBuffer::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for line in buffer.push(chunk.as_ref()) {
            if let Some(segment) = parse_line(&line) {
                accumulated.push(segment);
                let all = accumulated.as_slice();
                if let Some(latest) = all.last() {
                    on_chunk(latest, all);
                }
            }
        }
    }

    if !buffer.remainder().is_empty() {
        debug!(
            bytes = buffer.remainder().len(),
            "discarding unterminated final line"
        );
    }
    Ok(())
}

/// Client for the remote emotion-analysis server.
#[derive(Debug, Clone)]
pub struct EmotionStreamClient {
    client: reqwest::Client,
    server_url: String,
    log: ActivityLog,
}

impl EmotionStreamClient {
    pub fn new(server_url: &str, log: ActivityLog) -> Self {
        Self {
            client: reqwest::Client::new(),
            server_url: server_url.trim_end_matches('/').to_string(),
            log,
        }
    }

    pub fn endpoint(&self) -> String {
        format!("{}/analyze", self.server_url)
    }

    /// Upload `asset` and collect the streamed emotion segments.
    ///
    /// Never fails: connection errors and mid-stream drops are logged and
    /// whatever arrived so far is returned.
    #[instrument(skip_all, fields(endpoint = %self.endpoint()))]
    pub async fn analyze<F>(&self, asset: &MediaAsset, mut on_chunk: F) -> Vec<EmotionSegment>
    where
        F: FnMut(&EmotionSegment, &[EmotionSegment]),
    {
        let mut accumulated = Vec::new();
        self.log
            .info(format!("Connecting to emotion server at {}", self.endpoint()));

        let response = match self.open_stream(asset).await {
            Ok(response) => response,
            Err(e) => {
                self.log.error(format!("Emotion analysis failed: {e}"));
                return accumulated;
            }
        };

        self.log.info("Emotion stream open, receiving segments...");
        match consume_ndjson(response.bytes_stream(), &mut accumulated, &mut on_chunk).await {
            Ok(()) => self.log.success(format!(
                "Emotion analysis complete: {} segments",
                accumulated.len()
            )),
            Err(e) => self.log.warn(format!(
                "Emotion stream interrupted after {} segments: {e}",
                accumulated.len()
            )),
        }

        accumulated
    }

    async fn open_stream(&self, asset: &MediaAsset) -> Result<reqwest::Response> {
        let part = Part::bytes(asset.read_bytes().await?)
            .file_name(asset.file_name())
            .mime_str(&asset.mime_type)?;
        let form = Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response),
            StatusCode::NOT_FOUND => Err(CoreError::EndpointNotFound {
                url: self.endpoint(),
            }),
            StatusCode::BAD_GATEWAY => Err(CoreError::BadGateway {
                url: self.endpoint(),
            }),
            status => Err(CoreError::ServerStatus {
                status: status.as_u16(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures::stream;

    use super::*;

    const LINE_A: &str =
        r#"{"start":0,"end":10,"emotions":{"arousal":0.6,"valence":0.6,"dominance":0.4}}"#;
    const LINE_B: &str = r#"{"start":10,"end":20,"emotions":{"arousal":0.2,"valence":0.2,"dominance":0.2},"disturbances":["Chatter"]}"#;

    fn ignore(_: &EmotionSegment, _: &[EmotionSegment]) {}

    fn chunks(parts: &[&str]) -> Vec<std::result::Result<Bytes, std::io::Error>> {
        parts
            .iter()
            .map(|part| Ok(Bytes::copy_from_slice(part.as_bytes())))
            .collect()
    }

    #[test]
    fn line_buffer_holds_partial_line() {
        let mut buffer = LineBuffer::new();
        assert!(buffer.push(b"{\"a\":").is_empty());
        assert_eq!(buffer.push(b"1}\n{\"b\""), vec!["{\"a\":1}".to_string()]);
        assert_eq!(buffer.remainder(), b"{\"b\"");
        assert_eq!(buffer.push(b":2}\n\n"), vec!["{\"b\":2}".to_string(), String::new()]);
        assert!(buffer.remainder().is_empty());
    }

    #[test]
    fn line_buffer_keeps_multibyte_characters_split_across_chunks() {
        let mut buffer = LineBuffer::new();
        let text = "café\n".as_bytes();
        assert!(buffer.push(&text[..4]).is_empty());
        assert_eq!(buffer.push(&text[4..]), vec!["café".to_string()]);
    }

    #[tokio::test]
    async fn truncated_final_line_is_discarded() {
        let body = format!("{LINE_A}\n{LINE_B}\n{{\"start\":20,\"end\"");
        let mut accumulated = Vec::new();
        let mut seen = Vec::new();

        consume_ndjson(
            stream::iter(chunks(&[&body[..30], &body[30..]])),
            &mut accumulated,
            &mut |segment: &EmotionSegment, all: &[EmotionSegment]| {
                seen.push((segment.start, all.len()));
            },
        )
        .await
        .unwrap();

        assert_eq!(accumulated.len(), 2);
        assert_eq!(seen, vec![(0.0, 1), (10.0, 2)]);
        assert_eq!(accumulated[1].disturbances, vec!["Chatter".to_string()]);
    }

    #[tokio::test]
    async fn malformed_line_is_skipped() {
        let body = format!("{LINE_A}\nnot json\n{LINE_B}\n");
        let mut accumulated = Vec::new();
        consume_ndjson(stream::iter(chunks(&[&body])), &mut accumulated, &mut ignore)
            .await
            .unwrap();
        assert_eq!(accumulated.len(), 2);
    }

    #[tokio::test]
    async fn transport_error_keeps_earlier_segments() {
        let items: Vec<std::result::Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from(format!("{LINE_A}\n"))),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
            Ok(Bytes::from(format!("{LINE_B}\n"))),
        ];
        let mut accumulated = Vec::new();
        let result = consume_ndjson(stream::iter(items), &mut accumulated, &mut ignore).await;

        assert!(result.is_err());
        assert_eq!(accumulated.len(), 1);
    }

    #[test]
    fn endpoint_trims_trailing_slash() {
        let client = EmotionStreamClient::new("https://tunnel.example/", ActivityLog::new());
        assert_eq!(client.endpoint(), "https://tunnel.example/analyze");
    }
}
