//! Streaming response handling

use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use futures::StreamExt;

use crate::errors::Result;
use crate::errors::WooError;

/// Streaming response from LLM
pub struct StreamingResponse {
    stream: Pin<Box<dyn Stream<Item = Result<String>> + Send>>,
}

impl StreamingResponse {
    pub fn new(stream: Pin<Box<dyn Stream<Item = Result<String>> + Send>>) -> Self {
        Self { stream }
    }

    /// Wrap an already-known fragment sequence
    pub fn from_fragments<I>(fragments: I) -> Self
    where
        I: IntoIterator<Item = Result<String>>,
        I::IntoIter: Send + 'static,
    {
        Self::new(Box::pin(futures::stream::iter(fragments)))
    }

    /// End with a `Generation` error once no fragment arrives within `idle`.
    /// The whole generation may take longer than `idle`.
    pub fn with_idle_timeout(self, idle: Duration) -> Self {
        let stream = futures::stream::unfold(Some(self.stream), move |stream| async move {
            let mut stream = stream?;
            match tokio::time::timeout(idle, stream.next()).await {
                Ok(Some(item)) => Some((item, Some(stream))),
                Ok(None) => None,
                Err(_) => {
                    let err = WooError::Generation(format!(
                        "no output from the model for {}ms",
                        idle.as_millis()
                    ));
                    Some((Err(err), None))
                }
            }
        });
        Self::new(Box::pin(stream))
    }

    /// Next fragment, or `None` at end-of-generation
    pub async fn next_fragment(&mut self) -> Option<Result<String>> {
        self.stream.next().await
    }

    /// Collect all chunks into a single string
    pub async fn collect_all(mut self) -> Result<String> {
        let mut result = String::new();
        while let Some(chunk) = self.stream.next().await {
            result.push_str(&chunk?);
        }
        Ok(result)
    }

    /// Get the underlying stream
    pub fn into_stream(self) -> Pin<Box<dyn Stream<Item = Result<String>> + Send>> {
        self.stream
    }
}

/// Reassembles newline-terminated lines from arbitrarily split byte chunks
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    /// Append bytes and return every line completed by them, without terminators
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);
        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line);
            let text = text.trim_end_matches(['\n', '\r']);
            if !text.trim().is_empty() {
                lines.push(text.to_string());
            }
        }
        lines
    }

    /// Whatever is left once the body has ended
    pub fn finish(&mut self) -> Option<String> {
        let rest = String::from_utf8_lossy(&std::mem::take(&mut self.pending))
            .trim()
            .to_string();
        (!rest.is_empty()).then_some(rest)
    }
}

/// Turn an HTTP body stream into a stream of non-empty lines
pub fn body_lines<S, B, E>(body: S) -> impl Stream<Item = Result<String>> + Send
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let body = Box::pin(body);
    futures::stream::unfold(
        (body, LineBuffer::default(), std::collections::VecDeque::new(), false),
        |(mut body, mut buffer, mut ready, mut ended)| async move {
            loop {
                if let Some(line) = ready.pop_front() {
                    return Some((Ok(line), (body, buffer, ready, ended)));
                }
                if ended {
                    return None;
                }
                match body.next().await {
                    Some(Ok(bytes)) => ready.extend(buffer.push(bytes.as_ref())),
                    Some(Err(e)) => {
                        ended = true;
                        let err = WooError::Generation(format!("Stream error: {e}"));
                        return Some((Err(err), (body, buffer, ready, ended)));
                    }
                    None => {
                        ended = true;
                        ready.extend(buffer.finish());
                    }
                }
            }
        },
    )
}
