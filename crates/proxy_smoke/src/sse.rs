//! Server-sent event decoding for streamed chat completions

use async_openai::types::CreateChatCompletionStreamResponse;
use futures::stream::{self, BoxStream, StreamExt};
use tracing::trace;

use crate::backend::{ChunkStream, StreamChunk};
use crate::error::{Result, SmokeError};

const DONE_MARKER: &str = "[DONE]";

/// Raw response body, already split into network reads
pub(crate) type ByteStream = BoxStream<'static, Result<Vec<u8>>>;

/// Decode an OpenAI SSE body into chunks.
///
/// Ends at `data: [DONE]`. A body that ends before the marker, or a read
/// error, yields one final error item.
pub(crate) fn decode_chunks(body: ByteStream) -> ChunkStream {
    let reader = EventReader {
        body,
        buffer: Vec::new(),
        body_done: false,
        finished: false,
    };

    stream::unfold(reader, |mut reader| async move {
        let item = reader.next_chunk().await?;
        Some((item, reader))
    })
    .boxed()
}

struct EventReader {
    body: ByteStream,
    buffer: Vec<u8>,
    body_done: bool,
    finished: bool,
}

impl EventReader {
    async fn next_chunk(&mut self) -> Option<Result<StreamChunk>> {
        while !self.finished {
            if let Some(line) = self.take_line() {
                match event_data(&line) {
                    Some(DONE_MARKER) => self.finished = true,
                    Some(data) => return Some(parse_chunk(data)),
                    None => {}
                }
                continue;
            }

            if self.body_done {
                self.finished = true;
                return Some(Err(SmokeError::Stream(
                    "stream ended before [DONE]".to_string(),
                )));
            }

            match self.body.next().await {
                Some(Ok(bytes)) => {
                    trace!(bytes = bytes.len(), "received SSE data");
                    self.buffer.extend_from_slice(&bytes);
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
                None => {
                    self.body_done = true;
                    // Flush a last line sent without its newline
                    if !self.buffer.is_empty() {
                        self.buffer.push(b'\n');
                    }
                }
            }
        }
        None
    }

    fn take_line(&mut self) -> Option<String> {
        let end = self.buffer.iter().position(|&b| b == b'\n')?;
        let line: Vec<u8> = self.buffer.drain(..=end).collect();
        Some(String::from_utf8_lossy(&line).trim_end().to_string())
    }
}

/// Payload of a `data:` line; comments, blank lines and other fields carry none
fn event_data(line: &str) -> Option<&str> {
    line.strip_prefix("data:").map(str::trim)
}

fn parse_chunk(data: &str) -> Result<StreamChunk> {
    let response: CreateChatCompletionStreamResponse = serde_json::from_str(data)?;

    // Chunks without choices (usage trailers) carry no content
    Ok(StreamChunk {
        content: response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.delta.content),
    })
}
