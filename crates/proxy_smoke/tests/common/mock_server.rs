//! Minimal HTTP server speaking just enough of the OpenAI wire format to
//! exercise `ProxyClient`: JSON bodies and SSE chat streams.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, Mutex};

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn body_json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }
}

/// Responses served in order for one path; the last one repeats
#[derive(Clone, Debug)]
pub struct MockRoute {
    path: String,
    responders: Vec<MockResponse>,
}

impl MockRoute {
    pub fn new(path: impl Into<String>, responders: Vec<MockResponse>) -> Self {
        Self {
            path: path.into(),
            responders,
        }
    }

    pub fn single(path: impl Into<String>, responder: MockResponse) -> Self {
        Self::new(path, vec![responder])
    }
}

#[derive(Clone, Debug)]
pub enum MockResponse {
    Json { status: u16, body: serde_json::Value },
    /// `done` sends the closing `data: [DONE]` event
    Sse { events: Vec<serde_json::Value>, done: bool },
}

impl MockResponse {
    pub fn json(body: serde_json::Value) -> Self {
        Self::Json { status: 200, body }
    }

    pub fn status(status: u16, body: serde_json::Value) -> Self {
        Self::Json { status, body }
    }

    /// OpenAI chat stream: one chunk per content item, `None` sends a
    /// delta without content. Terminated by `data: [DONE]`.
    pub fn chat_stream<'a>(contents: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        Self::Sse {
            events: chunk_events(contents),
            done: true,
        }
    }

    /// Chat stream whose connection closes before `data: [DONE]`
    pub fn truncated_chat_stream<'a>(contents: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        Self::Sse {
            events: chunk_events(contents),
            done: false,
        }
    }
}

fn chunk_events<'a>(contents: impl IntoIterator<Item = Option<&'a str>>) -> Vec<serde_json::Value> {
    contents
        .into_iter()
        .map(|content| {
            let delta = match content {
                Some(text) => serde_json::json!({ "content": text }),
                None => serde_json::json!({ "role": "assistant" }),
            };
            serde_json::json!({
                "id": "chatcmpl-mock",
                "object": "chat.completion.chunk",
                "created": 1_700_000_000u32,
                "model": "gpt-3.5-turbo",
                "choices": [
                    {
                        "index": 0,
                        "delta": delta,
                        "finish_reason": null,
                        "logprobs": null
                    }
                ]
            })
        })
        .collect()
}

#[derive(Clone, Debug)]
struct RouteState {
    responders: Vec<MockResponse>,
    call_count: usize,
}

impl RouteState {
    fn next(&mut self) -> Option<MockResponse> {
        if self.responders.is_empty() {
            return None;
        }

        let idx = self.call_count.min(self.responders.len() - 1);
        self.call_count += 1;
        Some(self.responders[idx].clone())
    }
}

struct MockServerState {
    routes: Mutex<HashMap<String, RouteState>>,
    recordings: Mutex<Vec<RecordedRequest>>,
}

pub struct MockOpenAIServer {
    addr: SocketAddr,
    state: Arc<MockServerState>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    join_handle: Option<tokio::task::JoinHandle<()>>,
}

impl MockOpenAIServer {
    pub async fn start(routes: Vec<MockRoute>) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let routes = routes
            .into_iter()
            .map(|route| {
                (
                    route.path,
                    RouteState {
                        responders: route.responders,
                        call_count: 0,
                    },
                )
            })
            .collect();

        let state = Arc::new(MockServerState {
            routes: Mutex::new(routes),
            recordings: Mutex::new(Vec::new()),
        });

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let join_handle = tokio::spawn(run_server(listener, state.clone(), shutdown_rx));

        Ok(Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
            join_handle: Some(join_handle),
        })
    }

    /// Base URL with the OpenAI `/v1` prefix
    pub fn api_base(&self) -> String {
        format!("http://{}/v1", self.addr)
    }

    pub async fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.state.recordings.lock().await.clone()
    }

    pub async fn requests_for(&self, path: &str) -> Vec<RecordedRequest> {
        self.recorded_requests()
            .await
            .into_iter()
            .filter(|record| record.path == path)
            .collect()
    }
}

impl Drop for MockOpenAIServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.join_handle.take() {
            handle.abort();
        }
    }
}

async fn run_server(
    listener: TcpListener,
    state: Arc<MockServerState>,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            biased;
            _ = &mut shutdown_rx => break,
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, _)) => {
                        let state = state.clone();
                        tokio::spawn(async move {
                            let _ = handle_connection(stream, state).await;
                        });
                    }
                    Err(_) => break,
                }
            }
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    state: Arc<MockServerState>,
) -> std::io::Result<()> {
    let mut buffer = Vec::new();
    let mut temp = [0u8; 1024];
    let mut head: Option<(usize, ParsedHead)> = None;

    loop {
        let n = stream.read(&mut temp).await?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&temp[..n]);

        if head.is_none() {
            if let Some(end) = find_header_end(&buffer) {
                head = Some((end, parse_request_head(&buffer[..end])));
            }
        }

        if let Some((end, parsed)) = &head {
            if buffer.len() >= end + parsed.content_length {
                break;
            }
        }
    }

    let Some((end, parsed)) = head else {
        return Ok(());
    };

    let body_end = (end + parsed.content_length).min(buffer.len());
    // Route on the path alone
    let path = parsed
        .path
        .split('?')
        .next()
        .unwrap_or_default()
        .to_string();

    state.recordings.lock().await.push(RecordedRequest {
        method: parsed.method,
        path: path.clone(),
        headers: parsed.headers,
        body: buffer[end..body_end].to_vec(),
    });

    let response = state
        .routes
        .lock()
        .await
        .get_mut(&path)
        .and_then(RouteState::next);

    match response {
        Some(MockResponse::Json { status, body }) => send_json(&mut stream, status, &body).await,
        Some(MockResponse::Sse { events, done }) => send_sse(&mut stream, &events, done).await,
        None => {
            let body = serde_json::json!({
                "error": { "message": format!("no route for {}", path), "type": "not_found" }
            });
            send_json(&mut stream, 404, &body).await
        }
    }
}

fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .map(|idx| idx + 4)
}

struct ParsedHead {
    method: String,
    path: String,
    headers: HashMap<String, String>,
    content_length: usize,
}

fn parse_request_head(buffer: &[u8]) -> ParsedHead {
    let head = String::from_utf8_lossy(buffer);
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or("").split_whitespace();
    let method = request_line.next().unwrap_or("").to_string();
    let path = request_line.next().unwrap_or("").to_string();

    let mut headers = HashMap::new();
    let mut content_length = 0usize;

    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            let key = name.trim().to_ascii_lowercase();
            let value = value.trim().to_string();
            if key == "content-length" {
                content_length = value.parse().unwrap_or(0);
            }
            headers.insert(key, value);
        }
    }

    ParsedHead {
        method,
        path,
        headers,
        content_length,
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

async fn send_json(
    stream: &mut TcpStream,
    status: u16,
    body: &serde_json::Value,
) -> std::io::Result<()> {
    let body = body.to_string();
    let header = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        reason_phrase(status),
        body.len()
    );
    stream.write_all(header.as_bytes()).await?;
    stream.write_all(body.as_bytes()).await?;
    stream.shutdown().await
}

async fn send_sse(
    stream: &mut TcpStream,
    events: &[serde_json::Value],
    done: bool,
) -> std::io::Result<()> {
    let header = b"HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\nConnection: close\r\n\r\n";
    stream.write_all(header).await?;

    for event in events {
        stream
            .write_all(format!("data: {}\n\n", event).as_bytes())
            .await?;
    }

    if done {
        stream.write_all(b"data: [DONE]\n\n").await?;
    }
    stream.shutdown().await
}
