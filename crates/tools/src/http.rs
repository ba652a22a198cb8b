use futures_util::FutureExt;
use futures_util::future::LocalBoxFuture;
use map_widget::{InfoClient, LookupError, decode_response};
use reqwest::Client;
use runtime::Spawn;
use serde_json::Value;

/// Lookup client backed by reqwest. Non-2xx responses are failures.
#[derive(Debug, Clone, Default)]
pub struct ReqwestInfoClient {
    client: Client,
}

impl ReqwestInfoClient {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InfoClient for ReqwestInfoClient {
    fn get_json(&self, url: &str) -> LocalBoxFuture<'static, Result<Value, LookupError>> {
        let client = self.client.clone();
        let url = url.to_string();
        async move {
            let resp = client
                .get(&url)
                .send()
                .await
                .map_err(|e| LookupError::Network(e.to_string()))?;
            let status = resp.status().as_u16();
            let text = resp
                .text()
                .await
                .map_err(|e| LookupError::Network(e.to_string()))?;
            decode_response(status, &text)
        }
        .boxed_local()
    }
}

/// Spawns onto the enclosing `tokio::task::LocalSet`.
#[derive(Debug, Default, Copy, Clone)]
pub struct TokioSpawner;

impl Spawn for TokioSpawner {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        tokio::task::spawn_local(task);
    }
}

#[cfg(test)]
mod tests {
    use super::ReqwestInfoClient;
    use map_widget::{InfoClient, LookupError};
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Answers a single request with `response` and returns the URL to hit.
    async fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = sock.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            sock.write_all(response.as_bytes()).await.unwrap();
            sock.shutdown().await.unwrap();
        });
        format!("http://{addr}/boundaries/b1")
    }

    #[tokio::test]
    async fn json_body_is_returned() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 13\r\nConnection: close\r\n\r\n{\"name\":\"b1\"}",
        )
        .await;
        let body = ReqwestInfoClient::new().get_json(&url).await.unwrap();
        assert_eq!(body, json!({ "name": "b1" }));
    }

    #[tokio::test]
    async fn server_error_maps_to_status() {
        let url = serve_once(
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;
        let err = ReqwestInfoClient::new().get_json(&url).await.unwrap_err();
        assert_eq!(err, LookupError::Status(500));
    }

    #[tokio::test]
    async fn non_json_body_maps_to_decode() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 8\r\nConnection: close\r\n\r\nnot json",
        )
        .await;
        let err = ReqwestInfoClient::new().get_json(&url).await.unwrap_err();
        assert!(matches!(err, LookupError::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn refused_connection_maps_to_network() {
        let addr = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let url = format!("http://{addr}/boundaries/b1");
        let err = ReqwestInfoClient::new().get_json(&url).await.unwrap_err();
        assert!(matches!(err, LookupError::Network(_)), "got {err:?}");
    }
}
