//! HttpLobbyStore: `SharedLobbyStore` over the store service's HTTP API.
//!
//! - 文書の作成・取得・更新・削除は reqwest で `/api/lobbies/{code}` を呼ぶ
//! - 購読は `/ws/lobbies/{code}` に WebSocket で接続し、受け取ったスナップショットを
//!   `tokio::sync::watch` に流す（接続が切れると購読も閉じる）
//! - 通信エラーと 5xx は `StoreError::Unavailable` として扱い、
//!   コーディネーターの再試行に任せる

use async_trait::async_trait;
use futures_util::{Stream, StreamExt};
use tokio::sync::watch;
use tokio_tungstenite::{connect_async, tungstenite};

use courtlobby_server::{
    domain::{
        Document, DocumentSubscription, FieldUpdate, RoomCode, SharedLobbyStore,
        StoreCapabilities, StoreError,
    },
    infrastructure::dto::http::{ErrorResponse, HealthResponse},
};

use crate::error::ClientError;

#[derive(Debug, Clone)]
pub struct HttpLobbyStore {
    http: reqwest::Client,
    /// e.g. `http://127.0.0.1:8080`
    api_base: String,
    /// e.g. `ws://127.0.0.1:8080`
    ws_base: String,
    capabilities: StoreCapabilities,
}

impl HttpLobbyStore {
    /// Connect to the store service and learn its write guarantees
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the service (e.g., "http://127.0.0.1:8080")
    pub async fn connect(base_url: &str) -> Result<Self, ClientError> {
        let api_base = base_url.trim_end_matches('/').to_string();
        let ws_base = websocket_base(&api_base)?;
        let http = reqwest::Client::new();

        let health: HealthResponse = http
            .get(format!("{}/api/health", api_base))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ClientError::Connection(e.to_string()))?
            .json()
            .await
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        tracing::info!(
            "Connected to lobby store at {} (conditional writes: {})",
            api_base,
            health.conditional_writes
        );
        Ok(Self {
            http,
            api_base,
            ws_base,
            capabilities: StoreCapabilities {
                conditional_writes: health.conditional_writes,
            },
        })
    }

    fn lobby_url(&self, room_code: &RoomCode) -> String {
        format!("{}/api/lobbies/{}", self.api_base, room_code)
    }
}

fn websocket_base(api_base: &str) -> Result<String, ClientError> {
    if let Some(rest) = api_base.strip_prefix("http://") {
        Ok(format!("ws://{}", rest))
    } else if let Some(rest) = api_base.strip_prefix("https://") {
        Ok(format!("wss://{}", rest))
    } else {
        Err(ClientError::InvalidArgument(format!(
            "store URL must start with http:// or https://, got '{}'",
            api_base
        )))
    }
}

fn transport_error(error: reqwest::Error) -> StoreError {
    StoreError::Unavailable(error.to_string())
}

/// Pass successful responses through; rebuild the store error otherwise
async fn check(
    response: reqwest::Response,
    subject: &str,
) -> Result<reqwest::Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    match response.json::<ErrorResponse>().await {
        Ok(body) => Err(body.into_store_error(subject)),
        Err(_) if status.is_server_error() => {
            Err(StoreError::Unavailable(format!("HTTP {}", status)))
        }
        Err(_) => Err(StoreError::Malformed(format!(
            "unexpected HTTP {} for '{}'",
            status, subject
        ))),
    }
}

/// Next snapshot frame: `Some(None)` when the document was deleted,
/// `None` when the stream ended.
async fn next_snapshot<S>(stream: &mut S) -> Result<Option<Option<Document>>, StoreError>
where
    S: Stream<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    while let Some(frame) = stream.next().await {
        match frame.map_err(|e| StoreError::Unavailable(e.to_string()))? {
            tungstenite::Message::Text(text) => {
                let snapshot = serde_json::from_str::<Option<Document>>(&text)
                    .map_err(|e| StoreError::Malformed(e.to_string()))?;
                return Ok(Some(snapshot));
            }
            tungstenite::Message::Close(_) => return Ok(None),
            _ => {}
        }
    }
    Ok(None)
}

#[async_trait]
impl SharedLobbyStore for HttpLobbyStore {
    fn capabilities(&self) -> StoreCapabilities {
        self.capabilities
    }

    async fn create_document(
        &self,
        room_code: &RoomCode,
        document: Document,
    ) -> Result<(), StoreError> {
        let response = self
            .http
            .post(self.lobby_url(room_code))
            .json(&document)
            .send()
            .await
            .map_err(transport_error)?;
        check(response, room_code.as_str()).await?;
        tracing::debug!("POST {} -> created", room_code);
        Ok(())
    }

    async fn fetch_document(&self, room_code: &RoomCode) -> Result<Document, StoreError> {
        let response = self
            .http
            .get(self.lobby_url(room_code))
            .send()
            .await
            .map_err(transport_error)?;
        check(response, room_code.as_str())
            .await?
            .json()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))
    }

    async fn subscribe_document(
        &self,
        room_code: &RoomCode,
    ) -> Result<DocumentSubscription, StoreError> {
        let url = format!("{}/ws/lobbies/{}", self.ws_base, room_code);
        let (mut stream, _) = match connect_async(url.as_str()).await {
            Ok(connected) => connected,
            Err(tungstenite::Error::Http(response)) if response.status().as_u16() == 404 => {
                return Err(StoreError::NotFound(room_code.to_string()));
            }
            Err(e) => return Err(StoreError::Unavailable(e.to_string())),
        };

        let Some(Some(first)) = next_snapshot(&mut stream).await? else {
            return Err(StoreError::NotFound(room_code.to_string()));
        };
        let (sender, receiver) = watch::channel(Some(first));

        let room_code = room_code.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    snapshot = next_snapshot(&mut stream) => match snapshot {
                        Ok(Some(snapshot)) => {
                            let deleted = snapshot.is_none();
                            sender.send_replace(snapshot);
                            if deleted {
                                break;
                            }
                        }
                        Ok(None) => {
                            tracing::debug!("Snapshot stream of {} ended", room_code);
                            break;
                        }
                        Err(e) => {
                            tracing::warn!("Snapshot stream of {} failed: {}", room_code, e);
                            break;
                        }
                    },
                    // Every subscriber is gone
                    _ = sender.closed() => break,
                }
            }
            let _ = stream.close(None).await;
        });

        Ok(receiver)
    }

    async fn update_fields(
        &self,
        room_code: &RoomCode,
        update: FieldUpdate,
    ) -> Result<(), StoreError> {
        let response = self
            .http
            .patch(self.lobby_url(room_code))
            .json(&update)
            .send()
            .await
            .map_err(transport_error)?;
        check(response, room_code.as_str()).await?;
        tracing::debug!(
            "PATCH {} -> {} write(s), {} precondition(s)",
            room_code,
            update.writes.len(),
            update.preconditions.len()
        );
        Ok(())
    }

    async fn delete_document(&self, room_code: &RoomCode) -> Result<(), StoreError> {
        let response = self
            .http
            .delete(self.lobby_url(room_code))
            .send()
            .await
            .map_err(transport_error)?;
        check(response, room_code.as_str()).await?;
        tracing::debug!("DELETE {}", room_code);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_websocket_base_follows_scheme() {
        // テスト項目: HTTP の URL から WebSocket の URL を組み立てる
        // given (前提条件):
        let plain = "http://127.0.0.1:8080";
        let tls = "https://lobby.example.com";

        // when (操作):
        let plain_ws = websocket_base(plain).unwrap();
        let tls_ws = websocket_base(tls).unwrap();

        // then (期待する結果):
        assert_eq!(plain_ws, "ws://127.0.0.1:8080");
        assert_eq!(tls_ws, "wss://lobby.example.com");
    }

    #[test]
    fn test_websocket_base_rejects_unknown_scheme() {
        // テスト項目: http/https 以外の URL は引数エラーになる
        // given (前提条件):
        let url = "ftp://127.0.0.1";

        // when (操作):
        let result = websocket_base(url);

        // then (期待する結果):
        assert!(matches!(result, Err(ClientError::InvalidArgument(_))));
    }
}
