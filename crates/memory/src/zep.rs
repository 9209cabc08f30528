//! Zep memory service client.
//!
//! Talks to the Zep v2 REST API: users, sessions, session memory and the
//! per-user knowledge graph. Graph responses are returned as raw JSON.

use async_trait::async_trait;
use memclaw_core::error::MemoryError;
use memclaw_core::identity::Identity;
use memclaw_core::memory::{GraphDataType, MemoryMessage, MemoryService, Session, SessionMemory};
use reqwest::{Method, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

const DEFAULT_BASE_URL: &str = "https://api.getzep.com/api/v2";

/// HTTP client for the Zep memory service.
pub struct ZepClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl ZepClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .unwrap_or_default();

        Self {
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client,
        }
    }

    /// Use a different API root (self-hosted deployments, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Build the URL for an endpoint. Each segment is percent-encoded, so an
    /// id can never reach a different endpoint.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, MemoryError> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(MemoryError::InvalidId((*bad).to_string()));
        }

        let mut url = Url::parse(&self.base_url)
            .map_err(|e| MemoryError::Network(format!("invalid base URL {}: {e}", self.base_url)))?;
        url.path_segments_mut()
            .map_err(|_| MemoryError::Network(format!("base URL {} cannot take a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Send a request and return the decoded JSON body (`Null` when empty).
    async fn request(
        &self,
        method: Method,
        segments: &[&str],
        query: &[(&str, String)],
        body: Option<serde_json::Value>,
    ) -> Result<serde_json::Value, MemoryError> {
        let url = self.endpoint(segments)?;
        let path = url.path().to_string();
        debug!(service = "zep", %method, %path, "Sending memory request");

        let mut builder = self
            .client
            .request(method, url)
            .header("Authorization", format!("Api-Key {}", self.api_key));
        if !query.is_empty() {
            builder = builder.query(query);
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| MemoryError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| MemoryError::Network(e.to_string()))?;

        match status {
            200..=299 => {
                if text.trim().is_empty() {
                    Ok(serde_json::Value::Null)
                } else {
                    serde_json::from_str(&text).map_err(|e| {
                        MemoryError::InvalidResponse(format!("{path}: {e}"))
                    })
                }
            }
            404 => Err(MemoryError::NotFound(path)),
            401 | 403 => Err(MemoryError::AuthenticationFailed(
                "Invalid Zep API key".into(),
            )),
            _ => {
                warn!(status, body = %text, "Zep API error");
                Err(MemoryError::Rejected {
                    status_code: status,
                    message: text,
                })
            }
        }
    }

    async fn get(&self, segments: &[&str]) -> Result<serde_json::Value, MemoryError> {
        self.request(Method::GET, segments, &[], None).await
    }

    async fn post(&self, segments: &[&str], body: serde_json::Value) -> Result<serde_json::Value, MemoryError> {
        self.request(Method::POST, segments, &[], Some(body)).await
    }

    /// GET that maps 404 to `None`.
    async fn probe(&self, segments: &[&str]) -> Result<Option<serde_json::Value>, MemoryError> {
        match self.get(segments).await {
            Ok(value) => Ok(Some(value)),
            Err(MemoryError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

fn decode<T: DeserializeOwned>(value: serde_json::Value, what: &str) -> Result<T, MemoryError> {
    serde_json::from_value(value).map_err(|e| MemoryError::InvalidResponse(format!("{what}: {e}")))
}

#[derive(Debug, Deserialize)]
struct AddMemoryResponse {
    #[serde(default)]
    context: Option<String>,
}

#[async_trait]
impl MemoryService for ZepClient {
    fn name(&self) -> &str {
        "zep"
    }

    async fn get_user(&self, user_id: &str) -> Result<Option<Identity>, MemoryError> {
        match self.probe(&["users", user_id]).await? {
            Some(value) => Ok(Some(decode(value, "user")?)),
            None => Ok(None),
        }
    }

    async fn add_user(&self, identity: &Identity) -> Result<Identity, MemoryError> {
        let value = self.post(&["users"], serde_json::json!(identity)).await?;
        decode(value, "user")
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<Session>, MemoryError> {
        match self.probe(&["sessions", session_id]).await? {
            Some(value) => Ok(Some(decode(value, "session")?)),
            None => Ok(None),
        }
    }

    async fn add_session(&self, session: &Session) -> Result<Session, MemoryError> {
        let value = self
            .post(
                &["sessions"],
                serde_json::json!({
                    "session_id": session.session_id,
                    "user_id": session.user_id,
                }),
            )
            .await?;
        decode(value, "session")
    }

    async fn get_memory(&self, session_id: &str) -> Result<SessionMemory, MemoryError> {
        let value = self.get(&["sessions", session_id, "memory"]).await?;
        if value.is_null() {
            return Ok(SessionMemory::default());
        }
        decode(value, "memory")
    }

    async fn add_memory(
        &self,
        session_id: &str,
        messages: &[MemoryMessage],
        return_context: bool,
    ) -> Result<Option<String>, MemoryError> {
        let value = self
            .post(
                &["sessions", session_id, "memory"],
                serde_json::json!({
                    "messages": messages,
                    "return_context": return_context,
                }),
            )
            .await?;
        if value.is_null() {
            return Ok(None);
        }
        let resp: AddMemoryResponse = decode(value, "memory")?;
        Ok(resp.context)
    }

    async fn graph_add(
        &self,
        user_id: &str,
        data_type: GraphDataType,
        data: &str,
    ) -> Result<serde_json::Value, MemoryError> {
        self.post(
            &["graph"],
            serde_json::json!({
                "user_id": user_id,
                "type": data_type,
                "data": data,
            }),
        )
        .await
    }

    async fn graph_search(&self, user_id: &str, query: &str) -> Result<serde_json::Value, MemoryError> {
        self.post(
            &["graph", "search"],
            serde_json::json!({
                "user_id": user_id,
                "query": query,
            }),
        )
        .await
    }

    async fn get_edge(&self, uuid: &str) -> Result<serde_json::Value, MemoryError> {
        self.get(&["graph", "edge", uuid]).await
    }

    async fn get_node(&self, uuid: &str) -> Result<serde_json::Value, MemoryError> {
        self.get(&["graph", "node", uuid]).await
    }

    async fn get_user_edges(&self, user_id: &str) -> Result<serde_json::Value, MemoryError> {
        self.post(&["graph", "edge", "user", user_id], serde_json::json!({}))
            .await
    }

    async fn get_user_nodes(&self, user_id: &str) -> Result<serde_json::Value, MemoryError> {
        self.post(&["graph", "node", "user", user_id], serde_json::json!({}))
            .await
    }

    async fn get_user_episodes(
        &self,
        user_id: &str,
        last_n: Option<u32>,
    ) -> Result<serde_json::Value, MemoryError> {
        let query: Vec<(&str, String)> = last_n.map(|n| ("lastn", n.to_string())).into_iter().collect();
        self.request(
            Method::GET,
            &["graph", "episodes", "user", user_id],
            &query,
            None,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> ZepClient {
        ZepClient::new("z_test").with_base_url(server.uri())
    }

    #[tokio::test]
    async fn missing_user_probes_as_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/john.doe"))
            .and(header("Authorization", "Api-Key z_test"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not found"))
            .mount(&server)
            .await;

        let zep = client(&server);
        assert!(zep.get_user("john.doe").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn existing_user_is_decoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/john.doe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "uuid": "u-1",
                "user_id": "john.doe",
                "email": "example@example.com",
                "first_name": "John",
                "last_name": "Doe",
                "created_at": "2024-11-01T00:00:00Z"
            })))
            .mount(&server)
            .await;

        let user = client(&server).get_user("john.doe").await.unwrap().unwrap();
        assert_eq!(user.user_id, "john.doe");
        assert_eq!(user.display_name(), "John Doe");
    }

    #[tokio::test]
    async fn probe_surfaces_real_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sessions/session_1"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client(&server).get_session("session_1").await.unwrap_err();
        assert!(matches!(err, MemoryError::Rejected { status_code: 500, .. }));
    }

    #[tokio::test]
    async fn add_memory_sends_messages_and_returns_context() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sessions/session_1/memory"))
            .and(body_json(serde_json::json!({
                "messages": [
                    {"role": "user", "role_type": "user", "content": "I have a dog"},
                    {"role": "assistant", "role_type": "assistant", "content": "Nice!"}
                ],
                "return_context": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "context": "John has a dog."
            })))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = client(&server)
            .add_memory(
                "session_1",
                &[MemoryMessage::user("I have a dog"), MemoryMessage::assistant("Nice!")],
                true,
            )
            .await
            .unwrap();
        assert_eq!(ctx.as_deref(), Some("John has a dog."));
    }

    #[tokio::test]
    async fn graph_add_passes_type_and_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graph"))
            .and(body_json(serde_json::json!({
                "user_id": "john.doe",
                "type": "json",
                "data": "{\"pet\":\"dog\"}"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"uuid": "ep-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let out = client(&server)
            .graph_add("john.doe", GraphDataType::Json, "{\"pet\":\"dog\"}")
            .await
            .unwrap();
        assert_eq!(out["uuid"], "ep-1");
    }

    #[tokio::test]
    async fn episodes_with_limit_use_query_param() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/graph/episodes/user/john.doe"))
            .and(query_param("lastn", "3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"episodes": []})))
            .expect(1)
            .mount(&server)
            .await;

        let out = client(&server)
            .get_user_episodes("john.doe", Some(3))
            .await
            .unwrap();
        assert!(out["episodes"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn empty_memory_body_is_default() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sessions/session_1/memory"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let mem = client(&server).get_memory("session_1").await.unwrap();
        assert!(mem.context.is_none());
    }

    #[tokio::test]
    async fn add_user_posts_identity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/users"))
            .and(body_json(serde_json::json!({
                "user_id": "john.doe",
                "email": "example@example.com",
                "first_name": "John",
                "last_name": "Doe"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "uuid": "u-1",
                "user_id": "john.doe",
                "email": "example@example.com",
                "first_name": "John",
                "last_name": "Doe"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let identity = Identity::new("john.doe")
            .with_email("example@example.com")
            .with_name("John", "Doe");
        let created = client(&server).add_user(&identity).await.unwrap();
        assert_eq!(created, identity);
    }

    #[tokio::test]
    async fn add_session_posts_ids() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/sessions"))
            .and(body_json(serde_json::json!({
                "session_id": "session_1",
                "user_id": "john.doe"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "uuid": "s-1",
                "session_id": "session_1",
                "user_id": "john.doe"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = Session {
            session_id: "session_1".into(),
            user_id: "john.doe".into(),
        };
        let created = client(&server).add_session(&session).await.unwrap();
        assert_eq!(created, session);
    }

    #[tokio::test]
    async fn graph_search_posts_user_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graph/search"))
            .and(body_json(serde_json::json!({
                "user_id": "john.doe",
                "query": "favourite food"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "edges": [{"uuid": "e-1", "fact": "John loves ramen"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let out = client(&server)
            .graph_search("john.doe", "favourite food")
            .await
            .unwrap();
        assert_eq!(out["edges"][0]["fact"], "John loves ramen");
    }

    #[tokio::test]
    async fn get_edge_and_node_fetch_by_uuid() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/graph/edge/e-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "uuid": "e-1", "fact": "John loves ramen"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/graph/node/n-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "uuid": "n-1", "name": "ramen"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let zep = client(&server);
        assert_eq!(zep.get_edge("e-1").await.unwrap()["fact"], "John loves ramen");
        assert_eq!(zep.get_node("n-1").await.unwrap()["name"], "ramen");
    }

    #[tokio::test]
    async fn user_edges_and_nodes_are_posted_per_user() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graph/edge/user/john.doe"))
            .and(body_json(serde_json::json!({})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"uuid": "e-1"}, {"uuid": "e-2"}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/graph/node/user/john.doe"))
            .and(body_json(serde_json::json!({})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"uuid": "n-1"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let zep = client(&server);
        assert_eq!(zep.get_user_edges("john.doe").await.unwrap().as_array().unwrap().len(), 2);
        assert_eq!(zep.get_user_nodes("john.doe").await.unwrap().as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn ids_with_separators_stay_in_one_segment() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/john.doe"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "user_id": "john.doe", "email": "secret@example.com"
            })))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/graph/edge/..%2F..%2Fusers%2Fjohn.doe"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/graph/node/a%3Fb%23c"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"uuid": "a?b#c"})))
            .expect(1)
            .mount(&server)
            .await;

        let zep = client(&server);
        let err = zep.get_edge("../../users/john.doe").await.unwrap_err();
        assert!(matches!(err, MemoryError::NotFound(_)));
        assert_eq!(zep.get_node("a?b#c").await.unwrap()["uuid"], "a?b#c");
    }

    #[tokio::test]
    async fn dot_segments_are_rejected_before_sending() {
        let server = MockServer::start().await;

        let zep = client(&server);
        for id in ["..", ".", ""] {
            let err = zep.get_edge(id).await.unwrap_err();
            assert!(matches!(err, MemoryError::InvalidId(_)), "{id:?} gave {err:?}");
        }
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[test]
    fn endpoint_keeps_base_path() {
        let zep = ZepClient::new("z_test").with_base_url("https://api.getzep.com/api/v2/");
        let url = zep.endpoint(&["graph", "edge", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "https://api.getzep.com/api/v2/graph/edge/a%2Fb");
    }
}
