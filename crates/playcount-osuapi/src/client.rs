use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::OsuApiError;
use crate::types::{Beatmapset, MapsetKind, User};

pub type Result<T, E = OsuApiError> = std::result::Result<T, E>;

pub const DEFAULT_BASE_URL: &str = "https://osu.ppy.sh/api/v2";

/// Thin osu! API v2 client covering the user and user-beatmapset endpoints.
#[derive(Debug, Clone)]
pub struct OsuClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    retry_count: usize,
    retry_delay: Duration,
    page_size: usize,
}

#[derive(Debug, Clone)]
pub struct OsuClientBuilder {
    base_url: String,
    token: Option<String>,
    retry_count: usize,
    retry_delay: Duration,
    page_size: usize,
    timeout: Duration,
}

impl Default for OsuClientBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            token: None,
            retry_count: 3,
            retry_delay: Duration::from_secs(1),
            page_size: 100,
            timeout: Duration::from_secs(30),
        }
    }
}

impl OsuClientBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Bearer token sent with every request. Empty tokens are ignored.
    pub fn token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.is_empty()).then_some(token);
        self
    }

    /// Total attempts per request, at least one.
    pub fn retry_count(mut self, attempts: usize) -> Self {
        self.retry_count = attempts.max(1);
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size.max(1);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<OsuClient> {
        let base_url = self.base_url.trim_end_matches('/').to_owned();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(OsuApiError::InvalidBaseUrl(self.base_url));
        }
        let client = Client::builder()
            .user_agent(concat!("playcount-osuapi/", env!("CARGO_PKG_VERSION")))
            .timeout(self.timeout)
            .build()?;
        Ok(OsuClient {
            client,
            base_url,
            token: self.token,
            retry_count: self.retry_count,
            retry_delay: self.retry_delay,
            page_size: self.page_size,
        })
    }
}

impl OsuClient {
    pub fn builder() -> OsuClientBuilder {
        OsuClientBuilder::default()
    }

    /// `GET /users/{id}`.
    pub async fn user(&self, user_id: i64) -> Result<User> {
        self.get_json(&format!("/users/{user_id}?key=id")).await
    }

    /// Every mapset of `kind` uploaded by the user, following pagination
    /// until a short page.
    pub async fn user_mapsets(&self, user_id: i64, kind: MapsetKind) -> Result<Vec<Beatmapset>> {
        let mut mapsets = Vec::new();
        let mut offset = 0;
        loop {
            let page: Vec<Beatmapset> = self
                .get_json(&format!(
                    "/users/{user_id}/beatmapsets/{}?limit={}&offset={offset}",
                    kind.as_str(),
                    self.page_size
                ))
                .await?;
            let len = page.len();
            mapsets.extend(page);
            if len < self.page_size {
                break;
            }
            offset += len;
        }
        debug!(user_id, kind = kind.as_str(), count = mapsets.len(), "fetched user mapsets");
        Ok(mapsets)
    }

    /// The user and all of their ranked, loved, pending and graveyard
    /// mapsets, each mapset once.
    ///
    /// Offset paging can repeat a mapset when a listing shifts between page
    /// requests, and a mapset can move between listings mid-fetch; the first
    /// copy wins.
    pub async fn user_with_mapsets(&self, user_id: i64) -> Result<(User, Vec<Beatmapset>)> {
        let user = self.user(user_id).await?;
        let mut seen = HashSet::new();
        let mut mapsets = Vec::new();
        for kind in MapsetKind::ALL {
            for mut mapset in self.user_mapsets(user_id, kind).await? {
                if !seen.insert(mapset.id) {
                    debug!(user_id, mapset_id = mapset.id, "skipping repeated mapset");
                    continue;
                }
                let mut beatmap_ids = HashSet::new();
                mapset.beatmaps.retain(|b| beatmap_ids.insert(b.id));
                mapsets.push(mapset);
            }
        }
        Ok((user, mapsets))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{path}", self.base_url);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.get_json_once(&url).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < self.retry_count && e.is_retryable() => {
                    warn!(%url, attempt, error = %e, "osu! API request failed, retrying");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn get_json_once<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let mut request = self.client.get(url).header("Accept", "application/json");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(OsuApiError::Status {
                status,
                url: url.to_owned(),
            });
        }
        Ok(resp.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::extract::{Path, Query, State};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use super::*;

    #[derive(Clone, Default)]
    struct Upstream {
        user_calls: Arc<AtomicUsize>,
    }

    #[derive(serde::Deserialize)]
    struct Page {
        limit: usize,
        offset: usize,
    }

    fn mapset(id: usize) -> Value {
        json!({
            "id": id, "artist": "a", "title": "t", "status": "graveyard",
            "last_updated": "2023-12-01T00:00:00Z", "user_id": 1, "play_count": id,
        })
    }

    async fn user(State(up): State<Upstream>, Path(id): Path<i64>) -> Result<Json<Value>, StatusCode> {
        // First call fails so retries are exercised.
        if up.user_calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(StatusCode::BAD_GATEWAY);
        }
        if id == 404 {
            return Err(StatusCode::NOT_FOUND);
        }
        Ok(Json(json!({"id": id, "username": "mapper", "graveyard_beatmapset_count": 5})))
    }

    async fn mapsets(Path((_, kind)): Path<(i64, String)>, Query(page): Query<Page>) -> Json<Value> {
        // Mapset 3 shows up again in another listing.
        if kind == "pending" {
            return Json(json!([mapset(3)]));
        }
        if kind != "graveyard" {
            return Json(json!([]));
        }
        let ids: Vec<Value> = (page.offset..5.min(page.offset + page.limit)).map(mapset).collect();
        Json(Value::Array(ids))
    }

    async fn serve(up: Upstream) -> String {
        let app = Router::new()
            .route("/users/{id}", get(user))
            .route("/users/{id}/beatmapsets/{kind}", get(mapsets))
            .with_state(up);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn client(base: &str) -> OsuClient {
        OsuClient::builder()
            .base_url(base)
            .retry_delay(Duration::ZERO)
            .page_size(2)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn paginates_retries_and_drops_repeated_mapsets() {
        let up = Upstream::default();
        let base = serve(up.clone()).await;

        let (user, mapsets) = client(&base).user_with_mapsets(1).await.unwrap();
        assert_eq!(user.graveyard_beatmapset_count, 5);
        assert_eq!(up.user_calls.load(Ordering::SeqCst), 2);
        let ids: Vec<i64> = mapsets.iter().map(|m| m.id).collect();
        assert_eq!(ids, [3, 0, 1, 2, 4]);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let up = Upstream::default();
        up.user_calls.store(1, Ordering::SeqCst);
        let base = serve(up.clone()).await;

        let err = client(&base).user(404).await.unwrap_err();
        assert!(matches!(err, OsuApiError::Status { status, .. } if status == StatusCode::NOT_FOUND));
        assert_eq!(up.user_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = OsuClient::builder().base_url("ftp://example").build().unwrap_err();
        assert!(matches!(err, OsuApiError::InvalidBaseUrl(_)));
    }
}
