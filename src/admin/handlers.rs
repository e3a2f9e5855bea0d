use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::AdminState;
use crate::fetch::{FetchError, FetchOptions};
use crate::observability::FetchMetrics;
use crate::resilience::{BreakerSnapshot, CircuitState};
use crate::roster::Member;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub open_breakers: usize,
    pub warming: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct MembersQuery {
    pub filter: Option<String>,
    #[serde(default)]
    pub force_refresh: bool,
}

#[derive(Serialize)]
pub struct MembersResponse {
    pub partition: String,
    pub filter: Option<String>,
    pub count: usize,
    pub members: Vec<Member>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WarmRequest {
    #[serde(default)]
    pub filters: Vec<String>,
}

#[derive(Serialize)]
pub struct WarmingEntry {
    pub partition: String,
    pub filters: Vec<String>,
}

pub async fn get_status(State(state): State<AdminState>) -> Json<SystemStatus> {
    let open_breakers = state
        .service
        .breaker_states()
        .iter()
        .filter(|b| b.state != CircuitState::Closed)
        .count();

    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: if open_breakers == 0 { "operational" } else { "degraded" },
        open_breakers,
        warming: state.service.warming().await.len(),
    })
}

pub async fn get_members(
    State(state): State<AdminState>,
    Path(partition): Path<String>,
    Query(query): Query<MembersQuery>,
) -> Response {
    let options = FetchOptions {
        force_refresh: query.force_refresh,
    };
    let filter = query.filter.as_deref().filter(|f| !f.is_empty());

    match state.service.get_members(&partition, filter, options).await {
        Ok(set) => {
            let mut members: Vec<Member> = set.iter().cloned().collect();
            members.sort_by(|a, b| a.id.cmp(&b.id));
            Json(MembersResponse {
                partition,
                filter: filter.map(str::to_string),
                count: members.len(),
                members,
            })
            .into_response()
        }
        Err(e @ FetchError::NoStrategySucceeded { .. }) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

pub async fn get_metrics(State(state): State<AdminState>) -> Json<FetchMetrics> {
    Json(state.service.metrics())
}

pub async fn reset_metrics(State(state): State<AdminState>) -> StatusCode {
    state.service.reset_metrics();
    tracing::info!("Fetch metrics reset by operator");
    StatusCode::NO_CONTENT
}

pub async fn get_breakers(State(state): State<AdminState>) -> Json<Vec<BreakerSnapshot>> {
    let mut breakers = state.service.breaker_states();
    breakers.sort_by(|a, b| a.partition.cmp(&b.partition));
    Json(breakers)
}

pub async fn list_warming(State(state): State<AdminState>) -> Json<Vec<WarmingEntry>> {
    let mut entries: Vec<WarmingEntry> = state
        .service
        .warming()
        .await
        .into_iter()
        .map(|(partition, filters)| WarmingEntry { partition, filters })
        .collect();
    entries.sort_by(|a, b| a.partition.cmp(&b.partition));
    Json(entries)
}

pub async fn start_warming(
    State(state): State<AdminState>,
    Path(partition): Path<String>,
    Json(body): Json<WarmRequest>,
) -> StatusCode {
    state.service.start_cache_warming(&partition, body.filters).await;
    StatusCode::ACCEPTED
}

pub async fn stop_warming(
    State(state): State<AdminState>,
    Path(partition): Path<String>,
) -> StatusCode {
    if state.service.stop_cache_warming(&partition).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use tower::ServiceExt;

    use crate::admin::{setup_admin_router, AdminState};
    use crate::cache::MemoryStore;
    use crate::config::RosterConfig;
    use crate::fetch::RosterService;
    use crate::roster::{
        DirectoryError, DirectoryResult, Member, MemberId, MemberSet, RosterDirectory, RosterPage,
    };

    const KEY: &str = "test-key";

    struct SmallDirectory {
        fail: bool,
    }

    #[async_trait]
    impl RosterDirectory for SmallDirectory {
        async fn fetch_page(
            &self,
            _partition: &str,
            _cursor: Option<&MemberId>,
            _limit: usize,
        ) -> DirectoryResult<RosterPage> {
            if self.fail {
                return Err(DirectoryError::Status(503));
            }
            Ok(RosterPage {
                members: vec![
                    Member::new("b", "Bea").with_role("mod"),
                    Member::new("a", "Ada"),
                ],
                next_cursor: None,
            })
        }

        async fn fetch_by_filter_direct(
            &self,
            _partition: &str,
            _filter: Option<&str>,
        ) -> DirectoryResult<Option<MemberSet>> {
            if self.fail {
                return Err(DirectoryError::Status(503));
            }
            Ok(None)
        }
    }

    fn router(fail: bool) -> axum::Router {
        let mut config = RosterConfig::default();
        config.warmer.enabled = false;
        let service = RosterService::new(
            &config,
            Arc::new(SmallDirectory { fail }),
            Arc::new(MemoryStore::new()),
        );
        setup_admin_router(AdminState::new(Arc::new(service), KEY))
    }

    fn authed(method: Method, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {KEY}"))
            .body(Body::empty())
            .unwrap()
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_key_is_rejected() {
        let response = router(false)
            .oneshot(
                Request::builder()
                    .uri("/admin/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_key_is_rejected() {
        let response = router(false)
            .oneshot(
                Request::builder()
                    .uri("/admin/status")
                    .header(header::AUTHORIZATION, "Bearer nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_status() {
        let response = router(false)
            .oneshot(authed(Method::GET, "/admin/status"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["status"], "operational");
        assert_eq!(body["open_breakers"], 0);
    }

    #[tokio::test]
    async fn test_members_sorted_and_filtered() {
        let app = router(false);

        let response = app
            .clone()
            .oneshot(authed(Method::GET, "/admin/members/guild-1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["count"], 2);
        assert_eq!(body["members"][0]["id"], "a");

        let response = app
            .oneshot(authed(Method::GET, "/admin/members/guild-1?filter=mod"))
            .await
            .unwrap();
        let body = json(response).await;
        assert_eq!(body["count"], 1);
        assert_eq!(body["filter"], "mod");
    }

    #[tokio::test]
    async fn test_members_unavailable() {
        let response = router(true)
            .oneshot(authed(Method::GET, "/admin/members/guild-1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_metrics_and_reset() {
        let app = router(false);
        app.clone()
            .oneshot(authed(Method::GET, "/admin/members/guild-1"))
            .await
            .unwrap();

        let body = json(
            app.clone()
                .oneshot(authed(Method::GET, "/admin/metrics"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body["total_requests"], 1);
        assert_eq!(body["successful_fetches"], 1);

        let response = app
            .clone()
            .oneshot(authed(Method::POST, "/admin/metrics/reset"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let body = json(
            app.oneshot(authed(Method::GET, "/admin/metrics"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body["total_requests"], 0);
    }

    #[tokio::test]
    async fn test_breakers_after_failure() {
        let app = router(true);
        app.clone()
            .oneshot(authed(Method::GET, "/admin/members/guild-9"))
            .await
            .unwrap();

        let body = json(
            app.oneshot(authed(Method::GET, "/admin/breakers"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body[0]["partition"], "guild-9");
        assert_eq!(body[0]["consecutive_failures"], 1);
    }

    #[tokio::test]
    async fn test_warming_lifecycle() {
        let app = router(false);

        let request = Request::builder()
            .method(Method::POST)
            .uri("/admin/warming/guild-1")
            .header(header::AUTHORIZATION, format!("Bearer {KEY}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"filters":["mod"]}"#))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        let body = json(
            app.clone()
                .oneshot(authed(Method::GET, "/admin/warming"))
                .await
                .unwrap(),
        )
        .await;
        assert_eq!(body[0]["partition"], "guild-1");
        assert_eq!(body[0]["filters"][0], "mod");

        let response = app
            .clone()
            .oneshot(authed(Method::DELETE, "/admin/warming/guild-1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = app
            .oneshot(authed(Method::DELETE, "/admin/warming/guild-1"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
