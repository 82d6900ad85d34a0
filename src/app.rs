use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{auth, profiles, recipes};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(auth::router())
                .merge(profiles::router())
                .merge(recipes::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use axum::extract::FromRef;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::auth::jwt::JwtKeys;
    use crate::inference::{FakeInferenceClient, InferenceError};
    use crate::recipes::repo::MemoryRecipeRepo;

    fn bearer(state: &AppState, user_id: Uuid) -> String {
        let token = JwtKeys::from_ref(state).sign_access(user_id).unwrap();
        format!("Bearer {token}")
    }

    async fn call(
        state: &AppState,
        method: Method,
        uri: &str,
        auth: Option<&str>,
        body: Option<Value>,
    ) -> Response {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(auth) = auth {
            req = req.header(header::AUTHORIZATION, auth);
        }
        let body = match body {
            Some(v) => {
                req = req.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        build_app(state.clone())
            .oneshot(req.body(body).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(res: Response) -> Value {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn generate(state: &AppState, auth: &str) -> Value {
        let res = call(
            state,
            Method::POST,
            "/api/v1/recipes/generate",
            Some(auth),
            Some(json!({ "ingredients": ["eggs", "spinach"] })),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        json_body(res).await
    }

    #[tokio::test]
    async fn health_is_public() {
        let state = AppState::fake();
        let res = call(&state, Method::GET, "/api/v1/health", None, None).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn recipe_routes_require_a_token() {
        let state = AppState::fake();
        let res = call(
            &state,
            Method::POST,
            "/api/v1/recipes/generate",
            None,
            Some(json!({ "ingredients": ["eggs"] })),
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(json_body(res).await["error"], "Unauthorized");

        let res = call(&state, Method::GET, "/api/v1/recipes", Some("Bearer nonsense"), None).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn refresh_token_is_not_an_access_token() {
        let state = AppState::fake();
        let refresh = JwtKeys::from_ref(&state).sign_refresh(Uuid::new_v4()).unwrap();
        let res = call(
            &state,
            Method::GET,
            "/api/v1/recipes",
            Some(&format!("Bearer {refresh}")),
            None,
        )
        .await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn generate_rejects_bad_bodies() {
        let state = AppState::fake();
        let auth = bearer(&state, Uuid::new_v4());

        for body in [
            json!({ "ingredients": [] }),
            json!({ "ingredients": ["  "] }),
            json!({ "ingredients": "eggs" }),
            json!({}),
        ] {
            let res = call(&state, Method::POST, "/api/v1/recipes/generate", Some(&auth), Some(body)).await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
            assert_eq!(json_body(res).await["error"], "Invalid ingredients");
        }
    }

    #[tokio::test]
    async fn generate_stores_an_unrated_recipe() {
        let state = AppState::fake();
        let auth = bearer(&state, Uuid::new_v4());

        let res = call(
            &state,
            Method::POST,
            "/api/v1/recipes/generate",
            Some(&auth),
            Some(json!({ "ingredients": ["eggs", "spinach"] })),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let location = res.headers()[header::LOCATION].to_str().unwrap().to_string();
        let body = json_body(res).await;
        assert_eq!(location, format!("/api/v1/recipes/{}", body["id"].as_str().unwrap()));
        assert!(body["rating"].is_null());
        assert_eq!(body["ingredients_used"], json!(["eggs", "spinach"]));
        assert!(!body["recipe_json"]["title"].as_str().unwrap().is_empty());

        let res = call(&state, Method::GET, &location, Some(&auth), None).await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unreachable_model_is_503_and_nothing_is_stored() {
        let mut state = AppState::fake();
        let recipes = Arc::new(MemoryRecipeRepo::default());
        state.recipes = recipes.clone();
        state.inference = Arc::new(FakeInferenceClient::failing(InferenceError::Unavailable { status: 502 }));
        let auth = bearer(&state, Uuid::new_v4());

        let res = call(
            &state,
            Method::POST,
            "/api/v1/recipes/generate",
            Some(&auth),
            Some(json!({ "ingredients": ["eggs"] })),
        )
        .await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            json_body(res).await["error"],
            "Failed to generate recipe. The service may be temporarily unavailable. Please try again."
        );
        assert_eq!(recipes.len().await, 0);
    }

    #[tokio::test]
    async fn prose_reply_is_a_parse_failure() {
        let mut state = AppState::fake();
        state.inference = Arc::new(FakeInferenceClient::replying("Try roasting the vegetables."));
        let auth = bearer(&state, Uuid::new_v4());

        let res = call(
            &state,
            Method::POST,
            "/api/v1/recipes/generate",
            Some(&auth),
            Some(json!({ "ingredients": ["eggs"] })),
        )
        .await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            json_body(res).await["error"],
            "Failed to parse recipe from AI response. Please try again."
        );
    }

    #[tokio::test]
    async fn rating_round_trip_and_bounds() {
        let state = AppState::fake();
        let auth = bearer(&state, Uuid::new_v4());
        let id = generate(&state, &auth).await["id"].as_str().unwrap().to_string();
        let uri = format!("/api/v1/recipes/{id}/rating");

        let res = call(&state, Method::PUT, &uri, Some(&auth), Some(json!({ "rating": 4 }))).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await, json!({ "success": true }));

        for bad in [json!({ "rating": 0 }), json!({ "rating": 6 }), json!({ "rating": "5" })] {
            let res = call(&state, Method::PUT, &uri, Some(&auth), Some(bad)).await;
            assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        }

        let res = call(&state, Method::GET, &format!("/api/v1/recipes/{id}"), Some(&auth), None).await;
        assert_eq!(json_body(res).await["rating"], 4);
    }

    #[tokio::test]
    async fn strangers_cannot_touch_a_recipe() {
        let state = AppState::fake();
        let owner = bearer(&state, Uuid::new_v4());
        let stranger = bearer(&state, Uuid::new_v4());
        let id = generate(&state, &owner).await["id"].as_str().unwrap().to_string();

        let res = call(
            &state,
            Method::PUT,
            &format!("/api/v1/recipes/{id}/rating"),
            Some(&stranger),
            Some(json!({ "rating": 5 })),
        )
        .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(res).await["error"], "Recipe not found");

        let uri = format!("/api/v1/recipes/{id}");
        let res = call(&state, Method::DELETE, &uri, Some(&stranger), None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let res = call(&state, Method::GET, &uri, Some(&stranger), None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);

        let res = call(&state, Method::DELETE, &uri, Some(&owner), None).await;
        assert_eq!(res.status(), StatusCode::OK);
        let res = call(&state, Method::DELETE, &uri, Some(&owner), None).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_recipe_id_is_bad_request() {
        let state = AppState::fake();
        let auth = bearer(&state, Uuid::new_v4());
        let res = call(&state, Method::GET, "/api/v1/recipes/not-a-uuid", Some(&auth), None).await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn history_lists_only_own_recipes_newest_first() {
        let state = AppState::fake();
        let me = bearer(&state, Uuid::new_v4());
        let other = bearer(&state, Uuid::new_v4());
        let first = generate(&state, &me).await["id"].clone();
        let second = generate(&state, &me).await["id"].clone();
        generate(&state, &other).await;

        let res = call(&state, Method::GET, "/api/v1/recipes", Some(&me), None).await;
        assert_eq!(res.status(), StatusCode::OK);
        let list = json_body(res).await;
        let ids: Vec<Value> = list.as_array().unwrap().iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![second, first]);
    }

    #[tokio::test]
    async fn profile_feeds_the_prompt() {
        let mut state = AppState::fake();
        let fake = Arc::new(FakeInferenceClient::canned());
        state.inference = fake.clone();
        let auth = bearer(&state, Uuid::new_v4());

        let res = call(
            &state,
            Method::PUT,
            "/api/v1/profile",
            Some(&auth),
            Some(json!({ "dietary_prefs": ["Vegetarian"], "allergies": ["Peanuts"] })),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await["allergies"], json!(["Peanuts"]));

        generate(&state, &auth).await;
        let sent = fake.requests();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].prompt.contains("Allergies (MUST AVOID): Peanuts"));
        assert!(sent[0].prompt.contains("Dietary restrictions: Vegetarian"));
    }
}
