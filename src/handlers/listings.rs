use axum::{
    Json,
    body::Body,
    extract::{RawQuery, State},
    response::Response,
};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

use super::{read_body, relay};
use crate::enrich::enrich_listings;
use crate::error::GatewayError;
use crate::form::to_form_fields;
use crate::metrics::{REQUEST_TOTAL, UPSTREAM_LATENCY};
use crate::models::{EnrichedListings, ListingsEnvelope};
use crate::state::AppState;

const UNAVAILABLE: &str = "Listing service unavailable";

// JSON in, form-encoded out to the listing service
pub async fn create_listing_handler(
    State(state): State<Arc<AppState>>,
    body: Body,
) -> Result<Response, GatewayError> {
    REQUEST_TOTAL.inc();

    let body = read_body(body, state.max_body_bytes).await?;
    let data: Map<String, Value> = serde_json::from_slice(&body)
        .map_err(|_| GatewayError::BadRequest("Invalid JSON body"))?;
    let form = to_form_fields(&data);

    let start = Instant::now();
    let res = state
        .client
        .post(state.upstream.create_listing_url())
        .form(&form)
        .send()
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "listing service call failed");
            GatewayError::BadGateway(UNAVAILABLE)
        })?;
    UPSTREAM_LATENCY
        .with_label_values(&["listing"])
        .observe(start.elapsed().as_secs_f64());

    relay(res, UNAVAILABLE).await
}

// Fetch a page of listings and attach each owner where the user service allows
pub async fn get_listings_handler(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Result<Json<EnrichedListings>, GatewayError> {
    REQUEST_TOTAL.inc();

    let start = Instant::now();
    let res = state
        .client
        .get(state.upstream.list_listings_url(query.as_deref()))
        .send()
        .await
        .map_err(|e| {
            tracing::warn!(error = %e, "listing service call failed");
            GatewayError::BadGateway(UNAVAILABLE)
        })?;
    let body = res
        .bytes()
        .await
        .map_err(|_| GatewayError::BadGateway(UNAVAILABLE))?;
    UPSTREAM_LATENCY
        .with_label_values(&["listing"])
        .observe(start.elapsed().as_secs_f64());

    // a trusted collaborator sending garbage is a protocol break, not a degraded read
    let envelope: ListingsEnvelope = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!(error = %e, "listing service reply did not decode");
        GatewayError::Internal("Failed to decode listings")
    })?;

    let listings = enrich_listings(
        &state.client,
        &state.upstream,
        envelope.listings,
        state.enrich,
    )
    .await;

    Ok(Json(EnrichedListings::ok(listings)))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{body_json, gateway, spawn_collaborator};
    use axum::{
        Form, Json, Router,
        body::Body,
        extract::{Path, RawQuery},
        http::{Request, StatusCode, header::CONTENT_TYPE},
        response::IntoResponse,
        routing::{get, post},
    };
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    fn listings_reply() -> Value {
        json!({
            "result": true,
            "listings": [
                {"id": 1, "user_id": 10, "listing_type": "rent", "price": 100000, "created_at": 12345678, "updated_at": 12345678},
                {"id": 2, "user_id": 20, "listing_type": "sale", "price": 250000, "created_at": 12345679, "updated_at": 12345679},
                {"id": 3, "user_id": 30, "listing_type": "rent", "price": 5000, "created_at": 12345680, "updated_at": 12345680},
            ]
        })
    }

    async fn listing_service() -> String {
        let app = Router::new().route("/listings", get(|| async { Json(listings_reply()) }));
        spawn_collaborator(app).await
    }

    fn list(uri: &str) -> Request<Body> {
        Request::get(uri).body(Body::empty()).unwrap()
    }

    fn create(body: &'static str) -> Request<Body> {
        Request::post("/public-api/listings")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn create_listing_sends_coerced_form_fields() {
        let listings = Router::new().route(
            "/listings",
            post(|Form(form): Form<HashMap<String, String>>| async move {
                assert_eq!(form["user_id"], "1");
                assert_eq!(form["listing_type"], "rent");
                assert_eq!(form["price"], "12");
                assert_eq!(form["featured"], "");
                assert_eq!(form["meta"], "");
                (
                    StatusCode::CREATED,
                    Json(json!({"result": true, "listing": {"id": 1}})),
                )
            }),
        );
        let app = gateway("127.0.0.1:1", &spawn_collaborator(listings).await);

        let res = app
            .oneshot(create(
                r#"{"user_id": 1, "listing_type": "rent", "price": 12.9, "featured": true, "meta": {"a": 1}}"#,
            ))
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(body_json(res).await["listing"]["id"], 1);
    }

    #[tokio::test]
    async fn create_listing_rejects_broken_json() {
        let app = gateway("127.0.0.1:1", "127.0.0.1:1");

        let res = app
            .oneshot(create(r#"{"user_id": 1, "listing_type": "rent", "price": "#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(res).await["message"], "Invalid JSON body");
    }

    #[tokio::test]
    async fn create_listing_with_unreachable_service_is_bad_gateway() {
        let app = gateway("127.0.0.1:1", "127.0.0.1:1");

        let res = app
            .oneshot(create(r#"{"user_id": 1, "listing_type": "rent", "price": 100000}"#))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn get_listings_forwards_query_and_enriches_in_order() {
        let listings = Router::new().route(
            "/listings",
            get(|RawQuery(query): RawQuery| async move {
                assert_eq!(query.as_deref(), Some("page_num=2&page_size=3"));
                Json(listings_reply())
            }),
        );
        // owner 20 is unknown to the user service
        let users = Router::new().route(
            "/users/{id}",
            get(|Path(id): Path<u64>| async move {
                if id == 20 {
                    (StatusCode::NOT_FOUND, Json(json!({"message": "User not found"})))
                        .into_response()
                } else {
                    Json(json!({"result": true, "user": {"id": id, "name": "Alice"}}))
                        .into_response()
                }
            }),
        );
        let app = gateway(
            &spawn_collaborator(users).await,
            &spawn_collaborator(listings).await,
        );

        let res = app
            .oneshot(list("/public-api/listings?page_num=2&page_size=3"))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = body_json(res).await;
        assert_eq!(body["result"], true);
        let listings = body["listings"].as_array().unwrap();
        assert_eq!(listings.len(), 3);
        assert_eq!(listings[0]["id"], 1);
        assert_eq!(listings[0]["user"]["id"], 10);
        assert_eq!(listings[1]["id"], 2);
        assert!(listings[1].get("user").is_none());
        assert_eq!(listings[2]["user"]["name"], "Alice");
        assert_eq!(listings[2]["price"], 5000);
    }

    #[tokio::test]
    async fn get_listings_survives_a_dead_user_service() {
        let app = gateway("127.0.0.1:1", &listing_service().await);

        let res = app.oneshot(list("/public-api/listings")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let body = body_json(res).await;
        let listings = body["listings"].as_array().unwrap();
        assert_eq!(listings.len(), 3);
        assert!(listings.iter().all(|l| l.get("user").is_none()));
    }

    #[tokio::test]
    async fn get_listings_survives_a_failing_user_service() {
        let users = Router::new().route(
            "/users/{id}",
            get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let app = gateway(
            &spawn_collaborator(users).await,
            &listing_service().await,
        );

        let res = app.oneshot(list("/public-api/listings")).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await["listings"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn garbage_from_listing_service_is_internal_error_without_user_calls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let users = Router::new().route(
            "/users/{id}",
            get(move || {
                seen.fetch_add(1, Ordering::SeqCst);
                async { Json(json!({"result": true, "user": {}})) }
            }),
        );
        let listings = Router::new().route("/listings", get(|| async { "not json" }));
        let app = gateway(
            &spawn_collaborator(users).await,
            &spawn_collaborator(listings).await,
        );

        let res = app.oneshot(list("/public-api/listings")).await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(res).await["message"], "Failed to decode listings");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unreachable_listing_service_is_bad_gateway() {
        let app = gateway("127.0.0.1:1", "127.0.0.1:1");

        let res = app.oneshot(list("/public-api/listings")).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(res).await["message"], "Listing service unavailable");
    }

    #[tokio::test]
    async fn listing_service_error_body_is_internal_error() {
        let listings = Router::new().route(
            "/listings",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"message": "db down"})),
                )
            }),
        );
        let app = gateway("127.0.0.1:1", &spawn_collaborator(listings).await);

        let res = app.oneshot(list("/public-api/listings")).await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(res).await["message"], "Failed to decode listings");
    }
}
