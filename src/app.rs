use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{ai, auth, foods, meals, profiles, stats};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(auth::router())
                .merge(profiles::router())
                .merge(meals::router())
                .merge(stats::router())
                .merge(foods::router())
                .merge(ai::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri, status = tracing::field::Empty)
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
    use super::*;
    use crate::auth::JwtKeys;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
    };
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;
    use uuid::Uuid;

    struct TestApp {
        app: Router,
        token: String,
        today: time::Date,
    }

    impl TestApp {
        fn new() -> Self {
            let state = AppState::fake();
            let keys = JwtKeys::from(&state.config.jwt);
            let token = keys
                .sign(Uuid::new_v4(), Some("eater@example.com"), Duration::from_secs(600))
                .unwrap();
            let today = state.config.today();
            Self {
                app: build_app(state),
                token,
                today,
            }
        }

        async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
            let mut req = Request::builder()
                .method(method)
                .uri(uri)
                .header(header::AUTHORIZATION, format!("Bearer {}", self.token));
            let body = match body {
                Some(v) => {
                    req = req.header(header::CONTENT_TYPE, "application/json");
                    Body::from(v.to_string())
                }
                None => Body::empty(),
            };
            let res = self.app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
            let status = res.status();
            let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
            let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            (status, value)
        }

        async fn save_profile(&self) {
            let (status, _) = self
                .send(
                    Method::PUT,
                    "/api/v1/profile",
                    Some(json!({
                        "gender": "male", "age": 30, "height": 175, "current_weight": 80,
                        "goal_weight": 75, "activity_level": 1.55, "goal_type": "diet"
                    })),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
        }

        async fn log_meal(&self, slot: &str, calories: f64) -> Value {
            let (status, body) = self
                .send(
                    Method::POST,
                    "/api/v1/meals",
                    Some(json!({ "meal_slot": slot, "food_name": "Rice", "calories": calories, "carbs": 40 })),
                )
                .await;
            assert_eq!(status, StatusCode::CREATED);
            body
        }
    }

    #[tokio::test]
    async fn requests_without_token_are_rejected() {
        let app = build_app(AppState::fake());
        let res = app
            .oneshot(Request::get("/api/v1/profile").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn me_echoes_token_identity() {
        let t = TestApp::new();
        let (status, body) = t.send(Method::GET, "/api/v1/me", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "eater@example.com");
    }

    #[tokio::test]
    async fn profile_lifecycle() {
        let t = TestApp::new();
        let (status, _) = t.send(Method::GET, "/api/v1/profile", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = t
            .send(
                Method::POST,
                "/api/v1/profile/calculate",
                Some(json!({ "age": "30", "height": "175", "current_weight": "80", "goal_weight": "75",
                             "activity_level": "1.55", "goal_type": "diet" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bmr_display"], 1748.75);
        assert_eq!(body["tdee_display"], 2710.56);
        assert_eq!(body["bmr"], 1749);
        assert_eq!(body["goal_calories"], 2211);
        let (status, _) = t.send(Method::GET, "/api/v1/profile", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "preview must not save");

        t.save_profile().await;
        let (status, body) = t.send(Method::GET, "/api/v1/profile", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recommend_protein"], 221);
        assert_eq!(body["goal_type"], "diet");

        let (status, body) = t
            .send(Method::PUT, "/api/v1/profile", Some(json!({ "age": 30, "height": 0, "current_weight": 80, "goal_weight": 75 })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn meal_log_and_daily_summary() {
        let t = TestApp::new();
        t.save_profile().await;
        t.log_meal("breakfast", 500.0).await;
        let lunch = t.log_meal("lunch", 700.0).await;

        let uri = format!("/api/v1/meals?date={}", t.today);
        let (status, body) = t.send(Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["entries"].as_array().unwrap().len(), 2);
        assert_eq!(body["summary"]["totals"]["calories"], 1200.0);
        assert_eq!(body["remaining"]["calories"], 1011.0);

        let id = lunch["id"].as_str().unwrap();
        let (status, body) = t
            .send(
                Method::PUT,
                &format!("/api/v1/meals/{}", id),
                Some(json!({ "meal_slot": "dinner", "food_name": "Rice", "calories": 650 })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meal_slot"], "dinner");

        let (status, _) = t.send(Method::DELETE, &format!("/api/v1/meals/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        // unknown ids are a no-op
        let (status, _) = t
            .send(Method::DELETE, &format!("/api/v1/meals/{}", Uuid::new_v4()), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, body) = t.send(Method::GET, "/api/v1/stats/daily", None).await;
        assert_eq!(body["entry_count"], 1);
        assert_eq!(body["calories"]["total"], 500.0);

        let (status, _) = t
            .send(
                Method::PUT,
                &format!("/api/v1/meals/{}", Uuid::new_v4()),
                Some(json!({ "meal_slot": "dinner", "food_name": "Rice", "calories": 1 })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn meal_from_food_template_with_servings() {
        let t = TestApp::new();
        let (status, body) = t
            .send(
                Method::POST,
                "/api/v1/meals",
                Some(json!({
                    "meal_slot": "dinner", "servings": 1.5,
                    "food": { "name": "Chicken breast", "calories": 200, "protein": 10 }
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["calories"], 300.0);
        assert_eq!(body["protein_g"], 15.0);
    }

    #[tokio::test]
    async fn weekly_and_monthly_stats_without_profile() {
        let t = TestApp::new();
        t.log_meal("lunch", 900.0).await;

        let (status, body) = t.send(Method::GET, "/api/v1/stats/weekly", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["days"].as_array().unwrap().len(), 7);
        assert_eq!(body["logged_days"], 1);
        assert_eq!(body["average_calories"], 900.0);
        // no profile: goal reads as zero, so the day is not a success
        assert_eq!(body["success_days"], 0);

        let (_, body) = t.send(Method::GET, "/api/v1/stats/weekly?week_offset=1", None).await;
        assert_eq!(body["logged_days"], 0);
        assert_eq!(body["average_calories"], 0.0);

        let (status, _) = t.send(Method::GET, "/api/v1/stats/weekly?week_offset=1000000", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = t.send(Method::GET, "/api/v1/stats/monthly", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["days"].as_object().unwrap().len(), 1);

        let (status, _) = t.send(Method::GET, "/api/v1/stats/monthly?year=2024&month=13", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn food_library_and_search() {
        let t = TestApp::new();
        let (status, custom) = t
            .send(
                Method::POST,
                "/api/v1/foods/custom",
                Some(json!({ "food_name": "Kimchi (homemade)", "calories": 40, "sodium": 600 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, page) = t.send(Method::GET, "/api/v1/foods/search?q=kimchi", None).await;
        assert_eq!(status, StatusCode::OK);
        let results = page["results"].as_array().unwrap();
        assert_eq!(results[0]["source"], "custom");
        assert_eq!(results[1]["source"], "catalog");
        assert_eq!(page["has_more"], true);

        let (_, page) = t.send(Method::GET, "/api/v1/foods/search?q=k", None).await;
        assert!(page["results"].as_array().unwrap().is_empty());

        let (_, page) = t.send(Method::GET, "/api/v1/foods/search?q=kimchi-fail", None).await;
        assert_eq!(page["has_more"], false);

        let food = json!({ "name": "Kimchi (homemade)", "calories": 40 });
        let (_, state) = t.send(Method::POST, "/api/v1/foods/favorites/toggle", Some(food.clone())).await;
        assert_eq!(state["favorite"], true);
        let (_, favs) = t.send(Method::GET, "/api/v1/foods/favorites", None).await;
        let favs = favs.as_array().unwrap();
        assert_eq!(favs.len(), 1);
        assert_eq!(favs[0]["source"], "favorite");
        assert_eq!(favs[0]["food"]["name"], "Kimchi (homemade)");
        let (_, state) = t.send(Method::POST, "/api/v1/foods/favorites/toggle", Some(food)).await;
        assert_eq!(state["favorite"], false);

        let id = custom["id"].as_str().unwrap();
        let (status, _) = t.send(Method::DELETE, &format!("/api/v1/foods/custom/{}", id), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = t.send(Method::DELETE, &format!("/api/v1/foods/custom/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn ai_recommendation_is_cleaned_and_saved() {
        let t = TestApp::new();
        let (status, body) = t.send(Method::POST, "/api/v1/ai/recommendation", None).await;
        assert_eq!(status, StatusCode::OK);
        let text = body["recommendation_text"].as_str().unwrap();
        assert!(!text.contains("**"));
        assert!(!text.contains("### "));
        assert_eq!(body["goals"]["calories"], 2000.0);

        let (_, list) = t.send(Method::GET, "/api/v1/ai/recommendations", None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);

        let id = body["id"].as_str().unwrap();
        let (status, _) = t
            .send(Method::DELETE, &format!("/api/v1/ai/recommendations/{}", id), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn ai_text_analysis_maps_failures_to_bad_gateway() {
        let t = TestApp::new();
        let (status, body) = t
            .send(Method::POST, "/api/v1/ai/analyze/text", Some(json!({ "text": "tteokbokki" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "ai_estimate");
        assert_eq!(body["food"]["name"], "tteokbokki");
        assert_eq!(body["food"]["calories"], 250.0);

        let (status, _) = t
            .send(Method::POST, "/api/v1/ai/analyze/text", Some(json!({ "text": "please fail" })))
            .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, _) = t
            .send(Method::POST, "/api/v1/ai/analyze/text", Some(json!({ "text": " " })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn ai_image_analysis_reads_multipart_image() {
        let t = TestApp::new();
        let boundary = "XBOUNDARY";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"meal.png\"\r\n\
             Content-Type: image/png\r\n\r\nPNGDATA\r\n--{b}--\r\n",
            b = boundary
        );
        let req = Request::post("/api/v1/ai/analyze/image")
            .header(header::AUTHORIZATION, format!("Bearer {}", t.token))
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))
            .unwrap();
        let res = t.app.clone().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let v: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(v["source"], "ai_estimate");
        assert_eq!(v["food"]["name"], "Bibimbap");
    }
}
