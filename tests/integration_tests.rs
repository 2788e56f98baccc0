use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tower::ServiceExt;

use sportbook::config::AppConfig;
use sportbook::db::{self, queries};
use sportbook::handlers;
use sportbook::models::{FieldStatus, Role, SportType};
use sportbook::services::ai::{ChatMessage, LlmProvider};
use sportbook::state::AppState;

// ── Mock Provider ──

struct MockLlm {
    reply: String,
}

#[async_trait]
impl LlmProvider for MockLlm {
    async fn chat(&self, _system_prompt: &str, _messages: &[ChatMessage]) -> anyhow::Result<String> {
        Ok(self.reply.clone())
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        llm_provider: "mock".to_string(),
        fpt_api_key: String::new(),
        fpt_api_url: String::new(),
        fpt_model: String::new(),
        ollama_url: "http://localhost:11434".to_string(),
    }
}

struct Seeded {
    admin: i64,
    owner1: i64,
    owner2: i64,
    user: i64,
    center1: i64,
    field1: i64,
}

/// Two centers owned by different owners. Center 1 has two active FOOTBALL
/// fields (100.0 and 120.0) and three FOOTBALL slot templates; center 2 has
/// one field in another district.
fn seed(state: &Arc<AppState>) -> Seeded {
    let db = state.db.lock().unwrap();
    let admin = queries::create_user(&db, "admin", "Admin", Role::Admin).unwrap();
    let owner1 = queries::create_user(&db, "owner1", "Owner One", Role::Owner).unwrap();
    let owner2 = queries::create_user(&db, "owner2", "Owner Two", Role::Owner).unwrap();
    let user = queries::create_user(&db, "an", "An Nguyen", Role::User).unwrap();

    let center1 =
        queries::create_center(&db, owner1, "Sân Thanh Khê", "Thanh Khê, Đà Nẵng").unwrap();
    let center2 =
        queries::create_center(&db, owner2, "Sân Hải Châu", "Hải Châu, Đà Nẵng").unwrap();

    let field1 = queries::create_field(
        &db,
        center1,
        "Sân 1",
        "Thanh Khê",
        SportType::Football,
        100.0,
        FieldStatus::Active,
    )
    .unwrap();
    queries::create_field(
        &db,
        center1,
        "Sân 2",
        "Thanh Khê",
        SportType::Football,
        120.0,
        FieldStatus::Active,
    )
    .unwrap();
    queries::create_field(
        &db,
        center2,
        "Sân A",
        "Hải Châu",
        SportType::Football,
        90.0,
        FieldStatus::Active,
    )
    .unwrap();

    for slot in ["07:00 - 08:00", "08:00 - 09:00", "18:00 - 19:00"] {
        queries::create_rental_slot(&db, "FOOTBALL", slot).unwrap();
    }

    Seeded {
        admin,
        owner1,
        owner2,
        user,
        center1,
        field1,
    }
}

fn test_state(llm_reply: &str) -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
        llm: Box::new(MockLlm {
            reply: llm_reply.to_string(),
        }),
        chat_sessions: Mutex::new(HashMap::new()),
    })
}

fn test_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/booking/bulk-create-day",
            post(handlers::bookings::bulk_create_day),
        )
        .route(
            "/api/booking/bulk-create-month",
            post(handlers::bookings::bulk_create_month),
        )
        .route(
            "/api/booking/bulk-create-range",
            post(handlers::bookings::bulk_create_range),
        )
        .route("/api/booking/available", get(handlers::bookings::available))
        .route("/api/booking/stats", get(handlers::stats::booking_stats))
        .route("/api/booking/:id/cancel", post(handlers::bookings::cancel))
        .route("/api/chat", post(handlers::chat::chat))
        .with_state(state)
}

fn get_as(uri: &str, user_id: i64) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("X-User-Id", user_id.to_string())
        .body(Body::empty())
        .unwrap()
}

fn post_json(uri: &str, user_id: i64, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("X-User-Id", user_id.to_string())
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(res: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Open center 1's calendar for one day via the HTTP surface.
async fn open_day(state: &Arc<AppState>, seeded: &Seeded, date: &str) {
    let res = test_app(state.clone())
        .oneshot(post_json(
            "/api/booking/bulk-create-day",
            seeded.owner1,
            serde_json::json!({"center_id": seeded.center1, "booking_date": date}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let res = test_app(test_state(""))
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

// ── Authentication ──

#[tokio::test]
async fn test_missing_user_header_is_forbidden() {
    let state = test_state("");
    seed(&state);

    let res = test_app(state)
        .oneshot(
            Request::builder()
                .uri("/api/booking/stats")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_unknown_user_is_forbidden() {
    let state = test_state("");
    seed(&state);

    let res = test_app(state)
        .oneshot(get_as("/api/booking/stats", 9999))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

// ── Bulk slot generation ──

#[tokio::test]
async fn test_bulk_create_day_reports_cross_product() {
    let state = test_state("");
    let seeded = seed(&state);

    let res = test_app(state.clone())
        .oneshot(post_json(
            "/api/booking/bulk-create-day",
            seeded.owner1,
            serde_json::json!({"center_id": seeded.center1, "booking_date": "2099-06-01"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // 2 fields x 3 templates x 1 day.
    let json = json_body(res).await;
    assert_eq!(json["created_count"], 6);
    assert_eq!(json["skipped_count"], 0);
    assert_eq!(json["total_slots"], 6);
    assert_eq!(json["num_days"], 1);
}

#[tokio::test]
async fn test_bulk_create_is_idempotent() {
    let state = test_state("");
    let seeded = seed(&state);

    open_day(&state, &seeded, "2099-06-01").await;
    let res = test_app(state.clone())
        .oneshot(post_json(
            "/api/booking/bulk-create-day",
            seeded.owner1,
            serde_json::json!({"center_id": seeded.center1, "booking_date": "2099-06-01"}),
        ))
        .await
        .unwrap();

    let json = json_body(res).await;
    assert_eq!(json["created_count"], 0);
    assert_eq!(json["skipped_count"], 6);
}

#[tokio::test]
async fn test_bulk_create_range_spans_days() {
    let state = test_state("");
    let seeded = seed(&state);

    let res = test_app(state.clone())
        .oneshot(post_json(
            "/api/booking/bulk-create-range",
            seeded.owner1,
            serde_json::json!({
                "center_id": seeded.center1,
                "date_from": "2099-06-01",
                "date_to": "2099-06-03"
            }),
        ))
        .await
        .unwrap();

    let json = json_body(res).await;
    assert_eq!(json["created_count"], 18);
    assert_eq!(json["num_days"], 3);
}

#[tokio::test]
async fn test_bulk_create_rejects_foreign_owner() {
    let state = test_state("");
    let seeded = seed(&state);

    let res = test_app(state)
        .oneshot(post_json(
            "/api/booking/bulk-create-day",
            seeded.owner2,
            serde_json::json!({"center_id": seeded.center1, "booking_date": "2099-06-01"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_bulk_create_allows_admin() {
    let state = test_state("");
    let seeded = seed(&state);

    let res = test_app(state)
        .oneshot(post_json(
            "/api/booking/bulk-create-day",
            seeded.admin,
            serde_json::json!({"center_id": seeded.center1, "booking_date": "2099-06-01"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_bulk_create_malformed_date_is_bad_request() {
    let state = test_state("");
    let seeded = seed(&state);

    let res = test_app(state)
        .oneshot(post_json(
            "/api/booking/bulk-create-day",
            seeded.owner1,
            serde_json::json!({"center_id": seeded.center1, "booking_date": "01/06/2099"}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// ── Availability ──

#[tokio::test]
async fn test_available_groups_by_center_and_field() {
    let state = test_state("");
    let seeded = seed(&state);
    open_day(&state, &seeded, "2099-06-01").await;

    let res = test_app(state)
        .oneshot(
            Request::builder()
                .uri("/api/booking/available?booking_date=2099-06-01")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let json = json_body(res).await;
    let centers = json.as_array().unwrap();
    assert_eq!(centers.len(), 1);
    assert_eq!(centers[0]["sport_center"]["name"], "Sân Thanh Khê");

    let fields = centers[0]["sport_field"].as_array().unwrap();
    assert_eq!(fields.len(), 2);
    let slots = fields[0]["rental_slot"].as_array().unwrap();
    assert_eq!(slots.len(), 3);
    assert_eq!(slots[0], "07:00 - 08:00");
}

#[tokio::test]
async fn test_available_address_filter() {
    let state = test_state("");
    let seeded = seed(&state);
    open_day(&state, &seeded, "2099-06-01").await;

    let res = test_app(state)
        .oneshot(
            Request::builder()
                .uri("/api/booking/available?booking_date=2099-06-01&address=son%20tra")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = json_body(res).await;
    assert_eq!(json.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_available_malformed_date_is_bad_request() {
    let state = test_state("");
    seed(&state);

    let res = test_app(state)
        .oneshot(
            Request::builder()
                .uri("/api/booking/available?booking_date=junk")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// ── Chat booking flow ──

#[tokio::test]
async fn test_chat_utterance_books_a_slot() {
    let state = test_state("never used");
    let seeded = seed(&state);
    open_day(&state, &seeded, "2099-06-01").await;

    let res = test_app(state.clone())
        .oneshot(post_json(
            "/api/chat",
            seeded.user,
            serde_json::json!({
                "q": "đặt sân thanh khê 07:00 - 08:00 ngày 2099-06-01 xác nhận"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let json = json_body(res).await;
    let reply = json["reply"].as_str().unwrap();
    assert!(reply.contains("Đã đặt sân thành công"), "got: {reply}");
    assert!(reply.contains("Sân 1"), "got: {reply}");
    assert!(json["session_id"].as_str().is_some());

    // The claimed slot is no longer surfaced as available.
    let res = test_app(state)
        .oneshot(
            Request::builder()
                .uri("/api/booking/available?booking_date=2099-06-01")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = json_body(res).await;
    let fields = json[0]["sport_field"].as_array().unwrap();
    let first_field_slots = fields[0]["rental_slot"].as_array().unwrap();
    assert_eq!(first_field_slots.len(), 2);
}

#[tokio::test]
async fn test_chat_two_claims_second_falls_over_then_conflicts() {
    let state = test_state("never used");
    let seeded = seed(&state);
    open_day(&state, &seeded, "2099-06-01").await;

    let q = serde_json::json!({
        "q": "đặt sân thanh khê 07:00 - 08:00 ngày 2099-06-01 xác nhận"
    });

    // First claim gets Sân 1, second gets Sân 2, third finds nothing open.
    for expected in ["Sân 1", "Sân 2"] {
        let res = test_app(state.clone())
            .oneshot(post_json("/api/chat", seeded.user, q.clone()))
            .await
            .unwrap();
        let json = json_body(res).await;
        assert!(
            json["reply"].as_str().unwrap().contains(expected),
            "expected {expected} in {}",
            json["reply"]
        );
    }

    let res = test_app(state)
        .oneshot(post_json("/api/chat", seeded.user, q))
        .await
        .unwrap();
    let json = json_body(res).await;
    assert!(json["reply"]
        .as_str()
        .unwrap()
        .contains("không thể đặt sân"));
}

#[tokio::test]
async fn test_chat_directive_from_llm_is_resolved() {
    let state = test_state(
        r#"{"field_id":2,"booking_date":"2099-06-01","time_slot":"18:00 - 19:00"}"#,
    );
    let seeded = seed(&state);
    open_day(&state, &seeded, "2099-06-01").await;

    let res = test_app(state)
        .oneshot(post_json(
            "/api/chat",
            seeded.user,
            serde_json::json!({"q": "sân nào trống tối nay? chọn giúp mình"}),
        ))
        .await
        .unwrap();
    let json = json_body(res).await;
    let reply = json["reply"].as_str().unwrap();
    assert!(reply.contains("Đã đặt sân thành công"), "got: {reply}");
    assert!(reply.contains("Sân 2"), "got: {reply}");
}

#[tokio::test]
async fn test_chat_without_marker_goes_to_llm() {
    let state = test_state("Dạ, bên em còn sân trống buổi sáng ạ.");
    let seeded = seed(&state);
    open_day(&state, &seeded, "2099-06-01").await;

    let res = test_app(state)
        .oneshot(post_json(
            "/api/chat",
            seeded.user,
            serde_json::json!({"q": "sân thanh khê 07:00 - 08:00 còn trống không?"}),
        ))
        .await
        .unwrap();
    let json = json_body(res).await;
    assert_eq!(json["reply"], "Dạ, bên em còn sân trống buổi sáng ạ.");
}

// ── Cancel ──

#[tokio::test]
async fn test_user_cancel_reopens_the_slot() {
    let state = test_state("never used");
    let seeded = seed(&state);
    open_day(&state, &seeded, "2099-06-01").await;

    let res = test_app(state.clone())
        .oneshot(post_json(
            "/api/chat",
            seeded.user,
            serde_json::json!({
                "q": "đặt sân thanh khê 07:00 - 08:00 ngày 2099-06-01 xác nhận"
            }),
        ))
        .await
        .unwrap();
    let reply = json_body(res).await["reply"].as_str().unwrap().to_string();
    let booking_id: i64 = reply
        .split('#')
        .nth(1)
        .and_then(|s| s.trim_end_matches('.').parse().ok())
        .unwrap();

    let res = test_app(state.clone())
        .oneshot(post_json(
            &format!("/api/booking/{booking_id}/cancel"),
            seeded.user,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["status"], "PENDING");

    // All three morning/evening slots are open again on field 1.
    let res = test_app(state)
        .oneshot(
            Request::builder()
                .uri("/api/booking/available?booking_date=2099-06-01")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = json_body(res).await;
    let fields = json[0]["sport_field"].as_array().unwrap();
    assert_eq!(fields[0]["rental_slot"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_cancel_foreign_booking_is_conflict() {
    let state = test_state("never used");
    let seeded = seed(&state);
    open_day(&state, &seeded, "2099-06-01").await;

    let res = test_app(state.clone())
        .oneshot(post_json(
            "/api/chat",
            seeded.user,
            serde_json::json!({
                "q": "đặt sân thanh khê 07:00 - 08:00 ngày 2099-06-01 xác nhận"
            }),
        ))
        .await
        .unwrap();
    let reply = json_body(res).await["reply"].as_str().unwrap().to_string();
    let booking_id: i64 = reply
        .split('#')
        .nth(1)
        .and_then(|s| s.trim_end_matches('.').parse().ok())
        .unwrap();

    let other = {
        let db = state.db.lock().unwrap();
        queries::create_user(&db, "binh", "Binh", Role::User).unwrap()
    };
    let res = test_app(state)
        .oneshot(post_json(
            &format!("/api/booking/{booking_id}/cancel"),
            other,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_admin_cancel_is_terminal() {
    let state = test_state("never used");
    let seeded = seed(&state);
    open_day(&state, &seeded, "2099-06-01").await;

    let booking_id = {
        let db = state.db.lock().unwrap();
        let slot = queries::find_slot_by_time(&db, "07:00 - 08:00").unwrap().unwrap();
        queries::find_pending_booking(
            &db,
            seeded.field1,
            slot.id,
            chrono::NaiveDate::from_ymd_opt(2099, 6, 1).unwrap(),
        )
        .unwrap()
        .unwrap()
        .id
    };

    let res = test_app(state.clone())
        .oneshot(post_json(
            &format!("/api/booking/{booking_id}/cancel"),
            seeded.admin,
            serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = json_body(res).await;
    assert_eq!(json["status"], "CANCELLED");

    let db = state.db.lock().unwrap();
    let booking = queries::get_booking(&db, booking_id).unwrap().unwrap();
    assert_eq!(booking.status.as_str(), "CANCELLED");
}

// ── Stats ──

#[tokio::test]
async fn test_stats_scopes_owner_and_admin() {
    let state = test_state("never used");
    let seeded = seed(&state);
    open_day(&state, &seeded, "2099-06-01").await;

    // One confirmed booking on center 1 (Sân 1 at 100.0).
    let res = test_app(state.clone())
        .oneshot(post_json(
            "/api/chat",
            seeded.user,
            serde_json::json!({
                "q": "đặt sân thanh khê 07:00 - 08:00 ngày 2099-06-01 xác nhận"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let uri = "/api/booking/stats?date_from=2099-06-01&date_to=2099-06-01";
    let res = test_app(state.clone())
        .oneshot(get_as(uri, seeded.owner1))
        .await
        .unwrap();
    let json = json_body(res).await;
    assert_eq!(json["summary"]["total_revenue"], 100.0);
    assert_eq!(json["summary"]["total_bookings"], 1);
    assert_eq!(json["top_fields"][0]["field_name"], "Sân 1");

    // The other owner sees nothing; the admin sees everything.
    let res = test_app(state.clone())
        .oneshot(get_as(uri, seeded.owner2))
        .await
        .unwrap();
    let json = json_body(res).await;
    assert_eq!(json["summary"]["total_bookings"], 0);

    let res = test_app(state)
        .oneshot(get_as(uri, seeded.admin))
        .await
        .unwrap();
    let json = json_body(res).await;
    assert_eq!(json["summary"]["total_bookings"], 1);
}

#[tokio::test]
async fn test_stats_pending_filter_counts_open_slots() {
    let state = test_state("never used");
    let seeded = seed(&state);
    open_day(&state, &seeded, "2099-06-01").await;

    let uri = "/api/booking/stats?date_from=2099-06-01&date_to=2099-06-01&statuses=PENDING";
    let res = test_app(state)
        .oneshot(get_as(uri, seeded.admin))
        .await
        .unwrap();
    let json = json_body(res).await;
    // Only center 1 was opened: 2 fields x 3 templates = 6 PENDING rows.
    assert_eq!(json["summary"]["total_bookings"], 6);
    assert_eq!(json["by_status"][0]["status"], "PENDING");
}

#[tokio::test]
async fn test_stats_rejects_plain_users_and_bad_limits() {
    let state = test_state("");
    let seeded = seed(&state);

    let res = test_app(state.clone())
        .oneshot(get_as("/api/booking/stats", seeded.user))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = test_app(state.clone())
        .oneshot(get_as(
            "/api/booking/stats?limit_top_fields=0",
            seeded.admin,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = test_app(state)
        .oneshot(get_as(
            "/api/booking/stats?statuses=BOGUS",
            seeded.admin,
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
