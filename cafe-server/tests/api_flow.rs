//! End-to-end API flow against an in-memory database
//! Run: cargo test -p cafe-server --test api_flow

use axum::Router;
use axum::body::Body;
use cafe_server::api::build_app;
use cafe_server::db::DbService;
use cafe_server::db::repository::UserRecord;
use cafe_server::db::seed::{ADMIN_EMAIL, seed_demo_data};
use cafe_server::{Config, ServerState};
use http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use shared::models::UserRole;
use tower::ServiceExt;

const SECRET: &str = "integration-secret-that-is-at-least-32-chars";
const ADMIN_PASSWORD: &str = "admin-pass";

async fn setup() -> (Router, ServerState) {
    let config = Config::in_memory(SECRET);
    let db = DbService::memory().await.unwrap();
    seed_demo_data(&db.db, Some(ADMIN_PASSWORD)).await.unwrap();
    let state = ServerState::new(config, db.db);
    (build_app(state.clone()), state)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn login(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/users/login",
        None,
        Some(json!({"email": email, "password": password})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

async fn register(app: &Router, name: &str, email: &str) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/users/register",
        None,
        Some(json!({
            "name": name,
            "email": email,
            "password": "secret1",
            "phone": "555-0100"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    body["data"]["token"].as_str().unwrap().to_string()
}

fn order_payload(email: &str, order_type: &str) -> Value {
    json!({
        "customer": {"name": "Ana", "email": email, "phone": "555-0100"},
        "items": [{"name": "Classic Espresso", "quantity": 2}],
        "orderType": order_type,
        "paymentMethod": "card"
    })
}

#[tokio::test]
async fn test_health_is_public() {
    let (app, _) = setup().await;
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"]["status"], "ok");
}

#[tokio::test]
async fn test_menu_is_public_and_writes_need_permission() {
    let (app, _) = setup().await;

    let (status, body) = send(&app, Method::GET, "/api/menu?limit=5", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"]["pagination"]["totalItems"], 10);
    assert_eq!(body["data"]["pagination"]["hasNextPage"], true);

    let (status, _) = send(&app, Method::GET, "/api/menu/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let new_item = json!({
        "name": "Flat White",
        "description": "Ristretto with velvety milk",
        "price": 4.499,
        "image": "https://example.com/flat-white.jpg",
        "category": "Coffee"
    });

    let (status, _) = send(&app, Method::POST, "/api/menu", None, Some(new_item.clone())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let customer = register(&app, "Ana", "ana@example.com").await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/menu",
        Some(&customer),
        Some(new_item.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 2001);

    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;
    let (status, body) = send(&app, Method::POST, "/api/menu", Some(&admin), Some(new_item)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["price"], 4.5);

    let id = body["data"]["id"].as_str().unwrap().to_string();
    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/menu/{id}/availability"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isAvailable"], false);

    let (status, body) = send(&app, Method::GET, "/api/menu/missing-id", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 6001);
}

#[tokio::test]
async fn test_guest_checkout_and_lookup() {
    let (app, _) = setup().await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        None,
        Some(order_payload("Guest@Example.com", "takeaway")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let order = &body["data"];
    assert_eq!(order["subtotal"], 7.0);
    assert_eq!(order["tax"], 0.35);
    assert_eq!(order["total"], 7.35);
    assert_eq!(order["status"], "pending");
    assert_eq!(order["paymentStatus"], "pending");
    assert_eq!(order["customer"]["email"], "guest@example.com");
    assert!(order["orderNumber"].as_str().unwrap().starts_with("ORD"));

    let id = order["id"].as_str().unwrap();
    let (status, body) = send(&app, Method::GET, &format!("/api/orders/{id}"), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], id);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        None,
        Some(json!({
            "customer": {"name": "Ana", "email": "ana@example.com", "phone": "555-0100"},
            "items": [{"name": "Unicorn Latte", "quantity": 1}],
            "orderType": "dine-in",
            "paymentMethod": "cash"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4002);

    let (status, body) = send(&app, Method::GET, "/api/orders/no-such-order", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], 4001);
}

#[tokio::test]
async fn test_order_management_permissions() {
    let (app, state) = setup().await;

    let staff = UserRecord::new(
        "Sam".to_string(),
        "sam@cafe.com".to_string(),
        "staff-pass",
        "555-0101".to_string(),
        UserRole::Staff,
    )
    .unwrap();
    state.users.create(&staff).await.unwrap();
    let staff_token = login(&app, "sam@cafe.com", "staff-pass").await;
    let customer_token = register(&app, "Ana", "ana@example.com").await;

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        None,
        Some(order_payload("ana@example.com", "delivery")),
    )
    .await;
    assert_eq!(body["data"]["total"], 9.35);
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, Method::GET, "/api/orders", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = send(&app, Method::GET, "/api/orders", Some(&customer_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = send(&app, Method::GET, "/api/orders", Some(&staff_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pagination"]["totalItems"], 1);

    // Customer sees own history only
    let (status, body) = send(
        &app,
        Method::GET,
        "/api/orders/customer/ana@example.com",
        Some(&customer_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    let (status, _) = send(
        &app,
        Method::GET,
        "/api/orders/customer/ben@example.com",
        Some(&customer_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Completing a pending-payment order marks it paid
    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/orders/{id}/status"),
        Some(&staff_token),
        Some(json!({"status": "completed"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "completed");
    assert_eq!(body["data"]["paymentStatus"], "paid");

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/orders/{id}/status"),
        Some(&staff_token),
        Some(json!({"status": "shipped"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 2);

    // Completed orders can no longer be cancelled
    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/orders/{id}"),
        Some(&customer_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4004);

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/orders/stats/summary",
        Some(&staff_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalOrders"], 1);
    assert_eq!(body["data"]["completedOrders"], 1);
    assert_eq!(body["data"]["totalRevenue"], 9.35);
}

#[tokio::test]
async fn test_customer_cancels_own_order_only() {
    let (app, _) = setup().await;
    let ana = register(&app, "Ana", "ana@example.com").await;
    let ben = register(&app, "Ben", "ben@example.com").await;

    let (_, body) = send(
        &app,
        Method::POST,
        "/api/orders",
        None,
        Some(order_payload("ana@example.com", "dine-in")),
    )
    .await;
    let id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(&app, Method::DELETE, &format!("/api/orders/{id}"), Some(&ben), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::DELETE, &format!("/api/orders/{id}"), Some(&ana), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "cancelled");
    assert_eq!(body["data"]["paymentStatus"], "pending");
}

#[tokio::test]
async fn test_login_lockout_and_profile() {
    let (app, _) = setup().await;
    let token = register(&app, "Ana", "ana@example.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users/register",
        None,
        Some(json!({
            "name": "Ana Again",
            "email": "ANA@example.com",
            "password": "secret1",
            "phone": "555-0100"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 8002);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/users/profile",
        Some(&token),
        Some(json!({"name": "Ana Lima", "profile": {"loyaltyPoints": 150}})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Ana Lima");
    assert_eq!(body["data"]["loyaltyTier"], "Bronze");
    assert_eq!(body["data"]["role"], "customer");

    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/users/password",
        Some(&token),
        Some(json!({"currentPassword": "wrong-one", "newPassword": "secret2"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 8003);

    for _ in 0..5 {
        let (status, _) = send(
            &app,
            Method::POST,
            "/api/users/login",
            None,
            Some(json!({"email": "ana@example.com", "password": "nope-nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users/login",
        None,
        Some(json!({"email": "ana@example.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::LOCKED);
    assert_eq!(body["code"], 1006);
}

#[tokio::test]
async fn test_admin_user_management() {
    let (app, _) = setup().await;
    let customer = register(&app, "Ana", "ana@example.com").await;
    let admin = login(&app, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    let (status, _) = send(&app, Method::GET, "/api/users", Some(&customer), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, Method::GET, "/api/users?search=ana", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    let users = body["data"]["items"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert!(users[0].get("passwordHash").is_none());
    let ana_id = users[0]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/users/{ana_id}/status"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["isActive"], false);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/users/login",
        None,
        Some(json!({"email": "ana@example.com", "password": "secret1"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], 1007);

    let (status, body) = send(&app, Method::GET, "/api/users/stats/summary", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["totalUsers"], 2);
    assert_eq!(body["data"]["inactiveUsers"], 1);
    assert_eq!(body["data"]["admins"], 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_simultaneous_checkouts_all_succeed() {
    let (app, _) = setup().await;

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let app = app.clone();
            tokio::spawn(async move {
                let email = format!("guest{i}@example.com");
                send(
                    &app,
                    Method::POST,
                    "/api/orders",
                    None,
                    Some(order_payload(&email, "takeaway")),
                )
                .await
            })
        })
        .collect();

    let mut numbers = std::collections::HashSet::new();
    for task in tasks {
        let (status, body) = task.await.unwrap();
        assert_eq!(status, StatusCode::CREATED, "checkout failed: {body}");
        let number = body["data"]["orderNumber"].as_str().unwrap().to_string();
        assert!(numbers.insert(number));
    }
    assert_eq!(numbers.len(), 16);
}

#[tokio::test]
async fn test_oversized_checkout_is_a_validation_failure() {
    let (app, _) = setup().await;

    let mut payload = order_payload("ana@example.com", "dine-in");
    payload["items"][0]["customization"] = json!([{"name": "Gold leaf", "price": 1e29}]);
    let (_, body) = send(&app, Method::POST, "/api/orders", None, Some(payload)).await;
    assert_eq!(body["code"], 2);

    let mut payload = order_payload("ana@example.com", "dine-in");
    payload["items"][0]["quantity"] = json!(u32::MAX);
    let (_, body) = send(&app, Method::POST, "/api/orders", None, Some(payload)).await;
    assert_eq!(body["code"], 2);

    let mut payload = order_payload("ana@example.com", "dine-in");
    payload["customer"]["name"] = json!("");
    let (_, body) = send(&app, Method::POST, "/api/orders", None, Some(payload)).await;
    assert_eq!(body["code"], 2);
    assert!(!body["message"].as_str().unwrap().contains("cannot exceed"));
}
