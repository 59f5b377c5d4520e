//! HTTP-level tests: the full actix-web app, backed by the in-memory store,
//! driven over a real socket with reqwest.

use std::sync::Arc;
use std::time::Duration;

use actix_web::web;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use storefront_admin::domain::pricing::PriceResolver;
use storefront_admin::infrastructure::memory_store::InMemoryStore;
use storefront_admin::infrastructure::notifier::LogNotifier;
use storefront_admin::{build_server, AppState, PageLimits};

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .expect("bind failed")
        .local_addr()
        .expect("addr failed")
        .port()
}

/// Starts the app in a background task and returns its base URL once it
/// answers requests.
async fn start_app() -> String {
    let port = free_port();
    let state = web::Data::new(AppState::new(
        Arc::new(InMemoryStore::new()),
        Arc::new(LogNotifier),
        PriceResolver::default(),
        PageLimits::default(),
    ));
    let server = build_server(state, "127.0.0.1", port).expect("Failed to bind server");
    tokio::spawn(server);

    let base = format!("http://127.0.0.1:{}", port);
    let client = Client::new();
    for _ in 0..50 {
        if client.get(format!("{base}/categories")).send().await.is_ok() {
            return base;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("server on port {port} did not come up");
}

async fn post(client: &Client, url: String, body: Value) -> (StatusCode, Value) {
    let resp = client.post(url).json(&body).send().await.expect("request failed");
    let status = resp.status();
    (status, resp.json().await.expect("body is not JSON"))
}

async fn get(client: &Client, url: String) -> (StatusCode, Value) {
    let resp = client.get(url).send().await.expect("request failed");
    let status = resp.status();
    (status, resp.json().await.expect("body is not JSON"))
}

fn checkout(email: &str, key: Option<&str>) -> Value {
    json!({
        "customer": {
            "email": email,
            "name": "Chidi Okeke",
            "address": "4 Allen Ave, Ikeja"
        },
        "items": [
            { "product_id": "2f1c3b7e-2a39-4a70-9a39-0d6f1f1b2c11", "quantity": 2, "unit_price": "7500" },
            { "product_id": "9b0d7c55-61b4-4e89-8d2f-3f0b7b1a9e42", "quantity": 1, "unit_price": "3000" }
        ],
        "total": "18000",
        "currency": "NGN",
        "payment_method": "bank_transfer",
        "idempotency_key": key
    })
}

#[tokio::test]
async fn catalog_listing_search_and_price_quote() {
    let base = start_app().await;
    let client = Client::new();

    let (status, category) = post(
        &client,
        format!("{base}/categories"),
        json!({ "name": "Clothing" }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let category_id = category["id"].as_str().unwrap().to_string();

    for (name, ngn) in [("Agbada set", Some("45000")), ("Dashiki shirt", None), ("Agbada cap", None)] {
        let (status, _) = post(
            &client,
            format!("{base}/products"),
            json!({
                "name": name,
                "category_id": category_id,
                "base_price": "20.00",
                "price_ngn": ngn,
                "stock": 3
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, page) = get(&client, format!("{base}/products?search=agbada&limit=1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["total"], 2);
    assert_eq!(page["documents"].as_array().unwrap().len(), 1);
    assert_eq!(page["meta"]["totalPages"], 2);
    assert_eq!(page["meta"]["nextPage"], 2);
    assert_eq!(page["meta"]["previousPage"], Value::Null);

    let (_, all) = get(&client, format!("{base}/products?category_id={category_id}")).await;
    let set = all["documents"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["name"] == "Agbada set")
        .unwrap()
        .clone();
    let set_id = set["id"].as_str().unwrap();

    let (status, quote) = get(&client, format!("{base}/products/{set_id}/price?currency=NGN")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(quote["source"], "regional");
    assert_eq!(quote["formatted"], "₦45,000");

    let (_, quote) = get(&client, format!("{base}/products/{set_id}/price?currency=GHS")).await;
    assert_eq!(quote["source"], "converted");
    assert_eq!(quote["formatted"], "GH₵300.00");
}

#[tokio::test]
async fn checkout_is_idempotent_and_status_follows_transitions() {
    let base = start_app().await;
    let client = Client::new();

    let (status, placed) = post(
        &client,
        format!("{base}/orders"),
        checkout("Chidi@Example.com", Some("cart-77")),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(placed["replayed"], false);
    assert_eq!(placed["items"].as_array().unwrap().len(), 2);
    assert_eq!(placed["order"]["status"], "pending");
    assert_eq!(placed["order"]["total_display"], "₦18,000");
    let order_id = placed["order"]["id"].as_str().unwrap().to_string();

    let (status, replay) = post(
        &client,
        format!("{base}/orders"),
        checkout("chidi@example.com", Some("cart-77")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replay["replayed"], true);
    assert_eq!(replay["order"]["id"], order_id.as_str());

    let (_, customers) = get(&client, format!("{base}/customers?search=chidi")).await;
    assert_eq!(customers["total"], 1);
    assert_eq!(customers["documents"][0]["email"], "chidi@example.com");

    let (status, detail) = get(&client, format!("{base}/orders/{order_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["items"].as_array().unwrap().len(), 2);

    let resp = client
        .patch(format!("{base}/orders/{order_id}/status"))
        .json(&json!({ "status": "processing" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .patch(format!("{base}/orders/{order_id}/status"))
        .json(&json!({ "status": "delivered" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["kind"], "conflict");

    let (_, processing) = get(&client, format!("{base}/orders?status=processing")).await;
    assert_eq!(processing["total"], 1);
}

#[tokio::test]
async fn checkout_rejects_mismatched_total_and_missing_address() {
    let base = start_app().await;
    let client = Client::new();

    let mut wrong_total = checkout("ngozi@example.com", None);
    wrong_total["total"] = json!("17999.50");
    let (status, body) = post(&client, format!("{base}/orders"), wrong_total).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "conflict");

    let mut no_address = checkout("emeka@example.com", None);
    no_address["customer"]["address"] = Value::Null;
    let (status, body) = post(&client, format!("{base}/orders"), no_address).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    let long_email = format!("{}@example.com", "e".repeat(300));
    let (status, body) = post(&client, format!("{base}/orders"), checkout(&long_email, None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "validation");

    let mut sub_cent = checkout("emeka@example.com", None);
    sub_cent["items"][0]["unit_price"] = json!("7500.005");
    let (status, _) = post(&client, format!("{base}/orders"), sub_cent).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, orders) = get(&client, format!("{base}/orders")).await;
    assert_eq!(orders["total"], 0);
}

#[tokio::test]
async fn bad_requests_map_to_typed_errors() {
    let base = start_app().await;
    let client = Client::new();

    for query in ["page=0", "limit=0", "limit=101", "page=-2"] {
        let (status, body) = get(&client, format!("{base}/products?{query}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{query}");
        assert_eq!(body["kind"], "validation");
    }

    let (status, body) = get(
        &client,
        format!("{base}/products/7a0e8f0c-5d0e-4a4e-9f59-1b2b4c0d7e01"),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["kind"], "not_found");

    let (status, _) = get(&client, format!("{base}/orders/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&client, format!("{base}/orders?status=lost")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(
        &client,
        format!("{base}/subcategories"),
        json!({ "category_id": "7a0e8f0c-5d0e-4a4e-9f59-1b2b4c0d7e01", "name": "Orphans" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let base = start_app().await;
    let (status, doc) = get(&Client::new(), format!("{base}/api-docs/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/orders"].is_object());
    assert!(doc["paths"]["/products/{id}/price"].is_object());
}
