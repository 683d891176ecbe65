// SPDX-License-Identifier: BSD-3-Clause
// Copyright (c) 2026 Aleksandr Ptakhin

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use catalog_agent::app::{create_router, AppState, AGENT_NAME, VERSION};
use catalog_agent::models::forms::{FormKind, FormSubmission};
use catalog_agent::models::version::VersionResponse;
use catalog_agent::services::db::Database;
use catalog_agent::services::hubspot::FormForwarder;
use catalog_agent::services::partner_db::PartnerRepository;
use catalog_agent::services::product_db::ProductRepository;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const SECRET: &str = "test-secret";
const SERVER: &str = "https://api.example.com";

#[derive(Default)]
struct RecordingForwarder {
    forwarded: Mutex<Vec<FormSubmission>>,
    fail: bool,
}

#[async_trait]
impl FormForwarder for RecordingForwarder {
    async fn forward(&self, submission: &FormSubmission) -> anyhow::Result<()> {
        if self.fail {
            anyhow::bail!("HubSpot rejected {} form with status 401", submission.kind);
        }
        self.forwarded.lock().unwrap().push(submission.clone());
        Ok(())
    }
}

async fn create_test_app(forwarder: Arc<RecordingForwarder>) -> Router {
    let crm = Database::in_memory().await.unwrap();
    crm.bootstrap_crm().await.unwrap();
    sqlx::query(
        "INSERT INTO partners (id, company, img_url, website) VALUES \
         (1, 'Acme Robotics', 'acme.png', 'https://acme.example'), (2, 'Beta', NULL, NULL)",
    )
    .execute(crm.pool())
    .await
    .unwrap();

    let rackbeat = Database::in_memory().await.unwrap();
    rackbeat.bootstrap_rackbeat().await.unwrap();
    for statement in [
        "INSERT INTO categories (id, category) VALUES (1, 'Grippers')",
        "INSERT INTO products (id, name, is_current, category, blueprint) VALUES ('100', 'Gripper', 1, 1, 'g.pdf')",
        "INSERT INTO products (id, name, is_current) VALUES ('200', 'Retired', 0)",
    ] {
        sqlx::query(statement)
            .execute(rackbeat.pool())
            .await
            .unwrap();
    }

    create_router(AppState {
        partners: Arc::new(PartnerRepository::new(crm)),
        products: Arc::new(ProductRepository::new(rackbeat)),
        forwarder,
        secret_key: SECRET.into(),
        public_base_url: SERVER.into(),
    })
}

fn get(uri: &str, secret: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(secret) = secret {
        builder = builder.header("secret-key", secret);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(kind: FormKind, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(format!("/api/forms/{kind}"))
        .header("content-type", "application/json")
        .header("secret-key", SECRET)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_multipart_form(kind: FormKind, fields: &Value) -> Request<Body> {
    const BOUNDARY: &str = "----catalogFormBoundary";
    let mut body = String::new();
    for (name, value) in fields.as_object().unwrap() {
        body.push_str(&format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{}\r\n",
            value.as_str().unwrap()
        ));
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method("POST")
        .uri(format!("/api/forms/{kind}"))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("secret-key", SECRET)
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn partner_form() -> Value {
    json!({
        "firstName": "Ada",
        "lastName": "Lovelace",
        "email": "ada@example.com",
        "phone": "+45 1234",
        "company": "Engines Ltd",
        "country": "Denmark",
        "city": "Odense",
        "state": "",
        "industry": "Automotive",
        "message": "We would like to resell your grippers"
    })
}

#[tokio::test]
async fn test_version_endpoint_response() {
    let app = create_test_app(Arc::default()).await;

    let response = app.oneshot(get("/version", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );

    let version: VersionResponse = serde_json::from_value(json_body(response).await).unwrap();
    assert_eq!(version.agent, AGENT_NAME);
    assert_eq!(version.version, VERSION);
}

#[tokio::test]
async fn test_current_products_require_secret() {
    let app = create_test_app(Arc::default()).await;

    let response = app
        .oneshot(get("/api/products/current", Some("wrong")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({"errors": [{"location": "headers", "path": "secret-key", "msg": "Invalid value"}]})
    );
}

#[tokio::test]
async fn test_current_and_all_products() {
    let app = create_test_app(Arc::default()).await;

    let response = app
        .clone()
        .oneshot(get("/api/products/current", Some(SECRET)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let current = json_body(response).await;
    let products = current["products"].as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["id"], "100");
    assert_eq!(products[0]["category"], "Grippers");
    assert_eq!(
        products[0]["media"]["blueprint"],
        "https://api.example.com/images/blueprints/g.pdf"
    );

    let response = app
        .oneshot(get("/api/products/all", Some(SECRET)))
        .await
        .unwrap();
    let all = json_body(response).await;
    assert_eq!(all["products"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_all_partners_with_logo_urls() {
    let app = create_test_app(Arc::default()).await;

    let response = app
        .oneshot(get("/api/partners/all", Some(SECRET)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    let partners = body["partners"].as_array().unwrap();
    assert_eq!(partners.len(), 2);
    assert_eq!(
        partners[0]["img_url"],
        "https://api.example.com/images/partners/acme.png"
    );
    assert_eq!(partners[1]["img_url"], Value::Null);
}

#[tokio::test]
async fn test_partner_form_is_forwarded() {
    let forwarder = Arc::new(RecordingForwarder::default());
    let app = create_test_app(forwarder.clone()).await;

    let response = app
        .oneshot(post_form(FormKind::Partner, &partner_form().to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"message": "partner form data received"})
    );

    let forwarded = forwarder.forwarded.lock().unwrap();
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].kind, FormKind::Partner);
    assert_eq!(forwarded[0].value("email"), "ada@example.com");
}

#[tokio::test]
async fn test_multipart_partner_form_is_forwarded() {
    let forwarder = Arc::new(RecordingForwarder::default());
    let app = create_test_app(forwarder.clone()).await;

    let response = app
        .oneshot(post_multipart_form(FormKind::Partner, &partner_form()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"message": "partner form data received"})
    );

    let forwarded = forwarder.forwarded.lock().unwrap();
    assert_eq!(forwarded.len(), 1);
    assert_eq!(forwarded[0].value("firstName"), "Ada");
    assert_eq!(forwarded[0].value("company"), "Engines Ltd");
}

#[tokio::test]
async fn test_multipart_form_missing_field_is_reported() {
    let app = create_test_app(Arc::default()).await;

    let mut fields = partner_form();
    fields.as_object_mut().unwrap().remove("city");

    let response = app
        .oneshot(post_multipart_form(FormKind::Partner, &fields))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["errors"].as_array().unwrap().len(), 1);
    assert_eq!(body["errors"][0]["path"], "city");
}

#[tokio::test]
async fn test_form_missing_fields_are_reported() {
    let forwarder = Arc::new(RecordingForwarder::default());
    let app = create_test_app(forwarder.clone()).await;

    let mut body = partner_form();
    body.as_object_mut().unwrap().remove("email");
    body["phone"] = json!(12345);

    let response = app
        .oneshot(post_form(FormKind::Partner, &body.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let errors = json_body(response).await["errors"].clone();
    let paths: Vec<&str> = errors
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    assert_eq!(paths, vec!["email", "phone"]);
    assert_eq!(errors[0]["location"], "body");
    assert!(forwarder.forwarded.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_form_with_invalid_json_reports_every_field() {
    let app = create_test_app(Arc::default()).await;

    let response = app
        .oneshot(post_form(FormKind::Contact, "not json"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(
        body["errors"].as_array().unwrap().len(),
        FormKind::Contact.field_mapping().len()
    );
}

#[tokio::test]
async fn test_form_forward_failure_returns_error() {
    let forwarder = Arc::new(RecordingForwarder {
        fail: true,
        ..Default::default()
    });
    let app = create_test_app(forwarder).await;

    let response = app
        .oneshot(post_form(FormKind::Partner, &partner_form().to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("status 401"));
}

#[tokio::test]
async fn test_preflight_is_answered() {
    let app = create_test_app(Arc::default()).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/forms/contact")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let allowed = response
        .headers()
        .get("access-control-allow-headers")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(allowed.contains("secret-key"));
}

#[tokio::test]
async fn test_invalid_route_returns_404() {
    let app = create_test_app(Arc::default()).await;

    let response = app.oneshot(get("/invalid", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .starts_with("text/html"));
}
