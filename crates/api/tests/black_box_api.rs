use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::json;
use tradebook_auth::{JwtClaims, PrincipalId, Role};
use tradebook_core::TenantId;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(jwt_secret: &str) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = tradebook_api::app::build_app(jwt_secret.to_string()).await;
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn mint_jwt(jwt_secret: &str, tenant_id: TenantId, roles: Vec<Role>) -> String {
    let now = Utc::now();
    let claims = JwtClaims {
        sub: PrincipalId::new(),
        tenant_id,
        roles,
        issued_at: now,
        expires_at: now + ChronoDuration::minutes(10),
    };

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .expect("failed to encode jwt")
}

const SECRET: &str = "test-secret";

fn admin_token(tenant_id: TenantId) -> String {
    mint_jwt(SECRET, tenant_id, vec![Role::new("admin")])
}

async fn create_item(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    name: &str,
    quantity: &str,
) -> serde_json::Value {
    let res = client
        .post(format!("{}/stock/items", base_url))
        .bearer_auth(token)
        .json(&json!({ "name": name, "initial_quantity": quantity }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

async fn create_customer(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    name: &str,
) -> serde_json::Value {
    let res = client
        .post(format!("{}/customers", base_url))
        .bearer_auth(token)
        .json(&json!({ "name": name, "email": "billing@acme.example" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

fn due_date() -> String {
    (Utc::now() + ChronoDuration::days(30)).to_rfc3339()
}

async fn item_quantity(
    client: &reqwest::Client,
    base_url: &str,
    token: &str,
    item_id: &str,
) -> String {
    let res = client
        .get(format!("{}/stock/items/{}", base_url, item_id))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    body["quantity_on_hand"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let srv = TestServer::spawn(SECRET).await;
    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn auth_required_for_protected_endpoints() {
    let srv = TestServer::spawn(SECRET).await;

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/whoami", srv.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_role_is_forbidden() {
    let srv = TestServer::spawn(SECRET).await;
    let token = mint_jwt(SECRET, TenantId::new(), vec![Role::new("viewer")]);

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/stock/items", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({ "name": "Beans" }))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn issuing_an_invoice_decrements_stock_and_renders_a_document() {
    let srv = TestServer::spawn(SECRET).await;
    let tenant_id = TenantId::new();
    let token = admin_token(tenant_id);
    let client = reqwest::Client::new();

    let item = create_item(&client, &srv.base_url, &token, "Espresso beans 1kg", "10").await;
    let item_id = item["id"].as_str().unwrap();
    let customer = create_customer(&client, &srv.base_url, &token, "Acme Supplies").await;
    let customer_id = customer["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/invoices", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "customer_id": customer_id,
            "lines": [{
                "item_id": item_id,
                "description": "Espresso beans 1kg",
                "quantity": "4",
                "unit_price": "10.50"
            }],
            "due_date": due_date(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let invoice: serde_json::Value = res.json().await.unwrap();
    assert_eq!(invoice["status"], "open");
    assert_eq!(invoice["total_amount"], "42.00");

    assert_eq!(item_quantity(&client, &srv.base_url, &token, item_id).await, "6");

    let res = client
        .get(format!(
            "{}/invoices/{}/document",
            srv.base_url,
            invoice["id"].as_str().unwrap()
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let doc: serde_json::Value = res.json().await.unwrap();
    assert_eq!(doc["customer"]["name"], "Acme Supplies");
    assert_eq!(doc["amount_due"], "42.00");
    assert_eq!(doc["lines"][0]["line_total"], "42.00");
}

#[tokio::test]
async fn insufficient_stock_aborts_the_invoice_and_restores_other_lines() {
    let srv = TestServer::spawn(SECRET).await;
    let tenant_id = TenantId::new();
    let token = admin_token(tenant_id);
    let client = reqwest::Client::new();

    let plenty = create_item(&client, &srv.base_url, &token, "Beans", "10").await;
    let empty = create_item(&client, &srv.base_url, &token, "Filters", "0").await;
    let plenty_id = plenty["id"].as_str().unwrap();
    let empty_id = empty["id"].as_str().unwrap();
    let customer = create_customer(&client, &srv.base_url, &token, "Acme Supplies").await;

    let res = client
        .post(format!("{}/invoices", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "customer_id": customer["id"].as_str().unwrap(),
            "lines": [
                { "item_id": plenty_id, "quantity": "4", "unit_price": "10.00" },
                { "item_id": empty_id, "quantity": "1", "unit_price": "2.00" }
            ],
            "due_date": due_date(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");
    assert_eq!(body["failed_items"][0], empty_id);

    // The decrement applied to the other line was compensated.
    assert_eq!(item_quantity(&client, &srv.base_url, &token, plenty_id).await, "10");

    // Nothing was half-saved.
    let res = client
        .get(format!("{}/invoices", srv.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let invoices: serde_json::Value = res.json().await.unwrap();
    assert_eq!(invoices.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn exact_boundary_sells_out_and_the_next_hundredth_fails() {
    let srv = TestServer::spawn(SECRET).await;
    let tenant_id = TenantId::new();
    let token = admin_token(tenant_id);
    let client = reqwest::Client::new();

    let item = create_item(&client, &srv.base_url, &token, "Beans", "5").await;
    let item_id = item["id"].as_str().unwrap();
    let customer = create_customer(&client, &srv.base_url, &token, "Acme Supplies").await;
    let customer_id = customer["id"].as_str().unwrap();

    let issue = |quantity: &'static str| {
        let client = client.clone();
        let url = format!("{}/invoices", srv.base_url);
        let token = token.clone();
        let body = json!({
            "customer_id": customer_id,
            "lines": [{ "item_id": item_id, "quantity": quantity, "unit_price": "1.00" }],
            "due_date": due_date(),
        });
        async move { client.post(url).bearer_auth(token).json(&body).send().await.unwrap() }
    };

    let res = issue("5").await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(item_quantity(&client, &srv.base_url, &token, item_id).await, "0");

    let res = issue("0.01").await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn quotations_never_touch_the_ledger() {
    let srv = TestServer::spawn(SECRET).await;
    let tenant_id = TenantId::new();
    let token = admin_token(tenant_id);
    let client = reqwest::Client::new();

    let item = create_item(&client, &srv.base_url, &token, "Beans", "10").await;
    let item_id = item["id"].as_str().unwrap();
    let customer = create_customer(&client, &srv.base_url, &token, "Acme Supplies").await;

    let res = client
        .post(format!("{}/invoices", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "customer_id": customer["id"].as_str().unwrap(),
            "kind": "quotation",
            "lines": [{ "item_id": item_id, "quantity": "100", "unit_price": "10.00" }],
            "due_date": due_date(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    assert_eq!(item_quantity(&client, &srv.base_url, &token, item_id).await, "10");
}

#[tokio::test]
async fn payments_flow_until_paid_and_reject_overpayment() {
    let srv = TestServer::spawn(SECRET).await;
    let tenant_id = TenantId::new();
    let token = admin_token(tenant_id);
    let client = reqwest::Client::new();

    let item = create_item(&client, &srv.base_url, &token, "Beans", "10").await;
    let customer = create_customer(&client, &srv.base_url, &token, "Acme Supplies").await;

    let res = client
        .post(format!("{}/invoices", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "customer_id": customer["id"].as_str().unwrap(),
            "lines": [{ "item_id": item["id"].as_str().unwrap(), "quantity": "2", "unit_price": "50.00" }],
            "due_date": due_date(),
        }))
        .send()
        .await
        .unwrap();
    let invoice: serde_json::Value = res.json().await.unwrap();
    let invoice_id = invoice["id"].as_str().unwrap();

    let pay = |amount: &'static str| {
        let client = client.clone();
        let url = format!("{}/invoices/{}/payments", srv.base_url, invoice_id);
        let token = token.clone();
        async move {
            client
                .post(url)
                .bearer_auth(token)
                .json(&json!({ "amount": amount }))
                .send()
                .await
                .unwrap()
        }
    };

    let res = pay("40.00").await;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "open");

    let res = pay("100.00").await;
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = pay("60.00").await;
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["status"], "paid");
}

#[tokio::test]
async fn tenants_cannot_see_or_mutate_each_others_stock() {
    let srv = TestServer::spawn(SECRET).await;
    let owner_token = admin_token(TenantId::new());
    let intruder_token = admin_token(TenantId::new());
    let client = reqwest::Client::new();

    let item = create_item(&client, &srv.base_url, &owner_token, "Beans", "10").await;
    let item_id = item["id"].as_str().unwrap();

    let res = client
        .get(format!("{}/stock/items/{}", srv.base_url, item_id))
        .bearer_auth(&intruder_token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = client
        .post(format!("{}/stock/items/{}/refill", srv.base_url, item_id))
        .bearer_auth(&intruder_token)
        .json(&json!({ "quantity": "5" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    assert_eq!(
        item_quantity(&client, &srv.base_url, &owner_token, item_id).await,
        "10"
    );
}

#[tokio::test]
async fn sales_report_covers_the_billed_period() {
    let srv = TestServer::spawn(SECRET).await;
    let tenant_id = TenantId::new();
    let token = admin_token(tenant_id);
    let client = reqwest::Client::new();

    let item = create_item(&client, &srv.base_url, &token, "Beans", "100").await;
    let customer = create_customer(&client, &srv.base_url, &token, "Acme Supplies").await;

    let res = client
        .post(format!("{}/invoices", srv.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "customer_id": customer["id"].as_str().unwrap(),
            "lines": [{ "item_id": item["id"].as_str().unwrap(), "quantity": "3", "unit_price": "10.00" }],
            "due_date": due_date(),
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let from = (Utc::now() - ChronoDuration::days(1)).to_rfc3339();
    let to = (Utc::now() + ChronoDuration::days(1)).to_rfc3339();
    let res = client
        .get(format!("{}/reports/sales", srv.base_url))
        .bearer_auth(&token)
        .query(&[("from", from.as_str()), ("to", to.as_str())])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let report: serde_json::Value = res.json().await.unwrap();
    assert_eq!(report["invoice_count"], 1);
    assert_eq!(report["gross_revenue"], "30.00");
    assert_eq!(report["by_item"][0]["quantity_sold"], "3");
}
