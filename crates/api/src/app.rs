use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower::ServiceBuilder;

use tradebook_core::{CustomerId, DomainError, InvoiceId, Quantity, StockItemId};
use tradebook_infra::{
    BillingError, BillingService, CustomerStore, InMemoryCustomerStore, InMemoryInvoiceStore,
    InMemoryStockLedger, InvoiceStore, LedgerError, PostgresCustomerStore, PostgresInvoiceStore,
    PostgresStockLedger, StockLedger, StoreError,
};
use tradebook_invoicing::{InvoiceDraft, InvoiceKind, LineDraft};
use tradebook_parties::{ContactInfo, Customer, CustomerDraft};
use tradebook_reporting::ReportPeriod;
use tradebook_stock::{NewStockItem, StockItem};

use crate::authz::OperationAuth;
use crate::context::{PrincipalContext, TenantContext};

/// Storage-backed services shared by all handlers.
///
/// Every store is a `dyn` trait object, so the in-memory (dev/test) and
/// Postgres (production) wirings produce the same type.
#[derive(Clone)]
pub struct AppServices {
    ledger: Arc<dyn StockLedger>,
    customers: Arc<dyn CustomerStore>,
    invoices: Arc<dyn InvoiceStore>,
    billing: Arc<BillingService>,
}

impl AppServices {
    fn assemble(
        ledger: Arc<dyn StockLedger>,
        customers: Arc<dyn CustomerStore>,
        invoices: Arc<dyn InvoiceStore>,
    ) -> Self {
        let billing = Arc::new(BillingService::new(
            ledger.clone(),
            invoices.clone(),
            customers.clone(),
        ));
        Self {
            ledger,
            customers,
            invoices,
            billing,
        }
    }
}

fn build_in_memory_services() -> AppServices {
    AppServices::assemble(
        Arc::new(InMemoryStockLedger::new()),
        Arc::new(InMemoryCustomerStore::new()),
        Arc::new(InMemoryInvoiceStore::new()),
    )
}

async fn build_persistent_services() -> AppServices {
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set when USE_PERSISTENT_STORES=true");

    let pool = sqlx::PgPool::connect(&database_url)
        .await
        .expect("failed to connect to Postgres");

    AppServices::assemble(
        Arc::new(PostgresStockLedger::new(pool.clone())),
        Arc::new(PostgresCustomerStore::new(pool.clone())),
        Arc::new(PostgresInvoiceStore::new(pool)),
    )
}

pub async fn build_app(jwt_secret: String) -> Router {
    let jwt = Arc::new(tradebook_auth::Hs256JwtValidator::new(jwt_secret.into_bytes()));
    let auth_state = crate::middleware::AuthState { jwt };

    let use_persistent = std::env::var("USE_PERSISTENT_STORES")
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false);

    let services = if use_persistent {
        build_persistent_services().await
    } else {
        build_in_memory_services()
    };

    let services = Arc::new(services);

    // Protected routes: require auth + tenant context.
    let protected = Router::new()
        .route("/whoami", get(whoami))
        .nest("/stock", stock_router())
        .nest("/customers", customers_router())
        .nest("/invoices", invoices_router())
        .route("/reports/sales", get(sales_report))
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            crate::middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .layer(ServiceBuilder::new())
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn whoami(
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> impl IntoResponse {
    Json(serde_json::json!({
        "tenant_id": tenant.tenant_id().to_string(),
        "principal_id": principal.principal_id().to_string(),
        "roles": principal.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
    }))
}

// ── Stock ────────────────────────────────────────────────────────────────

fn stock_router() -> Router {
    Router::new()
        .route("/items", post(create_item).get(list_items))
        .route("/items/:id", get(get_item))
        .route("/items/:id/refill", post(refill_item))
}

#[derive(Debug, Deserialize)]
struct CreateItemRequest {
    name: String,
    sku: Option<String>,
    initial_quantity: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
struct RefillRequest {
    quantity: Decimal,
}

async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<CreateItemRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_operation(
        &tenant,
        &principal,
        &OperationAuth::require("stock.items.create"),
    ) {
        return json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let initial_quantity = match Quantity::new(body.initial_quantity.unwrap_or(Decimal::ZERO)) {
        Ok(q) => q,
        Err(e) => return domain_error_to_response(e),
    };

    let item = match StockItem::create(
        tenant.tenant_id(),
        StockItemId::new(),
        NewStockItem {
            name: body.name,
            sku: body.sku,
            initial_quantity,
        },
        Utc::now(),
    ) {
        Ok(item) => item,
        Err(e) => return domain_error_to_response(e),
    };

    if let Err(e) = services.ledger.create_item(item.clone()).await {
        return ledger_error_to_response(e);
    }

    (StatusCode::CREATED, Json(item)).into_response()
}

async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_operation(
        &tenant,
        &principal,
        &OperationAuth::require("stock.items.read"),
    ) {
        return json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    match services.ledger.list(tenant.tenant_id()).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => ledger_error_to_response(e),
    }
}

async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_operation(
        &tenant,
        &principal,
        &OperationAuth::require("stock.items.read"),
    ) {
        return json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let item_id: StockItemId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id"),
    };

    match services.ledger.get(tenant.tenant_id(), item_id).await {
        Ok(Some(item)) => (StatusCode::OK, Json(item)).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "not_found", "item not found"),
        Err(e) => ledger_error_to_response(e),
    }
}

async fn refill_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<RefillRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_operation(
        &tenant,
        &principal,
        &OperationAuth::require("stock.items.refill"),
    ) {
        return json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let item_id: StockItemId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id"),
    };

    let quantity = match Quantity::positive(body.quantity) {
        Ok(q) => q,
        Err(e) => return domain_error_to_response(e),
    };

    match services.ledger.refill(tenant.tenant_id(), item_id, quantity).await {
        Ok(total) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "id": item_id.to_string(),
                "quantity_on_hand": total,
            })),
        )
            .into_response(),
        Err(e) => ledger_error_to_response(e),
    }
}

// ── Customers ────────────────────────────────────────────────────────────

fn customers_router() -> Router {
    Router::new()
        .route("/", post(create_customer).get(list_customers))
        .route(
            "/:id",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

#[derive(Debug, Deserialize)]
struct CustomerRequest {
    name: String,
    email: Option<String>,
    phone: Option<String>,
    billing_address: Option<String>,
}

impl CustomerRequest {
    fn into_draft(self) -> CustomerDraft {
        CustomerDraft {
            name: self.name,
            contact: ContactInfo {
                email: self.email,
                phone: self.phone,
                billing_address: self.billing_address,
            },
        }
    }
}

async fn create_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<CustomerRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_operation(
        &tenant,
        &principal,
        &OperationAuth::require("customers.manage"),
    ) {
        return json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let customer = match Customer::create(
        tenant.tenant_id(),
        CustomerId::new(),
        body.into_draft(),
        Utc::now(),
    ) {
        Ok(c) => c,
        Err(e) => return domain_error_to_response(e),
    };

    if let Err(e) = services.customers.insert(customer.clone()).await {
        return store_error_to_response(e);
    }

    (StatusCode::CREATED, Json(customer)).into_response()
}

async fn list_customers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_operation(
        &tenant,
        &principal,
        &OperationAuth::require("customers.read"),
    ) {
        return json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    match services.customers.list(tenant.tenant_id()).await {
        Ok(customers) => (StatusCode::OK, Json(customers)).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn get_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_operation(
        &tenant,
        &principal,
        &OperationAuth::require("customers.read"),
    ) {
        return json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let customer_id: CustomerId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid customer id"),
    };

    match services.customers.get(tenant.tenant_id(), customer_id).await {
        Ok(Some(customer)) => (StatusCode::OK, Json(customer)).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "not_found", "customer not found"),
        Err(e) => store_error_to_response(e),
    }
}

async fn update_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<CustomerRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_operation(
        &tenant,
        &principal,
        &OperationAuth::require("customers.manage"),
    ) {
        return json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let customer_id: CustomerId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid customer id"),
    };

    let mut customer = match services.customers.get(tenant.tenant_id(), customer_id).await {
        Ok(Some(c)) => c,
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "not_found", "customer not found"),
        Err(e) => return store_error_to_response(e),
    };

    if let Err(e) = customer.update(body.into_draft(), Utc::now()) {
        return domain_error_to_response(e);
    }

    if let Err(e) = services.customers.update(customer.clone()).await {
        return store_error_to_response(e);
    }

    (StatusCode::OK, Json(customer)).into_response()
}

async fn delete_customer(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_operation(
        &tenant,
        &principal,
        &OperationAuth::require("customers.manage"),
    ) {
        return json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let customer_id: CustomerId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid customer id"),
    };

    match services.customers.remove(tenant.tenant_id(), customer_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => store_error_to_response(e),
    }
}

// ── Invoices ─────────────────────────────────────────────────────────────

fn invoices_router() -> Router {
    Router::new()
        .route("/", post(issue_invoice).get(list_invoices))
        .route("/:id", get(get_invoice))
        .route("/:id/payments", post(register_payment))
        .route("/:id/void", post(void_invoice))
        .route("/:id/document", get(invoice_document))
}

#[derive(Debug, Deserialize)]
struct LineRequest {
    item_id: String,
    description: Option<String>,
    quantity: Decimal,
    unit_price: Decimal,
}

#[derive(Debug, Deserialize)]
struct IssueInvoiceRequest {
    customer_id: String,
    #[serde(default = "default_kind")]
    kind: InvoiceKind,
    lines: Vec<LineRequest>,
    due_date: DateTime<Utc>,
}

fn default_kind() -> InvoiceKind {
    InvoiceKind::Invoice
}

#[derive(Debug, Deserialize)]
struct PaymentRequest {
    amount: Decimal,
}

#[derive(Debug, Deserialize)]
struct VoidRequest {
    reason: Option<String>,
}

async fn issue_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<IssueInvoiceRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_operation(
        &tenant,
        &principal,
        &OperationAuth::require("invoices.issue"),
    ) {
        return json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let customer_id: CustomerId = match body.customer_id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid customer id"),
    };

    let mut lines = Vec::with_capacity(body.lines.len());
    for line in body.lines {
        let item_id: StockItemId = match line.item_id.parse() {
            Ok(v) => v,
            Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id"),
        };
        lines.push(LineDraft {
            item_id,
            description: line.description.unwrap_or_default(),
            quantity: line.quantity,
            unit_price: line.unit_price,
        });
    }

    let draft = InvoiceDraft {
        customer_id,
        kind: body.kind,
        lines,
        due_date: body.due_date,
    };

    match services.billing.issue_invoice(tenant.tenant_id(), draft).await {
        Ok(invoice) => (StatusCode::CREATED, Json(invoice)).into_response(),
        Err(e) => billing_error_to_response(e),
    }
}

async fn list_invoices(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_operation(
        &tenant,
        &principal,
        &OperationAuth::require("invoices.read"),
    ) {
        return json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    match services.invoices.list(tenant.tenant_id()).await {
        Ok(invoices) => (StatusCode::OK, Json(invoices)).into_response(),
        Err(e) => store_error_to_response(e),
    }
}

async fn get_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_operation(
        &tenant,
        &principal,
        &OperationAuth::require("invoices.read"),
    ) {
        return json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let invoice_id: InvoiceId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid invoice id"),
    };

    match services.invoices.get(tenant.tenant_id(), invoice_id).await {
        Ok(Some(invoice)) => (StatusCode::OK, Json(invoice)).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "not_found", "invoice not found"),
        Err(e) => store_error_to_response(e),
    }
}

async fn register_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<PaymentRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_operation(
        &tenant,
        &principal,
        &OperationAuth::require("invoices.collect"),
    ) {
        return json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let invoice_id: InvoiceId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid invoice id"),
    };

    match services
        .billing
        .register_payment(tenant.tenant_id(), invoice_id, body.amount)
        .await
    {
        Ok(invoice) => (StatusCode::OK, Json(invoice)).into_response(),
        Err(e) => billing_error_to_response(e),
    }
}

async fn void_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<VoidRequest>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_operation(
        &tenant,
        &principal,
        &OperationAuth::require("invoices.issue"),
    ) {
        return json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let invoice_id: InvoiceId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid invoice id"),
    };

    match services
        .billing
        .void_invoice(tenant.tenant_id(), invoice_id, body.reason)
        .await
    {
        Ok(invoice) => (StatusCode::OK, Json(invoice)).into_response(),
        Err(e) => billing_error_to_response(e),
    }
}

async fn invoice_document(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_operation(
        &tenant,
        &principal,
        &OperationAuth::require("invoices.read"),
    ) {
        return json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let invoice_id: InvoiceId = match id.parse() {
        Ok(v) => v,
        Err(_) => return json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid invoice id"),
    };

    match services
        .billing
        .invoice_document(tenant.tenant_id(), invoice_id)
        .await
    {
        Ok(doc) => (StatusCode::OK, Json(doc)).into_response(),
        Err(e) => billing_error_to_response(e),
    }
}

// ── Reports ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SalesReportQuery {
    from: DateTime<Utc>,
    to: DateTime<Utc>,
}

async fn sales_report(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<SalesReportQuery>,
) -> axum::response::Response {
    if let Err(e) = crate::authz::authorize_operation(
        &tenant,
        &principal,
        &OperationAuth::require("reports.read"),
    ) {
        return json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string());
    }

    let period = match ReportPeriod::new(query.from, query.to) {
        Ok(p) => p,
        Err(e) => return domain_error_to_response(e),
    };

    match services.billing.sales_summary(tenant.tenant_id(), period).await {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(e) => billing_error_to_response(e),
    }
}

// ── Error mapping ────────────────────────────────────────────────────────

fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        DomainError::Unauthorized => json_error(StatusCode::FORBIDDEN, "unauthorized", "unauthorized"),
    }
}

fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    match err {
        LedgerError::InsufficientStock => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "insufficient_stock",
            "not enough stock",
        ),
        LedgerError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "item not found"),
        LedgerError::AlreadyExists => {
            json_error(StatusCode::CONFLICT, "conflict", "item already exists")
        }
        LedgerError::Invalid(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        LedgerError::Transient(msg) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable", msg)
        }
    }
}

fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        StoreError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        StoreError::Corrupt(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "corrupt_row", msg)
        }
        StoreError::Transient(msg) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable", msg)
        }
    }
}

fn billing_error_to_response(err: BillingError) -> axum::response::Response {
    match err {
        BillingError::Domain(e) => domain_error_to_response(e),
        BillingError::UnknownCustomer => {
            json_error(StatusCode::NOT_FOUND, "not_found", "customer not found")
        }
        BillingError::InsufficientStock {
            failed_items,
            unrestored_items,
        } => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(serde_json::json!({
                "error": "insufficient_stock",
                "message": format!("not enough stock for {} line item(s)", failed_items.len()),
                "failed_items": failed_items.iter().map(|i| i.to_string()).collect::<Vec<_>>(),
                "unrestored_items": unrestored_items.iter().map(|i| i.to_string()).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        BillingError::Transient(msg) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "storage_unavailable", msg)
        }
    }
}

fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        Json(serde_json::json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
