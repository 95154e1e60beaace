//! End-to-end tests through the router, on an in-memory database and a fake
//! payment processor.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use tower::ServiceExt;

use mesa_api::gateway::{GatewayError, PaymentGateway, Preference, PreferenceRequest};
use mesa_api::{router, AppConfig, AppState};
use mesa_core::payment::{GatewayPayment, GatewayPaymentStatus};
use mesa_db::{Database, DbConfig};

const RID: &str = "la-parrilla";

#[derive(Default)]
struct FakeGateway {
    payments: Mutex<HashMap<String, GatewayPayment>>,
}

impl FakeGateway {
    fn put(&self, payment: GatewayPayment) {
        self.payments.lock().unwrap().insert(payment.id.clone(), payment);
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn fetch_payment(&self, _access_token: &str, payment_id: &str) -> Result<GatewayPayment, GatewayError> {
        self.payments
            .lock()
            .unwrap()
            .get(payment_id)
            .cloned()
            .ok_or_else(|| GatewayError::Status {
                status: 404,
                body: "not found".into(),
            })
    }

    async fn create_preference(
        &self,
        _access_token: &str,
        request: &PreferenceRequest,
    ) -> Result<Preference, GatewayError> {
        Ok(Preference {
            id: format!("pref-{}", request.order_id),
            init_point: format!("https://checkout.test/{}", request.order_id),
        })
    }
}

struct TestApp {
    router: Router,
    db: Database,
    gateway: Arc<FakeGateway>,
}

impl TestApp {
    async fn new() -> Self {
        Self::with_config(AppConfig::defaults().unwrap()).await
    }

    async fn with_config(config: AppConfig) -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let gateway = Arc::new(FakeGateway::default());
        let state = AppState::new(db.clone(), config, gateway.clone());

        TestApp {
            router: router(state),
            db,
            gateway,
        }
    }

    /// Fresh app with "La Parrilla" created.
    async fn with_restaurant() -> Self {
        let app = Self::new().await;
        app.create_restaurant().await;
        app
    }

    async fn create_restaurant(&self) {
        let (status, _) = self
            .send(
                Method::POST,
                "/api/restaurantes",
                Some(json!({
                    "name": "La Parrilla",
                    "adminName": "Ana",
                    "adminEmail": "ana@parrilla.com",
                    "password": "secreto123"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.request(method, uri, body, None).await
    }

    async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let headers: Vec<(&str, String)> = token
            .map(|token| ("authorization", format!("Bearer {token}")))
            .into_iter()
            .collect();
        self.request_with_headers(method, uri, body, &headers).await
    }

    async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, String)],
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, value);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    /// Table 1 with two bifes de chorizo at $4500.
    async fn table_with_lines(&self) -> String {
        let (status, order) = self
            .send(
                Method::POST,
                &format!("/api/ordenes?restauranteId={RID}"),
                Some(json!({ "kind": "mesa", "number": 1 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = order["id"].as_str().unwrap().to_string();

        let (status, order) = self
            .send(
                Method::POST,
                &format!("/api/ordenes/{id}/productos?restauranteId={RID}"),
                Some(json!({ "name": "Bife de chorizo", "unitPriceCents": 450_000, "quantity": 2 })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(order["totalCents"], 900_000);
        id
    }

    async fn webhook(&self, payment_id: &str) -> (StatusCode, Value) {
        self.send(
            Method::POST,
            &format!("/api/pagos/webhook?restauranteId={RID}"),
            Some(json!({ "type": "payment", "data": { "id": payment_id } })),
        )
        .await
    }
}

/// `x-signature` value for a notification about `data_id`.
fn signature(secret: &str, data_id: &str, request_id: &str, ts: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(format!("id:{data_id};request-id:{request_id};ts:{ts};").as_bytes());
    format!("ts={ts},v1={}", hex::encode(mac.finalize().into_bytes()))
}

fn approved(id: &str, order_id: &str, amount_cents: i64) -> GatewayPayment {
    GatewayPayment {
        id: id.to_string(),
        status: GatewayPaymentStatus::Approved,
        external_reference: Some(order_id.to_string()),
        transaction_amount_cents: amount_cents,
        payment_method_id: Some("account_money".to_string()),
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let (status, body) = app.send(Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_tenant_routes_require_restaurant_id() {
    let app = TestApp::with_restaurant().await;

    let (status, body) = app.send(Method::GET, "/api/ordenes", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");
    assert_eq!(body["error"], "restauranteId is required");

    let (status, _) = app.send(Method::GET, "/api/ordenes?restauranteId=", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tenants_are_isolated() {
    let app = TestApp::with_restaurant().await;
    let order_id = app.table_with_lines().await;

    let (status, _) = app
        .send(Method::GET, &format!("/api/ordenes/{order_id}?restauranteId=otro-local"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, orders) = app.send(Method::GET, "/api/ordenes?restauranteId=otro-local", None).await;
    assert_eq!(orders.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_duplicate_restaurant_conflicts() {
    let app = TestApp::with_restaurant().await;
    let (status, body) = app
        .send(
            Method::POST,
            "/api/restaurantes",
            Some(json!({
                "name": "La  Parrilla",
                "adminName": "Otro",
                "adminEmail": "otro@parrilla.com",
                "password": "secreto123"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");
}

#[tokio::test]
async fn test_login_opens_shift_and_logout_closes_it() {
    let app = TestApp::with_restaurant().await;

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/auth/login?restauranteId={RID}"),
            Some(json!({ "email": "ana@parrilla.com", "password": "equivocada" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, login) = app
        .send(
            Method::POST,
            &format!("/api/auth/login?restauranteId={RID}"),
            Some(json!({ "email": "ANA@parrilla.com", "password": "secreto123" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(login["employee"].get("passwordHash").is_none());
    let token = login["token"].as_str().unwrap();
    let user_id = login["employee"]["id"].as_str().unwrap();

    let (_, open) = app
        .send(
            Method::GET,
            &format!("/api/historial-empleados?restauranteId={RID}&abiertos=true"),
            None,
        )
        .await;
    assert_eq!(open.as_array().unwrap().len(), 1);

    let (status, session) = app.request(Method::GET, "/api/auth/session", None, Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["restaurant_id"], RID);

    let (status, logout) = app.request(Method::POST, "/api/auth/logout", None, Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(logout["shift"]["userId"], user_id);

    let (_, open) = app
        .send(
            Method::GET,
            &format!("/api/historial-empleados?restauranteId={RID}&abiertos=true"),
            None,
        )
        .await;
    assert_eq!(open.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_shift_open_requires_known_employee() {
    let app = TestApp::with_restaurant().await;
    let uri = format!("/api/historial-empleados/abrir?restauranteId={RID}");

    let (status, body) = app.send(Method::POST, &uri, Some(json!({ "usuarioId": "fantasma" }))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
    assert!(app.db.shifts().list(RID, None, false).await.unwrap().is_empty());

    let admin = app.db.employees().list(RID).await.unwrap().remove(0);
    let (status, first) = app.send(Method::POST, &uri, Some(json!({ "usuarioId": admin.id }))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, again) = app.send(Method::POST, &uri, Some(json!({ "usuarioId": admin.id }))).await;
    assert_eq!(first["id"], again["id"]);
}

#[tokio::test]
async fn test_admin_only_routes() {
    let app = TestApp::with_restaurant().await;

    let (status, _) = app
        .send(Method::PUT, &format!("/api/restaurantes/{RID}/pagos"), Some(json!({ "accessToken": "x" })))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, login) = app
        .send(
            Method::POST,
            &format!("/api/auth/login?restauranteId={RID}"),
            Some(json!({ "email": "ana@parrilla.com", "password": "secreto123" })),
        )
        .await;
    let admin_token = login["token"].as_str().unwrap().to_string();

    let (status, _) = app
        .request(
            Method::POST,
            "/api/empleados",
            Some(json!({ "name": "Mozo", "email": "mozo@parrilla.com", "password": "mozo12345", "role": "mozo" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, login) = app
        .send(
            Method::POST,
            &format!("/api/auth/login?restauranteId={RID}"),
            Some(json!({ "email": "mozo@parrilla.com", "password": "mozo12345" })),
        )
        .await;
    let mozo_token = login["token"].as_str().unwrap().to_string();

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/restaurantes/{RID}/pagos"),
            Some(json!({ "accessToken": "x" })),
            Some(&mozo_token),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/restaurantes/{RID}/pagos"),
            Some(json!({ "accessToken": "APP_USR-1" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_cash_payment_returns_change_and_decrements_stock() {
    let app = TestApp::with_restaurant().await;

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/bebidas?restauranteId={RID}"),
            Some(json!({ "name": "Coca Cola", "priceCents": 150_000, "stock": 5 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let order_id = app.table_with_lines().await;
    app.send(
        Method::POST,
        &format!("/api/ordenes/{order_id}/productos?restauranteId={RID}"),
        Some(json!({ "name": "Coca Cola", "unitPriceCents": 150_000, "quantity": 2 })),
    )
    .await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/ordenes/{order_id}/pagar?restauranteId={RID}"),
            Some(json!({ "method": "efectivo", "tenderedCents": 1_100_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "business_rule");

    let (status, paid) = app
        .send(
            Method::POST,
            &format!("/api/ordenes/{order_id}/pagar?restauranteId={RID}"),
            Some(json!({ "method": "efectivo", "tenderedCents": 1_500_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(paid["order"]["status"], "pagado");
    assert_eq!(paid["cash"]["change"], 300_000);
    assert_eq!(paid["ticket"]["totalCents"], 1_200_000);
    assert_eq!(paid["income"]["source"], "venta");
    assert!(paid["virtualMovement"].is_null());

    let (_, drinks) = app.send(Method::GET, &format!("/api/bebidas?restauranteId={RID}"), None).await;
    assert_eq!(drinks[0]["stock"], 3);

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/ordenes/{order_id}/pagar?restauranteId={RID}"),
            Some(json!({ "method": "efectivo" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, freed) = app
        .send(Method::POST, &format!("/api/ordenes/{order_id}/liberar?restauranteId={RID}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(freed["status"], "libre");
    assert_eq!(freed["lines"].as_array().unwrap().len(), 0);

    let (_, tickets) = app.send(Method::GET, &format!("/api/tickets?restauranteId={RID}"), None).await;
    assert_eq!(tickets.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_order_cannot_be_paid() {
    let app = TestApp::with_restaurant().await;
    let (_, order) = app
        .send(
            Method::POST,
            &format!("/api/ordenes?restauranteId={RID}"),
            Some(json!({ "kind": "takeaway" })),
        )
        .await;
    let id = order["id"].as_str().unwrap();

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/ordenes/{id}/pagar?restauranteId={RID}"),
            Some(json!({ "method": "virtual" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_oversized_line_is_rejected() {
    let app = TestApp::with_restaurant().await;
    let order_id = app.table_with_lines().await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/ordenes/{order_id}/productos?restauranteId={RID}"),
            Some(json!({ "name": "Vino", "unitPriceCents": i64::MAX / 2, "quantity": 3 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation");

    let (_, order) = app
        .send(Method::GET, &format!("/api/ordenes/{order_id}?restauranteId={RID}"), None)
        .await;
    assert_eq!(order["totalCents"], 900_000);
    assert_eq!(order["lines"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_delivery_requires_customer() {
    let app = TestApp::with_restaurant().await;
    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/ordenes?restauranteId={RID}"),
            Some(json!({ "kind": "delivery" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, order) = app
        .send(
            Method::POST,
            &format!("/api/ordenes?restauranteId={RID}"),
            Some(json!({ "kind": "delivery", "customer": { "name": "Juan", "address": "Corrientes 1234" } })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "abierta");
}

#[tokio::test]
async fn test_webhook_settles_once() {
    let app = TestApp::with_restaurant().await;
    app.db.restaurants().set_gateway_token(RID, Some("APP_USR-1")).await.unwrap();
    let order_id = app.table_with_lines().await;
    app.gateway.put(approved("9001", &order_id, 900_000));

    let (status, body) = app.webhook("9001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "recorded");
    assert_eq!(body["settlement"]["order"]["status"], "pagado");
    assert_eq!(body["settlement"]["order"]["paymentReference"], "9001");
    assert_eq!(body["settlement"]["virtualMovement"]["amountCents"], 900_000);
    assert_eq!(body["liberated"], false);

    let (status, body) = app.webhook("9001").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "duplicate");

    let (_, money) = app.send(Method::GET, &format!("/api/dinero?restauranteId={RID}"), None).await;
    assert_eq!(money["balanceCents"], 900_000);
    assert_eq!(money["movements"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_webhook_pending_payment_never_settles() {
    let app = TestApp::with_restaurant().await;
    app.db.restaurants().set_gateway_token(RID, Some("APP_USR-1")).await.unwrap();
    let order_id = app.table_with_lines().await;

    let mut pending = approved("9002", &order_id, 900_000);
    pending.status = GatewayPaymentStatus::Pending;
    app.gateway.put(pending);

    let (status, body) = app.webhook("9002").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "recorded");
    assert!(body["settlement"].is_null());

    let (_, order) = app
        .send(Method::GET, &format!("/api/ordenes/{order_id}?restauranteId={RID}"), None)
        .await;
    assert_eq!(order["status"], "abierta");
}

#[tokio::test]
async fn test_webhook_signature_is_enforced() {
    let mut config = AppConfig::defaults().unwrap();
    config.payments.webhook_secret = Some("s3cret".to_string());
    let app = TestApp::with_config(config).await;
    app.create_restaurant().await;
    app.db.restaurants().set_gateway_token(RID, Some("APP_USR-1")).await.unwrap();

    let order_id = app.table_with_lines().await;
    app.gateway.put(approved("9101", &order_id, 900_000));
    let uri = format!("/api/pagos/webhook?restauranteId={RID}");
    let body = json!({ "type": "payment", "data": { "id": 9101 } });

    // Unsigned.
    let (status, err) = app.request_with_headers(Method::POST, &uri, Some(body.clone()), &[]).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(err["code"], "unauthenticated");

    // Signed for another payment.
    let forged = [
        ("x-signature", signature("s3cret", "9999", "req-1", "1700000000")),
        ("x-request-id", "req-1".to_string()),
    ];
    let (status, _) = app.request_with_headers(Method::POST, &uri, Some(body.clone()), &forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Signed with the wrong secret.
    let wrong_key = [
        ("x-signature", signature("otro", "9101", "req-1", "1700000000")),
        ("x-request-id", "req-1".to_string()),
    ];
    let (status, _) = app.request_with_headers(Method::POST, &uri, Some(body.clone()), &wrong_key).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    assert!(app.db.ledger().transactions(RID).await.unwrap().is_empty());
    let (_, order) = app
        .send(Method::GET, &format!("/api/ordenes/{order_id}?restauranteId={RID}"), None)
        .await;
    assert_eq!(order["status"], "abierta");

    let signed = [
        ("x-signature", signature("s3cret", "9101", "req-2", "1700000000")),
        ("x-request-id", "req-2".to_string()),
    ];
    let (status, body) = app.request_with_headers(Method::POST, &uri, Some(body), &signed).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "recorded");
    assert_eq!(body["settlement"]["order"]["status"], "pagado");
    assert_eq!(app.db.ledger().transactions(RID).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_webhook_short_payment_leaves_order_open() {
    let app = TestApp::with_restaurant().await;
    app.db.restaurants().set_gateway_token(RID, Some("APP_USR-1")).await.unwrap();
    let order_id = app.table_with_lines().await;
    app.gateway.put(approved("9102", &order_id, 1_000));

    let (status, body) = app.webhook("9102").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "recorded");
    assert!(body["settlement"].is_null());

    let (_, order) = app
        .send(Method::GET, &format!("/api/ordenes/{order_id}?restauranteId={RID}"), None)
        .await;
    assert_eq!(order["status"], "abierta");
    let (_, money) = app.send(Method::GET, &format!("/api/dinero?restauranteId={RID}"), None).await;
    assert_eq!(money["balanceCents"], 0);
}

#[tokio::test]
async fn test_webhook_edges() {
    let app = TestApp::with_restaurant().await;

    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/pagos/webhook?restauranteId={RID}"),
            Some(json!({ "type": "merchant_order", "data": { "id": 1 } })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ignored");

    // No processor token configured yet.
    let (status, _) = app.webhook("1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.db.restaurants().set_gateway_token(RID, Some("APP_USR-1")).await.unwrap();
    let (status, body) = app.webhook("unknown").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["code"], "gateway");
}

#[tokio::test]
async fn test_qr_checkout() {
    let app = TestApp::with_restaurant().await;
    let order_id = app.table_with_lines().await;

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/pagos/qr?restauranteId={RID}"),
            Some(json!({ "orderId": order_id })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.db.restaurants().set_gateway_token(RID, Some("APP_USR-1")).await.unwrap();
    let (status, body) = app
        .send(
            Method::POST,
            &format!("/api/pagos/qr?restauranteId={RID}"),
            Some(json!({ "orderId": order_id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["initPoint"], format!("https://checkout.test/{order_id}"));
}

#[tokio::test]
async fn test_payments_summary() {
    let app = TestApp::with_restaurant().await;

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/caja/abrir?restauranteId={RID}"),
            Some(json!({ "openingCents": 1_000_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let order_id = app.table_with_lines().await;
    app.send(
        Method::POST,
        &format!("/api/ordenes/{order_id}/pagar?restauranteId={RID}"),
        Some(json!({ "method": "efectivo" })),
    )
    .await;

    app.send(
        Method::POST,
        &format!("/api/egresos?restauranteId={RID}"),
        Some(json!({ "amountCents": 100_000, "reason": "Hielo", "account": "efectivo" })),
    )
    .await;
    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/ingresos?restauranteId={RID}"),
            Some(json!({ "amountCents": 200_000, "reason": "Transferencia evento", "method": "virtual" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, summary) = app
        .send(Method::GET, &format!("/api/pagos-resumen?restauranteId={RID}"), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let dinero = &summary["dinero"];
    assert_eq!(dinero["efectivo"], 1_000_000 + 900_000 - 100_000);
    assert_eq!(dinero["virtual"], 200_000);
    assert_eq!(dinero["total"], 1_000_000 + 900_000 - 100_000 + 200_000);
    assert_eq!(dinero["cajaAbierta"], true);

    assert_eq!(summary["ingresos"]["total"], 1_100_000);
    assert_eq!(summary["ingresos"]["cantidad"], 2);
    assert_eq!(summary["egresos"]["total"], 100_000);

    let ventas = &summary["ventas"];
    assert_eq!(ventas["efectivo"], 900_000);
    assert_eq!(ventas["virtual"], 0);
    assert_eq!(ventas["cantidad"], 1);
    assert_eq!(ventas["porTipo"]["mesa"], 900_000);
}

#[tokio::test]
async fn test_register_lifecycle() {
    let app = TestApp::with_restaurant().await;

    let (status, closed) = app
        .send(
            Method::POST,
            &format!("/api/caja/cerrar?restauranteId={RID}"),
            Some(json!({ "countedCents": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["synthetic"], true);

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/caja/extraer?restauranteId={RID}"),
            Some(json!({ "amountCents": 1000, "reason": "Cambio" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    app.send(
        Method::POST,
        &format!("/api/caja/abrir?restauranteId={RID}"),
        Some(json!({ "openingCents": 500_000 })),
    )
    .await;
    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/caja/abrir?restauranteId={RID}"),
            Some(json!({ "openingCents": 500_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, withdrawal) = app
        .send(
            Method::POST,
            &format!("/api/caja/extraer?restauranteId={RID}"),
            Some(json!({ "amountCents": 100_000, "reason": "Proveedor" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(withdrawal["expense"]["account"], "efectivo");

    let (status, closed) = app
        .send(
            Method::POST,
            &format!("/api/caja/cerrar?restauranteId={RID}"),
            Some(json!({ "countedCents": 400_000 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["synthetic"], false);
    assert_eq!(closed["reconciliation"]["difference"], 0);

    let (_, overview) = app.send(Method::GET, &format!("/api/caja?restauranteId={RID}"), None).await;
    assert!(overview["current"].is_null());
    assert_eq!(overview["history"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_category_delete_cascades() {
    let app = TestApp::with_restaurant().await;

    let (_, category) = app
        .send(
            Method::POST,
            &format!("/api/categorias?restauranteId={RID}"),
            Some(json!({ "name": "Parrilla" })),
        )
        .await;
    let category_id = category["id"].as_str().unwrap();

    for name in ["Vacio", "Entraña"] {
        let (status, _) = app
            .send(
                Method::POST,
                &format!("/api/productos?restauranteId={RID}"),
                Some(json!({ "categoryId": category_id, "name": name, "priceCents": 800_000 })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = app
        .send(
            Method::DELETE,
            &format!("/api/categorias/{category_id}?restauranteId={RID}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removedProducts"], 2);

    let (_, products) = app.send(Method::GET, &format!("/api/productos?restauranteId={RID}"), None).await;
    assert_eq!(products.as_array().unwrap().len(), 0);
}
