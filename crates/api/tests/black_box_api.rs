use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};

use stockpact_core::{ProductId, SystemClock, VendorId, WarehouseId};
use stockpact_infra::providers::Seed;
use stockpact_infra::{ScmConfig, ScmService};

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(seed: Seed) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let services = Arc::new(ScmService::in_memory(ScmConfig::default(), Arc::new(SystemClock), seed));
        let app = stockpact_api::app::build_app(services);
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

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

struct Ids {
    widget: ProductId,
    warehouse: WarehouseId,
    acme: VendorId,
    globex: VendorId,
}

fn seed() -> (Seed, Ids) {
    let ids = Ids {
        widget: ProductId::new(),
        warehouse: WarehouseId::new(),
        acme: VendorId::new(),
        globex: VendorId::new(),
    };
    let seed = Seed::from_json(
        &json!({
            "products": [{
                "product_id": ids.widget,
                "name": "Widget",
                "unit_cost": 250,
                "reorder_point": 50,
                "safety_stock": 10,
                "annual_demand": 1200.0,
                "ordering_cost": 50.0,
                "holding_cost_per_unit": 2.0
            }],
            "stock": [{
                "product_id": ids.widget,
                "warehouse_id": ids.warehouse,
                "on_hand": 100,
                "reserved": 30
            }],
            "purchase_orders": [{
                "po_number": "PO-2020-0001",
                "vendor_id": ids.acme,
                "warehouse_id": ids.warehouse,
                "status": "confirmed",
                "expected_delivery_date": "2099-01-15",
                "lines": [{
                    "product_id": ids.widget,
                    "product_name": "Widget",
                    "quantity": 40,
                    "unit_of_measure": "pcs",
                    "unit_price": 250
                }]
            }],
            "vendors": [
                { "vendor_id": ids.acme, "name": "Acme", "rating": 4.0, "status": "active" },
                { "vendor_id": ids.globex, "name": "Globex", "rating": 3.0, "status": "active" }
            ]
        })
        .to_string(),
    )
    .unwrap();
    (seed, ids)
}

async fn post(client: &reqwest::Client, url: String, body: Value) -> (StatusCode, Value) {
    let res = client.post(url).json(&body).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap_or(Value::Null))
}

async fn get(client: &reqwest::Client, url: String) -> (StatusCode, Value) {
    let res = client.get(url).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap_or(Value::Null))
}

async fn delete(client: &reqwest::Client, url: String) -> (StatusCode, Value) {
    let res = client.delete(url).json(&json!({})).send().await.unwrap();
    let status = res.status();
    (status, res.json().await.unwrap_or(Value::Null))
}

#[tokio::test]
async fn health_is_public() {
    let (seed, _) = seed();
    let srv = TestServer::spawn(seed).await;

    let res = reqwest::get(srv.url("/health")).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn atp_endpoint_reports_availability_and_id_errors() {
    let (seed, ids) = seed();
    let srv = TestServer::spawn(seed).await;
    let client = reqwest::Client::new();

    let (status, body) = get(&client, srv.url(&format!("/inventory/atp/{}", ids.widget))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["atp_qty"], 110);
    assert_eq!(body["incoming_po_qty"], 40);
    assert_eq!(body["breakdown"]["incoming"][0]["po_number"], "PO-2020-0001");

    let (status, body) = get(&client, srv.url("/inventory/atp/not-a-uuid")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");

    let (status, body) = get(&client, srv.url(&format!("/inventory/atp/{}", ProductId::new()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn reservation_reduces_atp_until_released() {
    let (seed, ids) = seed();
    let srv = TestServer::spawn(seed).await;
    let client = reqwest::Client::new();

    let (status, reservation) = post(
        &client,
        srv.url("/inventory/reservations"),
        json!({
            "product_id": ids.widget,
            "warehouse_id": ids.warehouse,
            "sales_order_ref": "SO-42",
            "quantity": 60
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = reservation["id"].as_str().unwrap().to_string();

    let (_, atp) = get(&client, srv.url(&format!("/inventory/atp/{}", ids.widget))).await;
    assert_eq!(atp["atp_qty"], 50);

    let (status, body) = post(
        &client,
        srv.url("/inventory/reservations"),
        json!({
            "product_id": ids.widget,
            "warehouse_id": ids.warehouse,
            "sales_order_ref": "SO-43",
            "quantity": 51
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, released) = post(&client, srv.url(&format!("/inventory/reservations/{id}/release")), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(released["status"], "released");

    let (_, atp) = get(&client, srv.url(&format!("/inventory/atp/{}", ids.widget))).await;
    assert_eq!(atp["atp_qty"], 110);
}

#[tokio::test]
async fn rfq_lifecycle_over_http() {
    let (seed, ids) = seed();
    let srv = TestServer::spawn(seed).await;
    let client = reqwest::Client::new();

    let (status, rfq) = post(&client, srv.url("/rfqs"), json!({ "title": "Widgets Q3" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(rfq["rfq_number"].as_str().unwrap().starts_with("RFQ-"));
    let rfq_id = rfq["id"].as_str().unwrap().to_string();

    let (status, _) = post(
        &client,
        srv.url(&format!("/rfqs/{rfq_id}/lines")),
        json!({ "product_id": ids.widget, "product_name": "Widget", "quantity": 400, "estimated_unit_price": 250 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, sent) = post(&client, srv.url(&format!("/rfqs/{rfq_id}/send")), json!({ "expected_version": 2 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent["status"], "sent");

    for (vendor, value, days, terms) in [(ids.acme, 100_000, 10, "Net 30"), (ids.globex, 120_000, 14, "Net 45")] {
        let (status, _) = post(
            &client,
            srv.url(&format!("/rfqs/{rfq_id}/responses")),
            json!({ "vendor_id": vendor, "total_quoted_value": value, "delivery_days": days, "payment_terms": terms }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, ranked) = post(&client, srv.url(&format!("/rfqs/{rfq_id}/evaluate")), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let ranked = ranked.as_array().unwrap().clone();
    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0]["rank"], 1);
    assert_eq!(ranked[0]["vendor_id"], json!(ids.acme));
    let winner = ranked[0]["id"].as_str().unwrap().to_string();
    let loser = ranked[1]["id"].as_str().unwrap().to_string();

    let (status, accepted) = post(&client, srv.url(&format!("/rfq-responses/{winner}/accept")), json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(accepted["rfq"]["status"], "closed");
    assert!(accepted["po_number"].as_str().unwrap().starts_with("PO-"));

    let (status, body) = post(&client, srv.url(&format!("/rfq-responses/{loser}/accept")), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "state_conflict");

    let (status, verification) = get(&client, srv.url("/audit/verify/rfq")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(verification["valid"], true);
    assert_eq!(verification["total_entries"], 7);

    let (status, trail) = get(&client, srv.url(&format!("/audit/trail?entity_type=rfq&entity_id={rfq_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trail.as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn rfq_errors_map_to_status_codes() {
    let (seed, ids) = seed();
    let srv = TestServer::spawn(seed).await;
    let client = reqwest::Client::new();

    let (status, body) = post(&client, srv.url("/rfqs"), json!({ "title": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let res = client
        .post(srv.url("/rfqs"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let (_, rfq) = post(&client, srv.url("/rfqs"), json!({ "title": "Single bid" })).await;
    let rfq_id = rfq["id"].as_str().unwrap().to_string();
    post(
        &client,
        srv.url(&format!("/rfqs/{rfq_id}/responses")),
        json!({ "vendor_id": ids.acme, "total_quoted_value": 5000, "delivery_days": 3, "payment_terms": "Net 30" }),
    )
    .await;

    let (status, body) = post(&client, srv.url(&format!("/rfqs/{rfq_id}/evaluate")), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, body) = post(&client, srv.url(&format!("/rfqs/{rfq_id}/cancel")), json!({ "expected_version": 1 })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "state_conflict");

    let res = client.delete(srv.url(&format!("/rfqs/{rfq_id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let (_, list) = get(&client, srv.url("/rfqs")).await;
    assert!(list.as_array().unwrap().is_empty());
    let (status, archived) = get(&client, srv.url(&format!("/rfqs/{rfq_id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(archived["archived"], true);
}

#[tokio::test]
async fn replenishment_request_flow() {
    let (mut seed, ids) = seed();
    seed.stock[0].on_hand = 20;
    seed.stock[0].reserved = 0;
    let srv = TestServer::spawn(seed).await;
    let client = reqwest::Client::new();

    let (status, alerts) = get(&client, srv.url("/replenishment/alerts")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alerts[0]["suggested_qty"], 245);

    let (status, request) = post(&client, srv.url("/replenishment/requests"), json!({ "product_id": ids.widget, "warehouse_id": ids.warehouse })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(request["status"], "pending");
    let id = request["id"].as_str().unwrap().to_string();

    let convert = json!({ "vendor_id": ids.acme });
    let (status, _) = post(&client, srv.url(&format!("/replenishment/requests/{id}/convert")), convert.clone()).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = post(&client, srv.url(&format!("/replenishment/requests/{id}/approve")), json!({})).await;
    assert_eq!(status, StatusCode::OK);

    let (status, converted) = post(&client, srv.url(&format!("/replenishment/requests/{id}/convert")), convert).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(converted["status"], "converted_to_po");
    assert!(converted["po_number"].as_str().unwrap().starts_with("PO-"));
}

#[tokio::test]
async fn risk_scores_show_unassessed_vendors() {
    let (seed, ids) = seed();
    let srv = TestServer::spawn(seed).await;
    let client = reqwest::Client::new();

    let (status, score) = post(
        &client,
        srv.url(&format!("/suppliers/{}/risk/signals", ids.acme)),
        json!({
            "on_time_delivery_rate": 90.0,
            "quality_score": 80.0,
            "price_competitiveness": 70.0,
            "responsiveness": 85.0,
            "compliance_score": 100.0
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(score["risk_level"], "low");
    assert_eq!(score["risk_score"], 15.25);

    let (status, summaries) = get(&client, srv.url("/suppliers/risk")).await;
    assert_eq!(status, StatusCode::OK);
    let summaries = summaries.as_array().unwrap();
    assert_eq!(summaries.len(), 2);
    assert_eq!(summaries[0]["vendor_name"], "Acme");
    assert_eq!(summaries[0]["latest"]["risk_level"], "low");
    assert_eq!(summaries[1]["vendor_name"], "Globex");
    assert!(summaries[1]["latest"].is_null());

    let (status, _) = post(&client, srv.url(&format!("/suppliers/{}/risk", VendorId::new())), json!({})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn shipments_feed_the_dashboard() {
    let (seed, _) = seed();
    let srv = TestServer::spawn(seed).await;
    let client = reqwest::Client::new();

    let (status, shipment) = post(&client, srv.url("/shipments"), json!({ "kind": "outbound", "reference": "SO-42" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(shipment["shipment_number"].as_str().unwrap().starts_with("OUT-"));
    let id = shipment["id"].as_str().unwrap().to_string();

    let (status, _) = post(&client, srv.url(&format!("/shipments/{id}/status")), json!({ "status": "in_transit" })).await;
    assert_eq!(status, StatusCode::OK);

    let (status, kpis) = get(&client, srv.url("/dashboard/kpis")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(kpis["total_shipments"], 1);
    assert_eq!(kpis["in_transit_shipments"], 1);

    let (status, body) = post(&client, srv.url(&format!("/shipments/{id}/status")), json!({ "status": "pending" })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "state_conflict");
}

#[tokio::test]
async fn rfq_lines_and_vendor_bids_over_http() {
    let (seed, ids) = seed();
    let srv = TestServer::spawn(seed).await;
    let client = reqwest::Client::new();

    let (_, rfq) = post(&client, srv.url("/rfqs"), json!({ "title": "Widgets Q4" })).await;
    let rfq_id = rfq["id"].as_str().unwrap().to_string();
    for name in ["Widget", "Widget spare"] {
        let (status, _) = post(
            &client,
            srv.url(&format!("/rfqs/{rfq_id}/lines")),
            json!({ "product_id": ids.widget, "product_name": name, "quantity": 400 }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, trimmed) = delete(&client, srv.url(&format!("/rfqs/{rfq_id}/lines/2"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(trimmed["lines"].as_array().unwrap().len(), 1);
    let (status, body) = delete(&client, srv.url(&format!("/rfqs/{rfq_id}/lines/two"))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_id");

    let (_, answered) = post(
        &client,
        srv.url(&format!("/rfqs/{rfq_id}/responses")),
        json!({ "vendor_id": ids.acme, "total_quoted_value": 96_000, "delivery_days": 10, "payment_terms": "Net 30" }),
    )
    .await;
    let response_id = answered["responses"][0]["id"].as_str().unwrap().to_string();

    let (status, _) = post(
        &client,
        srv.url(&format!("/rfq-responses/{response_id}/bids")),
        json!({ "line_no": 1, "unit_price": 240, "lead_time_days": 9 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, bids) = get(&client, srv.url(&format!("/rfq-responses/{response_id}/bids"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(bids[0]["line_total"], 96_000);

    let (status, body) = post(
        &client,
        srv.url(&format!("/rfq-responses/{response_id}/bids")),
        json!({ "line_no": 2, "unit_price": 240 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (status, body) = delete(&client, srv.url(&format!("/rfqs/{rfq_id}/lines/1"))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "state_conflict");
}

#[tokio::test]
async fn lots_and_shipment_lines_over_http() {
    let (seed, ids) = seed();
    let srv = TestServer::spawn(seed).await;
    let client = reqwest::Client::new();

    let lot = json!({
        "lot_number": "L-7",
        "product_id": ids.widget,
        "warehouse_id": ids.warehouse,
        "quantity": 60,
        "expiry_date": "2099-12-31"
    });
    let (status, created) = post(&client, srv.url("/inventory/lots"), lot.clone()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["lot_number"], "L-7");
    let (status, body) = post(&client, srv.url("/inventory/lots"), lot).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "state_conflict");

    let (status, lots) = get(&client, srv.url(&format!("/inventory/lots?product_id={}", ids.widget))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lots.as_array().unwrap().len(), 1);

    let (_, shipment) = post(&client, srv.url("/shipments"), json!({ "kind": "inbound" })).await;
    let id = shipment["id"].as_str().unwrap().to_string();
    let (status, _) = post(
        &client,
        srv.url(&format!("/shipments/{id}/lines")),
        json!({ "product_id": ids.widget, "product_name": "Widget", "quantity": 60, "weight_grams": 90_000 }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, lines) = get(&client, srv.url(&format!("/shipments/{id}/lines"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(lines[0]["quantity"], 60);

    let (_, kpis) = get(&client, srv.url("/dashboard/kpis")).await;
    assert_eq!(kpis["total_lots"], 1);

    let (_, verification) = get(&client, srv.url("/audit/verify/inventory_lot")).await;
    assert_eq!(verification["valid"], true);
    assert_eq!(verification["total_entries"], 1);
}
