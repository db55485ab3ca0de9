mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use machining_ledger::store::{MemoryRecordStore, RecordStore, Table};
use serde_json::{json, Value};

use common::{response_json, TestApp};

fn record_payload(fecha: &str, persona: &str, op: &str, minutes: &str) -> Value {
    json!({
        "fecha": fecha,
        "persona": persona,
        "op": op,
        "cantidad": "4",
        "item": "brida",
        "tiempo_mecanizado": minutes,
        "tamano": "M",
        "maquina": "CNC-1",
        "observaciones": ""
    })
}

#[tokio::test]
async fn health_endpoints_report_store_state() {
    let app = TestApp::new();

    let response = app.request(Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let response = app.request(Method::GET, "/health/ready", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["store"]["backend"], "memory");
}

#[tokio::test]
async fn production_record_lifecycle() {
    let app = TestApp::new();

    let response = app
        .request(
            Method::POST,
            "/api/v1/production-records",
            Some(record_payload("2024-01-10", "Ana", "OP1", "60")),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Registro guardado correctamente");
    assert_eq!(body["data"]["tiempo_mecanizado"], 60);
    assert!(body["meta"]["request_id"].is_string());

    app.request(
        Method::POST,
        "/api/v1/production-records",
        Some(record_payload("2024-02-01", "Luis", "OP2", "30")),
    )
    .await;

    let response = app
        .request(Method::GET, "/api/v1/production-records", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let records = body["data"].as_array().expect("record list");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["fecha"], "2024-02-01");
    assert_eq!(records[1]["persona"], "Ana");
    assert!(records[1].get("observaciones").map_or(true, Value::is_null));

    let response = app.request(Method::GET, "/api/v1/persons", None).await;
    let body = response_json(response).await;
    assert_eq!(body["data"], json!(["Ana", "Luis"]));
}

#[tokio::test]
async fn invalid_draft_is_rejected_before_the_store() {
    let app = TestApp::new();

    let mut payload = record_payload("2024-01-10", "", "OP1", "1.5");
    payload["cantidad"] = json!("");
    let response = app
        .request(Method::POST, "/api/v1/production-records", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = response_json(response).await;
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("persona"), "{}", message);
    assert!(message.contains("cantidad"), "{}", message);
    assert!(message.contains("tiempo_mecanizado"), "{}", message);

    let response = app
        .request(Method::GET, "/api/v1/production-records", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn wages_upsert_and_cost_report() {
    let app = TestApp::new();
    for (fecha, op, minutes) in [
        ("2024-01-10", "OP1", "60"),
        ("2024-01-11", "OP2", "45"),
        ("2024-01-12", "OP1", "30"),
    ] {
        let response = app
            .request(
                Method::POST,
                "/api/v1/production-records",
                Some(record_payload(fecha, "Ana", op, minutes)),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    // Without wages every order costs nothing
    let response = app
        .request(Method::GET, "/api/v1/reports/order-costs", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["orders"][0]["total_cost"], "0.00");

    for rate in ["8", "10"] {
        let response = app
            .request(
                Method::PUT,
                "/api/v1/wages",
                Some(json!({ "persona": "Ana", "salario_por_hora": rate })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.request(Method::GET, "/api/v1/wages", None).await;
    let body = response_json(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["salario_por_hora"], "10");

    let response = app
        .request(Method::GET, "/api/v1/reports/order-costs", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let orders = body["data"]["orders"].as_array().unwrap();
    let cost_of = |op: &str| {
        orders
            .iter()
            .find(|o| o["order_id"] == op)
            .map(|o| o["total_cost"].clone())
            .unwrap()
    };
    assert_eq!(cost_of("OP1"), "15.00");
    assert_eq!(cost_of("OP2"), "7.50");
}

#[tokio::test]
async fn negative_wage_is_a_validation_error() {
    let app = TestApp::new();
    let response = app
        .request(
            Method::PUT,
            "/api/v1/wages",
            Some(json!({ "persona": "Ana", "salario_por_hora": "-3" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn machine_time_report_groups_and_filters() {
    let app = TestApp::new();
    for (fecha, persona, op, minutes) in [
        ("2024-01-10", "Ana", "OP1", "60"),
        ("2024-01-11", "Ana", "OP2", "45"),
        ("2024-02-01", "Luis", "OP1", "30"),
    ] {
        app.request(
            Method::POST,
            "/api/v1/production-records",
            Some(record_payload(fecha, persona, op, minutes)),
        )
        .await;
    }

    let response = app
        .request(Method::GET, "/api/v1/reports/machine-time", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["data"]["totals"]["mode"], "by-order");
    // Records arrive newest first, so OP1 is encountered first
    assert_eq!(body["data"]["chart"]["labels"], json!(["OP1", "OP2"]));
    assert_eq!(body["data"]["chart"]["values"], json!([90, 45]));

    let response = app
        .request(
            Method::GET,
            "/api/v1/reports/machine-time?group_by=order&order_id=OP1",
            None,
        )
        .await;
    let body = response_json(response).await;
    let groups = body["data"]["totals"]["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["total_minutes"], 90);

    let response = app
        .request(
            Method::GET,
            "/api/v1/reports/machine-time?group_by=month&month=2024-01&order_id=",
            None,
        )
        .await;
    let body = response_json(response).await;
    let groups = body["data"]["totals"]["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0]["label"], "enero 2024");
    assert_eq!(groups[0]["total_minutes"], 105);

    let response = app
        .request(
            Method::GET,
            "/api/v1/reports/machine-time?group_by=week",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(Method::GET, "/api/v1/reports/filter-options", None)
        .await;
    let body = response_json(response).await;
    assert_eq!(body["data"]["orders"], json!(["OP1", "OP2"]));
    assert_eq!(body["data"]["months"][0]["key"], "2024-02");
}

#[tokio::test]
async fn corrupt_rows_surface_as_unprocessable() {
    let store = Arc::new(MemoryRecordStore::new());
    store
        .insert(
            Table::ProductionRecords,
            json!({
                "fecha": "2024-01-11", "persona": "Luis", "op": "OP1", "cantidad": 1,
                "item": "eje", "tiempo_mecanizado": "abc", "tamano": "M", "maquina": "T1"
            })
            .as_object()
            .cloned()
            .unwrap(),
        )
        .await
        .unwrap();
    let app = TestApp::with_store(store);

    let response = app
        .request(Method::GET, "/api/v1/reports/machine-time", None)
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("tiempo_mecanizado"));
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn numeric_json_fields_are_accepted() {
    let app = TestApp::new();
    let mut payload = record_payload("2024-01-10", "Ana", "OP1", "0");
    payload["cantidad"] = json!(5);
    payload["tiempo_mecanizado"] = json!(45);

    let response = app
        .request(Method::POST, "/api/v1/production-records", Some(payload.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["data"]["cantidad"], 5);
    assert_eq!(body["data"]["tiempo_mecanizado"], 45);

    payload["cantidad"] = json!(2.5);
    let response = app
        .request(Method::POST, "/api/v1/production-records", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("cantidad"));

    let response = app
        .request(
            Method::PUT,
            "/api/v1/wages",
            Some(json!({ "persona": "Ana", "salario_por_hora": 12.5 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn out_of_range_numbers_are_validation_errors() {
    let app = TestApp::new();

    let response = app
        .request(
            Method::POST,
            "/api/v1/production-records",
            Some(record_payload("2024-01-10", "Ana", "OP1", "3000000000")),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("tiempo_mecanizado: is too large"));

    let response = app
        .request(
            Method::PUT,
            "/api/v1/wages",
            Some(json!({ "persona": "Ana", "salario_por_hora": "79228162514264337593543950335" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let wages = response_json(app.request(Method::GET, "/api/v1/wages", None).await).await;
    assert_eq!(wages["data"], json!([]));
}

#[tokio::test]
async fn oversized_stored_wage_fails_cost_report_cleanly() {
    let store = Arc::new(MemoryRecordStore::new());
    store
        .upsert(
            Table::EmployeeWages,
            json!({ "persona": "Ana", "salario_por_hora": "79228162514264337593543950335" })
                .as_object()
                .cloned()
                .unwrap(),
            "persona",
        )
        .await
        .unwrap();
    let app = TestApp::with_store(store);
    app.request(
        Method::POST,
        "/api/v1/production-records",
        Some(record_payload("2024-01-10", "Ana", "OP1", "120")),
    )
    .await;

    let response = app
        .request(Method::GET, "/api/v1/reports/order-costs", None)
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = response_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("salario_por_hora"));

    // The chart does not read wages and keeps working
    let response = app
        .request(Method::GET, "/api/v1/reports/machine-time", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}
