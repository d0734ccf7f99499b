mod common;

use axum::http::{Method, StatusCode};
use chrono::{Datelike, Duration, Utc};
use common::{encode, error_code, spawn_app, spawn_app_at, temp_database_url};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::task::JoinSet;

#[tokio::test]
async fn client_create_read_update_delete() {
    let app = spawn_app(|_| {}).await;
    let token = app.lawyer_token().await;

    let created = app.create_client(&token, "شركة النيل للمقاولات").await;
    let id = created["id"].as_str().unwrap();
    assert_eq!(created["lawyer_id"], "lawyer-test-id");

    let (status, fetched) = app
        .call(Method::GET, &format!("/api/clients/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) = app
        .call(
            Method::PUT,
            &format!("/api/clients/{id}"),
            Some(&token),
            Some(json!({ "type": "company", "email": "info@nile.example" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["type"], "company");
    assert_eq!(updated["name"], "شركة النيل للمقاولات");

    let (status, listed) = app
        .call(
            Method::GET,
            &format!("/api/clients?search={}&type=company", encode("النيل")),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, _) = app
        .call(Method::DELETE, &format!("/api/clients/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = app
        .call(Method::GET, &format!("/api/clients/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_code(&body), "NOT_FOUND");
}

#[tokio::test]
async fn blank_client_name_is_rejected() {
    let app = spawn_app(|_| {}).await;
    let token = app.lawyer_token().await;
    let (status, body) = app
        .call(
            Method::POST,
            "/api/clients",
            Some(&token),
            Some(json!({ "name": "   ", "type": "individual" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["message"], "اسم العميل مطلوب");
}

#[tokio::test]
async fn lawyers_cannot_see_or_reference_each_others_records() {
    let app = spawn_app(|_| {}).await;
    let owner = app.lawyer_token().await;
    let (intruder, intruder_id) = app.register_lawyer("other@example.com").await;

    let client = app.create_client(&owner, "عميل سري").await;
    let client_id = client["id"].as_str().unwrap();

    let (status, _) = app
        .call(Method::GET, &format!("/api/clients/{client_id}"), Some(&intruder), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/api/clients/{client_id}"),
            Some(&intruder),
            Some(json!({ "name": "مختطف" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, list) = app.call(Method::GET, "/api/clients", Some(&intruder), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(list.as_array().unwrap().is_empty());

    let (status, body) = app
        .call(
            Method::POST,
            "/api/cases",
            Some(&intruder),
            Some(json!({
                "title": "دعوى", "type": "مدني", "court": "محكمة القاهرة",
                "client_id": client_id
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(error_code(&body), "FORBIDDEN");

    // naming another owner is refused outright
    let (status, _) = app
        .call(
            Method::POST,
            "/api/clients",
            Some(&owner),
            Some(json!({ "name": "x", "type": "individual", "lawyer_id": intruder_id })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_sees_all_tenants_and_must_name_owner() {
    let app = spawn_app(|_| {}).await;
    let lawyer = app.lawyer_token().await;
    let (other, other_id) = app.register_lawyer("second@example.com").await;
    let admin = app.admin_token().await;

    app.create_client(&lawyer, "أ").await;
    app.create_client(&other, "ب").await;

    let (status, all) = app.call(Method::GET, "/api/clients", Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all.as_array().unwrap().len(), 2);

    let (status, body) = app
        .call(
            Method::POST,
            "/api/clients",
            Some(&admin),
            Some(json!({ "name": "ج", "type": "company" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION");

    let (status, body) = app
        .call(
            Method::POST,
            "/api/clients",
            Some(&admin),
            Some(json!({ "name": "ج", "type": "company", "lawyer_id": other_id })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["lawyer_id"], other_id.as_str());
}

#[tokio::test]
async fn cases_are_numbered_per_year_and_chat_is_scoped() {
    let app = spawn_app(|_| {}).await;
    let token = app.lawyer_token().await;
    let year = Utc::now().year();

    let mut numbers = Vec::new();
    for title in ["نزاع إيجار", "تعويض"] {
        let (status, case) = app
            .call(
                Method::POST,
                "/api/cases",
                Some(&token),
                Some(json!({ "title": title, "type": "مدني", "court": "محكمة الجيزة" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{case}");
        assert_eq!(case["status"], "open");
        numbers.push(case["number"].as_str().unwrap().to_string());
    }
    assert_eq!(numbers, vec![format!("CASE-{year}-001"), format!("CASE-{year}-002")]);

    let (_, cases) = app
        .call(
            Method::GET,
            &format!("/api/cases?search={}", encode("إيجار")),
            Some(&token),
            None,
        )
        .await;
    let case_id = cases[0]["id"].as_str().unwrap().to_string();

    let (status, msg) = app
        .call(
            Method::POST,
            &format!("/api/cases/{case_id}/chat"),
            Some(&token),
            Some(json!({ "message": "موعد الجلسة القادمة؟" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(msg["sender"], "user");

    let (status, chat) = app
        .call(Method::GET, &format!("/api/cases/{case_id}/chat"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chat.as_array().unwrap().len(), 1);

    let (intruder, _) = app.register_lawyer("peek@example.com").await;
    let (status, _) = app
        .call(Method::GET, &format!("/api/cases/{case_id}/chat"), Some(&intruder), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, closed) = app
        .call(
            Method::PUT,
            &format!("/api/cases/{case_id}"),
            Some(&token),
            Some(json!({ "status": "closed" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["status"], "closed");
    assert_ne!(closed["updated_at"], closed["created_at"]);
}

#[tokio::test]
async fn appointments_and_documents_round_trip() {
    let app = spawn_app(|_| {}).await;
    let token = app.lawyer_token().await;
    let client = app.create_client(&token, "منى حسن").await;

    let soon = Utc::now() + Duration::days(2);
    let later = Utc::now() + Duration::days(10);
    for (title, date) in [("جلسة", later), ("اجتماع", soon)] {
        let (status, _) = app
            .call(
                Method::POST,
                "/api/appointments",
                Some(&token),
                Some(json!({
                    "title": title, "type": "court", "date": date,
                    "client_id": client["id"]
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (_, listed) = app.call(Method::GET, "/api/appointments", Some(&token), None).await;
    let titles: Vec<&str> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["اجتماع", "جلسة"]);

    let (status, doc) = app
        .call(
            Method::POST,
            "/api/documents",
            Some(&token),
            Some(json!({
                "title": "توكيل",
                "type": "contract",
                "content": "أوكل أنا {{client}} الأستاذ {{lawyer}}",
                "variables": { "client": "منى حسن", "lawyer": "محامي النظام" }
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(doc["status"], "draft");
    assert_eq!(doc["content"], "أوكل أنا منى حسن الأستاذ محامي النظام");

    let doc_id = doc["id"].as_str().unwrap();
    let (status, finalized) = app
        .call(
            Method::PUT,
            &format!("/api/documents/{doc_id}"),
            Some(&token),
            Some(json!({ "status": "final" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(finalized["status"], "final");

    let (_, finals) = app
        .call(Method::GET, "/api/documents?status=final", Some(&token), None)
        .await;
    assert_eq!(finals.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn deleting_a_client_cascades_to_its_cases() {
    let app = spawn_app(|_| {}).await;
    let token = app.lawyer_token().await;
    let client = app.create_client(&token, "عميل").await;
    let (status, case) = app
        .call(
            Method::POST,
            "/api/cases",
            Some(&token),
            Some(json!({ "title": "قضية", "type": "جنائي", "court": "جنايات", "client_id": client["id"] })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let client_id = client["id"].as_str().unwrap();
    app.call(Method::DELETE, &format!("/api/clients/{client_id}"), Some(&token), None)
        .await;

    let case_id = case["id"].as_str().unwrap();
    let (status, _) = app
        .call(Method::GET, &format!("/api/cases/{case_id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn appointments_filter_by_date_range() {
    let app = spawn_app(|_| {}).await;
    let token = app.lawyer_token().await;

    let now = Utc::now();
    for (title, days) in [("بعد شهر", 30), ("بعد يومين", 2), ("بعد عشرة أيام", 10)] {
        let (status, _) = app
            .call(
                Method::POST,
                "/api/appointments",
                Some(&token),
                Some(json!({ "title": title, "type": "meeting", "date": now + Duration::days(days) })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let titles = |listed: &Value| -> Vec<String> {
        listed
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["title"].as_str().unwrap().to_string())
            .collect()
    };

    let from = encode(&(now + Duration::days(5)).to_rfc3339());
    let to = encode(&(now + Duration::days(20)).to_rfc3339());
    let (status, window) = app
        .call(
            Method::GET,
            &format!("/api/appointments?from={from}&to={to}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&window), vec!["بعد عشرة أيام"]);

    let (_, upcoming) = app
        .call(
            Method::GET,
            &format!("/api/appointments?from={from}"),
            Some(&token),
            None,
        )
        .await;
    assert_eq!(titles(&upcoming), vec!["بعد عشرة أيام", "بعد شهر"]);

    let (status, body) = app
        .call(Method::GET, "/api/appointments?from=tomorrow", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&body), "VALIDATION");
}

#[tokio::test]
async fn explicit_null_clears_optional_fields() {
    let app = spawn_app(|_| {}).await;
    let token = app.lawyer_token().await;
    let client = app.create_client(&token, "سامي فؤاد").await;

    let (status, case) = app
        .call(
            Method::POST,
            "/api/cases",
            Some(&token),
            Some(json!({
                "title": "نزاع تجاري", "type": "تجاري", "court": "محكمة القاهرة الاقتصادية",
                "description": "مطالبة بمستحقات", "client_id": client["id"]
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let case_uri = format!("/api/cases/{}", case["id"].as_str().unwrap());

    let (status, untouched) = app
        .call(Method::PUT, &case_uri, Some(&token), Some(json!({ "status": "in_progress" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(untouched["description"], "مطالبة بمستحقات");
    assert_eq!(untouched["client_id"], client["id"]);

    let (status, cleared) = app
        .call(
            Method::PUT,
            &case_uri,
            Some(&token),
            Some(json!({ "description": null, "client_id": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(cleared["description"].is_null());
    assert!(cleared["client_id"].is_null());
    assert_eq!(cleared["status"], "in_progress");

    let admin = app.admin_token().await;
    let (status, reply) = app
        .call(
            Method::POST,
            "/api/predefined-responses",
            Some(&admin),
            Some(json!({ "response": "رد مؤقت", "valid_until": "2030-01-01T00:00:00Z" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, permanent) = app
        .call(
            Method::PUT,
            &format!("/api/predefined-responses/{}", reply["id"].as_str().unwrap()),
            Some(&admin),
            Some(json!({ "valid_until": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(permanent["valid_until"].is_null());
    assert_eq!(permanent["response"], "رد مؤقت");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_case_creation_gets_distinct_numbers() {
    let (database_url, path) = temp_database_url("numbering");
    let app = Arc::new(spawn_app_at(&database_url, |_| {}).await);
    let token = app.lawyer_token().await;

    let mut tasks = JoinSet::new();
    for i in 0..8 {
        let app = Arc::clone(&app);
        let token = token.clone();
        tasks.spawn(async move {
            app.call(
                Method::POST,
                "/api/cases",
                Some(&token),
                Some(json!({ "title": format!("قضية {i}"), "type": "مدني", "court": "محكمة الجيزة" })),
            )
            .await
        });
    }

    let mut numbers = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        let (status, case) = joined.expect("task panicked");
        assert_eq!(status, StatusCode::CREATED, "{case}");
        numbers.push(case["number"].as_str().unwrap().to_string());
    }
    numbers.sort();
    let year = Utc::now().year();
    let expected: Vec<String> = (1..=8).map(|n| format!("CASE-{year}-{n:03}")).collect();
    assert_eq!(numbers, expected);

    let _ = std::fs::remove_file(&path);
}
