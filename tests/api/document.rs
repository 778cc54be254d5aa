use serde_json::{json, Value};

use crate::helpers::{spawn_app, REGISTERED_EMAIL};

#[actix_web::test]
async fn document_is_rejected_before_verification() {
    let app = spawn_app().await;
    app.submit_email(REGISTERED_EMAIL).await;
    app.send_frame(REGISTERED_EMAIL, 92).await;

    let response = app
        .submit_document(REGISTERED_EMAIL, "application/pdf")
        .await;

    assert_eq!(response.status().as_u16(), 403);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn verified_session_can_submit_once() {
    let app = spawn_app().await;
    app.verify_fully(REGISTERED_EMAIL).await;

    let response = app
        .submit_document(REGISTERED_EMAIL, "application/pdf")
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["data"]["documentId"].is_string());

    let duplicate = app
        .submit_document(REGISTERED_EMAIL, "application/pdf")
        .await;
    assert_eq!(duplicate.status().as_u16(), 409);
}

#[actix_web::test]
async fn unsupported_content_type_returns_400() {
    let app = spawn_app().await;
    app.verify_fully(REGISTERED_EMAIL).await;

    let response = app.submit_document(REGISTERED_EMAIL, "image/gif").await;

    assert_eq!(response.status().as_u16(), 400);
}

#[actix_web::test]
async fn undecodable_document_returns_400() {
    let app = spawn_app().await;
    app.verify_fully(REGISTERED_EMAIL).await;

    let response = app
        .post_json(
            "/document/submit",
            &json!({
                "email": REGISTERED_EMAIL,
                "contentType": "application/pdf",
                "document": "%%%",
            }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 400);
}
