use serde_json::{json, Value};

use crate::helpers::{spawn_app, REGISTERED_EMAIL};

#[actix_web::test]
async fn registered_email_opens_capturing_session() {
    let app = spawn_app().await;

    let response = app.submit_email(" A@X.com ").await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["stage"], "liveness_capturing");
    assert_eq!(body["data"]["email"], REGISTERED_EMAIL);
    assert_eq!(body["data"]["capture"]["threshold"], 76.0);
    assert_eq!(body["data"]["capture"]["pollIntervalMs"], 150);
    assert_eq!(body["data"]["capture"]["maxSamples"], 400);
}

#[actix_web::test]
async fn unknown_email_returns_404() {
    let app = spawn_app().await;

    let response = app.submit_email("b@y.com").await;

    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "404");
    assert_eq!(app.session_stage("b@y.com").await, Value::Null);
}

#[actix_web::test]
async fn malformed_bodies_return_400_envelope() {
    let app = spawn_app().await;
    let test_cases = vec![
        (json!({}), "missing email"),
        (json!({ "email": "" }), "empty email"),
        (json!({ "email": "not-an-email" }), "invalid email"),
    ];

    for (body, description) in test_cases {
        let response = app.post_json("/verification/email", &body).await;
        assert_eq!(
            response.status().as_u16(),
            400,
            "The API did not fail with 400 Bad Request when the payload was {}.",
            description
        );
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
    }
}

#[actix_web::test]
async fn frames_below_threshold_keep_capturing_until_one_crosses() {
    let app = spawn_app().await;
    app.submit_email(REGISTERED_EMAIL).await;

    for score in [20, 45, 70] {
        let body: Value = app
            .send_frame(REGISTERED_EMAIL, score)
            .await
            .json()
            .await
            .unwrap();
        assert_eq!(body["data"]["captured"], false);
        assert_eq!(body["data"]["session"]["stage"], "liveness_capturing");
    }
    let body: Value = app
        .send_frame(REGISTERED_EMAIL, 92)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["captured"], true);
    assert_eq!(body["data"]["session"]["stage"], "liveness_passed");

    let late = app.send_frame(REGISTERED_EMAIL, 99).await;
    assert_eq!(late.status().as_u16(), 409);
}

#[actix_web::test]
async fn undecodable_frame_is_rejected() {
    let app = spawn_app().await;
    app.submit_email(REGISTERED_EMAIL).await;

    let response = app
        .post_json(
            "/verification/liveness/frame",
            &json!({ "email": REGISTERED_EMAIL, "frame": "***" }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 400);
}

#[actix_web::test]
async fn failed_liveness_can_be_retried() {
    let app = spawn_app().await;
    app.liveness.set_passing(false);
    app.submit_email(REGISTERED_EMAIL).await;

    let body: Value = app
        .send_frame(REGISTERED_EMAIL, 90)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["session"]["stage"], "liveness_failed");
    assert_eq!(app.request_otp(REGISTERED_EMAIL).await.status().as_u16(), 409);

    let retry = app
        .post_json(
            "/verification/liveness/retry",
            &json!({ "email": REGISTERED_EMAIL }),
        )
        .await;
    assert_eq!(retry.status().as_u16(), 200);
    app.liveness.set_passing(true);
    let body: Value = app
        .send_frame(REGISTERED_EMAIL, 90)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["data"]["session"]["stage"], "liveness_passed");
}

#[actix_web::test]
async fn otp_cannot_be_sent_before_liveness() {
    let app = spawn_app().await;
    app.submit_email(REGISTERED_EMAIL).await;

    let response = app.request_otp(REGISTERED_EMAIL).await;

    assert_eq!(response.status().as_u16(), 409);
    assert!(app.email_client.last_code().is_none());
}

#[actix_web::test]
async fn full_flow_reaches_otp_verified() {
    let app = spawn_app().await;
    app.submit_email(REGISTERED_EMAIL).await;
    app.send_frame(REGISTERED_EMAIL, 92).await;

    let response = app.request_otp(REGISTERED_EMAIL).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["session"]["stage"], "otp_pending");

    let code = app.email_client.last_code().unwrap();
    let response = app.verify_otp(REGISTERED_EMAIL, &code).await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["stage"], "otp_verified");
    assert_eq!(body["data"]["otpVerified"], true);
}

#[actix_web::test]
async fn wrong_otp_is_success_false_and_fails_session() {
    let app = spawn_app().await;
    app.submit_email(REGISTERED_EMAIL).await;
    app.send_frame(REGISTERED_EMAIL, 92).await;
    app.request_otp(REGISTERED_EMAIL).await;
    let code = app.email_client.last_code().unwrap();
    let wrong = if code == "123456" { "654321" } else { "123456" };

    let response = app.verify_otp(REGISTERED_EMAIL, wrong).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(app.session_stage(REGISTERED_EMAIL).await, "otp_failed");
}

#[actix_web::test]
async fn verify_without_issued_code_is_success_false() {
    let app = spawn_app().await;

    let response = app.verify_otp("b@y.com", "000000").await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(app.session_stage("b@y.com").await, Value::Null);
}

#[actix_web::test]
async fn retyping_code_after_wrong_guess_is_success_false() {
    let app = spawn_app().await;
    app.submit_email(REGISTERED_EMAIL).await;
    app.send_frame(REGISTERED_EMAIL, 92).await;
    app.request_otp(REGISTERED_EMAIL).await;
    let code = app.email_client.last_code().unwrap();
    let wrong = if code == "123456" { "654321" } else { "123456" };
    app.verify_otp(REGISTERED_EMAIL, wrong).await;

    let response = app.verify_otp(REGISTERED_EMAIL, &code).await;

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(app.session_stage(REGISTERED_EMAIL).await, "otp_failed");
}

#[actix_web::test]
async fn non_numeric_otp_returns_400() {
    let app = spawn_app().await;
    app.submit_email(REGISTERED_EMAIL).await;
    app.send_frame(REGISTERED_EMAIL, 92).await;
    app.request_otp(REGISTERED_EMAIL).await;

    let response = app.verify_otp(REGISTERED_EMAIL, "12ab56").await;

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(app.session_stage(REGISTERED_EMAIL).await, "otp_pending");
}

#[actix_web::test]
async fn delivery_failure_returns_500_and_keeps_stage() {
    let app = spawn_app().await;
    app.submit_email(REGISTERED_EMAIL).await;
    app.send_frame(REGISTERED_EMAIL, 92).await;
    app.email_client.set_failing(true);

    let response = app.request_otp(REGISTERED_EMAIL).await;

    assert_eq!(response.status().as_u16(), 500);
    assert_eq!(app.session_stage(REGISTERED_EMAIL).await, "liveness_passed");

    app.email_client.set_failing(false);
    assert_eq!(app.request_otp(REGISTERED_EMAIL).await.status().as_u16(), 200);
}

#[actix_web::test]
async fn resend_delivers_the_same_code() {
    let app = spawn_app().await;
    app.submit_email(REGISTERED_EMAIL).await;
    app.send_frame(REGISTERED_EMAIL, 92).await;
    app.request_otp(REGISTERED_EMAIL).await;
    let first = app.email_client.last_code().unwrap();

    let response = app
        .post_json(
            "/verification/otp/resend",
            &json!({ "email": REGISTERED_EMAIL }),
        )
        .await;

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(app.email_client.last_code().unwrap(), first);
}

#[actix_web::test]
async fn session_endpoint_reports_missing_session() {
    let app = spawn_app().await;

    let response = app
        .api_client
        .get(format!("{}/verification/session", app.address))
        .query(&[("email", "c@z.com")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"], Value::Null);
}
