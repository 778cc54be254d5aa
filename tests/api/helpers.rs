use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use kyc_verification_gate::{
    account_client::StaticAccountDirectory,
    clock::SystemClock,
    configuration::get_configuration,
    document_store::InMemoryDocumentStore,
    domain::EmailObject,
    email_client::GenericEmailService,
    liveness_client::{Frame, LivenessService, LivenessVerdict, VerdictOutcome},
    otp::RandomOtpGenerator,
    startup::{AppServices, Application},
    telemetry::{get_subscriber, init_subscriber},
};
use once_cell::sync::Lazy;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    let test_log = std::env::var("TEST_LOG")
        .map(|value| value == "true")
        .unwrap_or(false);
    if test_log {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub const REGISTERED_EMAIL: &str = "a@x.com";

#[derive(Debug, Default)]
pub struct CapturingEmailClient {
    bodies: Mutex<Vec<String>>,
    fail: AtomicBool,
}

impl CapturingEmailClient {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn last_code(&self) -> Option<String> {
        let bodies = self.bodies.lock().unwrap();
        bodies.last().and_then(|body| {
            body.split(|c: char| !c.is_ascii_digit())
                .find(|chunk| chunk.len() == 6)
                .map(str::to_string)
        })
    }
}

#[async_trait]
impl GenericEmailService for CapturingEmailClient {
    async fn send_text_email(
        &self,
        _to: &str,
        _subject: &str,
        body: String,
    ) -> Result<(), anyhow::Error> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("SMTP relay unavailable"));
        }
        self.bodies.lock().unwrap().push(body);
        Ok(())
    }
}

/// Frames are the ASCII text of their own score.
#[derive(Debug)]
pub struct FakeLiveness {
    pass: AtomicBool,
}

impl FakeLiveness {
    pub fn set_passing(&self, pass: bool) {
        self.pass.store(pass, Ordering::SeqCst);
    }
}

#[async_trait]
impl LivenessService for FakeLiveness {
    async fn score_frame(&self, _email: &EmailObject, frame: &Frame) -> Result<f64, anyhow::Error> {
        Ok(std::str::from_utf8(frame.as_bytes())?.parse()?)
    }

    async fn verify_still(
        &self,
        _email: &EmailObject,
        _frame: &Frame,
    ) -> Result<LivenessVerdict, anyhow::Error> {
        let outcome = if self.pass.load(Ordering::SeqCst) {
            VerdictOutcome::Success
        } else {
            VerdictOutcome::Failure
        };
        Ok(LivenessVerdict {
            outcome,
            message: "Face does not match.".to_string(),
        })
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub api_client: reqwest::Client,
    pub email_client: Arc<CapturingEmailClient>,
    pub liveness: Arc<FakeLiveness>,
}

impl TestApp {
    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.api_client
            .post(format!("{}{}", self.address, path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn submit_email(&self, email: &str) -> reqwest::Response {
        self.post_json("/verification/email", &serde_json::json!({ "email": email }))
            .await
    }

    pub async fn send_frame(&self, email: &str, score: u32) -> reqwest::Response {
        let frame = BASE64.encode(score.to_string());
        self.post_json(
            "/verification/liveness/frame",
            &serde_json::json!({ "email": email, "frame": frame }),
        )
        .await
    }

    pub async fn request_otp(&self, email: &str) -> reqwest::Response {
        self.post_json("/verification/otp/send", &serde_json::json!({ "email": email }))
            .await
    }

    pub async fn verify_otp(&self, email: &str, code: &str) -> reqwest::Response {
        self.post_json(
            "/verification/otp/verify",
            &serde_json::json!({ "email": email, "code": code }),
        )
        .await
    }

    pub async fn submit_document(&self, email: &str, content_type: &str) -> reqwest::Response {
        self.post_json(
            "/document/submit",
            &serde_json::json!({
                "email": email,
                "contentType": content_type,
                "document": BASE64.encode(b"%PDF-1.7 signed form"),
            }),
        )
        .await
    }

    pub async fn session_stage(&self, email: &str) -> Value {
        let body: Value = self
            .api_client
            .get(format!("{}/verification/session", self.address))
            .query(&[("email", email)])
            .send()
            .await
            .expect("Failed to execute request.")
            .json()
            .await
            .expect("Session response is not JSON");
        body["data"]["stage"].clone()
    }

    /// Walks a registered email through liveness and OTP verification.
    pub async fn verify_fully(&self, email: &str) {
        assert!(self.submit_email(email).await.status().is_success());
        assert!(self.send_frame(email, 92).await.status().is_success());
        assert!(self.request_otp(email).await.status().is_success());
        let code = self.email_client.last_code().expect("No OTP was mailed");
        let response = self.verify_otp(email, &code).await;
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
    }
}

pub async fn spawn_app() -> TestApp {
    Lazy::force(&TRACING);

    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        c.application.port = 0;
        c.application.workers = 1;
        c
    };
    let email_client = Arc::new(CapturingEmailClient::default());
    let liveness = Arc::new(FakeLiveness {
        pass: AtomicBool::new(true),
    });
    let registered = EmailObject::parse(REGISTERED_EMAIL.to_string()).unwrap();
    let services = AppServices {
        email_client: email_client.clone(),
        account_directory: Arc::new(StaticAccountDirectory::new([registered])),
        liveness: liveness.clone(),
        documents: Arc::new(InMemoryDocumentStore::new()),
        otp_generator: Arc::new(RandomOtpGenerator),
        clock: Arc::new(SystemClock),
    };
    let application = Application::build_with_services(configuration, services)
        .await
        .expect("Failed to build application.");
    let application_port = application.port();

    let address = format!("http://127.0.0.1:{}", application_port);
    let _ = tokio::spawn(application.run_until_stopped());

    TestApp {
        address,
        port: application_port,
        api_client: reqwest::Client::new(),
        email_client,
        liveness,
    }
}
