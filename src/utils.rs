use actix_web::dev::{Payload, ServiceRequest};
use actix_web::web;
use std::sync::Arc;

use crate::account_client::{AccountDirectory, HttpAccountDirectory, StaticAccountDirectory};
use crate::configuration::{
    AccountDirectoryKind, AccountDirectorySettings, EmailClientKind, EmailClientSettings,
};
use crate::domain::EmailObject;
use crate::email_client::{DummyEmailClient, GenericEmailService, SmtpEmailClient};

pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

pub fn create_email_client(
    email_config: &EmailClientSettings,
) -> Result<Arc<dyn GenericEmailService>, anyhow::Error> {
    let client: Arc<dyn GenericEmailService> = match email_config.kind {
        EmailClientKind::Smtp => Arc::new(SmtpEmailClient::new(email_config)?),
        EmailClientKind::Dummy => Arc::new(DummyEmailClient::new()),
    };
    Ok(client)
}

pub fn create_account_directory(
    directory_config: &AccountDirectorySettings,
) -> Result<Arc<dyn AccountDirectory>, anyhow::Error> {
    let directory: Arc<dyn AccountDirectory> = match directory_config.kind {
        AccountDirectoryKind::Http => Arc::new(HttpAccountDirectory::new(
            directory_config.base_url.clone(),
            directory_config.timeout(),
        )?),
        AccountDirectoryKind::Static => {
            let emails = directory_config
                .registered_emails
                .iter()
                .map(|email| EmailObject::parse(email.clone()).map_err(anyhow::Error::msg))
                .collect::<Result<Vec<_>, _>>()?;
            Arc::new(StaticAccountDirectory::new(emails))
        }
    };
    Ok(directory)
}

#[tracing::instrument(name = "Get header value", skip(req))]
pub fn get_header_value(req: &ServiceRequest, header_name: &str) -> Option<String> {
    req.headers()
        .get(header_name)
        .and_then(|h| h.to_str().ok())
        .map(|h| h.to_string())
}

pub fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = actix_http::h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
