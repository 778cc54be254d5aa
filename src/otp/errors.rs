use crate::utils::error_chain_fmt;

#[derive(thiserror::Error)]
pub enum OtpError {
    #[error("Failed to deliver OTP to {email}")]
    Delivery {
        email: String,
        #[source]
        source: anyhow::Error,
    },
}

impl std::fmt::Debug for OtpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}
