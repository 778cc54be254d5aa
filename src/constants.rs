use lazy_static::lazy_static;
use regex::Regex;

pub const OTP_LENGTH: usize = 6;
pub const OTP_MIN: u32 = 100_000;
pub const OTP_MAX: u32 = 999_999;
pub const ACCEPTED_DOCUMENT_TYPES: [&str; 3] = ["application/pdf", "image/jpeg", "image/png"];
pub const LIVENESS_SCORE_MAX: f64 = 100.0;

lazy_static! {
    pub static ref OTP_PATTERN: Regex =
        Regex::new(r"^[0-9]{6}$").expect("Failed to compile regex pattern");
}
