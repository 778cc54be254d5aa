use rand::Rng;

use crate::constants::{OTP_MAX, OTP_MIN};

pub trait OtpGenerator: Send + Sync + std::fmt::Debug {
    fn generate(&self) -> String;
}

/// Uniform over 100000..=999999, so every code has six significant digits.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomOtpGenerator;

impl OtpGenerator for RandomOtpGenerator {
    fn generate(&self) -> String {
        rand::rng().random_range(OTP_MIN..=OTP_MAX).to_string()
    }
}
