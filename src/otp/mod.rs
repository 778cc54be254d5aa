mod errors;
mod generator;
mod manager;
mod models;
mod store;

pub use errors::OtpError;
pub use generator::{OtpGenerator, RandomOtpGenerator};
pub use manager::OtpManager;
pub use models::{IssuedOtp, OtpRecord, OtpVerification};
pub use store::OtpStore;
