pub mod otp;
pub mod session;

pub use otp::{OtpCounts, OtpStore};
pub use session::SessionStore;
