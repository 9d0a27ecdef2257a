pub mod caller;
pub mod otp;
pub mod payload;
pub mod session;
pub mod stats;
