pub mod clock;
pub mod entropy;
pub mod notifier;
pub mod router_auth;
