pub mod auth;
pub mod crop;
pub mod pricing;
pub mod server;
