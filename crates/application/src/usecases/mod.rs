pub mod auth;
pub mod cart;
pub mod checkout;
pub mod email_dispatch;
pub mod maintenance;
pub mod movies;
pub mod payment_webhook;
