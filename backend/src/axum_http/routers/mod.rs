pub mod accounts;
pub mod cart;
pub mod movies;
pub mod orders;
pub mod stripe_webhook;
