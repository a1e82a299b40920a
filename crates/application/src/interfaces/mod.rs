pub mod mail;
pub mod stripe;
