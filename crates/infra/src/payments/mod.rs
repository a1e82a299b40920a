pub mod stripe_client;
