pub mod carts;
pub mod jobs;
pub mod movies;
pub mod orders;
pub mod payments;
pub mod tokens;
pub mod users;
