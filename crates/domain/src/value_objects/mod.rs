pub mod carts;
pub mod email_jobs;
pub mod enums;
pub mod movies;
pub mod orders;
pub mod payments;
