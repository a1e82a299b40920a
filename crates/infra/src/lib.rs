pub mod email;
pub mod observability;
pub mod payments;
pub mod postgres;
