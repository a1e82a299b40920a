pub mod job_statuses;
pub mod order_statuses;
pub mod payment_statuses;
