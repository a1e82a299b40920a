pub mod cleanup_loop;
pub mod worker_loop;
