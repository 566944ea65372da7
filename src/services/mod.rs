pub mod cache;
pub mod gateway;
pub mod json_repair;
pub mod pipeline;
pub mod rate_limit;
