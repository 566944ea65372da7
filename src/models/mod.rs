pub mod app;
pub mod requests;

pub use app::*;
pub use requests::*;
