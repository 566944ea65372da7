pub mod caption;
pub mod food;
pub mod health;
pub mod health_logs;
pub mod predict;
pub mod recommend;
pub mod train;
pub mod voice;

pub use caption::generate_caption;
pub use food::analyze_food;
pub use health::health_check;
pub use health_logs::analyze_health_logs;
pub use predict::predict;
pub use recommend::recommend_pets;
pub use train::generate_training_plan;
pub use voice::analyze_voice;
