pub mod images;
pub mod text;
pub mod upload;

pub use images::*;
pub use text::*;
pub use upload::*;
