pub mod common;
pub mod content;
pub mod course;
pub mod user;

pub use common::*;
pub use content::*;
pub use course::*;
pub use user::*;
