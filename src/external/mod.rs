pub mod sms;
pub mod storage;

pub use sms::*;
pub use storage::*;
