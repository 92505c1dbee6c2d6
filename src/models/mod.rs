pub mod call_log;
pub mod call_schedule;
pub mod enums;
pub mod medication;
pub mod patient;

pub use call_log::*;
pub use call_schedule::*;
pub use enums::*;
pub use medication::*;
pub use patient::*;
