pub mod catalog;
pub mod device;
pub mod social;
pub mod user;
pub mod user_task;

pub use catalog::*;
pub use device::*;
pub use social::*;
pub use user::*;
pub use user_task::*;
