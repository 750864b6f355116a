mod catalog;
mod entry;
mod money;
mod order;
mod user;

pub use catalog::*;
pub use entry::*;
pub use money::*;
pub use order::*;
pub use user::*;
