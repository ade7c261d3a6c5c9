pub mod jail;
pub mod log;
pub mod unjail;

pub use jail::*;
pub use log::*;
pub use unjail::*;
