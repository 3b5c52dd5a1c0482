mod config;
mod constants;
mod error;
mod event;
mod status;
mod traits;

pub use config::*;
pub use constants::*;
pub use error::*;
pub use event::*;
pub use status::*;
pub use traits::*;
