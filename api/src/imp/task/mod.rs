mod clone;
mod exit;
mod group;
mod signal;
mod wait;

pub use self::clone::*;
pub use self::exit::*;
pub use self::group::*;
pub use self::signal::*;
pub use self::wait::*;
