mod exit;

pub use self::exit::*;
