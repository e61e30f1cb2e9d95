pub mod close_once;
pub mod shutdown;
pub mod ticker;
