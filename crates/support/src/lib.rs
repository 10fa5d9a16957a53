pub mod constants;
pub mod fs;
pub mod net;
pub mod process;
