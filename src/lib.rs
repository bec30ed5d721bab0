pub mod hexdump;
pub mod input;
pub mod netflow;
pub mod trace;
