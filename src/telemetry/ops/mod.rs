pub mod extract;
pub mod describe;
pub mod parse;
pub mod compare;
