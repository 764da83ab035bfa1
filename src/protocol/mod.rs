pub mod emit;
pub mod escape;
pub mod parse;
pub mod types;
