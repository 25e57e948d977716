pub mod calculate;
pub mod fields;
pub mod parse;
