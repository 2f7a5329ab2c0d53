pub mod env;
pub mod interpreter;
pub mod value;
