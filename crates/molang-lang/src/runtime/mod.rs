pub mod animation;
pub mod context;
pub mod interpreter;
pub mod value;
