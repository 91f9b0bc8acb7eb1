pub mod logger;
pub mod x3f;
