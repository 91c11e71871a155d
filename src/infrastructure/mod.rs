pub mod constants;
pub mod kubernetes;
pub mod source;
