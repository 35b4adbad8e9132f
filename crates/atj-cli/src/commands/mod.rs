pub mod build;
pub mod params;
pub mod solve;
pub mod sweep;
pub mod validate;
