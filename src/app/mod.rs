pub mod geo;
pub mod patches;
