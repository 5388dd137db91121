pub mod pull;
pub mod reset;
pub mod status;
