pub mod clients;
pub mod document;
pub mod results;
