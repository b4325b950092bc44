pub mod decision;
pub mod document;
pub mod engine;
pub mod false_positive;
pub mod keywords;
pub mod normalize;
pub mod scorer;
pub mod variants;
