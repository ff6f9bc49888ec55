pub mod documents;
pub mod intake;
