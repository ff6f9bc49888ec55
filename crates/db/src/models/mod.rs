pub mod address;
pub mod category;
pub mod document;
pub mod need;
pub mod progress;
pub mod story;
