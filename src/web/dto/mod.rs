pub mod certificates;
pub mod exam;
pub mod progress;
pub mod slides;
