// file: src/classifier/mod.rs
// description: classifier gateway trait and chat-completions implementation

pub mod gateway;
pub mod schema;

pub use gateway::{ChatClassifier, Classifier, ClassifyRequest};
