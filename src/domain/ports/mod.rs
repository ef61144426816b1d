//! Ports: the traits infrastructure adapters implement.

pub mod speech;
pub mod text_generator;

pub use speech::SpeechSynthesizer;
pub use text_generator::TextGenerator;
