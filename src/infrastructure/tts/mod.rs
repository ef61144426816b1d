//! Text-to-speech adapters.

pub mod elevenlabs;

pub use elevenlabs::ElevenLabsSynthesizer;
