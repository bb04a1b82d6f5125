pub mod assembler;
pub mod augment;
pub mod dependency;
pub mod executor;
pub mod synthesizer;
