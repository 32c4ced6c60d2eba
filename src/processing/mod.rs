//! Text processing: contacts, skills, signals and scoring

pub mod contacts;
pub mod job;
pub mod scoring;
pub mod signals;
pub mod similarity;
pub mod skill_normalizer;
pub mod text_processor;
pub mod vocabulary;
