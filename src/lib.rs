// Codemend - generate, run, and repair Python code with a local model
// Library exports

// Core modules
pub mod agent;
pub mod cli;
pub mod config;
pub mod exec;
pub mod ollama;
