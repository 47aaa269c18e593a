/// The words that drive the engine from script text, variables, modules, options and evaluation.
pub mod core_words;

pub use core_words::register_core_words;
