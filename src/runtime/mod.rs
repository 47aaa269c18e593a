/// All of the core data structures used by the Forthic interpreter.
pub mod data_structures;

/// Module for defining the built-in native words that are available to the Forthic interpreter.
pub mod built_ins;

/// Settings that change how the interpreter reads it's input.
pub mod config;

/// Module for defining the error reporting of the Forthic interpreter.
pub mod error;

/// Module for defining the core functionality of the Forthic interpreter.  This includes tools for
/// managing and examining the interpreter's state.
pub mod interpreter;

/// Namespaces of words and variables.
pub mod module;

/// The unit of execution, in all of it's variants.
pub mod word;
