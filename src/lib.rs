//! Execution core of the Forthic stack language: a hand written tokenizer and an interpreter that
//! compiles and runs whitespace separated words against a shared value stack.
//!
//! Hosts create a [`ForthicInterpreter`], register their own native words and modules, and then
//! run program text against it.

/// Crate internal logging hooks.  These must be declared first so that the macros are visible to
/// the rest of the crate.
#[macro_use]
mod logging;

/// Module for managing source locations and the turning of source text into tokens.
#[macro_use]
pub mod lang;

/// Module for the runtime, the data structures used by the interpreter, and the interpreter
/// itself.
#[macro_use]
pub mod runtime;

pub use logging::init_logging;

pub use lang::{
    source_buffer::CodeLocation,
    tokenizing::{Token, TokenType, Tokenizer},
};
pub use runtime::{
    built_ins::register_core_words,
    config::InterpreterConfig,
    data_structures::{value::Value, variable::Variable, word_options::WordOptions},
    error::{ErrorKind, Result, ScriptError},
    interpreter::{
        CodeManagement, Interpreter, InterpreterStack, ModuleManagement, ModuleSpec,
        WordManagement, forthic_interpreter::ForthicInterpreter,
    },
    module::{Module, ModulePtr},
    word::{RuntimeInfo, Word, WordPtr},
};
