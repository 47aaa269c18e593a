/// Module for managing the original source code.
pub mod source_buffer;

/// Module for managing the turning of the source code into a list of tokens for further processing.
pub mod tokenizing;
