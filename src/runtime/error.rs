use std::{ error::Error,
           fmt::{ self, Debug, Display, Formatter } };
use crate::{ runtime::interpreter::CallStack,
             lang::source_buffer::CodeLocation };

use super::interpreter::Interpreter;



pub type Result<T> = std::result::Result<T, ScriptError>;



/// The typed conditions a Forthic program can fail with.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum ErrorKind
{
    /// The name was not found in any module in scope and no literal handler accepted it.
    #[error("Unknown word: {0}")]
    UnknownWord(String),

    /// The module was never registered with the interpreter.
    #[error("Unknown module: {0}")]
    UnknownModule(String),

    #[error("Stack underflow.")]
    StackUnderflow,

    /// A native word's handler failed.  The failure is kept as the error's cause.
    #[error("Error while executing word {0}.")]
    WordExecution(String),

    /// A definition was still open at the end of input or when another definition started.
    #[error("Definition {0} is missing its closing semicolon.")]
    MissingSemicolon(String),

    #[error("Found a semicolon without an open definition.")]
    ExtraSemicolon,

    #[error("Module {module}: {message}")]
    Module { module: String, message: String },

    /// Names starting with a double underscore are reserved.
    #[error("Invalid variable name {0}, names starting with __ are reserved.")]
    InvalidVariableName(String),

    /// Raised on purpose, (by debugging words for example,) to halt the program.
    #[error("Intentional stop: {0}")]
    IntentionalStop(String),

    #[error("{0}")]
    Lexical(String),

    #[error("Invalid word options: {0}")]
    InvalidOptions(String),

    #[error("{0}")]
    Script(String)
}



/// Any error that occurs during the tokenizing or execution of a Forthic program.
#[derive(Clone)]
pub struct ScriptError
{
    /// What went wrong.
    kind: ErrorKind,

    /// The location in the source code the error occurred, if available.
    location: Option<CodeLocation>,

    /// The source text of the definition that was executing, if available.
    source_text: Option<String>,

    /// The error that caused this one, if any.
    cause: Option<Box<ScriptError>>,

    /// The script's call stack at the time of the error, if available.
    call_stack: Option<CallStack>
}


impl Error for ScriptError
{
    fn source(&self) -> Option<&(dyn Error + 'static)>
    {
        self.cause.as_deref().map(|cause| cause as &(dyn Error + 'static))
    }
}


/// Pretty print the ScriptError for debugging the error that occurred within the Forthic program.
impl Display for ScriptError
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        match &self.location
        {
            Some(location) => write!(f, "{}: {}", location, self.kind)?,
            None => write!(f, "{}", self.kind)?
        }

        if let Some(source_text) = &self.source_text
        {
            write!(f, "\n  in: {}", source_text)?;
        }

        if let Some(cause) = &self.cause
        {
            write!(f, "\nCaused by: {}", cause)?;
        }

        if let Some(call_stack) = &self.call_stack
            && !call_stack.is_empty()
        {
            write!(f, "\n\nCall stack\n")?;

            for item in call_stack.iter().rev()
            {
                writeln!(f, "  {}", item)?;
            }
        }

        Ok(())
    }
}


impl Debug for ScriptError
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        write!(f, "{}", self)
    }
}


impl ScriptError
{
    /// Create a new ScriptError.
    pub fn new(kind: ErrorKind,
               location: Option<CodeLocation>,
               call_stack: Option<CallStack>) -> ScriptError
    {
        ScriptError
            {
                kind,
                location,
                source_text: None,
                cause: None,
                call_stack
            }
    }

    /// Create a new Script Error and wrap it in a Result::Err.
    pub fn new_as_result<T>(kind: ErrorKind,
                            location: Option<CodeLocation>,
                            call_stack: Option<CallStack>) -> Result<T>
    {
        Err(ScriptError::new(kind, location, call_stack))
    }

    /// Wrap the failure of a native word, keeping the original error as the cause.
    pub fn word_execution(word_name: &str,
                          location: Option<CodeLocation>,
                          cause: ScriptError) -> ScriptError
    {
        let call_stack = cause.call_stack.clone();

        ScriptError::new(ErrorKind::WordExecution(word_name.to_string()), location, call_stack)
            .with_cause(cause)
    }

    pub fn with_cause(mut self, cause: ScriptError) -> ScriptError
    {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Attach the source of the enclosing definition, unless one is already known.
    pub fn with_source_text_if_missing(mut self, source_text: &str) -> ScriptError
    {
        if self.source_text.is_none()
        {
            self.source_text = Some(source_text.to_string());
        }

        self
    }

    pub fn kind(&self) -> &ErrorKind
    {
        &self.kind
    }

    /// If available, the location in the source code the error occurred.
    pub fn location(&self) -> &Option<CodeLocation>
    {
        &self.location
    }

    pub fn source_text(&self) -> &Option<String>
    {
        &self.source_text
    }

    pub fn cause(&self) -> Option<&ScriptError>
    {
        self.cause.as_deref()
    }

    /// Follow the chain of causes to the original failure.
    pub fn root_cause(&self) -> &ScriptError
    {
        let mut current = self;

        while let Some(cause) = current.cause()
        {
            current = cause;
        }

        current
    }

    /// If available, the script's call stack at the time of the error.
    pub fn call_stack(&self) -> &Option<CallStack>
    {
        &self.call_stack
    }

    pub fn is_intentional_stop(&self) -> bool
    {
        matches!(self.kind, ErrorKind::IntentionalStop(_))
    }
}



/// Create an error of the given kind at the interpreter's current location and call stack.
pub fn interpreter_error<T>(interpreter: &dyn Interpreter, kind: ErrorKind) -> Result<T>
{
    let location = interpreter.current_location().clone();
    let call_stack = interpreter.call_stack().clone();

    ScriptError::new_as_result(kind, location, Some(call_stack))
}



/// A convenience function for creating a ScriptError and wrapping in in a Result::Err using the
/// interpreter's current location and call stack.
pub fn script_error<T>(interpreter: &dyn Interpreter, message: String) -> Result<T>
{
    interpreter_error(interpreter, ErrorKind::Script(message))
}



pub fn script_error_str<T>(interpreter: &dyn Interpreter, message: &str) -> Result<T>
{
    script_error(interpreter, message.to_string())
}



#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn root_cause_follows_the_chain()
    {
        let inner = ScriptError::new(ErrorKind::StackUnderflow, None, None);
        let outer = ScriptError::word_execution("+", None, inner);

        assert_eq!(outer.kind(), &ErrorKind::WordExecution("+".to_string()));
        assert_eq!(outer.root_cause().kind(), &ErrorKind::StackUnderflow);
    }

    #[test]
    fn display_includes_location_source_and_cause()
    {
        let location = CodeLocation::new(Some("test".to_string()), 2, 4, 10);
        let inner = ScriptError::new(ErrorKind::StackUnderflow, None, None);
        let error = ScriptError::word_execution("POP", Some(location), inner)
            .with_source_text_if_missing(": X POP ;")
            .with_source_text_if_missing(": Y X ;");

        let text = error.to_string();

        assert!(text.starts_with("test (2, 4): Error while executing word POP."));
        assert!(text.contains("in: : X POP ;"));
        assert!(text.contains("Caused by: Stack underflow."));
        assert!(!text.contains(": Y X ;"));
    }
}
