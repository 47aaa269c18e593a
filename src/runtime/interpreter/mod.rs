use crate::{
    lang::source_buffer::CodeLocation,
    runtime::{
        config::InterpreterConfig,
        data_structures::{
            value::Value, value_hash::ValueHashPtr, value_stack::ValueStack,
            value_vec::ValueVecPtr, variable::VariablePtr, word_options::WordOptionsPtr,
        },
        error,
        interpreter::literals::LiteralHandler,
        module::ModulePtr,
        word::WordPtr,
    },
};
use std::{
    fmt::{self, Display, Formatter},
    rc::Rc,
};

pub mod forthic_interpreter;
pub mod literals;

/// A call stack item is a record of the executing word's name and the location within the
/// original source code from which it was found.  This items are read-only and the fields are
/// accessed by member functions.
#[derive(Clone, Debug, PartialEq)]
pub struct CallItem {
    location: CodeLocation,
    word: String,
}

impl CallItem {
    /// Create a new call stack item.
    pub fn new(word: String, location: CodeLocation) -> CallItem {
        CallItem { location, word }
    }

    /// Where in the source code was the execution of this word found?
    pub fn location(&self) -> &CodeLocation {
        &self.location
    }

    // The name of the word being executed.
    pub fn word(&self) -> &String {
        &self.word
    }
}

/// Make sure that this word can be nicely displayed to the user in event of an error.
impl Display for CallItem {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.word)
    }
}

/// Type to represent a call stack.  This is a stack of call items currently being executed by the
/// interpreter.  This is used to help track errors and provide a scripts stack trace to the user.
pub type CallStack = Vec<CallItem>;

/// Definition of a word handler function.  This is the function that is called when a native word
/// is to be executed.  Can be a lambda, a callable object or a Rust function.
pub type WordHandler = dyn Fn(&mut dyn Interpreter) -> error::Result<()>;

/// Which registered module to import and under what prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModuleSpec {
    /// Import the module prefixed by it's own name.
    Name(String),

    /// Import the module with an explicit prefix.  An empty prefix merges the module's exported
    /// words directly into the importing module.
    Prefixed(String, String),
}

impl ModuleSpec {
    pub fn module_name(&self) -> &str {
        match self {
            ModuleSpec::Name(name) => name,
            ModuleSpec::Prefixed(name, _) => name,
        }
    }

    pub fn prefix(&self) -> &str {
        match self {
            ModuleSpec::Name(name) => name,
            ModuleSpec::Prefixed(_, prefix) => prefix,
        }
    }
}

impl From<&str> for ModuleSpec {
    fn from(name: &str) -> ModuleSpec {
        ModuleSpec::Name(name.to_string())
    }
}

impl From<(&str, &str)> for ModuleSpec {
    fn from((name, prefix): (&str, &str)) -> ModuleSpec {
        ModuleSpec::Prefixed(name.to_string(), prefix.to_string())
    }
}

/// Trait for managing the interpreter's data stack.  Intended to be called by native words.
pub trait InterpreterStack {
    /// What has the maximum depth the stack as reached so far?
    fn stack_max_depth(&self) -> usize;

    /// Use to examine the full data stack when required.  One example is for the stack dump word
    /// `STACK-DUMP`.
    fn stack(&self) -> &ValueStack;

    /// Push a script value onto the stack.  This is the primary way of sending values to words.
    fn push(&mut self, value: Value);

    /// Pop a value from the stack.  This is the primary way of receiving outputs from words.  If
    /// the stack is empty a stack underflow error is returned.
    fn pop(&mut self) -> error::Result<Value>;

    /// A copy of the top value, leaving it on the stack.  Fails with stack underflow if the stack
    /// is empty.
    fn peek(&self) -> error::Result<Value>;

    /// Pop the top value and require it to be an integer.
    fn pop_as_int(&mut self) -> error::Result<i64>;

    /// Pop the top value and attempt to convert it to a floating point value.  Integers are
    /// converted, other types are an error.
    fn pop_as_float(&mut self) -> error::Result<f64>;

    /// Pop the top value and interpret it as a condition.
    fn pop_as_bool(&mut self) -> error::Result<bool>;

    fn pop_as_string(&mut self) -> error::Result<String>;

    fn pop_as_array(&mut self) -> error::Result<ValueVecPtr>;

    fn pop_as_record(&mut self) -> error::Result<ValueHashPtr>;

    fn pop_as_variable(&mut self) -> error::Result<VariablePtr>;

    /// Native words that accept options check for them with this.  If the top of the stack is an
    /// options value it is popped and returned, otherwise the stack is left alone.
    fn pop_options_if_present(&mut self) -> error::Result<Option<WordOptionsPtr>>;
}

/// Trait for feeding source code to the interpreter.
pub trait CodeManagement {
    /// Tokenize and run a complete piece of code.  May be called recursively from native words,
    /// each call gets it's own tokenizer while sharing the stacks with the caller.
    fn run(&mut self, code: &str) -> error::Result<()> {
        self.run_with_location(code, None)
    }

    /// Run code whose locations continue on from the given reference location.
    fn run_with_location(
        &mut self,
        code: &str,
        reference: Option<CodeLocation>,
    ) -> error::Result<()>;

    /// Run the code with the given module as the current module.
    fn run_in_module(&mut self, module: &ModulePtr, code: &str) -> error::Result<()>;

    /// Feed code to the interpreter a piece at a time.  Complete tokens are run as they arrive
    /// while any trailing text that could still grow is held back for the next call.  Passing
    /// `done` flushes everything and checks that no definition is left open.
    fn streaming_run(&mut self, code: &str, done: bool) -> error::Result<()>;

    /// Is a definition currently being compiled?
    fn is_compiling(&self) -> bool;
}

/// Simplify registering a native word with the interpreter.
///
/// Required parameters are, the interpreter instance to register with.  The name of the word to
/// register.  The word function handler to execute for the word.  The word is added to the
/// interpreter's current module.
#[macro_export]
macro_rules! add_native_word {
    ($interpreter:expr , $name:expr , $function:expr) => {{
        // Import the necessary items for the macro to work.
        use std::rc::Rc;

        // Register the word while recording where in the source code the word was registered
        // from.
        let word = $crate::runtime::word::Word::native(
            $name,
            Rc::new($function),
            Some($crate::location_here!()),
        );

        $interpreter.add_word(word);
    }};
}

/// Trait for managing and executing words known to the interpreter.
pub trait WordManagement {
    /// If currently set, this represents the current executing location in the original Forthic
    /// source code.
    fn current_location(&self) -> &Option<CodeLocation>;

    /// Words executing compiled definitions report the location of each word as it runs.
    fn set_current_location(&mut self, location: CodeLocation);

    /// Add a word to the current module's dictionary.
    fn add_word(&mut self, word: WordPtr);

    /// Add a word to the current module and mark it exportable.
    fn add_exportable_word(&mut self, word: WordPtr);

    /// Resolve a name to a word.  The module stack is searched from the innermost module outward,
    /// then the literal handlers are tried.  Fails with an unknown word error.
    fn find_word(&self, name: &str) -> error::Result<WordPtr>;

    /// Add a literal handler to the front of the chain, so that it is tried before all of the
    /// existing handlers.
    fn register_literal_handler(&mut self, handler: Rc<LiteralHandler>);

    /// Execute a word, tracking it on the call stack.
    fn execute_word(&mut self, word: &WordPtr) -> error::Result<()>;

    /// Find and execute a word by name.  If the word is not found an error is returned.
    fn execute_word_named(&mut self, name: &str) -> error::Result<()>;

    /// The current script execution call stack.
    fn call_stack(&self) -> &CallStack;
}

/// Trait for the module stack and the interpreter's registry of modules.
pub trait ModuleManagement {
    /// The root module, always at the bottom of the module stack.
    fn app_module(&self) -> ModulePtr;

    /// The innermost module on the module stack.
    fn current_module(&self) -> ModulePtr;

    fn module_stack_push(&mut self, module: ModulePtr);

    /// Leave the current module.  The app module can not be popped.
    fn module_stack_pop(&mut self) -> error::Result<ModulePtr>;

    /// Make a module available to `use_modules` by it's name.
    fn register_module(&mut self, module: ModulePtr);

    /// Find a registered module, failing with an unknown module error.
    fn find_module(&self, name: &str) -> error::Result<ModulePtr>;

    /// Import registered modules into the app module.
    fn use_modules(&mut self, specs: &[ModuleSpec]) -> error::Result<()>;

    /// Find the variable cell a reference should use right now.  The innermost module on the
    /// module stack with the given name is asked for the variable.  None if there is no such
    /// module or it lacks the variable.
    fn bound_variable(&self, module_name: &str, name: &str) -> Option<VariablePtr>;
}

/// The full interpreter interface, as handed to native words.
pub trait Interpreter:
    InterpreterStack + CodeManagement + WordManagement + ModuleManagement
{
    fn config(&self) -> &InterpreterConfig;

    /// Clear the stacks and leave all modules, going back to the app module.  Registered modules
    /// and words are kept.
    fn reset(&mut self);
}
