use std::{ cell::RefCell,
           fmt::{ self,
                  Debug,
                  Display,
                  Formatter },
           rc::Rc };
use crate::{ lang::source_buffer::CodeLocation,
             runtime::{ data_structures::{ value::Value,
                                           variable::VariablePtr },
                        error::{ self,
                                 ScriptError,
                                 script_error },
                        interpreter::{ Interpreter, WordHandler },
                        module::{ Module,
                                  ModulePtr } } };



/// An error handler attached to a word.  It receives the error, the word it is attached to and the
/// interpreter.  Returning Ok means the error was handled.
pub type ErrorHandler = dyn Fn(&ScriptError, &Word, &mut dyn Interpreter) -> error::Result<()>;


/// A reference to a word.  Words are immutable once created, apart from their error handlers and
/// runtime info, so they are freely shared between modules and definitions.
pub type WordPtr = Rc<Word>;



/// Where a word is able to run.  This information is not used by the interpreter itself, it is
/// kept for hosts that want to batch or dispatch words to other runtimes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeInfo
{
    /// Is the word part of the standard library available everywhere?
    pub is_standard: bool,

    /// Does the word have to be executed by a remote runtime?
    pub requires_remote: bool,

    /// Names of the runtimes the word can run in.
    pub available_in: Vec<String>
}


impl Default for RuntimeInfo
{
    fn default() -> Self
    {
        RuntimeInfo::local()
    }
}


impl RuntimeInfo
{
    /// A word that only runs in the local interpreter.
    pub fn local() -> RuntimeInfo
    {
        RuntimeInfo
            {
                is_standard: false,
                requires_remote: false,
                available_in: vec![ "local".to_string() ]
            }
    }

    /// A standard library word, available in any runtime.
    pub fn standard(runtimes: &[&str]) -> RuntimeInfo
    {
        RuntimeInfo
            {
                is_standard: true,
                requires_remote: false,
                available_in: runtimes.iter().map(|runtime| runtime.to_string()).collect()
            }
    }

    /// A word that has to be sent to the named runtime to be executed.
    pub fn remote(runtime: &str) -> RuntimeInfo
    {
        RuntimeInfo
            {
                is_standard: false,
                requires_remote: true,
                available_in: vec![ runtime.to_string() ]
            }
    }
}



/// One step of a compiled definition, the word and where it was found in the source.
#[derive(Clone)]
pub struct CompiledWord
{
    pub location: Option<CodeLocation>,
    pub word: WordPtr
}


/// The different kinds of words.  The set is closed, execution dispatches on it with a match.
pub enum WordKind
{
    /// Pushes a fixed value, used for literals and strings.
    PushValue(Value),

    /// Pushes a reference to a module variable.  The variable is looked up by module name when the
    /// word runs, falling back on the cell captured when the word was created.
    PushVariable
    {
        module_name: String,
        variable: VariablePtr
    },

    /// Calls a host supplied function.
    Native(Rc<WordHandler>),

    /// A word defined in Forthic with `:`.
    Definition
    {
        words: Vec<CompiledWord>,
        source_text: Option<String>
    },

    /// A word imported with a prefix.  The target runs with it's own module as the current module.
    Imported
    {
        target: WordPtr,
        module: ModulePtr
    },

    /// Defined with `@:`, the target's result is computed once and then cached.
    Memo
    {
        target: WordPtr,
        cache: RefCell<Option<Value>>
    },

    /// `NAME!` and `NAME!@`, recompute a memo's value.  The second form also pushes the new value.
    MemoRefresh
    {
        memo: WordPtr,
        push_value: bool
    },

    /// `{name` enters the named child module, `{` alone returns to the app module.
    StartModule(String),

    /// `}` leaves the current module.
    EndModule,

    /// `]` collects the values pushed since the matching `[` into an array.
    EndArray
}



/// The unit of execution.  Every token the interpreter handles either is a word or resolves to one.
pub struct Word
{
    name: String,
    location: Option<CodeLocation>,
    runtime_info: RefCell<RuntimeInfo>,
    error_handlers: RefCell<Vec<Rc<ErrorHandler>>>,
    kind: WordKind
}


impl Display for Word
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        match &self.kind
        {
            WordKind::PushValue(Value::String(text)) => write!(f, "{}", Value::stringify(text)),
            WordKind::Definition { source_text: Some(text), .. } => write!(f, "{}", text),
            _ => write!(f, "{}", self.name)
        }
    }
}


impl Debug for Word
{
    fn fmt(&self, f: &mut Formatter) -> fmt::Result
    {
        write!(f, "Word({})", self.name)
    }
}


impl Word
{
    fn new(name: String, location: Option<CodeLocation>, kind: WordKind) -> WordPtr
    {
        Rc::new(Word
            {
                name,
                location,
                runtime_info: RefCell::new(RuntimeInfo::local()),
                error_handlers: RefCell::new(Vec::new()),
                kind
            })
    }

    pub fn push_value(name: &str, value: Value, location: Option<CodeLocation>) -> WordPtr
    {
        Word::new(name.to_string(), location, WordKind::PushValue(value))
    }

    pub fn push_variable(module_name: &str, variable: VariablePtr) -> WordPtr
    {
        let name = variable.borrow().name().to_string();

        Word::new(name,
                  None,
                  WordKind::PushVariable { module_name: module_name.to_string(), variable })
    }

    pub fn native(name: &str, handler: Rc<WordHandler>, location: Option<CodeLocation>) -> WordPtr
    {
        Word::new(name.to_string(), location, WordKind::Native(handler))
    }

    pub fn definition(name: &str,
                      words: Vec<CompiledWord>,
                      source_text: Option<String>,
                      location: Option<CodeLocation>) -> WordPtr
    {
        Word::new(name.to_string(), location, WordKind::Definition { words, source_text })
    }

    /// Wrap a word exported from a module as `prefix.name`, or under it's own name when the prefix
    /// is empty.  Either way the word runs with the importer's copy of the module as the current
    /// module.
    pub fn imported(prefix: &str, target: WordPtr, module: ModulePtr) -> WordPtr
    {
        let name = if prefix.is_empty()
            {
                target.name().to_string()
            }
            else
            {
                format!("{}.{}", prefix, target.name())
            };
        let location = target.location.clone();

        Word::new(name, location, WordKind::Imported { target, module })
    }

    /// Create the memo word for a definition along with it's `NAME!` and `NAME!@` companions.
    pub fn memo_words(definition: WordPtr) -> ( WordPtr, WordPtr, WordPtr )
    {
        let name = definition.name().to_string();
        let location = definition.location.clone();

        let memo = Word::new(name.clone(),
                             location.clone(),
                             WordKind::Memo { target: definition, cache: RefCell::new(None) });

        let refresh = Word::new(format!("{}!", name),
                                location.clone(),
                                WordKind::MemoRefresh { memo: memo.clone(), push_value: false });

        let refresh_and_push = Word::new(format!("{}!@", name),
                                         location,
                                         WordKind::MemoRefresh { memo: memo.clone(),
                                                                 push_value: true });

        ( memo, refresh, refresh_and_push )
    }

    pub fn start_module(name: &str, location: Option<CodeLocation>) -> WordPtr
    {
        Word::new(format!("{{{}", name), location, WordKind::StartModule(name.to_string()))
    }

    pub fn end_module(location: Option<CodeLocation>) -> WordPtr
    {
        Word::new("}".to_string(), location, WordKind::EndModule)
    }

    pub fn end_array(location: Option<CodeLocation>) -> WordPtr
    {
        Word::new("]".to_string(), location, WordKind::EndArray)
    }

    pub fn name(&self) -> &str
    {
        &self.name
    }

    /// Where the word was defined, or for literals where it was found.
    pub fn location(&self) -> &Option<CodeLocation>
    {
        &self.location
    }

    pub fn kind(&self) -> &WordKind
    {
        &self.kind
    }

    /// The runtime info of the word.  Imported words report their target's info.
    pub fn runtime_info(&self) -> RuntimeInfo
    {
        match &self.kind
        {
            WordKind::Imported { target, .. } => target.runtime_info(),
            _                                 => self.runtime_info.borrow().clone()
        }
    }

    pub fn set_runtime_info(&self, runtime_info: RuntimeInfo)
    {
        *self.runtime_info.borrow_mut() = runtime_info;
    }

    /// Attach an error handler.  Handlers are tried in the order they were added.
    pub fn add_error_handler(&self, handler: Rc<ErrorHandler>)
    {
        self.error_handlers.borrow_mut().push(handler);
    }

    pub fn error_handler_count(&self) -> usize
    {
        self.error_handlers.borrow().len()
    }

    /// The cached value of a memo word, if it has been computed.
    pub fn memo_value(&self) -> Option<Value>
    {
        match &self.kind
        {
            WordKind::Memo { cache, .. } => cache.borrow().clone(),
            _                            => None
        }
    }

    /// Run the word.  Failures are offered to the word's error handlers before being returned.
    pub fn execute(&self, interpreter: &mut dyn Interpreter) -> error::Result<()>
    {
        let result = match &self.kind
            {
                // Definitions offer the failures of their words to the handlers themselves.
                WordKind::Definition { words, source_text } =>
                    return self.execute_definition(words, source_text, interpreter),

                WordKind::PushValue(value) =>
                    {
                        interpreter.push(value.clone());
                        Ok(())
                    },

                WordKind::PushVariable { module_name, variable } =>
                    {
                        let name = variable.borrow().name().to_string();
                        let bound = interpreter.bound_variable(module_name, &name)
                                               .unwrap_or_else(|| variable.clone());

                        interpreter.push(Value::Variable(bound));
                        Ok(())
                    },

                WordKind::Native(handler) => self.execute_native(handler, interpreter),

                WordKind::Imported { target, module } =>
                    {
                        interpreter.module_stack_push(module.clone());

                        let result = interpreter.execute_word(target);
                        let popped = interpreter.module_stack_pop();

                        result.and(popped.map(|_| ()))
                    },

                WordKind::Memo { cache, .. } => self.execute_memo(cache, interpreter),

                WordKind::MemoRefresh { memo, push_value } =>
                    memo.refresh_memo(interpreter).map(|()|
                        {
                            if *push_value
                            {
                                interpreter.push(memo.memo_value().unwrap_or_default());
                            }
                        }),

                WordKind::StartModule(name) => start_module(name, interpreter),

                WordKind::EndModule => interpreter.module_stack_pop().map(|_| ()),

                WordKind::EndArray => end_array(interpreter)
            };

        match result
        {
            Ok(()) => Ok(()),
            Err(error) => self.try_error_handlers(error, interpreter)
        }
    }

    /// Push the cached value, computing it first if this is the first use.
    fn execute_memo(&self,
                    cache: &RefCell<Option<Value>>,
                    interpreter: &mut dyn Interpreter) -> error::Result<()>
    {
        if cache.borrow().is_none()
        {
            self.refresh_memo(interpreter)?;
        }

        let value = cache.borrow().clone().unwrap_or_default();

        interpreter.push(value);
        Ok(())
    }

    /// Run each word of the definition in turn.  A failing word is offered to this definition's
    /// error handlers, if one of them handles it execution continues with the next word.
    fn execute_definition(&self,
                          words: &[CompiledWord],
                          source_text: &Option<String>,
                          interpreter: &mut dyn Interpreter) -> error::Result<()>
    {
        for compiled in words
        {
            if let Some(location) = &compiled.location
            {
                interpreter.set_current_location(location.clone());
            }

            if let Err(error) = interpreter.execute_word(&compiled.word)
            {
                let error = match source_text
                    {
                        Some(text) => error.with_source_text_if_missing(text),
                        None       => error
                    };

                self.try_error_handlers(error, interpreter)?;
            }
        }

        Ok(())
    }

    /// Native failures are wrapped so that the word's name is reported, except for intentional
    /// stops which pass through untouched.
    fn execute_native(&self,
                      handler: &Rc<WordHandler>,
                      interpreter: &mut dyn Interpreter) -> error::Result<()>
    {
        match handler(interpreter)
        {
            Ok(()) => Ok(()),
            Err(error) if error.is_intentional_stop() => Err(error),
            Err(error) =>
                {
                    log_trace!("Native word {} failed: {}", self.name, error.kind());

                    let location = interpreter.current_location().clone();
                    Err(ScriptError::word_execution(&self.name, location, error))
                }
        }
    }

    /// Run the memo's target and cache the value it leaves on the stack.
    fn refresh_memo(&self, interpreter: &mut dyn Interpreter) -> error::Result<()>
    {
        let WordKind::Memo { target, cache } = &self.kind
        else
        {
            return script_error(interpreter, format!("{} is not a memo word.", self.name));
        };

        log_trace!("Refreshing memo {}.", self.name);

        interpreter.execute_word(target)?;

        let value = interpreter.pop()?;
        *cache.borrow_mut() = Some(value);

        Ok(())
    }

    /// Give each error handler a chance to handle the error, in registration order.  The first
    /// handler that succeeds ends the search.
    fn try_error_handlers(&self,
                          error: ScriptError,
                          interpreter: &mut dyn Interpreter) -> error::Result<()>
    {
        let handlers = self.error_handlers.borrow().clone();

        for handler in handlers.iter()
        {
            if handler(&error, self, interpreter).is_ok()
            {
                log_debug!("Error in {} was handled: {}", self.name, error.kind());
                return Ok(());
            }
        }

        Err(error)
    }
}



/// Find or create the named child of the current module and make it current.  Modules created
/// directly under the app module are also registered with the interpreter.  An empty name goes
/// back to the app module.
fn start_module(name: &str, interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    if name.is_empty()
    {
        let app_module = interpreter.app_module();
        interpreter.module_stack_push(app_module);

        return Ok(());
    }

    let parent = interpreter.current_module();
    let existing = parent.borrow().find_module(name);

    let module = match existing
        {
            Some(module) => module,
            None =>
                {
                    log_debug!("Creating module {}.", name);

                    let module = Module::new(name).into_ptr();

                    parent.borrow_mut().add_child_module(module.clone());

                    if Rc::ptr_eq(&parent, &interpreter.app_module())
                    {
                        interpreter.register_module(module.clone());
                    }

                    module
                }
        };

    interpreter.module_stack_push(module);
    Ok(())
}


/// Pop values until the start of array marker, then push them as an array in the order they were
/// pushed.
fn end_array(interpreter: &mut dyn Interpreter) -> error::Result<()>
{
    let mut items = Vec::new();

    loop
    {
        let value = interpreter.pop()?;

        if value.is_start_array_marker()
        {
            break;
        }

        items.push(value);
    }

    items.reverse();
    interpreter.push(Value::new_array(items));

    Ok(())
}
