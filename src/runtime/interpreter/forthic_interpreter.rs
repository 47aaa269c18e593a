use std::{ collections::HashMap,
           rc::Rc };
use crate::{ location_here,
             logging::init_logging,
             lang::{ source_buffer::CodeLocation,
                     tokenizing::{ Token,
                                   TokenType,
                                   Tokenizer } },
             runtime::{ config::InterpreterConfig,
                        data_structures::{ value::Value,
                                           value_hash::ValueHashPtr,
                                           value_stack::ValueStack,
                                           value_vec::ValueVecPtr,
                                           variable::VariablePtr,
                                           word_options::WordOptionsPtr },
                        error::{ self,
                                 ErrorKind,
                                 interpreter_error,
                                 script_error,
                                 script_error_str },
                        interpreter::{ CallItem,
                                       CallStack,
                                       CodeManagement,
                                       Interpreter,
                                       InterpreterStack,
                                       ModuleManagement,
                                       ModuleSpec,
                                       WordManagement,
                                       literals::{ LiteralHandler,
                                                   default_literal_handlers } },
                        module::{ Module,
                                  ModulePtr },
                        word::{ CompiledWord,
                                Word,
                                WordPtr } } };



/// A definition being compiled between `:` (or `@:`) and `;`.
struct DefinitionBuilder
{
    name: String,
    is_memo: bool,

    /// Location of the `:` token, the definition's source text starts here.
    location: CodeLocation,

    /// Source text already read from earlier streaming chunks.
    source_prefix: String,

    /// Where the current chunk's part of the source text starts, once the definition spans chunks.
    source_resume: Option<usize>,

    words: Vec<CompiledWord>
}


/// Input held back by `streaming_run` until more text arrives.
#[derive(Default)]
struct StreamingState
{
    /// Unconsumed text from earlier chunks.
    pending: String,

    /// Where the pending text starts in the overall stream.
    location: CodeLocation
}



/// The core interpreter implementation for the Forthic language.
pub struct ForthicInterpreter
{
    config: InterpreterConfig,

    /// The data stack used by the interpreter.
    stack: ValueStack,


    /// The root module.  Always at the bottom of the module stack.
    app_module: ModulePtr,

    /// The modules in scope, innermost last.
    module_stack: Vec<ModulePtr>,

    /// Modules that can be imported with use_modules.
    registered_modules: HashMap<String, ModulePtr>,


    /// Tried in order for words not found in any module.
    literal_handlers: Vec<Rc<LiteralHandler>>,


    /// One tokenizer per active run, the innermost run's tokenizer is last.
    tokenizers: Vec<Tokenizer>,

    /// The definition being compiled, if any.
    definition: Option<DefinitionBuilder>,


    /// The last known location execution has reached in the original source code.
    current_location: Option<CodeLocation>,

    /// The call stack used to keep track of the current execution context.
    call_stack: CallStack,


    streaming: StreamingState
}


impl Interpreter for ForthicInterpreter
{
    fn config(&self) -> &InterpreterConfig
    {
        &self.config
    }

    fn reset(&mut self)
    {
        log_debug!("Resetting the interpreter.");

        self.stack.clear();
        self.module_stack = vec![ self.app_module.clone() ];
        self.definition = None;
        self.current_location = None;
        self.streaming = StreamingState::default();
    }
}


impl InterpreterStack for ForthicInterpreter
{
    fn stack_max_depth(&self) -> usize
    {
        self.stack.max_depth()
    }

    fn stack(&self) -> &ValueStack
    {
        &self.stack
    }

    fn push(&mut self, value: Value)
    {
        self.stack.push(value);
    }

    fn pop(&mut self) -> error::Result<Value>
    {
        match self.stack.pop()
        {
            Ok(value) => Ok(value),
            Err(_) => interpreter_error(self, ErrorKind::StackUnderflow)
        }
    }

    fn peek(&self) -> error::Result<Value>
    {
        match self.stack.peek()
        {
            Ok(value) => Ok(value.clone()),
            Err(_) => interpreter_error(self, ErrorKind::StackUnderflow)
        }
    }

    fn pop_as_int(&mut self) -> error::Result<i64>
    {
        match self.pop()?
        {
            Value::Int(value) => Ok(value),
            other => script_error(self, format!("Expected an integer, found {}.", other.type_name()))
        }
    }

    fn pop_as_float(&mut self) -> error::Result<f64>
    {
        match self.pop()?
        {
            Value::Float(value) => Ok(value),
            Value::Int(value) => Ok(value as f64),
            other => script_error(self, format!("Expected a number, found {}.", other.type_name()))
        }
    }

    fn pop_as_bool(&mut self) -> error::Result<bool>
    {
        Ok(self.pop()?.is_truthy())
    }

    fn pop_as_string(&mut self) -> error::Result<String>
    {
        match self.pop()?
        {
            Value::String(value) => Ok(value),
            other => script_error(self, format!("Expected a string, found {}.", other.type_name()))
        }
    }

    fn pop_as_array(&mut self) -> error::Result<ValueVecPtr>
    {
        match self.pop()?
        {
            Value::Vec(value) => Ok(value),
            other => script_error(self, format!("Expected an array, found {}.", other.type_name()))
        }
    }

    fn pop_as_record(&mut self) -> error::Result<ValueHashPtr>
    {
        match self.pop()?
        {
            Value::Record(value) => Ok(value),
            other => script_error(self, format!("Expected a record, found {}.", other.type_name()))
        }
    }

    fn pop_as_variable(&mut self) -> error::Result<VariablePtr>
    {
        match self.pop()?
        {
            Value::Variable(value) => Ok(value),
            other => script_error(self, format!("Expected a variable, found {}.",
                                                other.type_name()))
        }
    }

    fn pop_options_if_present(&mut self) -> error::Result<Option<WordOptionsPtr>>
    {
        if !matches!(self.stack.peek(), Ok(Value::Options(_)))
        {
            return Ok(None);
        }

        match self.pop()?
        {
            Value::Options(options) => Ok(Some(options)),
            _ => Ok(None)
        }
    }
}


impl CodeManagement for ForthicInterpreter
{
    fn run_with_location(&mut self,
                         code: &str,
                         reference: Option<CodeLocation>) -> error::Result<()>
    {
        self.tokenizers.push(Tokenizer::new(code, reference));

        let result = self.run_tokens();

        let _ = self.tokenizers.pop();
        result
    }

    fn run_in_module(&mut self, module: &ModulePtr, code: &str) -> error::Result<()>
    {
        self.module_stack_push(module.clone());

        let result = self.run(code);
        let popped = self.module_stack_pop();

        result.and(popped.map(|_| ()))
    }

    fn streaming_run(&mut self, code: &str, done: bool) -> error::Result<()>
    {
        let mut text = std::mem::take(&mut self.streaming.pending);
        text.push_str(code);

        let reference = self.streaming.location.clone();

        if done
        {
            self.streaming = StreamingState::default();
            return self.run_with_location(&text, Some(reference));
        }

        self.tokenizers.push(Tokenizer::new_streaming(&text, Some(reference)));

        let result = self.run_streaming_tokens();

        let tokenizer = self.tokenizers.pop();

        match ( result, tokenizer )
        {
            ( Ok(resume), Some(tokenizer) ) =>
                {
                    if let Some(definition) = self.definition.as_mut()
                    {
                        let start = definition.source_resume
                                              .unwrap_or(definition.location.start_pos());

                        definition.source_prefix
                                  .push_str(tokenizer.slice(start, resume.start_pos())
                                                     .unwrap_or_default());
                        definition.source_resume = Some(resume.start_pos());
                    }

                    self.streaming.pending = tokenizer.slice(resume.start_pos(), tokenizer.end_pos())
                                                      .unwrap_or_default()
                                                      .to_string();
                    self.streaming.location = resume;

                    Ok(())
                },

            ( Ok(_), None ) => script_error_str(self, "Streaming tokenizer was lost."),

            ( Err(error), _ ) =>
                {
                    self.streaming = StreamingState::default();
                    Err(error)
                }
        }
    }

    fn is_compiling(&self) -> bool
    {
        self.definition.is_some()
    }
}


impl ForthicInterpreter
{
    fn next_token(&mut self) -> error::Result<Option<Token>>
    {
        match self.tokenizers.last_mut()
        {
            Some(tokenizer) => tokenizer.next_token(),
            None => script_error_str(self, "No source code is being run.")
        }
    }

    /// Handle tokens until the end of the input.
    fn run_tokens(&mut self) -> error::Result<()>
    {
        while let Some(token) = self.next_token()?
        {
            let done = token.is_end_of_stream();

            self.handle_token(token)?;

            if done
            {
                break;
            }
        }

        Ok(())
    }

    /// Handle the tokens that are known to be complete.  Returns the location that the remaining,
    /// unhandled, input starts at.
    fn run_streaming_tokens(&mut self) -> error::Result<CodeLocation>
    {
        loop
        {
            let resume = match self.tokenizers.last()
                {
                    Some(tokenizer) => tokenizer.location().clone(),
                    None => return script_error_str(self, "No source code is being run.")
                };

            let Some(token) = self.next_token()?
            else
            {
                log_trace!("Deferring an incomplete token until more input arrives.");
                return Ok(resume);
            };

            if token.is_end_of_stream()
            {
                return Ok(token.location().clone());
            }

            if self.may_continue(&token)
            {
                log_trace!("Deferring {:?} until more input arrives.", token.string);
                return Ok(resume);
            }

            self.handle_token(token)?;
        }
    }

    /// Could more input still change this token?  That is the case for tokens that run right up to
    /// the end of the text, except for punctuation and strings with single delimiters.
    fn may_continue(&self, token: &Token) -> bool
    {
        let Some(tokenizer) = self.tokenizers.last()
        else
        {
            return false;
        };

        if token.location().end_pos() < tokenizer.end_pos()
        {
            return false;
        }

        match token.token_type
        {
            TokenType::StartArray
            | TokenType::EndArray
            | TokenType::EndModule
            | TokenType::EndDef => false,

            TokenType::String =>
                {
                    let location = token.location();
                    let opening = tokenizer.slice(location.start_pos(), location.end_pos())
                                           .unwrap_or_default();
                    let mut quotes = opening.chars();

                    match ( quotes.next(), quotes.next(), quotes.next() )
                    {
                        ( Some(a), Some(b), Some(c) ) => a == b && b == c,
                        _                             => false
                    }
                },

            _ => true
        }
    }

    fn handle_token(&mut self, token: Token) -> error::Result<()>
    {
        let location = token.location().clone();
        self.current_location = Some(location.clone());

        match token.token_type
        {
            TokenType::Comment => Ok(()),

            TokenType::String | TokenType::DotSymbol =>
                {
                    let word = Word::push_value(&token.string,
                                                Value::String(token.string.clone()),
                                                Some(location.clone()));
                    self.handle_word(word, location)
                },

            TokenType::StartArray =>
                {
                    let word = Word::push_value("[", Value::StartArrayMarker, Some(location.clone()));
                    self.handle_word(word, location)
                },

            TokenType::EndArray =>
                {
                    let word = Word::end_array(Some(location.clone()));
                    self.handle_word(word, location)
                },

            TokenType::StartModule =>
                {
                    let word = Word::start_module(&token.string, Some(location.clone()));
                    self.handle_immediate_word(word, location)
                },

            TokenType::EndModule =>
                {
                    let word = Word::end_module(Some(location.clone()));
                    self.handle_immediate_word(word, location)
                },

            TokenType::StartDef => self.start_definition(token, false),
            TokenType::StartMemo => self.start_definition(token, true),
            TokenType::EndDef => self.end_definition(token),

            TokenType::Word =>
                {
                    let word = self.find_word(&token.string)?;
                    self.handle_word(word, location)
                },

            TokenType::EndOfStream =>
                {
                    if let Some(definition) = self.definition.take()
                    {
                        return interpreter_error(self, ErrorKind::MissingSemicolon(definition.name));
                    }

                    Ok(())
                }
        }
    }

    /// Compile the word if a definition is open, otherwise execute it.
    fn handle_word(&mut self, word: WordPtr, location: CodeLocation) -> error::Result<()>
    {
        match &mut self.definition
        {
            Some(definition) =>
                {
                    definition.words.push(CompiledWord { location: Some(location), word });
                    Ok(())
                },

            None => self.execute_word(&word)
        }
    }

    /// Module scope words are executed even while compiling, so that the words that follow are
    /// looked up in the right module.  They are also compiled so the definition replays them.
    fn handle_immediate_word(&mut self, word: WordPtr, location: CodeLocation) -> error::Result<()>
    {
        if let Some(definition) = &mut self.definition
        {
            definition.words.push(CompiledWord { location: Some(location), word: word.clone() });
        }

        self.execute_word(&word)
    }

    fn start_definition(&mut self, token: Token, is_memo: bool) -> error::Result<()>
    {
        if let Some(definition) = self.definition.take()
        {
            return interpreter_error(self, ErrorKind::MissingSemicolon(definition.name));
        }

        log_trace!("Compiling {}.", token.string);

        self.definition = Some(DefinitionBuilder
            {
                name: token.string,
                is_memo,
                location: token.location,
                source_prefix: String::new(),
                source_resume: None,
                words: Vec::new()
            });

        Ok(())
    }

    fn end_definition(&mut self, token: Token) -> error::Result<()>
    {
        let Some(definition) = self.definition.take()
        else
        {
            return interpreter_error(self, ErrorKind::ExtraSemicolon);
        };

        let start = definition.source_resume.unwrap_or(definition.location.start_pos());
        let source_text = self.tokenizers
                              .last()
                              .and_then(|tokenizer| tokenizer.slice(start, token.location().end_pos()))
                              .map(|text| format!("{}{}", definition.source_prefix, text));

        let word = Word::definition(&definition.name,
                                    definition.words,
                                    source_text,
                                    Some(definition.location));

        let module = self.current_module();

        if definition.is_memo
        {
            module.borrow_mut().add_memo_words(word);
        }
        else
        {
            module.borrow_mut().add_word(word);
        }

        log_debug!("Defined {} in module {:?}.", definition.name, module.borrow().name());

        Ok(())
    }
}


impl WordManagement for ForthicInterpreter
{
    fn current_location(&self) -> &Option<CodeLocation>
    {
        &self.current_location
    }

    fn set_current_location(&mut self, location: CodeLocation)
    {
        self.current_location = Some(location);
    }

    fn add_word(&mut self, word: WordPtr)
    {
        self.current_module().borrow_mut().add_word(word);
    }

    fn add_exportable_word(&mut self, word: WordPtr)
    {
        self.current_module().borrow_mut().add_exportable_word(word);
    }

    fn find_word(&self, name: &str) -> error::Result<WordPtr>
    {
        for module in self.module_stack.iter().rev()
        {
            if let Some(word) = module.borrow().find_word(name)
            {
                return Ok(word);
            }
        }

        for handler in &self.literal_handlers
        {
            if let Some(value) = handler(name)
            {
                return Ok(Word::push_value(name, value, self.current_location.clone()));
            }
        }

        interpreter_error(self, ErrorKind::UnknownWord(name.to_string()))
    }

    fn register_literal_handler(&mut self, handler: Rc<LiteralHandler>)
    {
        self.literal_handlers.insert(0, handler);
    }

    fn execute_word(&mut self, word: &WordPtr) -> error::Result<()>
    {
        let location = self.current_location
                           .clone()
                           .unwrap_or_else(|| location_here!());

        self.call_stack.push(CallItem::new(word.name().to_string(), location));

        let result = word.execute(self);

        let _ = self.call_stack.pop();
        result
    }

    fn execute_word_named(&mut self, name: &str) -> error::Result<()>
    {
        let word = self.find_word(name)?;
        self.execute_word(&word)
    }

    fn call_stack(&self) -> &CallStack
    {
        &self.call_stack
    }
}


impl ModuleManagement for ForthicInterpreter
{
    fn app_module(&self) -> ModulePtr
    {
        self.app_module.clone()
    }

    fn current_module(&self) -> ModulePtr
    {
        self.module_stack
            .last()
            .cloned()
            .unwrap_or_else(|| self.app_module.clone())
    }

    fn module_stack_push(&mut self, module: ModulePtr)
    {
        self.module_stack.push(module);
    }

    fn module_stack_pop(&mut self) -> error::Result<ModulePtr>
    {
        if self.module_stack.len() <= 1
        {
            let kind = ErrorKind::Module { module: String::new(),
                                           message: "The app module can not be left.".to_string() };
            return interpreter_error(self, kind);
        }

        match self.module_stack.pop()
        {
            Some(module) => Ok(module),
            None => script_error_str(self, "Module stack underflow.")
        }
    }

    fn register_module(&mut self, module: ModulePtr)
    {
        let name = module.borrow().name().to_string();

        log_trace!("Registering module {}.", name);
        let _ = self.registered_modules.insert(name, module);
    }

    fn find_module(&self, name: &str) -> error::Result<ModulePtr>
    {
        match self.registered_modules.get(name)
        {
            Some(module) => Ok(module.clone()),
            None => interpreter_error(self, ErrorKind::UnknownModule(name.to_string()))
        }
    }

    fn use_modules(&mut self, specs: &[ModuleSpec]) -> error::Result<()>
    {
        let app_module = self.app_module.clone();

        for spec in specs
        {
            let module = self.find_module(spec.module_name())?;
            Module::import_module(&app_module, spec.prefix(), &module, self)?;
        }

        Ok(())
    }

    fn bound_variable(&self, module_name: &str, name: &str) -> Option<VariablePtr>
    {
        self.module_stack
            .iter()
            .rev()
            .find(|module| module.borrow().name() == module_name)
            .and_then(|module| module.borrow().find_variable(name))
    }
}


impl ForthicInterpreter
{
    /// Create an interpreter configured from the process environment.
    pub fn new() -> ForthicInterpreter
    {
        ForthicInterpreter::with_config(InterpreterConfig::from_env())
    }

    pub fn with_config(config: InterpreterConfig) -> ForthicInterpreter
    {
        init_logging();

        let app_module = Module::new("").into_ptr();
        let literal_handlers = default_literal_handlers(&config);

        ForthicInterpreter
            {
                config,

                stack: ValueStack::new(),

                app_module: app_module.clone(),
                module_stack: vec![ app_module ],
                registered_modules: HashMap::new(),

                literal_handlers,

                tokenizers: Vec::new(),
                definition: None,

                current_location: None,
                call_stack: CallStack::with_capacity(40),

                streaming: StreamingState::default()
            }
    }

    /// Register a module and import it in one step.
    pub fn import_module(&mut self, module: ModulePtr, prefix: &str) -> error::Result<()>
    {
        let name = module.borrow().name().to_string();

        self.register_module(module);
        self.use_modules(&[ ModuleSpec::Prefixed(name, prefix.to_string()) ])
    }
}


impl Default for ForthicInterpreter
{
    fn default() -> Self
    {
        Self::new()
    }
}



#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn strings_and_literals_are_pushed()
    {
        let mut interpreter = ForthicInterpreter::new();

        interpreter.run("'hello' 42 1.5 TRUE .sym").unwrap();

        assert_eq!(interpreter.stack().items(),
                   &[ Value::from("hello"),
                      Value::Int(42),
                      Value::Float(1.5),
                      Value::Bool(true),
                      Value::from("sym") ]);
    }

    #[test]
    fn unknown_words_fail_with_their_location()
    {
        let mut interpreter = ForthicInterpreter::new();
        let error = interpreter.run("1\n  NOPE").unwrap_err();

        assert_eq!(error.kind(), &ErrorKind::UnknownWord("NOPE".to_string()));

        let location = error.location().clone().unwrap();
        assert_eq!(( location.line(), location.column() ), ( 2, 3 ));
    }

    #[test]
    fn definitions_record_their_source_text()
    {
        let mut interpreter = ForthicInterpreter::new();

        interpreter.run(": PUSH-TWO   1 2 ;").unwrap();

        let word = interpreter.find_word("PUSH-TWO").unwrap();
        assert_eq!(word.to_string(), ": PUSH-TWO   1 2 ;");
    }

    #[test]
    fn module_words_are_scoped()
    {
        let mut interpreter = ForthicInterpreter::new();

        interpreter.run("{inner : X 7 ; X }").unwrap();
        assert_eq!(interpreter.pop().unwrap(), Value::Int(7));

        let error = interpreter.run("X").unwrap_err();
        assert_eq!(error.kind(), &ErrorKind::UnknownWord("X".to_string()));

        interpreter.run("{inner X }").unwrap();
        assert_eq!(interpreter.pop().unwrap(), Value::Int(7));
        assert!(interpreter.find_module("inner").is_ok());
    }

    #[test]
    fn leaving_the_app_module_fails()
    {
        let mut interpreter = ForthicInterpreter::new();
        let error = interpreter.run("}").unwrap_err();

        assert!(matches!(error.kind(), ErrorKind::Module { .. }));
    }

    #[test]
    fn literal_handlers_registered_later_win()
    {
        let mut interpreter = ForthicInterpreter::new();

        interpreter.register_literal_handler(Rc::new(|text: &str|
            {
                text.strip_suffix('%')
                    .and_then(|number| number.parse::<f64>().ok())
                    .map(|number| Value::Float(number / 100.0))
            }));

        interpreter.register_literal_handler(Rc::new(|text: &str|
            {
                ( text == "42" ).then(|| Value::from("forty-two"))
            }));

        interpreter.run("50% 42 43").unwrap();

        assert_eq!(interpreter.stack().items(),
                   &[ Value::Float(0.5), Value::from("forty-two"), Value::Int(43) ]);
    }

    #[test]
    fn reset_returns_to_the_app_module()
    {
        let mut interpreter = ForthicInterpreter::new();

        interpreter.run("1 2 {deep").unwrap();
        interpreter.reset();

        assert!(interpreter.stack().is_empty());
        assert!(Rc::ptr_eq(&interpreter.current_module(), &interpreter.app_module()));
    }
}
