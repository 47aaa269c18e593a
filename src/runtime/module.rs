use std::{ cell::RefCell,
           collections::{ BTreeMap,
                          BTreeSet,
                          HashMap,
                          HashSet },
           rc::Rc };
use crate::{ lang::source_buffer::CodeLocation,
             runtime::{ data_structures::{ value::Value,
                                           variable::{ Variable,
                                                       VariablePtr } },
                        error::{ self,
                                 ErrorKind,
                                 ScriptError },
                        interpreter::Interpreter,
                        word::{ Word,
                                WordPtr } } };



/// A reference to a module.  Modules are mutated in place as words and variables are added to
/// them.
pub type ModulePtr = Rc<RefCell<Module>>;



/// A module is a namespace of words and variables.  Modules can hold child modules, and can import
/// the exported words of other modules, either directly or under a prefix.
///
/// Importing a module always works on a copy of it, so that importers never share the variables
/// of the module they imported.
#[derive(Default)]
pub struct Module
{
    name: String,

    /// Forthic code run in each copy of the module as it is imported.
    code: String,

    /// The words in the order they were added.  The same name may appear more than once, the last
    /// one added is the one that is found.
    words: Vec<WordPtr>,

    exportable: HashSet<String>,
    variables: HashMap<String, VariablePtr>,

    /// Child modules by name.
    modules: HashMap<String, ModulePtr>,

    /// The prefixes each child module was imported under.
    module_prefixes: BTreeMap<String, BTreeSet<String>>
}


impl Module
{
    pub fn new(name: &str) -> Module
    {
        Module { name: name.to_string(), ..Module::default() }
    }

    /// A module that runs the given Forthic code each time it is imported.  The code usually
    /// defines the module's words and marks them with EXPORT.
    pub fn with_code(name: &str, code: &str) -> Module
    {
        Module { name: name.to_string(), code: code.to_string(), ..Module::default() }
    }

    pub fn into_ptr(self) -> ModulePtr
    {
        Rc::new(RefCell::new(self))
    }

    pub fn name(&self) -> &str
    {
        &self.name
    }

    pub fn code(&self) -> &str
    {
        &self.code
    }

    pub fn words(&self) -> &[WordPtr]
    {
        &self.words
    }

    pub fn add_word(&mut self, word: WordPtr)
    {
        self.words.push(word);
    }

    /// Add a word and mark it's name as exportable.
    pub fn add_exportable_word(&mut self, word: WordPtr)
    {
        self.exportable.insert(word.name().to_string());
        self.words.push(word);
    }

    /// Mark names as exportable.  The words themselves may be added before or after.
    pub fn add_exportable(&mut self, names: &[String])
    {
        self.exportable.extend(names.iter().cloned());
    }

    pub fn is_exportable(&self, name: &str) -> bool
    {
        self.exportable.contains(name)
    }

    /// The words whose names are exportable, in the order they were added.
    pub fn exportable_words(&self) -> Vec<WordPtr>
    {
        self.words
            .iter()
            .filter(|word| self.exportable.contains(word.name()))
            .cloned()
            .collect()
    }

    /// Add the memo word for a definition along with it's `NAME!` and `NAME!@` companions.
    pub fn add_memo_words(&mut self, definition: WordPtr)
    {
        let ( memo, refresh, refresh_and_push ) = Word::memo_words(definition);

        self.words.push(memo);
        self.words.push(refresh);
        self.words.push(refresh_and_push);
    }

    /// Create a variable with the given initial value.  An existing variable of the same name is
    /// left alone.  Names starting with `__` are reserved.
    pub fn add_variable(&mut self, name: &str, value: Value) -> error::Result<()>
    {
        if name.starts_with("__")
        {
            return ScriptError::new_as_result(ErrorKind::InvalidVariableName(name.to_string()),
                                              None,
                                              None);
        }

        if !self.variables.contains_key(name)
        {
            let _ = self.variables.insert(name.to_string(), Variable::new(name, value));
        }

        Ok(())
    }

    pub fn find_variable(&self, name: &str) -> Option<VariablePtr>
    {
        self.variables.get(name).cloned()
    }

    /// Look a name up in the dictionary, newest word first.
    pub fn find_dictionary_word(&self, name: &str) -> Option<WordPtr>
    {
        self.words.iter().rev().find(|word| word.name() == name).cloned()
    }

    /// Look a name up in the dictionary and then in the variables.  A variable is found as a word
    /// that pushes the variable itself.
    pub fn find_word(&self, name: &str) -> Option<WordPtr>
    {
        self.find_dictionary_word(name)
            .or_else(|| self.find_variable(name)
                            .map(|variable| Word::push_variable(&self.name, variable)))
    }

    pub fn find_module(&self, name: &str) -> Option<ModulePtr>
    {
        self.modules.get(name).cloned()
    }

    pub fn add_child_module(&mut self, module: ModulePtr)
    {
        let name = module.borrow().name().to_string();
        let _ = self.modules.insert(name, module);
    }

    /// The prefixes a child module was imported under.
    pub fn import_prefixes(&self, module_name: &str) -> Vec<String>
    {
        self.module_prefixes
            .get(module_name)
            .map(|prefixes| prefixes.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Make a structural copy.  The words, exportable names and child modules are shared with
    /// this module, while each variable gets a fresh cell holding the same value.  Import records
    /// are not carried over.
    pub fn dup(&self) -> Module
    {
        Module
            {
                name: self.name.clone(),
                code: self.code.clone(),
                words: self.words.clone(),
                exportable: self.exportable.clone(),
                variables: self.variables
                               .iter()
                               .map(|( name, variable )| ( name.clone(), variable.borrow().dup() ))
                               .collect(),
                modules: self.modules.clone(),
                module_prefixes: BTreeMap::new()
            }
    }

    /// Duplicate the module and then replay each of it's imports into the duplicate, so that the
    /// copy gets it's own copies of the imported modules rather than sharing them.
    pub fn copy(source: &ModulePtr, interpreter: &mut dyn Interpreter) -> error::Result<ModulePtr>
    {
        let ( result, imports ) =
            {
                let module = source.borrow();
                let mut imports = Vec::new();

                for ( module_name, prefixes ) in &module.module_prefixes
                {
                    if let Some(imported) = module.modules.get(module_name)
                    {
                        for prefix in prefixes
                        {
                            imports.push(( prefix.clone(), imported.clone() ));
                        }
                    }
                }

                ( module.dup().into_ptr(), imports )
            };

        for ( prefix, imported ) in imports
        {
            Module::import_module(&result, &prefix, &imported, interpreter)?;
        }

        Ok(result)
    }

    /// Import the exported words of source into target.  The source is duplicated first, (or
    /// copied if it has imports of it's own,) and it's code is run in the duplicate.  Each word is
    /// wrapped to run with the duplicate as it's current module, named `prefix.name`, or just
    /// `name` with an empty prefix.
    pub fn import_module(target: &ModulePtr,
                         prefix: &str,
                         source: &ModulePtr,
                         interpreter: &mut dyn Interpreter) -> error::Result<()>
    {
        let has_imports = !source.borrow().module_prefixes.is_empty();

        let imported = if has_imports
            {
                Module::copy(source, interpreter)?
            }
            else
            {
                source.borrow().dup().into_ptr()
            };

        Module::initialize(&imported, interpreter)?;

        let ( module_name, words ) =
            {
                let module = imported.borrow();
                ( module.name.clone(), module.exportable_words() )
            };

        log_debug!("Importing {} word(s) from {} as {:?}.", words.len(), module_name, prefix);

        let mut target_module = target.borrow_mut();

        for word in words
        {
            target_module.add_word(Word::imported(prefix, word, imported.clone()));
        }

        let _ = target_module.modules.insert(module_name.clone(), imported);

        target_module.module_prefixes
                     .entry(module_name)
                     .or_default()
                     .insert(prefix.to_string());

        Ok(())
    }

    /// Run the module's code with the module as the current module.
    pub fn initialize(module: &ModulePtr, interpreter: &mut dyn Interpreter) -> error::Result<()>
    {
        let ( name, code ) =
            {
                let module = module.borrow();
                ( module.name.clone(), module.code.clone() )
            };

        if code.is_empty()
        {
            return Ok(());
        }

        log_trace!("Initializing module {}.", name);

        let reference = CodeLocation::new_from_source(&format!("<module {}>", name));

        interpreter.module_stack_push(module.clone());

        let result = interpreter.run_with_location(&code, Some(reference));
        let popped = interpreter.module_stack_pop();

        result.map_err(|error|
            {
                let kind = ErrorKind::Module { module: name.clone(),
                                               message: "failed to initialize".to_string() };

                ScriptError::new(kind, None, error.call_stack().clone()).with_cause(error)
            })?;

        popped.map(|_| ())
    }
}



#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn later_words_shadow_earlier_ones()
    {
        let mut module = Module::new("test");

        module.add_word(Word::push_value("W", Value::Int(1), None));
        module.add_word(Word::push_value("W", Value::Int(2), None));

        let found = module.find_word("W").unwrap();

        assert!(matches!(found.kind(), crate::runtime::word::WordKind::PushValue(Value::Int(2))));
    }

    #[test]
    fn variables_are_found_after_words()
    {
        let mut module = Module::new("test");

        module.add_variable("x", Value::Int(5)).unwrap();

        let found = module.find_word("x").unwrap();
        assert!(matches!(found.kind(), crate::runtime::word::WordKind::PushVariable { .. }));

        module.add_word(Word::push_value("x", Value::Int(1), None));

        let found = module.find_word("x").unwrap();
        assert!(matches!(found.kind(), crate::runtime::word::WordKind::PushValue(_)));
    }

    #[test]
    fn reserved_variable_names_are_rejected()
    {
        let mut module = Module::new("test");
        let error = module.add_variable("__hidden", Value::None).unwrap_err();

        assert_eq!(error.kind(), &ErrorKind::InvalidVariableName("__hidden".to_string()));
    }

    #[test]
    fn dup_gives_fresh_variable_cells_and_shares_words()
    {
        let mut module = Module::new("test");

        module.add_variable("x", Value::Int(1)).unwrap();
        module.add_exportable_word(Word::push_value("W", Value::Int(1), None));

        let copy = module.dup();

        copy.find_variable("x").unwrap().borrow_mut().set_value(Value::Int(2));

        assert_eq!(module.find_variable("x").unwrap().borrow().value(), Value::Int(1));
        assert!(Rc::ptr_eq(&module.words()[0], &copy.words()[0]));
        assert!(copy.is_exportable("W"));
    }

    #[test]
    fn only_exportable_words_are_exported()
    {
        let mut module = Module::new("test");

        module.add_word(Word::push_value("A", Value::Int(1), None));
        module.add_word(Word::push_value("B", Value::Int(2), None));
        module.add_exportable(&[ "B".to_string() ]);

        let names: Vec<String> = module.exportable_words()
                                       .iter()
                                       .map(|word| word.name().to_string())
                                       .collect();

        assert_eq!(names, vec![ "B".to_string() ]);
    }

    #[test]
    fn memo_words_come_in_threes()
    {
        let mut module = Module::new("test");
        let definition = Word::definition("M", Vec::new(), None, None);

        module.add_memo_words(definition);

        assert!(module.find_word("M").is_some());
        assert!(module.find_word("M!").is_some());
        assert!(module.find_word("M!@").is_some());
    }
}
