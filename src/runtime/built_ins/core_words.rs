use crate::{
    add_native_word,
    runtime::{
        data_structures::{value::Value, word_options::WordOptions},
        error::{self, ErrorKind, interpreter_error, script_error},
        interpreter::{Interpreter, ModuleSpec},
    },
};
use std::rc::Rc;

/// Pop an array whose items must all be strings.
fn pop_names(interpreter: &mut dyn Interpreter) -> error::Result<Vec<String>> {
    let array = interpreter.pop_as_array()?;
    let mut names = Vec::with_capacity(array.borrow().len());

    for item in array.borrow().iter() {
        match item {
            Value::String(name) => names.push(name.clone()),
            other => return script_error(interpreter, format!("Expected a name, found {:?}.", other)),
        }
    }

    Ok(names)
}

/// Create variables in the current module.  Existing variables are left as they are.
///
/// Signature: `names -- `
fn word_variables(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let names = pop_names(interpreter)?;
    let module = interpreter.current_module();

    for name in names {
        if name.starts_with("__") {
            return interpreter_error(interpreter, ErrorKind::InvalidVariableName(name));
        }

        module.borrow_mut().add_variable(&name, Value::None)?;
    }

    Ok(())
}

/// Store a value in a variable.
///
/// Signature: `value variable -- `
fn word_store(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let variable = interpreter.pop_as_variable()?;
    let value = interpreter.pop()?;

    variable.borrow_mut().set_value(value);
    Ok(())
}

/// Read the value of a variable.
///
/// Signature: `variable -- value`
fn word_fetch(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let variable = interpreter.pop_as_variable()?;
    let value = variable.borrow().value();

    interpreter.push(value);
    Ok(())
}

/// Store a value in a variable and push it back.
///
/// Signature: `value variable -- value`
fn word_store_fetch(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let variable = interpreter.pop_as_variable()?;
    let value = interpreter.pop()?;

    variable.borrow_mut().set_value(value.clone());
    interpreter.push(value);
    Ok(())
}

/// Mark words of the current module as exportable.
///
/// Signature: `names -- `
fn word_export(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let names = pop_names(interpreter)?;

    interpreter.current_module().borrow_mut().add_exportable(&names);
    Ok(())
}

/// Import registered modules into the app module.  Each item is either a module name, imported
/// under it's own name, or a `[ name prefix ]` pair.
///
/// Signature: `specs -- `
fn word_use_modules(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let array = interpreter.pop_as_array()?;
    let items = array.borrow().to_vec();
    let mut specs = Vec::with_capacity(items.len());

    for item in items {
        let spec = match &item {
            Value::String(name) => Some(ModuleSpec::Name(name.clone())),
            Value::Vec(pair) => {
                let pair = pair.borrow();

                match (pair.get(0), pair.get(1), pair.len()) {
                    (Some(Value::String(name)), Some(Value::String(prefix)), 2) => {
                        Some(ModuleSpec::Prefixed(name.clone(), prefix.clone()))
                    }
                    _ => None,
                }
            }
            _ => None,
        };

        match spec {
            Some(spec) => specs.push(spec),
            None => {
                return script_error(
                    interpreter,
                    format!("Expected a module name or [ name prefix ], found {:?}.", item),
                );
            }
        }
    }

    interpreter.use_modules(&specs)
}

/// Run a string of Forthic code.
///
/// Signature: `code -- <code-results>`
fn word_interpret(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let code = interpreter.pop_as_string()?;
    interpreter.run(&code)
}

/// Build word options from a flat list of keys and values.
///
/// Signature: `[ key value ... ] -- options`
fn word_options(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let array = interpreter.pop_as_array()?;
    let options = WordOptions::from_flat(&array.borrow().to_vec())?;

    interpreter.push(Value::Options(Rc::new(options)));
    Ok(())
}

/// Log the contents of the stack and stop the program.
///
/// Signature: ` -- `
fn word_stack_dump(interpreter: &mut dyn Interpreter) -> error::Result<()> {
    let dump = interpreter.stack().to_string();

    log_debug!("Stack:\n{}", dump);
    interpreter_error(interpreter, ErrorKind::IntentionalStop(dump))
}

/// Register the words that manage variables, modules, options and code evaluation.  Everything
/// else, (arithmetic, collections, strings and so on,) is left to the host.
pub fn register_core_words(interpreter: &mut dyn Interpreter) {
    add_native_word!(interpreter, "VARIABLES", word_variables);
    add_native_word!(interpreter, "!", word_store);
    add_native_word!(interpreter, "@", word_fetch);
    add_native_word!(interpreter, "!@", word_store_fetch);
    add_native_word!(interpreter, "EXPORT", word_export);
    add_native_word!(interpreter, "USE-MODULES", word_use_modules);
    add_native_word!(interpreter, "INTERPRET", word_interpret);
    add_native_word!(interpreter, "~>", word_options);
    add_native_word!(interpreter, "STACK-DUMP", word_stack_dump);
}
