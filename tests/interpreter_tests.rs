use std::{cell::Cell, rc::Rc};

use forthic::{
    CodeManagement, ErrorKind, ForthicInterpreter, Interpreter, InterpreterStack, Result,
    ScriptError, Value, Word, WordManagement, add_native_word, register_core_words,
    runtime::error::script_error_str,
};
use test_case::test_case;

fn word_add(interpreter: &mut dyn Interpreter) -> Result<()> {
    let b = interpreter.pop_as_int()?;
    let a = interpreter.pop_as_int()?;

    interpreter.push(Value::Int(a + b));
    Ok(())
}

fn word_multiply(interpreter: &mut dyn Interpreter) -> Result<()> {
    let b = interpreter.pop_as_int()?;
    let a = interpreter.pop_as_int()?;

    interpreter.push(Value::Int(a * b));
    Ok(())
}

fn word_fail(interpreter: &mut dyn Interpreter) -> Result<()> {
    script_error_str(interpreter, "FAIL always fails.")
}

fn new_interpreter() -> ForthicInterpreter {
    let mut interpreter = ForthicInterpreter::new();

    register_core_words(&mut interpreter);
    add_native_word!(interpreter, "+", word_add);
    add_native_word!(interpreter, "*", word_multiply);
    add_native_word!(interpreter, "FAIL", word_fail);

    interpreter
}

fn run_and_stack(code: &str) -> Result<Vec<Value>> {
    let mut interpreter = new_interpreter();

    interpreter.run(code)?;
    Ok(interpreter.stack().items().to_vec())
}

fn run_error(code: &str) -> ScriptError {
    match run_and_stack(code) {
        Ok(stack) => panic!("Expected {:?} to fail, but it left {:?}", code, stack),
        Err(error) => error,
    }
}

#[test]
fn double_definition() {
    assert_eq!(run_and_stack(": DOUBLE 2 * ;  21 DOUBLE").unwrap(), vec![Value::Int(42)]);
}

#[test]
fn redefinition_uses_the_latest_word() {
    assert_eq!(run_and_stack(": W 1 ; : W 2 ; W").unwrap(), vec![Value::Int(2)]);
}

#[test]
fn definitions_see_redefinitions_made_before_they_were_compiled() {
    let stack = run_and_stack(": A 1 ; : B A ; : A 2 ; B A").unwrap();

    assert_eq!(stack, vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn nested_arrays_keep_their_order() {
    let stack = run_and_stack("[1 2 [3 4] 5]").unwrap();

    let expected = Value::new_array(vec![
        Value::Int(1),
        Value::Int(2),
        Value::new_array(vec![Value::Int(3), Value::Int(4)]),
        Value::Int(5),
    ]);

    assert_eq!(stack, vec![expected]);
}

#[test]
fn arrays_can_be_built_by_definitions() {
    let stack = run_and_stack(": PAIR [ 1 2 ] ; PAIR []").unwrap();

    assert_eq!(
        stack,
        vec![
            Value::new_array(vec![Value::Int(1), Value::Int(2)]),
            Value::new_array(vec![])
        ]
    );
}

#[test]
fn memo_words_compute_once() {
    let mut interpreter = new_interpreter();
    let count = Rc::new(Cell::new(0));
    let counter = count.clone();

    add_native_word!(
        interpreter,
        "TICK",
        move |interpreter: &mut dyn Interpreter| -> Result<()> {
            counter.set(counter.get() + 1);
            interpreter.push(Value::Int(counter.get()));
            Ok(())
        }
    );

    interpreter.run("@: X TICK ;  X X").unwrap();
    assert_eq!(count.get(), 1);

    interpreter.run("X!").unwrap();
    assert_eq!(count.get(), 2);

    interpreter.run("X").unwrap();
    assert_eq!(count.get(), 2);

    assert_eq!(
        interpreter.stack().items(),
        &[Value::Int(1), Value::Int(1), Value::Int(2)]
    );

    interpreter.run("X!@").unwrap();
    assert_eq!(count.get(), 3);
    assert_eq!(interpreter.pop().unwrap(), Value::Int(3));
}

#[test]
fn missing_semicolon_at_end_of_input() {
    let error = run_error(": X 1");
    assert_eq!(error.kind(), &ErrorKind::MissingSemicolon("X".to_string()));
}

#[test]
fn missing_semicolon_before_next_definition() {
    let error = run_error(": A 1 : B 2 ;");
    assert_eq!(error.kind(), &ErrorKind::MissingSemicolon("A".to_string()));
}

#[test]
fn extra_semicolon() {
    let error = run_error("1 ;");
    assert_eq!(error.kind(), &ErrorKind::ExtraSemicolon);
}

#[test]
fn pop_from_a_new_interpreter_underflows() {
    let mut interpreter = ForthicInterpreter::new();
    let error = interpreter.pop().unwrap_err();

    assert_eq!(error.kind(), &ErrorKind::StackUnderflow);
}

#[test]
fn native_failures_are_wrapped() {
    let error = run_error("1 +");

    assert_eq!(error.kind(), &ErrorKind::WordExecution("+".to_string()));
    assert_eq!(error.root_cause().kind(), &ErrorKind::StackUnderflow);
}

#[test]
fn unknown_words() {
    let error = run_error("1 2 PLUS");
    assert_eq!(error.kind(), &ErrorKind::UnknownWord("PLUS".to_string()));
}

#[test]
fn words_are_resolved_when_compiled() {
    let error = run_error(": X MISSING ;");
    assert_eq!(error.kind(), &ErrorKind::UnknownWord("MISSING".to_string()));
}

#[test]
fn errors_carry_the_definition_source() {
    let error = run_error(": INNER 1 FAIL ;\n: OUTER INNER ;\nOUTER");

    assert_eq!(error.source_text().as_deref(), Some(": INNER 1 FAIL ;"));

    let location = error.location().clone().unwrap();
    assert_eq!((location.line(), location.column()), (1, 11));
}

#[test]
fn error_handlers_resume_the_enclosing_definition() {
    let mut interpreter = new_interpreter();

    interpreter.run(": RISKY 1 FAIL 2 ;").unwrap();

    let risky = interpreter.find_word("RISKY").unwrap();

    risky.add_error_handler(Rc::new(
        |_error: &ScriptError, _word: &Word, interpreter: &mut dyn Interpreter| -> Result<()> {
            interpreter.push(Value::from("handled"));
            Ok(())
        },
    ));

    interpreter.run("RISKY").unwrap();

    assert_eq!(
        interpreter.stack().items(),
        &[Value::Int(1), Value::from("handled"), Value::Int(2)]
    );
}

#[test]
fn error_handlers_are_tried_in_order() {
    let mut interpreter = new_interpreter();
    let fail = interpreter.find_word("FAIL").unwrap();

    fail.add_error_handler(Rc::new(
        |error: &ScriptError, _word: &Word, _interpreter: &mut dyn Interpreter| -> Result<()> {
            Err(error.clone())
        },
    ));

    fail.add_error_handler(Rc::new(
        |error: &ScriptError, word: &Word, interpreter: &mut dyn Interpreter| -> Result<()> {
            interpreter.push(Value::from(format!("{} {}", word.name(), error.kind())));
            Ok(())
        },
    ));

    fail.add_error_handler(Rc::new(
        |_error: &ScriptError, _word: &Word, interpreter: &mut dyn Interpreter| -> Result<()> {
            interpreter.push(Value::from("never"));
            Ok(())
        },
    ));

    interpreter.run("FAIL 3").unwrap();

    assert_eq!(
        interpreter.stack().items(),
        &[
            Value::from("FAIL Error while executing word FAIL."),
            Value::Int(3)
        ]
    );
}

#[test]
fn unhandled_errors_stop_the_definition() {
    let mut interpreter = new_interpreter();
    let error = interpreter.run(": RISKY 1 FAIL 2 ; RISKY").unwrap_err();

    assert!(matches!(error.kind(), ErrorKind::WordExecution(_)));
    assert_eq!(interpreter.stack().items(), &[Value::Int(1)]);
}

#[test]
fn call_stack_is_reported() {
    let error = run_error(": INNER FAIL ; : OUTER INNER ; OUTER");

    let names: Vec<String> = error
        .call_stack()
        .clone()
        .unwrap_or_default()
        .iter()
        .map(|item| item.word().clone())
        .collect();

    assert_eq!(names, vec!["OUTER", "INNER", "FAIL"]);
}

#[test_case("TRUE FALSE", vec![Value::Bool(true), Value::Bool(false)] ; "booleans")]
#[test_case("1_000 -5", vec![Value::Int(1000), Value::Int(-5)] ; "integers")]
#[test_case("2.5 -0.5", vec![Value::Float(2.5), Value::Float(-0.5)] ; "floats")]
#[test_case("'single' \"double\" ^caret^", vec![Value::from("single"), Value::from("double"), Value::from("caret")] ; "strings")]
#[test_case("'''it's'''", vec![Value::from("it's")] ; "triple quoted")]
#[test_case(".name", vec![Value::from("name")] ; "dot symbol")]
#[test_case("# comment\n7", vec![Value::Int(7)] ; "comments")]
#[test_case("(1, 2)", vec![Value::Int(1), Value::Int(2)] ; "parens and commas are whitespace")]
fn literals(code: &str, expected: Vec<Value>) {
    assert_eq!(run_and_stack(code).unwrap(), expected);
}

#[test]
fn date_and_time_literals() {
    let stack = run_and_stack("2024-01-15 9:30PM 2025-05-20T08:00:00[UTC]").unwrap();

    assert!(stack[0].is_date());
    assert!(stack[1].is_time());
    assert!(stack[2].is_date_time());
    assert_eq!(stack[2].to_string(), "2025-05-20T08:00:00+00:00");
}

#[test]
fn words_containing_t_absorb_brackets() {
    // A word with a T in it is assumed to be a date-time with a bracketed zone.
    let error = run_error("ITEMS[1 2]");
    assert_eq!(error.kind(), &ErrorKind::UnknownWord("ITEMS[1 2]".to_string()));

    let error = run_error("NAMES[1 2]");
    assert_eq!(error.kind(), &ErrorKind::UnknownWord("NAMES".to_string()));
}

#[test]
fn html_entities_are_unescaped() {
    let mut interpreter = new_interpreter();

    add_native_word!(
        interpreter,
        "<",
        |interpreter: &mut dyn Interpreter| -> Result<()> {
            let b = interpreter.pop_as_int()?;
            let a = interpreter.pop_as_int()?;

            interpreter.push(Value::Bool(a < b));
            Ok(())
        }
    );

    interpreter.run("1 2 &lt;").unwrap();
    assert_eq!(interpreter.pop().unwrap(), Value::Bool(true));
}

#[test]
fn interpret_shares_the_stack_and_definitions() {
    let stack = run_and_stack("3 ': TRIPLE 3 * ;' INTERPRET TRIPLE").unwrap();
    assert_eq!(stack, vec![Value::Int(9)]);
}

#[test]
fn execute_word_named_from_the_host() {
    let mut interpreter = new_interpreter();

    interpreter.push(Value::Int(20));
    interpreter.push(Value::Int(22));
    interpreter.execute_word_named("+").unwrap();

    assert_eq!(interpreter.pop().unwrap(), Value::Int(42));
    assert_eq!(interpreter.stack_max_depth(), 2);
}

#[test]
fn is_compiling_tracks_open_definitions() {
    let mut interpreter = new_interpreter();

    assert!(!interpreter.is_compiling());
    interpreter.streaming_run(": X 1 ", false).unwrap();
    assert!(interpreter.is_compiling());
    interpreter.streaming_run(";", true).unwrap();
    assert!(!interpreter.is_compiling());
}
