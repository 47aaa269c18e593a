use forthic::{
    CodeManagement, ErrorKind, ForthicInterpreter, Interpreter, InterpreterStack, Result, Value, WordManagement,
    add_native_word, register_core_words, runtime::error::script_error_str,
};
use test_case::test_case;

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
    add_native_word!(interpreter, "*", word_multiply);
    add_native_word!(interpreter, "FAIL", word_fail);

    interpreter
}

fn stream(chunks: &[&str]) -> Result<Vec<Value>> {
    let mut interpreter = new_interpreter();

    for chunk in chunks {
        interpreter.streaming_run(chunk, false)?;
    }

    interpreter.streaming_run("", true)?;
    Ok(interpreter.stack().items().to_vec())
}

#[test_case(&["1 2 3"], &[1, 2, 3] ; "single chunk")]
#[test_case(&["1", "2", " 3"], &[12, 3] ; "numbers split without a space join")]
#[test_case(&["1 ", "2 ", "3"], &[1, 2, 3] ; "chunks ending in spaces")]
#[test_case(&[": DOUBLE 2 ", "* ;", " 21 DOUBLE"], &[42] ; "definition across chunks")]
#[test_case(&[": DOU", "BLE 2 * ; 4 DOUBLE"], &[8] ; "definition name across chunks")]
fn streamed_integers(chunks: &[&str], expected: &[i64]) {
    let expected: Vec<Value> = expected.iter().map(|value| Value::Int(*value)).collect();
    assert_eq!(stream(chunks).unwrap(), expected);
}

#[test]
fn complete_tokens_run_before_the_stream_ends() {
    let mut interpreter = new_interpreter();

    interpreter.streaming_run("1 2", false).unwrap();
    assert_eq!(interpreter.stack().items(), &[Value::Int(1)]);

    interpreter.streaming_run(" 3", false).unwrap();
    assert_eq!(interpreter.stack().items(), &[Value::Int(1), Value::Int(2)]);

    interpreter.streaming_run("", true).unwrap();
    assert_eq!(
        interpreter.stack().items(),
        &[Value::Int(1), Value::Int(2), Value::Int(3)]
    );
}

#[test]
fn strings_can_span_chunks() {
    let stack = stream(&["'hello ", "world' '''a", "'b'''"]).unwrap();

    assert_eq!(stack, vec![Value::from("hello world"), Value::from("a'b")]);
}

#[test]
fn arrays_can_span_chunks() {
    let stack = stream(&["[1 [2", "] 3", "]"]).unwrap();

    let expected = Value::new_array(vec![
        Value::Int(1),
        Value::new_array(vec![Value::Int(2)]),
        Value::Int(3),
    ]);

    assert_eq!(stack, vec![expected]);
}

#[test]
fn locations_continue_across_chunks() {
    let mut interpreter = new_interpreter();

    interpreter.streaming_run("1\n", false).unwrap();

    let error = interpreter.streaming_run("  NOPE", true).unwrap_err();
    let location = error.location().clone().unwrap();

    assert_eq!(error.kind(), &ErrorKind::UnknownWord("NOPE".to_string()));
    assert_eq!((location.line(), location.column()), (2, 3));
}

#[test_case(&[": RISKY 1 ", "FAIL ;", " RISKY"] ; "split after a space")]
#[test_case(&[": RISKY 1", " FAIL ;", " RISKY"] ; "split before a space")]
#[test_case(&[": RIS", "KY 1 F", "AIL ; RISKY"] ; "split inside words")]
fn definitions_keep_their_source_across_chunks(chunks: &[&str]) {
    let mut interpreter = new_interpreter();
    let (last, rest) = chunks.split_last().unwrap();

    for chunk in rest {
        interpreter.streaming_run(chunk, false).unwrap();
    }

    let error = interpreter.streaming_run(last, true).unwrap_err();
    assert_eq!(error.source_text().as_deref(), Some(": RISKY 1 FAIL ;"));
}

#[test]
fn an_open_definition_at_the_end_is_an_error() {
    let mut interpreter = new_interpreter();

    interpreter.streaming_run(": OPEN 1 ", false).unwrap();

    let error = interpreter.streaming_run("2", true).unwrap_err();
    assert_eq!(error.kind(), &ErrorKind::MissingSemicolon("OPEN".to_string()));
}

#[test]
fn errors_clear_the_pending_input() {
    let mut interpreter = new_interpreter();

    assert!(interpreter.streaming_run("NOPE 1 2", false).is_err());

    interpreter.streaming_run("5", true).unwrap();
    assert_eq!(interpreter.stack().items(), &[Value::Int(5)]);
}
