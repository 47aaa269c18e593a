use forthic::{
    CodeManagement, ErrorKind, ForthicInterpreter, Interpreter, InterpreterStack, Module,
    ModuleManagement, ModulePtr, Result, RuntimeInfo, Value, Word, WordManagement,
    add_native_word, register_core_words,
};
use std::rc::Rc;

const COUNTER_CODE: &str = "
    ['count'] VARIABLES
    0 count !

    : INC    count @ 1 + count ! ;
    : VALUE  count @ ;

    ['INC' 'VALUE'] EXPORT
";

fn word_add(interpreter: &mut dyn Interpreter) -> Result<()> {
    let b = interpreter.pop_as_int()?;
    let a = interpreter.pop_as_int()?;

    interpreter.push(Value::Int(a + b));
    Ok(())
}

fn new_interpreter() -> ForthicInterpreter {
    let mut interpreter = ForthicInterpreter::new();

    register_core_words(&mut interpreter);
    add_native_word!(interpreter, "+", word_add);

    interpreter
}

fn counter_module() -> ModulePtr {
    Module::with_code("counter", COUNTER_CODE).into_ptr()
}

fn stack_of(interpreter: &ForthicInterpreter) -> Vec<Value> {
    interpreter.stack().items().to_vec()
}

#[test]
fn prefixed_imports_do_not_share_variables() {
    let mut interpreter = new_interpreter();

    interpreter.register_module(counter_module());
    interpreter
        .use_modules(&[("counter", "a").into(), ("counter", "b").into()])
        .unwrap();

    interpreter.run("a.INC a.INC b.INC  a.VALUE b.VALUE").unwrap();

    assert_eq!(stack_of(&interpreter), vec![Value::Int(2), Value::Int(1)]);
}

#[test]
fn a_bare_name_is_its_own_prefix() {
    let mut interpreter = new_interpreter();

    interpreter.register_module(counter_module());
    interpreter.use_modules(&["counter".into()]).unwrap();

    interpreter.run("counter.INC counter.VALUE").unwrap();

    assert_eq!(stack_of(&interpreter), vec![Value::Int(1)]);
}

#[test]
fn an_empty_prefix_merges_the_words() {
    let mut interpreter = new_interpreter();

    interpreter.register_module(counter_module());
    interpreter.use_modules(&[("counter", "").into()]).unwrap();

    interpreter.run("INC INC VALUE").unwrap();

    assert_eq!(stack_of(&interpreter), vec![Value::Int(2)]);
}

#[test]
fn an_empty_prefix_import_does_not_touch_the_original() {
    let mut interpreter = new_interpreter();

    interpreter
        .run(
            "{counter ['count'] VARIABLES 0 count ! \
               : INC count @ 1 + count ! ; \
               : VALUE count @ ; \
               ['INC' 'VALUE'] EXPORT }",
        )
        .unwrap();

    interpreter
        .run("[['counter' '']] USE-MODULES INC INC VALUE")
        .unwrap();
    interpreter
        .run("[['counter' 'p']] USE-MODULES p.VALUE")
        .unwrap();

    assert_eq!(stack_of(&interpreter), vec![Value::Int(2), Value::Int(0)]);
}

#[test]
fn empty_prefix_imports_each_get_their_own_copy() {
    let mut interpreter = new_interpreter();

    interpreter.register_module(counter_module());
    interpreter.use_modules(&[("counter", "").into()]).unwrap();
    interpreter.run("INC INC").unwrap();

    interpreter.use_modules(&[("counter", "").into()]).unwrap();
    interpreter.run("VALUE").unwrap();

    assert_eq!(stack_of(&interpreter), vec![Value::Int(0)]);
}

#[test]
fn use_modules_word_accepts_names_and_pairs() {
    let mut interpreter = new_interpreter();

    interpreter.register_module(counter_module());
    interpreter
        .run("['counter' ['counter' 'c']] USE-MODULES  counter.INC  c.VALUE counter.VALUE")
        .unwrap();

    assert_eq!(stack_of(&interpreter), vec![Value::Int(0), Value::Int(1)]);
}

#[test]
fn unexported_words_stay_private() {
    let mut interpreter = new_interpreter();

    interpreter
        .import_module(
            Module::with_code("private", ": HIDDEN 1 ; : SHOWN HIDDEN ; ['SHOWN'] EXPORT")
                .into_ptr(),
            "p",
        )
        .unwrap();

    interpreter.run("p.SHOWN").unwrap();
    assert_eq!(interpreter.pop().unwrap(), Value::Int(1));

    let error = interpreter.run("p.HIDDEN").unwrap_err();
    assert_eq!(error.kind(), &ErrorKind::UnknownWord("p.HIDDEN".to_string()));
}

#[test]
fn unknown_modules() {
    let mut interpreter = new_interpreter();
    let error = interpreter.use_modules(&["missing".into()]).unwrap_err();

    assert_eq!(error.kind(), &ErrorKind::UnknownModule("missing".to_string()));
}

#[test]
fn failing_module_code_names_the_module() {
    let mut interpreter = new_interpreter();

    interpreter.register_module(Module::with_code("broken", "1 NOPE").into_ptr());

    let error = interpreter.use_modules(&["broken".into()]).unwrap_err();

    assert!(matches!(error.kind(), ErrorKind::Module { module, .. } if module == "broken"));
    assert_eq!(error.root_cause().kind(), &ErrorKind::UnknownWord("NOPE".to_string()));
    assert!(Rc::ptr_eq(
        &interpreter.current_module(),
        &interpreter.app_module()
    ));
}

#[test]
fn nested_imports_are_copied_for_each_importer() {
    let mut interpreter = new_interpreter();
    let counter = counter_module();
    let outer = Module::with_code(
        "outer",
        ": BUMP c.INC ;  : READ c.VALUE ;  ['BUMP' 'READ'] EXPORT",
    )
    .into_ptr();

    Module::import_module(&outer, "c", &counter, &mut interpreter).unwrap();
    assert_eq!(outer.borrow().import_prefixes("counter"), vec!["c".to_string()]);

    interpreter.register_module(outer);
    interpreter
        .use_modules(&[("outer", "o1").into(), ("outer", "o2").into()])
        .unwrap();

    interpreter.run("o1.BUMP o1.BUMP o2.BUMP  o1.READ o2.READ").unwrap();

    assert_eq!(stack_of(&interpreter), vec![Value::Int(2), Value::Int(1)]);
}

#[test]
fn module_code_runs_for_each_import() {
    let mut interpreter = new_interpreter();
    let runs = Rc::new(std::cell::Cell::new(0));
    let counter = runs.clone();

    add_native_word!(
        interpreter,
        "RAN",
        move |_interpreter: &mut dyn Interpreter| -> Result<()> {
            counter.set(counter.get() + 1);
            Ok(())
        }
    );

    interpreter.register_module(Module::with_code("noisy", "RAN").into_ptr());
    interpreter
        .use_modules(&[("noisy", "x").into(), ("noisy", "y").into()])
        .unwrap();

    assert_eq!(runs.get(), 2);
}

#[test]
fn runtime_info_is_forwarded_through_prefixes() {
    let mut interpreter = new_interpreter();
    let module = Module::new("remote").into_ptr();

    let word = Word::native(
        "FETCH",
        Rc::new(|interpreter: &mut dyn Interpreter| -> Result<()> {
            interpreter.push(Value::from("fetched"));
            Ok(())
        }),
        None,
    );

    word.set_runtime_info(RuntimeInfo::remote("python"));
    module.borrow_mut().add_exportable_word(word);

    interpreter.import_module(module, "r").unwrap();

    let imported = interpreter.find_word("r.FETCH").unwrap();

    assert_eq!(imported.name(), "r.FETCH");
    assert_eq!(imported.runtime_info(), RuntimeInfo::remote("python"));

    interpreter.run("r.FETCH").unwrap();
    assert_eq!(interpreter.pop().unwrap(), Value::from("fetched"));
}

#[test]
fn words_default_to_local_runtime_info() {
    let mut interpreter = new_interpreter();

    interpreter.run(": LOCAL 1 ;").unwrap();

    let word = interpreter.find_word("LOCAL").unwrap();
    assert_eq!(word.runtime_info(), RuntimeInfo::local());
}

#[test]
fn child_modules_hold_their_own_variables() {
    let mut interpreter = new_interpreter();

    interpreter
        .run("{config ['depth'] VARIABLES 3 depth ! : DEPTH depth @ ; }  {config DEPTH }")
        .unwrap();

    assert_eq!(stack_of(&interpreter), vec![Value::Int(3)]);

    let error = interpreter.run("depth").unwrap_err();
    assert_eq!(error.kind(), &ErrorKind::UnknownWord("depth".to_string()));
}

#[test]
fn the_app_module_can_be_reentered() {
    let mut interpreter = new_interpreter();

    interpreter.run(": TOP 1 ; {inner { TOP } }").unwrap();

    assert_eq!(stack_of(&interpreter), vec![Value::Int(1)]);
    assert!(Rc::ptr_eq(
        &interpreter.current_module(),
        &interpreter.app_module()
    ));
}
