use lago_codegen::{compile, Compilation, CompileError, CompileErrorKind};
use lago_lang::{Lexer, Parser};
use pretty_assertions::assert_eq;

fn build(src: &str) -> Compilation {
    let lexed = Lexer::new(src).lex();
    assert_eq!(None, lexed.error, "lexing should succeed");
    let program = Parser::new(&lexed.tokens).parse().expect("should parse");
    compile(&program).expect("should compile")
}

fn build_err(src: &str) -> CompileError {
    let lexed = Lexer::new(src).lex();
    assert_eq!(None, lexed.error, "lexing should succeed");
    let program = Parser::new(&lexed.tokens).parse().expect("should parse");
    compile(&program).expect_err("compilation should fail")
}

/// Compile a program and run the emitted bytes through a WebAssembly
/// validator.
macro_rules! validates {
    ($name:ident, $src:expr) => {
        #[test]
        fn $name() {
            let out = build($src);
            if let Err(err) = wasmparser::validate(&out.bytes) {
                panic!("emitted module should validate: {err}");
            }
        }
    };
}

validates!(hello_world, "println \"hello world\"");
validates!(arithmetic, "print 5 + 3\nprintln 10 - 2");
validates!(mixed_concat, "x := 5\ny := \"hi\"\nprintln x + y");
validates!(counted_loop, "for i := 1, 3 do print i end");
validates!(counted_loop_with_step, "for i := 10, 1, -1 do print i end");
validates!(step_zero_loop, "for i := 1, 5, 0 do print i end");
validates!(modulo_by_zero, "print 5 % 0");
validates!(power, "print 2 ^ 10\nprint 2 ^ (0 - 2)");
validates!(
    short_circuit,
    "print true and 7\nprint false or \"hello\"\nprint 1 or 2"
);
validates!(
    factorial,
    "func fact(n) if n <= 1 then ret 1 else ret n * fact(n - 1) end end\nprintln fact(5)"
);
validates!(
    elif_chain,
    "x := 2\nif x == 1 then print 1 elif x == 2 then print 2 elif x == 3 then print 3 else print 0 end"
);
validates!(while_loop, "x := 0\nwhile x < 10 do x := x + 1 end\nprint x");
validates!(void_function_call, "func greet(name) println \"hi \" + name end\ngreet(\"lago\")");
validates!(void_function_in_value_position, "func shout() println \"!\" end\nx := shout()\nprint x");
validates!(top_level_ret, "print 1\nret 5");
validates!(ret_inside_loop, "func first(n) for i := 1, n do ret i end end\nprint first(3)");
validates!(unary_operators, "print -5\nprint - -5\nprint ~true\nprint +3");
validates!(comparisons, "print 1 < 2\nprint 1 ~= 2\nprint 2 >= 2");
validates!(
    loop_variable_shadowing,
    "i := 2\nfor i := 1, 3 do print i end\nprint i"
);
validates!(
    locals_shadow_in_nested_frames,
    "local x := 1\nif x then local x := 2\nprint x end\nprint x"
);
validates!(
    and_inside_for_body,
    "for i := 1, 3 do print i and i end"
);
validates!(
    nested_functions,
    "func outer(a) func inner(b) ret b + 1 end\nret inner(a) end\nprint outer(1)"
);
validates!(grouping, "print (1 + 2) * 3");
validates!(bool_arithmetic, "print true + 1");
validates!(string_expression_statement, "\"just a value\"\nx := 1\nx");

#[test]
fn module_header() {
    let out = build("print 1");
    assert_eq!(
        [0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00],
        out.bytes[..8]
    );
}

#[test]
fn string_payload_is_zero_terminated() {
    let out = build("println \"hello world\"");
    assert_eq!(b"hello world\0".as_slice(), out.strings.as_slice());
    assert!(
        contains(&out.bytes, b"hello world\0"),
        "data segment should carry the literal"
    );
}

#[test]
fn duplicate_literals_share_storage() {
    let out = build("print \"hi\"\nprint \"hi\"\nprint \"ho\"");
    assert_eq!(b"hi\0ho\0".as_slice(), out.strings.as_slice());
}

#[test]
fn literals_are_interned_in_first_encounter_order() {
    let out = build("print \"b\"\nprint \"a\"\nprint \"b\"");
    assert_eq!(b"b\0a\0".as_slice(), out.strings.as_slice());
}

#[test]
fn exports_main_and_memory() {
    let out = build("print 1");
    assert!(contains(&out.bytes, b"\x04main\x00"));
    assert!(contains(&out.bytes, b"\x06memory\x02"));
}

#[test]
fn imports_print_and_println_from_env() {
    let out = build("print 1");
    assert!(contains(&out.bytes, b"\x03env\x05print\x00"));
    assert!(contains(&out.bytes, b"\x03env\x07println\x00"));
}

#[test]
fn heap_pointer_starts_past_string_data() {
    // "hello world\0" is 12 bytes, so the heap global starts at 13. The
    // global section is small enough to match byte for byte: one mutable
    // i32 with an `i32.const 13` initializer.
    let out = build("println \"hello world\"");
    assert!(contains(
        &out.bytes,
        &[0x06, 0x06, 0x01, 0x7f, 0x01, 0x41, 13, 0x0b]
    ));
}

#[test]
fn empty_program_compiles() {
    let out = build("");
    assert!(wasmparser::validate(&out.bytes).is_ok());
    assert!(out.strings.is_empty());
}

#[test]
fn unknown_variable() {
    let err = build_err("print x");
    assert_eq!(
        CompileErrorKind::UnknownVariable("x".into()),
        err.kind
    );
    assert_eq!((1, 7), (err.line, err.column));
}

#[test]
fn unknown_function() {
    let err = build_err("print f(1)");
    assert_eq!(
        CompileErrorKind::UnknownFunction("f".into()),
        err.kind
    );
}

#[test]
fn calls_must_follow_declaration() {
    let err = build_err("print f(1)\nfunc f(x) ret x end");
    assert_eq!(
        CompileErrorKind::UnknownFunction("f".into()),
        err.kind
    );
}

#[test]
fn duplicate_local_in_same_frame() {
    let err = build_err("local x := 1\nlocal x := 2");
    assert_eq!(CompileErrorKind::DuplicateLocal("x".into()), err.kind);
    assert_eq!((2, 1), (err.line, err.column));
}

#[test]
fn function_redefinition() {
    let err = build_err("func f() print 1 end\nfunc f() print 2 end");
    assert_eq!(CompileErrorKind::FunctionRedefined("f".into()), err.kind);
}

#[test]
fn arity_mismatch() {
    let err = build_err("func add(a, b) ret a + b end\nprint add(1)");
    assert_eq!(
        CompileErrorKind::ArityMismatch {
            name: "add".into(),
            expected: 2,
            got: 1,
        },
        err.kind
    );
}

#[test]
fn variables_and_functions_are_separate_namespaces() {
    let out = build("f := 1\nfunc f() print 1 end\nf()\nprint f");
    assert!(wasmparser::validate(&out.bytes).is_ok());
}

#[test]
fn assignment_in_branch_creates_innermost_binding() {
    // `y` is created inside the if frame, so it is unknown afterwards.
    let err = build_err("if true then y := 1 end\nprint y");
    assert_eq!(
        CompileErrorKind::UnknownVariable("y".into()),
        err.kind
    );
}

#[test]
fn error_inside_function_body_propagates() {
    let err = build_err("func f() print missing end");
    assert_eq!(
        CompileErrorKind::UnknownVariable("missing".into()),
        err.kind
    );
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
