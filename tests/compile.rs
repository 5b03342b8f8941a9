use pretty_assertions::assert_eq;
use proptest::prelude::*;
use waterpipe::{Engine, Error, ErrorKind};

#[test]
fn compile_empty() {
    Engine::new().compile("").unwrap();
}

#[test]
fn compile_raw() {
    Engine::new().compile("lorem ipsum dolor sit amet").unwrap();
}

#[test]
fn compile_comment() {
    Engine::new()
        .compile("lorem {{! ipsum dolor }} sit amet")
        .unwrap();
}

#[test]
fn compile_inline_expr() {
    Engine::new()
        .compile("lorem {{ ipsum.dolor where [ sit > 1 ] join \", \" }} amet")
        .unwrap();
}

#[test]
fn compile_blocks() {
    Engine::new()
        .compile("{{foreach a}}{{if b}}x{{elseif not c}}y{{else}}z{{/if}}{{/foreach}}")
        .unwrap();
}

#[test]
fn compile_unknown_function_is_not_an_error() {
    Engine::new().compile("{{ a nosuch b }}").unwrap();
}

#[test]
fn compile_unbalanced_brackets_is_not_an_error() {
    Engine::new().compile("{{ a where [ b ] ] [ }}").unwrap();
}

#[test]
fn compile_unclosed_quote_is_not_an_error() {
    Engine::new().compile("{{ a concat \"b }}").unwrap();
}

#[test]
fn compile_html_is_not_validated() {
    Engine::new()
        .compile("<div><p>lorem</span></div></div><br><img src=\"{{ src }}\">")
        .unwrap();
}

#[test]
fn compile_err_unclosed_if() {
    let err = Engine::new().compile("{{if a}}x").unwrap_err();
    assert_err(
        &err,
        "unclosed `if` block",
        "
   |
 1 | {{if a}}x
   | ^^^^^^^^ REASON
",
    );
}

#[test]
fn compile_err_unclosed_foreach() {
    let err = Engine::new()
        .compile("lorem\n{{foreach a}}{{/if}}")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Compile);
    assert_eq!(err.message(), "unexpected `/if` block");
    assert_eq!(err.line_col(), Some((2, 14)));
}

#[test]
fn compile_err_unexpected_close() {
    let err = Engine::new().compile("lorem {{/foreach}}").unwrap_err();
    assert_err(
        &err,
        "unexpected `/foreach` block",
        "
   |
 1 | lorem {{/foreach}}
   |       ^^^^^^^^^^^^ REASON
",
    );
}

#[test]
fn compile_err_unexpected_else() {
    let err = Engine::new().compile("{{else}}").unwrap_err();
    assert_eq!(err.message(), "unexpected `else` block");

    let err = Engine::new()
        .compile("{{foreach a}}{{elseif b}}{{/foreach}}")
        .unwrap_err();
    assert_eq!(err.message(), "unexpected `elseif` block");

    let err = Engine::new()
        .compile("{{if a}}{{else}}{{else}}{{/if}}")
        .unwrap_err();
    assert_eq!(err.message(), "unexpected `else` block");
}

#[test]
fn compile_err_is_not_cached() {
    let engine = Engine::new();
    assert!(engine.compile("{{if a}}").is_err());
    assert!(engine.compile("{{if a}}").is_err());
}

#[test]
fn compile_is_cached() {
    let engine = Engine::new();
    let a = engine.compile("lorem {{ ipsum }}").unwrap();
    let b = engine.compile(&String::from("lorem {{ ipsum }}")).unwrap();
    let c = engine.compile("lorem {{ dolor }}").unwrap();
    assert!(a.ptr_eq(&b));
    assert!(!a.ptr_eq(&c));
    assert_eq!(b.source(), "lorem {{ ipsum }}");
}

#[track_caller]
fn assert_err(err: &Error, reason: &str, pretty: &str) {
    let (line, col) = err.line_col().unwrap();
    let display = format!("{reason} at line {line} column {col}");
    let display_alt = pretty.replace("REASON", reason);
    assert_eq!(err.kind(), ErrorKind::Compile);
    assert_eq!(err.to_string(), display);
    assert_eq!(format!("{err:#}"), display_alt);
}

proptest! {
    #[test]
    fn compile_never_panics(source in "\\PC*") {
        let _ = Engine::new().compile(&source);
    }

    #[test]
    fn compile_expressions_never_fail(expr in "[a-z0-9 .\\[\\]\"'$#@|&!<>=*+-]*") {
        let source = format!("<p>{{{{x {expr}}}}}</p>");
        prop_assert!(Engine::new().compile(&source).is_ok());
    }

    #[test]
    fn compile_twice_returns_same_program(source in "[a-z {}<>/]*") {
        let engine = Engine::new();
        if let Ok(a) = engine.compile(&source) {
            let b = engine.compile(&source).unwrap();
            prop_assert!(a.ptr_eq(&b));
        }
    }
}
