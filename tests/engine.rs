use std::sync::{Arc, OnceLock};
use std::thread;

use pretty_assertions::assert_eq;
use waterpipe::{value, Engine, Error, Function, Next, PipeContext, Result, Value};

#[test]
fn engine_debug() {
    let engine = Engine::new();
    engine.compile("{{ lorem }}").unwrap();
    let debug = format!("{engine:?}");
    assert!(debug.starts_with("Engine {"));
    assert!(debug.contains("templates: 1"));
}

#[test]
fn engine_send_and_sync() {
    let engine = Arc::new(Engine::new());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let result = engine
                    .render("{{ lorem }}", value! { lorem: i })
                    .unwrap()
                    .into_string();
                assert_eq!(result, i.to_string());
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn engine_empty_has_no_functions() {
    let engine = Engine::empty();
    assert!(engine.resolve("upper").is_none());
    let result = engine.render("{{ a upper }}", value! { a: "x" }).unwrap();
    assert_eq!(result.errors().len(), 1);
}

#[test]
fn engine_add_function() {
    let engine = Engine::new();
    engine.add_function("shout", |s: String| format!("{}!", s.to_uppercase()));
    let result = engine.render("{{ name shout }}", value! { name: "ann" }).unwrap();
    assert_eq!(result.into_string(), "ANN!");
}

#[test]
fn engine_add_function_with_arguments() {
    let engine = Engine::new();
    engine.add_function("wrap", |s: String, l: String, r: String| format!("{l}{s}{r}"));
    let result = engine
        .render("{{& name wrap \"<\" \">\" }}", value! { name: "ann" })
        .unwrap();
    assert_eq!(result.into_string(), "<ann>");
}

#[test]
fn engine_add_function_replaces() {
    let engine = Engine::new();
    engine.add_function("upper", |s: String| s.to_lowercase());
    let result = engine.render("{{ name upper }}", value! { name: "ANN" }).unwrap();
    assert_eq!(result.into_string(), "ann");
}

#[test]
fn engine_add_function_fallible() {
    let engine = Engine::new();
    engine.add_function("check", |n: f64| -> Result<f64> {
        if n < 0.0 {
            Err(Error::msg("negative"))
        } else {
            Ok(n.sqrt())
        }
    });
    let result = engine.render("{{ a check }}|{{ b check }}", value! { a: 16, b: -1 }).unwrap();
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.errors()[0].message(), "negative");
    assert_eq!(result.into_string(), "4|");
}

#[test]
fn engine_add_variadic() {
    fn count(ctx: &mut PipeContext<'_, '_>) -> Result<Value> {
        let mut n = 0;
        while ctx.has_argument() {
            ctx.take_argument();
            n += 1;
        }
        Ok(Value::from(n))
    }

    let engine = Engine::new();
    engine.add_variadic("count", count);
    let result = engine.render("{{ count a b c }}", Value::Null).unwrap();
    assert_eq!(result.into_string(), "3");
}

#[test]
fn engine_add_template_function() {
    let engine = Engine::new();
    engine
        .add_template_function("card", "<b>{{ name }}</b>")
        .unwrap();
    let result = engine
        .render(
            "{{foreach users}}{{ . card }}{{/foreach}}",
            value! { users: [{ name: "Ann" }, { name: "<Bob>" }] },
        )
        .unwrap();
    assert_eq!(result.into_string(), "<b>Ann</b><b>&lt;Bob&gt;</b>");
}

#[test]
fn engine_add_template_function_compile_error() {
    let engine = Engine::new();
    let err = engine.add_template_function("bad", "{{if a}}").unwrap_err();
    assert_eq!(err.message(), "unclosed `if` block");
    assert!(engine.resolve("bad").is_none());
}

#[test]
fn engine_add_template_function_recursion_is_limited() {
    let engine = Engine::new();
    engine.add_template_function("again", "{{ . again }}").unwrap();
    let result = engine.render("{{ a again }}", value! { a: 1 }).unwrap();
    assert_eq!(result.errors().len(), 1);
    assert_eq!(result.errors()[0].message(), "reached maximum template depth");
}

#[test]
fn engine_add_resolver() {
    fn times(name: &str, next: Next<'_>) -> Option<Arc<Function>> {
        match name.strip_prefix("times") {
            Some(n) => {
                let n: f64 = n.parse().ok()?;
                Some(Arc::new(Function::new(move |v: f64| v * n)))
            }
            None => next.resolve(name),
        }
    }

    let engine = Engine::new();
    engine.add_resolver(times);
    let result = engine
        .render("{{ a times3 }} {{ a upper }}", value! { a: 2 })
        .unwrap();
    assert_eq!(result.into_string(), "6 2");
}

#[test]
fn engine_registered_function_wins_over_resolver() {
    fn shadow(name: &str, next: Next<'_>) -> Option<Arc<Function>> {
        if name == "upper" {
            Some(Arc::new(Function::new(|_: Value| "resolved")))
        } else {
            next.resolve(name)
        }
    }

    let engine = Engine::new();
    engine.add_resolver(shadow);
    let result = engine.render("{{ a upper }}", value! { a: "x" }).unwrap();
    assert_eq!(result.into_string(), "X");
}

#[test]
fn engine_evaluate_single() {
    let engine = Engine::new();
    let result = engine
        .evaluate_single("items where [ . > 1 ]", value! { items: [1, 2, 3] })
        .unwrap();
    assert_eq!(result.into_value(), Value::from([2, 3]));
}

#[test]
fn engine_compile_non_static_source() {
    let engine = Engine::new();
    let source = String::from("{{ lorem }}");
    let result = engine.compile(&source).unwrap().render(value! { lorem: "ipsum" }).unwrap();
    assert_eq!(result.into_string(), "ipsum");
}

#[test]
fn engine_resolver_may_use_the_engine() {
    static ENGINE: OnceLock<Engine> = OnceLock::new();

    fn doubling(name: &str, next: Next<'_>) -> Option<Arc<Function>> {
        match name {
            "double" => Some(Arc::new(Function::new(|v: f64| v * 2.0))),
            _ => next.resolve(name),
        }
    }

    fn registering(name: &str, next: Next<'_>) -> Option<Arc<Function>> {
        if name != "late" {
            return next.resolve(name);
        }
        let engine = ENGINE.get()?;
        engine.add_resolver(doubling);
        engine.resolve("double")
    }

    let engine = ENGINE.get_or_init(Engine::new);
    engine.add_resolver(registering);
    let result = engine.render("{{ 4 late }}", Value::Null).unwrap();
    assert!(result.errors().is_empty(), "{:?}", result.errors());
    assert_eq!(result.into_string(), "8");
}
