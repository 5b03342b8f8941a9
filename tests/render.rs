use pretty_assertions::assert_eq;
use proptest::prelude::*;
use waterpipe::{value, Engine, ErrorKind, Globals, Options, Output, Value};

fn render(source: &str, ctx: Value) -> String {
    let result = Engine::new().render(source, ctx).unwrap();
    assert!(result.errors().is_empty(), "{:?}", result.errors());
    result.into_string()
}

#[test]
fn render_text_only() {
    assert_eq!(render("lorem ipsum", Value::Null), "lorem ipsum");
}

#[test]
fn render_inline_expr_bool() {
    assert_eq!(render("lorem {{ ipsum }}", value! { ipsum: true }), "lorem true");
}

#[test]
fn render_inline_expr_numbers() {
    let ctx = value! { a: 123, b: 123.4, c: -0.5 };
    assert_eq!(render("{{ a }} {{ b }} {{ c }}", ctx), "123 123.4 -0.5");
}

#[test]
fn render_inline_expr_nullish_is_empty() {
    let ctx = value! { n: null };
    assert_eq!(render("[{{ n }}|{{ missing }}]", ctx), "[|]");
}

#[test]
fn render_inline_expr_nested_path() {
    let ctx = value! { user: { name: "John Smith", tags: ["a", "b"] } };
    assert_eq!(
        render("Hello {{ user.name }}, {{ user.tags.1 }}!", ctx),
        "Hello John Smith, b!"
    );
}

#[test]
fn render_inline_expr_computed_path() {
    let ctx = value! { k: "name", name: "Ann", obj: { Ann: "Bob" } };
    assert_eq!(render("{{$(k)}}", ctx.clone()), "Ann");
    assert_eq!(render("{{ $(k) upper }}", ctx.clone()), "ANN");
    assert_eq!(render("{{ obj.$(name) }}", ctx), "Bob");
}

#[test]
fn render_inline_expr_escapes_html() {
    let ctx = value! { s: "<b>&'\"" };
    assert_eq!(render("{{ s }}", ctx), "&lt;b&gt;&amp;&#39;&quot;");
}

#[test]
fn render_raw_expr_is_not_escaped() {
    let ctx = value! { s: "<b>&'\"" };
    assert_eq!(render("{{& s }}", ctx), "<b>&'\"");
}

#[test]
fn render_inline_expr_structured_as_json() {
    let ctx = value! { list: [1, 2], obj: { a: "x" } };
    assert_eq!(render("{{ list }}", ctx.clone()), "[1,2]");
    assert_eq!(render("{{& obj }}", ctx.clone()), r#"{"a":"x"}"#);
    assert_eq!(render("{{ obj }}", ctx), "{&quot;a&quot;:&quot;x&quot;}");
}

#[test]
fn render_comment_is_removed() {
    assert_eq!(render("lorem {{! ipsum }}dolor", Value::Null), "lorem dolor");
}

#[test]
fn render_malformed_construct_is_text() {
    assert_eq!(render("a {{ b", Value::Null), "a {{ b");
}

#[test]
fn render_if_else() {
    let source = "{{if a}}yes{{else}}no{{/if}}";
    assert_eq!(render(source, value! { a: true }), "yes");
    assert_eq!(render(source, value! { a: false }), "no");
    assert_eq!(render(source, value! { a: [] }), "yes");
    assert_eq!(render(source, value! { a: "" }), "no");
}

#[test]
fn render_if_without_else() {
    let source = "a{{if b}}b{{/if}}c";
    assert_eq!(render(source, value! { b: 1 }), "abc");
    assert_eq!(render(source, value! { b: 0 }), "ac");
}

#[test]
fn render_elseif_chain() {
    let source = "{{if a}}A{{elseif b}}B{{elseif not c}}C{{else}}D{{/if}}";
    assert_eq!(render(source, value! { a: 1, b: 1, c: 1 }), "A");
    assert_eq!(render(source, value! { a: 0, b: 1, c: 1 }), "B");
    assert_eq!(render(source, value! { a: 0, b: 0, c: 0 }), "C");
    assert_eq!(render(source, value! { a: 0, b: 0, c: 1 }), "D");
}

#[test]
fn render_if_not() {
    let source = "{{if not items}}empty{{/if}}";
    assert_eq!(render(source, value! { items: null }), "empty");
    assert_eq!(render(source, value! { items: [1] }), "");
}

#[test]
fn render_if_pipe() {
    let source = "{{if price more 10}}expensive{{else}}cheap{{/if}}";
    assert_eq!(render(source, value! { price: 12 }), "expensive");
    assert_eq!(render(source, value! { price: 8 }), "cheap");
}

#[test]
fn render_nested_if() {
    let source = "{{if a}}1{{if b}}2{{else}}3{{/if}}4{{/if}}5";
    assert_eq!(render(source, value! { a: 1, b: 1 }), "1245");
    assert_eq!(render(source, value! { a: 1, b: 0 }), "1345");
    assert_eq!(render(source, value! { a: 0, b: 1 }), "5");
}

#[test]
fn render_foreach_array() {
    let ctx = value! { items: [1, 2, 3] };
    assert_eq!(render("{{foreach items}}{{.}},{{/foreach}}", ctx), "1,2,3,");
}

#[test]
fn render_foreach_object_keys() {
    let ctx = value! { obj: { a: 1, b: 2 } };
    assert_eq!(
        render("{{foreach obj}}{{#key}}={{.}};{{/foreach}}", ctx),
        "a=1;b=2;"
    );
}

#[test]
fn render_foreach_index_and_count() {
    let ctx = value! { items: ["x", "y", "z"] };
    assert_eq!(
        render("{{foreach items}}{{##}}/{{#count}}{{.}} {{/foreach}}", ctx),
        "0/3x 1/3y 2/3z "
    );
}

#[test]
fn render_foreach_property_lookup() {
    let ctx = value! { users: [{ name: "Ann" }, { name: "Bob" }] };
    assert_eq!(
        render("{{foreach users}}({{name}}){{/foreach}}", ctx),
        "(Ann)(Bob)"
    );
}

#[test]
fn render_foreach_outer_scope() {
    let ctx = value! { title: "t", items: [1, 2] };
    assert_eq!(
        render("{{foreach items}}{{title}}{{_.title}}{{.}}{{/foreach}}", ctx),
        "tt1tt2"
    );
}

#[test]
fn render_foreach_parent_frame() {
    let ctx = value! {
        groups: [
            { name: "a", items: [1, 2] },
            { name: "b", items: [3] },
        ]
    };
    assert_eq!(
        render(
            "{{foreach groups}}{{foreach items}}{{@1.name}}{{.}};{{/foreach}}{{/foreach}}",
            ctx
        ),
        "a1;a2;b3;"
    );
}

#[test]
fn render_foreach_empty() {
    let source = "a{{foreach items}}x{{/foreach}}b";
    assert_eq!(render(source, value! { items: [] }), "ab");
    assert_eq!(render(source, value! {}), "ab");
}

#[test]
fn render_foreach_scalar_iterates_once() {
    let source = "{{foreach item}}[{{.}}]{{/foreach}}";
    assert_eq!(render(source, value! { item: "x" }), "[x]");
}

#[test]
fn render_foreach_with_if() {
    let ctx = value! { items: [1, 2, 3, 4] };
    assert_eq!(
        render("{{foreach items}}{{if even}}{{.}}{{/if}}{{/foreach}}", ctx),
        "24"
    );
}

#[test]
fn render_whitespace_between_tags_is_indented() {
    let source = "<ul>\n  <li>{{ a }}</li>\n  <li>{{ b }}</li>\n</ul>";
    assert_eq!(
        render(source, value! { a: 1, b: 2 }),
        "<ul>\r\n  <li>1</li>\r\n  <li>2</li>\r\n</ul>"
    );
}

#[test]
fn render_whitespace_between_tags_is_collapsed() {
    let source = "<p>  <b>x</b>   <i>y</i>  </p>";
    assert_eq!(render(source, Value::Null), "<p><b>x</b> <i>y</i></p>");
}

#[test]
fn render_whitespace_around_empty_expr_is_collapsed() {
    assert_eq!(render("<p><b>a</b> {{x}}</p>", Value::Null), "<p><b>a</b></p>");
    assert_eq!(render("<p>{{x}} <b>y</b></p>", Value::Null), "<p><b>y</b></p>");
}

#[test]
fn render_whitespace_in_text_is_kept() {
    let source = "lorem  ipsum\n  dolor";
    assert_eq!(render(source, Value::Null), source);
}

#[test]
fn render_custom_indent() {
    let source = "<div>\n<p>{{x}}</p>\n</div>";
    let engine = Engine::new();
    let template = engine.compile(source).unwrap();
    let mut options = Options::new();
    options.indent_width(4);
    let result = template.render_with(value! { x: "x" }, &options).unwrap();
    assert_eq!(result.into_string(), "<div>\r\n    <p>x</p>\r\n</div>");
}

#[test]
fn render_pipe_functions() {
    let ctx = value! {
        items: [
            { name: "apple", price: 5 },
            { name: "melon", price: 12 },
            { name: "grape", price: 20 },
        ]
    };
    assert_eq!(
        render("{{ items where [ price more 10 ] map name join \", \" }}", ctx),
        "melon, grape"
    );
}

#[test]
fn render_pipe_push_results() {
    assert_eq!(render("{{& a | b }}", value! { a: 1, b: 2 }), "[1,2]");
}

#[test]
fn render_pipe_and_or() {
    assert_eq!(render("{{ a && b }}", value! { a: 0, b: "x" }), "0");
    assert_eq!(render("{{ a && b }}", value! { a: 1, b: "x" }), "x");
    assert_eq!(render("{{ a || b }}", value! { a: "", b: "x" }), "x");
    assert_eq!(render("{{ a || b }}", value! { a: "y", b: "x" }), "y");
}

#[test]
fn render_globals() {
    let globals: Globals = [("site", "W")].into_iter().collect();
    let engine = Engine::new();
    let template = engine
        .compile("{{ site }}|{{ @global.site }}")
        .unwrap();
    let mut options = Options::new();
    options.globals(&globals);
    let result = template.render_with(value! {}, &options).unwrap();
    assert_eq!(result.into_string(), "W|W");
}

#[test]
fn render_data_shadows_globals() {
    let globals: Globals = [("site", "W")].into_iter().collect();
    let engine = Engine::new();
    let template = engine.compile("{{ site }}").unwrap();
    let mut options = Options::new();
    options.globals(&globals);
    let result = template.render_with(value! { site: "D" }, &options).unwrap();
    assert_eq!(result.into_string(), "D");
}

#[test]
fn render_variables() {
    assert_eq!(
        render("{{ name as who }}-{{ who }}", value! { name: "Ann" }),
        "Ann-Ann"
    );
    assert_eq!(render("{{ let x 1 y 2 }}{{ x + y }}", Value::Null), "3");
}

#[test]
fn render_variables_do_not_leak_into_parent_globals() {
    let globals: Globals = [("x", 1)].into_iter().collect();
    let engine = Engine::new();
    let template = engine.compile("{{ let x 2 }}{{ x }}").unwrap();
    let mut options = Options::new();
    options.globals(&globals);
    let result = template.render_with(Value::Null, &options).unwrap();
    assert_eq!(result.into_string(), "2");
    assert_eq!(globals.get("x"), Some(&Value::from(1)));
}

#[test]
fn render_raw_value() {
    let engine = Engine::new();
    let result = engine.evaluate_single("n", value! { n: 5 }).unwrap();
    assert_eq!(result.output(), &Output::Value(Value::from(5)));

    let result = engine.evaluate_single("items", value! { items: [1, 2] }).unwrap();
    assert_eq!(result.into_value(), Value::from([1, 2]));
}

#[test]
fn render_raw_value_with_text_is_string() {
    let engine = Engine::new();
    let template = engine.compile("a{{n}}").unwrap();
    let mut options = Options::new();
    options.raw_value(true);
    let result = template.render_with(value! { n: 5 }, &options).unwrap();
    assert_eq!(result.output(), &Output::String(String::from("a5")));
}

#[test]
fn render_error_is_collected() {
    let result = Engine::new()
        .render("a{{ x nosuch }}b", value! { x: 1 })
        .unwrap();
    let (output, errors) = result.into_parts();
    assert_eq!(output.to_string(), "ab");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].kind(), ErrorKind::Execution);
    assert_eq!(errors[0].message(), "invalid pipe function `nosuch`");
    assert_eq!(
        errors[0].to_string(),
        "invalid pipe function `nosuch` at line 1 column 7"
    );
}

#[test]
fn render_error_does_not_stop_render() {
    let result = Engine::new()
        .render("{{ x nosuch }}{{ y }}{{ z other }}", value! { x: 1, y: "ok", z: 2 })
        .unwrap();
    assert_eq!(result.errors().len(), 2);
    assert_eq!(result.clone().into_string(), "ok");
    assert!(result.into_result().is_err());
}

#[test]
fn render_serde_struct() {
    #[derive(serde::Serialize)]
    struct Context {
        user: User,
    }

    #[derive(serde::Serialize)]
    struct User {
        name: String,
        age: u32,
    }

    let ctx = Context {
        user: User {
            name: "Ann".into(),
            age: 30,
        },
    };
    let result = Engine::new()
        .render("{{ user.name }} is {{ user.age }}", &ctx)
        .unwrap();
    assert_eq!(result.into_string(), "Ann is 30");
}

const SNIPPETS: &[&str] = &[
    "{{if a}}",
    "{{elseif b}}",
    "{{else}}",
    "{{/if}}",
    "{{foreach list}}",
    "{{/foreach}}",
    "{{ a }}",
    "{{& obj }}",
    "{{ $(k) }}",
    "{{ list where [ . > 1 ] join }}",
    "{{ n repeat x }}",
    "{{ n to m }}",
    "{{ n %.9999f }}",
    "{{ s replace \"/[a-/g\" y }}",
    "{{ s like \"/a+/\" }}",
    "{{ n :date \"yyyy fffffffff\" }}",
    "{{ s substr n m }}",
    "{{ obj sortby [ . ] }}",
    "{{ a | b || c && }}",
    "<p>",
    "</p>",
    " ",
    "\n  ",
    "text",
];

proptest! {
    #[test]
    fn render_never_panics(
        parts in prop::collection::vec(prop::sample::select(SNIPPETS), 0..12),
        n in prop::num::f64::ANY,
        m in -1e6..1e6_f64,
    ) {
        let source = parts.concat();
        let ctx = value! {
            a: true,
            b: 0,
            k: "a",
            n: n,
            m: m,
            s: "aaa",
            list: [1, 2, 3],
            obj: { x: [null], y: "z" },
        };
        if let Ok(result) = Engine::new().render(&source, ctx) {
            let _ = result.into_string();
        }
    }
}
