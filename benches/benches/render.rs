//! Benchmark template compilation and rendering time.

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use serde::Serialize;

use waterpipe::{Engine, Options};

criterion_main! { benches }
criterion_group! { benches, bench_init, bench_compile, bench_render, bench_evaluate }

const SOURCE: &str = r#"<html>
  <head>
    <title>{{ title }}</title>
  </head>
  <body>
    <table>
      {{foreach users}}
      <tr class="{{if ## even}}even{{else}}odd{{/if}}">
        <td>{{ name ucfirst }}</td>
        <td>{{ email }}</td>
        <td>{{ score %.1f }}</td>
        <td>{{ tags join ", " }}</td>
      </tr>
      {{/foreach}}
    </table>
    <p>{{ users where [ score more 50 ] length }} passed</p>
  </body>
</html>
"#;

#[derive(Serialize)]
struct Context {
    title: String,
    users: Vec<User>,
}

#[derive(Serialize)]
struct User {
    name: String,
    email: String,
    score: f64,
    tags: Vec<&'static str>,
}

fn context(n: usize) -> Context {
    Context {
        title: String::from("Users"),
        users: (0..n)
            .map(|i| User {
                name: format!("user{i}"),
                email: format!("user{i}@example.com"),
                score: (i * 37 % 100) as f64 + 0.25,
                tags: vec!["a", "b", "c"],
            })
            .collect(),
    }
}

/// Benchmarks the time taken to create a new engine with the builtins.
fn bench_init(c: &mut Criterion) {
    c.bench_function("init", |b| b.iter(Engine::new));
}

/// Benchmarks the time taken to compile a template, bypassing the cache.
fn bench_compile(c: &mut Criterion) {
    let source = SOURCE.repeat(20);
    c.bench_function("compile", |b| {
        b.iter_batched(
            Engine::empty,
            |engine| {
                engine.compile(&source).unwrap();
            },
            BatchSize::SmallInput,
        );
    });
}

/// Benchmarks the time taken to render a compiled template.
fn bench_render(c: &mut Criterion) {
    let mut g = c.benchmark_group("render");
    let engine = Engine::new();
    let template = engine.compile(SOURCE).unwrap();
    for n in [10, 100, 1000] {
        let ctx = context(n);
        g.bench_function(format!("users/{n}"), |b| {
            b.iter(|| template.render(&ctx).unwrap());
        });
    }
}

/// Benchmarks a single expression returning a raw value.
fn bench_evaluate(c: &mut Criterion) {
    let engine = Engine::new();
    let ctx = context(100);
    let template = engine
        .compile("{{ users where [ score more 50 ] sortby score map name }}")
        .unwrap();
    let mut options = Options::new();
    options.raw_value(true);
    c.bench_function("evaluate", |b| {
        b.iter(|| template.render_with(&ctx, &options).unwrap());
    });
}
