#![no_main]

use std::collections::BTreeMap;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde::Serialize;

#[derive(Debug, Serialize, Arbitrary)]
#[serde(untagged)]
enum Value {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

fuzz_target!(|data: (&str, Vec<(&str, &str)>, Value)| {
    let (root, functions, value) = data;
    let engine = waterpipe::Engine::new();
    for (name, source) in functions {
        let _ = engine.add_template_function(name, source);
    }
    if let Ok(template) = engine.compile(root) {
        let _ = template.render(&value);
    }
});
