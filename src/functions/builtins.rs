//! Builtin pipe functions.

use std::sync::Arc;

use regex::{Captures, Regex, RegexBuilder};

use crate::functions::date::format_date;
use crate::functions::printf::sprintf;
use crate::functions::{Function, Lambda, LambdaFactory, Next, PipeArgs, PipeFn, PipeReturn};
use crate::render::PipeContext;
use crate::types::pipe::ArgMode;
use crate::value::{compare, Collection, List, Map};
use crate::{Engine, Error, Result, Value};

/// The longest string `repeat` produces, in bytes.
const MAX_STRING_LEN: usize = 1 << 24;

/// The most elements `to` produces.
const MAX_RANGE_LEN: usize = 1 << 20;

/// Registers every builtin function and the printf resolver.
pub(crate) fn register(engine: &Engine) {
    // control
    variadic(engine, &["|"], pipe);
    variadic(engine, &["&&"], and);
    variadic(engine, &["||"], or_else);

    // variables
    variadic(engine, &["as"], as_var);
    variadic(engine, &["let"], let_vars);

    // comparison
    fixed(engine, &["more", ">"], more);
    fixed(engine, &["less", "<"], less);
    fixed(engine, &["ormore", ">="], or_more);
    fixed(engine, &["orless", "<="], or_less);
    fixed(engine, &["between"], between);
    fixed(engine, &["equals", "=="], equals);
    fixed(engine, &["notequals", "!="], not_equals);
    fixed(engine, &["iequals", "~="], iequals);
    fixed(engine, &["inotequals", "!~="], inot_equals);
    fixed(engine, &["startswith", "^="], starts_with);
    fixed(engine, &["endswith", "$="], ends_with);
    fixed(engine, &["contains", "*="], contains);
    fixed(engine, &["like"], like);
    fixed(engine, &["even"], even);
    fixed(engine, &["odd"], odd);
    variadic(engine, &["not", "!"], not);

    // conditional
    fixed(engine, &["or"], or);
    fixed(engine, &["??"], coalesce);
    fixed(engine, &["choose"], choose);
    variadic(engine, &["test", "?"], test);

    // string
    fixed(engine, &["concat"], concat);
    fixed(engine, &["substr"], substr);
    variadic(engine, &["replace"], replace);
    fixed(engine, &["trim"], trim);
    fixed(engine, &["trimstart"], trim_start);
    fixed(engine, &["trimend"], trim_end);
    fixed(engine, &["padstart"], pad_start);
    fixed(engine, &["padend"], pad_end);
    fixed(engine, &["removestart"], remove_start);
    fixed(engine, &["removeend"], remove_end);
    fixed(engine, &["cutbefore"], cut_before);
    fixed(engine, &["cutbeforelast"], cut_before_last);
    fixed(engine, &["cutafter"], cut_after);
    fixed(engine, &["cutafterlast"], cut_after_last);
    fixed(engine, &["split"], split);
    fixed(engine, &["repeat"], repeat);
    fixed(engine, &["upper"], upper);
    fixed(engine, &["lower"], lower);
    fixed(engine, &["ucfirst"], ucfirst);
    fixed(engine, &["lcfirst"], lcfirst);
    fixed(engine, &["hyphenate"], hyphenate);

    // math
    fixed(engine, &["plus", "+"], plus);
    fixed(engine, &["minus", "-"], minus);
    fixed(engine, &["multiply", "*"], multiply);
    fixed(engine, &["divide", "/"], divide);
    fixed(engine, &["mod", "%"], modulo);
    fixed(engine, &["pow", "^"], pow);
    fixed(engine, &["abs"], abs);
    fixed(engine, &["max"], max);
    fixed(engine, &["min"], min);
    fixed(engine, &["round"], round);
    fixed(engine, &["floor"], floor);
    fixed(engine, &["ceil"], ceil);

    // iterable
    fixed(engine, &["length"], length);
    fixed(engine, &["keys"], keys);
    fixed(engine, &["to", ".."], to);
    fixed(engine, &["join"], join);
    fixed(engine, &["reverse"], reverse);
    fixed(engine, &["sort"], sort);
    fixed(engine, &["slice"], slice);
    variadic(engine, &["first"], first);
    variadic(engine, &["any"], any);
    variadic(engine, &["all"], all);
    variadic(engine, &["none"], none);
    variadic(engine, &["where"], filter);
    variadic(engine, &["map"], map);
    variadic(engine, &["sum"], sum);
    variadic(engine, &["sortby"], sort_by);
    fixed(engine, &["unique"], unique);
    variadic(engine, &["groupby"], group_by);
    variadic(engine, &["in"], contained_in);

    // formatting
    fixed(engine, &[":printf"], printf);
    fixed(engine, &[":json"], json);
    fixed(engine, &[":date"], date);
    fixed(engine, &[":query"], query);

    engine.add_resolver(resolve_printf);
}

fn fixed<F, R, A>(engine: &Engine, names: &[&str], f: F)
where
    F: PipeFn<R, A> + Send + Sync + 'static,
    R: PipeReturn,
    A: PipeArgs,
{
    add(engine, names, Function::new(f));
}

fn variadic<F>(engine: &Engine, names: &[&str], f: F)
where
    F: Fn(&mut PipeContext<'_, '_>) -> Result<Value> + Send + Sync + 'static,
{
    add(engine, names, Function::variadic(f));
}

fn add(engine: &Engine, names: &[&str], f: Function) {
    let f = Arc::new(f);
    for name in names {
        engine.functions.insert((*name).to_owned(), Arc::clone(&f));
    }
}

/// Treats a name starting with `%` as a format for the current value.
fn resolve_printf(name: &str, next: Next<'_>) -> Option<Arc<Function>> {
    if !name.starts_with('%') {
        return next.resolve(name);
    }
    let format = name.to_owned();
    let f = move |v: Value| sprintf(&format, &[v]);
    Some(Arc::new(Function::new(f)))
}

////////////////////////////////////////////////////////////////////////////////
// Control
////////////////////////////////////////////////////////////////////////////////

/// Keeps the current value as a result and starts over from the input.
fn pipe(ctx: &mut PipeContext<'_, '_>) -> Result<Value> {
    ctx.push(ctx.value().clone());
    Ok(ctx.reset())
}

fn and(ctx: &mut PipeContext<'_, '_>) -> Result<Value> {
    Ok(if ctx.value().truthy() {
        ctx.reset()
    } else {
        ctx.stop()
    })
}

fn or_else(ctx: &mut PipeContext<'_, '_>) -> Result<Value> {
    Ok(if ctx.value().truthy() {
        ctx.stop()
    } else {
        ctx.reset()
    })
}

////////////////////////////////////////////////////////////////////////////////
// Variables
////////////////////////////////////////////////////////////////////////////////

/// Stores the current value in a global variable.
fn as_var(ctx: &mut PipeContext<'_, '_>) -> Result<Value> {
    let name = ctx.take_argument_raw().as_text().into_owned();
    let value = ctx.value().clone();
    ctx.globals_mut().insert(name, value.clone());
    Ok(value)
}

/// Stores each following name and value pair as a global variable.
fn let_vars(ctx: &mut PipeContext<'_, '_>) -> Result<Value> {
    while ctx.has_argument() {
        let name = ctx.take_argument_raw().as_text().into_owned();
        let value = ctx.take_argument();
        ctx.globals_mut().insert(name, value);
    }
    Ok(Value::Undefined)
}

////////////////////////////////////////////////////////////////////////////////
// Comparison
////////////////////////////////////////////////////////////////////////////////

fn more(a: Value, b: Value) -> bool {
    compare(&a, &b).is_gt()
}

fn less(a: Value, b: Value) -> bool {
    compare(&a, &b).is_lt()
}

fn or_more(a: Value, b: Value) -> bool {
    compare(&a, &b).is_ge()
}

fn or_less(a: Value, b: Value) -> bool {
    compare(&a, &b).is_le()
}

/// Returns `true` if the value lies within both bounds, inclusive.
fn between(a: Value, lo: Value, hi: Value) -> bool {
    compare(&a, &lo).is_ge() && compare(&a, &hi).is_le()
}

fn equals(a: String, b: String) -> bool {
    a == b
}

fn not_equals(a: String, b: String) -> bool {
    a != b
}

fn iequals(a: String, b: String) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn inot_equals(a: String, b: String) -> bool {
    !iequals(a, b)
}

fn starts_with(a: String, b: String) -> bool {
    !b.is_empty() && a.starts_with(&*b)
}

fn ends_with(a: String, b: String) -> bool {
    !b.is_empty() && a.ends_with(&*b)
}

fn contains(a: String, b: String) -> bool {
    a.contains(&*b)
}

fn even(n: f64) -> bool {
    to_int32(n) & 1 == 0
}

fn odd(n: f64) -> bool {
    to_int32(n) & 1 == 1
}

/// Negates the next argument, or the current value if there is none.
fn not(ctx: &mut PipeContext<'_, '_>) -> Result<Value> {
    let value = if ctx.has_argument() {
        ctx.take_argument()
    } else {
        ctx.value().clone()
    };
    Ok(Value::Bool(!value.truthy()))
}

////////////////////////////////////////////////////////////////////////////////
// Conditional
////////////////////////////////////////////////////////////////////////////////

fn or(a: Value, b: Value) -> Value {
    if a.truthy() {
        a
    } else {
        b
    }
}

fn coalesce(a: Value, b: Value) -> Value {
    if a.is_nullish() {
        b
    } else {
        a
    }
}

fn choose(cond: bool, yes: Value, no: Value) -> Value {
    if cond {
        yes
    } else {
        no
    }
}

/// Applies the second or third argument depending on the first, each of
/// them may be a lambda.
fn test(ctx: &mut PipeContext<'_, '_>) -> Result<Value> {
    let cond = ctx.take_lambda_or(LambdaFactory::Constant);
    let yes = ctx.take_lambda_or(LambdaFactory::Constant);
    let no = ctx.take_lambda_or(LambdaFactory::Constant);
    let value = ctx.value().clone();
    let branch = if ctx.invoke(&cond, value.clone(), Value::Undefined).truthy() {
        yes
    } else {
        no
    };
    Ok(ctx.invoke(&branch, value, Value::Undefined))
}

////////////////////////////////////////////////////////////////////////////////
// String
////////////////////////////////////////////////////////////////////////////////

fn concat(a: String, b: String) -> String {
    a + &b
}

/// Returns `len` characters from `start`, or the rest of the string if no
/// length is given.
fn substr(s: String, start: Value, len: Value) -> String {
    let chars: Vec<char> = s.chars().collect();
    let start = (start.to_number_or_zero().max(0.0) as usize).min(chars.len());
    let end = if len.is_nullish() {
        chars.len()
    } else {
        start + (len.to_number_or_zero().max(0.0) as usize).min(chars.len() - start)
    };
    chars[start..end].iter().collect()
}

/// A needle written as `/pattern/flags`.
struct Pattern {
    regex: Regex,
    global: bool,
}

impl Pattern {
    /// Parses a regular expression literal, returning `None` if the text is
    /// not one so that it is matched as plain text instead.
    fn parse(text: &str) -> Option<Self> {
        let body = text.strip_prefix('/')?;
        let end = body.rfind('/').filter(|&i| i > 0)?;
        let mut builder = RegexBuilder::new(&body[..end]);
        let mut global = false;
        for flag in body[end + 1..].chars() {
            match flag {
                'g' => global = true,
                'i' => {
                    builder.case_insensitive(true);
                }
                'm' => {
                    builder.multi_line(true);
                }
                's' => {
                    builder.dot_matches_new_line(true);
                }
                'u' | 'y' => {}
                _ => return None,
            }
        }
        let regex = builder.build().ok()?;
        Some(Self { regex, global })
    }
}

/// Tests the string against a `/pattern/flags` regular expression.
fn like(s: String, pattern: String) -> bool {
    Pattern::parse(&pattern).is_some_and(|p| p.regex.is_match(&s))
}

/// Replaces the first occurrence of the needle, or every match of a global
/// regular expression.
///
/// The replacement is either the next argument or a lambda applied to the
/// matched text.
fn replace(ctx: &mut PipeContext<'_, '_>) -> Result<Value> {
    let needle = ctx.take_argument().as_text().into_owned();
    let lambda = ctx.take_lambda();
    let replacement = match lambda {
        Some(_) => String::new(),
        None => ctx.take_argument().as_text().into_owned(),
    };
    let value = ctx.value().clone();
    let s = value.as_text();

    if let Some(pattern) = Pattern::parse(&needle) {
        let limit = if pattern.global { 0 } else { 1 };
        let out = match &lambda {
            Some(f) => pattern
                .regex
                .replacen(&s, limit, |caps: &Captures<'_>| {
                    ctx.invoke(f, Value::from(&caps[0]), Value::Undefined)
                        .as_text()
                        .into_owned()
                })
                .into_owned(),
            None => {
                let replacement = replacement.replace("$&", "${0}");
                pattern
                    .regex
                    .replacen(&s, limit, replacement.as_str())
                    .into_owned()
            }
        };
        return Ok(Value::String(out));
    }

    let Some(pos) = s.find(&*needle) else {
        return Ok(value.clone());
    };
    let with = match &lambda {
        Some(f) => ctx
            .invoke(f, Value::from(needle.as_str()), Value::Undefined)
            .as_text()
            .into_owned(),
        None => replacement,
    };
    Ok(Value::String(format!(
        "{}{}{}",
        &s[..pos],
        with,
        &s[pos + needle.len()..]
    )))
}

fn trim(s: String) -> String {
    s.trim().to_owned()
}

fn trim_start(s: String) -> String {
    s.trim_start().to_owned()
}

fn trim_end(s: String) -> String {
    s.trim_end().to_owned()
}

/// Prepends the text unless the string already starts with it.
fn pad_start(s: String, pad: String) -> String {
    if s.starts_with(&*pad) {
        s
    } else {
        pad + &s
    }
}

/// Appends the text unless the string already ends with it.
fn pad_end(s: String, pad: String) -> String {
    if s.ends_with(&*pad) {
        s
    } else {
        s + &pad
    }
}

fn remove_start(s: String, needle: String) -> String {
    match s.strip_prefix(&*needle) {
        Some(rest) => rest.to_owned(),
        None => s,
    }
}

fn remove_end(s: String, needle: String) -> String {
    match s.strip_suffix(&*needle) {
        Some(rest) => rest.to_owned(),
        None => s,
    }
}

fn cut_before(s: String, needle: String) -> String {
    match s.find(&*needle) {
        Some(i) => s[..i].to_owned(),
        None => s,
    }
}

fn cut_before_last(s: String, needle: String) -> String {
    match s.rfind(&*needle) {
        Some(i) => s[..i].to_owned(),
        None => s,
    }
}

fn cut_after(s: String, needle: String) -> String {
    match s.find(&*needle) {
        Some(i) => s[i + needle.len()..].to_owned(),
        None => s,
    }
}

fn cut_after_last(s: String, needle: String) -> String {
    match s.rfind(&*needle) {
        Some(i) => s[i + needle.len()..].to_owned(),
        None => s,
    }
}

/// Splits on the separator, dropping empty entries.
fn split(s: String, sep: String) -> Value {
    if sep.is_empty() {
        return Some(s).filter(|s| !s.is_empty()).into_iter().collect();
    }
    s.split(&*sep).filter(|p| !p.is_empty()).collect()
}

/// Repeats the argument, the current value is the count.
fn repeat(count: f64, s: String) -> Result<String> {
    if s.is_empty() {
        return Ok(s);
    }
    let n = if count.is_nan() { 0.0 } else { count.max(0.0).trunc() };
    if n * s.len() as f64 > MAX_STRING_LEN as f64 {
        return Err(Error::msg("repeated string is too long"));
    }
    Ok(s.repeat(n as usize))
}

fn upper(s: String) -> String {
    s.to_uppercase()
}

fn lower(s: String) -> String {
    s.to_lowercase()
}

fn ucfirst(s: String) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => s,
    }
}

fn lcfirst(s: String) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_lowercase().chain(chars).collect(),
        None => s,
    }
}

/// Converts camel case to lowercase words joined by hyphens.
///
/// A run of capitals is kept together as one word, e.g. `innerHTMLText`
/// becomes `inner-html-text`.
fn hyphenate(s: String) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if !c.is_ascii_uppercase() {
            out.push(c);
            i += 1;
            continue;
        }
        let run = chars[i + 1..]
            .iter()
            .take_while(|c| c.is_ascii_uppercase())
            .count();
        let word = if i + 1 + run == chars.len() {
            run + 1
        } else {
            run.max(1)
        };
        if i > 0 {
            out.push('-');
        }
        out.extend(chars[i..i + word].iter().map(char::to_ascii_lowercase));
        i += word;
    }
    out
}

////////////////////////////////////////////////////////////////////////////////
// Math
////////////////////////////////////////////////////////////////////////////////

fn plus(a: Value, b: Value) -> f64 {
    a.to_number_or_zero() + b.to_number_or_zero()
}

fn minus(a: Value, b: Value) -> f64 {
    a.to_number_or_zero() - b.to_number_or_zero()
}

fn multiply(a: Value, b: Value) -> f64 {
    a.to_number_or_zero() * b.to_number_or_zero()
}

fn divide(a: Value, b: Value) -> f64 {
    a.to_number_or_zero() / b.to_number_or_zero()
}

fn modulo(a: Value, b: Value) -> f64 {
    a.to_number_or_zero() % b.to_number_or_zero()
}

fn pow(a: Value, b: Value) -> f64 {
    a.to_number_or_zero().powf(b.to_number_or_zero())
}

fn abs(n: f64) -> f64 {
    n.abs()
}

fn max(a: Value, b: Value) -> f64 {
    a.to_number_or_zero().max(b.to_number_or_zero())
}

fn min(a: Value, b: Value) -> f64 {
    a.to_number_or_zero().min(b.to_number_or_zero())
}

/// Rounds half up, `-2.5` rounds to `-2`.
fn round(n: f64) -> f64 {
    (n + 0.5).floor()
}

fn floor(n: f64) -> f64 {
    n.floor()
}

fn ceil(n: f64) -> f64 {
    n.ceil()
}

////////////////////////////////////////////////////////////////////////////////
// Iterable
////////////////////////////////////////////////////////////////////////////////

fn length(v: Value) -> Value {
    if !v.is_nullish() && v.has_property("length") {
        v.property("length").into_owned()
    } else {
        Value::from(0)
    }
}

/// Returns the indices of an array or string, or the keys of an object.
fn keys(v: Value) -> Value {
    v.entries().into_iter().map(|(k, _)| k).collect()
}

/// Returns the numbers from `a` to `b` inclusive, counting down if `b` is
/// smaller.
fn to(a: Value, b: Value) -> Result<Value> {
    let (a, b) = (a.to_number_or_zero(), b.to_number_or_zero());
    if !a.is_finite() || !b.is_finite() {
        return Err(Error::msg("range bounds must be finite"));
    }
    let steps = (b - a).abs().ceil();
    if steps >= MAX_RANGE_LEN as f64 {
        return Err(Error::msg("range is too large"));
    }
    let step = if a < b { 1.0 } else { -1.0 };
    let mut list: List<Value> = (0..steps as usize)
        .map(|i| Value::from(a + step * i as f64))
        .collect();
    list.push(Value::from(b));
    Ok(Value::Array(list))
}

fn join(v: Value, sep: String) -> String {
    v.to_list()
        .iter()
        .map(|v| v.as_text())
        .collect::<Vec<_>>()
        .join(&sep)
}

fn reverse(v: Value) -> Value {
    v.to_list().into_iter().rev().collect()
}

fn sort(v: Value) -> Value {
    let mut list = v.to_list();
    list.sort_by(compare);
    Value::Array(list)
}

/// Takes `count` elements from `start`, a negative start counts from the
/// end and a missing count takes the rest.
fn slice(v: Value, start: Value, count: Value) -> Value {
    let list = v.to_list();
    let len = list.len() as f64;
    let start = start.to_number_or_zero().trunc();
    let start = if start < 0.0 {
        (len + start).max(0.0)
    } else {
        start
    };
    let count = if count.is_nullish() {
        len
    } else {
        count.to_number_or_zero().max(0.0)
    };
    list.into_iter()
        .skip(start as usize)
        .take(count as usize)
        .collect()
}

fn first(ctx: &mut PipeContext<'_, '_>) -> Result<Value> {
    Ok(find(ctx, false).unwrap_or_default())
}

fn any(ctx: &mut PipeContext<'_, '_>) -> Result<Value> {
    Ok(Value::Bool(find(ctx, false).is_some()))
}

fn all(ctx: &mut PipeContext<'_, '_>) -> Result<Value> {
    Ok(Value::Bool(find(ctx, true).is_none()))
}

fn none(ctx: &mut PipeContext<'_, '_>) -> Result<Value> {
    Ok(Value::Bool(find(ctx, false).is_none()))
}

/// Keeps the entries whose key is truthy.
fn filter(ctx: &mut PipeContext<'_, '_>) -> Result<Value> {
    let value = ctx.value().clone();
    let key = detect_key(ctx);
    let mut out = Collection::like(&value);
    for (k, v) in value.entries() {
        if key.apply(ctx, &v, k.clone()).truthy() {
            out.push(v, k.to_string());
        }
    }
    Ok(out.into_value())
}

fn map(ctx: &mut PipeContext<'_, '_>) -> Result<Value> {
    let value = ctx.value().clone();
    let key = detect_key(ctx);
    let mut out = Collection::like(&value);
    for (k, v) in value.entries() {
        let mapped = key.apply(ctx, &v, k.clone());
        out.push(mapped, k.to_string());
    }
    Ok(out.into_value())
}

/// Adds up the entries, optionally starting from a constant.
///
/// Numbers are added, anything involving a string is concatenated.
fn sum(ctx: &mut PipeContext<'_, '_>) -> Result<Value> {
    let value = ctx.value().clone();
    let mut result = Value::Undefined;
    let mut key = ctx.take_lambda().map(Key::Lambda);
    if key.is_none() && ctx.next_argument().map_or(false, |a| a.mode != ArgMode::Auto) {
        result = ctx.take_argument();
        key = ctx.take_lambda().map(Key::Lambda);
    }
    let key = match key {
        Some(key) => key,
        None => detect_key(ctx),
    };
    for (k, v) in value.entries() {
        let x = key.apply(ctx, &v, k);
        result = match result {
            Value::Undefined => x,
            acc => add_values(&acc, &x),
        };
    }
    Ok(result)
}

/// Sorts the entries by key, entries with equal keys keep their order.
fn sort_by(ctx: &mut PipeContext<'_, '_>) -> Result<Value> {
    let value = ctx.value().clone();
    let key = detect_key(ctx);
    let mut keyed: Vec<_> = value
        .entries()
        .into_iter()
        .map(|(k, v)| (key.apply(ctx, &v, k.clone()), k, v))
        .collect();
    keyed.sort_by(|a, b| compare(&a.0, &b.0));
    let mut out = Collection::like(&value);
    for (_, k, v) in keyed {
        out.push(v, k.to_string());
    }
    Ok(out.into_value())
}

/// Removes entries with the same text as an earlier entry.
fn unique(v: Value) -> Value {
    let Value::Array(list) = v else {
        return Value::Array(vec![v]);
    };
    let mut seen = Vec::new();
    let mut out = List::new();
    for v in list {
        let text = v.as_text().into_owned();
        if !seen.contains(&text) {
            seen.push(text);
            out.push(v);
        }
    }
    Value::Array(out)
}

/// Groups the entries into an object by the text of their key.
fn group_by(ctx: &mut PipeContext<'_, '_>) -> Result<Value> {
    let value = ctx.value().clone();
    let key = detect_key(ctx);
    let mut groups: Map<String, Collection> = Map::new();
    for (k, v) in value.entries() {
        let group = key.apply(ctx, &v, k.clone()).as_text().into_owned();
        groups
            .entry(group)
            .or_insert_with(|| Collection::like(&value))
            .push(v, k.to_string());
    }
    Ok(groups
        .into_iter()
        .map(|(k, c)| (k, c.into_value()))
        .collect::<Map<_, _>>()
        .into())
}

/// Returns `true` if the value is an element of the array argument or a
/// property of the object argument.
fn contained_in(ctx: &mut PipeContext<'_, '_>) -> Result<Value> {
    let target = ctx.take_argument();
    let value = ctx.value();
    let found = match &target {
        Value::Array(list) => list.contains(value),
        Value::Object(_) => target.has_property(&value.to_string()),
        _ => false,
    };
    Ok(Value::Bool(found))
}

/// How a collection function selects what it tests or maps for each entry.
enum Key {
    Lambda(Lambda),
    /// The entry itself.
    Identity,
}

impl Key {
    fn apply(&self, ctx: &mut PipeContext<'_, '_>, value: &Value, key: Value) -> Value {
        match self {
            Self::Lambda(f) => ctx.invoke(f, value.clone(), key),
            Self::Identity => value.clone(),
        }
    }
}

/// Takes the next argument as a key selector for the entries of the
/// current value.
///
/// A bracketed lambda is used as is. A plain word is a property name if it
/// names a property of some entry, or refers to a variable holding such a
/// name. Otherwise a fixed arity function of that name is applied to each
/// entry, failing that the word is used as a property name anyway.
fn detect_key(ctx: &mut PipeContext<'_, '_>) -> Key {
    let Some(arg) = ctx.next_argument() else {
        return Key::Identity;
    };
    if let Some(lambda) = ctx.take_lambda() {
        return Key::Lambda(lambda);
    }
    if arg.mode != ArgMode::Auto {
        let name = ctx.take_argument().as_text().into_owned();
        return Key::Lambda(Lambda::Property(name));
    }

    let value = ctx.value().clone();
    let name = ctx.take_argument_raw().as_text().into_owned();
    if let Value::String(s) = ctx.evaluate_path(&name) {
        if is_valid_key(&value, &s) {
            return Key::Lambda(Lambda::Property(s));
        }
    }
    if let Some(f) = ctx.resolve(&name) {
        if !f.is_variadic() && !is_valid_key(&value, &name) {
            return Key::Lambda(Lambda::Function(f));
        }
    }
    Key::Lambda(Lambda::Property(name))
}

fn is_valid_key(value: &Value, name: &str) -> bool {
    match value {
        Value::Array(list) => list.iter().any(|v| v.has_property(name)),
        Value::Object(map) => map.values().any(|v| v.has_property(name)),
        _ => false,
    }
}

/// Returns the first entry whose key is truthy, or falsy if `negate` is set.
fn find(ctx: &mut PipeContext<'_, '_>, negate: bool) -> Option<Value> {
    let value = ctx.value().clone();
    let key = detect_key(ctx);
    value
        .entries()
        .into_iter()
        .find(|(k, v)| negate ^ key.apply(ctx, v, k.clone()).truthy())
        .map(|(_, v)| v)
}

////////////////////////////////////////////////////////////////////////////////
// Formatting
////////////////////////////////////////////////////////////////////////////////

fn printf(v: Value, format: String) -> String {
    sprintf(&format, &[v])
}

fn json(v: Value) -> String {
    v.to_json()
}

fn date(v: Value, format: String) -> Result<String> {
    format_date(&v, &format)
}

/// Encodes the value as a URL query string, nested keys use brackets.
fn query(v: Value) -> String {
    let mut pairs = Vec::new();
    build_query(&mut pairs, &v, None);
    pairs
        .into_iter()
        .map(|(name, value)| match name {
            Some(name) => format!("{}={}", url_encode(&name), url_encode(&value)),
            None => url_encode(&value),
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn build_query(out: &mut Vec<(Option<String>, String)>, value: &Value, prefix: Option<&str>) {
    match (value, prefix) {
        (Value::Array(list), Some(prefix)) => {
            for (i, v) in list.iter().enumerate() {
                if prefix.ends_with("[]") {
                    out.push((Some(prefix.to_owned()), v.as_text().into_owned()));
                } else {
                    let index = if v.is_primitive() {
                        String::new()
                    } else {
                        i.to_string()
                    };
                    build_query(out, v, Some(&format!("{prefix}[{index}]")));
                }
            }
        }
        (Value::Array(_) | Value::Object(_), _) => {
            for (k, v) in value.entries() {
                let name = match prefix {
                    Some(prefix) => format!("{prefix}[{k}]"),
                    None => k.to_string(),
                };
                build_query(out, &v, Some(&name));
            }
        }
        _ => out.push((prefix.map(str::to_owned), value.as_text().into_owned())),
    }
}

fn url_encode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'!' | b'*' | b'('
            | b')' => out.push(char::from(b)),
            b' ' => out.push('+'),
            b => out.push_str(&format!("%{b:02x}")),
        }
    }
    out
}

////////////////////////////////////////////////////////////////////////////////
// Helpers
////////////////////////////////////////////////////////////////////////////////

fn to_int32(n: f64) -> i32 {
    if n.is_finite() {
        n.trunc() as i64 as i32
    } else {
        0
    }
}

/// Addition that concatenates as soon as either side is not a number.
fn add_values(a: &Value, b: &Value) -> Value {
    let textual = |v: &Value| !v.is_primitive() || matches!(v, Value::String(_));
    if textual(a) || textual(b) {
        Value::String(format!("{a}{b}"))
    } else {
        Value::Number(a.to_number() + b.to_number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyphenate_words() {
        assert_eq!(hyphenate("fooBarBaz".into()), "foo-bar-baz");
        assert_eq!(hyphenate("innerHTMLText".into()), "inner-html-text");
        assert_eq!(hyphenate("HTMLParser".into()), "html-parser");
        assert_eq!(hyphenate("getURL".into()), "get-url");
        assert_eq!(hyphenate("plain".into()), "plain");
    }

    #[test]
    fn substr_clamps() {
        assert_eq!(substr("hello".into(), 1.into(), 3.into()), "ell");
        assert_eq!(substr("hello".into(), 3.into(), Value::Undefined), "lo");
        assert_eq!(substr("hello".into(), 9.into(), 2.into()), "");
        assert_eq!(substr("hello".into(), (-1).into(), 2.into()), "he");
    }

    #[test]
    fn range_counts_both_ways() {
        assert_eq!(to(1.into(), 3.into()).unwrap(), Value::from([1, 2, 3]));
        assert_eq!(to(2.into(), (-1).into()).unwrap(), Value::from([2, 1, 0, -1]));
        assert_eq!(to(1.5.into(), 3.into()).unwrap(), Value::from([1.5, 2.5, 3.0]));
        assert_eq!(to(4.into(), 4.into()).unwrap(), Value::from([4]));
        assert!(to(0.into(), f64::INFINITY.into()).is_err());
    }

    #[test]
    fn range_is_bounded() {
        let err = to(1e17.into(), 2e17.into()).unwrap_err();
        assert_eq!(err.message(), "range is too large");
        assert!(to(0.into(), 1e12.into()).is_err());
    }

    #[test]
    fn repeat_is_bounded() {
        assert_eq!(repeat(2.5, "ab".into()).unwrap(), "abab");
        assert_eq!(repeat(f64::NAN, "ab".into()).unwrap(), "");
        let err = repeat(1e300, "ab".into()).unwrap_err();
        assert_eq!(err.message(), "repeated string is too long");
        assert_eq!(repeat(f64::INFINITY, "".into()).unwrap(), "");
    }

    #[test]
    fn slice_from_end() {
        let v = Value::from([1, 2, 3, 4]);
        assert_eq!(slice(v.clone(), 1.into(), 2.into()), Value::from([2, 3]));
        assert_eq!(slice(v.clone(), (-2).into(), Value::Undefined), Value::from([3, 4]));
        assert_eq!(slice(v, 0.into(), 0.into()), Value::from(Vec::<Value>::new()));
    }

    #[test]
    fn query_nested() {
        let v = crate::value!({ a: 1, b: { c: "x y" }, tags: ["p", "q"] });
        assert_eq!(query(v), "a=1&b%5bc%5d=x+y&tags%5b%5d=p&tags%5b%5d=q");
    }

    #[test]
    fn split_drops_empty() {
        assert_eq!(split("a,,b,".into(), ",".into()), Value::from(["a", "b"]));
        assert_eq!(split("ab".into(), "".into()), Value::from(["ab"]));
    }
}
