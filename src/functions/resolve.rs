use std::sync::Arc;

use dashmap::DashMap;

use crate::functions::Function;

/// Resolves a function name that is not necessarily registered.
///
/// Resolvers form a chain. Each one either answers a name itself or hands it
/// on using [`Next::resolve`]. The registry of named functions is asked
/// first, then each resolver with the most recently added one first.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use waterpipe::{Engine, Function, Next, Resolve};
///
/// struct Shout;
///
/// impl Resolve for Shout {
///     fn resolve(&self, name: &str, next: Next<'_>) -> Option<Arc<Function>> {
///         match name.strip_prefix("shout-") {
///             Some(suffix) => {
///                 let suffix = suffix.to_owned();
///                 let f = move |v: String| format!("{}{suffix}", v.to_uppercase());
///                 Some(Arc::new(Function::new(f)))
///             }
///             None => next.resolve(name),
///         }
///     }
/// }
///
/// let engine = Engine::new();
/// engine.add_resolver(Shout);
///
/// let result = engine.render("{{name shout-!}}", waterpipe::value! { name: "hey" })?;
/// assert_eq!(result.into_string(), "HEY!");
/// # Ok::<(), waterpipe::Error>(())
/// ```
pub trait Resolve: Send + Sync {
    fn resolve(&self, name: &str, next: Next<'_>) -> Option<Arc<Function>>;
}

impl<F> Resolve for F
where
    F: Fn(&str, Next<'_>) -> Option<Arc<Function>> + Send + Sync,
{
    fn resolve(&self, name: &str, next: Next<'_>) -> Option<Arc<Function>> {
        self(name, next)
    }
}

#[derive(Clone)]
pub(crate) enum Link {
    /// Look the name up in the registry of named functions.
    Registry,
    Custom(Arc<dyn Resolve>),
}

/// The rest of a resolver chain.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    registry: &'a DashMap<String, Arc<Function>>,
    chain: &'a [Link],
    index: usize,
}

impl<'a> Next<'a> {
    pub(crate) fn new(registry: &'a DashMap<String, Arc<Function>>, chain: &'a [Link]) -> Self {
        Self {
            registry,
            chain,
            index: 0,
        }
    }

    /// Hands the name to the next resolver in the chain.
    pub fn resolve(self, name: &str) -> Option<Arc<Function>> {
        let link = self.chain.get(self.index)?;
        let next = Self {
            index: self.index + 1,
            ..self
        };
        match link {
            Link::Registry => match self.registry.get(name) {
                Some(f) => Some(Arc::clone(f.value())),
                None => next.resolve(name),
            },
            Link::Custom(r) => r.resolve(name, next),
        }
    }
}
