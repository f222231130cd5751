//! Function registry: lower-cased name + argument count -> node factory.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::CompileError;
use crate::node::BoxedParser;

/// Builds a call node from its already built arguments. The argument
/// count has been checked against the registered [`Arity`].
pub type Factory = Box<dyn Fn(Vec<BoxedParser>) -> BoxedParser + Send + Sync>;

/// Categories of built-in functions, used to filter the documentation listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionCategory {
    Array,
    Arithmetic,
    String,
    Temporal,
    Conditional,
}

impl FunctionCategory {
    pub const ALL: [FunctionCategory; 5] = [
        FunctionCategory::Array,
        FunctionCategory::Arithmetic,
        FunctionCategory::String,
        FunctionCategory::Temporal,
        FunctionCategory::Conditional,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionCategory::Array => "array",
            FunctionCategory::Arithmetic => "arithmetic",
            FunctionCategory::String => "string",
            FunctionCategory::Temporal => "temporal",
            FunctionCategory::Conditional => "conditional",
        }
    }
}

impl fmt::Display for FunctionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for FunctionCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown function category '{s}'"))
    }
}

/// Accepted argument counts of one implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Range(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(&self, n: usize) -> bool {
        match *self {
            Arity::Exact(k) => n == k,
            Arity::Range(lo, hi) => (lo..=hi).contains(&n),
            Arity::AtLeast(lo) => n >= lo,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(k) => write!(f, "{k}"),
            Arity::Range(lo, hi) => write!(f, "{lo}..{hi}"),
            Arity::AtLeast(lo) => write!(f, "{lo} or more"),
        }
    }
}

/// User-facing documentation of one function form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDoc {
    /// Call signature, e.g. `log(base, numeric)`.
    pub name: &'static str,
    pub category: FunctionCategory,
    pub explanation: &'static str,
    pub example: &'static str,
}

impl FunctionDoc {
    pub const fn new(
        category: FunctionCategory,
        name: &'static str,
        explanation: &'static str,
        example: &'static str,
    ) -> Self {
        Self { name, category, explanation, example }
    }
}

struct Entry {
    doc: FunctionDoc,
    arity: Arity,
    factory: Factory,
}

#[derive(Default)]
pub struct FunctionRegistry {
    entries: Vec<Entry>,
    by_name: HashMap<String, Vec<usize>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in function.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::function::register_builtins(&mut registry);
        tracing::debug!(
            functions = registry.entries.len(),
            names = registry.by_name.len(),
            "function registry built"
        );
        registry
    }

    /// Register one implementation under every name in `names`.
    ///
    /// Forms of the same name must not overlap in arity; the first
    /// registered match wins.
    pub fn register(
        &mut self,
        names: &[&str],
        doc: FunctionDoc,
        arity: Arity,
        factory: impl Fn(Vec<BoxedParser>) -> BoxedParser + Send + Sync + 'static,
    ) {
        let index = self.entries.len();
        self.entries.push(Entry { doc, arity, factory: Box::new(factory) });
        for name in names {
            self.by_name.entry(name.to_ascii_lowercase()).or_default().push(index);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(&name.to_ascii_lowercase())
    }

    /// Find the implementation of `name` accepting `arg_count` arguments.
    pub fn resolve(&self, name: &str, arg_count: usize) -> Result<&Factory, CompileError> {
        let key = name.to_ascii_lowercase();
        let forms = self
            .by_name
            .get(&key)
            .ok_or_else(|| CompileError::UnknownFunction(name.to_string()))?;
        forms
            .iter()
            .map(|&i| &self.entries[i])
            .find(|e| e.arity.accepts(arg_count))
            .map(|e| &e.factory)
            .ok_or_else(|| CompileError::ArityMismatch {
                name: key,
                given: arg_count,
                expected: forms
                    .iter()
                    .map(|&i| self.entries[i].arity.to_string())
                    .collect::<Vec<_>>()
                    .join(" or "),
            })
    }

    /// Documentation in registration order, optionally filtered by category.
    pub fn list_docs(&self, category: Option<FunctionCategory>) -> Vec<&FunctionDoc> {
        self.entries
            .iter()
            .map(|e| &e.doc)
            .filter(|d| category.is_none_or(|c| d.category == c))
            .collect()
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// 1-based.
    pub page_num: usize,
    pub page_size: usize,
    pub total: usize,
    pub items: Vec<T>,
}

/// Cut `items` into pages of `page_size` and return page `page_num`
/// (1-based; 0 is read as 1). A `page_size` of 0 returns everything.
pub fn paginate<T>(items: Vec<T>, page_num: usize, page_size: usize) -> Page<T> {
    let total = items.len();
    let page_num = page_num.max(1);
    if page_size == 0 {
        return Page { page_num: 1, page_size: total, total, items };
    }
    let start = (page_num - 1).saturating_mul(page_size);
    let items = items.into_iter().skip(start).take(page_size).collect();
    Page { page_num, page_size, total, items }
}

static REGISTRY: LazyLock<FunctionRegistry> = LazyLock::new(FunctionRegistry::with_builtins);

/// Process-wide registry of built-in functions.
pub fn registry() -> &'static FunctionRegistry {
    &REGISTRY
}
