//! Macro definitions and the symbol table (spec.md §3/§4.6).

use crate::token::Token;
use std::collections::HashMap;

/// A single `#define`d macro.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Macro {
    /// Parameter names, in declared order. `None` for an object-like
    /// macro; `Some(vec![])` for a function-like macro declared with an
    /// empty parameter list, e.g. `#define F() ...`.
    pub params: Option<Vec<String>>,
    /// Replacement text, pre-lexed (see `crate::token`).
    pub body: Vec<Token>,
}

impl Macro {
    pub fn object_like(body: Vec<Token>) -> Self {
        Macro { params: None, body }
    }

    pub fn function_like(params: Vec<String>, body: Vec<Token>) -> Self {
        Macro {
            params: Some(params),
            body,
        }
    }

    pub fn is_function_like(&self) -> bool {
        self.params.is_some()
    }
}

/// The set of currently-defined macros. `#undef` removes entries; `#define`
/// of a name already bound to a *different* definition is a redefinition
/// diagnostic (spec.md §7) but is still honored — the new definition wins,
/// matching `CPrePro::add_define`'s overwrite-and-warn behavior.
#[derive(Default)]
pub struct MacroTable {
    macros: HashMap<String, Macro>,
}

/// Outcome of attempting to define a macro, used by the driver to decide
/// whether to emit a redefinition diagnostic.
pub enum DefineOutcome {
    /// No prior definition existed.
    New,
    /// A prior definition existed and was identical (same params, same
    /// body) — not a diagnostic case.
    IdenticalRedefinition,
    /// A prior definition existed and differed — the new one replaces it,
    /// but the caller should report a redefinition diagnostic.
    ConflictingRedefinition,
}

impl MacroTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: String, def: Macro) -> DefineOutcome {
        let outcome = match self.macros.get(&name) {
            None => DefineOutcome::New,
            Some(existing) if *existing == def => DefineOutcome::IdenticalRedefinition,
            Some(_) => DefineOutcome::ConflictingRedefinition,
        };
        self.macros.insert(name, def);
        outcome
    }

    /// Remove a definition. Returns whether one existed (an `#undef` of an
    /// unknown name is not a diagnostic — matches `CPrePro::remove_define`).
    pub fn undef(&mut self, name: &str) -> bool {
        self.macros.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<&Macro> {
        self.macros.get(name)
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.macros.contains_key(name)
    }
}
