//! Naming strategy: maps resolved source-language qualified names onto
//! collision-free output-language identifiers.
//!
//! The strategy is an injectable policy; writer rules only ever ask it
//! for names and never inspect how it avoids clashes.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};

lazy_static! {
    /// Names the output language refuses as identifiers: its keywords
    /// plus the globals a generated program must not shadow.
    pub static ref RESERVED_WORDS: HashSet<&'static str> = {
        let mut s = HashSet::new();
        for kw in [
            "break", "case", "catch", "class", "const", "continue", "debugger", "default",
            "delete", "do", "else", "enum", "export", "extends", "false", "finally", "for",
            "function", "if", "import", "in", "instanceof", "let", "new", "null", "return",
            "super", "switch", "this", "throw", "true", "try", "typeof", "var", "void",
            "while", "with", "yield",
        ] {
            s.insert(kw);
        }
        // Globals generated code relies on.
        s.insert("Object");
        s.insert("Array");
        s.insert("Function");
        s.insert("Math");
        s.insert("JSON");
        s.insert("undefined");
        s.insert("NaN");
        s.insert("Infinity");
        s.insert("prototype");
        s.insert("constructor");
        s
    };

    static ref IDENTIFIER_RE: Regex = Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap();
}

pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER_RE.is_match(name) && !RESERVED_WORDS.contains(name)
}

pub trait NamingStrategy: Send {
    /// Output identifier for a qualified type name. Must return the
    /// same answer for the same input within one unit.
    fn type_name(&mut self, qualified: &str) -> String;

    /// Output identifier for a member, local or parameter name.
    fn identifier(&mut self, name: &str) -> String;
}

/// Default policy: prefer the simple name, fall back to flattening the
/// full qualified name, then disambiguate with a counter. Reserved
/// words are suffixed rather than renamed so output stays readable.
#[derive(Debug, Default)]
pub struct FlatNamingStrategy {
    assigned: HashMap<String, String>,
    taken: HashSet<String>,
}

impl FlatNamingStrategy {
    pub fn new() -> Self {
        FlatNamingStrategy::default()
    }

    fn claim(&mut self, qualified: &str, candidate: String) -> String {
        let mut name = candidate;
        if !is_valid_identifier(&name) {
            name = sanitize(&name);
        }
        let mut n = 1;
        let base = name.clone();
        while self.taken.contains(&name) {
            n += 1;
            name = format!("{}{}", base, n);
        }
        self.taken.insert(name.clone());
        self.assigned.insert(qualified.to_string(), name.clone());
        name
    }
}

impl NamingStrategy for FlatNamingStrategy {
    fn type_name(&mut self, qualified: &str) -> String {
        if let Some(existing) = self.assigned.get(qualified) {
            return existing.clone();
        }
        let simple = crate::ir::simple_name(qualified).to_string();
        if is_valid_identifier(&simple) && !self.taken.contains(&simple) {
            self.claim(qualified, simple)
        } else {
            self.claim(qualified, qualified.replace('.', "_"))
        }
    }

    fn identifier(&mut self, name: &str) -> String {
        if is_valid_identifier(name) {
            name.to_string()
        } else {
            sanitize(name)
        }
    }
}

fn sanitize(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
        .collect();
    let mut out = if cleaned.chars().next().map(|c| c.is_ascii_digit()).unwrap_or(true) {
        format!("_{}", cleaned)
    } else {
        cleaned
    };
    if RESERVED_WORDS.contains(out.as_str()) {
        out.push('$');
    }
    out
}
