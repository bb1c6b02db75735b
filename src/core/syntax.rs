//! Language-neutral syntax tree consumed by the index and the extractor.
//!
//! Language parsers lower their concrete syntax trees into these owned types,
//! so nothing downstream depends on tree-sitter node kinds.

use std::path::PathBuf;

/// A parsed source unit
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxTree {
    /// Path the unit was read from
    pub path: PathBuf,

    /// Modules declared in the unit, in source order (nested modules follow their parent)
    pub modules: Vec<ModuleDef>,
}

/// A module definition and the functions directly inside its body
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleDef {
    /// Fully-qualified, dot-separated module name
    pub name: String,

    pub functions: Vec<FunctionDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub body: Expr,
}

/// Expression shapes the call walk distinguishes
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `left |> right`
    Pipe { left: Box<Expr>, right: Box<Expr> },

    /// `Module.function(args...)` with a statically known module
    RemoteCall {
        module: String,
        function: String,
        args: Vec<Expr>,
    },

    /// Unqualified call, including block forms such as `if` and `case`
    LocalCall { name: String, args: Vec<Expr> },

    /// Bare variable or parameter reference
    Var(String),

    /// Node holding exactly two sub-expressions
    Pair(Box<Expr>, Box<Expr>),

    /// Ordered container of sub-expressions
    Sequence(Vec<Expr>),

    /// Anything that cannot contain a call
    Other,
}

impl SyntaxTree {
    /// Name of the first module the unit declares
    pub fn module_name(&self) -> Option<&str> {
        self.modules.first().map(|m| m.name.as_str())
    }

    /// First module (in declaration order) that defines `function`
    pub fn find_function(&self, function: &str) -> Option<(&ModuleDef, &FunctionDef)> {
        self.modules
            .iter()
            .find_map(|module| module.function(function).map(|f| (module, f)))
    }
}

impl ModuleDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
        }
    }

    pub fn function(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Add a function clause. Clauses sharing a name are merged in source order.
    pub fn add_clause(&mut self, name: String, body: Expr) {
        match self.functions.iter_mut().find(|f| f.name == name) {
            Some(existing) => {
                let previous = std::mem::replace(&mut existing.body, Expr::Other);
                existing.body = match previous {
                    Expr::Sequence(mut clauses) => {
                        clauses.push(body);
                        Expr::Sequence(clauses)
                    }
                    single => Expr::Sequence(vec![single, body]),
                };
            }
            None => self.functions.push(FunctionDef { name, body }),
        }
    }
}

impl Expr {
    pub fn pipe(left: Expr, right: Expr) -> Self {
        Expr::Pipe {
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn remote(module: impl Into<String>, function: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::RemoteCall {
            module: module.into(),
            function: function.into(),
            args,
        }
    }

    pub fn var(name: impl Into<String>) -> Self {
        Expr::Var(name.into())
    }

    pub fn pair(left: Expr, right: Expr) -> Self {
        Expr::Pair(Box::new(left), Box::new(right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clauses_with_same_name_are_merged_in_order() {
        let mut module = ModuleDef::new("App.Math");
        module.add_clause("fact".to_string(), Expr::remote("A", "one", vec![]));
        module.add_clause("fact".to_string(), Expr::remote("B", "two", vec![]));
        module.add_clause("other".to_string(), Expr::Other);

        assert_eq!(module.functions.len(), 2);
        assert_eq!(
            module.function("fact").unwrap().body,
            Expr::Sequence(vec![Expr::remote("A", "one", vec![]), Expr::remote("B", "two", vec![])])
        );
    }

    #[test]
    fn test_find_function_searches_modules_in_order() {
        let mut first = ModuleDef::new("First");
        first.add_clause("run".to_string(), Expr::Other);
        let mut second = ModuleDef::new("Second");
        second.add_clause("only_here".to_string(), Expr::Other);

        let tree = SyntaxTree {
            path: PathBuf::from("lib/two.ex"),
            modules: vec![first, second],
        };

        assert_eq!(tree.module_name(), Some("First"));
        assert_eq!(tree.find_function("only_here").map(|(m, _)| m.name.as_str()), Some("Second"));
        assert!(tree.find_function("missing").is_none());
    }
}
