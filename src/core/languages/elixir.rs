use std::path::Path;
use tree_sitter::{Node, Parser};

use crate::error::{CalltrailError, Result};
use super::LanguageParser;
use crate::core::syntax::{Expr, ModuleDef, SyntaxTree};

/// Elixir parser using Tree-sitter
pub struct ElixirParser {
    parser: Parser,
}

impl ElixirParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let elixir_language = tree_sitter_elixir::language();
        parser.set_language(&elixir_language)
            .map_err(|e| CalltrailError::Parser(format!("Failed to set Elixir language: {}", e)))?;

        Ok(Self { parser })
    }
}

impl LanguageParser for ElixirParser {
    fn parse(&mut self, content: &str, file_path: &Path) -> Result<SyntaxTree> {
        let tree = self.parser.parse(content, None)
            .ok_or_else(|| CalltrailError::Parser("Failed to parse Elixir code".to_string()))?;

        let root_node = tree.root_node();
        if root_node.has_error() {
            let position = first_error(root_node)
                .map(|n| format!(" at line {}", n.start_position().row + 1))
                .unwrap_or_default();
            return Err(CalltrailError::Parser(format!(
                "Syntax error in {}{}",
                file_path.display(),
                position
            )));
        }

        let mut modules = Vec::new();
        let mut cursor = root_node.walk();
        for child in root_node.named_children(&mut cursor) {
            if call_name(child, content) == Some("defmodule") {
                parse_module(child, content, None, &mut modules);
            }
        }

        Ok(SyntaxTree {
            path: file_path.to_path_buf(),
            modules,
        })
    }

    fn file_extensions(&self) -> &[&str] {
        &["ex", "exs"]
    }

    fn language_name(&self) -> &str {
        "elixir"
    }
}

/// Parse a `defmodule` call; nested modules are appended after their parent
fn parse_module(node: Node, source: &str, parent: Option<&str>, modules: &mut Vec<ModuleDef>) {
    let Some(alias) = arguments(node).and_then(|args| args.named_child(0)) else {
        return;
    };
    if alias.kind() != "alias" {
        return;
    }

    let name = match parent {
        Some(parent) => format!("{}.{}", parent, alias_text(alias, source)),
        None => alias_text(alias, source),
    };

    let mut module = ModuleDef::new(name.clone());
    let mut nested = Vec::new();

    if let Some(block) = do_block(node) {
        let lowering = Lowering { source, module: &name };
        let mut cursor = block.walk();
        for item in block.named_children(&mut cursor) {
            match call_name(item, source) {
                Some("def") | Some("defp") => {
                    if let Some((function, body)) = lowering.function(item) {
                        module.add_clause(function, body);
                    }
                }
                Some("defmodule") => parse_module(item, source, Some(name.as_str()), &mut nested),
                _ => {}
            }
        }
    }

    modules.push(module);
    modules.extend(nested);
}

/// Lowers tree-sitter nodes into `Expr` within one module's scope
struct Lowering<'a> {
    source: &'a str,
    module: &'a str,
}

impl<'a> Lowering<'a> {
    /// Name and body of a `def`/`defp` clause; bodiless heads yield `None`
    fn function(&self, node: Node) -> Option<(String, Expr)> {
        let args = arguments(node)?;
        let head = args.named_child(0)?;
        let name = self.function_name(head)?;

        if let Some(block) = do_block(node) {
            return Some((name, self.sequence(block)));
        }

        // def name(args), do: expr
        let mut cursor = args.walk();
        let keywords = args.named_children(&mut cursor).find(|n| n.kind() == "keywords")?;
        let mut kw_cursor = keywords.walk();
        let body = keywords
            .named_children(&mut kw_cursor)
            .filter(|pair| pair.kind() == "pair")
            .find(|pair| {
                pair.child_by_field_name("key")
                    .map(|key| node_text(key, self.source).trim().trim_end_matches(':') == "do")
                    .unwrap_or(false)
            })
            .and_then(|pair| pair.child_by_field_name("value"))?;

        Some((name, self.expr(body)))
    }

    fn function_name(&self, head: Node) -> Option<String> {
        match head.kind() {
            "identifier" => Some(node_text(head, self.source).to_string()),
            "call" => head
                .child_by_field_name("target")
                .filter(|t| t.kind() == "identifier")
                .map(|t| node_text(t, self.source).to_string()),
            // def name(x) when guard(x)
            "binary_operator" => head
                .child_by_field_name("left")
                .and_then(|left| self.function_name(left)),
            _ => None,
        }
    }

    fn expr(&self, node: Node) -> Expr {
        match node.kind() {
            "binary_operator" => {
                let (Some(left), Some(right)) = (
                    node.child_by_field_name("left"),
                    node.child_by_field_name("right"),
                ) else {
                    return Expr::Other;
                };
                if operator(node) == Some("|>") {
                    Expr::pipe(self.expr(left), self.expr(right))
                } else {
                    Expr::pair(self.expr(left), self.expr(right))
                }
            }
            "unary_operator" => {
                // &Mod.fun/1 is a callable reference, not a call
                if operator(node) == Some("&") {
                    return Expr::Other;
                }
                node.child_by_field_name("operand")
                    .map(|operand| self.expr(operand))
                    .unwrap_or(Expr::Other)
            }
            "pair" => match node.child_by_field_name("value") {
                Some(value) => Expr::pair(Expr::Other, self.expr(value)),
                None => Expr::Other,
            },
            "call" => self.call(node),
            "identifier" => Expr::var(node_text(node, self.source)),
            "alias" | "atom" | "quoted_atom" | "keyword" | "integer" | "float" | "boolean"
            | "nil" | "char" | "comment" => Expr::Other,
            _ => {
                if node.named_child_count() == 0 {
                    Expr::Other
                } else {
                    self.sequence(node)
                }
            }
        }
    }

    fn call(&self, node: Node) -> Expr {
        let args = self.call_arguments(node);
        let Some(target) = node.child_by_field_name("target") else {
            return Expr::Sequence(args);
        };

        match target.kind() {
            "identifier" => Expr::LocalCall {
                name: node_text(target, self.source).to_string(),
                args,
            },
            "dot" => {
                let left = target.child_by_field_name("left");
                let right = target.child_by_field_name("right");
                match (left, right) {
                    (Some(left), Some(right)) if right.kind() == "identifier" => {
                        let function = node_text(right, self.source).to_string();
                        match left.kind() {
                            "alias" => Expr::remote(alias_text(left, self.source), function, args),
                            "identifier" if node_text(left, self.source) == "__MODULE__" => {
                                Expr::remote(self.module, function, args)
                            }
                            // dynamic receiver: keep whatever the receiver and arguments contain
                            _ => {
                                let mut items = vec![self.expr(left)];
                                items.extend(args);
                                Expr::Sequence(items)
                            }
                        }
                    }
                    (Some(left), _) => {
                        let mut items = vec![self.expr(left)];
                        items.extend(args);
                        Expr::Sequence(items)
                    }
                    _ => Expr::Sequence(args),
                }
            }
            _ => {
                let mut items = vec![self.expr(target)];
                items.extend(args);
                Expr::Sequence(items)
            }
        }
    }

    /// Argument expressions followed by the do-block, if any
    fn call_arguments(&self, node: Node) -> Vec<Expr> {
        let mut items = Vec::new();
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "arguments" => {
                    let mut arg_cursor = child.walk();
                    items.extend(
                        child.named_children(&mut arg_cursor)
                            .filter(|arg| arg.kind() != "comment")
                            .map(|arg| self.expr(arg)),
                    );
                }
                "do_block" => items.push(self.sequence(child)),
                _ => {}
            }
        }
        items
    }

    fn sequence(&self, node: Node) -> Expr {
        let mut cursor = node.walk();
        let items = node
            .named_children(&mut cursor)
            .filter(|child| child.kind() != "comment")
            .map(|child| self.expr(child))
            .collect();
        Expr::Sequence(items)
    }
}

/// Name of a local call's target, e.g. `defmodule` or `def`
fn call_name<'s>(node: Node, source: &'s str) -> Option<&'s str> {
    if node.kind() != "call" {
        return None;
    }
    node.child_by_field_name("target")
        .filter(|target| target.kind() == "identifier")
        .map(|target| node_text(target, source))
}

fn arguments(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).find(|child| child.kind() == "arguments");
    found
}

fn do_block(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let found = node.named_children(&mut cursor).find(|child| child.kind() == "do_block");
    found
}

fn operator(node: Node) -> Option<&'static str> {
    node.child_by_field_name("operator").map(|op| op.kind())
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children.into_iter()
        .filter(|child| child.has_error())
        .find_map(first_error)
}

/// Extract text content of a node
fn node_text<'s>(node: Node, source: &'s str) -> &'s str {
    &source[node.byte_range()]
}

/// Alias text with any whitespace around the dots removed
fn alias_text(node: Node, source: &str) -> String {
    node_text(node, source).split_whitespace().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> SyntaxTree {
        let mut parser = ElixirParser::new().unwrap();
        parser.parse(source, Path::new("lib/sample.ex")).unwrap()
    }

    /// Remote calls in walk order, ignoring structure
    fn remote_calls(expr: &Expr, out: &mut Vec<String>) {
        match expr {
            Expr::Pipe { left, right } | Expr::Pair(left, right) => {
                remote_calls(left, out);
                remote_calls(right, out);
            }
            Expr::RemoteCall { module, function, args } => {
                out.push(format!("{}.{}", module, function));
                for arg in args {
                    remote_calls(arg, out);
                }
            }
            Expr::LocalCall { args: items, .. } | Expr::Sequence(items) => {
                for item in items {
                    remote_calls(item, out);
                }
            }
            Expr::Var(_) | Expr::Other => {}
        }
    }

    #[test]
    fn test_module_and_functions_are_extracted() {
        let tree = parse(r#"
defmodule App.Order do
  @moduledoc "Orders"

  def place(data) do
    data |> App.Validate.check() |> App.Charge.run()
  end

  defp audit(order), do: App.Audit.log(order)

  def ping, do: :pong
end
"#);

        assert_eq!(tree.module_name(), Some("App.Order"));
        let names: Vec<&str> = tree.modules[0].functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["place", "audit", "ping"]);

        let mut calls = Vec::new();
        remote_calls(&tree.modules[0].function("place").unwrap().body, &mut calls);
        assert_eq!(calls, vec!["App.Validate.check", "App.Charge.run"]);

        let mut calls = Vec::new();
        remote_calls(&tree.modules[0].function("audit").unwrap().body, &mut calls);
        assert_eq!(calls, vec!["App.Audit.log"]);
    }

    #[test]
    fn test_pipe_chain_lowers_left_associative() {
        let tree = parse(r#"
defmodule App.Order do
  def place(data) do
    data |> App.Validate.check() |> App.Charge.run()
  end
end
"#);

        let body = &tree.modules[0].function("place").unwrap().body;
        let expected = Expr::Sequence(vec![Expr::pipe(
            Expr::pipe(Expr::var("data"), Expr::remote("App.Validate", "check", vec![])),
            Expr::remote("App.Charge", "run", vec![]),
        )]);
        assert_eq!(body, &expected);
    }

    #[test]
    fn test_nested_modules_get_qualified_names() {
        let tree = parse(r#"
defmodule Outer do
  def a, do: Outer.Inner.b()

  defmodule Inner do
    def b, do: :ok
  end
end
"#);

        let names: Vec<&str> = tree.modules.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Outer", "Outer.Inner"]);
        assert!(tree.modules[1].function("b").is_some());
    }

    #[test]
    fn test_guards_and_multiple_clauses() {
        let tree = parse(r#"
defmodule App.Math do
  def sign(n) when n < 0, do: App.Neg.handle(n)
  def sign(n), do: App.Pos.handle(n)
end
"#);

        let module = &tree.modules[0];
        assert_eq!(module.functions.len(), 1);
        let mut calls = Vec::new();
        remote_calls(&module.function("sign").unwrap().body, &mut calls);
        assert_eq!(calls, vec!["App.Neg.handle", "App.Pos.handle"]);
    }

    #[test]
    fn test_captures_are_not_calls_and_module_attribute_resolves() {
        let tree = parse(r#"
defmodule App.Batch do
  def run(items) do
    Enum.map(items, &App.Item.load/1)
    __MODULE__.finish(items)
  end
end
"#);

        let mut calls = Vec::new();
        remote_calls(&tree.modules[0].function("run").unwrap().body, &mut calls);
        assert_eq!(calls, vec!["Enum.map", "App.Batch.finish"]);
    }

    #[test]
    fn test_source_without_module() {
        let tree = parse("IO.puts(\"script\")\n");
        assert!(tree.modules.is_empty());
        assert_eq!(tree.module_name(), None);
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let mut parser = ElixirParser::new().unwrap();
        let result = parser.parse("defmodule Broken do\n  def x( do\nend\n", Path::new("lib/broken.ex"));
        assert!(matches!(result, Err(CalltrailError::Parser(_))));
    }
}
