//! Branch-path enumeration over syntax trees.
//!
//! One preorder walk, parameterized by a per-language [`BranchGrammar`]
//! naming the node kinds and field names that matter. A path is the ordered
//! list of syntactic-kind tokens from the function body down to one leaf,
//! with branch decisions recorded as `if:<cond>-then` / `if:<cond>-else`
//! style tokens.

use std::cell::RefCell;

use tree_sitter::{Node, Parser, Tree};

thread_local! {
    static PY_PARSER: RefCell<Parser> = RefCell::new(make_parser(tree_sitter_python::language()));
    static JAVA_PARSER: RefCell<Parser> = RefCell::new(make_parser(tree_sitter_java::language()));
}

fn make_parser(language: tree_sitter::Language) -> Parser {
    let mut parser = Parser::new();
    parser.set_language(&language).unwrap();
    parser
}

/// Parse Python source into a syntax tree.
pub fn parse_python(source: &str) -> Option<Tree> {
    PY_PARSER.with(|parser| parser.borrow_mut().parse(source, None))
}

/// Parse Java source into a syntax tree.
pub fn parse_java(source: &str) -> Option<Tree> {
    JAVA_PARSER.with(|parser| parser.borrow_mut().parse(source, None))
}

/// Text of a node within its source.
pub fn node_text<'a>(node: Node, source: &'a str) -> &'a str {
    node.utf8_text(source.as_bytes()).unwrap_or_default()
}

/// The node vocabulary a language contributes to the shared walk.
pub struct BranchGrammar {
    /// If-like node kinds paired with their condition-token prefix.
    if_kinds: &'static [(&'static str, &'static str)],
    condition_field: &'static str,
    consequence_field: &'static str,
    alternative_field: &'static str,
    loop_kinds: &'static [&'static str],
    body_field: &'static str,
    try_kind: &'static str,
    /// Catch-like child kinds paired with the token they contribute.
    catch_kinds: &'static [(&'static str, &'static str)],
    finally_kinds: &'static [&'static str],
    switch_kinds: &'static [&'static str],
    switch_block_kinds: &'static [&'static str],
    return_kind: &'static str,
}

/// Python vocabulary.
pub const PYTHON_GRAMMAR: BranchGrammar = BranchGrammar {
    if_kinds: &[("if_statement", "if"), ("elif_clause", "elif")],
    condition_field: "condition",
    consequence_field: "consequence",
    alternative_field: "alternative",
    loop_kinds: &["for_statement", "while_statement"],
    body_field: "body",
    try_kind: "try_statement",
    catch_kinds: &[("except_clause", "except")],
    finally_kinds: &["finally_clause"],
    switch_kinds: &[],
    switch_block_kinds: &[],
    return_kind: "return_statement",
};

/// Java-family vocabulary.
pub const JAVA_GRAMMAR: BranchGrammar = BranchGrammar {
    if_kinds: &[("if_statement", "if")],
    condition_field: "condition",
    consequence_field: "consequence",
    alternative_field: "alternative",
    loop_kinds: &["for_statement", "while_statement"],
    body_field: "body",
    try_kind: "try_statement",
    catch_kinds: &[("catch_clause", "catch")],
    finally_kinds: &["finally_clause"],
    switch_kinds: &["switch_expression", "switch_statement"],
    switch_block_kinds: &["switch_block", "switch_block_statement_group"],
    return_kind: "return_statement",
};

/// Walk the subtree under `node`, appending one emitted path per reachable
/// leaf to `out`. `current` is the accumulated token path of the ancestors.
pub fn collect_paths(
    grammar: &BranchGrammar,
    node: Option<Node>,
    source: &str,
    current: &[String],
    out: &mut Vec<Vec<String>>,
) {
    let Some(node) = node else { return };
    let kind = node.kind();

    let mut path = current.to_vec();
    path.push(kind.to_string());

    if let Some((_, prefix)) = grammar.if_kinds.iter().find(|(k, _)| *k == kind) {
        let condition = match node.child_by_field_name(grammar.condition_field) {
            Some(cond) => format!("{}:{}", prefix, node_text(cond, source)),
            None => (*prefix).to_string(),
        };

        let mut then_path = path.clone();
        then_path.push(format!("{}-then", condition));
        collect_paths(
            grammar,
            node.child_by_field_name(grammar.consequence_field),
            source,
            &then_path,
            out,
        );

        if let Some(alternative) = node.child_by_field_name(grammar.alternative_field) {
            let mut else_path = path;
            else_path.push(format!("{}-else", condition));
            collect_paths(grammar, Some(alternative), source, &else_path, out);
        }
        return;
    }

    if grammar.loop_kinds.contains(&kind) {
        let mut loop_path = path;
        loop_path.push(kind.to_string());
        collect_paths(
            grammar,
            node.child_by_field_name(grammar.body_field),
            source,
            &loop_path,
            out,
        );
        return;
    }

    if kind == grammar.try_kind {
        let mut try_path = path.clone();
        try_path.push("try".to_string());
        collect_paths(
            grammar,
            node.child_by_field_name(grammar.body_field),
            source,
            &try_path,
            out,
        );

        for i in 0..node.named_child_count() {
            let Some(child) = node.named_child(i) else { continue };
            if let Some((_, token)) = grammar.catch_kinds.iter().find(|(k, _)| *k == child.kind()) {
                let mut catch_path = path.clone();
                catch_path.push((*token).to_string());
                collect_paths(grammar, Some(child), source, &catch_path, out);
            } else if grammar.finally_kinds.contains(&child.kind()) {
                let mut finally_path = path.clone();
                finally_path.push("finally".to_string());
                collect_paths(grammar, Some(child), source, &finally_path, out);
            }
        }
        return;
    }

    if grammar.switch_kinds.contains(&kind) {
        for i in 0..node.named_child_count() {
            let Some(child) = node.named_child(i) else { continue };
            if grammar.switch_block_kinds.contains(&child.kind()) {
                let mut case_path = path.clone();
                case_path.push("switch-case".to_string());
                collect_paths(grammar, Some(child), source, &case_path, out);
            }
        }
        return;
    }

    if kind == grammar.return_kind {
        // Carry the returned expression in the token so the prompt renderer
        // has a value for its "returns" line.
        let value = node
            .named_child(0)
            .map(|child| node_text(child, source).to_string())
            .unwrap_or_default();
        path.pop();
        path.push(format!("return:{}", value));
    }

    if node.named_child_count() == 0 {
        out.push(path);
        return;
    }

    for i in 0..node.named_child_count() {
        collect_paths(grammar, node.named_child(i), source, &path, out);
    }
}

/// Collect all nodes of `kind` under `node` in preorder.
pub fn collect_named_nodes<'a>(node: Node<'a>, kind: &str, out: &mut Vec<Node<'a>>) {
    if node.kind() == kind {
        out.push(node);
    }
    for i in 0..node.named_child_count() {
        if let Some(child) = node.named_child(i) {
            collect_named_nodes(child, kind, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn python_function_paths(source: &str) -> Vec<Vec<String>> {
        let tree = parse_python(source).unwrap();
        let root = tree.root_node();
        let mut functions = Vec::new();
        collect_named_nodes(root, "function_definition", &mut functions);
        assert_eq!(functions.len(), 1, "fixture should define one function");

        let mut paths = Vec::new();
        collect_paths(
            &PYTHON_GRAMMAR,
            functions[0].child_by_field_name("body"),
            source,
            &[],
            &mut paths,
        );
        paths
    }

    #[test]
    fn test_straight_line_function_has_no_branch_tokens() {
        let paths = python_function_paths("def f():\n    x = 1\n    y = 2\n");
        assert!(!paths.is_empty());
        for path in &paths {
            assert!(!path.iter().any(|t| t.starts_with("if:")));
        }
    }

    #[test]
    fn test_if_else_produces_then_and_else_paths() {
        let source = "def f(x):\n    if x > 0:\n        return 1\n    else:\n        return 2\n";
        let paths = python_function_paths(source);

        let then_paths: Vec<_> = paths
            .iter()
            .filter(|p| p.iter().any(|t| t.ends_with("-then")))
            .collect();
        let else_paths: Vec<_> = paths
            .iter()
            .filter(|p| p.iter().any(|t| t.ends_with("-else")))
            .collect();

        assert!(!then_paths.is_empty());
        assert!(!else_paths.is_empty());
        assert!(then_paths[0].iter().any(|t| t == "if:x > 0-then"));
    }

    #[test]
    fn test_return_token_carries_value() {
        let source = "def f(x):\n    if x > 0:\n        return 1\n    else:\n        return 2\n";
        let paths = python_function_paths(source);

        let values: Vec<_> = paths
            .iter()
            .flat_map(|p| p.iter())
            .filter_map(|t| t.strip_prefix("return:"))
            .collect();
        assert!(values.contains(&"1"));
        assert!(values.contains(&"2"));
    }

    #[test]
    fn test_loop_body_is_walked() {
        let source = "def f(xs):\n    for x in xs:\n        print(x)\n";
        let paths = python_function_paths(source);
        assert!(paths
            .iter()
            .any(|p| p.iter().any(|t| t == "for_statement")));
    }

    #[test]
    fn test_try_except_paths_are_separate() {
        let source = "def f():\n    try:\n        risky()\n    except ValueError:\n        handle()\n";
        let paths = python_function_paths(source);

        assert!(paths.iter().any(|p| p.iter().any(|t| t == "try")));
        assert!(paths.iter().any(|p| p.iter().any(|t| t == "except")));
        // No path takes both arms.
        assert!(!paths
            .iter()
            .any(|p| p.iter().any(|t| t == "try") && p.iter().any(|t| t == "except")));
    }

    #[test]
    fn test_leaves_partition_across_paths() {
        let source = "def f(x):\n    if x:\n        a()\n    else:\n        b()\n";
        let paths = python_function_paths(source);

        let a_count = paths
            .iter()
            .filter(|p| p.iter().any(|t| t.contains("-then")))
            .count();
        let b_count = paths
            .iter()
            .filter(|p| p.iter().any(|t| t.contains("-else")))
            .count();
        assert!(a_count >= 1);
        assert!(b_count >= 1);
        assert_eq!(paths.len(), a_count + b_count, "every leaf is in exactly one arm");
    }

    #[test]
    fn test_java_if_paths() {
        let source = "class A { int f(int x) { if (x > 0) { return 1; } else { return 2; } } }";
        let tree = parse_java(source).unwrap();
        let root = tree.root_node();
        let mut methods = Vec::new();
        collect_named_nodes(root, "method_declaration", &mut methods);
        assert_eq!(methods.len(), 1);

        let mut paths = Vec::new();
        collect_paths(
            &JAVA_GRAMMAR,
            methods[0].child_by_field_name("body"),
            source,
            &[],
            &mut paths,
        );

        assert!(paths
            .iter()
            .any(|p| p.iter().any(|t| t.starts_with("if:") && t.ends_with("-then"))));
        assert!(paths
            .iter()
            .any(|p| p.iter().any(|t| t.starts_with("if:") && t.ends_with("-else"))));
    }

    #[test]
    fn test_collect_named_nodes_preorder() {
        let source = "def a():\n    pass\n\ndef b():\n    pass\n";
        let tree = parse_python(source).unwrap();
        let mut functions = Vec::new();
        collect_named_nodes(tree.root_node(), "function_definition", &mut functions);
        assert_eq!(functions.len(), 2);

        let first = functions[0]
            .child_by_field_name("name")
            .map(|n| node_text(n, source))
            .unwrap();
        assert_eq!(first, "a");
    }
}
