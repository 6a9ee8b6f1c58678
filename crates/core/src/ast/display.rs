use std::fmt::Write;

use super::{Ast, NodeData, NodeId};

impl Ast {
    /// Render the subtree under `id` as an indented `Kind image [span]` listing.
    pub fn dump(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.dump_into(id, 0, &mut out);
        out
    }

    fn dump_into(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = self.node(id);
        let _ = write!(out, "{:indent$}{:?}", "", node.kind, indent = depth * 2);
        if let Some(image) = node.image() {
            let _ = write!(out, " {}", image.replace('\n', "\\n"));
        }
        match &node.data {
            NodeData::Reference(r) => {
                let _ = write!(out, " -> {}", r.name());
            }
            NodeData::Member { modifiers, .. }
            | NodeData::Modifiers(modifiers)
            | NodeData::Parameter { modifiers, .. }
                if !modifiers.is_empty() =>
            {
                let _ = write!(out, " <{}>", modifiers.keywords().join(" "));
            }
            _ => {}
        }
        let _ = writeln!(out, " [{}]", node.span);
        for &child in node.children() {
            self.dump_into(child, depth + 1, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Ast, NodeKind, Span};

    #[test]
    fn dump_indents_children() {
        let mut ast = Ast::new("d.php");
        let f = ast.create(NodeKind::Function, Some("run".into()));
        ast.node_mut(f).span = Span {
            start_line: 2,
            end_line: 4,
            start_column: 1,
            end_column: 1,
        };
        let r = ast.create(NodeKind::ReturnStatement, None);
        ast.add_child(ast.root(), f);
        ast.add_child(f, r);
        let text = ast.dump(ast.root());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "CompilationUnit d.php [0:0-0:0]");
        assert_eq!(lines[1], "  Function run [2:1-4:1]");
        assert!(lines[2].starts_with("    ReturnStatement"));
    }
}
