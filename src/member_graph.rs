use std::collections::HashSet;

use swc_common::{BytePos, Spanned};
use swc_ecma_ast::*;
use swc_ecma_visit::{Visit, VisitWith};

use crate::edit::{Edit, SourceContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Constructor,
    Method,
    Property,
}

/// One class member, with the sibling members its body references through
/// `this.x` or `ClassName.x`. Property-typed targets are dropped from the
/// dependency list: reading a field is not a control-flow edge.
#[derive(Debug)]
pub struct MemberNode {
    pub name: String,
    pub kind: MemberKind,
    pub is_static: bool,
    pub accessibility: Option<Accessibility>,
    pub dependencies: Vec<String>,
    pub index: usize,
    pub lo: BytePos,
    pub hi: BytePos,
}

/// Dependency graph over a class body, in source order.
pub struct MemberGraph {
    pub nodes: Vec<MemberNode>,
}

impl MemberGraph {
    /// Builds the graph, or `None` when the class has members the sorter
    /// cannot key by name (computed keys, index signatures, static blocks,
    /// auto-accessors) or duplicate names (overload signatures, get/set
    /// pairs). Such classes are left untouched.
    pub fn build(class: &Class, class_name: Option<&str>) -> Option<MemberGraph> {
        let mut nodes = Vec::new();
        let mut bodies: Vec<Option<&BlockStmt>> = Vec::new();

        for member in &class.body {
            let span = member.span();
            let (name, kind, is_static, accessibility, body) = match member {
                ClassMember::Constructor(ctor) => (
                    "constructor".to_string(),
                    MemberKind::Constructor,
                    false,
                    ctor.accessibility,
                    ctor.body.as_ref(),
                ),
                ClassMember::Method(method) => (
                    prop_name_key(&method.key)?,
                    MemberKind::Method,
                    method.is_static,
                    method.accessibility,
                    method.function.body.as_ref(),
                ),
                ClassMember::PrivateMethod(method) => (
                    format!("#{}", method.key.name),
                    MemberKind::Method,
                    method.is_static,
                    method.accessibility,
                    method.function.body.as_ref(),
                ),
                ClassMember::ClassProp(prop) => (
                    prop_name_key(&prop.key)?,
                    MemberKind::Property,
                    prop.is_static,
                    prop.accessibility,
                    None,
                ),
                ClassMember::PrivateProp(prop) => (
                    format!("#{}", prop.key.name),
                    MemberKind::Property,
                    prop.is_static,
                    prop.accessibility,
                    None,
                ),
                ClassMember::Empty(_) => continue,
                _ => return None,
            };

            let index = nodes.len();
            nodes.push(MemberNode {
                name,
                kind,
                is_static,
                accessibility,
                dependencies: Vec::new(),
                index,
                lo: span.lo,
                hi: span.hi,
            });
            bodies.push(body);
        }

        let mut seen = HashSet::new();
        if !nodes.iter().all(|node| seen.insert(node.name.clone())) {
            return None;
        }

        let names: Vec<(String, MemberKind)> = nodes
            .iter()
            .map(|node| (node.name.clone(), node.kind))
            .collect();
        for (node, body) in nodes.iter_mut().zip(&bodies) {
            let Some(body) = body else {
                continue;
            };
            let mut collector = MemberRefCollector {
                class_name,
                refs: Vec::new(),
            };
            body.visit_with(&mut collector);

            let mut added = HashSet::new();
            for reference in collector.refs {
                if reference == node.name || !added.insert(reference.clone()) {
                    continue;
                }
                let is_executable = names
                    .iter()
                    .any(|(name, kind)| *name == reference && *kind != MemberKind::Property);
                if is_executable {
                    node.dependencies.push(reference);
                }
            }
        }

        Some(MemberGraph { nodes })
    }

    pub fn node(&self, name: &str) -> Option<&MemberNode> {
        self.nodes.iter().find(|node| node.name == name)
    }
}

fn prop_name_key(key: &PropName) -> Option<String> {
    match key {
        PropName::Ident(ident) => Some(ident.sym.to_string()),
        PropName::Str(string) => Some(string.value.to_string()),
        _ => None,
    }
}

/// Collects `this.x` and `ClassName.x` references inside a member body.
struct MemberRefCollector<'a> {
    class_name: Option<&'a str>,
    refs: Vec<String>,
}

impl Visit for MemberRefCollector<'_> {
    fn visit_member_expr(&mut self, node: &MemberExpr) {
        let through_self = match &*node.obj {
            Expr::This(_) => true,
            Expr::Ident(ident) => self
                .class_name
                .map_or(false, |name| ident.sym.as_ref() == name),
            _ => false,
        };
        if through_self {
            match &node.prop {
                MemberProp::Ident(prop) => self.refs.push(prop.sym.to_string()),
                MemberProp::PrivateName(prop) => self.refs.push(format!("#{}", prop.name)),
                MemberProp::Computed(computed) => computed.visit_with(self),
            }
        } else {
            node.visit_children_with(self);
        }
    }

    // Nested classes have their own `this`.
    fn visit_class(&mut self, _node: &Class) {}
}

/// Produces the top-down reading order: properties first (static before
/// instance, then by visibility, then source order), then executables in
/// depth-first call order starting from the constructor, then unreferenced
/// entry points, then dependency-free members. Anything unreachable keeps
/// its source order at the end.
pub struct ReadabilitySorter<'a> {
    graph: &'a MemberGraph,
}

impl<'a> ReadabilitySorter<'a> {
    pub fn new(graph: &'a MemberGraph) -> Self {
        Self { graph }
    }

    pub fn sorted_names(&self) -> Vec<String> {
        let mut properties: Vec<&MemberNode> = self
            .graph
            .nodes
            .iter()
            .filter(|node| node.kind == MemberKind::Property)
            .collect();
        properties.sort_by(|a, b| {
            b.is_static
                .cmp(&a.is_static)
                .then_with(|| accessibility_rank(a).cmp(&accessibility_rank(b)))
                .then_with(|| a.index.cmp(&b.index))
        });

        let executables: Vec<&MemberNode> = self
            .graph
            .nodes
            .iter()
            .filter(|node| node.kind != MemberKind::Property)
            .collect();
        let referenced: HashSet<&str> = executables
            .iter()
            .flat_map(|node| node.dependencies.iter().map(String::as_str))
            .collect();

        let mut entries: Vec<(u8, usize, &MemberNode)> = executables
            .iter()
            .filter_map(|node| {
                let rank = if node.kind == MemberKind::Constructor {
                    0
                } else if !referenced.contains(node.name.as_str()) {
                    1
                } else if node.dependencies.is_empty() {
                    2
                } else {
                    return None;
                };
                Some((rank, node.index, *node))
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));

        let mut visited = HashSet::new();
        let mut order = Vec::new();
        for (_, _, entry) in &entries {
            self.visit(entry, &mut visited, &mut order);
        }
        for node in &executables {
            if visited.insert(node.name.clone()) {
                order.push(node.name.clone());
            }
        }

        properties
            .iter()
            .map(|node| node.name.clone())
            .chain(order)
            .collect()
    }

    fn visit(&self, node: &MemberNode, visited: &mut HashSet<String>, order: &mut Vec<String>) {
        if !visited.insert(node.name.clone()) {
            return;
        }
        order.push(node.name.clone());
        for dep in &node.dependencies {
            if let Some(next) = self.graph.node(dep) {
                self.visit(next, visited, order);
            }
        }
    }
}

fn accessibility_rank(node: &MemberNode) -> u8 {
    match node.accessibility {
        Some(Accessibility::Public) => 0,
        None => 1,
        Some(Accessibility::Protected) => 2,
        Some(Accessibility::Private) => 3,
    }
}

/// Replaces the whole member list in one edit: the span from the first
/// member (with its comments) to the last, re-emitted in sorted order with
/// each member keeping its original line indentation.
pub fn reorder_edit(ctx: &SourceContext, graph: &MemberGraph, sorted: &[String]) -> Option<Edit> {
    let first = graph.nodes.first()?;
    let last = graph.nodes.last()?;
    let start = ctx.start_with_comments(first.lo);
    let end = ctx.offset(last.hi);

    let mut new_text = String::new();
    for name in sorted {
        let Some(node) = graph.node(name) else {
            continue;
        };
        let member_start = ctx.start_with_comments(node.lo);
        if !new_text.is_empty() {
            new_text.push('\n');
            new_text.push_str(line_indent(ctx.source, member_start));
        }
        new_text.push_str(&ctx.source[member_start..ctx.offset(node.hi)]);
    }

    Some(Edit {
        span: (start, end),
        new_text,
    })
}

/// Whitespace prefix of the line `start` sits on; empty when anything other
/// than spaces or tabs precedes `start` on that line.
fn line_indent(source: &str, start: usize) -> &str {
    let line_start = source[..start].rfind('\n').map_or(0, |pos| pos + 1);
    let prefix = &source[line_start..start];
    if prefix.bytes().all(|b| b == b' ' || b == b'\t') {
        prefix
    } else {
        ""
    }
}
