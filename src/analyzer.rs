use anyhow::Result;
use swc_common::Spanned;
use swc_ecma_ast::*;
use swc_ecma_visit::{Visit, VisitWith};

use crate::block_reorder::BlockReorderer;
use crate::edit::{apply_edits, BlockItem, Edit, Enclosing, SourceContext};
use crate::member_graph::{reorder_edit, MemberGraph, ReadabilitySorter};
use crate::parser::{ParsedModule, TypeScriptParser};
use crate::report::{PassState, Violation, ViolationKind};

/// Runs one analysis pass over a source file and returns its violations,
/// each carrying the edit that fixes it. Overlapping fixes are dropped in
/// favor of the first reported one; a later pass picks them up again.
pub fn analyze_source(source: &str, filename: &str) -> Result<Vec<Violation>> {
    let parser = TypeScriptParser::new();
    let parsed = parser.parse(source, filename)?;
    Ok(run_pass(source, &parsed))
}

/// Result of running the fixer to a fixed point.
pub struct FixOutcome {
    pub code: String,
    pub passes: usize,
    pub violations: Vec<Violation>,
}

/// Applies fixes repeatedly (analyze, apply, reparse) until the source stops
/// changing or `max_passes` is reached. Each pass applies only mutually
/// non-overlapping edits, so the loop converges instead of thrashing.
pub fn fix_source(source: &str, filename: &str, max_passes: usize) -> Result<FixOutcome> {
    let mut code = source.to_string();
    let mut all_violations = Vec::new();
    let mut passes = 0;

    while passes < max_passes {
        let violations = analyze_source(&code, filename)?;
        if violations.is_empty() {
            break;
        }

        let edits: Vec<Edit> = violations
            .iter()
            .flat_map(|violation| violation.edits.iter().cloned())
            .collect();
        let next = apply_edits(&code, &edits);
        passes += 1;
        all_violations.extend(violations);

        if next == code {
            break;
        }
        code = next;
    }

    Ok(FixOutcome {
        code,
        passes,
        violations: all_violations,
    })
}

fn run_pass(source: &str, parsed: &ParsedModule) -> Vec<Violation> {
    let ctx = SourceContext::new(source, parsed.source_file.start_pos, &parsed.comments);
    let reorderer = BlockReorderer::new(&ctx);
    let mut pass = PassState::new();

    let items: Vec<BlockItem> = parsed
        .module
        .body
        .iter()
        .map(|item| match item {
            ModuleItem::Stmt(stmt) => BlockItem {
                lo: stmt.span().lo,
                hi: stmt.span().hi,
                stmt: Some(stmt),
            },
            // Imports and exports stay put and nothing moves across them.
            ModuleItem::ModuleDecl(decl) => BlockItem {
                lo: decl.span().lo,
                hi: decl.span().hi,
                stmt: None,
            },
        })
        .collect();
    let enclosing = Enclosing {
        lo: parsed.source_file.start_pos,
        hi: parsed.source_file.end_pos,
        brace_delimited: false,
    };
    reorderer.analyze(&items, &enclosing, &mut pass);

    let mut visitor = PassVisitor {
        ctx: &ctx,
        reorderer: &reorderer,
        pass,
    };
    parsed.module.visit_with(&mut visitor);

    filter_overlapping(visitor.pass.into_violations())
}

struct PassVisitor<'a> {
    ctx: &'a SourceContext<'a>,
    reorderer: &'a BlockReorderer<'a>,
    pass: PassState,
}

impl PassVisitor<'_> {
    fn analyze_class(&mut self, class: &Class, name: Option<&str>) {
        let Some(graph) = MemberGraph::build(class, name) else {
            return;
        };
        if graph.nodes.len() < 2 {
            return;
        }

        let sorted = ReadabilitySorter::new(&graph).sorted_names();
        let current: Vec<&str> = graph.nodes.iter().map(|node| node.name.as_str()).collect();
        if current
            .iter()
            .copied()
            .eq(sorted.iter().map(String::as_str))
        {
            return;
        }

        let Some(edit) = reorder_edit(self.ctx, &graph, &sorted) else {
            return;
        };
        self.pass.report_once(
            (class.span.lo.0, class.span.hi.0),
            Violation {
                kind: ViolationKind::MemberOrderShouldChange,
                message: "Class members should be ordered for top-down readability".to_string(),
                span: (
                    self.ctx.offset(class.span.lo),
                    self.ctx.offset(class.span.hi),
                ),
                edits: vec![edit],
            },
        );
    }
}

impl Visit for PassVisitor<'_> {
    fn visit_block_stmt(&mut self, node: &BlockStmt) {
        let items: Vec<BlockItem> = node
            .stmts
            .iter()
            .map(|stmt| BlockItem {
                lo: stmt.span().lo,
                hi: stmt.span().hi,
                stmt: Some(stmt),
            })
            .collect();
        let enclosing = Enclosing {
            lo: node.span.lo,
            hi: node.span.hi,
            brace_delimited: true,
        };
        self.reorderer.analyze(&items, &enclosing, &mut self.pass);
        node.visit_children_with(self);
    }

    fn visit_class_decl(&mut self, node: &ClassDecl) {
        self.analyze_class(&node.class, Some(node.ident.sym.as_ref()));
        node.visit_children_with(self);
    }

    fn visit_class_expr(&mut self, node: &ClassExpr) {
        let name = node.ident.as_ref().map(|ident| ident.sym.to_string());
        self.analyze_class(&node.class, name.as_deref());
        node.visit_children_with(self);
    }
}

/// Keeps violations in report order, dropping any whose fix overlaps an
/// already kept fix.
fn filter_overlapping(violations: Vec<Violation>) -> Vec<Violation> {
    let mut kept: Vec<Violation> = Vec::new();
    for violation in violations {
        let collides = kept.iter().any(|existing| {
            existing
                .edits
                .iter()
                .any(|edit| violation.edits.iter().any(|candidate| candidate.overlaps(edit)))
        });
        if !collides {
            kept.push(violation);
        }
    }
    kept
}
