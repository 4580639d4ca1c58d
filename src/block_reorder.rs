use std::collections::{HashMap, HashSet};

use swc_common::Spanned;
use swc_ecma_ast::*;

use crate::dependency::{
    declared_names, declares_any, expr_reads, mutates_any, pattern_reads, references_any,
    resolve_callee_reads, stmt_reads, Resolution,
};
use crate::edit::{move_edit, BlockItem, Enclosing, SourceContext};
use crate::purity::{callee_is_lifecycle, PurityClassifier};
use crate::report::{PassState, Violation, ViolationKind};

const PREVIEW_LEN: usize = 60;

/// Runs the four block-level ordering policies over one statement list.
/// Policies only ever report a move whose target was reached by crossing
/// nothing but pure declarations that do not touch the mover's dependencies,
/// so applying the fix cannot change observable behavior.
pub struct BlockReorderer<'a> {
    ctx: &'a SourceContext<'a>,
    purity: PurityClassifier,
}

impl<'a> BlockReorderer<'a> {
    pub fn new(ctx: &'a SourceContext<'a>) -> Self {
        Self {
            ctx,
            purity: PurityClassifier::new(),
        }
    }

    pub fn analyze(&self, items: &[BlockItem], enclosing: &Enclosing, pass: &mut PassState) {
        self.hoist_guards(items, enclosing, pass);
        self.group_derived(items, enclosing, pass);
        self.pull_down_late_declarations(items, enclosing, pass);
        self.pull_up_side_effects(items, enclosing, pass);
    }

    /// Guard clauses (an `if` with no `else` whose body immediately exits)
    /// move above any pure setup they do not depend on.
    fn hoist_guards(&self, items: &[BlockItem], enclosing: &Enclosing, pass: &mut PassState) {
        for (index, item) in items.iter().enumerate() {
            let Some(stmt) = item.stmt else {
                continue;
            };
            let Some(guard) = as_guard(stmt) else {
                continue;
            };

            let mut deps = expr_reads(&guard.test);
            deps.extend(stmt_reads(&guard.cons));

            let target = self.earliest_safe_index(items, index, &deps);
            if target == index {
                continue;
            }

            let test_text = guard_test_text(self.ctx, guard);
            pass.report_once(
                span_key(item),
                Violation {
                    kind: ViolationKind::GuardShouldMove,
                    message: format!(
                        "Early exit \"{test_text}\" should appear before the setup it skips"
                    ),
                    span: (self.ctx.offset(item.lo), self.ctx.offset(item.hi)),
                    edits: vec![move_edit(self.ctx, items, index, target, enclosing)],
                },
            );
        }
    }

    /// A declaration reading names declared earlier in the same block moves
    /// up next to the last of those declarations, provided everything in
    /// between is pure and unrelated to either side.
    fn group_derived(&self, items: &[BlockItem], enclosing: &Enclosing, pass: &mut PassState) {
        let mut declared_indices: HashMap<String, usize> = HashMap::new();

        for (index, item) in items.iter().enumerate() {
            if let Some(stmt @ Stmt::Decl(Decl::Var(var))) = item.stmt {
                let mut deps: HashSet<String> = HashSet::new();
                for declarator in &var.decls {
                    deps.extend(pattern_reads(&declarator.name));
                    if let Some(init) = &declarator.init {
                        deps.extend(expr_reads(init));
                    }
                }

                let mut anchor: Option<(usize, &str)> = None;
                for name in &deps {
                    if let Some(&declared_at) = declared_indices.get(name) {
                        let better = match anchor {
                            None => true,
                            Some((best, best_name)) => {
                                declared_at > best
                                    || (declared_at == best && name.as_str() > best_name)
                            }
                        };
                        if better {
                            anchor = Some((declared_at, name));
                        }
                    }
                }

                if let Some((anchor_index, anchor_name)) = anchor {
                    if anchor_index + 1 < index && !pass.already_reported(span_key(item)) {
                        let declared = declared_names(stmt);
                        let prior: HashSet<String> =
                            deps.iter()
                                .filter(|n| declared_indices.contains_key(n.as_str()))
                                .cloned()
                                .collect();

                        let blocked = items[anchor_index + 1..index].iter().any(|between| {
                            match between.stmt {
                                None => true,
                                Some(between) => {
                                    !self.purity.is_pure_declaration(between)
                                        || declares_any(between, &prior)
                                        || references_any(between, &prior)
                                        || declares_any(between, &declared)
                                        || references_any(between, &declared)
                                }
                            }
                        });

                        if !blocked {
                            let name = declared
                                .iter()
                                .min()
                                .cloned()
                                .unwrap_or_else(|| "value".to_string());
                            pass.report_once(
                                span_key(item),
                                Violation {
                                    kind: ViolationKind::DerivedValueShouldGroup,
                                    message: format!(
                                        "Declaration \"{name}\" depends on \"{anchor_name}\" but is separated from it by unrelated statements"
                                    ),
                                    span: (self.ctx.offset(item.lo), self.ctx.offset(item.hi)),
                                    edits: vec![move_edit(
                                        self.ctx,
                                        items,
                                        index,
                                        anchor_index + 1,
                                        enclosing,
                                    )],
                                },
                            );
                        }
                    }
                }
            }

            if let Some(stmt) = item.stmt {
                for name in declared_names(stmt) {
                    declared_indices.insert(name, index);
                }
            }
        }
    }

    /// Placeholder declarations (single binding, no init or a literal or
    /// bare-identifier init) move down next to their first use when only
    /// pure, unrelated declarations sit in between.
    fn pull_down_late_declarations(
        &self,
        items: &[BlockItem],
        enclosing: &Enclosing,
        pass: &mut PassState,
    ) {
        for (index, item) in items.iter().enumerate() {
            let Some(stmt) = item.stmt else {
                continue;
            };
            let Stmt::Decl(Decl::Var(var)) = stmt else {
                continue;
            };
            if var.decls.len() != 1 {
                continue;
            }
            let declarator = &var.decls[0];
            let Pat::Ident(binding) = &declarator.name else {
                continue;
            };
            let init_dep = match declarator.init.as_deref() {
                None | Some(Expr::Lit(_)) => None,
                Some(Expr::Ident(ident)) => Some(ident.sym.to_string()),
                Some(_) => continue,
            };

            // A declaration copying a name declared earlier in this block
            // belongs to derived-value grouping, which anchors it next to
            // that name; pulling it down would undo the grouping.
            if let Some(dep) = &init_dep {
                let dep_set: HashSet<String> = std::iter::once(dep.clone()).collect();
                let declared_earlier = items[..index].iter().any(|earlier| {
                    earlier
                        .stmt
                        .map_or(false, |stmt| declares_any(stmt, &dep_set))
                });
                if declared_earlier {
                    continue;
                }
            }

            let name = binding.id.sym.to_string();
            let name_set: HashSet<String> = std::iter::once(name.clone()).collect();

            let mut usage_index = None;
            for (cursor, later) in items.iter().enumerate().skip(index + 1) {
                let Some(later) = later.stmt else {
                    break;
                };
                if references_any(later, &name_set) {
                    usage_index = Some(cursor);
                    break;
                }
            }
            let Some(usage_index) = usage_index else {
                continue;
            };
            if usage_index <= index + 1 {
                continue;
            }

            // A loop that both reads and rewrites the placeholder must keep
            // running before any later reader sees the final value.
            if let Some(usage_stmt) = items[usage_index].stmt {
                if is_loop(usage_stmt) && mutates_any(usage_stmt, &name_set) {
                    let read_later = items[usage_index + 1..].iter().any(|later| {
                        later
                            .stmt
                            .map_or(true, |stmt| references_any(stmt, &name_set))
                    });
                    if read_later {
                        continue;
                    }
                }
            }

            let deps: HashSet<String> = init_dep.into_iter().collect();
            let blocked = items[index + 1..usage_index]
                .iter()
                .any(|between| match between.stmt {
                    None => true,
                    Some(between) => {
                        !self.purity.is_pure_declaration(between)
                            || declares_any(between, &name_set)
                            || mutates_any(between, &name_set)
                            || (!deps.is_empty()
                                && (declares_any(between, &deps)
                                    || references_any(between, &deps)
                                    || mutates_any(between, &deps)))
                    }
                });
            if blocked {
                continue;
            }

            pass.report_once(
                span_key(item),
                Violation {
                    kind: ViolationKind::DeclarationShouldMoveCloser,
                    message: format!("Move declaration \"{name}\" next to its first use"),
                    span: (self.ctx.offset(item.lo), self.ctx.offset(item.hi)),
                    edits: vec![move_edit(self.ctx, items, index, usage_index, enclosing)],
                },
            );
        }
    }

    /// Bare call statements whose callee resolves move above unrelated pure
    /// setup. Lifecycle calls are pinned where they are.
    fn pull_up_side_effects(
        &self,
        items: &[BlockItem],
        enclosing: &Enclosing,
        pass: &mut PassState,
    ) {
        for (index, item) in items.iter().enumerate() {
            let Some(stmt) = item.stmt else {
                continue;
            };
            let Stmt::Expr(expr_stmt) = stmt else {
                continue;
            };
            let Some(callee) = extract_call_callee(&expr_stmt.expr) else {
                continue;
            };
            if callee_is_lifecycle(callee) {
                continue;
            }

            let mut deps = expr_reads(&expr_stmt.expr);
            match resolve_callee_reads(items, callee) {
                Resolution::Unresolved => continue,
                Resolution::Resolved(extra) => deps.extend(extra),
            }

            let target = self.earliest_safe_index(items, index, &deps);
            if target == index {
                continue;
            }

            let effect_text = preview(self.ctx.text(item.lo, item.hi).trim());
            pass.report_once(
                span_key(item),
                Violation {
                    kind: ViolationKind::SideEffectShouldMoveEarlier,
                    message: format!(
                        "Side effect \"{effect_text}\" is buried after unrelated setup"
                    ),
                    span: (self.ctx.offset(item.lo), self.ctx.offset(item.hi)),
                    edits: vec![move_edit(self.ctx, items, index, target, enclosing)],
                },
            );
        }
    }

    /// Walks upward from `start`, crossing only pure declarations that
    /// neither declare nor read any of `deps`. Returns the earliest index the
    /// statement could occupy without changing behavior.
    fn earliest_safe_index(
        &self,
        items: &[BlockItem],
        start: usize,
        deps: &HashSet<String>,
    ) -> usize {
        let mut target = start;
        for cursor in (0..start).rev() {
            let Some(stmt) = items[cursor].stmt else {
                break;
            };
            if !self.purity.is_pure_declaration(stmt) {
                break;
            }
            if declares_any(stmt, deps) || references_any(stmt, deps) {
                break;
            }
            target = cursor;
        }
        target
    }
}

fn span_key(item: &BlockItem) -> (u32, u32) {
    (item.lo.0, item.hi.0)
}

/// An `if` with no `else` whose consequent is a single immediate exit
/// (`return`, `throw`, `break` or `continue`), directly or in a one-statement
/// block.
fn as_guard(stmt: &Stmt) -> Option<&IfStmt> {
    let Stmt::If(if_stmt) = stmt else {
        return None;
    };
    if if_stmt.alt.is_some() {
        return None;
    }
    let exits = match &*if_stmt.cons {
        Stmt::Block(block) => block.stmts.len() == 1 && is_exit(&block.stmts[0]),
        single => is_exit(single),
    };
    exits.then_some(if_stmt)
}

fn is_exit(stmt: &Stmt) -> bool {
    matches!(
        stmt,
        Stmt::Return(_) | Stmt::Throw(_) | Stmt::Break(_) | Stmt::Continue(_)
    )
}

fn is_loop(stmt: &Stmt) -> bool {
    matches!(
        stmt,
        Stmt::While(_) | Stmt::DoWhile(_) | Stmt::For(_) | Stmt::ForIn(_) | Stmt::ForOf(_)
    )
}

/// Callee of a bare call statement, looking through parens and optional
/// chains. `super(...)` and `import(...)` yield `None`.
fn extract_call_callee(expr: &Expr) -> Option<&Expr> {
    match expr {
        Expr::Call(call) => match &call.callee {
            Callee::Expr(callee) => Some(&**callee),
            _ => None,
        },
        Expr::OptChain(chain) => match &*chain.base {
            OptChainBase::Call(call) => Some(&*call.callee),
            _ => None,
        },
        Expr::Paren(paren) => extract_call_callee(&paren.expr),
        _ => None,
    }
}

fn guard_test_text(ctx: &SourceContext, guard: &IfStmt) -> String {
    let span = guard.test.span();
    preview(ctx.text(span.lo, span.hi))
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_LEN {
        text.to_string()
    } else {
        let head: String = text.chars().take(PREVIEW_LEN).collect();
        format!("{head}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{ParsedModule, TypeScriptParser};

    fn parse(source: &str) -> ParsedModule {
        TypeScriptParser::new().parse(source, "test.ts").unwrap()
    }

    fn first_stmt(parsed: &ParsedModule) -> &Stmt {
        parsed.module.body[0]
            .as_stmt()
            .expect("expected a statement")
    }

    #[test]
    fn test_guard_detection() {
        let throw_guard = parse("if (!flag) { throw new Error('x'); }");
        assert!(as_guard(first_stmt(&throw_guard)).is_some());

        let bare_throw = parse("if (!flag) throw new Error('x');");
        assert!(as_guard(first_stmt(&bare_throw)).is_some());

        let with_else = parse("if (!flag) { throw new Error('x'); } else { g(); }");
        assert!(as_guard(first_stmt(&with_else)).is_none());

        let non_exit = parse("if (!flag) { g(); }");
        assert!(as_guard(first_stmt(&non_exit)).is_none());

        let two_stmts = parse("if (!flag) { g(); throw new Error('x'); }");
        assert!(as_guard(first_stmt(&two_stmts)).is_none());
    }

    #[test]
    fn test_exit_kinds() {
        for source in [
            "while (x) { if (a) { break; } }",
            "while (x) { if (a) { continue; } }",
        ] {
            let parsed = parse(source);
            let Stmt::While(while_stmt) = first_stmt(&parsed) else {
                panic!("expected while");
            };
            let Stmt::Block(body) = &*while_stmt.body else {
                panic!("expected block");
            };
            assert!(as_guard(&body.stmts[0]).is_some());
        }
    }

    #[test]
    fn test_preview_truncation() {
        assert_eq!(preview("short"), "short");
        let long = "x".repeat(80);
        let truncated = preview(&long);
        assert_eq!(truncated.chars().count(), PREVIEW_LEN + 1);
        assert!(truncated.ends_with('…'));
    }

    #[test]
    fn test_extract_call_skips_non_calls() {
        let parsed = parse("value;\nf();\nobj?.run();");
        let Stmt::Expr(bare) = first_stmt(&parsed) else {
            panic!("expected expression statement");
        };
        assert!(extract_call_callee(&bare.expr).is_none());

        for index in [1, 2] {
            let Some(Stmt::Expr(call)) = parsed.module.body[index].as_stmt() else {
                panic!("expected expression statement");
            };
            assert!(extract_call_callee(&call.expr).is_some());
        }
    }
}
