use std::collections::HashSet;

use swc_ecma_ast::*;
use swc_ecma_visit::{Visit, VisitWith};

use crate::edit::BlockItem;

/// The three name sets the reordering policies reason about.
#[derive(Debug, Default, Clone)]
pub struct DependencySet {
    pub declares: HashSet<String>,
    pub reads: HashSet<String>,
    pub mutates: HashSet<String>,
}

pub fn stmt_dependencies(stmt: &Stmt) -> DependencySet {
    DependencySet {
        declares: declared_names(stmt),
        reads: stmt_reads(stmt),
        mutates: stmt_mutations(stmt),
    }
}

/// Names a statement introduces into its scope.
pub fn declared_names(stmt: &Stmt) -> HashSet<String> {
    let mut names = HashSet::new();
    if let Stmt::Decl(decl) = stmt {
        match decl {
            Decl::Var(var) => {
                for declarator in &var.decls {
                    pattern_bound_names(&declarator.name, &mut names);
                }
            }
            Decl::Fn(function) => {
                names.insert(function.ident.sym.to_string());
            }
            Decl::Class(class) => {
                names.insert(class.ident.sym.to_string());
            }
            Decl::Using(using) => {
                for declarator in &using.decls {
                    pattern_bound_names(&declarator.name, &mut names);
                }
            }
            _ => {}
        }
    }
    names
}

/// Every identifier a binding pattern introduces, through any nesting of
/// object, array, rest and default sub-patterns.
pub fn pattern_bound_names(pat: &Pat, names: &mut HashSet<String>) {
    match pat {
        Pat::Ident(binding) => {
            names.insert(binding.id.sym.to_string());
        }
        Pat::Array(array) => {
            for element in array.elems.iter().flatten() {
                pattern_bound_names(element, names);
            }
        }
        Pat::Rest(rest) => pattern_bound_names(&rest.arg, names),
        Pat::Object(object) => {
            for prop in &object.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => pattern_bound_names(&kv.value, names),
                    ObjectPatProp::Assign(assign) => {
                        names.insert(assign.key.id.sym.to_string());
                    }
                    ObjectPatProp::Rest(rest) => pattern_bound_names(&rest.arg, names),
                }
            }
        }
        Pat::Assign(assign) => pattern_bound_names(&assign.left, names),
        Pat::Expr(_) | Pat::Invalid(_) => {}
    }
}

pub fn stmt_reads(stmt: &Stmt) -> HashSet<String> {
    let mut collector = ReadCollector::default();
    stmt.visit_with(&mut collector);
    collector.reads
}

pub fn expr_reads(expr: &Expr) -> HashSet<String> {
    let mut collector = ReadCollector::default();
    expr.visit_with(&mut collector);
    collector.reads
}

pub fn pattern_reads(pat: &Pat) -> HashSet<String> {
    let mut collector = ReadCollector::default();
    collect_pattern_reads(pat, &mut collector);
    collector.reads
}

/// Names a statement writes to, tracked down to the root identifier of
/// member-expression targets. Writes inside nested function bodies are
/// deferred until the function runs, so they are not counted here.
pub fn stmt_mutations(stmt: &Stmt) -> HashSet<String> {
    let mut collector = MutationCollector::new(false);
    stmt.visit_with(&mut collector);
    collector.mutated
}

fn stmt_mutations_deep(stmt: &Stmt) -> HashSet<String> {
    let mut collector = MutationCollector::new(true);
    stmt.visit_with(&mut collector);
    collector.mutated
}

pub fn declares_any(stmt: &Stmt, names: &HashSet<String>) -> bool {
    !declared_names(stmt).is_disjoint(names)
}

pub fn references_any(stmt: &Stmt, names: &HashSet<String>) -> bool {
    !stmt_reads(stmt).is_disjoint(names)
}

pub fn mutates_any(stmt: &Stmt, names: &HashSet<String>) -> bool {
    !stmt_mutations(stmt).is_disjoint(names)
}

/// Collects the identifiers an AST fragment reads. Declared names are
/// filtered at the declaration sites (binding patterns, function names,
/// labels); nested functions contribute their free variables, the names they
/// capture from the enclosing scope. Type positions never count.
#[derive(Default)]
struct ReadCollector {
    reads: HashSet<String>,
}

impl Visit for ReadCollector {
    fn visit_ident(&mut self, node: &Ident) {
        self.reads.insert(node.sym.to_string());
    }

    fn visit_var_declarator(&mut self, node: &VarDeclarator) {
        collect_pattern_reads(&node.name, self);
        if let Some(init) = &node.init {
            init.visit_with(self);
        }
    }

    fn visit_function(&mut self, node: &Function) {
        let mut inner = ReadCollector::default();
        let mut bound = HashSet::new();
        for param in &node.params {
            pattern_bound_names(&param.pat, &mut bound);
            collect_pattern_reads(&param.pat, &mut inner);
        }
        if let Some(body) = &node.body {
            body.visit_with(&mut inner);
            collect_block_locals(body, &mut bound);
        }
        self.reads
            .extend(inner.reads.into_iter().filter(|name| !bound.contains(name)));
    }

    fn visit_fn_decl(&mut self, node: &FnDecl) {
        node.function.visit_with(self);
    }

    fn visit_fn_expr(&mut self, node: &FnExpr) {
        node.function.visit_with(self);
    }

    fn visit_arrow_expr(&mut self, node: &ArrowExpr) {
        let mut inner = ReadCollector::default();
        let mut bound = HashSet::new();
        for param in &node.params {
            pattern_bound_names(param, &mut bound);
            collect_pattern_reads(param, &mut inner);
        }
        match &*node.body {
            BlockStmtOrExpr::BlockStmt(body) => {
                body.visit_with(&mut inner);
                collect_block_locals(body, &mut bound);
            }
            BlockStmtOrExpr::Expr(body) => body.visit_with(&mut inner),
        }
        self.reads
            .extend(inner.reads.into_iter().filter(|name| !bound.contains(name)));
    }

    fn visit_class_decl(&mut self, node: &ClassDecl) {
        node.class.visit_with(self);
    }

    fn visit_class_expr(&mut self, node: &ClassExpr) {
        node.class.visit_with(self);
    }

    fn visit_break_stmt(&mut self, _node: &BreakStmt) {}

    fn visit_continue_stmt(&mut self, _node: &ContinueStmt) {}

    fn visit_labeled_stmt(&mut self, node: &LabeledStmt) {
        node.body.visit_with(self);
    }

    fn visit_ts_type_ann(&mut self, _node: &TsTypeAnn) {}

    fn visit_ts_type(&mut self, _node: &TsType) {}

    fn visit_ts_type_param_decl(&mut self, _node: &TsTypeParamDecl) {}

    fn visit_ts_type_param_instantiation(&mut self, _node: &TsTypeParamInstantiation) {}
}

/// Reads hidden inside a binding pattern: default expressions and computed
/// keys, but never the bound names themselves.
fn collect_pattern_reads(pat: &Pat, collector: &mut ReadCollector) {
    match pat {
        Pat::Ident(_) | Pat::Invalid(_) => {}
        Pat::Array(array) => {
            for element in array.elems.iter().flatten() {
                collect_pattern_reads(element, collector);
            }
        }
        Pat::Rest(rest) => collect_pattern_reads(&rest.arg, collector),
        Pat::Object(object) => {
            for prop in &object.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => {
                        if let PropName::Computed(computed) = &kv.key {
                            computed.expr.visit_with(collector);
                        }
                        collect_pattern_reads(&kv.value, collector);
                    }
                    ObjectPatProp::Assign(assign) => {
                        if let Some(default) = &assign.value {
                            default.visit_with(collector);
                        }
                    }
                    ObjectPatProp::Rest(rest) => collect_pattern_reads(&rest.arg, collector),
                }
            }
        }
        Pat::Assign(assign) => {
            collect_pattern_reads(&assign.left, collector);
            assign.right.visit_with(collector);
        }
        Pat::Expr(expr) => expr.visit_with(collector),
    }
}

/// Names declared directly in a block body, not descending into nested
/// functions (their locals shadow nothing at this level).
fn collect_block_locals(block: &BlockStmt, names: &mut HashSet<String>) {
    for stmt in &block.stmts {
        collect_stmt_locals(stmt, names);
    }
}

fn collect_stmt_locals(stmt: &Stmt, names: &mut HashSet<String>) {
    match stmt {
        Stmt::Decl(decl) => match decl {
            Decl::Var(var) => {
                for declarator in &var.decls {
                    pattern_bound_names(&declarator.name, names);
                }
            }
            Decl::Fn(function) => {
                names.insert(function.ident.sym.to_string());
            }
            Decl::Class(class) => {
                names.insert(class.ident.sym.to_string());
            }
            Decl::Using(using) => {
                for declarator in &using.decls {
                    pattern_bound_names(&declarator.name, names);
                }
            }
            _ => {}
        },
        Stmt::Block(block) => collect_block_locals(block, names),
        Stmt::If(if_stmt) => {
            collect_stmt_locals(&if_stmt.cons, names);
            if let Some(alt) = &if_stmt.alt {
                collect_stmt_locals(alt, names);
            }
        }
        Stmt::For(for_stmt) => {
            if let Some(VarDeclOrExpr::VarDecl(var)) = &for_stmt.init {
                for declarator in &var.decls {
                    pattern_bound_names(&declarator.name, names);
                }
            }
            collect_stmt_locals(&for_stmt.body, names);
        }
        Stmt::ForIn(for_in) => {
            collect_for_head_locals(&for_in.left, names);
            collect_stmt_locals(&for_in.body, names);
        }
        Stmt::ForOf(for_of) => {
            collect_for_head_locals(&for_of.left, names);
            collect_stmt_locals(&for_of.body, names);
        }
        Stmt::While(while_stmt) => collect_stmt_locals(&while_stmt.body, names),
        Stmt::DoWhile(do_while) => collect_stmt_locals(&do_while.body, names),
        Stmt::Try(try_stmt) => {
            collect_block_locals(&try_stmt.block, names);
            if let Some(handler) = &try_stmt.handler {
                if let Some(param) = &handler.param {
                    pattern_bound_names(param, names);
                }
                collect_block_locals(&handler.body, names);
            }
            if let Some(finalizer) = &try_stmt.finalizer {
                collect_block_locals(finalizer, names);
            }
        }
        Stmt::Switch(switch) => {
            for case in &switch.cases {
                for stmt in &case.cons {
                    collect_stmt_locals(stmt, names);
                }
            }
        }
        Stmt::Labeled(labeled) => collect_stmt_locals(&labeled.body, names),
        _ => {}
    }
}

fn collect_for_head_locals(head: &ForHead, names: &mut HashSet<String>) {
    match head {
        ForHead::VarDecl(var) => {
            for declarator in &var.decls {
                pattern_bound_names(&declarator.name, names);
            }
        }
        ForHead::UsingDecl(using) => {
            for declarator in &using.decls {
                pattern_bound_names(&declarator.name, names);
            }
        }
        ForHead::Pat(_) => {}
    }
}

struct MutationCollector {
    mutated: HashSet<String>,
    enter_functions: bool,
}

impl MutationCollector {
    fn new(enter_functions: bool) -> Self {
        Self {
            mutated: HashSet::new(),
            enter_functions,
        }
    }
}

impl Visit for MutationCollector {
    fn visit_assign_expr(&mut self, node: &AssignExpr) {
        collect_assign_target_roots(&node.left, &mut self.mutated);
        node.right.visit_with(self);
    }

    fn visit_update_expr(&mut self, node: &UpdateExpr) {
        if let Some(root) = expr_root_name(&node.arg) {
            self.mutated.insert(root);
        }
    }

    fn visit_function(&mut self, node: &Function) {
        if self.enter_functions {
            node.visit_children_with(self);
        }
    }

    fn visit_arrow_expr(&mut self, node: &ArrowExpr) {
        if self.enter_functions {
            node.visit_children_with(self);
        }
    }
}

fn collect_assign_target_roots(target: &AssignTarget, names: &mut HashSet<String>) {
    match target {
        AssignTarget::Simple(simple) => match simple {
            SimpleAssignTarget::Ident(binding) => {
                names.insert(binding.id.sym.to_string());
            }
            SimpleAssignTarget::Member(member) => {
                if let Some(root) = expr_root_name(&member.obj) {
                    names.insert(root);
                }
            }
            SimpleAssignTarget::Paren(paren) => {
                if let Some(root) = expr_root_name(&paren.expr) {
                    names.insert(root);
                }
            }
            SimpleAssignTarget::OptChain(chain) => match &*chain.base {
                OptChainBase::Member(member) => {
                    if let Some(root) = expr_root_name(&member.obj) {
                        names.insert(root);
                    }
                }
                OptChainBase::Call(_) => {}
            },
            SimpleAssignTarget::TsAs(assertion) => {
                if let Some(root) = expr_root_name(&assertion.expr) {
                    names.insert(root);
                }
            }
            SimpleAssignTarget::TsNonNull(non_null) => {
                if let Some(root) = expr_root_name(&non_null.expr) {
                    names.insert(root);
                }
            }
            SimpleAssignTarget::TsSatisfies(satisfies) => {
                if let Some(root) = expr_root_name(&satisfies.expr) {
                    names.insert(root);
                }
            }
            SimpleAssignTarget::TsTypeAssertion(assertion) => {
                if let Some(root) = expr_root_name(&assertion.expr) {
                    names.insert(root);
                }
            }
            SimpleAssignTarget::TsInstantiation(instantiation) => {
                if let Some(root) = expr_root_name(&instantiation.expr) {
                    names.insert(root);
                }
            }
            SimpleAssignTarget::SuperProp(_) | SimpleAssignTarget::Invalid(_) => {}
        },
        AssignTarget::Pat(pat) => match pat {
            AssignTargetPat::Array(array) => {
                for element in array.elems.iter().flatten() {
                    collect_pat_target_roots(element, names);
                }
            }
            AssignTargetPat::Object(object) => {
                for prop in &object.props {
                    match prop {
                        ObjectPatProp::KeyValue(kv) => collect_pat_target_roots(&kv.value, names),
                        ObjectPatProp::Assign(assign) => {
                            names.insert(assign.key.id.sym.to_string());
                        }
                        ObjectPatProp::Rest(rest) => collect_pat_target_roots(&rest.arg, names),
                    }
                }
            }
            AssignTargetPat::Invalid(_) => {}
        },
    }
}

fn collect_pat_target_roots(pat: &Pat, names: &mut HashSet<String>) {
    match pat {
        Pat::Ident(binding) => {
            names.insert(binding.id.sym.to_string());
        }
        Pat::Expr(expr) => {
            if let Some(root) = expr_root_name(expr) {
                names.insert(root);
            }
        }
        Pat::Array(array) => {
            for element in array.elems.iter().flatten() {
                collect_pat_target_roots(element, names);
            }
        }
        Pat::Object(object) => {
            for prop in &object.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => collect_pat_target_roots(&kv.value, names),
                    ObjectPatProp::Assign(assign) => {
                        names.insert(assign.key.id.sym.to_string());
                    }
                    ObjectPatProp::Rest(rest) => collect_pat_target_roots(&rest.arg, names),
                }
            }
        }
        Pat::Assign(assign) => collect_pat_target_roots(&assign.left, names),
        Pat::Rest(rest) => collect_pat_target_roots(&rest.arg, names),
        Pat::Invalid(_) => {}
    }
}

/// Root identifier of an lvalue-ish expression, e.g. `a` for `a.b[c].d`.
fn expr_root_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Ident(ident) => Some(ident.sym.to_string()),
        Expr::Member(member) => expr_root_name(&member.obj),
        Expr::Paren(paren) => expr_root_name(&paren.expr),
        Expr::OptChain(chain) => match &*chain.base {
            OptChainBase::Member(member) => expr_root_name(&member.obj),
            OptChainBase::Call(call) => expr_root_name(&call.callee),
        },
        Expr::TsNonNull(non_null) => expr_root_name(&non_null.expr),
        Expr::TsAs(assertion) => expr_root_name(&assertion.expr),
        Expr::TsSatisfies(satisfies) => expr_root_name(&satisfies.expr),
        Expr::TsTypeAssertion(assertion) => expr_root_name(&assertion.expr),
        Expr::Call(call) => match &call.callee {
            Callee::Expr(callee) => expr_root_name(callee),
            _ => None,
        },
        _ => None,
    }
}

/// Outcome of asking what a call statement's callee reads beyond its
/// syntactic arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(HashSet<String>),
    Unresolved,
}

enum CalleeShape {
    Named(String),
    Member(Option<String>),
    Opaque,
}

fn callee_shape(callee: &Expr) -> CalleeShape {
    match callee {
        Expr::Ident(ident) => CalleeShape::Named(ident.sym.to_string()),
        Expr::Paren(paren) => callee_shape(&paren.expr),
        Expr::Member(member) => CalleeShape::Member(expr_root_name(&member.obj)),
        Expr::OptChain(chain) => match &*chain.base {
            OptChainBase::Member(member) => CalleeShape::Member(expr_root_name(&member.obj)),
            OptChainBase::Call(_) => CalleeShape::Opaque,
        },
        _ => CalleeShape::Opaque,
    }
}

/// Resolves the extra reads a callee contributes when it is defined in the
/// same block, transitively through block-local callees. Resolution fails
/// when the callee (or its root object) is reassigned in the block, when a
/// block-local non-function value is called, or when the callee shape is
/// unrecognized. Names with no block-local definition are imports or globals
/// and resolve with no extra reads.
pub fn resolve_callee_reads(items: &[BlockItem], callee: &Expr) -> Resolution {
    match callee_shape(callee) {
        CalleeShape::Named(name) => {
            let mut visited = HashSet::new();
            visited.insert(name.clone());
            named_callee_reads(items, &name, &mut visited)
        }
        CalleeShape::Member(Some(root)) => {
            if block_mutates(items, &root) {
                Resolution::Unresolved
            } else {
                Resolution::Resolved(HashSet::new())
            }
        }
        CalleeShape::Member(None) | CalleeShape::Opaque => Resolution::Unresolved,
    }
}

fn named_callee_reads(
    items: &[BlockItem],
    name: &str,
    visited: &mut HashSet<String>,
) -> Resolution {
    if block_mutates(items, name) {
        return Resolution::Unresolved;
    }

    let function = match find_local_function(items, name) {
        Some(function) => function,
        None => {
            return if block_declares(items, name) {
                Resolution::Unresolved
            } else {
                Resolution::Resolved(HashSet::new())
            };
        }
    };

    let mut reads = function.free_vars();
    for nested in function.ident_callees() {
        if !visited.insert(nested.clone()) {
            continue;
        }
        match named_callee_reads(items, &nested, visited) {
            Resolution::Unresolved => return Resolution::Unresolved,
            Resolution::Resolved(extra) => reads.extend(extra),
        }
    }
    Resolution::Resolved(reads)
}

fn block_mutates(items: &[BlockItem], name: &str) -> bool {
    items
        .iter()
        .filter_map(|item| item.stmt)
        .any(|stmt| stmt_mutations_deep(stmt).contains(name))
}

fn block_declares(items: &[BlockItem], name: &str) -> bool {
    items
        .iter()
        .filter_map(|item| item.stmt)
        .any(|stmt| declared_names(stmt).contains(name))
}

enum LocalFunction<'a> {
    Fn(&'a Function),
    Arrow(&'a ArrowExpr),
}

impl LocalFunction<'_> {
    fn free_vars(&self) -> HashSet<String> {
        let mut collector = ReadCollector::default();
        match self {
            LocalFunction::Fn(function) => collector.visit_function(function),
            LocalFunction::Arrow(arrow) => collector.visit_arrow_expr(arrow),
        }
        collector.reads
    }

    fn ident_callees(&self) -> HashSet<String> {
        let mut collector = IdentCalleeCollector::default();
        match self {
            LocalFunction::Fn(function) => function.visit_with(&mut collector),
            LocalFunction::Arrow(arrow) => arrow.visit_with(&mut collector),
        }
        collector.names
    }
}

fn find_local_function<'a>(items: &[BlockItem<'a>], name: &str) -> Option<LocalFunction<'a>> {
    for item in items {
        let stmt = item.stmt?;
        match stmt {
            Stmt::Decl(Decl::Fn(decl)) if decl.ident.sym.as_ref() == name => {
                return Some(LocalFunction::Fn(&decl.function));
            }
            Stmt::Decl(Decl::Var(var)) => {
                for declarator in &var.decls {
                    let Pat::Ident(binding) = &declarator.name else {
                        continue;
                    };
                    if binding.id.sym.as_ref() != name {
                        continue;
                    }
                    match declarator.init.as_deref().map(unwrap_parens) {
                        Some(Expr::Fn(fn_expr)) => {
                            return Some(LocalFunction::Fn(&fn_expr.function));
                        }
                        Some(Expr::Arrow(arrow)) => return Some(LocalFunction::Arrow(arrow)),
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    None
}

fn unwrap_parens(expr: &Expr) -> &Expr {
    match expr {
        Expr::Paren(paren) => unwrap_parens(&paren.expr),
        _ => expr,
    }
}

#[derive(Default)]
struct IdentCalleeCollector {
    names: HashSet<String>,
}

impl Visit for IdentCalleeCollector {
    fn visit_call_expr(&mut self, node: &CallExpr) {
        if let Callee::Expr(callee) = &node.callee {
            if let Expr::Ident(ident) = unwrap_parens(callee) {
                self.names.insert(ident.sym.to_string());
            }
        }
        node.visit_children_with(self);
    }

    fn visit_opt_call(&mut self, node: &OptCall) {
        if let Expr::Ident(ident) = unwrap_parens(&node.callee) {
            self.names.insert(ident.sym.to_string());
        }
        node.visit_children_with(self);
    }
}
