use swc_ecma_ast::*;

/// Decides whether expressions and declarations are safe to relocate past.
/// The default classifier treats every call as unsafe; a classifier built
/// with [`PurityClassifier::allowing_lifecycle_calls`] additionally accepts
/// framework lifecycle calls (`useX(...)` hooks) whose arguments are safe.
pub struct PurityClassifier {
    allow_lifecycle_calls: bool,
}

impl PurityClassifier {
    pub fn new() -> Self {
        Self {
            allow_lifecycle_calls: false,
        }
    }

    pub fn allowing_lifecycle_calls() -> Self {
        Self {
            allow_lifecycle_calls: true,
        }
    }

    /// A statement other statements may be reordered across: a `var`, `let`
    /// or `const` declaration whose bindings and initializers are all safe.
    pub fn is_pure_declaration(&self, stmt: &Stmt) -> bool {
        let Stmt::Decl(Decl::Var(var)) = stmt else {
            return false;
        };
        var.decls.iter().all(|declarator| {
            self.pattern_defaults_are_safe(&declarator.name)
                && declarator
                    .init
                    .as_deref()
                    .map_or(true, |init| self.is_safe_expr(init))
        })
    }

    /// Syntactic safety: evaluating the expression cannot run arbitrary user
    /// code or observably mutate state. Anything unrecognized is unsafe.
    pub fn is_safe_expr(&self, expr: &Expr) -> bool {
        match expr {
            Expr::Lit(_) | Expr::Ident(_) | Expr::This(_) => true,
            Expr::Tpl(template) => template.exprs.iter().all(|part| self.is_safe_expr(part)),
            Expr::Paren(paren) => self.is_safe_expr(&paren.expr),
            Expr::Member(member) => {
                self.member_prop_is_safe(&member.prop) && self.is_safe_expr(&member.obj)
            }
            Expr::SuperProp(super_prop) => match &super_prop.prop {
                SuperProp::Ident(_) => true,
                SuperProp::Computed(computed) => self.is_safe_expr(&computed.expr),
            },
            Expr::Array(array) => array.elems.iter().all(|element| match element {
                None => true,
                Some(element) => element.spread.is_none() && self.is_safe_expr(&element.expr),
            }),
            Expr::Object(object) => object.props.iter().all(|prop| match prop {
                PropOrSpread::Spread(_) => false,
                PropOrSpread::Prop(prop) => match &**prop {
                    Prop::Shorthand(_) => true,
                    Prop::KeyValue(kv) => {
                        let key_safe = match &kv.key {
                            PropName::Computed(computed) => self.is_safe_expr(&computed.expr),
                            _ => true,
                        };
                        key_safe && self.is_safe_expr(&kv.value)
                    }
                    _ => false,
                },
            }),
            Expr::Unary(unary) => unary.op != UnaryOp::Delete && self.is_safe_expr(&unary.arg),
            Expr::Bin(binary) => self.is_safe_expr(&binary.left) && self.is_safe_expr(&binary.right),
            Expr::Cond(cond) => {
                self.is_safe_expr(&cond.test)
                    && self.is_safe_expr(&cond.cons)
                    && self.is_safe_expr(&cond.alt)
            }
            Expr::Call(call) => {
                self.allow_lifecycle_calls
                    && matches!(&call.callee, Callee::Expr(callee) if callee_is_lifecycle(callee))
                    && call
                        .args
                        .iter()
                        .all(|arg| arg.spread.is_none() && self.is_safe_expr(&arg.expr))
            }
            Expr::OptChain(chain) => match &*chain.base {
                OptChainBase::Member(member) => {
                    self.member_prop_is_safe(&member.prop) && self.is_safe_expr(&member.obj)
                }
                OptChainBase::Call(call) => {
                    self.allow_lifecycle_calls
                        && callee_is_lifecycle(&call.callee)
                        && call
                            .args
                            .iter()
                            .all(|arg| arg.spread.is_none() && self.is_safe_expr(&arg.expr))
                }
            },
            _ => false,
        }
    }

    fn member_prop_is_safe(&self, prop: &MemberProp) -> bool {
        match prop {
            MemberProp::Computed(computed) => self.is_safe_expr(&computed.expr),
            _ => true,
        }
    }

    fn pattern_defaults_are_safe(&self, pat: &Pat) -> bool {
        match pat {
            Pat::Ident(_) | Pat::Invalid(_) => true,
            Pat::Array(array) => array
                .elems
                .iter()
                .flatten()
                .all(|element| self.pattern_defaults_are_safe(element)),
            Pat::Rest(rest) => self.pattern_defaults_are_safe(&rest.arg),
            Pat::Object(object) => object.props.iter().all(|prop| match prop {
                ObjectPatProp::KeyValue(kv) => {
                    let key_safe = match &kv.key {
                        PropName::Computed(computed) => self.is_safe_expr(&computed.expr),
                        _ => true,
                    };
                    key_safe && self.pattern_defaults_are_safe(&kv.value)
                }
                ObjectPatProp::Assign(assign) => assign
                    .value
                    .as_deref()
                    .map_or(true, |default| self.is_safe_expr(default)),
                ObjectPatProp::Rest(rest) => self.pattern_defaults_are_safe(&rest.arg),
            }),
            Pat::Assign(assign) => {
                self.pattern_defaults_are_safe(&assign.left) && self.is_safe_expr(&assign.right)
            }
            Pat::Expr(_) => false,
        }
    }
}

impl Default for PurityClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Framework lifecycle naming convention: `use` followed by an uppercase
/// letter or digit, checked on the callee identifier or the final
/// non-computed member segment.
pub fn is_lifecycle_name(name: &str) -> bool {
    name.strip_prefix("use")
        .and_then(|rest| rest.chars().next())
        .map_or(false, |c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

pub fn callee_is_lifecycle(callee: &Expr) -> bool {
    match callee {
        Expr::Ident(ident) => is_lifecycle_name(&ident.sym),
        Expr::Paren(paren) => callee_is_lifecycle(&paren.expr),
        Expr::Member(member) => match &member.prop {
            MemberProp::Ident(prop) => is_lifecycle_name(&prop.sym),
            _ => false,
        },
        Expr::OptChain(chain) => match &*chain.base {
            OptChainBase::Member(member) => match &member.prop {
                MemberProp::Ident(prop) => is_lifecycle_name(&prop.sym),
                _ => false,
            },
            OptChainBase::Call(_) => false,
        },
        _ => false,
    }
}
