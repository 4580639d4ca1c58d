use std::collections::HashSet;
use std::fmt;

use crate::edit::Edit;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    GuardShouldMove,
    DerivedValueShouldGroup,
    DeclarationShouldMoveCloser,
    SideEffectShouldMoveEarlier,
    MemberOrderShouldChange,
}

impl ViolationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ViolationKind::GuardShouldMove => "guard-should-move",
            ViolationKind::DerivedValueShouldGroup => "derived-value-should-group",
            ViolationKind::DeclarationShouldMoveCloser => "declaration-should-move-closer",
            ViolationKind::SideEffectShouldMoveEarlier => "side-effect-should-move-earlier",
            ViolationKind::MemberOrderShouldChange => "member-order-should-change",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One ordering finding: what is wrong, where, and the edit that fixes it.
#[derive(Debug, Clone)]
pub struct Violation {
    pub kind: ViolationKind,
    pub message: String,
    pub span: (usize, usize),
    pub edits: Vec<Edit>,
}

/// Per-pass bookkeeping. Each statement (keyed by its raw span) is reported
/// at most once per pass, so the first policy to claim it wins.
pub struct PassState {
    reported: HashSet<(u32, u32)>,
    violations: Vec<Violation>,
}

impl PassState {
    pub fn new() -> Self {
        Self {
            reported: HashSet::new(),
            violations: Vec::new(),
        }
    }

    pub fn already_reported(&self, key: (u32, u32)) -> bool {
        self.reported.contains(&key)
    }

    pub fn report_once(&mut self, key: (u32, u32), violation: Violation) {
        if self.reported.insert(key) {
            self.violations.push(violation);
        }
    }

    pub fn into_violations(self) -> Vec<Violation> {
        self.violations
    }
}

impl Default for PassState {
    fn default() -> Self {
        Self::new()
    }
}
