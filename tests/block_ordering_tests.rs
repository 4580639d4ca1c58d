//! End-to-end coverage for the four block-level ordering policies.

use flowlint::{analyze_source, fix_source, Violation, ViolationKind};
use pretty_assertions::assert_eq;

fn lint(source: &str) -> Vec<Violation> {
    analyze_source(source, "test.ts").expect("analysis should succeed")
}

fn fix(source: &str) -> String {
    fix_source(source, "test.ts", 10)
        .expect("fixing should succeed")
        .code
}

#[test]
fn test_guard_hoisted_above_pure_setup() {
    let source = "const name = user.name;\n\
                  if (!flags) { throw new Error('no flags'); }\n";
    let violations = lint(source);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::GuardShouldMove);
    assert!(violations[0].message.contains("!flags"));

    assert_eq!(
        fix(source),
        "if (!flags) { throw new Error('no flags'); }\nconst name = user.name;\n"
    );
}

#[test]
fn test_unbraced_guard_is_recognized() {
    let source = "const name = user.name;\n\
                  if (!flags) throw new Error('no flags');\n";
    let violations = lint(source);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::GuardShouldMove);
}

#[test]
fn test_guard_stops_at_its_dependency() {
    let source = "const flags = readFlags(env);\n\
                  if (!flags) { throw new Error('no flags'); }\n";
    assert!(lint(source).is_empty());
    assert_eq!(fix(source), source);
}

#[test]
fn test_if_with_else_is_not_a_guard() {
    let source = "const name = user.name;\n\
                  if (!flags) { throw new Error('x'); } else { warn(name); }\n";
    assert!(lint(source).is_empty());
}

#[test]
fn test_continue_guard_inside_loop() {
    let source = "function run(items, active) {\n\
                  \x20\x20for (const item of items) {\n\
                  \x20\x20\x20\x20const name = item.name;\n\
                  \x20\x20\x20\x20if (!active) { continue; }\n\
                  \x20\x20\x20\x20push(name);\n\
                  \x20\x20}\n\
                  }\n";
    let violations = lint(source);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::GuardShouldMove);

    let fixed = fix(source);
    let guard_at = fixed.find("if (!active)").unwrap();
    let decl_at = fixed.find("const name").unwrap();
    assert!(guard_at < decl_at);
    assert_eq!(fixed.matches('{').count(), fixed.matches('}').count());
}

#[test]
fn test_guard_depending_on_loop_variable_stays() {
    let source = "function run(items) {\n\
                  \x20\x20for (const item of items) {\n\
                  \x20\x20\x20\x20const name = item.name;\n\
                  \x20\x20\x20\x20if (item.skip) { continue; }\n\
                  \x20\x20\x20\x20push(name);\n\
                  \x20\x20}\n\
                  }\n";
    // `const name = item.name` reads `item`, which the guard depends on.
    assert!(lint(source).is_empty());
}

#[test]
fn test_derived_value_groups_with_its_source() {
    let source = "const group = getGroup();\n\
                  const router = {};\n\
                  const id = group.id;\n";
    let violations = lint(source);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::DerivedValueShouldGroup);
    assert!(violations[0].message.contains("\"id\""));
    assert!(violations[0].message.contains("\"group\""));

    assert_eq!(
        fix(source),
        "const group = getGroup();\nconst id = group.id;\nconst router = {};\n"
    );
}

#[test]
fn test_derived_value_blocked_by_pure_reader_of_source() {
    let source = "const group = getGroup();\n\
                  const copy = group;\n\
                  const id = group.id;\n";
    assert!(lint(source).is_empty());
}

#[test]
fn test_derived_value_blocked_by_impure_statement() {
    let source = "const group = getGroup();\n\
                  const router = makeRouter();\n\
                  const id = group.id;\n";
    assert!(lint(source).is_empty());
}

#[test]
fn test_adjacent_derived_value_is_fine() {
    let source = "const group = getGroup();\n\
                  const id = group.id;\n\
                  const router = {};\n";
    assert!(lint(source).is_empty());
}

#[test]
fn test_placeholder_moves_to_first_use() {
    let source = "let data = null;\n\
                  const a = 1;\n\
                  const b = 2;\n\
                  data = load(a, b);\n";
    let violations = lint(source);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::DeclarationShouldMoveCloser);
    assert!(violations[0].message.contains("\"data\""));

    assert_eq!(
        fix(source),
        "const a = 1;\nconst b = 2;\nlet data = null;\ndata = load(a, b);\n"
    );
}

#[test]
fn test_placeholder_with_identifier_init_tracks_its_dependency() {
    let source = "let mode = base;\n\
                  base = recompute();\n\
                  use(mode);\n";
    // The intervening statement rewrites `base`, so moving the placeholder
    // past it would capture a different value.
    let violations = lint(source);
    assert!(violations
        .iter()
        .all(|v| v.kind != ViolationKind::DeclarationShouldMoveCloser));
}

#[test]
fn test_local_copy_stays_grouped_with_its_source() {
    // Pull-down must not claim a declaration that grouping anchors: the two
    // fixes would keep reversing each other across passes.
    let source = "const a = getA();\n\
                  const x = a;\n\
                  const pad = 1;\n\
                  use(x);\n";
    assert!(lint(source).is_empty());

    let outcome = fix_source(source, "test.ts", 10).unwrap();
    assert_eq!(outcome.code, source);
    assert_eq!(outcome.passes, 0);
}

#[test]
fn test_placeholder_copying_an_outside_name_still_moves() {
    let source = "let mode = defaultMode;\n\
                  const a = 1;\n\
                  const b = 2;\n\
                  apply(mode, a, b);\n";
    let violations = lint(source);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::DeclarationShouldMoveCloser);

    assert_eq!(
        fix(source),
        "const a = 1;\nconst b = 2;\nlet mode = defaultMode;\napply(mode, a, b);\n"
    );
}

#[test]
fn test_computed_declaration_is_not_a_placeholder() {
    let source = "let data = expensive();\n\
                  const a = 1;\n\
                  const b = 2;\n\
                  data = refine(data, a, b);\n";
    let violations = lint(source);
    assert!(violations
        .iter()
        .all(|v| v.kind != ViolationKind::DeclarationShouldMoveCloser));
}

#[test]
fn test_accumulator_loop_keeps_its_reader() {
    let source = "let total = 0;\n\
                  const label = 'sum';\n\
                  const sep = ': ';\n\
                  for (const n of nums) { total += n; }\n\
                  report(label + sep + total);\n";
    assert!(lint(source).is_empty());
    assert_eq!(fix(source), source);
}

#[test]
fn test_side_effect_surfaces_above_unrelated_setup() {
    let source = "const results = [];\n\
                  const limit = 10;\n\
                  log('start');\n";
    let violations = lint(source);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::SideEffectShouldMoveEarlier);
    assert!(violations[0].message.contains("log('start');"));

    assert_eq!(
        fix(source),
        "log('start');\nconst results = [];\nconst limit = 10;\n"
    );
}

#[test]
fn test_side_effect_resolution_reads_local_callee_body() {
    let source = "function announce() { console.log(prefix); }\n\
                  const unrelated = 1;\n\
                  announce();\n";
    let violations = lint(source);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::SideEffectShouldMoveEarlier);

    assert_eq!(
        fix(source),
        "function announce() { console.log(prefix); }\nannounce();\nconst unrelated = 1;\n"
    );
}

#[test]
fn test_side_effect_blocked_when_callee_reads_crossed_declaration() {
    let source = "function announce() { console.log(banner); }\n\
                  const config = 1;\n\
                  const banner = 'ready';\n\
                  announce();\n";
    assert!(lint(source).is_empty());
}

#[test]
fn test_reassigned_callee_is_never_moved() {
    let source = "let handler = makeHandler();\n\
                  handler = fallback;\n\
                  const pad = 1;\n\
                  handler();\n";
    assert!(lint(source).is_empty());
}

#[test]
fn test_lifecycle_calls_are_never_moved() {
    let source = "const state = init();\n\
                  const extra = 1;\n\
                  useEffect(sync);\n\
                  React.useLayoutEffect(paint);\n";
    assert!(lint(source).is_empty());
}

#[test]
fn test_comments_travel_with_moved_statements() {
    let source = "const a = 1;\n\
                  // announce startup\n\
                  log('start');\n";
    assert_eq!(
        fix(source),
        "// announce startup\nlog('start');\nconst a = 1;\n"
    );
}

#[test]
fn test_nothing_crosses_module_declarations() {
    let source = "import { a } from './a';\n\
                  const setup = 1;\n\
                  export const b = 2;\n\
                  log('start');\n";
    assert!(lint(source).is_empty());
}
