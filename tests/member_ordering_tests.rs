//! End-to-end coverage for class member dependency ordering.

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
fn test_members_reordered_into_call_order() {
    let source = "class Example {\n\
                  \x20\x20methodB() { return this.methodA(); }\n\
                  \x20\x20field1 = 1;\n\
                  \x20\x20constructor() { this.methodB(); }\n\
                  \x20\x20methodA() { return 1; }\n\
                  }\n";
    let violations = lint(source);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::MemberOrderShouldChange);

    assert_eq!(
        fix(source),
        "class Example {\n\
         \x20\x20field1 = 1;\n\
         \x20\x20constructor() { this.methodB(); }\n\
         \x20\x20methodB() { return this.methodA(); }\n\
         \x20\x20methodA() { return 1; }\n\
         }\n"
    );
}

#[test]
fn test_member_indentation_survives_reorder() {
    let source = "class Deep {\n\
                  \x20\x20\x20\x20helper() { return 1; }\n\
                  \x20\x20\x20\x20constructor() { this.helper(); }\n\
                  }\n";
    assert_eq!(
        fix(source),
        "class Deep {\n\
         \x20\x20\x20\x20constructor() { this.helper(); }\n\
         \x20\x20\x20\x20helper() { return 1; }\n\
         }\n"
    );
}

#[test]
fn test_ordered_class_is_untouched() {
    let source = "class Example {\n\
                  \x20\x20field1 = 1;\n\
                  \x20\x20constructor() { this.methodB(); }\n\
                  \x20\x20methodB() { return this.methodA(); }\n\
                  \x20\x20methodA() { return 1; }\n\
                  }\n";
    assert!(lint(source).is_empty());
    assert_eq!(fix(source), source);
}

#[test]
fn test_properties_lead_static_first_then_visibility() {
    let source = "class Config {\n\
                  \x20\x20load() { return this.parse(); }\n\
                  \x20\x20private secret = 'x';\n\
                  \x20\x20parse() { return 1; }\n\
                  \x20\x20static defaults = {};\n\
                  \x20\x20public port = 80;\n\
                  \x20\x20host = 'localhost';\n\
                  }\n";
    let fixed = fix(source);
    let positions: Vec<usize> = [
        "static defaults",
        "public port",
        "host = 'localhost'",
        "private secret",
        "load()",
        "parse()",
    ]
    .iter()
    .map(|needle| fixed.find(needle).unwrap_or_else(|| panic!("missing {needle}")))
    .collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted);
}

#[test]
fn test_unreferenced_entry_points_follow_constructor_chain() {
    let source = "class Tangle {\n\
                  \x20\x20methodD() { this.methodC(); }\n\
                  \x20\x20methodC() {}\n\
                  \x20\x20constructor() { this.methodA(); }\n\
                  \x20\x20methodA() { this.methodB(); }\n\
                  \x20\x20methodB() {}\n\
                  }\n";
    let fixed = fix(source);
    let positions: Vec<usize> = ["constructor", "methodA", "methodB", "methodD", "methodC"]
        .iter()
        .map(|needle| fixed.find(needle).unwrap())
        .collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted);
}

#[test]
fn test_class_with_computed_member_is_skipped() {
    let source = "class Dynamic {\n\
                  \x20\x20methodB() { return this.methodA(); }\n\
                  \x20\x20[key]() {}\n\
                  \x20\x20methodA() { return 1; }\n\
                  }\n";
    assert!(lint(source).is_empty());
    assert_eq!(fix(source), source);
}

#[test]
fn test_class_with_static_block_is_skipped() {
    let source = "class Boot {\n\
                  \x20\x20methodB() { return this.methodA(); }\n\
                  \x20\x20static { registry.add(Boot); }\n\
                  \x20\x20methodA() { return 1; }\n\
                  }\n";
    assert!(lint(source).is_empty());
}

#[test]
fn test_class_expression_is_analyzed() {
    let source = "const Service = class Impl {\n\
                  \x20\x20helper() { return 1; }\n\
                  \x20\x20constructor() { this.helper(); }\n\
                  };\n";
    let violations = lint(source);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::MemberOrderShouldChange);

    let fixed = fix(source);
    let ctor_at = fixed.find("constructor()").unwrap();
    let helper_at = fixed.find("helper() {").unwrap();
    assert!(ctor_at < helper_at);
}

#[test]
fn test_member_comments_travel_with_member() {
    let source = "class Example {\n\
                  \x20\x20// does the real work\n\
                  \x20\x20helper() { return 1; }\n\
                  \x20\x20constructor() { this.helper(); }\n\
                  }\n";
    let fixed = fix(source);
    let comment_at = fixed.find("// does the real work").unwrap();
    let helper_at = fixed.find("helper() {").unwrap();
    let ctor_at = fixed.find("constructor()").unwrap();
    assert!(ctor_at < comment_at);
    assert!(comment_at < helper_at);
}

#[test]
fn test_fix_is_idempotent_for_classes() {
    let source = "class Example {\n\
                  \x20\x20methodB() { return this.methodA(); }\n\
                  \x20\x20field1 = 1;\n\
                  \x20\x20constructor() { this.methodB(); }\n\
                  \x20\x20methodA() { return 1; }\n\
                  }\n";
    let once = fix(source);
    let twice = fix(&once);
    assert_eq!(twice, once);
}

#[test]
fn test_output_is_deterministic() {
    let source = "class Wide {\n\
                  \x20\x20e() {}\n\
                  \x20\x20d() {}\n\
                  \x20\x20c() { this.d(); this.e(); }\n\
                  \x20\x20constructor() { this.c(); }\n\
                  }\n";
    let first = fix(source);
    for _ in 0..10 {
        assert_eq!(fix(source), first);
    }
}
