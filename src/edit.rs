use swc_common::comments::{Comments, SingleThreadedComments};
use swc_common::BytePos;
use swc_ecma_ast::Stmt;

/// One entry in an analyzed statement list. Module-level items that are not
/// plain statements (imports, exports) carry `stmt: None`: they still occupy
/// a slot and act as barriers, but no policy inspects or moves them.
pub struct BlockItem<'a> {
    pub lo: BytePos,
    pub hi: BytePos,
    pub stmt: Option<&'a Stmt>,
}

/// The region the analyzed statement list lives in. For a `{ ... }` block the
/// closing brace sits just before `hi`, so the trailing segment of the last
/// statement must stop one byte short of it.
pub struct Enclosing {
    pub lo: BytePos,
    pub hi: BytePos,
    pub brace_delimited: bool,
}

/// A single text replacement, in byte offsets into the analyzed source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub span: (usize, usize),
    pub new_text: String,
}

impl Edit {
    pub fn overlaps(&self, other: &Edit) -> bool {
        self.span.0 < other.span.1 && other.span.0 < self.span.1
    }
}

/// Maps AST byte positions back into the source text and resolves the
/// comment-extended start of each statement.
pub struct SourceContext<'a> {
    pub source: &'a str,
    base: BytePos,
    comments: &'a SingleThreadedComments,
}

impl<'a> SourceContext<'a> {
    pub fn new(source: &'a str, base: BytePos, comments: &'a SingleThreadedComments) -> Self {
        Self {
            source,
            base,
            comments,
        }
    }

    pub fn offset(&self, pos: BytePos) -> usize {
        (pos.0 - self.base.0) as usize
    }

    pub fn text(&self, lo: BytePos, hi: BytePos) -> &'a str {
        &self.source[self.offset(lo)..self.offset(hi)]
    }

    /// Start offset of a statement including its leading comments, so a moved
    /// statement carries its comments along.
    pub fn start_with_comments(&self, lo: BytePos) -> usize {
        let mut start = self.offset(lo);
        if let Some(leading) = self.comments.get_leading(lo) {
            for comment in &leading {
                start = start.min(self.offset(comment.span.lo));
            }
        }
        start
    }
}

/// Where the segment owned by the statement at `index` ends: at the
/// comment-extended start of the next statement, or at the end of the
/// enclosing region (minus the closing brace for `{ ... }` blocks).
fn next_start(ctx: &SourceContext, items: &[BlockItem], index: usize, enclosing: &Enclosing) -> usize {
    match items.get(index + 1) {
        Some(next) => ctx.start_with_comments(next.lo),
        None => {
            let end = ctx.offset(enclosing.hi);
            if enclosing.brace_delimited {
                end - 1
            } else {
                end
            }
        }
    }
}

/// Builds the single replacement that moves the statement at `from` to the
/// position currently held by `to`, preserving every byte in between. The
/// replacement covers the contiguous segment from the earlier of the two
/// positions to the start of whatever follows the later one, and re-emits it
/// with the moving statement's text spliced into its new place.
pub fn move_edit(
    ctx: &SourceContext,
    items: &[BlockItem],
    from: usize,
    to: usize,
    enclosing: &Enclosing,
) -> Edit {
    let moving_start = ctx.start_with_comments(items[from].lo);
    let moving_end = next_start(ctx, items, from, enclosing);
    let moving = trim_trailing_blanks(&ctx.source[moving_start..moving_end]);

    if to < from {
        // Backward move: [target .. from) shifts down, mover goes on top.
        let segment_start = ctx.start_with_comments(items[to].lo);
        let before = &ctx.source[segment_start..moving_start];
        Edit {
            span: (segment_start, moving_end),
            new_text: format!("{moving}{before}"),
        }
    } else {
        // Forward move: (from .. target) shifts up, mover lands just before
        // the target statement.
        let segment_end = ctx.start_with_comments(items[to].lo);
        let between = &ctx.source[moving_end..segment_end];
        Edit {
            span: (moving_start, segment_end),
            new_text: format!("{between}{moving}"),
        }
    }
}

/// Drops trailing spaces and tabs (but not the newline) so the spliced text
/// does not leave stray indentation at the seam.
fn trim_trailing_blanks(text: &str) -> &str {
    text.trim_end_matches([' ', '\t'])
}

/// Applies non-overlapping edits in descending start order so earlier offsets
/// stay valid.
pub fn apply_edits(source: &str, edits: &[Edit]) -> String {
    let mut ordered: Vec<&Edit> = edits.iter().collect();
    ordered.sort_by(|a, b| b.span.0.cmp(&a.span.0));

    let mut result = source.to_string();
    for edit in ordered {
        result.replace_range(edit.span.0..edit.span.1, &edit.new_text);
    }
    result
}
