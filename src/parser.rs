use anyhow::{Context, Result};
use swc_common::{comments::SingleThreadedComments, sync::Lrc, FileName, SourceFile, SourceMap};
use swc_ecma_ast::Module;
use swc_ecma_parser::{lexer::Lexer, Parser, StringInput, Syntax, TsSyntax};

/// A parsed module together with the side tables the analyzer needs:
/// the comment map (leading comments travel with moved statements) and
/// the source file (for translating `BytePos` back into text offsets).
pub struct ParsedModule {
    pub module: Module,
    pub comments: SingleThreadedComments,
    pub source_file: Lrc<SourceFile>,
}

pub struct TypeScriptParser {
    pub source_map: Lrc<SourceMap>,
}

impl TypeScriptParser {
    pub fn new() -> Self {
        Self {
            source_map: Lrc::new(SourceMap::default()),
        }
    }

    pub fn parse(&self, source: &str, filename: &str) -> Result<ParsedModule> {
        let source_file = self.source_map.new_source_file(
            Lrc::new(FileName::Custom(filename.to_string())),
            source.to_string(),
        );

        let syntax = Syntax::Typescript(TsSyntax {
            tsx: filename.ends_with(".tsx"),
            decorators: true,
            ..Default::default()
        });

        let comments = SingleThreadedComments::default();
        let lexer = Lexer::new(
            syntax,
            Default::default(),
            StringInput::from(&*source_file),
            Some(&comments),
        );

        let mut parser = Parser::new_from(lexer);
        let module = parser
            .parse_module()
            .map_err(|e| anyhow::anyhow!("Parse error: {e:?}"))
            .with_context(|| format!("Failed to parse TypeScript file: {filename}"))?;

        Ok(ParsedModule {
            module,
            comments,
            source_file,
        })
    }
}

impl Default for TypeScriptParser {
    fn default() -> Self {
        Self::new()
    }
}
