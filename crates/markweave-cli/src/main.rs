//! Markweave CLI - Compile Markdown documents to HTML or AST
//!
//! Usage:
//!   mweave [COMMAND] [OPTIONS] <FILE>
//!
//! Commands:
//!   html   Render HTML (default)
//!   ast    Render the CommonMark XML AST
//!   json   Render the AST element tree as JSON
//!   stats  Show document statistics
//!   check  Report diagnostics, exit 1 if there are any

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser as ClapParser, Subcommand};
use log::{debug, info, warn, LevelFilter};
use markweave_core::{
    AstElement, AstNode, Block, Document, Extension, Inline, ParseResult, Parser, Profile,
};
use serde::{Serialize, Serializer};

/// Markweave - Markdown to HTML and AST compiler.
#[derive(ClapParser)]
#[command(name = "mweave", version, about, args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    input: InputArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Render HTML (default).
    Html(InputArgs),
    /// Render the CommonMark XML AST.
    Ast(InputArgs),
    /// Render the AST element tree as JSON.
    Json(InputArgs),
    /// Show document statistics.
    Stats(InputArgs),
    /// Report diagnostics and exit with status 1 if there are any.
    Check(InputArgs),
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    Html,
    Ast,
    Json,
    Stats,
    Check,
}

#[derive(Args, Debug, Clone)]
struct InputArgs {
    /// Input file, `-` for standard input.
    #[arg(value_name = "FILE", default_value = "-")]
    file: String,

    /// Write output to FILE instead of standard output.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Parsing profile: `extended` or `commonmark`.
    #[arg(long, env = "MWEAVE_PROFILE", default_value = "extended")]
    profile: Profile,

    /// Disable an extension (tables, strikethrough, math, wikilinks, embeds, autolinks).
    #[arg(long = "no-ext", value_name = "EXT")]
    no_ext: Vec<Extension>,

    /// Raise the log level (-v info, -vv debug).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn into_parts(self) -> (Mode, InputArgs) {
        match self.command {
            None => (Mode::Html, self.input),
            Some(Command::Html(args)) => (Mode::Html, args),
            Some(Command::Ast(args)) => (Mode::Ast, args),
            Some(Command::Json(args)) => (Mode::Json, args),
            Some(Command::Stats(args)) => (Mode::Stats, args),
            Some(Command::Check(args)) => (Mode::Check, args),
        }
    }
}

fn main() {
    let (mode, args) = Cli::parse().into_parts();
    init_logging(args.verbose);

    if let Err(e) = run(mode, &args) {
        eprintln!("error: {:#}", e);
        process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn run(mode: Mode, args: &InputArgs) -> Result<()> {
    let input = read_input(&args.file)?;
    let parser = build_parser(args);
    let result = parser.parse_with_diagnostics(&input);

    match mode {
        Mode::Html => {
            report_diagnostics(&result);
            write_output(args.output.as_deref(), &result.document.render_html())
        }
        Mode::Ast => {
            report_diagnostics(&result);
            write_output(args.output.as_deref(), &result.document.render_xml())
        }
        Mode::Json => {
            report_diagnostics(&result);
            let json = render_json(&result.document)?;
            write_output(args.output.as_deref(), &json)
        }
        Mode::Stats => cmd_stats(&result, &input),
        Mode::Check => cmd_check(&result, &args.file),
    }
}

fn build_parser(args: &InputArgs) -> Parser {
    let mut parser = Parser::new(args.profile);
    for extension in &args.no_ext {
        parser = parser.without_extension(*extension);
    }
    info!(
        "profile {:?} with extensions [{}]",
        args.profile,
        parser
            .options()
            .extensions()
            .iter()
            .map(|extension| extension.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    parser
}

fn read_input(file: &str) -> Result<String> {
    if file == "-" {
        debug!("reading standard input");
        let mut input = String::new();
        io::stdin()
            .read_to_string(&mut input)
            .context("failed to read standard input")?;
        return Ok(input);
    }
    fs::read_to_string(file).with_context(|| format!("failed to read '{}'", file))
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content).with_context(|| format!("failed to write '{}'", path.display()))
        }
        None => io::stdout()
            .lock()
            .write_all(content.as_bytes())
            .context("failed to write to standard output"),
    }
}

fn report_diagnostics(result: &ParseResult) {
    for diagnostic in &result.diagnostics {
        warn!("{}", diagnostic);
    }
}

// =============================================================================
// Check Command
// =============================================================================

fn cmd_check(result: &ParseResult, file: &str) -> Result<()> {
    if result.is_clean() {
        println!("{}: no diagnostics", file);
        return Ok(());
    }

    for diagnostic in &result.diagnostics {
        eprintln!("{}: {} [{}]", file, diagnostic, diagnostic.kind.name());
    }
    bail!("{} diagnostic(s) found", result.diagnostics.len())
}

// =============================================================================
// Stats Command
// =============================================================================

fn cmd_stats(result: &ParseResult, input: &str) -> Result<()> {
    let stats = DocumentStats::from_document(&result.document, input);

    println!("Document Statistics");
    println!("-------------------");
    println!("Blocks:");
    println!("  Total blocks:   {}", stats.total_blocks);
    println!("  Headings:       {}", stats.headings);
    println!("  Paragraphs:     {}", stats.paragraphs);
    println!("  Code blocks:    {}", stats.code_blocks);
    println!("  Block quotes:   {}", stats.block_quotes);
    println!("  Lists:          {}", stats.lists);
    println!("  List items:     {}", stats.list_items);
    println!("  Tables:         {}", stats.tables);
    println!("  HTML blocks:    {}", stats.html_blocks);
    println!("  Math blocks:    {}", stats.math_blocks);
    println!();
    println!("Inlines:");
    println!("  Links:          {}", stats.links);
    println!("  Images:         {}", stats.images);
    println!("  Wiki-links:     {}", stats.wiki_links);
    println!("  Embedded files: {}", stats.embeds);
    println!("  Code spans:     {}", stats.code_spans);
    println!("  Math:           {}", stats.math);
    println!();
    println!("Size:");
    println!("  Characters:     {}", stats.chars);
    println!("  Words (est.):   {}", stats.words);
    println!("  Lines:          {}", stats.lines);
    println!();
    println!("References:     {}", result.document.references().len());
    println!("Diagnostics:    {}", result.diagnostics.len());

    Ok(())
}

#[derive(Debug, Default)]
struct DocumentStats {
    total_blocks: usize,
    headings: usize,
    paragraphs: usize,
    code_blocks: usize,
    block_quotes: usize,
    lists: usize,
    list_items: usize,
    tables: usize,
    html_blocks: usize,
    math_blocks: usize,
    links: usize,
    images: usize,
    wiki_links: usize,
    embeds: usize,
    code_spans: usize,
    math: usize,
    chars: usize,
    words: usize,
    lines: usize,
}

impl DocumentStats {
    fn from_document(doc: &Document, input: &str) -> Self {
        let mut stats = Self {
            chars: input.chars().count(),
            words: input.split_whitespace().count(),
            lines: input.lines().count(),
            ..Self::default()
        };
        stats.count_blocks(&doc.blocks);
        stats
    }

    fn count_blocks(&mut self, blocks: &[Block]) {
        for block in blocks {
            if matches!(block, Block::BlankLine(_) | Block::LinkReferenceDefinition(_)) {
                continue;
            }
            self.total_blocks += 1;
            match block {
                Block::Heading(h) => {
                    self.headings += 1;
                    self.count_inlines(h.content.inlines());
                }
                Block::Paragraph(p) => {
                    self.paragraphs += 1;
                    self.count_inlines(p.content.inlines());
                }
                Block::IndentedCode(_) | Block::FencedCode(_) => self.code_blocks += 1,
                Block::BlockQuote(q) => {
                    self.block_quotes += 1;
                    self.count_blocks(&q.children);
                }
                Block::List(l) => {
                    self.lists += 1;
                    for item in &l.items {
                        self.list_items += 1;
                        self.count_blocks(&item.children);
                    }
                }
                Block::ListItem(item) => {
                    self.list_items += 1;
                    self.count_blocks(&item.children);
                }
                Block::Table(t) => {
                    self.tables += 1;
                    for row in std::iter::once(&t.head).chain(&t.body) {
                        for cell in &row.cells {
                            self.count_inlines(cell.content.inlines());
                        }
                    }
                }
                Block::Html(_) => self.html_blocks += 1,
                Block::Math(_) => self.math_blocks += 1,
                _ => {}
            }
        }
    }

    fn count_inlines(&mut self, inlines: &[Inline]) {
        for inline in inlines {
            match inline {
                Inline::Link(l) => {
                    self.links += 1;
                    self.count_inlines(&l.children);
                }
                Inline::Autolink(_) => self.links += 1,
                Inline::Image(i) => {
                    self.images += 1;
                    self.count_inlines(&i.children);
                }
                Inline::WikiLink(_) => self.wiki_links += 1,
                Inline::EmbeddedFile(_) => self.embeds += 1,
                Inline::CodeSpan(_) => self.code_spans += 1,
                Inline::Math(_) | Inline::MathSpan(_) => self.math += 1,
                Inline::Emphasis(e) => self.count_inlines(&e.children),
                Inline::Strikethrough(children) => self.count_inlines(children),
                _ => {}
            }
        }
    }
}

// =============================================================================
// JSON Output
// =============================================================================

#[derive(Serialize)]
#[serde(untagged)]
enum JsonNode<'a> {
    Element(JsonElement<'a>),
    Text(&'a str),
}

#[derive(Serialize)]
struct JsonElement<'a> {
    #[serde(rename = "type")]
    name: &'a str,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "serialize_attributes"
    )]
    attributes: Vec<(&'a str, &'a str)>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<JsonNode<'a>>,
}

/// Attributes become a JSON object in document order.
fn serialize_attributes<S: Serializer>(
    attributes: &[(&str, &str)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(attributes.iter().copied())
}

fn render_json(doc: &Document) -> Result<String> {
    let ast = doc.render_ast();
    let mut json =
        serde_json::to_string_pretty(&convert_element(&ast)).context("failed to serialize AST")?;
    json.push('\n');
    Ok(json)
}

fn convert_element(element: &AstElement) -> JsonElement<'_> {
    JsonElement {
        name: &element.name,
        attributes: element
            .attributes
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
            .collect(),
        children: element
            .children
            .iter()
            .map(|child| match child {
                AstNode::Element(e) => JsonNode::Element(convert_element(e)),
                AstNode::Text(t) => JsonNode::Text(t),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_html() {
        let cli = Cli::try_parse_from(["mweave", "notes.md"]).unwrap();
        let (mode, args) = cli.into_parts();
        assert!(matches!(mode, Mode::Html));
        assert_eq!(args.file, "notes.md");
        assert_eq!(args.profile, Profile::Extended);
    }

    #[test]
    fn test_subcommand_options() {
        let cli = Cli::try_parse_from([
            "mweave",
            "check",
            "-",
            "--profile",
            "commonmark",
            "--no-ext",
            "tables",
            "--no-ext",
            "math",
            "-vv",
        ])
        .unwrap();
        let (mode, args) = cli.into_parts();
        assert!(matches!(mode, Mode::Check));
        assert_eq!(args.file, "-");
        assert_eq!(args.profile, Profile::CommonMark);
        assert_eq!(args.no_ext, vec![Extension::Tables, Extension::Math]);
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        assert!(Cli::try_parse_from(["mweave", "--no-ext", "footnotes", "a.md"]).is_err());
    }

    #[test]
    fn test_stats_counts_nested_content() {
        let input = "# T\n\n> - [a](/b) `c`\n> - ![d](/e)\n\n| x |\n| - |\n| $m$ |\n";
        let doc = markweave_core::parse(input);
        let stats = DocumentStats::from_document(&doc, input);
        assert_eq!(stats.headings, 1);
        assert_eq!(stats.block_quotes, 1);
        assert_eq!(stats.lists, 1);
        assert_eq!(stats.list_items, 2);
        assert_eq!(stats.tables, 1);
        assert_eq!(stats.links, 1);
        assert_eq!(stats.images, 1);
        assert_eq!(stats.code_spans, 1);
        assert_eq!(stats.math, 1);
    }

    #[test]
    fn test_json_output() {
        let doc = markweave_core::parse("## Hi");
        let json: serde_json::Value = serde_json::from_str(&render_json(&doc).unwrap()).unwrap();
        assert_eq!(json["type"], "document");
        let heading = &json["children"][0];
        assert_eq!(heading["type"], "heading");
        assert_eq!(heading["attributes"]["level"], "2");
        assert_eq!(heading["children"][0]["children"][0], "Hi");
    }
}
