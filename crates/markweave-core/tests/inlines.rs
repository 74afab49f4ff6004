//! Integration tests for inline resolution

use markweave_core::ast::{Autolink, Inline};
use markweave_core::{parse, Block, Extension, Parser, Profile};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn html(input: &str) -> String {
    parse(input).render_html()
}

fn inlines(input: &str) -> Vec<Inline> {
    let doc = parse(input);
    match &doc.blocks[0] {
        Block::Paragraph(paragraph) => paragraph.content.inlines().to_vec(),
        other => panic!("expected paragraph, got {:?}", other),
    }
}

// ============================================================================
// Emphasis
// ============================================================================

#[rstest]
#[case("*foo*", "<p><em>foo</em></p>\n")]
#[case("_foo_", "<p><em>foo</em></p>\n")]
#[case("**foo**", "<p><strong>foo</strong></p>\n")]
#[case("*foo**bar**baz*", "<p><em>foo<strong>bar</strong>baz</em></p>\n")]
#[case("**foo*bar**", "<p><strong>foo*bar</strong></p>\n")]
#[case("***foo***", "<p><em><strong>foo</strong></em></p>\n")]
#[case("*foo", "<p>*foo</p>\n")]
#[case("foo*", "<p>foo*</p>\n")]
#[case("a * b", "<p>a * b</p>\n")]
#[case("foo_bar_baz", "<p>foo_bar_baz</p>\n")]
#[case("*(*foo*)*", "<p><em>(<em>foo</em>)</em></p>\n")]
#[case("**a *b* c**", "<p><strong>a <em>b</em> c</strong></p>\n")]
fn test_emphasis(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(html(input), expected);
}

#[test]
fn test_rule_of_three_leaves_literal_asterisk() {
    let output = html("**foo*bar**");
    assert!(output.contains('*'));
    assert!(!output.contains("<em>"));
}

// ============================================================================
// Strikethrough
// ============================================================================

#[rstest]
#[case("~~gone~~", "<p><del>gone</del></p>\n")]
#[case("~one~", "<p><del>one</del></p>\n")]
#[case("~~mixed~", "<p>~~mixed~</p>\n")]
#[case("x ~~~three~~~", "<p>x ~~~three~~~</p>\n")]
#[case("~~*a*~~", "<p><del><em>a</em></del></p>\n")]
#[case("a ~~ b ~~ c", "<p>a <del> b </del> c</p>\n")]
#[case("*a ~~b* c~~", "<p>*a <del>b* c</del></p>\n")]
#[case("~~a *b~~ c*", "<p><del>a *b</del> c*</p>\n")]
#[case("[~~a](/u) b~~", "<p><a href=\"/u\">~~a</a> b~~</p>\n")]
fn test_strikethrough(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(html(input), expected);
}

#[test]
fn test_strikethrough_disabled() {
    let doc = Parser::new(Profile::CommonMark).parse("~~a~~");
    assert_eq!(doc.render_html(), "<p>~~a~~</p>\n");
}

// ============================================================================
// Code Spans
// ============================================================================

#[rstest]
#[case("`code`", "<p><code>code</code></p>\n")]
#[case("`` a ` b ``", "<p><code>a ` b</code></p>\n")]
#[case("`<&>`", "<p><code>&lt;&amp;&gt;</code></p>\n")]
#[case("```unmatched``", "<p>```unmatched``</p>\n")]
#[case("`*no* [link](x)`", "<p><code>*no* [link](x)</code></p>\n")]
fn test_code_spans(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(html(input), expected);
}

// ============================================================================
// Links and Images
// ============================================================================

#[rstest]
#[case("[a](/url)", "<p><a href=\"/url\">a</a></p>\n")]
#[case("[a](/url \"T\")", "<p><a href=\"/url\" title=\"T\">a</a></p>\n")]
#[case("[a](<my url>)", "<p><a href=\"my%20url\">a</a></p>\n")]
#[case("[a](/x?b=1&c=2)", "<p><a href=\"/x?b=1&amp;c=2\">a</a></p>\n")]
#[case("[a]()", "<p><a href=\"\">a</a></p>\n")]
#[case("[link](/ü)", "<p><a href=\"/%C3%BC\">link</a></p>\n")]
#[case("[not a link]", "<p>[not a link]</p>\n")]
#[case("[a](/b", "<p>[a](/b</p>\n")]
fn test_inline_links(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(html(input), expected);
}

#[test]
fn test_links_cannot_contain_links() {
    assert_eq!(
        html("[a [b](/inner) c](/outer)"),
        "<p>[a <a href=\"/inner\">b</a> c](/outer)</p>\n"
    );
}

#[test]
fn test_image() {
    assert_eq!(
        html("![a *b*](/i.png \"t\")"),
        "<p><img src=\"/i.png\" alt=\"a b\" title=\"t\" /></p>\n"
    );
}

#[test]
fn test_link_inside_image_description() {
    assert_eq!(
        html("![[x](/y)](/z.png)"),
        "<p><img src=\"/z.png\" alt=\"x\" /></p>\n"
    );
}

#[rstest]
#[case("[foo]", "<p><a href=\"/url\">foo</a></p>\n")]
#[case("[Foo][]", "<p><a href=\"/url\">Foo</a></p>\n")]
#[case("[text][FOO]", "<p><a href=\"/url\">text</a></p>\n")]
#[case("![foo]", "<p><img src=\"/url\" alt=\"foo\" /></p>\n")]
#[case("[text][bar]", "<p>[text][bar]</p>\n")]
fn test_reference_links(#[case] body: &str, #[case] expected: &str) {
    let input = format!("[foo]: /url\n\n{}", body);
    assert_eq!(html(&input), expected);
}

#[test]
fn test_first_definition_wins() {
    assert_eq!(
        html("[x]: /a\n[x]: /b\n\n[link][x]"),
        "<p><a href=\"/a\">link</a></p>\n"
    );
}

#[test]
fn test_emphasis_does_not_cross_link_boundary() {
    assert_eq!(
        html("*[a*](/u)"),
        "<p>*<a href=\"/u\">a*</a></p>\n"
    );
}

// ============================================================================
// Autolinks and Raw HTML
// ============================================================================

#[rstest]
#[case("<https://example.com/a>", "<p><a href=\"https://example.com/a\">https://example.com/a</a></p>\n")]
#[case("<me@example.com>", "<p><a href=\"mailto:me@example.com\">me@example.com</a></p>\n")]
#[case("a <1b> c", "<p>a &lt;1b&gt; c</p>\n")]
#[case("Visit www.example.com.", "<p>Visit <a href=\"http://www.example.com\">www.example.com</a>.</p>\n")]
#[case("(https://a.org/x)", "<p>(<a href=\"https://a.org/x\">https://a.org/x</a>)</p>\n")]
#[case("mail foo@bar.com", "<p>mail <a href=\"mailto:foo@bar.com\">foo@bar.com</a></p>\n")]
fn test_autolinks(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(html(input), expected);
}

#[test]
fn test_extended_autolinks_disabled() {
    let doc = Parser::default()
        .without_extension(Extension::ExtendedAutolinks)
        .parse("www.example.com");
    assert_eq!(doc.render_html(), "<p>www.example.com</p>\n");
}

#[test]
fn test_autolink_node() {
    assert_eq!(
        inlines("<http://x.io>"),
        vec![Inline::Autolink(Autolink {
            destination: "http://x.io".into(),
            label: "http://x.io".into(),
        })]
    );
}

#[rstest]
#[case("a <b>bold</b>", "<p>a <b>bold</b></p>\n")]
#[case("<span class=\"x\">y</span>", "<p><span class=\"x\">y</span></p>\n")]
#[case("x <!-- note --> y", "<p>x <!-- note --> y</p>\n")]
#[case("a < b", "<p>a &lt; b</p>\n")]
fn test_raw_html(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(html(input), expected);
}

// ============================================================================
// Line Breaks
// ============================================================================

#[rstest]
#[case("a  \nb", "<p>a<br />\nb</p>\n")]
#[case("a\\\nb", "<p>a<br />\nb</p>\n")]
#[case("a \nb", "<p>a\nb</p>\n")]
#[case("a\n     b", "<p>a\nb</p>\n")]
#[case("a  ", "<p>a</p>\n")]
fn test_line_breaks(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(html(input), expected);
}

// ============================================================================
// Escapes and Entities
// ============================================================================

#[rstest]
#[case("\\*not emphasis\\*", "<p>*not emphasis*</p>\n")]
#[case("\\[x\\](y)", "<p>[x](y)</p>\n")]
#[case("&copy; &amp; &#35; &#x41;", "<p>© &amp; # A</p>\n")]
#[case("&nope; &", "<p>&amp;nope; &amp;</p>\n")]
#[case("\\&amp;", "<p>&amp;amp;</p>\n")]
#[case("a \"q\" <", "<p>a &quot;q&quot; &lt;</p>\n")]
fn test_escapes_and_entities(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(html(input), expected);
}

// ============================================================================
// Wiki-Links, Embedded Files and Math
// ============================================================================

#[rstest]
#[case("[[Page]]", "<p><a class=\"wiki-link\" href=\"Page\">Page</a></p>\n")]
#[case("[[Page|the page]]", "<p><a class=\"wiki-link\" href=\"Page\">the page</a></p>\n")]
#[case("![[img.png]]", "<p><div class=\"embedded-file\" data-src=\"img.png\"/></p>\n")]
#[case("![[img.png|300]]", "<p><div class=\"embedded-file\" data-src=\"img.png\" data-attribute=\"300\"/></p>\n")]
#[case("$x < 1$", "<p>$x &lt; 1$</p>\n")]
#[case("a $$\\sum$$ b", "<p>a $$\\sum$$ b</p>\n")]
#[case("$$", "<p>$$</p>\n")]
fn test_extension_inlines(#[case] input: &str, #[case] expected: &str) {
    assert_eq!(html(input), expected);
}

#[test]
fn test_math_nodes() {
    assert_eq!(
        inlines("$a$ $$b$$"),
        vec![
            Inline::MathSpan("$a$".into()),
            Inline::Text(" ".into()),
            Inline::Math("$$b$$".into()),
        ]
    );
}

#[test]
fn test_extension_inlines_disabled() {
    let doc = Parser::new(Profile::CommonMark).parse("[[Page]] $x$");
    assert_eq!(doc.render_html(), "<p>[[Page]] $x$</p>\n");
}
