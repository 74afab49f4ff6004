//! Integration tests for HTML and XML rendering

use markweave_core::xml::NAMESPACE;
use markweave_core::{parse, AstElement, AstNode, Document};
use pretty_assertions::assert_eq;

fn ast(input: &str) -> AstElement {
    parse(input).render_ast()
}

/// The single top-level element of `input`.
fn first(input: &str) -> AstElement {
    let document = ast(input);
    let first = document.elements().next().cloned();
    first.expect("document has a child")
}

// ============================================================================
// HTML Documents
// ============================================================================

#[test]
fn test_empty_document() {
    assert_eq!(parse("").render_html(), "");
    assert_eq!(parse("\n\n").render_html(), "");
    assert_eq!(Document::default().render_html(), "");
}

#[test]
fn test_document_render() {
    let input = "# Notes\n\nSome *text* with `code`.\n\n> quoted\n\n1. one\n2. two\n\n---\n";
    assert_eq!(
        parse(input).render_html(),
        "<h1>Notes</h1>\n\
         <p>Some <em>text</em> with <code>code</code>.</p>\n\
         <blockquote>\n<p>quoted</p>\n</blockquote>\n\
         <ol>\n<li>one</li>\n<li>two</li>\n</ol>\n\
         <hr />\n"
    );
}

#[test]
fn test_render_is_repeatable() {
    let doc = parse("- [a][b]\n\n[b]: /x\n\n| t |\n| - |\n| $m$ |");
    assert_eq!(doc.render_html(), doc.render_html());
    assert_eq!(doc, parse("- [a][b]\n\n[b]: /x\n\n| t |\n| - |\n| $m$ |"));
}

#[test]
fn test_html_special_characters_are_escaped() {
    assert_eq!(
        parse("<tag> & \"q\" 'a'\n\n    <code>").render_html(),
        "<p><tag> &amp; &quot;q&quot; 'a'</p>\n<pre><code>&lt;code&gt;\n</code></pre>\n"
    );
}

#[test]
fn test_title_attribute_is_escaped() {
    assert_eq!(
        parse("[a](/u \"x &quot; <y>\")").render_html(),
        "<p><a href=\"/u\" title=\"x &quot; &lt;y&gt;\">a</a></p>\n"
    );
}

#[test]
fn test_html_block_and_inline_html_pass_through() {
    assert_eq!(
        parse("<table><tr><td>\nx\n</td></tr></table>\n\nsee <kbd>K</kbd>").render_html(),
        "<table><tr><td>\nx\n</td></tr></table>\n<p>see <kbd>K</kbd></p>\n"
    );
}

// ============================================================================
// AST Elements
// ============================================================================

#[test]
fn test_document_element() {
    let document = ast("text");
    assert_eq!(document.name, "document");
    assert_eq!(document.attribute("xmlns"), Some(NAMESPACE));
    assert_eq!(document.elements().count(), 1);
}

#[test]
fn test_reference_definitions_and_blank_lines_are_skipped() {
    let document = ast("[a]: /b\n\n\n\npara");
    let names: Vec<&str> = document.elements().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["paragraph"]);
}

#[test]
fn test_ordered_list_element() {
    let list = first("2) x\n3) y");
    assert_eq!(list.name, "list");
    assert_eq!(
        list.attributes,
        vec![
            ("type".to_string(), "ordered".to_string()),
            ("start".to_string(), "2".to_string()),
            ("tight".to_string(), "true".to_string()),
            ("delimiter".to_string(), "paren".to_string()),
        ]
    );
    assert_eq!(list.elements().count(), 2);
}

#[test]
fn test_loose_bullet_list_element() {
    let list = first("* a\n\n* b");
    assert_eq!(list.attribute("type"), Some("bullet"));
    assert_eq!(list.attribute("tight"), Some("false"));
    assert_eq!(list.attribute("start"), None);
}

#[test]
fn test_text_is_unescaped() {
    let paragraph = first("a &amp; \\* &copy;");
    let text = paragraph.elements().next().expect("text element");
    assert_eq!(text.name, "text");
    assert_eq!(text.children, vec![AstNode::Text("a & * ©".to_string())]);
}

#[test]
fn test_inline_elements() {
    let paragraph = first("*a* **b** ~~c~~ `d` [e](/f \"g\")\nh  \ni");
    let names: Vec<&str> = paragraph.elements().map(|e| e.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "emph",
            "text",
            "strong",
            "text",
            "strikethrough",
            "text",
            "code",
            "text",
            "link",
            "softbreak",
            "text",
            "linebreak",
            "text",
        ]
    );

    let link = paragraph
        .elements()
        .find(|e| e.name == "link")
        .expect("link element");
    assert_eq!(link.attribute("destination"), Some("/f"));
    assert_eq!(link.attribute("title"), Some("g"));
}

#[test]
fn test_extension_elements() {
    let paragraph = first("[[Home|start]] ![[a.png|50]] $x$ $$y$$");
    let elements: Vec<&AstElement> = paragraph.elements().collect();

    assert_eq!(elements[0].name, "wiki-link");
    assert_eq!(elements[0].attribute("display"), Some("start"));
    assert_eq!(elements[0].attribute("destination"), Some("Home"));

    assert_eq!(elements[2].name, "file");
    assert_eq!(elements[2].attribute("source"), Some("a.png"));
    assert_eq!(elements[2].attribute("attribute"), Some("50"));

    assert_eq!(elements[4].name, "math_span");
    assert_eq!(elements[4].text(), "$x$");
    assert_eq!(elements[6].name, "math");
    assert_eq!(elements[6].text(), "$$y$$");
}

#[test]
fn test_table_element() {
    let table = first("| a | b |\n| :- | -: |\n| 1 | 2 |");
    assert_eq!(table.name, "table");
    let sections: Vec<&str> = table.elements().map(|e| e.name.as_str()).collect();
    assert_eq!(sections, vec!["table_head", "table_body"]);

    let head_row = table.elements().next().and_then(|h| h.elements().next()).expect("head row");
    let aligns: Vec<Option<&str>> = head_row.elements().map(|c| c.attribute("align")).collect();
    assert_eq!(aligns, vec![Some("left"), Some("right")]);
    assert!(head_row.elements().all(|c| c.name == "header_cell"));
}

// ============================================================================
// XML Serialization
// ============================================================================

#[test]
fn test_render_xml() {
    let xml = parse("# Hi *there*\n\n- a").render_xml();
    assert_eq!(
        xml,
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <!DOCTYPE document SYSTEM \"CommonMark.dtd\">\n\
         <document xmlns=\"http://commonmark.org/xml/1.0\">\n\
         \x20 <heading level=\"1\">\n\
         \x20   <text>Hi </text>\n\
         \x20   <emph>\n\
         \x20     <text>there</text>\n\
         \x20   </emph>\n\
         \x20 </heading>\n\
         \x20 <list type=\"bullet\" tight=\"true\">\n\
         \x20   <item>\n\
         \x20     <paragraph>\n\
         \x20       <text>a</text>\n\
         \x20     </paragraph>\n\
         \x20   </item>\n\
         \x20 </list>\n\
         </document>\n"
    );
}

#[test]
fn test_code_block_xml() {
    let xml = first("```rust\nlet a = 1 < 2;\n```").to_xml();
    assert_eq!(
        xml,
        "<code_block info=\"rust\">let a = 1 &lt; 2;\n</code_block>\n"
    );
}

#[test]
fn test_autolink_xml() {
    let xml = first("<http://x.io>").to_xml();
    assert_eq!(
        xml,
        "<paragraph>\n  <link destination=\"http://x.io\" title=\"\">\n    <text>http://x.io</text>\n  </link>\n</paragraph>\n"
    );
}
