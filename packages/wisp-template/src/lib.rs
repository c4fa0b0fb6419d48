//! A streaming HTML/text template scanner and static optimizer for the
//! wisp reactive component runtime.
//!
//! This crate has no dependency on `wisp-reactive`/`wisp-core`: it operates
//! purely on template strings and the [`ast`] node shapes a downstream
//! (out-of-scope) AST builder and code generator would consume, matching
//! spec.md §2's description of the parser as a standalone scanner.

pub mod ast;
pub mod error;
pub mod html;
pub mod optimizer;
pub mod text;
pub mod util;

pub use ast::{AstElement, AstNode, AstText, IfCondition};
pub use error::ParseError;
pub use html::{parse_html, HtmlParserOptions, HtmlSink};
pub use optimizer::{mark_static, mark_static_roots};
pub use text::{parse_filters, parse_text, RawToken, TextParseResult};

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Event {
        Start(String, Vec<(String, String)>, bool),
        End(String),
        Chars(String),
        Comment(String),
        Warn(ParseError),
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Vec<Event>,
    }

    impl HtmlSink for RecordingSink {
        fn start(&mut self, tag: &str, attrs: &[(String, String)], unary: bool, _start: usize, _end: usize) {
            self.events.push(Event::Start(tag.to_string(), attrs.to_vec(), unary));
        }
        fn end(&mut self, tag: &str, _start: usize, _end: usize) {
            self.events.push(Event::End(tag.to_string()));
        }
        fn chars(&mut self, text: &str, _start: usize, _end: usize) {
            self.events.push(Event::Chars(text.to_string()));
        }
        fn comment(&mut self, text: &str, _start: usize, _end: usize) {
            self.events.push(Event::Comment(text.to_string()));
        }
        fn warn(&mut self, err: ParseError) {
            self.events.push(Event::Warn(err));
        }
    }

    fn run(html: &str) -> Vec<Event> {
        run_with(html, &HtmlParserOptions::default())
    }

    fn run_with(html: &str, options: &HtmlParserOptions) -> Vec<Event> {
        let mut sink = RecordingSink::default();
        parse_html(html, options, &mut sink);
        sink.events
    }

    #[test]
    fn scenario_d_unclosed_p_warns_at_eof() {
        let events = run("<p><span>x</span>");
        assert_eq!(
            events,
            vec![
                Event::Start("p".into(), vec![], false),
                Event::Start("span".into(), vec![], false),
                Event::Chars("x".into()),
                Event::End("span".into()),
                Event::Warn(ParseError::UnmatchedEndTag { tag: "p".into() }),
                Event::End("p".into()),
            ]
        );
    }

    #[test]
    fn scenario_e_stray_angle_bracket_stays_in_text() {
        let events = run("<div>a<b</div>");
        assert_eq!(
            events,
            vec![
                Event::Start("div".into(), vec![], false),
                Event::Chars("a<b".into()),
                Event::End("div".into()),
            ]
        );
    }

    #[test]
    fn comment_emitted_only_when_kept() {
        let mut keep = HtmlParserOptions::default();
        keep.should_keep_comment = true;
        let events = run_with("<!-- hi --><p></p>", &keep);
        assert_eq!(
            events,
            vec![
                Event::Comment(" hi ".into()),
                Event::Start("p".into(), vec![], false),
                Event::End("p".into()),
            ]
        );

        let dropped = run("<!-- hi --><p></p>");
        assert_eq!(
            dropped,
            vec![Event::Start("p".into(), vec![], false), Event::End("p".into())]
        );
    }

    #[test]
    fn conditional_comment_is_skipped() {
        let events = run("<![if !IE]><p></p><![endif]>");
        assert_eq!(
            events,
            vec![Event::Start("p".into(), vec![], false), Event::End("p".into())]
        );
    }

    #[test]
    fn doctype_is_skipped() {
        let events = run("<!DOCTYPE html><p></p>");
        assert_eq!(
            events,
            vec![Event::Start("p".into(), vec![], false), Event::End("p".into())]
        );
    }

    #[test]
    fn self_closing_tag_reports_unary() {
        let events = run("<input type=\"text\"/>");
        assert_eq!(
            events,
            vec![Event::Start(
                "input".into(),
                vec![("type".into(), "text".into())],
                true
            )]
        );
    }

    #[test]
    fn script_content_is_not_scanned_as_markup() {
        let events = run("<script>if (a < b) { x() }</script>");
        assert_eq!(
            events,
            vec![
                Event::Start("script".into(), vec![], false),
                Event::Chars("if (a < b) { x() }".into()),
                Event::End("script".into()),
            ]
        );
    }

    #[test]
    fn textarea_strips_cdata_and_comments() {
        let events = run("<textarea><![CDATA[hi]]><!--c-->there</textarea>");
        assert_eq!(
            events,
            vec![
                Event::Start("textarea".into(), vec![], false),
                Event::Chars("hithere".into()),
                Event::End("textarea".into()),
            ]
        );
    }

    #[test]
    fn literal_end_br_synthesizes_unary_start() {
        let events = run("a</br>b");
        assert_eq!(
            events,
            vec![
                Event::Chars("a".into()),
                Event::Start("br".into(), vec![], true),
                Event::Chars("b".into()),
            ]
        );
    }

    #[test]
    fn literal_end_p_without_open_tag_autogenerates_both() {
        let events = run("</p>");
        assert_eq!(
            events,
            vec![
                Event::Start("p".into(), vec![], false),
                Event::End("p".into()),
            ]
        );
    }

    #[test]
    fn expect_html_autocloses_p_before_div() {
        let events = run("<p>one<div>two</div>");
        assert_eq!(
            events,
            vec![
                Event::Start("p".into(), vec![], false),
                Event::Chars("one".into()),
                Event::End("p".into()),
                Event::Start("div".into(), vec![], false),
                Event::Chars("two".into()),
                Event::End("div".into()),
            ]
        );
    }

    #[test]
    fn expect_html_autocloses_repeated_li() {
        let events = run("<ul><li>one<li>two</ul>");
        assert_eq!(
            events,
            vec![
                Event::Start("ul".into(), vec![], false),
                Event::Start("li".into(), vec![], false),
                Event::Chars("one".into()),
                Event::End("li".into()),
                Event::Start("li".into(), vec![], false),
                Event::Chars("two".into()),
                Event::End("li".into()),
                Event::End("ul".into()),
            ]
        );
    }

    #[test]
    fn malformed_remainder_is_emitted_as_text_and_warned() {
        // A lone '<' with nothing after it that parses as any construct.
        let events = run("< not a tag");
        assert_eq!(
            events,
            vec![
                Event::Warn(ParseError::MalformedTemplate { offset: 0 }),
                Event::Chars("< not a tag".into()),
            ]
        );
    }

    #[test]
    fn parse_text_law_10_interpolation_and_filters() {
        let result = parse_text("hello {{ a }} {{ b|f }}", None).unwrap();
        assert_eq!(result.expression, r#""hello "+_s(a)+" "+_s(_f("f")(b))"#);
        assert_eq!(result.tokens.len(), 4);
        let bindings: Vec<_> = result
            .tokens
            .iter()
            .filter(|t| matches!(t, RawToken::Binding(_)))
            .collect();
        assert_eq!(bindings.len(), 2);
    }

    #[test]
    fn parse_text_returns_none_without_interpolation() {
        assert_eq!(parse_text("just plain text", None), None);
    }

    #[test]
    fn parse_text_respects_custom_delimiters() {
        let result = parse_text("hi [[ name ]]!", Some(("[[", "]]"))).unwrap();
        assert_eq!(result.expression, r#""hi "+_s(name)+"!""#);
    }

    #[test]
    fn optimizer_law_11_monotonic_non_static_propagates_up() {
        let mut tree = AstNode::Element(
            AstElement::new("div").with_child(AstNode::Element(AstElement::new("span").with_binding())),
        );
        mark_static(&mut tree);
        assert_eq!(tree.as_element().unwrap().static_, Some(false));
        let child = &tree.as_element().unwrap().children[0];
        assert_eq!(child.as_element().unwrap().static_, Some(false));
    }

    #[test]
    fn optimizer_scenario_f_static_span_with_single_text_child_is_not_a_root() {
        let span = AstNode::Element(
            AstElement::new("span").with_child(AstNode::Text(AstText::plain("static"))),
        );
        let li = AstNode::Element(AstElement::new("li").with_for("i in 3").with_child(span));
        let mut ul = AstNode::Element(AstElement::new("ul").with_child(li));

        mark_static(&mut ul);
        mark_static_roots(&mut ul, false);

        let ul_el = ul.as_element().unwrap();
        assert_eq!(ul_el.static_, Some(false));

        let li_el = ul_el.children[0].as_element().unwrap();
        assert_eq!(li_el.static_, Some(false));
        assert!(li_el.for_.is_some());

        let span_el = li_el.children[0].as_element().unwrap();
        assert_eq!(span_el.static_, Some(true));
        assert!(span_el.static_in_for);
        assert_eq!(span_el.static_root, Some(false));
    }

    #[test]
    fn optimizer_law_12_multi_child_static_element_becomes_a_root() {
        let mut div = AstNode::Element(
            AstElement::new("div")
                .with_child(AstNode::Text(AstText::plain("a")))
                .with_child(AstNode::Element(AstElement::new("span"))),
        );
        mark_static(&mut div);
        mark_static_roots(&mut div, false);
        assert_eq!(div.as_element().unwrap().static_root, Some(true));
    }
}
