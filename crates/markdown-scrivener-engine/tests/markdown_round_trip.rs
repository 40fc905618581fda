use markdown_scrivener_engine::{Editor, EngineOptions};
use pretty_assertions::assert_eq;
use pulldown_cmark::{Event, Options, Parser};
use rstest::rstest;

/// What pulldown-cmark sees in `markdown`: tags, merged text and code.
fn outline(markdown: &str) -> Vec<String> {
    let mut out: Vec<String> = vec![];
    let mut text = String::new();
    let flush = |text: &mut String, out: &mut Vec<String>| {
        if !text.is_empty() {
            out.push(format!("text {text:?}"));
            text.clear();
        }
    };

    for event in Parser::new_ext(markdown, Options::ENABLE_STRIKETHROUGH) {
        match event {
            Event::Text(t) => {
                text.push_str(&t);
                continue;
            }
            Event::Start(tag) => {
                flush(&mut text, &mut out);
                out.push(format!("start {tag:?}"));
            }
            Event::End(tag) => {
                flush(&mut text, &mut out);
                out.push(format!("end {tag:?}"));
            }
            Event::Code(code) => {
                flush(&mut text, &mut out);
                out.push(format!("code {code:?}"));
            }
            Event::Rule => {
                flush(&mut text, &mut out);
                out.push("rule".to_string());
            }
            _ => {}
        }
    }
    flush(&mut text, &mut out);
    out
}

fn load(markdown: &str) -> Editor {
    let mut editor = Editor::new(EngineOptions::default());
    editor.set_content(markdown);
    editor
}

#[rstest]
#[case::paragraphs("First paragraph.\n\nSecond paragraph.\n")]
#[case::emphasis_styles("Some *em* and __strong__ text\n")]
#[case::nested("**outer *inner* outer**\n")]
#[case::strike_and_code("~~gone~~ and `co*de`\n")]
#[case::headings("# One\n\n## Two *x*\n\n###### Six\n")]
#[case::bullets("- a\n- b **c**\n")]
#[case::ordinals("3. three\n4. four\n")]
#[case::mixed("# Title\n\n- a\n- b\n\n1. x\n2. y\n\n---\n\nend\n")]
#[case::underscores_in_words("snake_case_name stays\n")]
fn serialized_output_means_the_same(#[case] markdown: &str) {
    let editor = load(markdown);
    let output = editor.get_markdown();
    assert_eq!(outline(&output), outline(markdown));
}

#[rstest]
#[case("Some *em* and __strong__ text")]
#[case("- a\n- b\n\n1. x\n\n---\n\n# h")]
#[case("**a** _b_ ~~c~~ `d`")]
#[case("*_a* and _*b*")]
#[case("1. a\n\n5. b")]
fn serializing_is_idempotent(#[case] markdown: &str) {
    let once = load(markdown).get_markdown();
    let twice = load(&once).get_markdown();
    assert_eq!(twice, once);
}

#[rstest]
#[case::ordered("1. a\n\n5. b\n")]
#[case::bullets("- a\n\n- b\n")]
#[case::restarted("2. a\n3. b\n\n1. c\n")]
fn separate_lists_keep_their_boundaries(#[case] markdown: &str) {
    assert_eq!(load(markdown).get_markdown(), markdown);
}

#[test]
fn canonical_forms() {
    let editor = load("Some *em* and __strong__ text\n***\n2) two");
    insta::assert_snapshot!(editor.get_markdown().trim_end(), @r"
    Some _em_ and **strong** text

    ----

    2. two
    ");
}

#[test]
fn unmatched_markers_stay_literal() {
    let editor = load("a ** b and *c");
    assert_eq!(editor.get_markdown(), "a ** b and *c\n");
    assert_eq!(outline(&editor.get_markdown()), outline("a ** b and *c"));
}
