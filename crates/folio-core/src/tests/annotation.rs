use crate::*;

fn tags(text: &str) -> Vec<AnnotationTag> {
    scan_annotations(text)
        .into_iter()
        .filter_map(|s| match s {
            ScannedAnnotation::Tag(tag) => Some(tag),
            ScannedAnnotation::Malformed { .. } => None,
        })
        .collect()
}

#[test]
fn self_closing_tag_with_double_quotes() {
    let text = r#"Intro <figure-link type="mermaid" title="Flow" content="graph TD\nA-->B" /> outro"#;
    let scanned = scan_annotations(text);
    assert_eq!(scanned.len(), 1);
    let ScannedAnnotation::Tag(tag) = &scanned[0] else {
        panic!("expected a tag, got {scanned:?}");
    };
    assert_eq!(tag.span.start, 6);
    assert_eq!(
        tag.source(text),
        r#"<figure-link type="mermaid" title="Flow" content="graph TD\nA-->B" />"#
    );
    assert_eq!(tag.form, TagForm::SelfClosing);
    assert_eq!(tag.declared_type, "mermaid");
    assert_eq!(tag.title, "Flow");
    assert_eq!(tag.raw_content, r"graph TD\nA-->B");

    let decoded = tag.decode();
    assert_eq!(decoded.kind, AnnotationKind::Mermaid);
    assert_eq!(decoded.content, "graph TD\nA-->B");
}

#[test]
fn paired_producer_form_with_escaped_quotes() {
    let text = r"<figure-link title='It\'s done' type='markdown' content='| a |\n| - |'></figure-link>";
    let found = tags(text);
    assert_eq!(found.len(), 1);
    let tag = &found[0];
    assert_eq!(tag.form, TagForm::Paired);
    assert_eq!(tag.span, 0..text.len());
    assert_eq!(tag.raw_content, r"| a |\n| - |");

    let decoded = tag.decode();
    assert_eq!(decoded.kind, AnnotationKind::Markdown);
    assert_eq!(decoded.title, "It's done");
    assert_eq!(decoded.content, "| a |\n| - |");
}

#[test]
fn greater_than_inside_quoted_values_does_not_end_the_tag() {
    let text = r#"<figure-link type="mermaid" content="A --> B > C" />"#;
    let found = tags(text);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].raw_content, "A --> B > C");
}

#[test]
fn paired_tags_match_non_greedily() {
    let text = "<figure-link type='mermaid' content='x'></figure-link> mid \
                <figure-link type='markdown' content='y'></figure-link>";
    let found = tags(text);
    assert_eq!(found.len(), 2);
    assert!(text[found[0].span.end..].starts_with(" mid "));
    assert_eq!(found[0].raw_content, "x");
    assert_eq!(found[1].raw_content, "y");
}

#[test]
fn unterminated_value_is_reported_and_scanning_continues() {
    let text = "<figure-link type=\"mermaid\" content=\"graph TD\\nA-->B\n\nMore prose \
                <figure-link type=\"mermaid\" title=\"ok\" content=\"graph LR\" />";
    let scanned = scan_annotations(text);
    assert_eq!(scanned.len(), 2);
    assert_eq!(
        scanned[0],
        ScannedAnnotation::Malformed {
            span: 0.."<figure-link".len(),
            reason: MalformedTag::Interrupted,
        }
    );
    let ScannedAnnotation::Tag(tag) = &scanned[1] else {
        panic!("expected the second tag to parse");
    };
    assert_eq!(tag.title, "ok");
}

#[test]
fn value_running_to_end_of_text_is_unterminated() {
    let text = "before <figure-link type='mermaid' content='graph TD";
    let scanned = scan_annotations(text);
    assert_eq!(
        scanned,
        vec![ScannedAnnotation::Malformed {
            span: 7..7 + "<figure-link".len(),
            reason: MalformedTag::UnterminatedValue,
        }]
    );
}

#[test]
fn paired_tag_without_close_is_malformed() {
    let text = "<figure-link type='mermaid' content='x'> trailing";
    let scanned = scan_annotations(text);
    assert!(matches!(
        scanned.as_slice(),
        [ScannedAnnotation::Malformed {
            reason: MalformedTag::MissingCloseTag,
            ..
        }]
    ));
}

#[test]
fn open_tag_does_not_borrow_the_close_of_a_later_tag() {
    let text = "<figure-link type='mermaid' content='a'> text \
                <figure-link type='markdown' content='b'></figure-link>";
    let scanned = scan_annotations(text);
    assert_eq!(scanned.len(), 2);
    assert!(matches!(
        scanned[0],
        ScannedAnnotation::Malformed {
            reason: MalformedTag::MissingCloseTag,
            ..
        }
    ));
    let ScannedAnnotation::Tag(tag) = &scanned[1] else {
        panic!("expected the later tag to survive");
    };
    assert_eq!(tag.raw_content, "b");
}

#[test]
fn similar_element_names_are_not_tags() {
    assert!(scan_annotations("<figure-links type='mermaid' />").is_empty());
    assert!(scan_annotations("<figure>plain html</figure>").is_empty());
}

#[test]
fn attribute_names_and_types_are_case_insensitive() {
    let found = tags(r#"<FIGURE-LINK TYPE="MerMaid" Title="T" CONTENT="graph TD" />"#);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].kind(), AnnotationKind::Mermaid);
    assert_eq!(found[0].title, "T");
}

#[test]
fn missing_attributes_default_to_empty() {
    let found = tags("<figure-link />");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].declared_type, "");
    assert_eq!(found[0].title, "");
    assert_eq!(found[0].raw_content, "");
    assert_eq!(found[0].kind(), AnnotationKind::Other);
}

#[test]
fn unquoted_values_are_accepted() {
    let found = tags("<figure-link type=mermaid title=Flow content=graph/>");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].declared_type, "mermaid");
    assert_eq!(found[0].title, "Flow");
    assert_eq!(found[0].raw_content, "graph");
    assert_eq!(found[0].form, TagForm::SelfClosing);
}

#[test]
fn paired_body_is_used_when_content_attribute_is_absent() {
    let found = tags("<figure-link type=\"mermaid\" title=\"t\">\ngraph TD\n</figure-link>");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].raw_content, "graph TD");
}

#[test]
fn first_duplicate_attribute_wins() {
    let found = tags("<figure-link type='markdown' type='mermaid' content='x' />");
    assert_eq!(found[0].kind(), AnnotationKind::Markdown);
}

#[test]
fn attribute_without_name_is_malformed() {
    let err = parse_tag_at("<figure-link =\"x\" type='mermaid' />", 0).unwrap_err();
    assert_eq!(
        err,
        Error::MalformedTag {
            offset: 0,
            reason: MalformedTag::MissingAttributeName,
        }
    );
}

#[test]
fn unescape_applies_each_sequence_once_in_order() {
    assert_eq!(unescape_content(r#"a\nb\'c\"d"#), "a\nb'c\"d");
    assert_eq!(unescape_content("no escapes"), "no escapes");
}

#[test]
fn classification_trims_and_ignores_case() {
    assert_eq!(AnnotationKind::classify(" Markdown "), AnnotationKind::Markdown);
    assert_eq!(AnnotationKind::classify("chart"), AnnotationKind::Other);
    assert_eq!(AnnotationKind::classify(""), AnnotationKind::Other);
}
