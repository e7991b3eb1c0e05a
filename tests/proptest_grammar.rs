use pagetag::annotate::{annotate_line, AnnotateOptions, MergePolicy};
use pagetag::entity::EntitySpan;
use pagetag::error::PagetagError;
use pagetag::process::annotate_xml_str;
use pagetag::tags::{append, encode, parse_attribute, parse_expressions, LabelTable};
use proptest::prelude::*;

mod proptest_helpers;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn encode_then_parse_recovers_expression(
        label in proptest_helpers::arb_label(),
        offset in any::<usize>(),
        length in any::<usize>(),
    ) {
        let table = LabelTable::transkribus();
        let name = table.tag_name(&label.as_str().into()).expect("known label").to_string();

        let parsed = parse_expressions(&encode(&name, offset, length)).expect("parse");

        prop_assert_eq!(parsed.len(), 1);
        prop_assert_eq!(&parsed[0].name, &name);
        prop_assert_eq!(parsed[0].offset, offset);
        prop_assert_eq!(parsed[0].length, length);
    }

    #[test]
    fn append_keeps_existing_attribute_as_prefix(
        existing in proptest_helpers::arb_existing_attribute(),
        name in proptest_helpers::arb_tag_name(),
        offset in 0usize..100_000,
        length in 0usize..10_000,
    ) {
        let expression = encode(&name, offset, length);
        let merged = append(&existing, &expression);

        if existing.is_empty() {
            prop_assert_eq!(&merged, &expression);
        } else {
            prop_assert!(merged.starts_with(&existing));
            prop_assert_eq!(merged.len(), existing.len() + 1 + expression.len());
        }
    }

    #[test]
    fn appended_tags_keep_span_order(
        existing in proptest_helpers::arb_existing_attribute(),
        spans in proptest_helpers::arb_spans(6),
    ) {
        let table = LabelTable::transkribus();
        let line = annotate_line(&existing, &spans, &table, &AnnotateOptions::default())
            .expect("annotate");

        let before = parse_attribute(&existing).expect("parse existing").len();
        let tags = parse_expressions(&line.attribute).expect("parse result");
        let added = &tags[tags.len() - spans.len()..];

        prop_assert_eq!(line.added, spans.len());
        prop_assert_eq!(parse_attribute(&line.attribute).expect("parse").len(), before + spans.len());
        for (tag, span) in added.iter().zip(&spans) {
            prop_assert_eq!(Some(tag.name.as_str()), table.tag_name(&span.label));
            prop_assert_eq!(tag.offset, span.offset);
            prop_assert_eq!(tag.length, span.length);
        }
    }

    #[test]
    fn skip_existing_is_idempotent(
        existing in proptest_helpers::arb_existing_attribute(),
        spans in proptest_helpers::arb_spans(6),
    ) {
        let table = LabelTable::transkribus();
        let options = AnnotateOptions {
            policy: MergePolicy::SkipExisting,
            forced_label: None,
        };

        let once = annotate_line(&existing, &spans, &table, &options).expect("first pass");
        let twice = annotate_line(&once.attribute, &spans, &table, &options).expect("second pass");

        prop_assert_eq!(twice.added, 0);
        prop_assert_eq!(&twice.attribute, &once.attribute);
    }

    #[test]
    fn annotated_documents_reparse_with_the_same_text(
        lines in prop::collection::vec(proptest_helpers::arb_line_text(), 1..5),
    ) {
        let xml = format!(
            "<PcGts xmlns=\"{}\"><Page><TextRegion>{}</TextRegion></Page></PcGts>",
            pagetag::page::PAGE_NAMESPACE,
            lines
                .iter()
                .enumerate()
                .map(|(i, text)| format!(
                    "<TextLine id=\"l{i}\"><TextEquiv><Unicode>{text}</Unicode></TextEquiv></TextLine>"
                ))
                .collect::<String>()
        );

        let mut whole_line = |text: &str| {
            Ok::<Vec<EntitySpan>, PagetagError>(vec![EntitySpan::new("PER", 0, text.chars().count())])
        };
        let (first, stats) = annotate_xml_str(
            &xml,
            &mut whole_line,
            &LabelTable::transkribus(),
            &AnnotateOptions::default(),
        )
        .expect("first pass");
        prop_assert_eq!(stats.tags_added, lines.len());

        let mut none = |_: &str| Ok::<Vec<EntitySpan>, PagetagError>(Vec::new());
        let (second, _) = annotate_xml_str(
            &first,
            &mut none,
            &LabelTable::transkribus(),
            &AnnotateOptions::default(),
        )
        .expect("second pass");
        prop_assert_eq!(&second, &first);

        for (text, line) in lines.iter().zip(first.split("<TextLine").skip(1)) {
            let expected_length = format!("length:{};", text.chars().count());
            let expected_unicode = format!("<Unicode>{text}</Unicode>");
            prop_assert!(line.contains(&expected_unicode));
            prop_assert!(line.contains(&expected_length));
        }
    }
}
