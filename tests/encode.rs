mod common;

use indexmap::IndexMap;
use ner_relation_prep::nlp::{
    document::{AnnotatedDocument, EntitySpan, Relation},
    encode::{self, EncodedRelation, OutputFormat, SentenceBounds},
    tags::{iob_to_bilou, iob_to_bioes},
    tokenizer::{RuleTokenizer, Tokenizer},
};
use proptest::prelude::*;
use serde_json::json;

fn span(id: &str, label: &str, start_token: usize, end_token: usize) -> EntitySpan {
    EntitySpan {
        id: id.into(),
        label: label.into(),
        start_token,
        end_token,
        start_char: 0,
        end_char: 0,
    }
}

fn document_with(text: &str, entities: Vec<EntitySpan>, relations: Vec<Relation>) -> AnnotatedDocument {
    let tokens = RuleTokenizer.tokenize(text);
    AnnotatedDocument {
        id: "manual".into(),
        text: text.into(),
        tokens,
        entities,
        relations: relations.into_iter().map(|r| (r.id.clone(), r)).collect::<IndexMap<_, _>>(),
    }
}

#[test]
fn iob_converts_to_bilou_and_bioes() {
    let iob = ["B-per", "O", "B-org", "I-org", "I-org", "I-loc", "O"];
    assert_eq!(
        iob_to_bilou(&iob[..]),
        vec!["U-per", "O", "B-org", "I-org", "L-org", "U-loc", "O"]
    );
    assert_eq!(
        iob_to_bioes(&iob[..]),
        vec!["S-per", "O", "B-org", "I-org", "E-org", "S-loc", "O"]
    );
}

#[test]
fn relation_positions_are_rebased_to_sentence() {
    let text = "a b c d e f g h i j k l .";
    let doc = document_with(
        text,
        vec![span("s", "x", 5, 5), span("o", "y", 9, 10)],
        vec![Relation {
            id: "r".into(),
            subject: "s".into(),
            object: "o".into(),
            label: "rel".into(),
        }],
    );
    let relations = encode::sentence_relations(&doc, SentenceBounds { first: 0, last: 12 });
    assert_eq!(
        relations,
        vec![EncodedRelation {
            subject_start: 6,
            subject_end: 6,
            object_start: 10,
            object_end: 11,
            label: "rel".into(),
        }]
    );
}

#[test]
fn relations_crossing_sentences_are_not_emitted() {
    let doc = document_with(
        "a b . c d .",
        vec![span("s", "x", 0, 0), span("o", "y", 3, 3)],
        vec![Relation {
            id: "r".into(),
            subject: "s".into(),
            object: "o".into(),
            label: "rel".into(),
        }],
    );
    let bounds = encode::sentence_bounds(&doc);
    assert_eq!(bounds.len(), 2);
    assert!(bounds.iter().all(|b| encode::sentence_relations(&doc, *b).is_empty()));
    assert_eq!(encode::encode(&[doc], OutputFormat::Conllu), format!("{}\n", encode::COLUMNS_HEADER));
}

#[test]
fn conllu_output_keeps_only_relation_sentences() {
    let docs = common::extract(&[common::sample_record("doc-1")]);
    let output = encode::encode(&docs, OutputFormat::Conllu);
    let expected = "# global.columns = id form ner\n\
                    # text = Alice works at Acme Corp.\n\
                    # relations = 1;1;4;5;organisation_link\n\
                    1\tAlice\tS-per\n\
                    2\tworks\tO\n\
                    3\tat\tO\n\
                    4\tAcme\tB-org\n\
                    5\tCorp\tE-org\n\
                    6\t.\tO\n\
                    \n";
    assert_eq!(output, expected);
}

#[test]
fn plain_output_keeps_every_sentence() {
    let docs = common::extract(&[common::sample_record("doc-1")]);
    let output = encode::encode(&docs, OutputFormat::Plain);
    assert!(output.starts_with("-DOCSTART-\tO\n\n"));
    assert!(output.contains("Alice\tS-per\n"));
    assert!(output.contains("today\tO\n.\tO\n\n"));
    assert!(!output.contains("# "));
}

#[test]
fn trailing_tokens_form_a_final_sentence() {
    let record = common::record(
        "doc",
        "Bob met Carol",
        json!([common::entity("b", "Person", 0, 2), common::entity("c", "Person", 8, 12)]),
        json!([common::relation("r", "b", "c", None)]),
    );
    let docs = common::extract(&[record]);
    let blocks = encode::parse_blocks(&encode::encode(&docs, OutputFormat::Conllu)).unwrap();
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].text, "Bob met Carol");
    assert_eq!(blocks[0].relations[0].to_string(), "1;1;3;3;unclassified");
}

#[test]
fn entity_with_period_is_cut_at_the_sentence_boundary() {
    let record = common::record(
        "doc",
        "Dr. Smith visited.",
        json!([common::entity("e1", "Person", 0, 8)]),
        json!([]),
    );
    let docs = common::extract(&[record]);
    assert_eq!(encode::sentence_bounds(&docs[0]).len(), 2);
    let output = encode::encode(&docs, OutputFormat::Plain);
    assert!(output.contains("Dr\tB-per\n.\tI-per\n\nSmith\tE-per\n"));
}

#[test]
fn encoded_tags_use_bioes_prefixes_only() {
    let docs = common::extract(&[common::sample_record("doc-1")]);
    let output = encode::encode(&docs, OutputFormat::Plain);
    for line in output.lines().filter(|line| !line.is_empty()) {
        let tag = line.rsplit('\t').next().unwrap();
        let prefix = tag.split('-').next().unwrap();
        assert!(["B", "I", "E", "S", "O"].contains(&prefix), "unexpected tag {tag}");
    }
}

#[test]
fn malformed_relation_field_is_a_format_error() {
    let content = "# text = a b\n# relations = 1;1;x;2;rel\n1\ta\tO\n2\tb\tO\n";
    assert!(encode::parse_blocks(content).is_err());
}

proptest! {
    #[test]
    fn encoded_relations_parse_back(
        spans in prop::collection::vec((0usize..6, 0usize..6, "[a-z_]{1,8}"), 1..5),
    ) {
        let text = "t0 t1 t2 t3 t4 t5 t6 t7 t8 t9 t10 t11 .";
        let mut entities = Vec::new();
        let mut relations = Vec::new();
        for (idx, (subject, object, label)) in spans.iter().enumerate() {
            let subject_id = format!("s{idx}");
            let object_id = format!("o{idx}");
            entities.push(span(&subject_id, "x", *subject, *subject));
            entities.push(span(&object_id, "y", 6 + *object, 6 + *object));
            relations.push(Relation {
                id: format!("r{idx}"),
                subject: subject_id,
                object: object_id,
                label: label.clone(),
            });
        }
        let doc = document_with(text, entities, relations);
        let mut expected = encode::sentence_relations(&doc, SentenceBounds { first: 0, last: 12 });
        let blocks = encode::parse_blocks(&encode::encode(&[doc], OutputFormat::Conllu)).unwrap();
        prop_assert_eq!(blocks.len(), 1);
        let mut parsed = blocks[0].relations.clone();
        expected.sort();
        parsed.sort();
        prop_assert_eq!(parsed, expected);
        prop_assert_eq!(blocks[0].tokens.len(), 13);
    }
}
