use std::fs;

use ner_relation_prep::{
    config::Settings,
    data::mapping::{check_label, Delimiter, LabelMapper, Ontology, TranslationTable},
    PrepError,
};
use proptest::prelude::*;

#[test]
fn tab_table_maps_raw_to_lowercased_canonical() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("entities.tsv");
    fs::write(&path, "Medication\tDrug name\nSymptom\tComplaint\n\n").unwrap();
    let table = TranslationTable::load(&path, Delimiter::Tab).unwrap();
    assert_eq!(table.len(), 2);
    assert_eq!(table.get("Drug name"), Some("medication"));
    assert_eq!(table.get("drug name"), None);
}

#[test]
fn line_without_delimiter_rejects_whole_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("entities.tsv");
    fs::write(&path, "Medication\tDrug name\nbroken line\n").unwrap();
    let err = TranslationTable::load(&path, Delimiter::Tab).unwrap_err();
    assert!(matches!(err, PrepError::MappingLoad { .. }));
}

#[test]
fn csv_table_reads_first_and_sixth_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("relations.csv");
    fs::write(&path, "treats,a,b,c,d,Therapy\nCauses,a,b,c,d, Side_Effect \n").unwrap();
    let table = TranslationTable::load(&path, Delimiter::Comma).unwrap();
    assert_eq!(table.get("treats"), Some("therapy"));
    assert_eq!(table.get("Causes"), Some("side_effect"));
}

#[test]
fn csv_row_with_too_few_columns_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("relations.csv");
    fs::write(&path, "treats,a,b,c,d,Therapy\nshort,row\n").unwrap();
    assert!(matches!(
        TranslationTable::load(&path, Delimiter::Comma),
        Err(PrepError::MappingLoad { .. })
    ));
}

#[test]
fn missing_file_is_a_mapping_error() {
    let err = TranslationTable::load("/nonexistent/table.tsv", Delimiter::Tab).unwrap_err();
    assert!(matches!(err, PrepError::MappingLoad { .. }));
}

#[test]
fn ontology_lowercases_both_sides() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ontology.txt");
    fs::write(&path, "Prescribes Drug - Treatment\nReports Pain - Symptom\n").unwrap();
    let ontology = Ontology::load(&path).unwrap();
    assert_eq!(ontology.main_class("prescribes drug"), Some("treatment"));
    assert_eq!(ontology.main_class("reports pain"), Some("symptom"));
}

#[test]
fn entity_and_relation_policies_differ() {
    let mapper = LabelMapper::new(
        TranslationTable::from_pairs([("Person", "per")]),
        TranslationTable::from_pairs([("WorksFor", "employment")]),
        Ontology::from_pairs([("employment", "organisation_link"), ("knows", "social")]),
        "unclassified",
    );
    assert_eq!(mapper.entity_label("Person"), "per");
    assert_eq!(mapper.entity_label("Location"), "Location");
    assert_eq!(mapper.relation_label(Some("WorksFor")), "organisation_link");
    assert_eq!(mapper.relation_label(Some("Knows")), "social");
    assert_eq!(mapper.relation_label(Some("LivesIn")), "unclassified");
    assert_eq!(mapper.relation_label(None), "unclassified");
}

#[test]
fn separator_in_relation_label_rejects_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("relations.csv");
    fs::write(&path, "treats,a,b,c,d,Therapy\nWorksFor,a,b,c,d,works|for\n").unwrap();
    assert!(matches!(
        TranslationTable::load(&path, Delimiter::Comma),
        Err(PrepError::MappingLoad { .. })
    ));
}

#[test]
fn separator_in_ontology_class_rejects_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ontology.txt");
    fs::write(&path, "Prescribes Drug - treat;ment\n").unwrap();
    assert!(matches!(Ontology::load(&path), Err(PrepError::MappingLoad { .. })));
}

#[test]
fn padded_fallback_label_is_a_configuration_error() {
    let mut settings = Settings::rooted("data", "outputs");
    settings.fallback_relation_label = " unclassified ".into();
    assert!(matches!(settings.load_mapper(), Err(PrepError::Configuration(_))));

    settings.fallback_relation_label = "un|classified".into();
    assert!(matches!(settings.load_mapper(), Err(PrepError::Configuration(_))));

    settings.fallback_relation_label = "unclassified".into();
    assert!(settings.load_mapper().is_ok());
}

#[test]
fn label_check_accepts_inner_spaces_only() {
    assert!(check_label("works for").is_ok());
    assert!(check_label("").is_err());
    assert!(check_label("works ").is_err());
    assert!(check_label("works\nfor").is_err());
}

proptest! {
    #[test]
    fn loaded_labels_never_carry_field_separators(label in "[a-z|; ]{1,8}") {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relations.csv");
        fs::write(&path, format!("Raw,a,b,c,d,{label}\n")).unwrap();
        let trimmed = label.trim();
        let valid = !trimmed.is_empty() && !trimmed.contains(['|', ';']);
        match TranslationTable::load(&path, Delimiter::Comma) {
            Ok(table) => {
                prop_assert!(valid);
                prop_assert_eq!(table.get("Raw"), Some(trimmed));
            }
            Err(err) => {
                prop_assert!(!valid);
                prop_assert!(matches!(err, PrepError::MappingLoad { .. }), "unexpected error {err}");
            }
        }
    }
}
