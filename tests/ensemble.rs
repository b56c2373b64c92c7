//! End-to-end run of the three passes over a small two-language collection.
use std::path::Path;

use serde_json::json;

use gazetta::identifiers::ProviderConfig;
use gazetta::io::{JsonlReader, JsonlWriter};
use gazetta::pipelines::{
    Aggregate, AggregateConfig, Decide, DecideConfig, Identify, IdentifyConfig, Pipeline,
};
use gazetta::types::{CollectionStats, Decision, Record};

fn german_text() -> String {
    "Die Redaktion der Zeitung veröffentlicht heute einen ausführlichen Bericht \
     über die Verhandlungen des Gemeinderates, die gestern Abend im grossen Saale \
     des Rathauses stattgefunden haben und bis tief in die Nacht dauerten."
        .repeat(2)
}

fn french_text() -> String {
    "La rédaction du journal publie aujourd'hui un compte rendu détaillé des \
     délibérations du conseil communal, qui se sont tenues hier soir dans la \
     grande salle de l'hôtel de ville et ont duré jusque tard dans la nuit."
        .repeat(2)
}

fn write_stage0(path: &Path) {
    let mut writer = JsonlWriter::to_path(path).unwrap();
    writer
        .write(&json!({"id": "gazette-1900-01-02-a-i0001", "tp": "ar", "ft": german_text(), "lg": "de"}))
        .unwrap();
    writer
        .write(&json!({"id": "gazette-1900-01-02-a-i0002", "tp": "ar", "ft": german_text(), "lg": null}))
        .unwrap();
    writer
        .write(&json!({"id": "gazette-1900-01-03-a-i0003", "tp": "ar", "ft": french_text(), "lg": "fr"}))
        .unwrap();
    writer
        .write(&json!({"id": "gazette-1900-01-03-a-i0004", "tp": "img"}))
        .unwrap();
    writer
        .write(&json!({"id": "gazette-1900-01-03-a-i0005", "tp": "ad", "ft": "Zu verkaufen."}))
        .unwrap();
    writer.finish().unwrap();
}

#[test_log::test]
fn three_pass_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let stage0 = dir.path().join("gazette-1900.jsonl.gz");
    let stage1_dir = dir.path().join("stage1");
    let stats_path = dir.path().join("gazette.json");
    let labels_dir = dir.path().join("labels");
    let diagnostics_path = dir.path().join("diagnostics.json");

    write_stage0(&stage0);
    let lids = vec!["langid".to_string()];

    // stage 1
    Identify::new(
        vec![stage0.clone()],
        stage1_dir.clone(),
        lids.clone(),
        ProviderConfig::default(),
        IdentifyConfig::default(),
    )
    .run()
    .unwrap();

    let stage1_file = stage1_dir.join("gazette-1900.jsonl.gz");
    let records: Vec<Record> = JsonlReader::from_path(&stage1_file)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(records.len(), 5);

    // classified items carry predictions, the image and the ad do not
    assert_eq!(records[0].top("langid").unwrap().lang(), "de");
    assert_eq!(records[2].top("langid").unwrap().lang(), "fr");
    assert!(records[3].predictions.is_empty());
    assert!(records[4].predictions.is_empty());
    assert!(records[0].language_identifier_version.is_some());

    // stage 2: a lone classifier may decide on its own here
    Aggregate::new(
        vec![stage1_file.clone()],
        Some(stats_path.clone()),
        AggregateConfig {
            lids: lids.clone(),
            minimal_vote_score: 0.5,
            minimal_lid_probability: 0.0,
            ..Default::default()
        },
    )
    .run()
    .unwrap();

    let stats = CollectionStats::from_path(&stats_path).unwrap();
    assert_eq!(stats.collection.as_deref(), Some("gazette"));
    assert_eq!(stats.n, 3);
    assert_eq!(stats.dominant_language.as_deref(), Some("de"));
    assert_eq!(stats.contentitem_type_distribution["img"], 1);
    assert_eq!(stats.lg_support["langid"]["de"], 1.0);

    // stage 3
    Decide::new(
        vec![stage1_file],
        labels_dir.clone(),
        stats_path,
        Some(diagnostics_path.clone()),
        DecideConfig {
            lids,
            ..Default::default()
        },
    )
    .run()
    .unwrap();

    let decisions: Vec<Decision> = JsonlReader::from_path(&labels_dir.join("gazette-1900.jsonl.gz"))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(decisions.len(), 5);

    // order is preserved, so items line up with the input
    assert_eq!(decisions[0].lg.as_deref(), Some("de"));
    assert_eq!(decisions[2].lg.as_deref(), Some("fr"));
    assert_eq!(decisions[2].collection, "gazette");
    assert_eq!(decisions[2].year, "1900");

    // the image keeps a null language and no decision rule
    assert_eq!(decisions[3].lg, None);
    assert!(decisions[3].lg_decision.is_none());

    // the short ad falls back to the dominant collection language
    assert_eq!(decisions[4].lg.as_deref(), Some("de"));

    assert!(diagnostics_path.exists());
}
