use std::sync::Arc;

use serde_json::{Value, json};

use crate::config::TransformOptions;
use crate::format::{Indent, JsonRecordSource};
use crate::ids::IdCache;
use crate::io::InMemorySink;
use crate::pipeline::{PipelineEvent, TransformPipeline};
use crate::source::ContainerKind;
use crate::tests::support::{RecordingObserver, SequenceService, numbered_docs};
use crate::transform::TransformKind;

fn json_source(text: &str) -> JsonRecordSource<std::io::Cursor<Vec<u8>>> {
    JsonRecordSource::new("in.json", std::io::Cursor::new(text.as_bytes().to_vec()))
}

#[tokio::test]
async fn clear_ids_with_two_space_indent() {
    let sink = InMemorySink::new("out.json");
    let pipeline = TransformPipeline::new(
        TransformKind::ClearIds,
        TransformOptions::default().with_indent(Indent::Spaces(2)),
    );

    let mut source = json_source(r#"[{"_id":"x","v":1},{"v":2}]"#);
    let summary = pipeline.run(&mut source, &sink).await.unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.emitted, 2);
    assert_eq!(summary.container, Some(ContainerKind::Array));
    assert_eq!(summary.destination, "out.json");
    assert_eq!(
        sink.contents_string(),
        "[\n  {\n    \"v\": 1\n  },\n  {\n    \"v\": 2\n  }\n]\n"
    );
    assert_eq!(summary.bytes_written, sink.contents().len() as u64);
}

#[tokio::test]
async fn compact_output_is_one_record_per_line() {
    let sink = InMemorySink::new("out.json");
    let pipeline = TransformPipeline::new(TransformKind::ClearIds, TransformOptions::default());

    let mut source = json_source(r#"[{"_id":1,"a":[1,2]},{"b":{"c":null}}]"#);
    pipeline.run(&mut source, &sink).await.unwrap();

    assert_eq!(
        sink.contents_string(),
        "[\n{\"a\":[1,2]},\n{\"b\":{\"c\":null}}\n]\n"
    );
}

#[tokio::test]
async fn root_object_is_written_without_brackets() {
    let sink = InMemorySink::new("out.json");
    let pipeline = TransformPipeline::new(
        TransformKind::ClearIds,
        TransformOptions::default().with_indent(Indent::Tab),
    );

    let mut source = json_source(r#"{"_id":"x","nested":{"k":1}}"#);
    let summary = pipeline.run(&mut source, &sink).await.unwrap();

    assert_eq!(summary.container, Some(ContainerKind::Object));
    assert_eq!(sink.contents_string(), "{\n\t\"nested\": {\n\t\t\"k\": 1\n\t}\n}");
}

#[tokio::test]
async fn empty_array_yields_empty_array() {
    let sink = InMemorySink::new("out.json");
    let pipeline = TransformPipeline::new(TransformKind::ClearIds, TransformOptions::default());
    let mut source = json_source("[]");
    let summary = pipeline.run(&mut source, &sink).await.unwrap();

    assert_eq!(summary.processed, 0);
    assert_eq!(sink.contents_string(), "[\n]\n");
    let parsed: Value = serde_json::from_str(&sink.contents_string()).unwrap();
    assert_eq!(parsed, json!([]));
}

#[tokio::test]
async fn add_ids_assigns_identifiers_in_order() {
    let service = Arc::new(SequenceService::new());
    let sink = InMemorySink::new("out.json");
    let options = TransformOptions::default().with_batch_size(2);
    let cache = IdCache::new(service.clone(), options.batch_size);
    let pipeline = TransformPipeline::new(TransformKind::AddIds, options).with_id_cache(cache);

    let mut source = json_source(r#"[{"v":1},{"v":2,"_id":"old"},{"v":3}]"#);
    let summary = pipeline.run(&mut source, &sink).await.unwrap();
    assert_eq!(summary.processed, 3);

    let out: Value = serde_json::from_str(&sink.contents_string()).unwrap();
    assert_eq!(
        out,
        json!([
            {"v": 1, "_id": "id1"},
            {"v": 2, "_id": "id2"},
            {"v": 3, "_id": "id3"},
        ])
    );
    assert!(service.calls() >= 2);
}

#[tokio::test]
async fn add_ids_are_unique_across_many_batches() {
    let sink = InMemorySink::new("out.json");
    let cache = IdCache::new(Arc::new(SequenceService::new()), 7);
    let pipeline = TransformPipeline::new(TransformKind::AddIds, TransformOptions::default())
        .with_id_cache(cache);

    let mut source = json_source(&numbered_docs(50));
    pipeline.run(&mut source, &sink).await.unwrap();

    let out: Vec<Value> = serde_json::from_str(&sink.contents_string()).unwrap();
    assert_eq!(out.len(), 50);
    let mut ids: Vec<&str> = out.iter().map(|d| d["_id"].as_str().unwrap()).collect();
    assert!(ids.iter().all(|id| !id.is_empty()));
    for (i, doc) in out.iter().enumerate() {
        assert_eq!(doc["n"], json!(i + 1));
    }
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 50);
}

#[tokio::test]
async fn progress_every_hundred_records() {
    let observer = Arc::new(RecordingObserver::default());
    let sink = InMemorySink::new("out.json");
    let pipeline = TransformPipeline::new(TransformKind::ClearIds, TransformOptions::default())
        .with_observer(observer.clone());

    let mut source = json_source(&numbered_docs(250));
    pipeline.run(&mut source, &sink).await.unwrap();

    assert_eq!(observer.progress(), vec![100, 200]);
    assert_eq!(
        observer.events().last(),
        Some(&PipelineEvent::Completed {
            count: 250,
            destination: "out.json".into()
        })
    );
}

#[tokio::test]
async fn progress_interval_is_configurable() {
    let observer = Arc::new(RecordingObserver::default());
    let sink = InMemorySink::new("out.json");
    let pipeline = TransformPipeline::new(
        TransformKind::ClearIds,
        TransformOptions::default().with_progress_interval(2),
    )
    .with_observer(observer.clone());

    let mut source = json_source(&numbered_docs(5));
    pipeline.run(&mut source, &sink).await.unwrap();
    assert_eq!(observer.progress(), vec![2, 4]);
}

#[cfg(feature = "csv")]
mod csv_scenarios {
    use super::*;
    use crate::format::CsvRowSource;

    fn csv_source(text: &str) -> CsvRowSource<std::io::Cursor<Vec<u8>>> {
        CsvRowSource::new("in.csv", std::io::Cursor::new(text.as_bytes().to_vec()))
    }

    #[tokio::test]
    async fn rows_become_objects() {
        let sink = InMemorySink::new("out.json");
        let pipeline = TransformPipeline::new(TransformKind::Csv, TransformOptions::default());

        let mut source = csv_source("a,b,c\n1,,3\n4,5,6\n");
        let summary = pipeline.run(&mut source, &sink).await.unwrap();

        assert_eq!(summary.processed, 2);
        assert_eq!(
            sink.contents_string(),
            "[\n{\"a\":\"1\",\"c\":\"3\"},\n{\"a\":\"4\",\"b\":\"5\",\"c\":\"6\"}\n]\n"
        );
    }

    #[tokio::test]
    async fn skipped_rows_keep_the_array_valid() {
        let observer = Arc::new(RecordingObserver::default());
        let sink = InMemorySink::new("out.json");
        let pipeline = TransformPipeline::new(
            TransformKind::Csv,
            TransformOptions::default().with_indent(Indent::Spaces(2)),
        )
        .with_observer(observer.clone());

        // the first and last data rows are blank
        let mut source = csv_source("name\n\nann\n\nbob\n\n");
        let summary = pipeline.run(&mut source, &sink).await.unwrap();

        assert_eq!(summary.processed, 5);
        assert_eq!(summary.emitted, 2);
        let out: Value = serde_json::from_str(&sink.contents_string()).unwrap();
        assert_eq!(out, json!([{"name": "ann"}, {"name": "bob"}]));
        assert_eq!(
            observer.events().last(),
            Some(&PipelineEvent::Completed {
                count: 5,
                destination: "out.json".into()
            })
        );
    }

    #[tokio::test]
    async fn header_only_input_is_an_empty_array() {
        let sink = InMemorySink::new("out.json");
        let pipeline = TransformPipeline::new(TransformKind::Csv, TransformOptions::default());
        let mut source = csv_source("a,b\n");
        let summary = pipeline.run(&mut source, &sink).await.unwrap();
        assert_eq!(summary.processed, 0);
        assert_eq!(sink.contents_string(), "[\n]\n");
    }
}
