use std::path::PathBuf;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::io::{FileInput, FileOutput, InputProvider, OutputTarget, StdinInput, StdoutOutput};

#[test]
fn std_streams_use_dash_id() {
    assert_eq!(StdinInput::new().id(), "-");
    assert_eq!(StdoutOutput::default().id(), "-");
}

#[tokio::test]
async fn file_output_truncates_and_file_input_reads_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.json");
    std::fs::write(&path, "old content that is longer").unwrap();

    let output = FileOutput::new(path.clone());
    assert_eq!(output.path(), &path);
    {
        let mut w = output.open_overwrite().await.unwrap();
        w.write_all(b"[]").await.unwrap();
        w.shutdown().await.unwrap();
    }

    let input = FileInput::new(path.clone());
    assert_eq!(input.id(), path.to_string_lossy());
    let mut r = input.open().await.unwrap();
    let mut text = String::new();
    r.read_to_string(&mut text).await.unwrap();
    assert_eq!(text, "[]");
}

#[tokio::test]
async fn missing_input_file_fails_to_open() {
    let input = FileInput::new(PathBuf::from("definitely/not/here.json"));
    let Err(err) = input.open().await else {
        panic!("opening a missing file should fail");
    };
    assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
}
