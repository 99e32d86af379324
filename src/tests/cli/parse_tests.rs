use crate::cli::{CliError, Command, TransformArgs, USAGE, parse_args};
use crate::format::Indent;
use crate::transform::TransformKind;

fn run_args(args: &[&str]) -> TransformArgs {
    match parse_args(args.iter().copied()).expect("parse") {
        Command::Run(args) => args,
        other => panic!("expected a run command, got {other:?}"),
    }
}

#[test]
fn parses_positional_arguments() {
    let args = run_args(&["clear-ids", "in.json", "out.json"]);
    assert_eq!(args.kind, TransformKind::ClearIds);
    assert_eq!(args.source, "in.json");
    assert_eq!(args.target, "out.json");
    assert_eq!(args.indent, Indent::None);
    assert_eq!(args.url, None);
}

#[test]
fn options_may_appear_anywhere() {
    let args = run_args(&[
        "-i",
        "4",
        "add-ids",
        "in.json",
        "--url=http://couch:5984/db",
        "out.json",
        "--batch-size",
        "250",
        "--id-field",
        "uuid",
    ]);
    assert_eq!(args.kind, TransformKind::AddIds);
    assert_eq!(args.indent, Indent::Spaces(4));
    assert_eq!(args.url.as_deref(), Some("http://couch:5984/db"));
    assert_eq!(args.batch_size, Some(250));
    assert_eq!(args.id_field.as_deref(), Some("uuid"));

    let options = args.options();
    assert_eq!(options.batch_size, 250);
    assert_eq!(options.id_field, "uuid");
}

#[test]
fn indent_accepts_tabs() {
    let args = run_args(&["csv", "--indent=tabs", "in.csv", "-"]);
    assert_eq!(args.indent, Indent::Tab);
    assert_eq!(args.target, "-");
}

#[test]
fn dash_is_positional() {
    let args = run_args(&["clear-ids", "-", "-"]);
    assert_eq!(args.source, "-");
    assert_eq!(args.target, "-");
}

#[test]
fn reports_missing_pieces() {
    assert_eq!(parse_args(Vec::<String>::new()), Err(CliError::NoTransform));
    assert_eq!(parse_args(["clear-ids"]), Err(CliError::NoSource));
    assert_eq!(parse_args(["clear-ids", "in.json"]), Err(CliError::NoTarget));
    assert_eq!(
        parse_args(["rename", "in.json", "out.json"]),
        Err(CliError::UnknownTransform("rename".into()))
    );
}

#[test]
fn reports_bad_option_values() {
    assert_eq!(
        parse_args(["clear-ids", "-i", "wide", "a", "b"]),
        Err(CliError::InvalidIndent("wide".into()))
    );
    assert_eq!(
        parse_args(["clear-ids", "a", "b", "--url"]),
        Err(CliError::MissingValue("--url".into()))
    );
    assert!(matches!(
        parse_args(["add-ids", "a", "b", "--batch-size", "lots"]),
        Err(CliError::InvalidNumber { .. })
    ));
    assert_eq!(
        parse_args(["clear-ids", "a", "b", "--verbose"]),
        Err(CliError::UnexpectedArgument("--verbose".into()))
    );
    assert_eq!(
        parse_args(["clear-ids", "a", "b", "c"]),
        Err(CliError::UnexpectedArgument("c".into()))
    );
}

#[test]
fn config_flag_selects_config_command() {
    assert_eq!(
        parse_args(["-c", "job.yaml"]),
        Ok(Command::Config("job.yaml".into()))
    );
    assert_eq!(
        parse_args(["--config", "job.json", "extra"]),
        Err(CliError::UnexpectedArgument("extra".into()))
    );
}

#[test]
fn error_messages_match_usage_wording() {
    assert_eq!(CliError::NoSource.to_string(), "No SOURCE file");
    assert_eq!(
        CliError::UnknownTransform("x".into()).to_string(),
        "Unknown transformation: x"
    );
    assert!(USAGE.starts_with("doctransform TRANSFORMATION [OPTIONS] SOURCE TARGET"));
    assert!(USAGE.contains("--indent=tabs"));
}

#[test]
fn args_convert_into_a_builder() {
    let job = run_args(&["clear-ids", "in.json", "out.json", "-i", "2"])
        .into_builder()
        .build()
        .unwrap();
    assert_eq!(job.kind(), TransformKind::ClearIds);
    assert_eq!(job.source_id(), "in.json");
    assert_eq!(job.destination(), "out.json");
    assert_eq!(job.options().indent, Indent::Spaces(2));
}
