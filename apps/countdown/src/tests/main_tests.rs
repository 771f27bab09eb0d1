use super::*;

#[test]
fn parses_reset_with_two_timestamps() {
    let command = parse_command("reset 2020-01-01T00:00:00Z 2020-01-01T00:20:00Z")
        .expect("parse")
        .expect("command");
    assert_eq!(
        command,
        Command::Reset {
            start: parse_timestamp("2020-01-01T00:00:00Z").expect("start"),
            end: parse_timestamp("2020-01-01T00:20:00Z").expect("end"),
        }
    );
}

#[test]
fn blank_lines_are_ignored() {
    assert_eq!(parse_command("   ").expect("parse"), None);
}

#[test]
fn rejects_malformed_commands() {
    assert!(parse_command("reset 2020-01-01T00:00:00Z").is_err());
    assert!(parse_command("reset a b").is_err());
    assert!(parse_command("reset 2020-01-01T00:00:00Z 2020-01-01T00:20:00Z extra").is_err());
    assert!(parse_command("undo").is_err());
}

#[test]
fn recognises_control_commands() {
    assert_eq!(parse_command("cancel").expect("parse"), Some(Command::Cancel));
    assert_eq!(parse_command("QUIT").expect("parse"), Some(Command::Quit));
    assert_eq!(parse_command("exit").expect("parse"), Some(Command::Quit));
}

#[test]
fn cli_flags_override_settings() {
    let args = Args::parse_from([
        "hanoi-countdown",
        "--start",
        "2020-01-01T00:00:00Z",
        "--end",
        "2020-01-01T01:00:00+01:00",
        "--format",
        "json",
        "--log",
        "debug",
    ]);
    let mut settings = Settings::default();
    args.apply(&mut settings).expect("apply");

    assert_eq!(settings.start, parse_timestamp("2020-01-01T00:00:00Z").expect("ts"));
    assert_eq!(settings.end, settings.start);
    assert_eq!(settings.format, OutputFormat::Json);
    assert_eq!(settings.log_filter, "debug");
}

#[test]
fn bad_cli_timestamp_is_reported() {
    let args = Args::parse_from(["hanoi-countdown", "--end", "tomorrow"]);
    let err = args.apply(&mut Settings::default()).expect_err("invalid");
    assert!(format!("{err:#}").contains("--end"));
}

#[test]
fn rejected_reset_reports_its_error_code() {
    let err = countdown_scheduler::CountdownRun::start(
        parse_timestamp("2020-01-01T00:20:00Z").expect("start"),
        parse_timestamp("2020-01-01T00:00:00Z").expect("end"),
        parse_timestamp("2020-01-01T00:30:00Z").expect("now"),
    )
    .expect_err("end before start");
    assert_eq!(err.code(), shared::error::ErrorCode::InvalidConfiguration);
}
