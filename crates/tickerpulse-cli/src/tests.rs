use super::*;

#[test]
fn parses_harvest_command() {
    let cli = Cli::try_parse_from(["tickerpulse", "harvest"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Harvest));
}

#[test]
fn parses_enrich_with_event_path() {
    let cli = Cli::try_parse_from(["tickerpulse", "enrich", "--event", "batch.json"])
        .expect("expected valid cli args");

    match cli.command {
        Commands::Enrich { event, pending } => {
            assert_eq!(event, Some(PathBuf::from("batch.json")));
            assert!(!pending);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parses_enrich_pending() {
    let cli = Cli::try_parse_from(["tickerpulse", "enrich", "--pending"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Enrich {
            event: None,
            pending: true
        }
    ));
}

#[test]
fn enrich_requires_a_source() {
    assert!(Cli::try_parse_from(["tickerpulse", "enrich"]).is_err());
}

#[test]
fn enrich_rejects_both_sources() {
    assert!(
        Cli::try_parse_from(["tickerpulse", "enrich", "--event", "-", "--pending"]).is_err()
    );
}

#[test]
fn parses_schedule_command() {
    let cli = Cli::try_parse_from(["tickerpulse", "schedule"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Schedule));
}

#[test]
fn missing_command_is_an_error() {
    assert!(Cli::try_parse_from(["tickerpulse"]).is_err());
}

#[test]
fn help_is_handled_by_the_parser() {
    let err = Cli::try_parse_from(["tickerpulse", "--help"]).unwrap_err();
    assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
}
