use super::*;

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["socsync-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_migrate_command() {
    let cli = Cli::try_parse_from(["socsync-cli", "migrate"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Migrate)));
}

#[test]
fn sync_all_defaults_to_scheduled_selection() {
    let cli = Cli::try_parse_from(["socsync-cli", "sync-all"]).expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::SyncAll {
            manual: false,
            deadline_secs: None
        })
    ));
}

#[test]
fn sync_all_accepts_manual_and_deadline() {
    let cli = Cli::try_parse_from([
        "socsync-cli",
        "sync-all",
        "--manual",
        "--deadline-secs",
        "30",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::SyncAll {
            manual: true,
            deadline_secs: Some(30)
        })
    ));
}

#[test]
fn sync_account_parses_uuid() {
    let id = "6f1d2c3b-4a59-4e8f-9a7b-0c1d2e3f4a5b";
    let cli =
        Cli::try_parse_from(["socsync-cli", "sync-account", id]).expect("expected valid cli args");

    match cli.command {
        Some(Commands::SyncAccount { account_id }) => assert_eq!(account_id.to_string(), id),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn sync_account_rejects_non_uuid() {
    assert!(Cli::try_parse_from(["socsync-cli", "sync-account", "42"]).is_err());
}

#[test]
fn refresh_tokens_takes_optional_user() {
    let cli = Cli::try_parse_from(["socsync-cli", "refresh-tokens", "--user-id", "7"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::RefreshTokens { user_id: Some(7) })
    ));
}

#[test]
fn snapshot_without_user_covers_everyone() {
    let cli = Cli::try_parse_from(["socsync-cli", "snapshot"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Snapshot { user_id: None })));
}
