use std::io::Cursor;

use geoshare_converter::{
    ConversionDeps, ConversionState, FailureReason, IntentAction, Network, NetworkError,
    ResultSink, SinkError, StateContext,
};
use reqwest::Url;

use super::*;
use crate::convert::{initial_state, run_conversion, Prompt};
use crate::sinks::FileSink;

// ---------------------------------------------------------------------------
// Argument parsing
// ---------------------------------------------------------------------------

#[test]
fn parses_convert_with_defaults() {
    let cli = Cli::try_parse_from(["geoshare", "convert", "https://maps.app.goo.gl/AbC"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Convert {
            ref input,
            permission: None,
            json: false,
            copy: None,
            share: false,
        } if input == "https://maps.app.goo.gl/AbC"
    ));
}

#[test]
fn parses_convert_flags() {
    let cli = Cli::try_parse_from([
        "geoshare",
        "convert",
        "geo:1,2",
        "--permission",
        "Never",
        "--json",
        "--copy",
        "out.txt",
    ])
    .expect("expected valid cli args");

    let Commands::Convert {
        permission,
        json,
        copy,
        ..
    } = cli.command
    else {
        panic!("expected convert command");
    };
    assert_eq!(permission, Some(PermissionDecision::Never));
    assert!(json);
    assert_eq!(copy, Some(PathBuf::from("out.txt")));
}

#[test]
fn parses_share_flag() {
    let cli = Cli::try_parse_from(["geoshare", "convert", "geo:1,2", "--share"])
        .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Convert {
            share: true,
            json: false,
            ..
        }
    ));
}

#[test]
fn share_conflicts_with_json() {
    let result = Cli::try_parse_from(["geoshare", "convert", "geo:1,2", "--share", "--json"]);
    assert!(result.is_err());
}

#[test]
fn rejects_unknown_permission() {
    let result = Cli::try_parse_from(["geoshare", "convert", "x", "--permission", "sometimes"]);
    assert!(result.is_err());
}

#[test]
fn parses_permission_show_and_set() {
    let show = Cli::try_parse_from(["geoshare", "permission"]).expect("expected valid cli args");
    assert!(matches!(show.command, Commands::Permission { value: None }));

    let set =
        Cli::try_parse_from(["geoshare", "permission", "always"]).expect("expected valid cli args");
    assert!(matches!(
        set.command,
        Commands::Permission {
            value: Some(PermissionDecision::Always)
        }
    ));
}

#[test]
fn missing_command_is_an_error() {
    assert!(Cli::try_parse_from(["geoshare"]).is_err());
}

// ---------------------------------------------------------------------------
// Input classification
// ---------------------------------------------------------------------------

#[test]
fn url_and_geo_inputs_are_uri_strings() {
    assert_eq!(
        initial_state(" https://www.google.com/maps/@1,2,3z "),
        ConversionState::ReceivedUriString {
            input: "https://www.google.com/maps/@1,2,3z".to_owned()
        }
    );
    assert!(matches!(
        initial_state("geo:1,2?q=two words"),
        ConversionState::ReceivedUriString { .. }
    ));
}

#[test]
fn free_text_is_a_send_text_intent() {
    let state = initial_state("Dinner here https://maps.app.goo.gl/AbC tonight");
    let ConversionState::ReceivedIntent { intent } = state else {
        panic!("expected an intent, got {state:?}");
    };
    assert_eq!(intent.action, IntentAction::SendText);
}

// ---------------------------------------------------------------------------
// Prompting
// ---------------------------------------------------------------------------

#[test]
fn line_prompt_accepts_only_yes() {
    let mut out = Vec::new();
    let mut prompt = LinePrompt::new(Cursor::new("y\nYES\nno\n\n"), &mut out);

    assert!(prompt.confirm("one?").unwrap());
    assert!(prompt.confirm("two?").unwrap());
    assert!(!prompt.confirm("three?").unwrap());
    assert!(!prompt.confirm("four?").unwrap());
    assert!(!prompt.confirm("eof?").unwrap());
    drop(prompt);
    assert!(String::from_utf8(out).unwrap().starts_with("one? [y/N] "));
}

struct ScriptedPrompt {
    answers: Vec<bool>,
    questions: Vec<String>,
}

impl Prompt for ScriptedPrompt {
    fn confirm(&mut self, question: &str) -> anyhow::Result<bool> {
        self.questions.push(question.to_owned());
        Ok(self.answers.remove(0))
    }
}

struct RedirectNetwork;

impl Network for RedirectNetwork {
    async fn head_lookup(&self, _url: &Url) -> Result<Url, NetworkError> {
        Ok(Url::parse("https://www.google.com/maps/@52.5,13.2,11z").unwrap())
    }

    async fn fetch_body(&self, url: &Url) -> Result<String, NetworkError> {
        Err(NetworkError::UnexpectedStatus {
            status: 500,
            url: url.to_string(),
        })
    }
}

#[tokio::test]
async fn ask_prompts_and_remembers_grant() {
    let preferences = MemoryPreferences::new();
    let mut ctx = StateContext::new(
        ConversionDeps::new(RedirectNetwork, &preferences),
        ConversionState::Initial,
    );
    let mut prompt = ScriptedPrompt {
        answers: vec![true, true],
        questions: Vec::new(),
    };

    let state = run_conversion(
        &mut ctx,
        initial_state("https://maps.app.goo.gl/AbC"),
        &mut prompt,
    )
    .await
    .unwrap();

    assert_eq!(
        state,
        ConversionState::Succeeded {
            geo_uri: "geo:52.5,13.2?z=11".to_owned(),
            unchanged: false,
        }
    );
    assert_eq!(prompt.questions.len(), 2);
    assert_eq!(
        preferences.get(CONNECTION_PERMISSION_KEY),
        PermissionDecision::Always
    );
}

#[tokio::test]
async fn declined_prompt_fails_without_storing() {
    let preferences = MemoryPreferences::new();
    let mut ctx = StateContext::new(
        ConversionDeps::new(RedirectNetwork, &preferences),
        ConversionState::Initial,
    );
    let mut prompt = ScriptedPrompt {
        answers: vec![false, false],
        questions: Vec::new(),
    };

    let state = run_conversion(
        &mut ctx,
        initial_state("https://maps.app.goo.gl/AbC"),
        &mut prompt,
    )
    .await
    .unwrap();

    assert_eq!(
        state,
        ConversionState::Failed {
            reason: FailureReason::PermissionDenied
        }
    );
    assert_eq!(
        preferences.get(CONNECTION_PERMISSION_KEY),
        PermissionDecision::Ask
    );
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[test]
fn renders_plain_and_json_output() {
    let state = ConversionState::Succeeded {
        geo_uri: "geo:1,2?z=3".to_owned(),
        unchanged: true,
    };

    let (uri, plain) = render_outcome(&state, false).unwrap();
    assert_eq!(uri, "geo:1,2?z=3");
    assert_eq!(plain, "geo:1,2?z=3");

    let (_, json) = render_outcome(&state, true).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["geo_uri"], "geo:1,2?z=3");
    assert_eq!(value["unchanged"], true);
}

#[test]
fn failed_conversion_is_an_error_with_reason() {
    let state = ConversionState::Failed {
        reason: FailureReason::InvalidUrl,
    };

    let err = render_outcome(&state, false).unwrap_err();
    assert_eq!(err.to_string(), "conversion failed: invalid URL");
}

// ---------------------------------------------------------------------------
// Share and copy
// ---------------------------------------------------------------------------

struct RejectingSink;

impl ResultSink for RejectingSink {
    fn deliver(&self, _geo_uri: &str) -> Result<(), SinkError> {
        Err(SinkError::Rejected("stdout is closed".to_owned()))
    }
}

#[tokio::test]
async fn share_delivers_through_the_sink() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("shared.txt");

    share_with("geo:1,2?z=9", &FileSink::new(&path)).await.unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "geo:1,2?z=9\n");
}

#[tokio::test]
async fn rejected_share_is_an_error() {
    let err = share_with("geo:1,2", &RejectingSink).await.unwrap_err();

    assert_eq!(err.to_string(), "could not share: rejected: stdout is closed");
}

#[test]
fn file_sink_writes_uri() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("clip.txt");

    FileSink::new(&path).deliver("geo:1,2").unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), "geo:1,2\n");
}

#[tokio::test]
async fn copy_to_missing_directory_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("clip.txt");

    let err = copy_to_file("geo:1,2", &path).await.unwrap_err();

    assert!(err.to_string().starts_with("could not copy to"), "{err}");
}
