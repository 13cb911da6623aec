mod wizard;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use formwalk_session::{FormSession, NavOutcome, Phase, Snapshot, SubmitFailure};
use formwalk_spec::{
    FieldType, FieldValue, FormDoc, ValidationReport, ValueMap, document_schema, normalize,
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;
use wizard::{Presenter, PromptContext, ValueParseError, Verbosity};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Schema-driven form runner",
    long_about = "Interprets a declarative form document: guided filling with validation, \
                  conditional visibility, and step navigation."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fill a form interactively in a text shell.
    Fill {
        /// Path to the form document JSON.
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
        /// Optional JSON file with initial values.
        #[arg(long, value_name = "VALUES")]
        values: Option<PathBuf>,
        /// Write the submitted response JSON here instead of printing only.
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        /// Show verbose output (step status, progress, parse expectations).
        #[arg(long, alias = "debug")]
        verbose: bool,
        /// Also emit the response as pretty JSON on completion.
        #[arg(long)]
        values_json: bool,
    },
    /// Validate a value map against a form document.
    Validate {
        /// Path to the form document JSON.
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
        /// Path to the values JSON file.
        #[arg(long, value_name = "VALUES")]
        values: PathBuf,
    },
    /// Emit a JSON schema.
    Schema {
        /// Answers schema for this form document.
        #[arg(long, value_name = "FORM")]
        form: Option<PathBuf>,
        /// Schema of the form document model itself.
        #[arg(long)]
        document: bool,
    },
    /// Print the normalized layout of a form document.
    Inspect {
        /// Path to the form document JSON.
        #[arg(long, value_name = "FORM")]
        form: PathBuf,
    },
}

fn main() -> CliResult<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Fill {
            form,
            values,
            out,
            verbose,
            values_json,
        } => run_fill(form, values, out, verbose, values_json),
        Command::Validate { form, values } => run_validate(form, values),
        Command::Schema { form, document } => run_schema(form, document),
        Command::Inspect { form } => run_inspect(form),
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("FORMWALK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run_fill(
    form_path: PathBuf,
    values_path: Option<PathBuf>,
    out: Option<PathBuf>,
    verbose: bool,
    values_json: bool,
) -> CliResult<()> {
    let doc: FormDoc = serde_json::from_str(&fs::read_to_string(&form_path)?)?;
    let form = normalize(&doc)?;
    let mut session = FormSession::new(form);

    if let Some(path) = values_path {
        let initial: ValueMap = serde_json::from_str(&fs::read_to_string(path)?)?;
        for (field_id, value) in initial {
            if let Err(error) = session.set_value(&field_id, value) {
                eprintln!("Skipping preloaded value: {}", error);
            }
        }
    }

    let mut presenter = Presenter::new(Verbosity::from_verbose(verbose), values_json);
    presenter.show_header(&doc.title, doc.description.as_deref());

    loop {
        if session.phase() == Phase::Submitted {
            break;
        }
        let snapshot = session.snapshot();
        presenter.show_step(&snapshot);
        prompt_scope(&mut session, &snapshot, &presenter)?;
        match session.go_next() {
            NavOutcome::Moved(_) => {}
            NavOutcome::Blocked(errors) => presenter.show_errors(&errors),
            NavOutcome::SubmitReady => {
                let response = session.response();
                match write_response(&response, out.as_deref()) {
                    Ok(()) => {
                        session.resolve_submit(Ok(()));
                        presenter.show_completion(&response);
                    }
                    Err(error) => {
                        session.resolve_submit(Err(SubmitFailure::new(error.to_string())));
                        presenter.show_submission_failure(
                            session.submission_error().unwrap_or("submission failed"),
                        );
                    }
                }
            }
            NavOutcome::Ignored => break,
        }
    }

    Ok(())
}

fn write_response(
    response: &formwalk_spec::ResponseSet,
    out: Option<&Path>,
) -> CliResult<()> {
    if let Some(path) = out {
        fs::write(path, response.to_json_pretty()?)?;
    }
    Ok(())
}

fn prompt_scope(
    session: &mut FormSession,
    snapshot: &Snapshot,
    presenter: &Presenter,
) -> CliResult<()> {
    let mut index = snapshot.answered + 1;
    for field_id in &snapshot.visible_fields {
        let prompt = {
            let field = session
                .form()
                .field(field_id)
                .ok_or_else(|| format!("field '{}' missing from form", field_id))?;
            if !field.is_input() {
                presenter.show_static(field);
                continue;
            }
            let current = session
                .values()
                .get(field_id)
                .map(FieldValue::display);
            PromptContext::from_field(field, index, snapshot.total, current)
        };
        index += 1;
        if let Some(value) = prompt_value(&prompt, presenter)? {
            session.set_value(field_id, value)?;
        }
    }
    Ok(())
}

fn prompt_value(
    prompt: &PromptContext,
    presenter: &Presenter,
) -> CliResult<Option<FieldValue>> {
    loop {
        presenter.show_prompt(prompt);
        print!("> ");
        io::stdout().flush()?;
        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Err("input closed before the form was completed".into());
        }

        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("exit") {
            return Err("fill aborted by respondent".into());
        }
        if trimmed.is_empty() {
            // Keeps the current value (or leaves the field unset).
            return Ok(None);
        }

        match parse_value(prompt.kind, &prompt.options, trimmed) {
            Ok(value) => return Ok(Some(value)),
            Err(error) => presenter.show_parse_error(&error),
        }
    }
}

fn parse_value(
    kind: FieldType,
    options: &[String],
    raw: &str,
) -> Result<FieldValue, ValueParseError> {
    match kind {
        FieldType::SingleChoice | FieldType::MultiSelectDropdown | FieldType::BooleanChoice => {
            match options.iter().find(|option| option.eq_ignore_ascii_case(raw)) {
                Some(choice) => Ok(FieldValue::text(choice.clone())),
                None => Err(ValueParseError::new(
                    format!("Choose one of: {}.", options.join(", ")),
                    Some(format!("allowed values: {}", options.join(", "))),
                )),
            }
        }
        FieldType::NumericRating | FieldType::OpinionScale => raw
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(FieldValue::Number)
            .ok_or_else(|| {
                ValueParseError::new("Please enter a number.", Some("expected number".into()))
            }),
        FieldType::LegalConsent => parse_toggle(raw),
        _ => Ok(FieldValue::text(raw)),
    }
}

fn parse_toggle(raw: &str) -> Result<FieldValue, ValueParseError> {
    match raw.to_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Ok(FieldValue::Toggle(true)),
        "false" | "f" | "no" | "n" | "0" => Ok(FieldValue::Toggle(false)),
        _ => Err(ValueParseError::new(
            "Please answer yes or no.",
            Some("expected boolean (y/n/true/false)".to_string()),
        )),
    }
}

fn run_validate(form_path: PathBuf, values_path: PathBuf) -> CliResult<()> {
    let form_json = fs::read_to_string(form_path)?;
    let values_json = fs::read_to_string(values_path)?;

    let raw = formwalk_host::validate_answers(&form_json, &values_json);
    let report: ValidationReport = serde_json::from_value(parse_host_result(&raw)?)?;

    println!(
        "Validation result: {}",
        if report.valid { "valid" } else { "invalid" }
    );
    describe_report(&report);

    if report.valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_report(report: &ValidationReport) {
    if !report.errors.is_empty() {
        println!("Errors:");
        for error in &report.errors {
            println!("  {} - {}", error.field_id, error.message);
        }
    }
    if !report.unknown_fields.is_empty() {
        println!("Unknown value fields: {}", report.unknown_fields.join(", "));
    }
}

fn run_schema(form_path: Option<PathBuf>, document: bool) -> CliResult<()> {
    if document {
        println!("{}", serde_json::to_string_pretty(&document_schema())?);
        return Ok(());
    }
    let form_path = form_path.ok_or("provide --form for an answers schema, or --document")?;
    let form_json = fs::read_to_string(form_path)?;
    let schema = parse_host_result(&formwalk_host::answers_schema(&form_json, "{}"))?;
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn run_inspect(form_path: PathBuf) -> CliResult<()> {
    let form_json = fs::read_to_string(form_path)?;
    let summary = parse_host_result(&formwalk_host::describe(&form_json))?;

    let title = summary["title"].as_str().unwrap_or("<untitled>");
    let id = summary["id"].as_str().unwrap_or("<unknown>");
    let mode = summary["mode"].as_str().unwrap_or("flat");
    println!("Form: {} ({})", title, id);
    println!(
        "Mode: {} ({} fields)",
        mode,
        summary["fieldCount"].as_u64().unwrap_or(0)
    );
    if let Some(scopes) = summary["scopes"].as_array() {
        for (index, scope) in scopes.iter().enumerate() {
            let scope_id = scope["id"].as_str().unwrap_or("<unnamed>");
            let label = scope["title"].as_str().unwrap_or(scope_id);
            let fields = scope["fields"]
                .as_array()
                .map(|fields| {
                    fields
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            println!("  Step {}: {} [{}]", index + 1, label, fields);
        }
    }
    Ok(())
}

fn parse_host_result(response: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_str(response)?;
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        Err(error.into())
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_cmd::Command;
    use serde_json::json;

    const CONTACT_FORM: &str = include_str!("../tests/fixtures/contact_form.json");

    fn options(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_string()).collect()
    }

    #[test]
    fn parse_value_matches_choice_case_insensitively() {
        let options = options(&["Engineering", "Design"]);
        let value = parse_value(FieldType::SingleChoice, &options, "engineering").unwrap();
        assert_eq!(value, FieldValue::text("Engineering"));
        assert!(parse_value(FieldType::SingleChoice, &options, "sales").is_err());
    }

    #[test]
    fn parse_value_rating_requires_number() {
        let value = parse_value(FieldType::NumericRating, &[], "4").unwrap();
        assert_eq!(value, FieldValue::Number(4.0));
        assert!(parse_value(FieldType::NumericRating, &[], "four").is_err());
    }

    #[test]
    fn parse_toggle_accepts_yes_variants() {
        assert_eq!(parse_toggle("yes").unwrap(), FieldValue::Toggle(true));
        assert_eq!(parse_toggle("N").unwrap(), FieldValue::Toggle(false));
        assert!(parse_toggle("maybe").is_err());
    }

    #[test]
    fn validate_command_accepts_clean_values() -> CliResult<()> {
        let workspace = tempfile::TempDir::new()?;
        let form = workspace.path().join("form.json");
        let values = workspace.path().join("values.json");
        fs::write(&form, CONTACT_FORM)?;
        fs::write(
            &values,
            json!({ "name": "Test User", "email": "a@b.com" }).to_string(),
        )?;

        Command::cargo_bin("formwalk")?
            .arg("validate")
            .arg("--form")
            .arg(&form)
            .arg("--values")
            .arg(&values)
            .assert()
            .success();
        Ok(())
    }

    #[test]
    fn validate_command_rejects_bad_email() -> CliResult<()> {
        let workspace = tempfile::TempDir::new()?;
        let form = workspace.path().join("form.json");
        let values = workspace.path().join("values.json");
        fs::write(&form, CONTACT_FORM)?;
        fs::write(
            &values,
            json!({ "name": "Test User", "email": "invalid-email" }).to_string(),
        )?;

        Command::cargo_bin("formwalk")?
            .arg("validate")
            .arg("--form")
            .arg(&form)
            .arg("--values")
            .arg(&values)
            .assert()
            .failure();
        Ok(())
    }

    #[test]
    fn fill_command_walks_a_flat_form_to_submission() -> CliResult<()> {
        let workspace = assert_fs::TempDir::new()?;
        let form = workspace.path().join("form.json");
        let out = workspace.path().join("response.json");
        fs::write(&form, CONTACT_FORM)?;

        Command::cargo_bin("formwalk")?
            .arg("fill")
            .arg("--form")
            .arg(&form)
            .arg("--out")
            .arg(&out)
            .write_stdin("Test User\na@b.com\n")
            .assert()
            .success();

        let response: Value = serde_json::from_str(&fs::read_to_string(&out)?)?;
        assert_eq!(response["formId"], "contact");
        assert_eq!(response["values"]["name"], "Test User");
        assert_eq!(response["values"]["email"], "a@b.com");
        Ok(())
    }

    #[test]
    fn fill_command_reprompts_on_validation_errors() -> CliResult<()> {
        let workspace = assert_fs::TempDir::new()?;
        let form = workspace.path().join("form.json");
        let out = workspace.path().join("response.json");
        fs::write(&form, CONTACT_FORM)?;

        // First pass leaves name empty: advance is blocked, the scope is
        // prompted again, then the fill completes.
        Command::cargo_bin("formwalk")?
            .arg("fill")
            .arg("--form")
            .arg(&form)
            .arg("--out")
            .arg(&out)
            .write_stdin("\nTest User\na@b.com\n")
            .assert()
            .success();

        let response: Value = serde_json::from_str(&fs::read_to_string(&out)?)?;
        assert_eq!(response["values"]["name"], "Test User");
        Ok(())
    }
}
