use std::fmt::Write;

use formwalk_session::Snapshot;
use formwalk_spec::{Field, FieldType, ResponseSet, ValidationError, ValueShape};

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: prompts only.
    Clean,
    /// Verbose output: step status, progress, parse expectations.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints prompts and status once the engine yields the next scope.
pub struct Presenter {
    verbosity: Verbosity,
    header_printed: bool,
    show_values_json: bool,
}

impl Presenter {
    pub fn new(verbosity: Verbosity, show_values_json: bool) -> Self {
        Self {
            verbosity,
            header_printed: false,
            show_values_json,
        }
    }

    pub fn show_header(&mut self, title: &str, description: Option<&str>) {
        if self.header_printed {
            return;
        }
        println!("Form: {}", title);
        if self.verbosity.is_verbose()
            && let Some(description) = description
        {
            println!("About: {}", description);
        }
        self.header_printed = true;
    }

    pub fn show_step(&self, snapshot: &Snapshot) {
        if self.verbosity.is_verbose() {
            let title = snapshot.scope_title.as_deref().unwrap_or(&snapshot.scope_id);
            println!(
                "Step {}/{}: {} ({}/{} answered)",
                snapshot.position + 1,
                snapshot.scope_count,
                title,
                snapshot.answered,
                snapshot.total
            );
        }
        if snapshot.visible_fields.is_empty() {
            println!("Nothing to answer on this step.");
        }
    }

    pub fn show_static(&self, field: &Field) {
        match field.kind {
            FieldType::PageBreak => {}
            _ => println!("{}", field.label),
        }
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = if prompt.total > 0 {
            format!("{}/{} {}", prompt.index, prompt.total, prompt.label)
        } else {
            format!("{} {}", prompt.index, prompt.label)
        };
        if prompt.required {
            line.push_str(" *");
        }
        if let Some(hint) = &prompt.hint {
            line.push(' ');
            line.push_str(hint);
        }
        if let Some(current) = &prompt.current {
            line.push_str(&format!(" [{}]", current));
        }
        println!("{}", line);
        if self.verbosity.is_verbose() && !prompt.options.is_empty() {
            println!("Options: {}", prompt.options.join(", "));
        }
    }

    pub fn show_parse_error(&self, error: &ValueParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if self.verbosity.is_verbose()
            && let Some(debug) = &error.debug_message
        {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_errors(&self, errors: &[ValidationError]) {
        eprintln!("Please fix the following before continuing:");
        for error in errors {
            eprintln!("  {}: {}", error.field_id, error.message);
        }
    }

    pub fn show_submission_failure(&self, reason: &str) {
        eprintln!("Submission failed: {}", reason);
        eprintln!("Your answers are preserved; submitting again will retry.");
    }

    pub fn show_completion(&self, response: &ResponseSet) {
        println!("Done ✅");
        match response.to_cbor() {
            Ok(bytes) => println!("Response (CBOR hex): {}", encode_hex(&bytes)),
            Err(error) => eprintln!("Failed to serialize response to CBOR: {}", error),
        }
        if self.show_values_json {
            match response.to_json_pretty() {
                Ok(pretty) => println!("{}", pretty),
                Err(error) => eprintln!("Failed to serialize response to JSON: {}", error),
            }
        }
    }
}

/// Owned context used to format and parse a single prompt, detached from
/// the session borrow.
pub struct PromptContext {
    pub index: usize,
    pub total: usize,
    pub label: String,
    pub required: bool,
    pub kind: FieldType,
    pub options: Vec<String>,
    pub hint: Option<String>,
    pub current: Option<String>,
}

impl PromptContext {
    pub fn from_field(
        field: &Field,
        index: usize,
        total: usize,
        current: Option<String>,
    ) -> Self {
        let hint = match field.shape {
            ValueShape::Choice => Some(format!("({})", field.options.join("/"))),
            ValueShape::Number => field
                .rating_bounds
                .map(|(min, max)| format!("({}-{})", min, max)),
            ValueShape::Toggle => Some("(yes/no)".to_string()),
            ValueShape::Text | ValueShape::Display => None,
        };
        Self {
            index: index.max(1),
            total,
            label: field.label.clone(),
            required: field.required,
            kind: field.kind,
            options: field.options.clone(),
            hint,
            current,
        }
    }
}

/// Error produced when parsing an answer typed by the respondent.
#[derive(Debug)]
pub struct ValueParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl ValueParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(&mut encoded, "{:02x}", byte).expect("writing to string cannot fail");
    }
    encoded
}
