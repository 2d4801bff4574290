//! Line-oriented terminal front-end
//!
//! Prints directives as plain text on stdout and turns typed lines into
//! `UserAction`s for the controller.

use crate::engine::{BiologicalSex, InfoButton, InputKind, QuickAssessRequest, Report, SymptomMatch};
use crate::runtime::Presenter;
use crate::session::{Controls, UserAction};
use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

const HELP: &str = "\
Commands:
  <number>            pick a shown option
  <n>, <n>, ...       pick several options on a multiple-select question
  /back               go back one question
  /restart            start a new assessment
  /save               save the finished assessment and get a share link
  /search <text>      look up symptom names
  /quick <age> <sex> <symptom>, <symptom>, ...
                      one-shot assessment outside the conversation
  /help               show this list
  /quit               leave
Anything else is sent as your answer.";

/// What a typed line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Act(UserAction),
    Help,
    Quit,
    /// Line could not be understood; the reason is shown to the user
    Invalid(String),
}

/// Options on screen, so a typed number can be resolved
#[derive(Debug, Default)]
struct Shown {
    options: Vec<String>,
    multiple_select: bool,
    controls: Controls,
}

pub struct TerminalPresenter {
    out: Mutex<Box<dyn Write + Send>>,
    shown: Mutex<Shown>,
}

impl TerminalPresenter {
    pub fn stdout() -> Self {
        Self::with_writer(std::io::stdout())
    }

    pub fn with_writer(out: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(out)),
            shown: Mutex::new(Shown::default()),
        }
    }

    pub fn print_help(&self) {
        self.write(HELP);
    }

    /// Interpret one typed line. Blank lines mean nothing.
    pub fn parse(&self, line: &str) -> Option<Command> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        if let Some(command) = line.strip_prefix('/') {
            return Some(parse_command(command));
        }
        if let Some(command) = self.parse_choice(line) {
            return Some(command);
        }
        Some(Command::Act(UserAction::Message {
            text: line.to_string(),
        }))
    }

    /// Numbers refer to the options on screen
    fn parse_choice(&self, line: &str) -> Option<Command> {
        if !line
            .chars()
            .all(|c| c.is_ascii_digit() || c == ',' || c.is_whitespace())
        {
            return None;
        }
        let shown = self.shown();
        if shown.options.is_empty() {
            // Plain numeric answer (age, temperature, ...)
            return None;
        }

        let mut values = Vec::new();
        for part in line.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let picked = part
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| shown.options.get(i));
            match picked {
                Some(value) => values.push(value.clone()),
                None => {
                    return Some(Command::Invalid(format!(
                        "There is no option {part}; pick 1 to {}.",
                        shown.options.len()
                    )))
                }
            }
        }

        if shown.multiple_select {
            return Some(Command::Act(UserAction::SelectionSubmitted { values }));
        }
        match <[String; 1]>::try_from(values) {
            Ok([value]) => Some(Command::Act(UserAction::OptionChosen { value })),
            Err(_) => Some(Command::Invalid("Please pick a single option.".into())),
        }
    }

    fn shown(&self) -> MutexGuard<'_, Shown> {
        self.shown.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn forget_options(&self) {
        let mut shown = self.shown();
        shown.options.clear();
        shown.multiple_select = false;
    }

    fn write(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{text}").and_then(|()| out.flush()) {
            tracing::debug!(error = %e, "Terminal write failed");
        }
    }
}

fn parse_command(command: &str) -> Command {
    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(name, rest)| (name, rest.trim()));

    match name.to_ascii_lowercase().as_str() {
        "back" => Command::Act(UserAction::GoBack),
        "restart" | "new" => Command::Act(UserAction::StartOver),
        "save" => Command::Act(UserAction::Save),
        "search" => Command::Act(UserAction::SymptomQuery {
            query: rest.to_string(),
        }),
        "quick" => match parse_quick(rest) {
            Ok(request) => Command::Act(UserAction::QuickAssess(request)),
            Err(reason) => Command::Invalid(reason),
        },
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => Command::Invalid(format!("Unknown command /{other}. Type /help for a list.")),
    }
}

/// `<age> <sex> <symptom>, <symptom>, ...`
fn parse_quick(args: &str) -> Result<QuickAssessRequest, String> {
    const USAGE: &str = "Usage: /quick <age> <female|male|intersex> <symptom>, <symptom>, ...";

    let mut parts = args.splitn(3, char::is_whitespace);
    let age = parts
        .next()
        .and_then(|a| a.parse::<u32>().ok())
        .filter(|a| *a <= 130)
        .ok_or_else(|| USAGE.to_string())?;
    let biological_sex = parts
        .next()
        .ok_or_else(|| USAGE.to_string())?
        .parse::<BiologicalSex>()?;
    // Empty symptom lists go through so the controller reports them
    let symptoms = parts
        .next()
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    Ok(QuickAssessRequest {
        age,
        biological_sex,
        symptoms,
    })
}

impl Presenter for TerminalPresenter {
    fn show_message(&self, text: &str, meta: Option<&InfoButton>) {
        self.forget_options();
        self.write(&format!("\n{text}"));
        if let Some(info) = meta {
            self.write(&format!("  [i] {}: {}", info.title, info.content));
        }
    }

    fn show_options(&self, options: &[String], multiple_select: bool) {
        {
            let mut shown = self.shown();
            shown.options = options.to_vec();
            shown.multiple_select = multiple_select;
        }
        for (i, option) in options.iter().enumerate() {
            self.write(&format!("  {}) {option}", i + 1));
        }
        if multiple_select {
            self.write("  (choose one or more, separated by commas)");
        }
    }

    fn update_progress(&self, percent: u8) {
        self.write(&format!("[{percent:>3}%]"));
    }

    fn render_report(&self, message: Option<&str>, report: &Report) {
        self.forget_options();
        self.write(&render_report(message, report));
    }

    fn set_input_mode(&self, kind: InputKind, placeholder: Option<&str>) {
        match (kind, placeholder) {
            (_, Some(hint)) => self.write(&format!("  ({hint})")),
            (InputKind::Number, None) => self.write("  (enter a number)"),
            (InputKind::SymptomSearch, None) => {
                self.write("  (type a symptom, or /search <text> for suggestions)");
            }
            _ => {}
        }
    }

    fn notify_error(&self, text: &str) {
        self.write(&format!("! {text}"));
    }

    fn set_controls_enabled(&self, controls: Controls) {
        let changed = {
            let mut shown = self.shown();
            let changed = shown.controls != controls;
            shown.controls = controls;
            changed
        };
        if changed && controls.save {
            self.write("  (assessment complete: /save to keep it, /restart to begin again)");
        }
    }

    fn clear_conversation(&self) {
        self.forget_options();
        self.write("\n--- New assessment ---");
    }

    fn notify(&self, text: &str) {
        self.write(&format!("* {text}"));
    }

    fn show_share_link(&self, url: &str) {
        self.write(&format!("  Share link: {url}"));
    }

    fn show_suggestions(&self, matches: &[SymptomMatch]) {
        if matches.is_empty() {
            self.write("  No matching symptoms.");
            return;
        }
        for m in matches {
            match &m.description {
                Some(description) => self.write(&format!("  - {}: {description}", m.name)),
                None => self.write(&format!("  - {}", m.name)),
            }
        }
    }
}

fn render_report(message: Option<&str>, report: &Report) -> String {
    let mut text = String::from("\n=== Health assessment ===");
    push_section(
        &mut text,
        "Summary",
        message.into_iter().chain(report.summary.as_deref()).map(str::to_string),
    );
    push_section(&mut text, "Possible conditions", report.possible_conditions.iter().cloned());
    push_section(&mut text, "Warning signs", report.warning_signs.iter().cloned());
    push_section(
        &mut text,
        "Specialists to consider",
        report.specialists.iter().map(|s| match &s.description {
            Some(d) => format!("{}: {d}", s.name),
            None => s.name.clone(),
        }),
    );
    let dated = report.report_date.as_ref().or(report.generated_at.as_ref());
    push_section(
        &mut text,
        "Report",
        report
            .report_id
            .iter()
            .map(|id| format!("id {id}"))
            .chain(dated.map(|date| format!("dated {date}"))),
    );
    text.push_str("\nThis is not a diagnosis. Seek medical care for anything urgent.");
    text
}

/// Titled bullet list; nothing at all when there are no lines
fn push_section(text: &mut String, title: &str, lines: impl Iterator<Item = String>) {
    let mut lines = lines.peekable();
    if lines.peek().is_none() {
        return;
    }
    text.push('\n');
    text.push_str(title);
    text.push(':');
    for line in lines {
        text.push_str("\n  - ");
        text.push_str(&line);
    }
}

/// Read commands until end of input or `/quit`, forwarding actions
pub async fn read_commands<R>(
    input: R,
    presenter: &TerminalPresenter,
    actions: &mpsc::Sender<UserAction>,
) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        match presenter.parse(&line) {
            None => {}
            Some(Command::Quit) => break,
            Some(Command::Help) => presenter.print_help(),
            Some(Command::Invalid(reason)) => presenter.notify_error(&reason),
            Some(Command::Act(action)) => {
                if actions.send(action).await.is_err() {
                    tracing::warn!("Controller stopped; no longer reading input");
                    break;
                }
            }
        }
    }
    Ok(())
}
