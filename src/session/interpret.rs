//! Engine response interpretation
//!
//! No I/O happens here: a reply goes in, the session is updated through its
//! own mutators, and the directives to render come out in display order.

use super::{Checkpoint, Controls, Directive, Role, Session};
use crate::engine::{Flow, TurnResponse};

/// Apply one validated engine reply to the session
pub fn interpret(session: &mut Session, response: &TurnResponse) -> Vec<Directive> {
    // An engine-reported error ends interpretation; nothing else is applied
    if let Some(error) = &response.error {
        return vec![Directive::error(format!("Error: {error}"))];
    }

    let mut directives = Vec::new();

    if let Some(percent) = response.progress_percent() {
        directives.push(Directive::UpdateProgress { percent });
    }

    match response.flow {
        Some(Flow::SymptomSpecific) if session.flow() != Flow::SymptomSpecific => {
            session.enter_symptom_flow(response.active_symptom.clone());
        }
        Some(Flow::Main) if session.flow() == Flow::SymptomSpecific => {
            session.exit_symptom_flow();
        }
        _ => {}
    }

    session.record(
        Role::Assistant,
        response.message.clone().unwrap_or_default(),
    );
    session.advance_prompt(response);

    if let Some(report) = &response.report {
        session.mark_completed();
        directives.push(Directive::RenderReport {
            message: response.message.clone(),
            report: report.clone(),
        });
    } else if let Some(text) = &response.message {
        directives.push(Directive::ShowMessage {
            text: text.clone(),
            meta: response.info_button.clone(),
        });
    }

    if let Some(kind) = response.input_kind {
        directives.push(Directive::SetInputMode {
            kind,
            placeholder: response.placeholder.clone(),
        });
    }

    if let Some(options) = response.offered_options() {
        directives.push(Directive::ShowOptions {
            options: options.to_vec(),
            multiple_select: response.multiple_select.unwrap_or(false),
        });
    }

    directives.push(controls(session));
    directives
}

/// Put a popped checkpoint back on screen
pub fn restore(session: &mut Session, checkpoint: Checkpoint) -> Vec<Directive> {
    let prompt = checkpoint.prompt.clone();
    session.restore_prompt(checkpoint);

    let mut directives = Vec::new();
    if let Some(text) = prompt.message {
        directives.push(Directive::message(text));
    }
    directives.push(Directive::SetInputMode {
        kind: prompt.input_kind,
        placeholder: prompt.placeholder,
    });
    if !prompt.options.is_empty() {
        directives.push(Directive::ShowOptions {
            options: prompt.options,
            multiple_select: prompt.multiple_select,
        });
    }
    directives.push(controls(session));
    directives
}

pub fn controls(session: &Session) -> Directive {
    Directive::SetControls(Controls {
        back: session.can_go_back(),
        save: session.is_completed(),
    })
}
