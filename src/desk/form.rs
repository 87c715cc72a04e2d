//! Interactive bill form driven by text commands.

use std::io::Write;
use std::str::FromStr;
use anyhow::Error;
use derive_more::{Display, Error as DeriveError};
use log::info;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::select;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use crate::desk::editor::{DraftItemList, ItemEditor};
use crate::desk::model::draft::DraftField;
use crate::desk::service::BillService;
use crate::desk::view::render_form;
use crate::desk::workflow::{BillSubmissionWorkflow, Outcome, SubmitAttempt, WorkflowSettings};

const HELP: &str = "commands: add | rm ROW | set ROW name|price|qty VALUE | show | submit | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FormCommand {
    Add,
    /// 0-based row
    Remove { row: usize },
    Set { row: usize, field: DraftField, value: String },
    Show,
    Submit,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Display, DeriveError)]
pub(crate) enum CommandError {
    #[display("unknown command {command:?}, try `help`")]
    Unknown { command: String },
    #[display("usage: {usage}")]
    Usage { usage: &'static str },
}

fn parse_row(raw: Option<&str>, usage: &'static str) -> Result<usize, CommandError> {
    raw.and_then(|raw| raw.parse::<usize>().ok())
        .and_then(|row| row.checked_sub(1))
        .ok_or(CommandError::Usage { usage })
}

impl FromStr for FormCommand {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const RM_USAGE: &str = "rm ROW (rows start at 1)";
        const SET_USAGE: &str = "set ROW name|price|qty VALUE";

        let mut parts = s.split_whitespace();
        match parts.next() {
            Some("add") => Ok(Self::Add),
            Some("rm") | Some("remove") => Ok(Self::Remove {
                row: parse_row(parts.next(), RM_USAGE)?,
            }),
            Some("set") => {
                let row = parse_row(parts.next(), SET_USAGE)?;
                let field = parts
                    .next()
                    .and_then(|field| field.parse().ok())
                    .ok_or(CommandError::Usage { usage: SET_USAGE })?;
                Ok(Self::Set {
                    row,
                    field,
                    value: parts.collect::<Vec<_>>().join(" "),
                })
            }
            Some("show") => Ok(Self::Show),
            Some("submit") => Ok(Self::Submit),
            Some("help") => Ok(Self::Help),
            Some("quit") | Some("back") => Ok(Self::Quit),
            other => Err(CommandError::Unknown {
                command: other.unwrap_or_default().to_string(),
            }),
        }
    }
}

/// How the form was left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FormExit {
    /// a bill was approved and the completion signal fired
    Completed,
    Abandoned,
}

/// An open bill form: the draft rows plus the submission workflow for them.
pub(crate) struct Form<S: BillService> {
    editor: ItemEditor,
    workflow: BillSubmissionWorkflow<S>,
    done: UnboundedReceiver<()>,
    awaiting_completion: bool,
}

impl<S: BillService> Form<S> {
    pub fn open(service: S, settings: WorkflowSettings, items: DraftItemList) -> Self {
        let (done_tx, done) = unbounded_channel();
        let workflow = BillSubmissionWorkflow::new(service, settings, move || {
            let _ = done_tx.send(());
        });
        Self {
            editor: ItemEditor::new(items),
            workflow,
            done,
            awaiting_completion: false,
        }
    }

    /// Submit the current rows. An approval clears the form.
    pub async fn submit(&mut self) -> SubmitAttempt {
        let attempt = self.workflow.submit(self.editor.items()).await;
        if let SubmitAttempt::Settled(Outcome::Approved(_)) = &attempt {
            self.editor.reset();
            self.awaiting_completion = true;
        }
        attempt
    }

    /// Submit once and leave, waiting for the completion signal on approval.
    pub async fn submit_once<W: Write>(mut self, out: &mut W) -> Result<FormExit, Error> {
        write!(out, "{}", render_form(&self.editor, &self.workflow.state()))?;
        self.submit().await;
        write!(out, "{}", render_form(&self.editor, &self.workflow.state()))?;
        Ok(self.finish().await)
    }

    /// Read commands line by line until the user quits, input ends, or an
    /// approved bill signals completion.
    pub async fn run<R, W>(mut self, input: R, out: &mut W) -> Result<FormExit, Error>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        let mut lines = input.lines();
        writeln!(out, "{}", HELP)?;
        write!(out, "{}", render_form(&self.editor, &self.workflow.state()))?;
        loop {
            let event = select! {
                Some(()) = self.done.recv() => None,
                line = lines.next_line() => Some(line?),
            };
            let line = match event {
                None => {
                    self.workflow.teardown().await;
                    return Ok(FormExit::Completed);
                }
                Some(None) => return Ok(self.finish().await),
                Some(Some(line)) => line,
            };
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<FormCommand>() {
                Ok(FormCommand::Quit) => {
                    info!("bill form left by user");
                    self.workflow.teardown().await;
                    return Ok(FormExit::Abandoned);
                }
                Ok(command) => self.apply(command, out).await?,
                Err(e) => writeln!(out, "{}", e)?,
            }
        }
    }

    async fn apply<W: Write>(&mut self, command: FormCommand, out: &mut W) -> Result<(), Error> {
        let edited = match command {
            FormCommand::Add => {
                self.editor.add_row();
                Ok(())
            }
            FormCommand::Remove { row } => self.editor.remove_row(row),
            FormCommand::Set { row, field, value } => self.editor.set_field(row, field, value),
            FormCommand::Submit => {
                if let SubmitAttempt::Rejected = self.submit().await {
                    writeln!(out, "a submission is already in progress")?;
                }
                Ok(())
            }
            FormCommand::Help => {
                writeln!(out, "{}", HELP)?;
                return Ok(());
            }
            FormCommand::Show | FormCommand::Quit => Ok(()),
        };
        // indexes come from typed input here, so a bad one is reported, not fatal
        if let Err(e) = edited {
            writeln!(out, "{}", e)?;
        }
        write!(out, "{}", render_form(&self.editor, &self.workflow.state()))?;
        Ok(())
    }

    async fn finish(mut self) -> FormExit {
        if self.awaiting_completion && self.done.recv().await.is_some() {
            return FormExit::Completed;
        }
        self.workflow.teardown().await;
        FormExit::Abandoned
    }
}
