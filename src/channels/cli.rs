//! CLI channel: the survey as a stdin/stdout session.
//!
//! stdout carries the survey itself; prompts and status lines go to stderr
//! alongside the tracing output.

use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;

use futures::{Stream, StreamExt, stream};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::channels::command::{Command, CommandParser, HELP};
use crate::error::Error;
use crate::llm::LlmProvider;
use crate::session::{ClosingProfiles, Delivered, Session, Step};
use crate::survey::{Choice, Page, PageKind, Participant, SurveyContent};
use crate::tasks::TaskEvent;

/// Lines typed by the participant, already stripped of the newline.
pub type LineStream = Pin<Box<dyn Stream<Item = String> + Send>>;

const LOADING: &str = "⏳ Generating personalized paragraphs, please wait...";

/// Reads stdin lines on a background task.
pub struct CliChannel;

impl CliChannel {
    pub fn new() -> Self {
        Self
    }

    pub fn start(&self) -> LineStream {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let mut lines = BufReader::new(stdin).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|line| (line, rx))
        });
        Box::pin(stream)
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// Ask for participant id and group until a valid, confirmed pair is given.
/// `None` when input ends first.
pub async fn intake(lines: &mut LineStream) -> Option<Participant> {
    loop {
        eprint!("Participant ID: ");
        let id = lines.next().await?;
        eprint!("Group (Experimental / Control): ");
        let group = lines.next().await?;

        let participant = match Participant::new(&id, &group) {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Intake rejected");
                println!("{e}");
                continue;
            }
        };

        eprint!(
            "Participant ID: {}   Group: {}\nIs this correct? [y/n] ",
            participant.id, participant.group
        );
        loop {
            let answer = lines.next().await?;
            match CommandParser::parse_confirm(&answer) {
                Some(true) => return Some(participant),
                Some(false) => break,
                None => eprint!("Please answer y or n: "),
            }
        }
    }
}

/// Run one survey session on `lines`: intake, then pages until the closing
/// answer is submitted, the participant quits or input ends.
pub async fn run(
    mut lines: LineStream,
    content: &SurveyContent,
    llm: Arc<dyn LlmProvider>,
    output_dir: &Path,
) -> Result<(), Error> {
    let Some(participant) = intake(&mut lines).await else {
        info!("Input closed before intake finished");
        return Ok(());
    };

    let (session, mut rx) = Session::start(participant, content, llm, output_dir)?;
    eprintln!("   Transcript: {}\n", session.transcript_path().display());

    let mut survey = SurveyLoop {
        session,
        closing: ClosingInput::Choosing(None),
    };
    survey.show_page()?;

    loop {
        tokio::select! {
            line = lines.next() => {
                let Some(line) = line else {
                    info!(session = %survey.session.id(), "Input closed, leaving survey");
                    return Ok(());
                };
                if survey.handle_line(&line)? == Flow::Stop {
                    return Ok(());
                }
            }
            Some(event) = rx.recv() => survey.handle_event(event)?,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Closing page input: pick a profile, then type the reasoning.
#[derive(Debug, Clone, Copy)]
enum ClosingInput {
    Choosing(Option<Choice>),
    Reasoning(Choice),
}

struct SurveyLoop {
    session: Session,
    closing: ClosingInput,
}

impl SurveyLoop {
    fn handle_line(&mut self, line: &str) -> Result<Flow, Error> {
        let command = CommandParser::parse(line);

        if let ClosingInput::Reasoning(choice) = self.closing {
            if command == Command::Quit {
                return Ok(self.quit());
            }
            // everything else, empty included, is the answer
            if surface(self.session.submit_closing(Some(choice), line))?.is_some() {
                println!("\nThank you for participating! You may now close this window.");
                return Ok(Flow::Stop);
            }
            return Ok(Flow::Continue);
        }

        let on_closing = matches!(self.session.current_page().kind, PageKind::Closing);
        match command {
            Command::Select(choice) if on_closing => {
                self.closing = ClosingInput::Choosing(Some(choice));
                eprintln!("Profile {choice} selected. Press Enter to continue.");
            }
            Command::Select(choice) => {
                if surface(self.session.select(choice))?.is_some() {
                    eprintln!("Paragraph {choice} selected. Press Enter to continue.");
                }
            }
            Command::Continue if on_closing => match self.closing {
                ClosingInput::Choosing(Some(choice)) => {
                    self.closing = ClosingInput::Reasoning(choice);
                    println!(
                        "\nPlease explain why you chose that profile (press Enter to skip):"
                    );
                }
                _ => {
                    surface(self.session.submit_closing(None, ""))?;
                }
            },
            Command::Continue => match surface(self.session.advance())? {
                Some(Step::Moved { .. }) => self.show_page()?,
                Some(Step::Closed) => return Ok(Flow::Stop),
                None => {}
            },
            Command::Refresh => {
                if surface(self.session.refresh())?.is_some() {
                    self.show_page()?;
                }
            }
            Command::Help => eprintln!("{HELP}"),
            Command::Quit => return Ok(self.quit()),
            Command::Text(text) => {
                eprintln!("Unrecognized input '{text}'. Type 'help' for commands.")
            }
        }
        Ok(Flow::Continue)
    }

    fn handle_event(&mut self, event: TaskEvent) -> Result<(), Error> {
        match self.session.deliver(event)? {
            Delivered::ProfileStored => eprintln!("⏳ Profile ready, writing paragraphs..."),
            Delivered::PagesFilled(pages) => {
                if pages.contains(&self.session.state().cursor()) {
                    self.show_page()?;
                }
            }
            Delivered::Failed { phase, message } => {
                println!("\n⚠️  Could not generate the {phase}: {message}");
                println!("Type 'refresh' to try again.");
            }
            Delivered::Stale => {}
        }
        Ok(())
    }

    fn show_page(&mut self) -> Result<(), Error> {
        if matches!(self.session.current_page().kind, PageKind::Closing) {
            let profiles = self.session.closing_profiles()?;
            println!("{}", render_closing(&profiles, self.session.participant()));
            return Ok(());
        }

        let page = self.session.current_page();
        println!("{}", render_page(page, self.session.participant()));
        if page.is_awaiting_content() {
            if self.session.is_loading() {
                eprintln!("{LOADING}");
            } else {
                eprintln!("Nothing to show yet. Type 'refresh' to generate the paragraphs.");
            }
        }
        Ok(())
    }

    fn quit(&self) -> Flow {
        info!(
            session = %self.session.id(),
            page = self.session.state().cursor(),
            "Participant quit"
        );
        Flow::Stop
    }
}

/// Show survey-level rejections to the participant and carry on; anything
/// else ends the session.
fn surface<T>(result: Result<T, Error>) -> Result<Option<T>, Error> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(Error::Survey(e)) => {
            println!("⚠️  {e}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn header(title: &str, participant: &Participant) -> String {
    let rule = "=".repeat(72);
    format!("\n{rule}\n{title:<60}{:>12}\n{rule}", participant.display_id())
}

/// Page body as shown in the terminal.
pub fn render_page(page: &Page, participant: &Participant) -> String {
    let mut out = header(&page.title, participant);
    match &page.kind {
        PageKind::Welcome { text } => {
            out.push_str(&format!("\n\n{text}\n\nPress Enter to begin."));
        }
        PageKind::Instructions { text } => {
            out.push_str(&format!("\n\n{text}\n\nPress Enter to continue."));
        }
        PageKind::TrainingPair { .. } | PageKind::GeneratedPair { .. } => {
            if let PageKind::TrainingPair {
                icon: Some(icon), ..
            } = &page.kind
            {
                out.push_str(&format!("\nIcon: {icon}"));
            }
            if let Some((p1, p2)) = page.paragraphs() {
                out.push_str(&format!(
                    "\n\nParagraph 1:\n{p1}\n\nParagraph 2:\n{p2}\n\n\
                     Type 1 or 2 to choose the paragraph you prefer, then press Enter."
                ));
            }
        }
        PageKind::Closing => {}
    }
    out
}

pub fn render_closing(profiles: &ClosingProfiles, participant: &Participant) -> String {
    format!(
        "{}\n\nWhich of these descriptions fits how you like to learn?\n\n\
         Profile 1:\n{}\n\nProfile 2:\n{}\n\n\
         Type 1 or 2, then press Enter.",
        header("Close", participant),
        profiles.left,
        profiles.right
    )
}
