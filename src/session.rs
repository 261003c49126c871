//! Survey session: the single owner of all per-participant state.
//!
//! The front end drives a `Session` from one task: it forwards selections,
//! continue/refresh requests and every `TaskEvent` that arrives from the
//! background workers (`deliver`). Workers only ever see owned copies of the
//! inputs they need, so the profile and the generated page content have a
//! single writer.

use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use rand::Rng;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{Error, SurveyError};
use crate::llm::LlmProvider;
use crate::profile::LearningProfile;
use crate::survey::content::{RewriteSource, SurveyContent};
use crate::survey::page::{Choice, Page, PageKind};
use crate::survey::participant::{Group, Participant};
use crate::survey::state::{Advance, SurveyState};
use crate::tasks::{Phase, ProfileJob, RewriteJob, Rewritten, TaskEvent, TaskRunner};
use crate::transcript::Transcript;

/// What `advance` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Now on page `to`. `generation` is set when entering the page started
    /// background generation.
    Moved {
        to: usize,
        generation: Option<Generation>,
    },
    /// The survey is over.
    Closed,
}

/// A background generation that was just started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation {
    pub id: u64,
    /// Whether the profile phase runs first. `false` means the cached profile
    /// is reused and only rewrites are requested.
    pub profile_call: bool,
}

/// What applying a `TaskEvent` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivered {
    /// Profile stored; the rewrite phase has been started.
    ProfileStored,
    /// Generated content written into these page indices.
    PagesFilled(Vec<usize>),
    /// The phase failed. The page keeps waiting until a refresh.
    Failed { phase: Phase, message: String },
    /// Result of a generation that is no longer current; ignored.
    Stale,
}

/// The two profiles in the order they are shown on the closing page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosingProfiles {
    pub left: String,
    pub right: String,
    /// `true` when the participant's actual profile is on the left.
    pub actual_on_left: bool,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    generation: u64,
    from_interaction: usize,
}

pub struct Session {
    id: Uuid,
    participant: Participant,
    state: SurveyState,
    rewrite_sources: Vec<RewriteSource>,
    transcript: Transcript,
    runner: TaskRunner,
    profile: Option<LearningProfile>,
    generation: u64,
    in_flight: Option<InFlight>,
    started: Instant,
    page_started: Instant,
    load_started: Option<Instant>,
    actual_on_left: Option<bool>,
}

impl Session {
    /// Start a session from loaded content, writing the transcript to
    /// `output_dir`. Returns the session and the receiver worker results
    /// arrive on.
    pub fn start(
        participant: Participant,
        content: &SurveyContent,
        llm: Arc<dyn LlmProvider>,
        output_dir: &std::path::Path,
    ) -> Result<(Self, mpsc::UnboundedReceiver<TaskEvent>), Error> {
        let transcript = Transcript::create(output_dir, &participant, Local::now())?;
        Self::new(
            participant,
            content.build_pages(),
            content.rewrite_sources.clone(),
            llm,
            transcript,
        )
    }

    /// Assemble a session from its parts.
    ///
    /// `rewrite_sources[i]` feeds generated interaction `i + 1`.
    pub fn new(
        participant: Participant,
        pages: Vec<Page>,
        rewrite_sources: Vec<RewriteSource>,
        llm: Arc<dyn LlmProvider>,
        transcript: Transcript,
    ) -> Result<(Self, mpsc::UnboundedReceiver<TaskEvent>), Error> {
        let state = SurveyState::new(pages)?;
        let (runner, rx) = TaskRunner::new(llm);
        let now = Instant::now();
        let id = Uuid::new_v4();
        info!(
            session = %id,
            participant = %participant.id,
            group = %participant.group,
            pages = state.pages().len(),
            "Survey session started"
        );
        let session = Self {
            id,
            participant,
            state,
            rewrite_sources,
            transcript,
            runner,
            profile: None,
            generation: 0,
            in_flight: None,
            started: now,
            page_started: now,
            load_started: None,
            actual_on_left: None,
        };
        Ok((session, rx))
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn participant(&self) -> &Participant {
        &self.participant
    }

    pub fn state(&self) -> &SurveyState {
        &self.state
    }

    pub fn current_page(&self) -> &Page {
        self.state.current_page()
    }

    pub fn profile(&self) -> Option<&LearningProfile> {
        self.profile.as_ref()
    }

    pub fn transcript_path(&self) -> &std::path::Path {
        self.transcript.path()
    }

    /// A generation is running in the background.
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    // ── Participant actions ─────────────────────────────────────────

    pub fn select(&mut self, choice: Choice) -> Result<(), Error> {
        let elapsed = self.page_started.elapsed();
        self.state.select(choice, elapsed)?;
        let page = self.state.cursor();
        self.transcript
            .record(page, &format!("Option Select: {choice}"), elapsed)?;
        Ok(())
    }

    /// Leave the current page. Blocked with `SelectionRequired` when a pair
    /// page has no selection yet.
    pub fn advance(&mut self) -> Result<Step, Error> {
        let elapsed = self.page_started.elapsed();
        let page = self.state.cursor();
        let was_pair = self.state.current_page().requires_selection();

        let outcome = match self.state.advance(elapsed) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(session = %self.id, page, error = %e, "Advance rejected");
                return Err(e.into());
            }
        };

        if was_pair {
            self.log_history()?;
        }

        match outcome {
            Advance::Closed => {
                self.transcript.record(page, "Quit", elapsed)?;
                self.transcript.note(&format!(
                    "\n---\nTotal Survey Runtime: {:.2} s",
                    self.started.elapsed().as_secs_f64()
                ))?;
                info!(session = %self.id, "Survey session closed");
                Ok(Step::Closed)
            }
            Advance::Moved { to, .. } => {
                self.transcript.record(page, "Continue", elapsed)?;
                self.page_started = Instant::now();

                let generation = match self.state.current_page().interaction() {
                    Some(interaction)
                        if self.state.current_page().is_awaiting_content()
                            && self.in_flight.is_none() =>
                    {
                        Some(self.begin_generation(interaction, false)?)
                    }
                    _ => None,
                };
                Ok(Step::Moved { to, generation })
            }
        }
    }

    /// Regenerate content for the current generated page.
    ///
    /// On the first generated page the profile is rebuilt as well; on later
    /// pages only the rewrites from this page onward are redone. A refresh
    /// while a generation is running is rejected.
    pub fn refresh(&mut self) -> Result<Generation, Error> {
        let page = self.state.current_page();
        let interaction = page
            .interaction()
            .ok_or(SurveyError::NotGenerated { page: page.index })?;
        if self.in_flight.is_some() {
            warn!(session = %self.id, interaction, "Refresh rejected while generating");
            return Err(SurveyError::GenerationPending.into());
        }

        self.transcript.note(&format!(
            "Refresh called on GPT interaction number {interaction}."
        ))?;
        self.state.reset_generated_from(interaction);
        self.begin_generation(interaction, interaction == 1)
    }

    /// Apply a worker result. This is the only place generated state is
    /// written.
    ///
    /// A transcript failure while applying the result ends the generation,
    /// so the page can still be refreshed.
    pub fn deliver(&mut self, event: TaskEvent) -> Result<Delivered, Error> {
        let current = match self.in_flight {
            Some(f) if f.generation == event.generation() => f,
            _ => {
                debug!(
                    session = %self.id,
                    generation = event.generation(),
                    "Ignoring stale task result"
                );
                return Ok(Delivered::Stale);
            }
        };

        let result = self.apply(current, event);
        if result.is_err() {
            self.in_flight = None;
            self.load_started = None;
        }
        result
    }

    fn apply(&mut self, current: InFlight, event: TaskEvent) -> Result<Delivered, Error> {
        match event {
            TaskEvent::ProfileReady {
                profile, elapsed, ..
            } => {
                self.transcript
                    .note(&format!("Student Profile: {}", profile.actual))?;
                self.transcript
                    .note(&format!("Opposite Student Profile: {}", profile.opposite))?;
                self.transcript.note(&format!(
                    "Profiler Run Time: {:.2} s\n***\n",
                    elapsed.as_secs_f64()
                ))?;
                self.profile = Some(profile);
                self.spawn_rewrites(current)?;
                Ok(Delivered::ProfileStored)
            }
            TaskEvent::RewritesReady { rewrites, .. } => {
                self.in_flight = None;
                let load_started = self.load_started.take();

                let mut filled = Vec::with_capacity(rewrites.len());
                for rewritten in &rewrites {
                    filled.push(
                        self.state
                            .fill_generated(rewritten.interaction, rewritten.content.clone())?,
                    );
                }
                if filled.contains(&self.state.cursor()) {
                    self.page_started = Instant::now();
                }

                for rewritten in &rewrites {
                    self.log_rewrite(rewritten)?;
                }
                if let Some(started) = load_started {
                    self.transcript.note(&format!(
                        "\n***\nTotal Loading Time: {:.2} s\n***\n",
                        started.elapsed().as_secs_f64()
                    ))?;
                }
                Ok(Delivered::PagesFilled(filled))
            }
            TaskEvent::Failed { phase, error, .. } => {
                self.in_flight = None;
                self.load_started = None;
                let message = error.to_string();
                self.transcript
                    .note(&format!("Error: {phase} generation failed: {message}"))?;
                Ok(Delivered::Failed { phase, message })
            }
        }
    }

    /// Profiles for the closing page, left/right order picked once per
    /// session.
    pub fn closing_profiles(&mut self) -> Result<ClosingProfiles, Error> {
        let profile = self.profile.clone().ok_or(SurveyError::ProfileMissing)?;
        let actual_on_left = match self.actual_on_left {
            Some(v) => v,
            None => {
                let v = rand::thread_rng().gen_bool(0.5);
                self.actual_on_left = Some(v);
                self.transcript.note(if v {
                    "left --- Actual profile on left, opposite profile on right."
                } else {
                    "right --- Opposite profile on left, actual profile on right."
                })?;
                v
            }
        };
        let (left, right) = if actual_on_left {
            (profile.actual, profile.opposite)
        } else {
            (profile.opposite, profile.actual)
        };
        Ok(ClosingProfiles {
            left,
            right,
            actual_on_left,
        })
    }

    /// Record the closing-page answer and close the session.
    ///
    /// A profile choice is required; an empty reasoning is stored as
    /// `"Verbal response."`.
    pub fn submit_closing(&mut self, choice: Option<Choice>, reasoning: &str) -> Result<Step, Error> {
        let page = self.state.current_page();
        if !matches!(page.kind, PageKind::Closing) {
            return Err(SurveyError::NotClosingPage.into());
        }
        if self.state.is_closed() {
            return Err(SurveyError::SessionClosed.into());
        }
        let choice = choice.ok_or(SurveyError::SelectionRequired { page: page.index })?;
        let index = page.index;

        let reasoning = if reasoning.trim().is_empty() {
            "Verbal response."
        } else {
            reasoning.trim()
        };
        self.transcript
            .record(index, &format!("Option: {choice}"), self.page_started.elapsed())?;
        self.transcript.note(&format!(
            "\n\nSaving final outputs:\n*Profile Selection: {choice}\nFinal Response Text: {reasoning}\n\n\
             *Recall: Profile selection = 1 is the left option, = 2 is the right option."
        ))?;
        self.advance()
    }

    // ── Generation ──────────────────────────────────────────────────

    fn begin_generation(
        &mut self,
        from_interaction: usize,
        refresh_profile: bool,
    ) -> Result<Generation, Error> {
        self.generation += 1;
        let flight = InFlight {
            generation: self.generation,
            from_interaction,
        };
        self.in_flight = Some(flight);
        self.load_started = Some(Instant::now());

        let profile_call = self.profile.is_none() || refresh_profile;
        if profile_call {
            let history = self.state.history();
            self.runner.spawn_profile(ProfileJob {
                generation: flight.generation,
                selections: history.selections.clone(),
                opposite_selections: history.opposite_selections.clone(),
                pair_context: self.state.pair_context().to_vec(),
            });
        } else {
            self.spawn_rewrites(flight)?;
        }

        info!(
            session = %self.id,
            generation = flight.generation,
            from_interaction,
            profile_call,
            "Generation started"
        );
        Ok(Generation {
            id: flight.generation,
            profile_call,
        })
    }

    fn spawn_rewrites(&mut self, flight: InFlight) -> Result<(), Error> {
        let profile = self.profile.as_ref().ok_or(SurveyError::ProfileMissing)?;
        let driving = profile.for_group(self.participant.group).to_string();
        self.transcript.note(match self.participant.group {
            Group::Experimental => {
                "\nExperimental Group - using ACTUAL student profile to generate rewrites."
            }
            Group::Control => "\nControl Group - using OPPOSITE student profile to generate rewrites.",
        })?;

        let sources = self
            .state
            .generated_interactions_from(flight.from_interaction)
            .into_iter()
            .filter_map(|i| self.rewrite_sources.get(i - 1).map(|s| (i, s.clone())))
            .collect();

        self.runner.spawn_rewrites(RewriteJob {
            generation: flight.generation,
            profile: driving,
            sources,
        });
        Ok(())
    }

    fn log_rewrite(&mut self, rewritten: &Rewritten) -> Result<(), Error> {
        let n = rewritten.interaction;
        if let Some(source) = n.checked_sub(1).and_then(|i| self.rewrite_sources.get(i)) {
            self.transcript.note(&format!(
                "Original text rewritten for GPT interaction {n}: {}",
                source.original
            ))?;
        }
        let content = &rewritten.content;
        self.transcript
            .note(&format!("Generic rewrite text: {}", content.generic()))?;
        self.transcript.note(&format!(
            "Rewritten Paragraph for GPT interaction {n}: {}",
            content.custom()
        ))?;
        self.transcript.note(&format!(
            "GPT interaction {n}: {}\nRewrite Run Time: {:.2} s\n***",
            content.order.describe(),
            rewritten.elapsed.as_secs_f64()
        ))?;
        Ok(())
    }

    fn log_history(&mut self) -> Result<(), Error> {
        let h = self.state.history();
        let chosen: Vec<u8> = h.selections.iter().map(|c| c.number()).collect();
        let not_chosen: Vec<u8> = h.opposite_selections.iter().map(|c| c.number()).collect();
        let line = format!(
            "\n***\nParagraphs Chosen List: {chosen:?}\nParagraphs not Chosen List: {not_chosen:?}\n\n\
             Paragraphs Chosen Text: {:?}\nParagraphs not Chosen Text: {:?}\n***\n",
            h.selected_texts, h.opposite_texts
        );
        self.transcript.note(&line)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::TimeZone;

    use crate::error::LlmError;
    use crate::llm::{CompletionRequest, CompletionResponse, FinishReason};
    use crate::profile::prompts::PROFILER_SYSTEM;
    use crate::survey::content::default_rewrite_sources;

    /// Counts profile and rewrite calls separately.
    #[derive(Default)]
    struct CountingLlm {
        profile_calls: AtomicUsize,
        rewrite_calls: AtomicUsize,
        fail_rewrites: bool,
    }

    #[async_trait::async_trait]
    impl LlmProvider for CountingLlm {
        fn model_name(&self) -> &str {
            "mock-counting"
        }

        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
            let content = if request.messages[0].content == PROFILER_SYSTEM {
                let n = self.profile_calls.fetch_add(1, Ordering::SeqCst) + 1;
                format!("profile {n}")
            } else {
                if self.fail_rewrites {
                    return Err(LlmError::RequestFailed {
                        provider: "mock".into(),
                        reason: "timeout".into(),
                    });
                }
                let n = self.rewrite_calls.fetch_add(1, Ordering::SeqCst) + 1;
                format!("rewrite {n}")
            };
            Ok(CompletionResponse {
                content,
                input_tokens: 0,
                output_tokens: 0,
                finish_reason: FinishReason::Stop,
                response_id: None,
            })
        }
    }

    fn pages() -> Vec<Page> {
        let content = SurveyContent {
            instructions: "Choose the paragraph you like best.".into(),
            training: vec![
                crate::survey::TrainingRow {
                    title: "Topic 1: Water Cycle".into(),
                    paragraph1: "A".into(),
                    paragraph2: "B".into(),
                    icon: None,
                },
                crate::survey::TrainingRow {
                    title: "Topic 2: Climate Change".into(),
                    paragraph1: "C".into(),
                    paragraph2: "D".into(),
                    icon: None,
                },
            ],
            rewrite_sources: default_rewrite_sources(),
        };
        content.build_pages()
    }

    struct Harness {
        session: Session,
        rx: mpsc::UnboundedReceiver<TaskEvent>,
        llm: Arc<CountingLlm>,
        _dir: tempfile::TempDir,
    }

    fn harness(group: &str, llm: CountingLlm) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let participant = Participant::new("P01", group).unwrap();
        let started = Local.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap();
        let transcript = Transcript::create(dir.path(), &participant, started).unwrap();
        let llm = Arc::new(llm);
        let (session, rx) = Session::new(
            participant,
            pages(),
            default_rewrite_sources(),
            llm.clone(),
            transcript,
        )
        .unwrap();
        Harness {
            session,
            rx,
            llm,
            _dir: dir,
        }
    }

    impl Harness {
        fn transcript(&self) -> String {
            std::fs::read_to_string(self.session.transcript_path()).unwrap()
        }

        /// Walk welcome, instructions and both training pages.
        fn finish_training(&mut self, choices: [Choice; 2]) -> Step {
            self.session.advance().unwrap();
            self.session.advance().unwrap();
            self.session.select(choices[0]).unwrap();
            self.session.advance().unwrap();
            self.session.select(choices[1]).unwrap();
            self.session.advance().unwrap()
        }

        async fn pump(&mut self) -> Delivered {
            let event = self.rx.recv().await.unwrap();
            self.session.deliver(event).unwrap()
        }
    }

    #[tokio::test]
    async fn first_generated_page_chains_profile_then_rewrites() {
        let mut h = harness("Experimental", CountingLlm::default());
        let step = h.finish_training([Choice::Option1, Choice::Option2]);
        assert_eq!(
            step,
            Step::Moved {
                to: 4,
                generation: Some(Generation {
                    id: 1,
                    profile_call: true
                })
            }
        );
        assert!(h.session.is_loading());
        assert!(matches!(
            h.session.advance(),
            Err(Error::Survey(SurveyError::ContentPending { page: 4 }))
        ));

        assert_eq!(h.pump().await, Delivered::ProfileStored);
        assert_eq!(h.session.profile().unwrap().actual, "profile 1");
        assert_eq!(h.pump().await, Delivered::PagesFilled(vec![4, 5]));
        assert!(!h.session.is_loading());

        assert_eq!(h.llm.profile_calls.load(Ordering::SeqCst), 2);
        assert_eq!(h.llm.rewrite_calls.load(Ordering::SeqCst), 2);

        let log = h.transcript();
        assert!(log.contains("Student Profile: profile 1"));
        assert!(log.contains("Opposite Student Profile: profile 2"));
        assert!(log.contains("Experimental Group - using ACTUAL"));
        assert!(log.contains("Total Loading Time"));
        assert!(log.contains("Profiler Run Time"));

        // what the participant compares ends up in the transcript
        let sources = default_rewrite_sources();
        assert!(log.contains("Rewritten Paragraph for GPT interaction 1: rewrite 1"));
        assert!(log.contains("Rewritten Paragraph for GPT interaction 2: rewrite 2"));
        assert!(log.contains(&format!(
            "Original text rewritten for GPT interaction 1: {}",
            sources[0].original
        )));
        assert!(log.contains(&format!("Generic rewrite text: {}", sources[1].generic_rewrite)));
        assert_eq!(log.matches("Rewrite Run Time").count(), 2);
    }

    #[tokio::test]
    async fn cached_profile_skips_profile_call() {
        let mut h = harness("Control", CountingLlm::default());
        h.finish_training([Choice::Option1, Choice::Option1]);
        h.pump().await;
        h.pump().await;

        // second generated page was filled up front, no new generation
        h.session.select(Choice::Option1).unwrap();
        let step = h.session.advance().unwrap();
        assert_eq!(
            step,
            Step::Moved {
                to: 5,
                generation: None
            }
        );

        // refresh on the second page only redoes its rewrite
        let generation = h.session.refresh().unwrap();
        assert!(!generation.profile_call);
        assert_eq!(h.pump().await, Delivered::PagesFilled(vec![5]));
        assert_eq!(h.llm.profile_calls.load(Ordering::SeqCst), 2);
        assert_eq!(h.llm.rewrite_calls.load(Ordering::SeqCst), 3);
        assert!(h.transcript().contains("Control Group - using OPPOSITE"));
    }

    #[tokio::test]
    async fn refresh_on_first_page_rebuilds_profile() {
        let mut h = harness("Experimental", CountingLlm::default());
        h.finish_training([Choice::Option2, Choice::Option2]);
        h.pump().await;
        h.pump().await;

        let generation = h.session.refresh().unwrap();
        assert!(generation.profile_call);
        assert!(h.session.current_page().is_awaiting_content());
        assert_eq!(h.pump().await, Delivered::ProfileStored);
        assert_eq!(h.session.profile().unwrap().actual, "profile 3");
        assert_eq!(h.pump().await, Delivered::PagesFilled(vec![4, 5]));
        assert!(
            h.transcript()
                .contains("Refresh called on GPT interaction number 1.")
        );
    }

    #[tokio::test]
    async fn refresh_while_pending_is_rejected() {
        let mut h = harness("Experimental", CountingLlm::default());
        h.finish_training([Choice::Option1, Choice::Option2]);
        assert!(matches!(
            h.session.refresh(),
            Err(Error::Survey(SurveyError::GenerationPending))
        ));
    }

    #[tokio::test]
    async fn refresh_outside_generated_pages_is_rejected() {
        let mut h = harness("Experimental", CountingLlm::default());
        assert!(matches!(
            h.session.refresh(),
            Err(Error::Survey(SurveyError::NotGenerated { page: 0 }))
        ));
    }

    #[tokio::test]
    async fn stale_results_are_ignored() {
        let mut h = harness("Experimental", CountingLlm::default());
        h.finish_training([Choice::Option1, Choice::Option2]);
        let stale = TaskEvent::RewritesReady {
            generation: 99,
            rewrites: vec![],
        };
        assert_eq!(h.session.deliver(stale).unwrap(), Delivered::Stale);
        assert!(h.session.is_loading());
    }

    #[tokio::test]
    async fn failed_rewrite_leaves_page_waiting_until_refresh() {
        let mut h = harness(
            "Control",
            CountingLlm {
                fail_rewrites: true,
                ..Default::default()
            },
        );
        h.finish_training([Choice::Option1, Choice::Option2]);
        assert_eq!(h.pump().await, Delivered::ProfileStored);
        match h.pump().await {
            Delivered::Failed { phase, message } => {
                assert_eq!(phase, Phase::Rewrite);
                assert!(message.contains("timeout"));
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(!h.session.is_loading());
        assert!(h.session.current_page().is_awaiting_content());
        assert!(h.transcript().contains("Error: rewrite generation failed"));

        // the participant can only wait or refresh
        let generation = h.session.refresh().unwrap();
        assert!(generation.profile_call);
    }

    #[tokio::test]
    async fn selection_required_blocks_and_history_tracks_texts() {
        let mut h = harness("Control", CountingLlm::default());
        h.session.advance().unwrap();
        h.session.advance().unwrap();
        assert!(matches!(
            h.session.advance(),
            Err(Error::Survey(SurveyError::SelectionRequired { page: 2 }))
        ));
        assert_eq!(h.session.state().cursor(), 2);

        h.session.select(Choice::Option2).unwrap();
        h.session.advance().unwrap();
        let history = h.session.state().history();
        assert_eq!(history.selections, vec![Choice::Option2]);
        assert_eq!(history.opposite_selections, vec![Choice::Option1]);
        assert_eq!(history.selected_texts, vec!["B".to_string()]);
        assert_eq!(history.opposite_texts, vec!["A".to_string()]);

        let log = h.transcript();
        assert!(log.lines().next().unwrap().contains("Group: Control"));
        assert!(log.contains("Option Select: 2"));
        assert!(log.contains("Paragraphs Chosen List: [2]"));
        assert!(log.contains("Paragraphs not Chosen List: [1]"));
        assert!(log.contains(r#"Paragraphs Chosen Text: ["B"]"#));
        assert!(log.contains(r#"Paragraphs not Chosen Text: ["A"]"#));
    }

    #[tokio::test]
    async fn closing_page_requires_profile_choice() {
        let mut h = harness("Experimental", CountingLlm::default());
        h.finish_training([Choice::Option1, Choice::Option2]);
        h.pump().await;
        h.pump().await;
        for _ in 0..2 {
            h.session.select(Choice::Option1).unwrap();
            h.session.advance().unwrap();
        }
        assert!(h.session.state().is_terminal());

        let shown = h.session.closing_profiles().unwrap();
        let again = h.session.closing_profiles().unwrap();
        assert_eq!(shown, again);
        let profile = h.session.profile().unwrap();
        if shown.actual_on_left {
            assert_eq!(shown.left, profile.actual);
        } else {
            assert_eq!(shown.right, profile.actual);
        }

        assert!(matches!(
            h.session.submit_closing(None, "because"),
            Err(Error::Survey(SurveyError::SelectionRequired { .. }))
        ));
        assert_eq!(
            h.session.submit_closing(Some(Choice::Option2), "  ").unwrap(),
            Step::Closed
        );
        assert!(h.session.state().is_closed());
        assert!(matches!(
            h.session.advance(),
            Err(Error::Survey(SurveyError::SessionClosed))
        ));

        let log = h.transcript();
        assert!(log.contains("*Profile Selection: 2"));
        assert!(log.contains("Final Response Text: Verbal response."));
        assert!(log.contains("Total Survey Runtime"));
    }

    #[tokio::test]
    async fn closing_submit_rejected_before_closing_page() {
        let mut h = harness("Experimental", CountingLlm::default());
        assert!(matches!(
            h.session.submit_closing(Some(Choice::Option1), "x"),
            Err(Error::Survey(SurveyError::NotClosingPage))
        ));
    }

    #[cfg(target_os = "linux")]
    fn full_disk() -> std::fs::File {
        std::fs::OpenOptions::new()
            .write(true)
            .open("/dev/full")
            .unwrap()
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn transcript_failure_on_rewrites_still_ends_generation() {
        let mut h = harness("Experimental", CountingLlm::default());
        h.finish_training([Choice::Option1, Choice::Option2]);
        assert_eq!(h.pump().await, Delivered::ProfileStored);

        h.session.transcript.redirect(full_disk());
        let event = h.rx.recv().await.unwrap();
        assert!(matches!(
            h.session.deliver(event),
            Err(Error::Transcript(_))
        ));
        assert!(!h.session.is_loading());
        assert!(!h.session.current_page().is_awaiting_content());
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn transcript_failure_on_profile_allows_refresh_again() {
        let mut h = harness("Control", CountingLlm::default());
        h.finish_training([Choice::Option1, Choice::Option2]);

        h.session.transcript.redirect(full_disk());
        let event = h.rx.recv().await.unwrap();
        assert!(h.session.deliver(event).is_err());
        assert!(!h.session.is_loading());

        // with a working transcript the page can be regenerated
        let dir = tempfile::tempdir().unwrap();
        let file = std::fs::File::create(dir.path().join("t.txt")).unwrap();
        h.session.transcript.redirect(file);
        assert!(h.session.refresh().unwrap().profile_call);
    }
}
