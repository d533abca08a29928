//! The session reducer.
//!
//! `SurveySession` owns every piece of participant state. Screens never
//! mutate it directly; they raise a `SessionEvent` and `apply` decides
//! whether the event fits the current screen.

use crate::config::SessionConfig;
use crate::demographics::Demographics;
use crate::error::{CoreError, SessionError};
use crate::guided::{GuidedExercise, GuidedFlow};
use crate::instructions::ScenarioId;
use crate::randomizer::{InstructionOrder, InstructionRandomizer};
use crate::results::{RecordOutcome, UserData};
use crate::screen::{Phase, Screen};
use crate::timing::{TimeLog, TimeLogs, TimingRecorder};
use std::sync::Arc;
use survey_env::{ExportRecord, ExportSink, SurveyContext};
use tracing::{debug, error, info, warn};

/// Completion events raised by the screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Agree,
    SubmitDemographics(Demographics),
    CompleteIntro,
    SubmitUnguided(String),
    /// Leave the current guided step (confirms on the last step)
    AdvanceGuided,
}

impl SessionEvent {
    pub fn name(&self) -> &'static str {
        match self {
            SessionEvent::Agree => "agree",
            SessionEvent::SubmitDemographics(_) => "submit-demographics",
            SessionEvent::CompleteIntro => "complete-intro",
            SessionEvent::SubmitUnguided(_) => "submit-unguided",
            SessionEvent::AdvanceGuided => "advance-guided",
        }
    }
}

/// One participant's pass through the study.
pub struct SurveySession<C: SurveyContext> {
    ctx: Arc<C>,
    sink: Arc<dyn ExportSink>,
    config: SessionConfig,
    randomizer: InstructionRandomizer,
    screen: usize,
    entered: TimingRecorder,
    time_logs: TimeLogs,
    user: UserData,

    /// Unguided prompt held until the scenario's guided phase completes
    pending_prompt: String,

    guided: Option<GuidedExercise>,
    last_export: Option<ExportRecord>,
}

impl<C: SurveyContext> SurveySession<C> {
    /// Randomizes the scenario order and opens the consent screen.
    pub fn new(
        ctx: Arc<C>,
        sink: Arc<dyn ExportSink>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let mut randomizer = InstructionRandomizer::new();
        let scenario_count = randomizer.initialize(ctx.as_ref(), &ScenarioId::all())?.len();
        let entered = TimingRecorder::new(ctx.now());

        info!(
            "Session started (seed {}, sink {})",
            ctx.seed(),
            sink.name()
        );

        Ok(Self {
            ctx,
            sink,
            config,
            randomizer,
            screen: 0,
            entered,
            time_logs: TimeLogs::new(scenario_count),
            user: UserData::new(scenario_count),
            pending_prompt: String::new(),
            guided: None,
            last_export: None,
        })
    }

    pub fn current_screen(&self) -> Screen {
        Screen::resolve(self.screen, self.randomizer.order())
    }

    pub fn screen_index(&self) -> usize {
        self.screen
    }

    pub fn order(&self) -> Option<&InstructionOrder> {
        self.randomizer.order()
    }

    pub fn user_data(&self) -> &UserData {
        &self.user
    }

    pub fn time_logs(&self) -> &TimeLogs {
        &self.time_logs
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The unguided prompt buffered for the current scenario.
    pub fn pending_prompt(&self) -> &str {
        &self.pending_prompt
    }

    pub fn guided(&self) -> Option<&GuidedExercise> {
        self.guided.as_ref()
    }

    /// The running guided exercise, for field edits.
    pub fn guided_mut(&mut self) -> Option<&mut GuidedExercise> {
        self.guided.as_mut()
    }

    /// The record handed to the sink, once the session is complete.
    pub fn last_export(&self) -> Option<&ExportRecord> {
        self.last_export.as_ref()
    }

    pub fn is_complete(&self) -> bool {
        self.current_screen().is_terminal()
    }

    /// Applies one event and returns the screen that is now current.
    pub fn apply(&mut self, event: SessionEvent) -> Result<Screen, SessionError> {
        let screen = self.current_screen();
        match (screen, event) {
            (Screen::Complete, _) => Err(SessionError::Finished),
            (Screen::Loading, _) => Err(SessionError::NotReady),
            (Screen::Consent, SessionEvent::Agree) => {
                self.user.agreed = true;
                Ok(self.advance_screen())
            }
            (Screen::Demographics, SessionEvent::SubmitDemographics(answers)) => {
                if !answers.is_complete() {
                    warn!("Rejected incomplete demographics");
                    return Err(SessionError::IncompleteDemographics);
                }
                self.user.demographics = answers;
                Ok(self.advance_screen())
            }
            (
                Screen::Scenario {
                    scenario_index,
                    phase: Phase::Intro,
                    ..
                },
                SessionEvent::CompleteIntro,
            ) => {
                let secs = self.entered.elapsed_secs(self.ctx.now());
                self.time_log_mut(scenario_index)?.set_instruction(secs);
                debug!("Intro {} took {}s", scenario_index + 1, secs);
                Ok(self.advance_screen())
            }
            (
                Screen::Scenario {
                    scenario_index,
                    phase: Phase::Unguided,
                    ..
                },
                SessionEvent::SubmitUnguided(prompt),
            ) => {
                if prompt.trim().is_empty() {
                    return Err(SessionError::EmptyPrompt);
                }
                let secs = self.entered.elapsed_secs(self.ctx.now());
                self.time_log_mut(scenario_index)?.set_unguided(secs);
                debug!("Unguided {} took {}s", scenario_index + 1, secs);
                self.pending_prompt = prompt;
                Ok(self.advance_screen())
            }
            (
                Screen::Scenario {
                    scenario_index,
                    phase: Phase::Guided,
                    scenario,
                },
                SessionEvent::AdvanceGuided,
            ) => self.advance_guided(scenario_index, scenario),
            (screen, event) => {
                warn!("Ignoring '{}' on screen {}", event.name(), screen);
                Err(SessionError::UnexpectedEvent {
                    screen: screen.to_string(),
                    event: event.name(),
                })
            }
        }
    }

    fn time_log_mut(&mut self, scenario_index: usize) -> Result<&mut TimeLog, CoreError> {
        self.time_logs
            .get_mut(scenario_index)
            .ok_or(CoreError::ScenarioIndexOutOfRange(scenario_index))
    }

    /// Moves to the next screen and stamps its entry time.
    fn advance_screen(&mut self) -> Screen {
        let now = self.ctx.now();
        self.screen += 1;
        self.entered.enter(now);

        let next = self.current_screen();
        if let Screen::Scenario {
            phase: Phase::Guided,
            scenario,
            ..
        } = next
        {
            let kind = self.config.guided_kind_for(scenario);
            debug!("Starting {} exercise for {}", kind, scenario);
            self.guided = Some(kind.start(now));
        }
        info!("Screen {}: {}", self.screen, next);
        next
    }

    fn advance_guided(
        &mut self,
        scenario_index: usize,
        scenario: ScenarioId,
    ) -> Result<Screen, SessionError> {
        let now = self.ctx.now();
        let exercise = self.guided.as_mut().ok_or(SessionError::NotReady)?;

        let Some(payload) = exercise.advance(now)? else {
            debug!(
                "Guided step {}/{}",
                exercise.step_number(),
                exercise.step_count()
            );
            return Ok(self.current_screen());
        };
        self.guided = None;

        let secs = self.entered.elapsed_secs(now);
        let log = self.time_log_mut(scenario_index)?;
        log.set_guided(secs);
        let log = *log;

        let prompt = std::mem::take(&mut self.pending_prompt);
        let outcome = self
            .user
            .record_scenario_result(scenario_index, scenario, prompt, payload, &log)?;

        if outcome == RecordOutcome::AllScenariosComplete {
            self.export();
        }
        Ok(self.advance_screen())
    }

    /// Hands the flattened record to the sink. Sink failures are logged and
    /// never reach the participant.
    fn export(&mut self) {
        let record = ExportRecord::new(
            self.ctx.new_session_id(),
            self.ctx.system_time(),
            self.user.flatten(),
        );
        info!(
            "Exporting session {} ({} fields) via {}",
            record.session_id,
            record.len(),
            self.sink.name()
        );

        let sink = Arc::clone(&self.sink);
        let outgoing = record.clone();
        self.ctx.spawn("export", move || match sink.submit(&outgoing) {
            Ok(()) => info!("Export via {} complete", sink.name()),
            Err(e) => error!("Export via {} failed: {}", sink.name(), e),
        });

        self.last_export = Some(record);
    }
}
