//! Drives a game from moderator input and timer ticks
//!
//! The controller exclusively owns the [`Game`], its [`Timer`], the
//! [`Storage`] the session is persisted to and the [`Renderer`] that shows
//! it. Every accepted transition is persisted (or the session erased once
//! results are reached) and followed by a fresh view.

use garde::Validate;
use serde::Deserialize;
use web_time::Duration;

use crate::{
    game::{Action, Error, Game, Options, Phase, Team},
    storage::{self, Storage},
    timer::{AlarmMessage, Tick, Timer},
    view::{self, AudienceView, Renderer, View},
};

/// Input from the moderator screen
#[derive(Debug, Deserialize, Clone)]
pub enum IncomingMessage {
    /// A team name field changed
    TeamName(Team, String),
    /// Start button
    Start,
    /// Correct (`true`) or incorrect (`false`) button
    Answer(bool),
    /// Next question button
    Next,
    /// Pause/resume button
    ToggleTimer,
    /// End game button
    EndGame,
    /// Play again button
    PlayAgain,
    /// New game button
    NewGame,
}

/// Owner of all mutable quiz state
pub struct Controller<S: Storage, R: Renderer> {
    game: Game,
    timer: Timer,
    storage: S,
    renderer: R,
}

impl<S: Storage, R: Renderer> Controller<S, R> {
    /// Creates a controller and shows its first view
    ///
    /// A started session found in `storage` is resumed with its timer
    /// stopped; otherwise a new game is prepared from the saved question bank.
    ///
    /// # Arguments
    ///
    /// * `storage` - Where the question bank is read and the session is kept
    /// * `renderer` - Receives every view, starting with the first one
    /// * `options` - Runtime options, replaced by the defaults if invalid
    pub fn new(storage: S, renderer: R, options: Options) -> Self {
        Self::with_game(storage, renderer, options, Game::new(Vec::new()))
    }

    /// Like [`Controller::new`], with `fresh` used when nothing is resumed
    ///
    /// A saved session wins over `fresh` when it was started and still
    /// points at a question of its own pool. When `fresh` is used and has
    /// no questions, the saved question bank is loaded into it.
    ///
    /// `fresh` keeps its random source, so seeding it makes draws
    /// reproducible in tests and replays.
    ///
    /// # Arguments
    ///
    /// * `storage` - Where the question bank is read and the session is kept
    /// * `renderer` - Receives every view, starting with the first one
    /// * `options` - Runtime options, replaced by the defaults if invalid
    /// * `fresh` - The game to use when no session is resumed
    pub fn with_game(storage: S, renderer: R, options: Options, fresh: Game) -> Self {
        let options = match options.validate() {
            Ok(()) => options,
            Err(report) => {
                tracing::warn!(%report, "invalid options, using defaults");
                Options::default()
            }
        };

        let game = match storage::load_session(&storage).filter(Game::is_started) {
            Some(game) => {
                tracing::info!(phase = %game.phase(), "resuming saved session");
                game
            }
            None => {
                let mut game = fresh;
                if game.questions().is_empty() {
                    load_bank_into(&storage, &mut game);
                }
                game
            }
        };

        let mut controller = Self {
            game,
            timer: Timer::new(options.timer_duration),
            storage,
            renderer,
        };
        controller.refresh();
        controller
    }

    fn refresh(&mut self) {
        let view = view::moderator(&self.game, &self.timer);
        self.renderer.render(&view);
    }

    fn persist(&mut self) {
        if let Err(error) = storage::save_session(&mut self.storage, &self.game) {
            tracing::error!(%error, "failed to save session");
        }
    }

    fn finish(&mut self) {
        self.timer.stop();
        storage::clear_session(&mut self.storage);
        self.refresh();
    }

    fn begin_question<F: FnMut(AlarmMessage, Duration)>(&mut self, schedule_message: F) {
        self.persist();
        self.timer.start(schedule_message);
        self.refresh();
    }

    /// Updates a team name on the home screen
    ///
    /// # Errors
    ///
    /// See [`Game::set_team_name`].
    pub fn set_team_name(&mut self, team: Team, name: &str) -> Result<(), Error> {
        self.game.set_team_name(team, name)?;
        self.refresh();
        Ok(())
    }

    /// Starts the game and its first countdown
    ///
    /// # Errors
    ///
    /// See [`Game::start`]; the UI layer should explain a refusal.
    pub fn start<F: FnMut(AlarmMessage, Duration)>(
        &mut self,
        schedule_message: F,
    ) -> Result<(), Error> {
        self.game.start()?;
        self.begin_question(schedule_message);
        Ok(())
    }

    /// Restarts the countdown of a resumed question
    ///
    /// Does nothing unless a question is on screen without a running timer.
    pub fn resume<F: FnMut(AlarmMessage, Duration)>(&mut self, schedule_message: F) {
        if self.game.phase() == Phase::Playing && !self.timer.is_running() {
            self.timer.start(schedule_message);
            self.refresh();
        }
    }

    /// Scores the question on screen
    ///
    /// # Errors
    ///
    /// See [`Game::answer`].
    pub fn answer(&mut self, is_correct: bool) -> Result<(), Error> {
        self.game.answer(is_correct)?;
        self.timer.stop();
        self.persist();
        self.refresh();
        Ok(())
    }

    /// Passes the turn and shows the next question, or the results
    ///
    /// # Errors
    ///
    /// See [`Game::advance`].
    pub fn next<F: FnMut(AlarmMessage, Duration)>(
        &mut self,
        schedule_message: F,
    ) -> Result<(), Error> {
        match self.game.advance()? {
            Phase::Playing => self.begin_question(schedule_message),
            _ => self.finish(),
        }
        Ok(())
    }

    /// Pauses, resumes, or restarts an expired countdown
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTransition` unless a question is being played.
    pub fn toggle_timer<F: FnMut(AlarmMessage, Duration)>(
        &mut self,
        schedule_message: F,
    ) -> Result<(), Error> {
        if self.game.phase() != Phase::Playing {
            return Err(Error::InvalidTransition {
                phase: self.game.phase(),
                action: Action::ToggleTimer,
            });
        }

        self.timer.toggle(schedule_message);
        self.refresh();
        Ok(())
    }

    /// Ends the game early and shows the results
    ///
    /// # Errors
    ///
    /// See [`Game::end_game`].
    pub fn end_game(&mut self) -> Result<(), Error> {
        self.game.end_game()?;
        self.finish();
        Ok(())
    }

    /// Replays with the same teams and questions
    ///
    /// # Errors
    ///
    /// See [`Game::play_again`].
    pub fn play_again<F: FnMut(AlarmMessage, Duration)>(
        &mut self,
        schedule_message: F,
    ) -> Result<(), Error> {
        self.game.play_again()?;
        self.begin_question(schedule_message);
        Ok(())
    }

    /// Returns to the home screen with the saved question bank reloaded
    ///
    /// # Errors
    ///
    /// See [`Game::new_game`].
    pub fn new_game(&mut self) -> Result<(), Error> {
        self.game.new_game()?;
        self.timer.reset();
        storage::clear_session(&mut self.storage);
        load_bank_into(&self.storage, &mut self.game);
        self.refresh();
        Ok(())
    }

    /// Handles a timer tick scheduled earlier
    pub fn receive_alarm<F: FnMut(AlarmMessage, Duration)>(
        &mut self,
        message: AlarmMessage,
        schedule_message: F,
    ) {
        match self.timer.receive_alarm(message, schedule_message) {
            Tick::Counted | Tick::Expired => self.refresh(),
            Tick::Paused | Tick::Stale => {}
        }
    }

    /// Dispatches moderator input to the matching transition
    ///
    /// # Errors
    ///
    /// Returns the error of the refused transition.
    pub fn receive_message<F: FnMut(AlarmMessage, Duration)>(
        &mut self,
        message: IncomingMessage,
        schedule_message: F,
    ) -> Result<(), Error> {
        match message {
            IncomingMessage::TeamName(team, name) => self.set_team_name(team, &name),
            IncomingMessage::Start => self.start(schedule_message),
            IncomingMessage::Answer(is_correct) => self.answer(is_correct),
            IncomingMessage::Next => self.next(schedule_message),
            IncomingMessage::ToggleTimer => self.toggle_timer(schedule_message),
            IncomingMessage::EndGame => self.end_game(),
            IncomingMessage::PlayAgain => self.play_again(schedule_message),
            IncomingMessage::NewGame => self.new_game(),
        }
    }

    /// The moderator view of the current state
    pub fn view(&self) -> View {
        view::moderator(&self.game, &self.timer)
    }

    /// The audience view of the current state
    pub fn audience_view(&self) -> AudienceView {
        view::audience(&self.game, &self.timer)
    }

    /// The game being driven
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// The countdown of the current question
    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    /// The backing store
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The renderer
    pub fn renderer(&self) -> &R {
        &self.renderer
    }
}

fn load_bank_into<S: Storage + ?Sized>(storage: &S, game: &mut Game) {
    if let Some(bank) = storage::load_bank(storage) {
        if let Err(error) = game.set_questions(bank.questions) {
            tracing::warn!(%error, "question bank not loaded");
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{
        admin,
        constants::storage::SESSION_KEY,
        storage::MemoryStorage,
    };
    use web_time::UNIX_EPOCH;

    #[derive(Default)]
    struct Recorder {
        views: Vec<View>,
    }

    impl Renderer for Recorder {
        fn render(&mut self, view: &View) {
            self.views.push(view.clone());
        }
    }

    impl Recorder {
        fn last(&self) -> &View {
            self.views.last().expect("at least one view was rendered")
        }
    }

    const BANK: &str = "Science\nWhat is H2O?\nWater\nHistory\nWho built it?\nThem\n";

    fn create_storage() -> MemoryStorage {
        let mut storage = MemoryStorage::default();
        admin::save(BANK, &mut storage, UNIX_EPOCH).unwrap();
        storage
    }

    fn create_controller() -> Controller<MemoryStorage, Recorder> {
        Controller::new(create_storage(), Recorder::default(), Options::default())
    }

    fn create_started_controller(pending: &mut Vec<AlarmMessage>) -> Controller<MemoryStorage, Recorder> {
        let mut controller = create_controller();
        controller.set_team_name(Team::One, "Red").unwrap();
        controller.set_team_name(Team::Two, "Blue").unwrap();
        controller.start(|message, _| pending.push(message)).unwrap();
        controller
    }

    #[test]
    fn test_new_loads_bank() {
        let controller = create_controller();
        assert_eq!(controller.game().questions().len(), 2);
        assert_eq!(
            controller.renderer().last(),
            &View::Home {
                can_start: false,
                question_count: 2,
            }
        );
    }

    #[test]
    fn test_start_refused_without_names() {
        let mut controller = create_controller();
        let mut pending = Vec::new();

        assert_eq!(
            controller.start(|message, _| pending.push(message)),
            Err(Error::MissingTeamName(Team::One))
        );
        assert!(pending.is_empty());
        assert!(controller.storage().get(SESSION_KEY).is_none());
    }

    #[test]
    fn test_start_runs_timer_and_persists() {
        let mut pending = Vec::new();
        let controller = create_started_controller(&mut pending);

        assert_eq!(pending.len(), 1);
        assert!(controller.timer().is_running());
        assert!(controller.storage().get(SESSION_KEY).is_some());
        assert!(matches!(controller.renderer().last(), View::Question(_)));
    }

    #[test]
    fn test_ticks_rerender() {
        let mut pending = Vec::new();
        let mut controller = create_started_controller(&mut pending);
        let rendered = controller.renderer().views.len();

        for _ in 0..3 {
            let message = pending.remove(0);
            controller.receive_alarm(message, |next, _| pending.push(next));
        }

        assert_eq!(controller.renderer().views.len(), rendered + 3);
        let View::Question(view) = controller.renderer().last() else {
            panic!("expected question view");
        };
        assert_eq!(view.timer, "00:57");
    }

    #[test]
    fn test_toggle_timer() {
        let mut pending = Vec::new();
        let mut controller = create_started_controller(&mut pending);

        controller.toggle_timer(|_, _| {}).unwrap();
        assert!(controller.timer().is_paused());

        let message = pending.remove(0);
        controller.receive_alarm(message, |next, _| pending.push(next));
        assert_eq!(controller.timer().time_remaining(), 60);

        controller.toggle_timer(|_, _| {}).unwrap();
        assert!(!controller.timer().is_paused());
    }

    #[test]
    fn test_answer_stops_timer() {
        let mut pending = Vec::new();
        let mut controller = create_started_controller(&mut pending);

        controller.answer(true).unwrap();
        assert!(!controller.timer().is_running());
        assert!(matches!(controller.renderer().last(), View::Answer(_)));

        let message = pending.remove(0);
        let rendered = controller.renderer().views.len();
        controller.receive_alarm(message, |next, _| pending.push(next));
        assert_eq!(controller.renderer().views.len(), rendered);
        assert!(pending.is_empty());

        assert!(controller.toggle_timer(|_, _| {}).is_err());
    }

    #[test]
    fn test_full_game_reaches_results_and_clears_session() {
        let mut pending = Vec::new();
        let mut controller = create_started_controller(&mut pending);

        controller.answer(true).unwrap();
        controller.next(|message, _| pending.push(message)).unwrap();
        assert_eq!(controller.game().current_team(), Team::Two);
        controller.answer(false).unwrap();
        controller.next(|message, _| pending.push(message)).unwrap();

        assert_eq!(controller.game().phase(), Phase::Results);
        assert!(controller.storage().get(SESSION_KEY).is_none());
        let View::Results(summary) = controller.renderer().last() else {
            panic!("expected results view");
        };
        assert_eq!(summary.winner.label, "Red");
        assert_eq!(summary.winner.score, 1);
    }

    #[test]
    fn test_play_again_and_new_game() {
        let mut pending = Vec::new();
        let mut controller = create_started_controller(&mut pending);
        controller.end_game().unwrap();

        controller
            .receive_message(IncomingMessage::PlayAgain, |message, _| pending.push(message))
            .unwrap();
        assert_eq!(controller.game().phase(), Phase::Playing);
        assert_eq!(controller.game().team_name(Team::Two), "Blue");

        controller
            .receive_message(IncomingMessage::NewGame, |_, _| {})
            .unwrap();
        assert_eq!(controller.game().phase(), Phase::Home);
        assert_eq!(controller.game().team_name(Team::One), "");
        assert_eq!(controller.game().questions().len(), 2);
        assert!(!controller.timer().is_running());
        assert!(controller.storage().get(SESSION_KEY).is_none());
    }

    #[test]
    fn test_resume_saved_session() {
        let mut pending = Vec::new();
        let mut controller = create_started_controller(&mut pending);
        controller.answer(true).unwrap();
        let storage = controller.storage().clone();

        let mut resumed = Controller::new(storage, Recorder::default(), Options::default());
        assert_eq!(resumed.game().phase(), Phase::Answered);
        assert_eq!(resumed.game().score(Team::One).correct, 1);
        assert!(matches!(resumed.renderer().last(), View::Answer(_)));

        resumed.resume(|message, _| pending.push(message));
        assert!(!resumed.timer().is_running());

        resumed.next(|message, _| pending.push(message)).unwrap();
        assert_eq!(resumed.game().phase(), Phase::Playing);
        assert!(resumed.timer().is_running());
    }

    #[test]
    fn test_resume_restarts_question_timer() {
        let mut pending = Vec::new();
        let controller = create_started_controller(&mut pending);
        let storage = controller.storage().clone();

        let mut resumed = Controller::new(storage, Recorder::default(), Options::default());
        assert!(!resumed.timer().is_running());
        resumed.resume(|message, _| pending.push(message));
        assert!(resumed.timer().is_running());
    }

    #[test]
    fn test_corrupt_session_starts_fresh() {
        let mut storage = create_storage();
        storage.set(SESSION_KEY, "garbage".to_string());

        let controller = Controller::new(storage, Recorder::default(), Options::default());
        assert_eq!(controller.game().phase(), Phase::Home);
        assert_eq!(controller.game().questions().len(), 2);
    }

    #[test]
    fn test_invalid_options_fall_back_to_default() {
        let options = Options {
            timer_duration: Duration::ZERO,
        };
        let mut controller = Controller::new(create_storage(), Recorder::default(), options);
        controller.set_team_name(Team::One, "Red").unwrap();
        controller.set_team_name(Team::Two, "Blue").unwrap();

        let mut pending = Vec::new();
        controller.start(|message, _| pending.push(message)).unwrap();
        assert_eq!(controller.timer().time_remaining(), 60);

        let message = pending.remove(0);
        controller.receive_alarm(message, |next, _| pending.push(next));
        assert!(controller.timer().is_running());
        assert_eq!(controller.timer().time_remaining(), 59);
    }

    #[test]
    fn test_valid_options_are_kept() {
        let options = Options {
            timer_duration: Duration::from_secs(30),
        };
        let mut controller = Controller::new(create_storage(), Recorder::default(), options);
        controller.set_team_name(Team::One, "Red").unwrap();
        controller.set_team_name(Team::Two, "Blue").unwrap();
        controller.start(|_, _| {}).unwrap();
        assert_eq!(controller.timer().time_remaining(), 30);
    }

    #[test]
    fn test_session_pointing_past_pool_is_not_resumed() {
        let mut storage = create_storage();
        storage.set(
            SESSION_KEY,
            r#"{"team1Name":"Red","team2Name":"Blue","gameStarted":true,"phase":"playing","currentQuestionIndex":5,"questions":[{"category":"","text":"Q?","answer":"A","media":null}]}"#
                .to_string(),
        );

        let controller = Controller::new(storage, Recorder::default(), Options::default());
        assert_eq!(controller.game().phase(), Phase::Home);
        assert_eq!(controller.game().questions().len(), 2);
        assert_eq!(
            controller.renderer().last(),
            &View::Home {
                can_start: false,
                question_count: 2,
            }
        );
    }

    #[test]
    fn test_started_session_without_questions_is_not_resumed() {
        let mut storage = create_storage();
        storage.set(
            SESSION_KEY,
            r#"{"team1Name":"Red","team2Name":"Blue","gameStarted":true,"questions":[]}"#.to_string(),
        );

        let controller = Controller::new(storage, Recorder::default(), Options::default());
        assert_eq!(controller.game().phase(), Phase::Home);
        assert_eq!(controller.game().questions().len(), 2);
    }

    #[test]
    fn test_audience_view() {
        let mut pending = Vec::new();
        let controller = create_started_controller(&mut pending);
        let view = controller.audience_view();
        assert_eq!(view.timer, "01:00");
        assert_eq!(view.total, 2);
    }
}
