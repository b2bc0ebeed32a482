//! Two-team game state and its transitions
//!
//! A game moves through [`Phase::Home`] (naming the teams),
//! [`Phase::Playing`] (a question is shown), [`Phase::Answered`] (the
//! moderator marked it right or wrong) and [`Phase::Results`]. Each
//! transition checks its precondition first and refuses with an [`Error`]
//! without touching any state.

use std::{collections::BTreeSet, fmt::Debug};

use enum_map::{Enum, EnumMap};
use garde::Validate;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use web_time::Duration;

use crate::{
    constants::{
        labels::TIE,
        team::MAX_NAME_LENGTH,
        timer::{DEFAULT_DURATION, MAX_DURATION, MIN_DURATION},
    },
    question::Question,
};

/// One of the two competing teams
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Enum, Serialize, Deserialize, derive_more::Display,
)]
pub enum Team {
    /// The team that plays first
    #[display("1")]
    One,
    /// The team that plays second
    #[display("2")]
    Two,
}

impl Team {
    /// The team whose turn follows this one
    pub fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    /// 1 or 2, as used in saved sessions
    pub fn number(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    /// Inverse of [`Team::number`]
    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            _ => None,
        }
    }
}

/// Correct and incorrect answer counts of one team
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamScore {
    /// Questions answered correctly
    pub correct: u32,
    /// Questions answered incorrectly
    pub wrong: u32,
}

/// The current phase of the game
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Entering team names
    #[default]
    #[display("home")]
    Home,
    /// A question is displayed and the timer runs
    #[display("playing")]
    Playing,
    /// The current question was resolved, waiting for the moderator
    #[display("answered")]
    Answered,
    /// Final scores
    #[display("results")]
    Results,
}

/// Transitions that can be requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, derive_more::Display)]
pub enum Action {
    /// Rename a team
    #[display("rename a team")]
    SetTeamName,
    /// Replace the question pool
    #[display("replace the questions")]
    SetQuestions,
    /// Begin the game
    #[display("start")]
    Start,
    /// Mark the current question right or wrong
    #[display("answer")]
    Answer,
    /// Move on to the next question
    #[display("advance")]
    Advance,
    /// Pause, resume or restart the countdown
    #[display("toggle the timer")]
    ToggleTimer,
    /// Stop early and show results
    #[display("end the game")]
    EndGame,
    /// Replay with the same teams and questions
    #[display("play again")]
    PlayAgain,
    /// Go back to naming teams
    #[display("start a new game")]
    NewGame,
}

/// Reasons a transition is refused
#[derive(Error, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A team has an empty name
    #[error("team {0} has no name")]
    MissingTeamName(Team),
    /// A team name exceeds the maximum length
    #[error("team {0} name is too long")]
    TeamNameTooLong(Team),
    /// The question pool is empty
    #[error("no questions are loaded")]
    NoQuestions,
    /// The transition is not available in the current phase
    #[error("cannot {action} during {phase}")]
    InvalidTransition {
        /// Phase the game was in
        phase: Phase,
        /// Transition that was requested
        action: Action,
    },
}

/// Validates that a duration falls within the inclusive bounds in seconds
///
/// # Errors
///
/// Returns a `garde::Error` if the duration is outside the bounds.
pub fn validate_duration<const MIN_SECONDS: u64, const MAX_SECONDS: u64>(
    val: &Duration,
    _ctx: &(),
) -> garde::Result {
    if (MIN_SECONDS..=MAX_SECONDS).contains(&val.as_secs()) {
        Ok(())
    } else {
        Err(garde::Error::new(format!(
            "outside of bounds [{MIN_SECONDS},{MAX_SECONDS}]",
        )))
    }
}

/// Runtime options of a game
#[serde_with::serde_as]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Validate)]
pub struct Options {
    /// Countdown length of every question
    #[garde(custom(validate_duration::<MIN_DURATION, MAX_DURATION>))]
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    #[serde(default = "default_timer_duration")]
    pub timer_duration: Duration,
}

fn default_timer_duration() -> Duration {
    Duration::from_secs(DEFAULT_DURATION)
}

impl Default for Options {
    fn default() -> Self {
        Self {
            timer_duration: default_timer_duration(),
        }
    }
}

/// A team's position in the final results
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placing {
    /// The team, `None` on a tie
    pub team: Option<Team>,
    /// Team name, or the tie label on a tie
    pub label: String,
    /// Correct answers
    pub score: u32,
}

/// Final results of a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Higher scoring team (team one on a tie)
    pub winner: Placing,
    /// Lower scoring team (team two on a tie)
    pub loser: Placing,
    /// Questions resolved in this session
    pub total_played: usize,
    /// Questions answered correctly in this session
    pub total_correct: usize,
}

impl Summary {
    /// Whether both teams finished level
    pub fn is_tie(&self) -> bool {
        self.winner.team.is_none()
    }
}

/// Session record kept in the key-value store
///
/// The field names match the browser version so saved sessions carry over.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionRecord {
    team1_name: String,
    team2_name: String,
    team1_score: u32,
    team2_score: u32,
    team1_wrong: u32,
    team2_wrong: u32,
    #[serde(default = "first_team_number")]
    current_team: u8,
    game_started: bool,
    current_question_index: usize,
    total_questions_played: usize,
    total_correct_answers: usize,
    questions: Vec<Question>,
    used_questions: Vec<usize>,
    phase: Option<Phase>,
}

fn first_team_number() -> u8 {
    Team::One.number()
}

/// The single source of truth for a running quiz
#[derive(Clone, Serialize, Deserialize)]
#[serde(into = "SessionRecord", from = "SessionRecord")]
pub struct Game {
    /// Question pool, fixed once the game starts
    questions: Vec<Question>,
    /// Team names
    names: EnumMap<Team, String>,
    /// Per-team correct and wrong counts
    scores: EnumMap<Team, TeamScore>,
    /// Whose turn it is
    current_team: Team,
    /// Indices already drawn this session
    used: BTreeSet<usize>,
    /// Index of the question on screen
    current_question: usize,
    /// Questions resolved this session
    played: usize,
    /// Correct answers this session
    correct: usize,
    /// Current phase
    phase: Phase,
    /// Source of the question draw
    rng: fastrand::Rng,
}

impl Debug for Game {
    /// Custom debug implementation that avoids printing the question pool
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("phase", &self.phase)
            .field("current_team", &self.current_team)
            .field("scores", &self.scores)
            .field("questions", &self.questions.len())
            .finish_non_exhaustive()
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl From<SessionRecord> for Game {
    /// Rebuilds a game from a saved record, falling back to defaults
    ///
    /// A record claiming a question is on screen that its own pool does not
    /// hold comes back in the home phase.
    fn from(record: SessionRecord) -> Self {
        let question_count = record.questions.len();
        let phase = match record.phase.unwrap_or(if record.game_started {
            Phase::Playing
        } else {
            Phase::Home
        }) {
            Phase::Playing | Phase::Answered
                if record.current_question_index >= question_count =>
            {
                tracing::warn!(
                    index = record.current_question_index,
                    question_count,
                    "saved session points past its questions"
                );
                Phase::Home
            }
            phase => phase,
        };

        Self {
            names: EnumMap::from_array([record.team1_name, record.team2_name]),
            scores: EnumMap::from_array([
                TeamScore {
                    correct: record.team1_score,
                    wrong: record.team1_wrong,
                },
                TeamScore {
                    correct: record.team2_score,
                    wrong: record.team2_wrong,
                },
            ]),
            current_team: Team::from_number(record.current_team).unwrap_or(Team::One),
            used: record
                .used_questions
                .into_iter()
                .filter(|index| *index < question_count)
                .collect(),
            current_question: record.current_question_index,
            played: record.total_questions_played,
            correct: record.total_correct_answers,
            phase,
            questions: record.questions,
            rng: fastrand::Rng::new(),
        }
    }
}

impl From<Game> for SessionRecord {
    fn from(game: Game) -> Self {
        let [team1_name, team2_name] = game.names.into_array();
        let [team1, team2] = game.scores.into_array();

        Self {
            team1_name,
            team2_name,
            team1_score: team1.correct,
            team2_score: team2.correct,
            team1_wrong: team1.wrong,
            team2_wrong: team2.wrong,
            current_team: game.current_team.number(),
            game_started: game.phase != Phase::Home,
            current_question_index: game.current_question,
            total_questions_played: game.played,
            total_correct_answers: game.correct,
            questions: game.questions,
            used_questions: game.used.into_iter().collect_vec(),
            phase: Some(game.phase),
        }
    }
}

impl Game {
    /// Creates a game in the home phase with the given question pool
    pub fn new(questions: Vec<Question>) -> Self {
        Self::with_rng(questions, fastrand::Rng::new())
    }

    /// Creates a game drawing questions from `rng`
    ///
    /// Seeding `rng` makes the draw order reproducible.
    pub fn with_rng(questions: Vec<Question>, rng: fastrand::Rng) -> Self {
        Self {
            questions,
            names: EnumMap::default(),
            scores: EnumMap::default(),
            current_team: Team::One,
            used: BTreeSet::new(),
            current_question: 0,
            played: 0,
            correct: 0,
            phase: Phase::Home,
            rng,
        }
    }

    fn require(&self, action: Action, allowed: &[Phase]) -> Result<(), Error> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            tracing::warn!(phase = %self.phase, %action, "transition refused");
            Err(Error::InvalidTransition {
                phase: self.phase,
                action,
            })
        }
    }

    fn set_phase(&mut self, phase: Phase) {
        tracing::debug!(from = %self.phase, to = %phase, "phase change");
        self.phase = phase;
    }

    /// Names a team
    ///
    /// Surrounding whitespace is trimmed. An empty name is accepted here
    /// and only rejected when the game starts.
    ///
    /// # Errors
    ///
    /// * `Error::TeamNameTooLong` - Name exceeds the maximum length
    /// * `Error::InvalidTransition` - The game is past the home phase
    pub fn set_team_name(&mut self, team: Team, name: &str) -> Result<(), Error> {
        self.require(Action::SetTeamName, &[Phase::Home])?;

        let name = rustrict::trim_whitespace(name);
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(Error::TeamNameTooLong(team));
        }
        self.names[team] = name.to_owned();
        Ok(())
    }

    /// Replaces the question pool
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTransition` unless the game is in the home phase.
    pub fn set_questions(&mut self, questions: Vec<Question>) -> Result<(), Error> {
        self.require(Action::SetQuestions, &[Phase::Home])?;
        self.questions = questions;
        Ok(())
    }

    fn check_ready(&self) -> Result<(), Error> {
        if let Some((team, _)) = self.names.iter().find(|(_, name)| name.is_empty()) {
            return Err(Error::MissingTeamName(team));
        }
        if self.questions.is_empty() {
            return Err(Error::NoQuestions);
        }
        Ok(())
    }

    /// Whether [`Game::start`] would succeed
    pub fn can_start(&self) -> bool {
        self.phase == Phase::Home && self.check_ready().is_ok()
    }

    /// Starts the game and draws the first question
    ///
    /// # Errors
    ///
    /// * `Error::MissingTeamName` - A team has no name
    /// * `Error::NoQuestions` - The question pool is empty
    /// * `Error::InvalidTransition` - The game is not in the home phase
    pub fn start(&mut self) -> Result<(), Error> {
        self.require(Action::Start, &[Phase::Home])?;
        self.check_ready()?;

        self.clear_progress();
        self.set_phase(Phase::Playing);
        if self.draw_question().is_none() {
            self.set_phase(Phase::Results);
        }
        Ok(())
    }

    /// Draws a question not yet used this session
    ///
    /// Every remaining question is equally likely. Returns `None` once the
    /// whole pool has been used.
    pub fn draw_question(&mut self) -> Option<usize> {
        if self.used.len() >= self.questions.len() {
            return None;
        }

        let remaining = (0..self.questions.len())
            .filter(|index| !self.used.contains(index))
            .collect_vec();
        let index = self.rng.choice(remaining)?;

        self.used.insert(index);
        self.current_question = index;
        Some(index)
    }

    /// Scores the current question for the team on turn
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTransition` unless a question is being played.
    pub fn answer(&mut self, is_correct: bool) -> Result<(), Error> {
        self.require(Action::Answer, &[Phase::Playing])?;

        let score = &mut self.scores[self.current_team];
        if is_correct {
            score.correct += 1;
            self.correct += 1;
        } else {
            score.wrong += 1;
        }
        self.played += 1;

        self.set_phase(Phase::Answered);
        Ok(())
    }

    /// Passes the turn and draws the next question
    ///
    /// Returns the phase the game ended up in: `Playing`, or `Results` when
    /// the pool is exhausted.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTransition` unless the current question was answered.
    pub fn advance(&mut self) -> Result<Phase, Error> {
        self.require(Action::Advance, &[Phase::Answered])?;

        self.current_team = self.current_team.other();

        if self.played < self.questions.len() && self.draw_question().is_some() {
            self.set_phase(Phase::Playing);
        } else {
            self.set_phase(Phase::Results);
        }
        Ok(self.phase)
    }

    /// Ends the game early
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTransition` unless a question is on screen.
    pub fn end_game(&mut self) -> Result<Summary, Error> {
        self.require(Action::EndGame, &[Phase::Playing, Phase::Answered])?;
        self.set_phase(Phase::Results);
        Ok(self.summary())
    }

    /// Replays with the same teams and question pool
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTransition` unless the results are shown.
    pub fn play_again(&mut self) -> Result<(), Error> {
        self.require(Action::PlayAgain, &[Phase::Results])?;

        let names = std::mem::take(&mut self.names);
        let questions = std::mem::take(&mut self.questions);
        self.reset();
        self.names = names;
        self.questions = questions;

        self.start()
    }

    /// Returns to the home phase, forgetting teams and questions
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidTransition` unless a question is being played
    /// or the results are shown.
    pub fn new_game(&mut self) -> Result<(), Error> {
        self.require(Action::NewGame, &[Phase::Playing, Phase::Results])?;
        self.reset();
        Ok(())
    }

    /// Returns every field to its initial value
    pub fn reset(&mut self) {
        self.questions.clear();
        self.names = EnumMap::default();
        self.clear_progress();
        self.set_phase(Phase::Home);
    }

    fn clear_progress(&mut self) {
        self.scores = EnumMap::default();
        self.current_team = Team::One;
        self.used.clear();
        self.current_question = 0;
        self.played = 0;
        self.correct = 0;
    }

    /// Final standings; equal scores report the tie label on both sides
    pub fn summary(&self) -> Summary {
        let placing = |team: Option<Team>, of: Team| Placing {
            team,
            label: team.map_or_else(|| TIE.to_owned(), |team| self.names[team].clone()),
            score: self.scores[of].correct,
        };

        let (one, two) = (self.scores[Team::One].correct, self.scores[Team::Two].correct);
        let (winner, loser) = match one.cmp(&two) {
            std::cmp::Ordering::Greater => (
                placing(Some(Team::One), Team::One),
                placing(Some(Team::Two), Team::Two),
            ),
            std::cmp::Ordering::Less => (
                placing(Some(Team::Two), Team::Two),
                placing(Some(Team::One), Team::One),
            ),
            std::cmp::Ordering::Equal => (placing(None, Team::One), placing(None, Team::Two)),
        };

        Summary {
            winner,
            loser,
            total_played: self.played,
            total_correct: self.correct,
        }
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether a game is in progress
    pub fn is_started(&self) -> bool {
        matches!(self.phase, Phase::Playing | Phase::Answered)
    }

    /// Team on turn
    pub fn current_team(&self) -> Team {
        self.current_team
    }

    /// Name of `team`
    pub fn team_name(&self, team: Team) -> &str {
        &self.names[team]
    }

    /// Counts of `team`
    pub fn score(&self, team: Team) -> TeamScore {
        self.scores[team]
    }

    /// The question pool
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Index of the question on screen
    pub fn current_question_index(&self) -> usize {
        self.current_question
    }

    /// The question on screen, if any
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current_question)
    }

    /// Indices drawn this session
    pub fn used_questions(&self) -> &BTreeSet<usize> {
        &self.used
    }

    /// Questions resolved this session
    pub fn total_played(&self) -> usize {
        self.played
    }

    /// Correct answers this session
    pub fn total_correct(&self) -> usize {
        self.correct
    }
}
