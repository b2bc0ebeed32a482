//! Screen descriptions handed to the UI layer
//!
//! Views are plain data computed from the game and the timer; the UI layer
//! decides how to draw them. A [`Renderer`] receives a fresh view after every
//! change, including each counted timer tick.

use enum_map::Enum;
use serde::Serialize;
use serde_with::skip_serializing_none;

use crate::{
    constants::labels::TURN_PREFIX,
    game::{Game, Phase, Summary, Team},
    media::Embed,
    timer::Timer,
};

/// Receives every view the controller produces
pub trait Renderer {
    /// Draws `view`, replacing whatever was shown before
    fn render(&mut self, view: &View);
}

/// One row of the scoreboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamLine {
    /// Which team this row describes
    pub team: Team,
    /// Team name
    pub name: String,
    /// Correct answers
    pub correct: u32,
    /// Wrong answers
    pub wrong: u32,
    /// Whether it is this team's turn
    pub active: bool,
}

/// Both teams' standings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Scoreboard {
    /// Rows in team order
    pub teams: Vec<TeamLine>,
}

/// The moderator's question screen
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    /// "Whose turn" banner
    pub turn: String,
    /// Category label
    pub category: String,
    /// Question text without media URL
    pub text: String,
    /// Attached media
    pub media: Option<Embed>,
    /// 1-based number of this question in the session
    pub number: usize,
    /// Size of the question pool
    pub total: usize,
    /// Remaining time as `MM:SS`
    pub timer: String,
    /// Whether the countdown is paused
    pub paused: bool,
    /// Standings
    pub scoreboard: Scoreboard,
}

/// The screen revealing the answer
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnswerView {
    /// Category label
    pub category: String,
    /// Question text without media URL
    pub question: String,
    /// Answer text without media URL
    pub answer: String,
    /// Attached media
    pub media: Option<Embed>,
    /// Standings
    pub scoreboard: Scoreboard,
}

/// The audience screen: scores and timer, never the question
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudienceView {
    /// "Whose turn" banner
    pub turn: String,
    /// 1-based number of the current question
    pub number: usize,
    /// Size of the question pool
    pub total: usize,
    /// Remaining time as `MM:SS`
    pub timer: String,
    /// Standings
    pub scoreboard: Scoreboard,
}

/// Everything the moderator screen can show
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum View {
    /// Team naming
    Home {
        /// Whether the start button should be enabled
        can_start: bool,
        /// Size of the loaded question pool
        question_count: usize,
    },
    /// A question in play
    Question(QuestionView),
    /// The answer to the question just played
    Answer(AnswerView),
    /// Final standings
    Results(Summary),
}

fn turn_label(game: &Game) -> String {
    format!("{TURN_PREFIX} {}", game.team_name(game.current_team()))
}

/// Standings of both teams
pub fn scoreboard(game: &Game) -> Scoreboard {
    Scoreboard {
        teams: (0..Team::LENGTH)
            .map(Team::from_usize)
            .map(|team| {
                let score = game.score(team);
                TeamLine {
                    team,
                    name: game.team_name(team).to_owned(),
                    correct: score.correct,
                    wrong: score.wrong,
                    active: team == game.current_team(),
                }
            })
            .collect(),
    }
}

/// The moderator view for the current state
pub fn moderator(game: &Game, timer: &Timer) -> View {
    match (game.phase(), game.current_question()) {
        (Phase::Playing, Some(question)) => View::Question(QuestionView {
            turn: turn_label(game),
            category: question.category.clone(),
            text: question.display_text(),
            media: question.media.as_ref().map(crate::media::Media::embed),
            number: game.total_played() + 1,
            total: game.questions().len(),
            timer: timer.formatted(),
            paused: timer.is_paused(),
            scoreboard: scoreboard(game),
        }),
        (Phase::Answered, Some(question)) => View::Answer(AnswerView {
            category: question.category.clone(),
            question: question.display_text(),
            answer: question.display_answer(),
            media: question.media.as_ref().map(crate::media::Media::embed),
            scoreboard: scoreboard(game),
        }),
        (Phase::Results, _) => View::Results(game.summary()),
        _ => View::Home {
            can_start: game.can_start(),
            question_count: game.questions().len(),
        },
    }
}

/// The audience view for the current state
pub fn audience(game: &Game, timer: &Timer) -> AudienceView {
    AudienceView {
        turn: turn_label(game),
        number: game.total_played() + 1,
        total: game.questions().len(),
        timer: timer.formatted(),
        scoreboard: scoreboard(game),
    }
}
