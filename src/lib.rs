//! # QuickQA Game Library
//!
//! This library provides the core logic of a two-team trivia quiz run by a
//! moderator. It parses free-form question text into a question bank,
//! detects media links, runs the turn-based game state machine with its
//! per-question countdown, and persists sessions so a reload resumes play.
//!
//! Presentation is left to the host: the [`controller::Controller`] hands
//! plain [`view::View`] values to a [`view::Renderer`] after every change.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::similar_names)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::struct_field_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]

pub mod admin;
pub mod constants;
pub mod controller;
pub mod game;
pub mod media;
pub mod parser;
pub mod question;
pub mod storage;
pub mod timer;
pub mod view;

pub use controller::{Controller, IncomingMessage};
pub use game::{Game, Phase, Team};
pub use question::{Question, QuestionBank};
pub use timer::AlarmMessage;

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{
        game::Options,
        storage::MemoryStorage,
        view::{Renderer, View},
    };
    use web_time::UNIX_EPOCH;

    #[derive(Default)]
    struct Screen {
        last: Option<View>,
    }

    impl Renderer for Screen {
        fn render(&mut self, view: &View) {
            self.last = Some(view.clone());
        }
    }

    #[test]
    fn test_editor_to_results() {
        let mut storage = MemoryStorage::default();
        let saved = admin::save(
            "جغرافيا\nما عاصمة فرنسا؟\nباريس\nWhat is this? https://youtu.be/abc123\nA video",
            &mut storage,
            UNIX_EPOCH,
        )
        .unwrap();
        assert_eq!(saved, 2);

        let mut controller = Controller::new(storage, Screen::default(), Options::default());
        let mut alarms = Vec::new();
        let mut schedule = |message: AlarmMessage, _: web_time::Duration| alarms.push(message);

        controller
            .receive_message(IncomingMessage::TeamName(Team::One, "الصقور".into()), &mut schedule)
            .unwrap();
        controller
            .receive_message(IncomingMessage::TeamName(Team::Two, "النسور".into()), &mut schedule)
            .unwrap();

        for message in [
            IncomingMessage::Start,
            IncomingMessage::Answer(true),
            IncomingMessage::Next,
            IncomingMessage::Answer(true),
            IncomingMessage::Next,
        ] {
            controller.receive_message(message, &mut schedule).unwrap();
        }

        let Some(View::Results(summary)) = &controller.renderer().last else {
            panic!("expected results");
        };
        assert!(summary.is_tie());
        assert_eq!(summary.total_played, 2);
        assert_eq!(summary.total_correct, 2);
        assert_eq!(controller.game().phase(), Phase::Results);
        assert_eq!(alarms.len(), 2);
    }
}
