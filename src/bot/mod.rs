//! Chat front end, independent of the transport. Every entry point returns
//! the replies to send into the actor's chat.

pub mod actions;
pub mod reply;
pub mod views;

use std::sync::Arc;

use tracing::{debug, info};

use crate::quiz::difficulty::DifficultyPreference;
use crate::quiz::{ChatRef, Draw, Profile, QuizEngine, TopOrder, TOP_SIZE};
use crate::session::{Sessions, TimerEvent};
use crate::store::types::UserId;

pub use actions::Action;
pub use reply::{Button, Reply};

/// The user acting and the chat they act in.
#[derive(Debug, Clone)]
pub struct Actor {
    pub profile: Profile,
    pub chat: ChatRef,
}

impl Actor {
    pub fn user_id(&self) -> UserId {
        self.profile.id
    }
}

/// Replies produced by a timer, addressed to the chat the question was
/// asked in.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub chat: ChatRef,
    pub replies: Vec<Reply>,
}

pub struct Bot {
    quiz: Arc<QuizEngine>,
    sessions: Sessions,
}

impl Bot {
    pub fn new(quiz: Arc<QuizEngine>, sessions: Sessions) -> Self {
        Self { quiz, sessions }
    }

    pub fn quiz(&self) -> &Arc<QuizEngine> {
        &self.quiz
    }

    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    pub async fn start(&self, actor: &Actor) -> Vec<Reply> {
        let user = self.quiz.register(&actor.profile, &actor.chat).await;
        vec![views::welcome(&user.first_name, self.quiz.daily_limit())]
    }

    pub async fn help(&self) -> Vec<Reply> {
        vec![views::help(self.quiz.daily_limit())]
    }

    /// Draw a question for the actor and start its timer. Any open question
    /// is dropped without scoring.
    pub async fn ask_question(&self, actor: &Actor) -> Vec<Reply> {
        let user_id = actor.user_id();
        self.quiz.register(&actor.profile, &actor.chat).await;
        self.sessions.take(user_id).await;

        match self.quiz.next_question(user_id).await {
            Draw::Question(question) => {
                self.sessions
                    .begin(user_id, question.uid, actor.chat.clone())
                    .await;
                let limit = self.sessions.timing().time_limit.as_secs();
                vec![views::question_prompt(&question, limit)]
            }
            Draw::LimitReached => vec![views::limit_reached(self.quiz.daily_limit())],
            Draw::NoData => vec![views::no_data()],
        }
    }

    pub async fn stats(&self, actor: &Actor) -> Vec<Reply> {
        match self.quiz.stats(actor.user_id()).await {
            Some(stats) => vec![views::stats(&stats)],
            None => vec![views::not_registered()],
        }
    }

    pub async fn top(&self, order: TopOrder) -> Vec<Reply> {
        let rows = self.quiz.top_players(TOP_SIZE, order).await;
        vec![views::top(&rows, order)]
    }

    pub async fn achievements(&self, actor: &Actor) -> Vec<Reply> {
        let earned = self.quiz.achievements(actor.user_id()).await;
        vec![views::achievements(&earned)]
    }

    pub async fn group_stats(&self, actor: &Actor) -> Vec<Reply> {
        if !actor.chat.is_group {
            return vec![views::group_only()];
        }
        let report = self.quiz.group_stats(actor.chat.id, TOP_SIZE).await;
        vec![views::group_stats(report.as_ref())]
    }

    pub async fn difficulty_menu(&self, actor: &Actor) -> Vec<Reply> {
        self.quiz.register(&actor.profile, &actor.chat).await;
        let current = self.quiz.difficulty_of(actor.user_id()).await;
        vec![views::difficulty_menu(current)]
    }

    pub async fn set_difficulty(&self, actor: &Actor, pref: DifficultyPreference) -> Vec<Reply> {
        self.quiz.register(&actor.profile, &actor.chat).await;
        self.quiz.set_difficulty(actor.user_id(), pref).await;
        vec![views::difficulty_changed(pref)]
    }

    /// Handle a button press.
    pub async fn handle(&self, actor: &Actor, action: Action) -> Vec<Reply> {
        let user_id = actor.user_id();
        debug!(user_id, action = %action.custom_id(), "Button pressed");
        match action {
            Action::NewQuestion | Action::SkipQuestion => self.ask_question(actor).await,
            Action::MyStats => self.stats(actor).await,
            Action::TopPlayers => self.top(TopOrder::Rating).await,
            Action::MyAchievements => self.achievements(actor).await,
            Action::Help => self.help().await,
            Action::ShowHint => self.hint(user_id).await,
            Action::ShowParagraphs => self.show_paragraphs(user_id).await,
            Action::NextParagraph => self.turn_page(user_id, 1).await,
            Action::PrevParagraph => self.turn_page(user_id, -1).await,
            Action::DifficultyMenu => self.difficulty_menu(actor).await,
            Action::SetDifficulty(pref) => {
                if self.quiz.set_difficulty(user_id, pref).await {
                    vec![views::difficulty_changed(pref)]
                } else {
                    vec![views::not_registered()]
                }
            }
            Action::MainMenu => {
                self.sessions.clear(user_id).await;
                let user = self.quiz.register(&actor.profile, &actor.chat).await;
                vec![views::welcome(&user.first_name, self.quiz.daily_limit())]
            }
        }
    }

    /// Handle a plain message. With an open question it is the answer;
    /// otherwise a mention in a group asks for a question.
    pub async fn on_text(&self, actor: &Actor, text: &str, mentions_bot: bool) -> Vec<Reply> {
        let user_id = actor.user_id();
        if text.starts_with('/') {
            return Vec::new();
        }

        if actor.chat.is_group && mentions_bot {
            return self.ask_question(actor).await;
        }

        let Some(active) = self.sessions.current(user_id).await else {
            return if actor.chat.is_group {
                Vec::new()
            } else {
                vec![views::private_nudge()]
            };
        };
        if active.chat.id != actor.chat.id {
            return Vec::new();
        }

        self.quiz.register(&actor.profile, &actor.chat).await;
        if !self.quiz.can_answer_more(user_id).await {
            self.sessions.take(user_id).await;
            return vec![views::limit_reached(self.quiz.daily_limit())];
        }

        let Some(active) = self.sessions.take(user_id).await else {
            return Vec::new();
        };
        let Some(report) = self
            .quiz
            .submit_answer(user_id, &active.chat, active.question_uid, text)
            .await
        else {
            return vec![views::no_data()];
        };

        self.sessions
            .remember_answered(user_id, active.question_uid)
            .await;
        vec![views::answer_report(
            &report,
            self.has_paragraphs(active.question_uid),
        )]
    }

    /// Handle a timer event. `None` when the event is stale.
    pub async fn on_timer(&self, event: TimerEvent) -> Option<Delivery> {
        match event {
            TimerEvent::Warning {
                user_id,
                generation,
            } => {
                if !self.sessions.is_current(user_id, generation).await {
                    return None;
                }
                let active = self.sessions.current(user_id).await?;
                let seconds_left = self.sessions.timing().seconds_left_at_warning();
                Some(Delivery {
                    chat: active.chat,
                    replies: vec![views::time_warning(seconds_left)],
                })
            }
            TimerEvent::Expired {
                user_id,
                generation,
            } => {
                let active = self.sessions.take_expired(user_id, generation).await?;
                let report = self
                    .quiz
                    .record_timeout(user_id, &active.chat, active.question_uid)
                    .await?;
                self.sessions
                    .remember_answered(user_id, active.question_uid)
                    .await;
                info!(user_id, question_uid = active.question_uid, "Timeout delivered");
                Some(Delivery {
                    replies: vec![views::timeout_report(
                        &report,
                        self.has_paragraphs(active.question_uid),
                    )],
                    chat: active.chat,
                })
            }
        }
    }

    fn has_paragraphs(&self, question_uid: u64) -> bool {
        self.quiz
            .dataset()
            .get(question_uid)
            .is_some_and(|q| q.has_answer_paragraphs())
    }

    async fn hint(&self, user_id: UserId) -> Vec<Reply> {
        let Some(active) = self.sessions.current(user_id).await else {
            return vec![views::no_active_question()];
        };
        let dataset = self.quiz.dataset();
        match dataset.get(active.question_uid).and_then(|q| dataset.hint(q)) {
            Some(text) => vec![views::hint(&text)],
            None => vec![views::hint_unavailable()],
        }
    }

    async fn show_paragraphs(&self, user_id: UserId) -> Vec<Reply> {
        let Some(pager) = self.sessions.reset_page(user_id).await else {
            return vec![views::question_info_unavailable()];
        };
        self.render_page(pager.question_uid, pager.index)
    }

    async fn turn_page(&self, user_id: UserId, step: isize) -> Vec<Reply> {
        let Some(pager) = self.sessions.pager(user_id).await else {
            return vec![views::question_info_unavailable()];
        };
        let total = self
            .quiz
            .dataset()
            .get(pager.question_uid)
            .map_or(0, |q| q.paragraphs_uids.with_answer.len());
        if total == 0 {
            return vec![views::no_paragraphs()];
        }
        match self.sessions.turn_page(user_id, step, total).await {
            Some(pager) => self.render_page(pager.question_uid, pager.index),
            None if step > 0 => vec![views::last_paragraph()],
            None => vec![views::first_paragraph()],
        }
    }

    fn render_page(&self, question_uid: u64, index: usize) -> Vec<Reply> {
        let dataset = self.quiz.dataset();
        let Some(question) = dataset.get(question_uid) else {
            return vec![views::question_info_unavailable()];
        };
        let uids = &question.paragraphs_uids.with_answer;
        if uids.is_empty() {
            return vec![views::no_paragraphs()];
        }
        match uids.get(index).and_then(|uid| dataset.paragraph(*uid)) {
            Some(paragraph) => vec![views::paragraph_page(&paragraph.text, index, uids.len())],
            None => vec![views::paragraph_missing()],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::types::{
        Answer, AnswerKind, LocalizedNames, Paragraph, ParagraphRefs, Question,
    };
    use crate::dataset::Dataset;
    use crate::quiz::DEFAULT_DAILY_LIMIT;
    use crate::session::Timing;
    use crate::store::QuizStore;
    use tokio::sync::mpsc::UnboundedReceiver;

    fn question(uid: u64, answer: &str, with_answer: Vec<u64>) -> Question {
        Question {
            uid,
            question_text: format!("Question {}?", uid),
            question_eng: None,
            answer_text: Some(answer.to_string()),
            answers: vec![Answer {
                kind: AnswerKind::Uri,
                label: Some(answer.to_string()),
                value: None,
                wd_names: LocalizedNames::default(),
                wp_names: vec![],
            }],
            tags: vec!["1-hop".into()],
            paragraphs_uids: ParagraphRefs {
                all_related: with_answer.clone(),
                with_answer,
            },
        }
    }

    fn bot() -> (Bot, UnboundedReceiver<TimerEvent>) {
        let dataset = Dataset::new(
            vec![question(1, "Moscow", vec![10, 11])],
            vec![
                Paragraph {
                    uid: 10,
                    text: "Moscow is the capital of Russia.".into(),
                },
                Paragraph {
                    uid: 11,
                    text: "It stands on the Moskva river.".into(),
                },
            ],
        );
        let quiz = Arc::new(QuizEngine::new(
            Arc::new(dataset),
            QuizStore::in_memory(),
            DEFAULT_DAILY_LIMIT,
        ));
        let (sessions, rx) = Sessions::new(Timing::default());
        (Bot::new(quiz, sessions), rx)
    }

    fn private(id: u64) -> Actor {
        Actor {
            profile: Profile {
                id,
                first_name: "Ann".into(),
                ..Default::default()
            },
            chat: ChatRef::private(id),
        }
    }

    fn in_group(id: u64) -> Actor {
        Actor {
            profile: Profile {
                id,
                first_name: "Bob".into(),
                ..Default::default()
            },
            chat: ChatRef {
                id: 900,
                is_group: true,
                title: Some("Trivia".into()),
            },
        }
    }

    #[tokio::test]
    async fn question_then_answer() {
        let (bot, _rx) = bot();
        let actor = private(1);
        let start = bot.start(&actor).await;
        assert!(start[0].text.contains("Hi, Ann!"));

        let prompt = bot.handle(&actor, Action::NewQuestion).await;
        assert!(prompt[0].text.contains("Question 1?"));
        assert!(prompt[0].text.contains("25 seconds"));
        assert!(prompt[0].has_button(Action::SkipQuestion));

        let report = bot.on_text(&actor, "moscow", false).await;
        assert!(report[0].text.contains("Correct!"));
        assert!(report[0].has_button(Action::ShowParagraphs));
        assert!(bot.sessions().current(1).await.is_none());

        let nudge = bot.on_text(&actor, "moscow", false).await;
        assert!(nudge[0].has_button(Action::NewQuestion));
    }

    #[tokio::test]
    async fn paragraph_pager_walks_answer_paragraphs() {
        let (bot, _rx) = bot();
        let actor = private(2);
        bot.handle(&actor, Action::NewQuestion).await;
        bot.on_text(&actor, "Paris", false).await;

        let first = bot.handle(&actor, Action::ShowParagraphs).await;
        assert!(first[0].text.contains("Paragraph 1 of 2"));
        assert!(first[0].text.contains("capital of Russia"));

        let prev = bot.handle(&actor, Action::PrevParagraph).await;
        assert!(prev[0].text.contains("first paragraph"));

        let second = bot.handle(&actor, Action::NextParagraph).await;
        assert!(second[0].text.contains("Moskva"));
        let end = bot.handle(&actor, Action::NextParagraph).await;
        assert!(end[0].text.contains("last paragraph"));

        bot.handle(&actor, Action::MainMenu).await;
        let gone = bot.handle(&actor, Action::ShowParagraphs).await;
        assert!(gone[0].text.contains("No question"));
    }

    #[tokio::test]
    async fn hint_uses_the_open_question() {
        let (bot, _rx) = bot();
        let actor = private(3);
        let none = bot.handle(&actor, Action::ShowHint).await;
        assert!(none[0].text.contains("no open question"));

        bot.handle(&actor, Action::NewQuestion).await;
        let hint = bot.handle(&actor, Action::ShowHint).await;
        assert!(hint[0].text.contains("Moscow is the capital of Russia...."));
    }

    #[tokio::test]
    async fn group_mentions_ask_and_plain_chatter_is_ignored() {
        let (bot, _rx) = bot();
        let actor = in_group(4);
        assert!(bot.on_text(&actor, "hello all", false).await.is_empty());

        let prompt = bot.on_text(&actor, "@quiz give me one", true).await;
        assert!(prompt[0].text.contains("Question 1?"));
        bot.on_text(&actor, "Moscow", false).await;

        let stats = bot.group_stats(&actor).await;
        assert!(stats[0].text.contains("Trivia"));
        assert!(stats[0].text.contains("1/1 (100%)"));
        assert!(bot.group_stats(&private(4)).await[0].text.contains("only works"));
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_scores_a_timeout_once() {
        let (bot, mut rx) = bot();
        let actor = private(5);
        bot.handle(&actor, Action::NewQuestion).await;

        let warning = rx.recv().await.unwrap();
        let delivered = bot.on_timer(warning).await.unwrap();
        assert!(delivered.replies[0].text.contains("10 seconds left"));

        let expired = rx.recv().await.unwrap();
        let delivered = bot.on_timer(expired).await.unwrap();
        assert_eq!(delivered.chat.id, 5);
        assert!(delivered.replies[0].text.contains("Time is up"));
        assert!(bot.on_timer(expired).await.is_none());

        let stats = bot.quiz().stats(5).await.unwrap();
        assert_eq!(stats.total_questions, 1);
        assert_eq!(stats.experience, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn skipping_voids_the_old_timer() {
        let (bot, mut rx) = bot();
        let actor = private(6);
        bot.handle(&actor, Action::NewQuestion).await;
        let first = bot.sessions().current(6).await.unwrap().generation;
        bot.handle(&actor, Action::SkipQuestion).await;

        let stale = TimerEvent::Expired {
            user_id: 6,
            generation: first,
        };
        assert!(bot.on_timer(stale).await.is_none());

        bot.on_text(&actor, "Moscow", false).await;
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        while let Ok(event) = rx.try_recv() {
            assert!(bot.on_timer(event).await.is_none());
        }
        assert_eq!(bot.quiz().stats(6).await.unwrap().total_questions, 1);
    }

    #[tokio::test]
    async fn difficulty_choice_is_saved() {
        let (bot, _rx) = bot();
        let actor = private(7);
        let menu = bot.difficulty_menu(&actor).await;
        assert!(menu[0].text.contains("All questions"));

        let done = bot
            .handle(&actor, Action::SetDifficulty(DifficultyPreference::Hard))
            .await;
        assert!(done[0].text.contains("Hard"));
        let stats = bot.stats(&actor).await;
        assert!(stats[0].text.contains("Difficulty: 🔴 Hard"));

        let fresh = private(8);
        let done = bot.set_difficulty(&fresh, DifficultyPreference::Easy).await;
        assert!(done[0].text.contains("Easy"));
        assert_eq!(
            bot.quiz().difficulty_of(8).await,
            DifficultyPreference::Easy
        );
    }
}
