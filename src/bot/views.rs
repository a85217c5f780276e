//! Message rendering. Pure functions from engine data to [`Reply`].

use crate::dataset::clip;
use crate::dataset::types::Question;
use crate::quiz::achievements::Achievement;
use crate::quiz::difficulty::{Difficulty, DifficultyPreference};
use crate::quiz::progression::{experience_reward, level_name, rating_weight};
use crate::quiz::{AnswerReport, GroupReport, PlayerRow, TimeoutReport, TopOrder, UserStats};

use super::actions::Action;
use super::reply::{Button, Reply};

/// Paragraph pages are cut to this many characters.
pub const PARAGRAPH_CHARS: usize = 4000;

fn medal(index: usize) -> String {
    match index {
        0 => "🥇".into(),
        1 => "🥈".into(),
        2 => "🥉".into(),
        n => format!("{}.", n + 1),
    }
}

fn menu_button() -> Button {
    Button::new("🏠 Main menu", Action::MainMenu)
}

fn rewards_table() -> String {
    Difficulty::ALL
        .iter()
        .map(|&d| {
            format!(
                "{}: +{} XP, +{} rating",
                d.label(),
                experience_reward(d, true),
                rating_weight(d)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn main_menu(reply: Reply) -> Reply {
    reply
        .row(vec![Button::new("🎯 Start quiz", Action::NewQuestion)])
        .row(vec![
            Button::new("📊 My stats", Action::MyStats),
            Button::new("🏆 Top players", Action::TopPlayers),
        ])
        .row(vec![
            Button::new("🎖️ Achievements", Action::MyAchievements),
            Button::new("❓ Help", Action::Help),
        ])
}

fn after_answer(reply: Reply, has_paragraphs: bool) -> Reply {
    let reply = reply
        .row(vec![Button::new("➡️ Next question", Action::NewQuestion)])
        .row(vec![
            Button::new("📊 My stats", Action::MyStats),
            Button::new("🏆 Top players", Action::TopPlayers),
        ]);
    if has_paragraphs {
        reply.row(vec![Button::new(
            "📖 More about this question",
            Action::ShowParagraphs,
        )])
    } else {
        reply
    }
}

pub fn welcome(first_name: &str, daily_limit: u32) -> Reply {
    let name = if first_name.is_empty() {
        "friend"
    } else {
        first_name
    };
    main_menu(Reply::text(format!(
        "👋 Hi, {name}!\n\n\
         🎯 I run the RuBQ 2.0 quiz.\n\n\
         📚 I ask questions from a knowledge base and you answer in chat.\n\
         📊 You can answer up to {daily_limit} questions a day.\n\n\
         🎮 Commands:\n\
         /start - Start\n\
         /question - New question\n\
         /top - Top players\n\
         /stats - Your stats\n\
         /achievements - Achievements\n\
         /difficulty - Question difficulty\n\
         /help - Help\n\n\
         💡 **Difficulty:** harder questions are worth more XP and rating.\n\n\
         Ready? Press a button below! 👇"
    )))
}

pub fn help(daily_limit: u32) -> Reply {
    Reply::text(format!(
        "📖 **Help**\n\n\
         **Commands:**\n\
         /start - Start using the bot\n\
         /question - Get a new question\n\
         /top [order] - Top players by rating, accuracy or questions\n\
         /stats - Your stats\n\
         /achievements - Your achievements\n\
         /difficulty - Choose question difficulty\n\
         /groupstats - Channel leaderboard (servers only)\n\
         /help - This message\n\n\
         **Rules:**\n\
         • Up to {daily_limit} questions per day (UTC)\n\
         • Type your answer as a normal message\n\
         • Answers are checked automatically\n\
         • Earn XP to level up\n\n\
         **Rewards for correct answers:**\n{}\n\n\
         **Servers:** mention the bot to get a question; /groupstats shows the channel leaderboard.",
        rewards_table()
    ))
    .row(vec![menu_button()])
}

pub fn question_prompt(question: &Question, time_limit_secs: u64) -> Reply {
    Reply::text(format!(
        "❓ **Question** ({})\n\n{}\n\n💬 Type your answer.\n\n⏱️ **You have {} seconds!**",
        Difficulty::of(question).label(),
        question.question_text,
        time_limit_secs
    ))
    .row(vec![
        Button::new("💡 Hint", Action::ShowHint),
        Button::new("⏭️ Skip", Action::SkipQuestion),
    ])
    .row(vec![menu_button()])
}

pub fn time_warning(seconds_left: u64) -> Reply {
    Reply::text(format!(
        "⚠️ **{} seconds left!** Hurry up!",
        seconds_left
    ))
}

pub fn answer_report(report: &AnswerReport, has_paragraphs: bool) -> Reply {
    let mut text = if report.outcome.is_correct {
        format!(
            "✅ **Correct!**\n\n🎉 Great job!\n\n📊 Correct answer: **{}**",
            report.outcome.correct_answer
        )
    } else {
        format!(
            "❌ **Wrong**\n\n😔 Better luck next time!\n\n📊 Correct answer: **{}**",
            report.outcome.correct_answer
        )
    };

    text.push_str(&format!(
        "\n\n📊 **Difficulty:** {}",
        report.difficulty.label()
    ));
    text.push_str(&format!(
        "\n💎 XP gained: **+{}**",
        report.experience_gained
    ));
    if report.outcome.is_correct {
        text.push_str(&format!("\n🏆 Rating gained: **+{}**", report.rating_gained));
    } else {
        text.push_str(" (for trying)");
    }

    let stats = &report.stats;
    if report.leveled_up {
        let what = if stats.at_max_level() {
            "You reached the maximum level!"
        } else {
            "You reached a new level!"
        };
        text.push_str(&format!(
            "\n\n🎊 **{}**\n{}",
            what,
            level_name(stats.level)
        ));
    }

    if !report.new_achievements.is_empty() {
        text.push_str("\n\n🎖️ **New achievement!**\n");
        for a in &report.new_achievements {
            text.push_str(&format!("{} - {}\n", a.name(), a.description()));
        }
    }

    text.push_str(&format!(
        "\n\n📈 Your stats:\n✅ Correct: {}/{} ({}%)\n🔥 Streak: {}\n",
        stats.correct_answers, stats.total_questions, stats.accuracy, stats.streak
    ));
    if stats.at_max_level() {
        text.push_str(&format!("{}\n", level_name(stats.level)));
    } else {
        text.push_str(&format!(
            "{} ({}% to next level)\n",
            level_name(stats.level),
            stats.progress
        ));
    }
    text.push_str(&format!(
        "📅 Left today: {} questions",
        stats.remaining_today
    ));

    after_answer(Reply::text(text), has_paragraphs)
}

pub fn timeout_report(report: &TimeoutReport, has_paragraphs: bool) -> Reply {
    let text = format!(
        "⏱️ **Time is up!**\n\n❌ No answer recorded.\n\n📊 Correct answer: **{}**\n\n\
         📊 **Difficulty:** {}\n⏱️ No XP or rating for expired questions",
        report.correct_answer,
        report.difficulty.label()
    );
    after_answer(Reply::text(text), has_paragraphs)
}

pub fn stats(stats: &UserStats) -> Reply {
    let level = if stats.at_max_level() {
        format!("{}\n💎 XP: {}", level_name(stats.level), stats.experience)
    } else {
        format!(
            "{}\n📊 {}% to next level\n💎 XP: {}/{}",
            level_name(stats.level),
            stats.progress,
            stats.experience,
            stats.experience_for_next
        )
    };

    Reply::text(format!(
        "📊 **Your stats**\n\n\
         👤 Name: {}\n\
         {}\n\
         📝 Questions: {}\n\
         ✅ Correct: {}\n\
         📈 Accuracy: {}%\n\
         🔥 Current streak: {}\n\
         ⭐ Best streak: {}\n\
         🏆 Rating: {}\n\
         📅 Today: {}/{}\n\
         ⏰ Left today: {} questions\n\
         📆 Days in a row: {}\n\
         🎖️ Achievements: {}\n\
         ⚙️ Difficulty: {}\n\n\
         💡 **Rewards:**\n{}",
        stats.name,
        level,
        stats.total_questions,
        stats.correct_answers,
        stats.accuracy,
        stats.streak,
        stats.best_streak,
        stats.rating,
        stats.today_questions,
        stats.daily_limit,
        stats.remaining_today,
        stats.consecutive_days,
        stats.achievements,
        stats.difficulty.label(),
        rewards_table()
    ))
    .row(vec![Button::new("🎯 New question", Action::NewQuestion)])
    .row(vec![
        Button::new("🏆 Top players", Action::TopPlayers),
        Button::new("🎖️ Achievements", Action::MyAchievements),
    ])
    .row(vec![Button::new("⚙️ Difficulty", Action::DifficultyMenu)])
    .row(vec![menu_button()])
}

pub fn not_registered() -> Reply {
    Reply::text("❌ You are not registered yet. Use /start first.")
}

pub fn top(rows: &[PlayerRow], order: TopOrder) -> Reply {
    if rows.is_empty() {
        return Reply::text("📊 No players on the leaderboard yet.");
    }
    let mut text = format!("🏆 **Top players** ({})\n\n", order.label());
    for (i, row) in rows.iter().enumerate() {
        text.push_str(&format!(
            "{} {}\n   ✅ {}/{} ({}%) | 🔥 {} | {} | 🏆 {}\n\n",
            medal(i),
            row.name,
            row.correct_answers,
            row.total_questions,
            row.accuracy,
            row.best_streak,
            level_name(row.level),
            row.rating
        ));
    }
    Reply::text(text.trim_end())
        .row(vec![Button::new("🎯 New question", Action::NewQuestion)])
        .row(vec![Button::new("📊 My stats", Action::MyStats)])
}

pub fn achievements(earned: &[Achievement]) -> Reply {
    if earned.is_empty() {
        return Reply::text("🎖️ No achievements yet. Keep playing!");
    }
    let mut text = String::from("🎖️ **Your achievements:**\n\n");
    for a in earned {
        text.push_str(&format!("{}\n*{}*\n\n", a.name(), a.description()));
    }
    Reply::text(text.trim_end())
}

pub fn group_only() -> Reply {
    Reply::text("❌ This command only works in server channels.")
}

pub fn group_stats(report: Option<&GroupReport>) -> Reply {
    let Some(report) = report else {
        return Reply::text("📊 No stats for this channel yet.");
    };
    let mut text = format!("📊 **Leaderboard of \"{}\"**\n\n", report.title);
    for (i, row) in report.rows.iter().enumerate() {
        text.push_str(&format!(
            "{} {}\n   ✅ {}/{} ({}%)\n\n",
            medal(i),
            row.name,
            row.tally.correct,
            row.tally.total,
            row.tally.accuracy().round() as u32
        ));
    }
    Reply::text(text.trim_end())
}

pub fn difficulty_menu(current: DifficultyPreference) -> Reply {
    let mut reply = Reply::text(format!(
        "⚙️ **Question difficulty**\n\nCurrent: **{}**\n\nPick a level:",
        current.label()
    ));
    for pref in DifficultyPreference::CHOICES {
        let label = if pref == current {
            format!("✅ {}", pref.label())
        } else {
            pref.label().to_string()
        };
        reply = reply.row(vec![Button::new(label, Action::SetDifficulty(pref))]);
    }
    reply.row(vec![menu_button()])
}

pub fn difficulty_changed(pref: DifficultyPreference) -> Reply {
    Reply::text(format!(
        "✅ Difficulty set to **{}**\n\nNew questions will use this level.",
        pref.label()
    ))
}

pub fn hint(text: &str) -> Reply {
    Reply::text(format!("💡 **Hint:**\n\n{}", text))
}

pub fn hint_unavailable() -> Reply {
    Reply::text("❌ No hint for this question.")
}

pub fn no_active_question() -> Reply {
    Reply::text("❌ You have no open question. Press a button to get one.")
        .row(vec![Button::new("🎯 New question", Action::NewQuestion)])
}

pub fn paragraph_page(text: &str, index: usize, total: usize) -> Reply {
    let body = if text.chars().count() > PARAGRAPH_CHARS {
        format!("{}...", clip(text, PARAGRAPH_CHARS - 3))
    } else {
        text.to_string()
    };
    let mut nav = Vec::new();
    if index > 0 {
        nav.push(Button::new("⬅️ Back", Action::PrevParagraph));
    }
    if index + 1 < total {
        nav.push(Button::new("➡️ Next", Action::NextParagraph));
    }
    Reply::text(format!(
        "📖 **More about this question**\n\n*Paragraph {} of {}*\n\n{}",
        index + 1,
        total,
        body
    ))
    .row(nav)
    .row(vec![menu_button()])
}

pub fn question_info_unavailable() -> Reply {
    Reply::text("❌ No question to show details for.")
}

pub fn no_paragraphs() -> Reply {
    Reply::text("❌ There is no extra information for this question.")
}

pub fn paragraph_missing() -> Reply {
    Reply::text("❌ Paragraph not found.")
}

pub fn first_paragraph() -> Reply {
    Reply::text("✅ This is the first paragraph.")
}

pub fn last_paragraph() -> Reply {
    Reply::text("✅ This is the last paragraph.")
}

pub fn limit_reached(daily_limit: u32) -> Reply {
    Reply::text(format!(
        "❌ You have already answered {} questions today!\n\n🕐 The limit resets tomorrow (UTC).",
        daily_limit
    ))
}

pub fn no_data() -> Reply {
    Reply::text("❌ Error: questions are not loaded.")
}

pub fn private_nudge() -> Reply {
    Reply::text("💬 No open question right now.").row(vec![
        Button::new("🎯 New question", Action::NewQuestion),
        menu_button(),
    ])
}
