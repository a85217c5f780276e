use crate::quiz::difficulty::DifficultyPreference;

const SET_DIFFICULTY_PREFIX: &str = "set_difficulty_";

/// A button press, identified on the wire by its custom id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    NewQuestion,
    MyStats,
    TopPlayers,
    MyAchievements,
    Help,
    SkipQuestion,
    ShowHint,
    ShowParagraphs,
    NextParagraph,
    PrevParagraph,
    DifficultyMenu,
    SetDifficulty(DifficultyPreference),
    MainMenu,
}

impl Action {
    pub fn custom_id(&self) -> String {
        match self {
            Action::NewQuestion => "new_question".into(),
            Action::MyStats => "my_stats".into(),
            Action::TopPlayers => "top_players".into(),
            Action::MyAchievements => "my_achievements".into(),
            Action::Help => "help".into(),
            Action::SkipQuestion => "skip_question".into(),
            Action::ShowHint => "show_hint".into(),
            Action::ShowParagraphs => "show_paragraphs".into(),
            Action::NextParagraph => "next_paragraph".into(),
            Action::PrevParagraph => "prev_paragraph".into(),
            Action::DifficultyMenu => "set_difficulty_menu".into(),
            Action::SetDifficulty(pref) => format!("{}{}", SET_DIFFICULTY_PREFIX, pref.as_str()),
            Action::MainMenu => "main_menu".into(),
        }
    }

    /// Parse a custom id. Unknown ids yield `None` and are ignored.
    pub fn parse(id: &str) -> Option<Self> {
        let action = match id {
            "new_question" => Action::NewQuestion,
            "my_stats" => Action::MyStats,
            "top_players" => Action::TopPlayers,
            "my_achievements" => Action::MyAchievements,
            "help" => Action::Help,
            "skip_question" => Action::SkipQuestion,
            "show_hint" => Action::ShowHint,
            "show_paragraphs" => Action::ShowParagraphs,
            "next_paragraph" => Action::NextParagraph,
            "prev_paragraph" => Action::PrevParagraph,
            "set_difficulty_menu" => Action::DifficultyMenu,
            "main_menu" => Action::MainMenu,
            other => {
                let pref = other.strip_prefix(SET_DIFFICULTY_PREFIX)?.parse().ok()?;
                Action::SetDifficulty(pref)
            }
        };
        Some(action)
    }
}
