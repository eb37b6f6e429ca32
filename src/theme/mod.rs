mod colors;

use ratatui::style::Color;

use event_timeline::model::TaskStatus;

pub use colors::Palette;

/// Resolved colours for one look. `T` cycles between them.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub name: &'static str,
    pub bar_bg: Color,
    pub text_on_bar: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
    pub surface: Color,
    pub border: Color,
    pub accent: Color,
    pub warning: Color,
    pub error: Color,
    pub today: Color,
    pub overdue: Color,
    pub weekend: Color,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            name: "Light",
            bar_bg: Palette::SLATE,
            text_on_bar: Palette::PAPER,
            text_primary: Palette::INK,
            text_secondary: Palette::MUTED,
            surface: Palette::PAPER,
            border: Palette::LINE,
            accent: Palette::IN_PROGRESS,
            warning: Palette::BLOCKED,
            error: Palette::OVERDUE,
            today: Palette::TODAY,
            overdue: Palette::OVERDUE,
            weekend: Palette::MIST,
        }
    }

    pub fn dark() -> Self {
        Self {
            name: "Dark",
            bar_bg: Palette::INK,
            text_on_bar: Palette::MIST,
            text_primary: Palette::MIST,
            text_secondary: Palette::MUTED,
            surface: Palette::INK,
            border: Palette::SLATE,
            accent: Palette::IN_PROGRESS,
            warning: Palette::BLOCKED,
            error: Palette::OVERDUE,
            today: Palette::TODAY,
            overdue: Palette::OVERDUE,
            weekend: Palette::SLATE,
        }
    }

    pub fn next(self) -> Self {
        match self.name {
            "Light" => Self::dark(),
            _ => Self::light(),
        }
    }

    pub fn status(&self, status: TaskStatus) -> Color {
        match status {
            TaskStatus::Todo => Palette::TODO,
            TaskStatus::InProgress => Palette::IN_PROGRESS,
            TaskStatus::Blocked => Palette::BLOCKED,
            TaskStatus::Done => Palette::DONE,
            TaskStatus::Canceled => Palette::CANCELED,
        }
    }
}
