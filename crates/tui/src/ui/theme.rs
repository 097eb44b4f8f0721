use engine::ThemeChoice;
use ratatui::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub text_muted: Color,
    pub border: Color,
    pub accent: Color,
    pub positive: Color,
    pub warning: Color,
    pub error: Color,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            background: Color::Rgb(10, 16, 12),
            text: Color::Rgb(224, 228, 220),
            text_muted: Color::Rgb(138, 146, 134),
            border: Color::Rgb(58, 72, 60),
            accent: Color::Rgb(120, 184, 96),
            positive: Color::Rgb(96, 176, 120),
            warning: Color::Rgb(220, 170, 70),
            error: Color::Rgb(210, 84, 72),
        }
    }

    pub fn light() -> Self {
        Self {
            background: Color::Rgb(246, 244, 236),
            text: Color::Rgb(34, 40, 32),
            text_muted: Color::Rgb(110, 116, 104),
            border: Color::Rgb(190, 196, 180),
            accent: Color::Rgb(46, 120, 40),
            positive: Color::Rgb(30, 120, 70),
            warning: Color::Rgb(170, 110, 10),
            error: Color::Rgb(176, 40, 36),
        }
    }
}

impl From<ThemeChoice> for Theme {
    fn from(choice: ThemeChoice) -> Self {
        match choice {
            ThemeChoice::Dark => Self::dark(),
            ThemeChoice::Light => Self::light(),
        }
    }
}
