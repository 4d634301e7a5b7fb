use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_token(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    /// Only the exact persisted tokens are accepted.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Persisted preference, then the ambient signal, then light.
    pub fn resolve(persisted: Option<&str>, prefers_dark: bool) -> Self {
        if let Some(theme) = persisted.and_then(Self::from_token) {
            return theme;
        }
        if prefers_dark { Theme::Dark } else { Theme::Light }
    }

    pub fn palette(&self) -> Palette {
        match self {
            Theme::Light => Palette {
                bg: Color::White,
                fg: Color::Black,
                muted: Color::DarkGray,
                accent: Color::Blue,
                danger: Color::Red,
                highlight: Color::Gray,
            },
            Theme::Dark => Palette {
                bg: Color::Black,
                fg: Color::White,
                muted: Color::Gray,
                accent: Color::LightCyan,
                danger: Color::LightRed,
                highlight: Color::DarkGray,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub bg: Color,
    pub fg: Color,
    pub muted: Color,
    pub accent: Color,
    pub danger: Color,
    pub highlight: Color,
}

/// Terminal stand-in for `prefers-color-scheme: dark`.
pub fn system_prefers_dark() -> bool {
    prefers_dark_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
}

// COLORFGBG is "fg;bg" or "fg;default;bg"; the background index is last.
fn prefers_dark_from_colorfgbg(value: Option<&str>) -> bool {
    let Some(bg) = value.and_then(|v| v.rsplit(';').next()) else {
        return false;
    };
    match bg.trim().parse::<u8>() {
        Ok(idx) => idx <= 6 || idx == 8,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persisted_token_wins() {
        assert_eq!(Theme::resolve(Some("light"), true), Theme::Light);
        assert_eq!(Theme::resolve(Some("dark"), false), Theme::Dark);
    }

    #[test]
    fn falls_back_to_ambient_then_light() {
        assert_eq!(Theme::resolve(None, true), Theme::Dark);
        assert_eq!(Theme::resolve(Some("Dark"), false), Theme::Light);
        assert_eq!(Theme::resolve(Some("solarized"), true), Theme::Dark);
    }

    #[test]
    fn colorfgbg_background_index() {
        assert!(prefers_dark_from_colorfgbg(Some("15;0")));
        assert!(prefers_dark_from_colorfgbg(Some("15;default;8")));
        assert!(!prefers_dark_from_colorfgbg(Some("0;15")));
        assert!(!prefers_dark_from_colorfgbg(Some("garbage")));
        assert!(!prefers_dark_from_colorfgbg(None));
    }

    #[test]
    fn toggled_flips() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled().as_token(), "light");
    }
}
