use ratatui::style::Color;

pub struct ThemeColors {
    pub primary: Color,
    pub accent: Color,
    pub text: Color,
    pub text_dim: Color,
    pub background: Color,
    pub border: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub highlight_bg: Color,
}

/// Dark theme with blue accents.
pub fn get_theme_colors() -> ThemeColors {
    ThemeColors {
        primary: Color::Rgb(100, 200, 255),
        accent: Color::Rgb(255, 100, 200),
        text: Color::Rgb(220, 220, 220),
        text_dim: Color::Rgb(120, 120, 120),
        background: Color::Rgb(20, 20, 25),
        border: Color::Rgb(60, 60, 70),
        success: Color::Rgb(100, 255, 150),
        warning: Color::Rgb(255, 200, 100),
        error: Color::Rgb(255, 100, 100),
        highlight_bg: Color::Rgb(40, 40, 50),
    }
}
