//! Colour palettes for the light and dark themes

use flowdeck_core::Theme;
use ratatui::style::Color;

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    /// Primary accent (borders of focused elements, titles)
    pub accent: Color,
    /// Less important chrome
    pub secondary: Color,
    /// Selected items
    pub highlight: Color,
    pub success: Color,
    pub error: Color,
    pub dim: Color,
    pub text: Color,
    pub background: Color,
    /// Text drawn on top of `accent`/`highlight`
    pub on_accent: Color,
}

const DARK: Palette = Palette {
    accent: Color::Cyan,
    secondary: Color::DarkGray,
    highlight: Color::Yellow,
    success: Color::Green,
    error: Color::LightRed,
    dim: Color::Rgb(100, 100, 100),
    text: Color::White,
    background: Color::Reset,
    on_accent: Color::Black,
};

const LIGHT: Palette = Palette {
    accent: Color::Blue,
    secondary: Color::Gray,
    highlight: Color::Magenta,
    success: Color::Rgb(0, 128, 0),
    error: Color::Red,
    dim: Color::Rgb(120, 120, 120),
    text: Color::Black,
    background: Color::Rgb(250, 250, 250),
    on_accent: Color::White,
};

pub fn palette(theme: Theme) -> &'static Palette {
    match theme {
        Theme::Dark => &DARK,
        Theme::Light => &LIGHT,
    }
}
