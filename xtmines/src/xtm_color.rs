use ratatui::style::Color;
use term_color_support::ColorSupport;

/// How many colors the terminal can show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorDepth {
    TrueColor,
    Indexed256,
    Basic,
}

impl ColorDepth {
    pub fn detect() -> Self {
        let support = ColorSupport::stdout();
        if support.has_16m {
            ColorDepth::TrueColor
        } else if support.has_256 {
            ColorDepth::Indexed256
        } else {
            ColorDepth::Basic
        }
    }

    /// Pick the closest representation of a color for this depth
    /// Format: ((R, G, B), ANSI_256_Index, basic ANSI fallback)
    fn pick(self, rgb: (u8, u8, u8), index256: u8, basic: Color) -> Color {
        match self {
            ColorDepth::TrueColor => Color::Rgb(rgb.0, rgb.1, rgb.2),
            ColorDepth::Indexed256 => Color::Indexed(index256),
            ColorDepth::Basic => basic,
        }
    }
}

/// Every color the UI draws with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Theme {
    pub background: Color,
    pub title: Color,
    pub text: Color,
    pub button: Color,
    pub button_hover: Color,
    pub button_text: Color,
    pub cell_hidden: Color,
    pub cell_revealed: Color,
    pub cursor: Color,
    pub flag: Color,
    pub lost: Color,
    pub numbers: [Color; 8],
}

impl Theme {
    pub fn detect() -> Self {
        Theme::for_depth(ColorDepth::detect())
    }

    pub fn for_depth(depth: ColorDepth) -> Self {
        let c = |rgb, index256, basic| depth.pick(rgb, index256, basic);
        Theme {
            background: c((34, 12, 16), 52, Color::Black),
            title: c((119, 203, 185), 115, Color::LightCyan),
            text: c((205, 211, 213), 252, Color::Gray),
            button: c((205, 211, 213), 252, Color::Gray),
            button_hover: c((80, 108, 100), 65, Color::DarkGray),
            button_text: c((12, 12, 12), 232, Color::Black),
            cell_hidden: c((148, 148, 148), 246, Color::DarkGray),
            cell_revealed: c((205, 211, 213), 252, Color::Gray),
            cursor: c((59, 120, 255), 63, Color::LightBlue),
            flag: c((197, 15, 31), 160, Color::Red),
            lost: c((196, 41, 41), 160, Color::LightRed),
            numbers: [
                c((0, 55, 218), 20, Color::Blue),
                c((19, 161, 14), 28, Color::Green),
                c((197, 15, 31), 160, Color::Red),
                c((0, 0, 128), 18, Color::Magenta),
                c((128, 0, 0), 88, Color::LightRed),
                c((0, 128, 128), 30, Color::Cyan),
                c((12, 12, 12), 232, Color::Black),
                c((118, 118, 118), 243, Color::DarkGray),
            ],
        }
    }

    /// Foreground for a revealed cell's numeral (1..=8)
    pub fn number(&self, n: u8) -> Color {
        self.numbers[(n.clamp(1, 8) - 1) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_selects_representation() {
        assert_eq!(
            Theme::for_depth(ColorDepth::TrueColor).flag,
            Color::Rgb(197, 15, 31)
        );
        assert_eq!(Theme::for_depth(ColorDepth::Indexed256).flag, Color::Indexed(160));
        assert_eq!(Theme::for_depth(ColorDepth::Basic).flag, Color::Red);
    }

    #[test]
    fn numerals_map_one_to_eight() {
        let theme = Theme::for_depth(ColorDepth::Basic);

        assert_eq!(theme.number(1), Color::Blue);
        assert_eq!(theme.number(8), Color::DarkGray);
    }
}
