//! Color theme for CLI output

use comfy_table::Color as TableColor;

/// Color theme for terminal output
#[derive(Debug, Clone)]
pub struct ColorTheme {
    pub success: TableColor,
    pub warning: TableColor,
    pub error: TableColor,
    pub info: TableColor,
    pub muted: TableColor,
}

impl Default for ColorTheme {
    fn default() -> Self {
        Self {
            success: TableColor::Green,
            warning: TableColor::Yellow,
            error: TableColor::Red,
            info: TableColor::Cyan,
            muted: TableColor::DarkGrey,
        }
    }
}

impl ColorTheme {
    /// Color of a unit outcome
    pub fn outcome_color(&self, succeeded: bool) -> TableColor {
        if succeeded {
            self.success
        } else {
            self.error
        }
    }

    /// Color of a batch summary line
    pub fn summary_color(&self, failed: usize, total: usize) -> TableColor {
        if total == 0 {
            self.muted
        } else if failed == 0 {
            self.success
        } else if failed < total {
            self.warning
        } else {
            self.error
        }
    }
}

/// Convert comfy_table::Color to colored::Color string representation
pub fn table_color_to_colored_str(color: TableColor) -> &'static str {
    match color {
        TableColor::Green => "green",
        TableColor::Yellow => "yellow",
        TableColor::Red => "red",
        TableColor::Cyan => "cyan",
        TableColor::DarkGrey => "bright black",
        _ => "white",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_color() {
        let theme = ColorTheme::default();
        assert_eq!(theme.summary_color(0, 3), TableColor::Green);
        assert_eq!(theme.summary_color(1, 3), TableColor::Yellow);
        assert_eq!(theme.summary_color(3, 3), TableColor::Red);
        assert_eq!(theme.summary_color(0, 0), TableColor::DarkGrey);
        assert_eq!(table_color_to_colored_str(theme.info), "cyan");
    }
}
