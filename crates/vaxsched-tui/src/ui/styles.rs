use ratatui::style::{Color, Modifier, Style};

// Clinic palette
pub const CLINIC_TEAL: Color = Color::Rgb(0, 150, 136);
pub const GIVEN_GREEN: Color = Color::Rgb(102, 187, 106);
pub const DUE_AMBER: Color = Color::Rgb(255, 179, 0);
pub const MISSING_RED: Color = Color::Rgb(229, 57, 53);
pub const CHART_GREY: Color = Color::Rgb(144, 152, 160);
pub const SELECTION_BG: Color = Color::Rgb(24, 56, 60);
pub const STATUS_BG: Color = Color::Rgb(18, 32, 36);

pub fn title_style() -> Style {
    Style::default().fg(CLINIC_TEAL).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default().bg(SELECTION_BG).add_modifier(Modifier::BOLD)
}

pub fn list_item_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(CHART_GREY)
}

/// Section headings inside the detail pane and overlays.
pub fn section_style() -> Style {
    Style::default().fg(CLINIC_TEAL).add_modifier(Modifier::UNDERLINED)
}

/// A dose already on record.
pub fn given_style() -> Style {
    Style::default().fg(GIVEN_GREEN)
}

/// A mandatory dose the schedule says is still outstanding.
pub fn missing_style() -> Style {
    Style::default().fg(MISSING_RED).add_modifier(Modifier::BOLD)
}

/// Failed requests and login notices.
pub fn error_style() -> Style {
    Style::default().fg(MISSING_RED)
}

/// Marker in the vaccine list for doses due at the selected patient's age.
pub fn due_style(due: bool) -> Style {
    if due {
        Style::default().fg(DUE_AMBER).add_modifier(Modifier::BOLD)
    } else {
        muted_style()
    }
}

pub fn tab_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .fg(CLINIC_TEAL)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        muted_style()
    }
}

pub fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(CLINIC_TEAL)
    } else {
        Style::default().fg(CHART_GREY)
    }
}

pub fn status_bar_style() -> Style {
    Style::default().bg(STATUS_BG).fg(Color::White)
}

pub fn help_key_style() -> Style {
    Style::default().fg(DUE_AMBER).add_modifier(Modifier::BOLD)
}

pub fn help_desc_style() -> Style {
    Style::default().fg(Color::White)
}

/// Login form fields; the focused one is shaded.
pub fn input_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::White).bg(SELECTION_BG)
    } else {
        Style::default().fg(Color::White)
    }
}
