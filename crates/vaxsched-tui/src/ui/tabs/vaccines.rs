use ratatui::{
    layout::{Constraint, Rect},
    text::Span,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::app::{App, LoadState};
use crate::ui::styles;

/// Render the Vaccines tab - the catalog, marked against the selected patient
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.selected_patient() {
        Some(patient) => format!(" Vaccines - due for {} ", patient.full_name()),
        None => " Vaccines ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let vaccines = match &app.vaccines {
        LoadState::Loaded(vaccines) => vaccines,
        LoadState::Failed(message) => {
            let paragraph = Paragraph::new(Span::styled(
                format!("Could not load vaccines: {}", message),
                styles::error_style(),
            ))
            .block(block);
            frame.render_widget(paragraph, area);
            return;
        }
        LoadState::Loading | LoadState::Idle => {
            let paragraph = Paragraph::new(Span::styled("Loading vaccines...", styles::muted_style()))
                .block(block);
            frame.render_widget(paragraph, area);
            return;
        }
    };

    let header = Row::new([
        Cell::from("Name"),
        Cell::from("Month"),
        Cell::from("Mandatory"),
        Cell::from("Due"),
    ])
    .style(styles::title_style())
    .height(1);

    let today = App::today();
    let rows: Vec<Row> = vaccines
        .iter()
        .enumerate()
        .map(|(i, vaccine)| {
            let style = if i == app.vaccine_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            let due = app.vaccine_due_for_selected(vaccine, today);
            let due_cell = match due {
                Some(true) => Cell::from(Span::styled("due", styles::due_style(true))),
                Some(false) => Cell::from(Span::styled("-", styles::due_style(false))),
                None => Cell::from(Span::styled("?", styles::muted_style())),
            };
            Row::new(vec![
                Cell::from(vaccine.name.clone()),
                Cell::from(vaccine.month_display()),
                Cell::from(if vaccine.is_mandatory { "yes" } else { "no" }),
                due_cell,
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Fill(3),
        Constraint::Length(12),
        Constraint::Length(10),
        Constraint::Length(5),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.vaccine_selection));

    frame.render_stateful_widget(table, area, &mut state);
}
