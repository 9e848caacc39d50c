use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

use crate::app::{App, Focus, LoadState, PatientDetail};
use crate::ui::styles;
use crate::utils::{format_date, format_optional, format_optional_date, truncate_string};
use vaxsched_core::models::Patient;

/// Render the Patients tab - patient table with schedule detail
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);

    render_patient_table(frame, app, chunks[0]);
    render_patient_detail(frame, app, chunks[1]);
}

fn list_block(title: String, focused: bool) -> Block<'static> {
    Block::default()
        .title(title)
        .title_style(styles::muted_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused))
}

fn render_patient_table(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::List);

    let patients = match &app.patients {
        LoadState::Loaded(patients) => patients,
        LoadState::Failed(message) => {
            let lines = vec![
                Line::from(Span::styled("Could not load patients", styles::error_style())),
                Line::from(""),
                Line::from(Span::raw(message.clone())),
                Line::from(""),
                Line::from(Span::styled("Press u to retry", styles::muted_style())),
            ];
            let paragraph = Paragraph::new(lines)
                .block(list_block(" Patients ".to_string(), focused))
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }
        LoadState::Loading | LoadState::Idle => {
            let paragraph = Paragraph::new(Span::styled("Loading patients...", styles::muted_style()))
                .block(list_block(" Patients ".to_string(), focused));
            frame.render_widget(paragraph, area);
            return;
        }
    };

    if patients.is_empty() {
        let paragraph = Paragraph::new(Span::styled("No patients", styles::muted_style()))
            .block(list_block(" Patients (0) ".to_string(), focused));
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new([Cell::from("Name"), Cell::from("Born"), Cell::from("Age")])
        .style(styles::title_style())
        .height(1);

    let today = App::today();
    let rows: Vec<Row> = patients
        .iter()
        .enumerate()
        .map(|(i, patient)| {
            let style = if i == app.patient_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            Row::new(vec![
                Cell::from(truncate_string(&patient.full_name(), 40)),
                Cell::from(format_optional_date(patient.birth_date)),
                Cell::from(patient.age_display(today)),
            ])
            .style(style)
        })
        .collect();

    let widths = [
        Constraint::Fill(3),    // Name
        Constraint::Length(13), // Born
        Constraint::Length(10), // Age
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(list_block(format!(" Patients ({}) ", patients.len()), focused))
        .row_highlight_style(styles::selected_style());

    let mut state = TableState::default();
    state.select(Some(app.patient_selection));

    frame.render_stateful_widget(table, area, &mut state);
}

fn render_patient_detail(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);
    let block = list_block(" Schedule ".to_string(), focused);

    let Some(patient) = app.selected_patient() else {
        let paragraph = Paragraph::new(Span::styled("No patient selected", styles::muted_style()))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let mut lines = patient_summary_lines(patient);
    lines.push(Line::from(""));

    match app.selected_detail() {
        Some(LoadState::Loaded(detail)) => lines.extend(schedule_lines(app, detail)),
        Some(LoadState::Failed(message)) => {
            lines.push(Line::from(Span::styled("Could not load schedule", styles::error_style())));
            lines.push(Line::from(Span::raw(message.clone())));
        }
        _ => lines.push(Line::from(Span::styled("Loading schedule...", styles::muted_style()))),
    }

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn patient_summary_lines(patient: &Patient) -> Vec<Line<'static>> {
    vec![
        Line::from(vec![
            Span::styled("EGN:        ", styles::muted_style()),
            Span::raw(format_optional(&patient.egn, "-")),
        ]),
        Line::from(vec![
            Span::styled("Born:       ", styles::muted_style()),
            Span::raw(format_optional_date(patient.birth_date)),
        ]),
        Line::from(vec![
            Span::styled("Age:        ", styles::muted_style()),
            Span::raw(patient.age_display(App::today())),
        ]),
    ]
}

fn schedule_lines(app: &App, detail: &PatientDetail) -> Vec<Line<'static>> {
    let mut lines = vec![];

    if detail.schedule.is_complete() {
        lines.push(Line::from(Span::styled("Up to date", styles::given_style())));
    } else {
        lines.push(Line::from(Span::styled(
            format!("Missing ({})", detail.schedule.missing.len()),
            styles::section_style(),
        )));
        for name in &detail.schedule.missing {
            lines.push(Line::from(Span::styled(format!("  ✗ {}", name), styles::missing_style())));
        }
    }

    if !detail.schedule.given.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Given ({})", detail.schedule.given.len()),
            styles::section_style(),
        )));
        for name in &detail.schedule.given {
            lines.push(Line::from(Span::styled(format!("  ✓ {}", name), styles::given_style())));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Immunizations", styles::section_style())));
    if detail.immunizations.is_empty() {
        lines.push(Line::from(Span::styled("  None recorded", styles::muted_style())));
    }
    for record in &detail.immunizations {
        lines.push(Line::from(vec![
            Span::styled(format!("  {}  ", format_date(record.date_given)), styles::muted_style()),
            Span::raw(app.vaccine_name(record.vaccine_id)),
        ]));
    }

    lines
}
