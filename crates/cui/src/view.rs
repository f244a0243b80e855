use crate::app::{App, FocusPane};
use crate::form::{Field, FormFocus, FormState};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::{Alignment, Color, Line, Modifier, Span, Style, Stylize};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use roster_core::{MatchSpan, RenderedSuggestion, SectionView};

/// Width of the key column in the properties pane, borders excluded.
const KEY_WIDTH: u16 = 18;
const POPUP_ROWS: usize = 8;

struct Panes {
    header: Rect,
    documents: Rect,
    properties: Rect,
    events: Rect,
}

fn panes(area: Rect) -> Panes {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(8),
            Constraint::Length(8),
        ])
        .split(area);
    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(root[1]);
    Panes {
        header: root[0],
        documents: middle[0],
        properties: middle[1],
        events: root[2],
    }
}

pub fn draw(frame: &mut Frame, app: &App) {
    app.screen.set(frame.area());
    let panes = panes(frame.area());

    draw_header(frame, panes.header, app);
    draw_documents(frame, panes.documents, app);
    draw_properties(frame, panes.properties, app);
    draw_events(frame, panes.events, app);

    if app.show_help {
        draw_help_popup(frame);
    }
    if app.palette_cursor.is_some() {
        draw_palette(frame, app);
    }
    if let Some(form) = app.form.as_ref() {
        draw_form(frame, form);
    }
}

/// Row of the documents list under the pointer. `offset` is the first
/// item shown in the last frame.
pub fn documents_hit(
    screen: Rect,
    column: u16,
    row: u16,
    offset: usize,
    len: usize,
) -> Option<usize> {
    let inner = inner(panes(screen).documents);
    row_hit(inner, column, row, offset, len)
}

/// Row of the properties pane under the pointer, and whether the pointer is
/// on the value cell rather than the key cell.
pub fn properties_hit(
    screen: Rect,
    column: u16,
    row: u16,
    offset: usize,
    len: usize,
) -> Option<(usize, bool)> {
    let inner = inner(panes(screen).properties);
    let idx = row_hit(inner, column, row, offset, len)?;
    Some((idx, column >= inner.x + KEY_WIDTH))
}

fn inner(area: Rect) -> Rect {
    Block::default().borders(Borders::ALL).inner(area)
}

fn row_hit(inner: Rect, column: u16, row: u16, offset: usize, len: usize) -> Option<usize> {
    if column < inner.x
        || column >= inner.x + inner.width
        || row < inner.y
        || row >= inner.y + inner.height
    {
        return None;
    }
    let idx = offset + usize::from(row - inner.y);
    (idx < len).then_some(idx)
}

fn draw_header(frame: &mut Frame, area: Rect, app: &App) {
    let title = format!(
        "Roster | Focus: {} | Hint: {}",
        app.focus_label(app.focus),
        app.next_hint()
    );
    let active = app
        .active
        .as_ref()
        .map(|doc| doc.path.as_str())
        .unwrap_or("-");
    let lines = vec![
        Line::from(title.bold()),
        Line::from(format!("Document: {active}  Status: {}", app.status_line)),
    ];
    let block = Block::default()
        .borders(Borders::ALL)
        .title(app.vault.root().display().to_string());
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: true }).block(block),
        area,
    );
}

fn highlight_style() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

fn draw_documents(frame: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem<'_>> = if app.documents.is_empty() {
        vec![ListItem::new("no notes")]
    } else {
        app.documents
            .iter()
            .map(|doc| {
                let marker = if app.active.as_ref().is_some_and(|a| a.path == doc.path) {
                    "*"
                } else {
                    " "
                };
                ListItem::new(format!("{marker}{}", doc.path))
            })
            .collect()
    };
    let block = pane_block("Documents", app.focus == FocusPane::Documents);
    let list = List::new(items).block(block).highlight_style(highlight_style());
    let mut state = ListState::default().with_offset(app.doc_offset.get());
    if !app.documents.is_empty() {
        state.select(Some(app.doc_cursor.min(app.documents.len() - 1)));
    }
    frame.render_stateful_widget(list, area, &mut state);
    app.doc_offset.set(state.offset());
}

fn draw_properties(frame: &mut Frame, area: Rect, app: &App) {
    let block = pane_block("Properties", app.focus == FocusPane::Properties);
    if app.active.is_none() || app.properties.is_empty() {
        let text = if app.active.is_none() {
            "no document open"
        } else {
            "no properties"
        };
        frame.render_widget(
            Paragraph::new(text).alignment(Alignment::Center).block(block),
            area,
        );
        app.property_offset.set(0);
        return;
    }
    let key_width = usize::from(KEY_WIDTH);
    let items: Vec<ListItem<'_>> = app
        .properties
        .iter()
        .map(|row| {
            let key: String = row.key.chars().take(key_width - 1).collect();
            let style = if row.key == app.plugin.property_key() {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            };
            ListItem::new(Line::from(vec![
                Span::raw(format!("{key:<key_width$}")),
                Span::styled(row.value.clone(), style),
            ]))
        })
        .collect();
    let list = List::new(items).block(block).highlight_style(highlight_style());
    let mut state = ListState::default().with_offset(app.property_offset.get());
    state.select(Some(app.property_cursor.min(app.properties.len() - 1)));
    frame.render_stateful_widget(list, area, &mut state);
    app.property_offset.set(state.offset());
}

fn draw_events(frame: &mut Frame, area: Rect, app: &App) {
    let capacity = area.height.saturating_sub(2) as usize;
    let start = app.event_log.len().saturating_sub(capacity);
    let lines: Vec<Line<'_>> = app
        .event_log
        .iter()
        .skip(start)
        .map(|line| Line::from(line.clone()))
        .collect();
    let block = pane_block("Events", app.focus == FocusPane::Events);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_help_popup(frame: &mut Frame) {
    let area = centered_rect(70, 60, frame.area());
    frame.render_widget(Clear, area);
    let lines = vec![
        Line::from("q quit | ? help | tab focus | arrows/jk move | r rescan vault"),
        Line::from("enter open document / edit the players property"),
        Line::from("click the players value in Properties to edit it"),
        Line::from("o or ctrl+p then enter: Open players modal"),
        Line::from(""),
        Line::from("In the players form:"),
        Line::from("  tab/shift+tab or arrows move between fields"),
        Line::from("  space/enter toggle checkboxes and press buttons"),
        Line::from("  ctrl+space suggest people | enter pick a suggestion"),
        Line::from("  ctrl+n add player | ctrl+s save | esc close"),
    ];
    let block = Block::default()
        .title("Help")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn draw_palette(frame: &mut Frame, app: &App) {
    let area = centered_rect(60, 30, frame.area());
    frame.render_widget(Clear, area);
    let rows = app.palette_rows();
    let items: Vec<ListItem<'_>> = rows
        .iter()
        .map(|row| {
            let style = if row.enabled {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };
            ListItem::new(Span::styled(row.command.name, style))
        })
        .collect();
    let block = Block::default()
        .title("Command palette")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));
    let list = List::new(items)
        .block(block)
        .highlight_style(highlight_style())
        .highlight_symbol("> ");
    let mut state = ListState::default();
    state.select(app.palette_cursor.map(|cursor| cursor.min(rows.len().saturating_sub(1))));
    frame.render_stateful_widget(list, area, &mut state);
}

fn control_style(focused: bool) -> Style {
    if focused {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    }
}

fn checkbox(checked: bool) -> &'static str {
    if checked {
        "[x]"
    } else {
        "[ ]"
    }
}

/// Form lines plus the index of the focused line.
fn form_lines(form: &FormState) -> (Vec<Line<'static>>, usize) {
    let mut lines = Vec::new();
    let mut focused_line = 0;
    let is_focused = |id, field| form.focus == FormFocus::Field(id, field);

    for section in form.modal.sections() {
        let mut title = vec![Span::styled(
            section.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )];
        if section.removable {
            let focused = is_focused(section.id, Field::Remove);
            if focused {
                focused_line = lines.len();
            }
            title.push(Span::raw("  "));
            title.push(Span::styled("[Remove]", control_style(focused).fg(Color::Red)));
        }
        lines.push(Line::from(title));

        for field in [
            Field::Name,
            Field::Won,
            Field::Score,
            Field::Team,
            Field::Position,
            Field::FirstTime,
            Field::AddBelow,
        ] {
            let focused = is_focused(section.id, field);
            if focused {
                focused_line = lines.len();
            }
            lines.push(field_line(form, &section, field, focused));
        }
        lines.push(Line::from(""));
    }

    let save = form.focus == FormFocus::Save;
    let cancel = form.focus == FormFocus::Cancel;
    if save || cancel {
        focused_line = lines.len();
    }
    lines.push(Line::from(vec![
        Span::styled("[Save]", control_style(save).fg(Color::Green)),
        Span::raw("  "),
        Span::styled("[Cancel]", control_style(cancel)),
    ]));
    if let Some(error) = form.error.as_ref() {
        lines.push(Line::from(Span::styled(
            format!("save failed: {error}"),
            Style::default().fg(Color::Red),
        )));
    }
    (lines, focused_line)
}

fn field_line(
    form: &FormState,
    section: &SectionView,
    field: Field,
    focused: bool,
) -> Line<'static> {
    let style = control_style(focused);
    let text_value = |stored: &str| {
        if focused {
            format!("{}_", form.buffer)
        } else {
            stored.to_string()
        }
    };
    let (label, value, hint) = match field {
        Field::Name => ("Name", text_value(&section.name), None),
        Field::Won => ("Won", checkbox(section.won).to_string(), None),
        Field::Score => ("Score", text_value(&section.score), section.score_hint),
        Field::Team => ("Team", text_value(&section.team), None),
        Field::Position => ("Position", text_value(&section.position), section.position_hint),
        Field::FirstTime => (
            "First time player",
            checkbox(section.first_time_player).to_string(),
            None,
        ),
        Field::AddBelow => {
            return Line::from(vec![
                Span::raw("  "),
                Span::styled("[Add player below]", style),
            ])
        }
        Field::Remove => return Line::from(""),
    };
    let mut spans = vec![
        Span::raw(format!("  {label:<18}")),
        Span::styled(value, style),
    ];
    if let Some(hint) = hint {
        spans.push(Span::styled(
            format!("  {hint}"),
            Style::default().fg(Color::Red),
        ));
    }
    Line::from(spans)
}

fn draw_form(frame: &mut Frame, form: &FormState) {
    let area = centered_rect(80, 85, frame.area());
    frame.render_widget(Clear, area);
    let title = format!(
        "Players - {}  (ctrl+n add, ctrl+s save, esc close)",
        form.modal.file().basename
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));
    let body = block.inner(area);
    let (lines, focused_line) = form_lines(form);
    let height = usize::from(body.height.max(1));
    let scroll = focused_line.saturating_sub(height.saturating_sub(2));
    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0)),
        area,
    );

    if let Some(popup) = form.popup.as_ref() {
        let row = body.y + u16::try_from(focused_line - scroll).unwrap_or(0) + 1;
        draw_suggestions(frame, form, popup.cursor, body, row);
    }
}

fn draw_suggestions(frame: &mut Frame, form: &FormState, cursor: usize, body: Rect, row: u16) {
    let Some(popup) = form.popup.as_ref() else {
        return;
    };
    let rows = popup.items.len().min(POPUP_ROWS) as u16 + 2;
    let bottom = body.y + body.height;
    let y = if row + rows <= bottom {
        row
    } else {
        bottom.saturating_sub(rows)
    };
    let area = Rect {
        x: body.x + 20,
        y,
        width: body.width.saturating_sub(22).max(10),
        height: rows.min(body.height),
    }
    .intersection(frame.area());
    if area.is_empty() {
        return;
    }
    frame.render_widget(Clear, area);
    let items: Vec<ListItem<'_>> = popup
        .items
        .iter()
        .map(|item| suggestion_item(form.suggest.render_suggestion(item)))
        .collect();
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .highlight_style(Style::default().bg(Color::DarkGray));
    let mut state = ListState::default();
    state.select(Some(cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

fn suggestion_item(rendered: RenderedSuggestion) -> ListItem<'static> {
    match rendered {
        RenderedSuggestion::Plain {
            content,
            highlights,
        } => ListItem::new(Line::from(highlighted(&content, &highlights))),
        RenderedSuggestion::Complex {
            title,
            note,
            highlights,
            alias_flair,
        } => {
            let mut spans = highlighted(&title, &highlights);
            if alias_flair {
                spans.push(Span::styled(" ↪ alias", Style::default().fg(Color::Magenta)));
            }
            ListItem::new(vec![
                Line::from(spans),
                Line::from(Span::styled(
                    format!("  {note}"),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
        }
    }
}

/// Split `text` into spans, styling the chars covered by `highlights`.
fn highlighted(text: &str, highlights: &[MatchSpan]) -> Vec<Span<'static>> {
    let mark = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let mut spans = Vec::new();
    let mut current = String::new();
    let mut current_marked = false;
    for (idx, ch) in text.chars().enumerate() {
        let marked = highlights
            .iter()
            .any(|span| span.start <= idx && idx < span.end);
        if marked != current_marked && !current.is_empty() {
            let chunk = std::mem::take(&mut current);
            spans.push(if current_marked {
                Span::styled(chunk, mark)
            } else {
                Span::raw(chunk)
            });
        }
        current_marked = marked;
        current.push(ch);
    }
    if !current.is_empty() {
        spans.push(if current_marked {
            Span::styled(current, mark)
        } else {
            Span::raw(current)
        });
    }
    spans
}

fn pane_block(title: &str, focused: bool) -> Block<'_> {
    let mut block = Block::default().title(title).borders(Borders::ALL);
    if focused {
        block = block.border_style(Style::default().fg(Color::Yellow));
    }
    block
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(spans: &[Span<'_>]) -> Vec<String> {
        spans.iter().map(|span| span.content.to_string()).collect()
    }

    #[test]
    fn highlighted_groups_marked_runs() {
        let spans = highlighted(
            "Ann Lee",
            &[MatchSpan { start: 0, end: 2 }, MatchSpan { start: 4, end: 5 }],
        );
        assert_eq!(texts(&spans), vec!["An", "n ", "L", "ee"]);
        assert_eq!(texts(&highlighted("Bob", &[])), vec!["Bob"]);
    }

    #[test]
    fn properties_hit_splits_key_and_value_cells() {
        let screen = Rect::new(0, 0, 100, 30);
        let pane = panes(screen).properties;
        let first_row = pane.y + 1;
        assert_eq!(
            properties_hit(screen, pane.x + 2, first_row, 0, 2),
            Some((0, false))
        );
        assert_eq!(
            properties_hit(screen, pane.x + 1 + KEY_WIDTH, first_row + 1, 0, 2),
            Some((1, true))
        );
        assert_eq!(properties_hit(screen, pane.x + 2, first_row + 2, 0, 2), None);
        assert_eq!(properties_hit(screen, 0, 0, 0, 2), None);
        assert_eq!(
            properties_hit(screen, pane.x + 2, first_row, 5, 8),
            Some((5, false))
        );
    }
}
