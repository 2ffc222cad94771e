use std::io::{self, IsTerminal, Write};

use chrono::Datelike;
use serde_json::{Value, json};
use unicode_width::UnicodeWidthStr;

use crate::config::{CalendarSettings, Config};
use crate::density::{DensityPolicy, DensityTier};
use crate::grid::CalendarCell;
use crate::view::MonthView;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    /// Colors only when enabled and stdout is a terminal.
    pub fn for_stdout(color: bool) -> Self {
        Self::new(color && io::stdout().is_terminal())
    }

    #[tracing::instrument(skip_all)]
    pub fn write_month<W: Write>(&self, out: &mut W, view: &MonthView<'_>) -> anyhow::Result<()> {
        let total = view.total_events();
        writeln!(
            out,
            "{}  ({} {}, {})",
            self.paint(&view.title(), "1"),
            total,
            if total == 1 { "event" } else { "events" },
            describe_policy(view.density().policy())
        )?;

        let headers = view
            .weekday_labels()
            .iter()
            .map(|label| label.to_string())
            .collect::<Vec<_>>();

        let rows = view
            .shaded_cells()
            .map(|(cell, tier)| self.cell_label(cell, tier))
            .collect::<Vec<_>>()
            .chunks(headers.len())
            .map(<[String]>::to_vec)
            .collect::<Vec<_>>();

        write_table(&mut *out, headers, rows)?;

        if let Some(busiest) = view.busiest_day() {
            writeln!(
                out,
                "busiest: {} ({} events)",
                busiest.date.format("%a %b %-d"),
                busiest.event_count()
            )?;
        }

        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub fn write_month_json<W: Write>(
        &self,
        out: &mut W,
        view: &MonthView<'_>,
    ) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut *out, &month_json(view))?;
        writeln!(out)?;
        Ok(())
    }

    pub fn write_tiers<W: Write>(
        &self,
        out: &mut W,
        tiers: &[DensityTier],
        policy: &DensityPolicy,
    ) -> anyhow::Result<()> {
        let line = tiers
            .iter()
            .map(|tier| self.paint(&tier.level().to_string(), tier_color(*tier)))
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(out, "{line}")?;
        writeln!(out, "{}", self.paint(&describe_policy(policy), "2"))?;
        Ok(())
    }

    pub fn write_settings<W: Write>(
        &self,
        out: &mut W,
        config: &Config,
        settings: &CalendarSettings,
    ) -> anyhow::Result<()> {
        let source = config
            .loaded_from
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "built-in defaults".to_string());

        writeln!(out, "{}", self.paint("Configuration", "1"))?;
        writeln!(out, "  source      {source}")?;
        writeln!(out, "  timezone    {}", settings.timezone.name())?;
        writeln!(out, "  week start  {:?}", settings.week_start)?;
        writeln!(
            out,
            "  years       [{}, {})",
            settings.bounds.min(),
            settings.bounds.max()
        )?;
        writeln!(out, "  density     {}", describe_policy(&settings.policy))?;
        writeln!(out, "  color       {}", if settings.color { "on" } else { "off" })?;
        Ok(())
    }

    fn cell_label(&self, cell: &CalendarCell<'_>, tier: DensityTier) -> String {
        let mut label = format!("{:>2}", cell.date.day());
        if cell.event_count() > 0 {
            label.push_str(&format!("+{}", cell.event_count()));
        }
        if cell.is_focused {
            label = format!("[{label}]");
        }

        if !cell.belongs_to_focus_month {
            self.paint(&label, "2")
        } else if tier == DensityTier::NONE {
            label
        } else {
            self.paint(&label, tier_color(tier))
        }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || code.is_empty() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

pub fn month_json(view: &MonthView<'_>) -> Value {
    let cells = view
        .shaded_cells()
        .map(|(cell, tier)| {
            json!({
                "date": cell.date,
                "belongs_to_focus_month": cell.belongs_to_focus_month,
                "is_focused": cell.is_focused,
                "event_count": cell.event_count(),
                "events": cell.events,
                "tier": tier,
            })
        })
        .collect::<Vec<_>>();

    json!({
        "title": view.title(),
        "focus": view.focus(),
        "week_start": view.grid().week_start(),
        "density": view.density().policy(),
        "total_events": view.total_events(),
        "cells": cells,
    })
}

fn describe_policy(policy: &DensityPolicy) -> String {
    match policy {
        DensityPolicy::Fixed(thresholds) => format!(
            "fixed tiers 1-{} / {}-{} / >{}",
            thresholds.low_max(),
            thresholds.low_max() + 1,
            thresholds.mid_max(),
            thresholds.mid_max()
        ),
        DensityPolicy::Relative(scale) => {
            format!("relative tiers, step {}", scale.step())
        }
    }
}

fn tier_color(tier: DensityTier) -> &'static str {
    match tier.level() {
        0 => "",
        1 => "32",
        2 => "33",
        _ => "31",
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate().take(column_count) {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    let header_line = headers
        .iter()
        .zip(widths.iter().copied())
        .map(|(header, width)| format!("{header:>width$}"))
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(writer, "{}", header_line.trim_end())?;

    for row in rows {
        let line = row
            .iter()
            .zip(widths.iter().copied())
            .map(|(cell, width)| {
                let visible = UnicodeWidthStr::width(strip_ansi(cell).as_str());
                format!("{}{}", " ".repeat(width.saturating_sub(visible)), cell)
            })
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(writer, "{line}")?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, Weekday};

    use super::*;
    use crate::event::{Event, EventTime, EventsByDay};
    use crate::focus::FocusDate;

    fn sample_events() -> Vec<Event> {
        [(2, "a"), (2, "b"), (15, "c")]
            .into_iter()
            .map(|(day, id)| Event {
                id: id.to_string(),
                title: id.to_string(),
                start: EventTime::Date(NaiveDate::from_ymd_opt(2024, 2, day).expect("valid date")),
                end: None,
            })
            .collect()
    }

    fn render(renderer: &Renderer, view: &MonthView<'_>) -> String {
        let mut out = Vec::new();
        renderer.write_month(&mut out, view).expect("render month");
        String::from_utf8(out).expect("utf8 output")
    }

    #[test]
    fn renders_plain_month_grid() {
        let events = sample_events();
        let by_day = EventsByDay::for_month(&events, 2024, 1, &chrono_tz::UTC);
        let focus = FocusDate::new(15, 1, 2024).expect("valid focus");
        let view = MonthView::build(focus, &by_day, Weekday::Sun, &DensityPolicy::default())
            .expect("month view");

        let text = render(&Renderer::new(false), &view);
        let lines: Vec<&str> = text.lines().collect();

        assert!(lines[0].starts_with("February 2024  (3 events, fixed tiers 1-3 / 4-6 / >6)"));
        assert!(lines[1].trim_start().starts_with("Sun"));
        assert_eq!(lines.len(), 1 + 1 + 6 + 1);
        assert!(text.contains(" 2+2"));
        assert!(text.contains("[15+1]"));
        assert!(lines[2].trim_start().starts_with("28"));
        assert!(!text.contains('\x1b'));
        assert!(lines[8].starts_with("busiest: Fri Feb 2 (2 events)"));
    }

    #[test]
    fn colored_output_keeps_columns_aligned() {
        let events = sample_events();
        let by_day = EventsByDay::for_month(&events, 2024, 1, &chrono_tz::UTC);
        let focus = FocusDate::new(15, 1, 2024).expect("valid focus");
        let view = MonthView::build(focus, &by_day, Weekday::Sun, &DensityPolicy::default())
            .expect("month view");

        let plain = render(&Renderer::new(false), &view);
        let colored = render(&Renderer::new(true), &view);

        assert!(colored.contains("\x1b[32m"));
        assert_eq!(strip_ansi(&colored), plain);
    }

    #[test]
    fn json_output_lists_all_cells() {
        let events = sample_events();
        let by_day = EventsByDay::for_month(&events, 2024, 1, &chrono_tz::UTC);
        let focus = FocusDate::new(15, 1, 2024).expect("valid focus");
        let view = MonthView::build(focus, &by_day, Weekday::Sun, &DensityPolicy::default())
            .expect("month view");

        let value = month_json(&view);
        let cells = value["cells"].as_array().expect("cells array");

        assert_eq!(cells.len(), 42);
        assert_eq!(cells[0]["date"], "2024-01-28");
        assert_eq!(cells[0]["belongs_to_focus_month"], false);
        assert_eq!(cells[5]["event_count"], 2);
        assert_eq!(cells[5]["tier"], 1);
        assert_eq!(value["focus"]["month"], 1);
        assert_eq!(value["density"]["policy"], "fixed");
        assert_eq!(value["total_events"], 3);
    }

    #[test]
    fn writes_tier_line() {
        let mut out = Vec::new();
        Renderer::new(false)
            .write_tiers(
                &mut out,
                &[DensityTier::NONE, DensityTier::LOW, DensityTier::HIGH],
                &DensityPolicy::default(),
            )
            .expect("write tiers");
        let text = String::from_utf8(out).expect("utf8 output");
        assert_eq!(text.lines().next(), Some("0 1 3"));
    }

    #[test]
    fn strip_ansi_removes_escape_codes() {
        assert_eq!(strip_ansi("\x1b[31m12+7\x1b[0m"), "12+7");
    }
}
