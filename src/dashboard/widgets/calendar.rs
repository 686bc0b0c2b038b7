use super::{Widget, WidgetAction};
use crate::dashboard::dashboard::DashboardContext;
use chrono::{Datelike, NaiveDate};
use eframe::egui;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CalendarConfig {
    #[serde(default)]
    pub week_start: WeekStart,
}

/// Weeks of a month as rows of seven optional day numbers.
pub fn month_grid(year: i32, month: u32, week_start: WeekStart) -> Vec<[Option<u32>; 7]> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    let offset = match week_start {
        WeekStart::Monday => first.weekday().num_days_from_monday(),
        WeekStart::Sunday => first.weekday().num_days_from_sunday(),
    } as usize;
    let days = days_in_month(year, month);

    let mut weeks = Vec::new();
    let mut week = [None; 7];
    let mut col = offset;
    for day in 1..=days {
        week[col] = Some(day);
        col += 1;
        if col == 7 {
            weeks.push(week);
            week = [None; 7];
            col = 0;
        }
    }
    if col > 0 {
        weeks.push(week);
    }
    weeks
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(ny, nm, 1),
    ) {
        (Some(a), Some(b)) => (b - a).num_days() as u32,
        _ => 30,
    }
}

fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}

pub struct CalendarWidget {
    cfg: CalendarConfig,
    month_offset: i32,
}

impl CalendarWidget {
    pub fn new(cfg: CalendarConfig) -> Self {
        Self {
            cfg,
            month_offset: 0,
        }
    }
}

impl Widget for CalendarWidget {
    fn render(&mut self, ui: &mut egui::Ui, ctx: &DashboardContext<'_>) -> Option<WidgetAction> {
        let today = ctx.now.date_naive();
        let (year, month) = shift_month(today.year(), today.month(), self.month_offset);

        ui.horizontal(|ui| {
            if ui.small_button("◀").clicked() {
                self.month_offset -= 1;
            }
            let title = NaiveDate::from_ymd_opt(year, month, 1)
                .map(|d| d.format("%B %Y").to_string())
                .unwrap_or_default();
            ui.strong(title);
            if ui.small_button("▶").clicked() {
                self.month_offset += 1;
            }
            if self.month_offset != 0 && ui.small_button("Today").clicked() {
                self.month_offset = 0;
            }
        });

        let headers = match self.cfg.week_start {
            WeekStart::Monday => ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"],
            WeekStart::Sunday => ["Su", "Mo", "Tu", "We", "Th", "Fr", "Sa"],
        };
        egui::Grid::new(ui.id().with("calendar-grid"))
            .num_columns(7)
            .show(ui, |ui| {
                for h in headers {
                    ui.weak(h);
                }
                ui.end_row();
                for week in month_grid(year, month, self.cfg.week_start) {
                    for day in week {
                        match day {
                            Some(d) if year == today.year()
                                && month == today.month()
                                && d == today.day() =>
                            {
                                ui.label(egui::RichText::new(d.to_string()).strong().underline());
                            }
                            Some(d) => {
                                ui.label(d.to_string());
                            }
                            None => {
                                ui.label("");
                            }
                        }
                    }
                    ui.end_row();
                }
            });
        None
    }
}
