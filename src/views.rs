//! Presentational values derived from event and dashboard data. Nothing here
//! is cached; callers recompute on every render.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDateTime};
use serde::Serialize;

use crate::event::parse_local_datetime;
use crate::models::{OrganizerEventSummary, TicketType};

pub const MIN_QUANTITY: u8 = 1;
pub const MAX_QUANTITY: u8 = 10;
const REVENUE_MONTHS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Availability {
    CapacityTba,
    SoldOut,
    AlmostFull,
    FillingFast,
    Available,
}

impl Availability {
    pub fn label(&self) -> &'static str {
        match self {
            Self::CapacityTba => "Capacity TBA",
            Self::SoldOut => "Sold Out",
            Self::AlmostFull => "Almost Full",
            Self::FillingFast => "Filling Fast",
            Self::Available => "Available",
        }
    }
}

pub fn availability(registered: u32, capacity: u32) -> Availability {
    if capacity == 0 {
        return Availability::CapacityTba;
    }
    let percentage = (f64::from(registered) / f64::from(capacity) * 100.0).min(100.0);
    match percentage {
        p if p >= 100.0 => Availability::SoldOut,
        p if p >= 95.0 => Availability::AlmostFull,
        p if p >= 75.0 => Availability::FillingFast,
        _ => Availability::Available,
    }
}

pub fn clamp_quantity(requested: i64) -> u8 {
    requested.clamp(i64::from(MIN_QUANTITY), i64::from(MAX_QUANTITY)) as u8
}

pub fn purchase_total(unit_price: f64, quantity: i64) -> f64 {
    unit_price * f64::from(clamp_quantity(quantity))
}

/// Lowest price across the ticket types, for the "starting from" label.
pub fn starting_price(ticket_types: &[TicketType]) -> Option<f64> {
    let mut lowest: Option<f64> = None;
    for ticket in ticket_types {
        lowest = match lowest {
            Some(current) if current <= ticket.price => Some(current),
            _ => Some(ticket.price),
        };
    }
    lowest
}

pub fn format_price(value: f64) -> String {
    if !value.is_finite() || value <= 0.0 {
        return "Free".to_string();
    }
    format_currency(value)
}

/// Philippine peso with thousands separators, e.g. `₱1,234.50`.
pub fn format_currency(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let cents = (value.abs() * 100.0).round() as u64;
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}₱{}.{:02}", group_digits(cents / 100), cents % 100)
}

/// `1234567` → `1,234,567`
pub fn group_digits(value: u64) -> String {
    let whole = value.to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Short date used in dashboard tables and reports, e.g. `Nov 20, 2026`.
pub fn format_short_date(start: Option<&NaiveDateTime>) -> String {
    match start {
        Some(dt) => dt.format("%b %-d, %Y").to_string(),
        None => "TBD".to_string(),
    }
}

pub fn format_event_date(start: Option<&NaiveDateTime>) -> String {
    match start {
        Some(dt) => dt.format("%A, %B %-d, %Y").to_string(),
        None => "Date to be announced".to_string(),
    }
}

pub fn format_time_range(start: Option<&NaiveDateTime>, end: Option<&NaiveDateTime>) -> String {
    let Some(start) = start else {
        return "Schedule to be announced".to_string();
    };
    let end_label = end
        .map(|dt| dt.format("%-I:%M %p").to_string())
        .unwrap_or_else(|| "TBD".to_string());
    format!("{} - {end_label}", start.format("%-I:%M %p"))
}

pub fn attendance_percentage(sold: u64, capacity: u32) -> u8 {
    if capacity == 0 {
        return 0;
    }
    let ratio = (sold as f64 / f64::from(capacity)).clamp(0.0, 1.0);
    (ratio * 100.0).round() as u8
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RevenuePoint {
    pub label: String,
    pub value: f64,
}

/// Revenue per event month, oldest first, limited to the latest six buckets.
/// Events without a parseable start land in a trailing `Unscheduled` bucket.
pub fn revenue_series(events: &[OrganizerEventSummary]) -> Vec<RevenuePoint> {
    let mut totals: HashMap<i64, RevenuePoint> = HashMap::new();

    for event in events {
        if !event.revenue.is_finite() || event.revenue <= 0.0 {
            continue;
        }
        let start = event.event_start.as_deref().and_then(parse_local_datetime);
        let (order, label) = match start {
            Some(dt) => (
                i64::from(dt.year()) * 12 + i64::from(dt.month0()),
                dt.format("%b %Y").to_string(),
            ),
            None => (i64::MAX, "Unscheduled".to_string()),
        };
        totals
            .entry(order)
            .or_insert_with(|| RevenuePoint { label, value: 0.0 })
            .value += event.revenue;
    }

    let mut ordered: Vec<(i64, RevenuePoint)> = totals.into_iter().collect();
    ordered.sort_by_key(|(order, _)| *order);
    let skip = ordered.len().saturating_sub(REVENUE_MONTHS);
    ordered.into_iter().skip(skip).map(|(_, point)| point).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(start: Option<&str>, revenue: f64) -> OrganizerEventSummary {
        OrganizerEventSummary {
            event_start: start.map(str::to_string),
            revenue,
            ..Default::default()
        }
    }

    #[test]
    fn availability_ladder() {
        assert_eq!(availability(100, 100).label(), "Sold Out");
        assert_eq!(availability(120, 100).label(), "Sold Out");
        assert_eq!(availability(96, 100).label(), "Almost Full");
        assert_eq!(availability(80, 100).label(), "Filling Fast");
        assert_eq!(availability(10, 100).label(), "Available");
        assert_eq!(availability(10, 0).label(), "Capacity TBA");
    }

    #[test]
    fn starting_price_is_the_minimum() {
        let types: Vec<TicketType> = [500.0, 250.0, 1000.0]
            .into_iter()
            .map(TicketType::regular)
            .collect();
        assert_eq!(starting_price(&types), Some(250.0));
        assert_eq!(starting_price(&[]), None);
    }

    #[test]
    fn quantity_is_clamped() {
        assert_eq!(clamp_quantity(0), 1);
        assert_eq!(clamp_quantity(4), 4);
        assert_eq!(clamp_quantity(25), 10);
        assert_eq!(purchase_total(250.0, 3), 750.0);
        assert_eq!(purchase_total(250.0, 50), 2500.0);
    }

    #[test]
    fn prices_and_currency() {
        assert_eq!(format_price(0.0), "Free");
        assert_eq!(format_price(f64::NAN), "Free");
        assert_eq!(format_price(1234.5), "₱1,234.50");
        assert_eq!(format_currency(1_000_000.0), "₱1,000,000.00");
        assert_eq!(format_currency(999.999), "₱1,000.00");
        assert_eq!(group_digits(999), "999");
        assert_eq!(group_digits(12_345), "12,345");
    }

    #[test]
    fn schedule_labels() {
        let start = parse_local_datetime("2026-11-20T09:00:00");
        let end = parse_local_datetime("2026-11-20T17:30:00");
        assert_eq!(format_event_date(start.as_ref()), "Friday, November 20, 2026");
        assert_eq!(format_time_range(start.as_ref(), end.as_ref()), "9:00 AM - 5:30 PM");
        assert_eq!(format_time_range(start.as_ref(), None), "9:00 AM - TBD");
        assert_eq!(format_time_range(None, None), "Schedule to be announced");
        assert_eq!(format_event_date(None), "Date to be announced");
        assert_eq!(format_short_date(start.as_ref()), "Nov 20, 2026");
        assert_eq!(format_short_date(None), "TBD");
    }

    #[test]
    fn attendance_is_bounded() {
        assert_eq!(attendance_percentage(50, 0), 0);
        assert_eq!(attendance_percentage(1, 3), 33);
        assert_eq!(attendance_percentage(500, 100), 100);
    }

    #[test]
    fn revenue_groups_by_month_and_keeps_the_latest_six() {
        let mut events = vec![
            summary(Some("2026-01-10T10:00:00"), 100.0),
            summary(Some("2026-01-25T10:00:00"), 50.0),
            summary(None, 30.0),
            summary(Some("2026-02-01T10:00:00"), 0.0),
        ];
        for month in 2..=7 {
            events.push(summary(Some(&format!("2026-{month:02}-05T10:00:00")), 10.0));
        }
        let series = revenue_series(&events);
        assert_eq!(series.len(), 6);
        assert_eq!(series.first().map(|p| p.label.as_str()), Some("Mar 2026"));
        assert_eq!(series.last().map(|p| p.label.as_str()), Some("Unscheduled"));

        let short = revenue_series(&events[..3]);
        assert_eq!(short[0], RevenuePoint { label: "Jan 2026".into(), value: 150.0 });
    }
}
