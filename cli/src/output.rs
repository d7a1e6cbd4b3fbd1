//! Rendering for the terminal: notices, tables, and `--json`.

use barber_core::models::{Appointment, Service, User};
use barber_core::view::{AppointmentPartition, ScheduleRow, appointment_badge, is_today};
use barber_core::{Notice, NoticeBuffer, NoticeLevel};
use chrono::NaiveDateTime;
use owo_colors::OwoColorize;
use serde::Serialize;

/// Where command results go.
#[derive(Debug, Clone)]
pub struct Output {
    json: bool,
    notices: NoticeBuffer,
}

impl Output {
    pub fn new(json: bool, notices: NoticeBuffer) -> Self {
        Self { json, notices }
    }

    pub fn is_json(&self) -> bool {
        self.json
    }

    /// Print pending notices. Returns whether any was a warning or error,
    /// so the caller does not print the same failure twice.
    pub fn flush_notices(&self) -> bool {
        let mut reported_problem = false;
        for notice in self.notices.drain() {
            reported_problem |= notice.level != NoticeLevel::Success;
            print_notice(&notice);
        }
        reported_problem
    }

    pub fn data<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub fn line(&self, message: impl std::fmt::Display) {
        if !self.json {
            println!("{message}");
        }
    }
}

fn print_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Success => eprintln!("{} {}", "✓".green(), notice.message),
        NoticeLevel::Warning => eprintln!("{} {}", "!".yellow().bold(), notice.message.yellow()),
        NoticeLevel::Error => eprintln!("{} {}", "✗".red().bold(), notice.message.red()),
    }
}

pub fn appointments(partition: &AppointmentPartition, now: NaiveDateTime) {
    println!("{}", "Upcoming".bold());
    if partition.upcoming.is_empty() {
        println!("  {}", "No upcoming appointments".dimmed());
    }
    for appointment in &partition.upcoming {
        appointment_line(appointment, now);
    }
    if !partition.other.is_empty() {
        println!("{}", "Past and closed".bold());
        for appointment in &partition.other {
            appointment_line(appointment, now);
        }
    }
}

fn appointment_line(a: &Appointment, now: NaiveDateTime) {
    let when = a.appointment_date.format("%Y-%m-%d %H:%M").to_string();
    let when = if is_today(a, now) {
        when.cyan().bold().to_string()
    } else {
        when
    };
    println!(
        "  #{:<5} {}  {} with {} for {}  R$ {:.2}  [{}]",
        a.id,
        when,
        a.service_name,
        a.barber_name,
        a.client_name,
        a.service_price,
        appointment_badge(a.status),
    );
    if let Some(notes) = a.notes.as_deref().filter(|n| !n.is_empty()) {
        println!("         {}", notes.dimmed());
    }
}

pub fn schedule(rows: &[ScheduleRow]) {
    if rows.is_empty() {
        println!("{}", "No working hours yet. Try `barber schedule defaults`.".dimmed());
    }
    for row in rows {
        let state = if row.active {
            "active".green().to_string()
        } else {
            "inactive".dimmed().to_string()
        };
        println!(
            "  #{:<5} {:<9} {}-{}  {state}",
            row.id, row.weekday, row.start_time, row.end_time
        );
    }
}

pub fn services(services: &[Service]) {
    if services.is_empty() {
        println!("{}", "No services".dimmed());
    }
    for s in services {
        println!(
            "  #{:<5} {:<24} R$ {:>8.2}  {:>3} min  {}",
            s.id,
            s.name,
            s.price,
            s.duration,
            s.description.dimmed()
        );
    }
}

pub fn users(users: &[User]) {
    for u in users {
        println!("  #{:<5} {:<24} {}  {}", u.id, u.name, u.email, u.phone.dimmed());
    }
}

pub fn user(user: &User) {
    println!("{} ({})", user.name.bold(), user.user_type);
    println!("  id:     {}", user.id);
    println!("  email:  {}", user.email);
    println!("  phone:  {}", user.phone);
    if let Some(url) = &user.avatar_url {
        println!("  avatar: {url}");
    }
}
