//! HTML templates.
//!
//! Pages are maud functions returning [`Markup`]; all dynamic content is
//! escaped by maud.

pub mod auth;
pub mod components;
pub mod errors;
pub mod layout;
pub mod posts;

use chrono::{DateTime, Datelike, FixedOffset};
use maud::{Markup, html};
use yatube_db::entities::user;

const MONTHS: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

/// Publication date, e.g. `19 октября 2026`.
#[must_use]
pub fn format_date(at: &DateTime<FixedOffset>) -> String {
    let month = MONTHS[at.month0() as usize];
    format!("{} {month} {}", at.day(), at.year())
}

/// Full name when set, else the username.
#[must_use]
pub fn display_name(user: &user::Model) -> &str {
    user.name
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or(&user.username)
}

/// Profile path of a user.
#[must_use]
pub fn profile_url(username: &str) -> String {
    format!("/profile/{}/", urlencoding::encode(username))
}

/// Text with line breaks kept.
#[must_use]
pub fn linebreaks(text: &str) -> Markup {
    html! {
        @for (i, line) in text.lines().enumerate() {
            @if i > 0 { br; }
            (line)
        }
    }
}
