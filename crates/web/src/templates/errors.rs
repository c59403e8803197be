//! Error pages.

use maud::{Markup, html};

use super::layout::page;

/// 404 page.
#[must_use]
pub fn not_found(path: &str) -> Markup {
    page(
        "Страница не найдена",
        None,
        html! {
            h1 { "Custom 404" }
            @if path.is_empty() {
                p { "Такой страницы не существует" }
            } @else {
                p { "Страницы с адресом " code { (path) } " не существует" }
            }
            a href="/" { "Идите на главную" }
        },
    )
}

/// 403 page.
#[must_use]
pub fn forbidden() -> Markup {
    page(
        "Доступ запрещён",
        None,
        html! {
            h1 { "Custom 403" }
            p { "У вас нет доступа к этой странице." }
            a href="/" { "Идите на главную" }
        },
    )
}

/// 400 page.
#[must_use]
pub fn bad_request(message: &str) -> Markup {
    page(
        "Некорректный запрос",
        None,
        html! {
            h1 { "Некорректный запрос" }
            p { (message) }
            a href="/" { "Идите на главную" }
        },
    )
}

/// 500 page. Never shows the underlying error.
#[must_use]
pub fn server_error() -> Markup {
    page(
        "Ошибка сервера",
        None,
        html! {
            h1 { "Custom 500" }
            p { "Что-то пошло не так. Мы уже разбираемся." }
        },
    )
}
