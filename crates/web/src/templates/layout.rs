//! Base page layout.

use maud::{DOCTYPE, Markup, html};
use yatube_db::entities::user;

use super::profile_url;

/// Wrap `content` in the site chrome.
#[must_use]
pub fn page(title: &str, viewer: Option<&user::Model>, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="ru" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
            }
            body {
                header {
                    nav {
                        a href="/" { "Yatube" }
                        " "
                        a href="/" { "Главная" }
                        @if let Some(user) = viewer {
                            " "
                            a href="/follow/" { "Избранные авторы" }
                            " "
                            a href="/create/" { "Новая запись" }
                            " "
                            a href=(profile_url(&user.username)) { (user.username) }
                            " "
                            form.logout method="post" action="/auth/logout/" {
                                button type="submit" { "Выйти" }
                            }
                        } @else {
                            " "
                            a href="/auth/login/" { "Войти" }
                            " "
                            a href="/auth/signup/" { "Регистрация" }
                        }
                    }
                }
                main { (content) }
                footer {
                    p { "© Yatube" }
                }
            }
        }
    }
}
