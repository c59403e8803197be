//! Signup and login pages.

use maud::{Markup, html};
use yatube_core::FieldErrors;

use super::components::field_errors;
use super::layout::page;

/// Login form. `next` is carried through to the post-login redirect.
#[must_use]
pub fn login(username: &str, next: Option<&str>, errors: &FieldErrors) -> Markup {
    page(
        "Войти",
        None,
        html! {
            h1 { "Войти на сайт" }
            form method="post" action="/auth/login/" {
                (field_errors(errors.get("__all__")))
                @if let Some(next) = next {
                    input type="hidden" name="next" value=(next);
                }
                label for="id_username" { "Имя пользователя" }
                input id="id_username" type="text" name="username" value=(username) required;
                label for="id_password" { "Пароль" }
                input id="id_password" type="password" name="password" required;
                button type="submit" { "Войти" }
            }
            p { "Нет аккаунта? " a href="/auth/signup/" { "Зарегистрироваться" } }
        },
    )
}

/// Signup form.
#[must_use]
pub fn signup(username: &str, name: &str, errors: &FieldErrors) -> Markup {
    page(
        "Зарегистрироваться",
        None,
        html! {
            h1 { "Зарегистрироваться" }
            form method="post" action="/auth/signup/" {
                (field_errors(errors.get("__all__")))
                label for="id_username" { "Имя пользователя" }
                input id="id_username" type="text" name="username" value=(username) required;
                (field_errors(errors.get("username")))
                label for="id_name" { "Имя" }
                input id="id_name" type="text" name="name" value=(name);
                (field_errors(errors.get("name")))
                label for="id_password" { "Пароль" }
                input id="id_password" type="password" name="password" required;
                (field_errors(errors.get("password")))
                button type="submit" { "Зарегистрироваться" }
            }
        },
    )
}
