//! Fragments shared by several pages.

use maud::{Markup, html};
use yatube_common::{Page, PageMeta};
use yatube_core::PostView;

use super::{display_name, format_date, linebreaks, profile_url};

/// One post in a feed.
#[must_use]
pub fn post_card(view: &PostView, group_link: bool) -> Markup {
    html! {
        article.post {
            ul.post-meta {
                li {
                    "Автор: "
                    a href=(profile_url(&view.author.username)) { (display_name(&view.author)) }
                }
                li { "Дата публикации: " (format_date(&view.post.created_at)) }
            }
            @if let Some(url) = &view.image_url {
                img.post-image src=(url) alt="";
            }
            p { (linebreaks(&view.post.text)) }
            a href={ "/posts/" (view.post.id) "/" } { "подробная информация" }
            @if group_link {
                @if let Some(group) = &view.group {
                    br;
                    a href={ "/group/" (group.slug) "/" } { "все записи группы" }
                }
            }
        }
    }
}

/// A feed of posts with pagination.
#[must_use]
pub fn post_feed(page: &Page<PostView>, group_links: bool) -> Markup {
    html! {
        @for (i, view) in page.items.iter().enumerate() {
            @if i > 0 { hr; }
            (post_card(view, group_links))
        }
        (paginator(&page.meta))
    }
}

/// Page links. Nothing when there is a single page.
#[must_use]
pub fn paginator(meta: &PageMeta) -> Markup {
    html! {
        @if meta.num_pages > 1 {
            nav.pagination aria-label="Пагинация" {
                @if meta.has_previous() {
                    a href="?page=1" { "Первая" }
                    " "
                    @if let Some(prev) = meta.previous_page_number() {
                        a href={ "?page=" (prev) } { "Предыдущая" }
                    }
                    " "
                }
                span.current { "Страница " (meta.number) " из " (meta.num_pages) }
                @if meta.has_next() {
                    " "
                    @if let Some(next) = meta.next_page_number() {
                        a href={ "?page=" (next) } { "Следующая" }
                    }
                    " "
                    a href={ "?page=" (meta.num_pages) } { "Последняя" }
                }
            }
        }
    }
}

/// Inline errors for one form field.
#[must_use]
pub fn field_errors(errors: &[String]) -> Markup {
    html! {
        @if !errors.is_empty() {
            ul.errorlist {
                @for error in errors {
                    li { (error) }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use yatube_common::Paginator;

    #[test]
    fn test_paginator_single_page_is_empty() {
        let meta = Paginator::default().page_meta(3, None);
        assert!(paginator(&meta).into_string().is_empty());
    }

    #[test]
    fn test_paginator_links() {
        let meta = Paginator::default().page_meta(25, Some("2"));
        let html = paginator(&meta).into_string();
        assert!(html.contains("?page=1"));
        assert!(html.contains("?page=3"));
        assert!(html.contains("Страница 2 из 3"));
    }

    #[test]
    fn test_field_errors() {
        let html = field_errors(&["Обязательное поле.".to_string()]).into_string();
        assert_eq!(html, "<ul class=\"errorlist\"><li>Обязательное поле.</li></ul>");
    }
}
