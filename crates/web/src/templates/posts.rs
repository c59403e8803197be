//! Post pages.

use maud::{Markup, html};
use yatube_common::Page;
use yatube_core::{CommentView, FieldErrors, PostForm, PostView};
use yatube_db::entities::{group, user};

use super::components::{field_errors, post_feed};
use super::layout::page;
use super::{display_name, format_date, linebreaks, profile_url};

/// Landing feed.
#[must_use]
pub fn index(viewer: Option<&user::Model>, posts: &Page<PostView>) -> Markup {
    page(
        "Последние обновления на сайте",
        viewer,
        html! {
            h1 { "Последние обновления на сайте" }
            (post_feed(posts, true))
        },
    )
}

/// Posts of one group.
#[must_use]
pub fn group_list(
    viewer: Option<&user::Model>,
    group: &group::Model,
    posts: &Page<PostView>,
) -> Markup {
    page(
        &format!("Записи сообщества {}", group.title),
        viewer,
        html! {
            h1 { (group.title) }
            p { (linebreaks(&group.description)) }
            (post_feed(posts, false))
        },
    )
}

/// What the profile page knows about the author.
#[derive(Debug, Clone)]
pub struct ProfileContext<'a> {
    pub author: &'a user::Model,
    pub posts: &'a Page<PostView>,
    /// Users following the author.
    pub followers: u64,
    /// Authors the author follows.
    pub following_count: u64,
    /// `None` hides the follow button (anonymous viewer or own profile).
    pub following: Option<bool>,
}

/// Author profile.
#[must_use]
pub fn profile(viewer: Option<&user::Model>, ctx: &ProfileContext<'_>) -> Markup {
    let name = display_name(ctx.author);
    let base = profile_url(&ctx.author.username);
    page(
        &format!("Профайл пользователя {name}"),
        viewer,
        html! {
            h1 { "Все посты пользователя " (name) }
            h3 { "Всего постов: " (ctx.posts.meta.count) }
            p {
                "Подписчиков: " (ctx.followers)
                " | Подписан: " (ctx.following_count)
            }
            @match ctx.following {
                Some(true) => {
                    a.button href={ (base) "unfollow/" } { "Отписаться" }
                }
                Some(false) => {
                    a.button href={ (base) "follow/" } { "Подписаться" }
                }
                None => {}
            }
            (post_feed(ctx.posts, true))
        },
    )
}

/// What the post page shows.
#[derive(Debug, Clone)]
pub struct DetailContext<'a> {
    pub post: &'a PostView,
    /// Total posts by the same author.
    pub author_posts: u64,
    pub comments: &'a [CommentView],
    /// Show the edit link.
    pub can_edit: bool,
}

/// A single post with its comments.
#[must_use]
pub fn post_detail(viewer: Option<&user::Model>, ctx: &DetailContext<'_>) -> Markup {
    let view = ctx.post;
    page(
        &format!("Пост {}", view.post),
        viewer,
        html! {
            aside {
                ul {
                    li { "Дата публикации: " (format_date(&view.post.created_at)) }
                    @if let Some(group) = &view.group {
                        li {
                            "Группа: " (group.title) " "
                            a href={ "/group/" (group.slug) "/" } { "все записи группы" }
                        }
                    }
                    li {
                        "Автор: "
                        a href=(profile_url(&view.author.username)) { (display_name(&view.author)) }
                    }
                    li { "Всего постов автора: " (ctx.author_posts) }
                }
            }
            article {
                @if let Some(url) = &view.image_url {
                    img.post-image src=(url) alt="";
                }
                p { (linebreaks(&view.post.text)) }
                @if ctx.can_edit {
                    a.button href={ "/posts/" (view.post.id) "/edit/" } { "редактировать запись" }
                }
            }
            section.comments {
                @if viewer.is_some() {
                    h5 { "Добавить комментарий:" }
                    form method="post" action={ "/posts/" (view.post.id) "/comment/" } {
                        textarea name="text" rows="3" required {}
                        button type="submit" { "Отправить" }
                    }
                }
                @for item in ctx.comments {
                    div.comment {
                        h5 {
                            a href=(profile_url(&item.author.username)) { (item.author.username) }
                        }
                        p { (linebreaks(&item.comment.text)) }
                    }
                }
            }
        },
    )
}

/// Create or edit form.
///
/// `post_id` is set when editing.
#[must_use]
pub fn post_form(
    viewer: Option<&user::Model>,
    form: &PostForm,
    errors: &FieldErrors,
    groups: &[group::Model],
    post_id: Option<&str>,
) -> Markup {
    let is_edit = post_id.is_some();
    let (title, action) = match post_id {
        Some(id) => ("Редактировать пост", format!("/posts/{id}/edit/")),
        None => ("Новый пост", "/create/".to_string()),
    };
    let selected = form.selected_group();

    page(
        title,
        viewer,
        html! {
            h1 { (title) }
            form method="post" enctype="multipart/form-data" action=(action) {
                (field_errors(errors.get("__all__")))
                label for="id_text" { "Текст поста" }
                textarea id="id_text" name="text" rows="10" required { (form.text) }
                (field_errors(errors.get("text")))
                small { "Текст нового поста" }

                label for="id_group" { "Группа" }
                select id="id_group" name="group" {
                    option value="" selected[selected.is_none()] { "---------" }
                    @for group in groups {
                        option value=(group.id) selected[selected == Some(group.id.as_str())] {
                            (group.title)
                        }
                    }
                }
                (field_errors(errors.get("group")))
                small { "Группа, к которой будет относиться пост" }

                label for="id_image" { "Картинка" }
                input id="id_image" type="file" name="image" accept="image/*";
                (field_errors(errors.get("image")))

                button type="submit" {
                    @if is_edit { "Сохранить" } @else { "Добавить" }
                }
            }
        },
    )
}

/// Posts of followed authors.
#[must_use]
pub fn follow_index(viewer: Option<&user::Model>, posts: &Page<PostView>) -> Markup {
    page(
        "Избранные авторы",
        viewer,
        html! {
            h1 { "Избранные авторы" }
            @if posts.is_empty() {
                p { "Вы пока ни на кого не подписаны." }
            }
            (post_feed(posts, true))
        },
    )
}
