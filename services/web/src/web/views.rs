//! services/web/src/web/views.rs
//!
//! Server-rendered HTML views. Each function maps a view-model to a page;
//! the shared layout renders whatever flash messages were drained for this
//! request. Everything user-supplied goes through `escape`.

use axum::response::Html;
use feedback_core::domain::{Feedback, FlashMessage, User};
use feedback_core::forms::{FeedbackInput, FieldErrors, LoginInput, RegisterInput};

/// Minimal HTML escaping for text and attribute values.
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn flash_list(flashes: &[FlashMessage]) -> String {
    flashes
        .iter()
        .map(|f| {
            format!(
                "  <p class=\"flash {}\">{}</p>\n",
                f.severity.as_str(),
                escape(&f.message)
            )
        })
        .collect()
}

fn layout(title: &str, flashes: &[FlashMessage], body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head><title>{}</title></head>\n<body>\n{}{}</body>\n</html>\n",
        escape(title),
        flash_list(flashes),
        body
    ))
}

fn field_error_list(errors: &FieldErrors, field: &str) -> String {
    errors
        .get(field)
        .iter()
        .map(|e| format!("  <p class=\"error\">{}</p>\n", escape(e)))
        .collect()
}

fn text_field(label: &str, name: &str, kind: &str, value: &str, errors: &FieldErrors) -> String {
    format!(
        "  <label for=\"{name}\">{label}</label>\n  <input type=\"{kind}\" id=\"{name}\" name=\"{name}\" value=\"{}\">\n{}",
        escape(value),
        field_error_list(errors, name)
    )
}

pub fn home_page(flashes: &[FlashMessage]) -> Html<String> {
    let body = "<h1>Feedback</h1>\n\
                <p><a href=\"/register\">Register</a> | <a href=\"/login\">Log in</a></p>\n";
    layout("Feedback", flashes, body)
}

pub fn register_page(
    input: &RegisterInput,
    errors: &FieldErrors,
    flashes: &[FlashMessage],
) -> Html<String> {
    let body = format!(
        "<h1>Register</h1>\n<form method=\"post\" action=\"/register\">\n{}{}{}{}{}  <button type=\"submit\">Register</button>\n</form>\n",
        text_field("Username", "username", "text", &input.username, errors),
        // Passwords are never echoed back into the form.
        text_field("Password", "password", "password", "", errors),
        text_field("Email", "email", "text", &input.email, errors),
        text_field("First name", "first_name", "text", &input.first_name, errors),
        text_field("Last name", "last_name", "text", &input.last_name, errors),
    );
    layout("Register", flashes, &body)
}

pub fn login_page(
    input: &LoginInput,
    errors: &FieldErrors,
    flashes: &[FlashMessage],
) -> Html<String> {
    let body = format!(
        "<h1>Log in</h1>\n<form method=\"post\" action=\"/login\">\n{}{}  <button type=\"submit\">Log in</button>\n</form>\n",
        text_field("Username", "username", "text", &input.username, errors),
        text_field("Password", "password", "password", "", errors),
    );
    layout("Log in", flashes, &body)
}

pub fn user_page(user: &User, feedback: &[Feedback], flashes: &[FlashMessage]) -> Html<String> {
    let items: String = feedback
        .iter()
        .map(|f| {
            format!(
                "  <li>\n    <b>{}</b>\n    <p>{}</p>\n    <a href=\"/feedback/{}/update\">Edit</a>\n    <form method=\"post\" action=\"/feedback/{}/delete\"><button type=\"submit\">Delete</button></form>\n  </li>\n",
                escape(&f.title),
                escape(&f.content),
                f.id,
                f.id,
            )
        })
        .collect();
    let body = format!(
        "<h1>{} {}</h1>\n<p>{} &lt;{}&gt;</p>\n<ul>\n{}</ul>\n<p><a href=\"/user/{}/feedback/add\">Add feedback</a></p>\n<form method=\"post\" action=\"/user/{}/delete\"><button type=\"submit\">Delete account</button></form>\n",
        escape(&user.first_name),
        escape(&user.last_name),
        escape(&user.username),
        escape(&user.email),
        items,
        escape(&user.username),
        escape(&user.username),
    );
    layout(&format!("{} {}", user.first_name, user.last_name), flashes, &body)
}

pub fn feedback_form_page(
    heading: &str,
    action: &str,
    input: &FeedbackInput,
    errors: &FieldErrors,
    flashes: &[FlashMessage],
) -> Html<String> {
    let body = format!(
        "<h1>{}</h1>\n<form method=\"post\" action=\"{}\">\n{}  <label for=\"content\">Content</label>\n  <textarea id=\"content\" name=\"content\">{}</textarea>\n{}  <button type=\"submit\">Save</button>\n</form>\n",
        escape(heading),
        escape(action),
        text_field("Title", "title", "text", &input.title, errors),
        escape(&input.content),
        field_error_list(errors, "content"),
    );
    layout(heading, flashes, &body)
}
