//! Owner notification templates.
//!
//! Each template renders an HTML body (user-provided text escaped) and a
//! plain-text alternative.

use std::fmt::Write;

use chrono::{DateTime, Utc};

use super::Notification;
use crate::types::{IssueNumber, RepoId};

const FOOTER: &str = "This is an automated notification from repo-steward.";

/// Escapes text for inclusion in HTML element content or attribute values.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Renders the shared HTML frame around a list of labeled rows.
fn html_page(heading: &str, accent: &str, intro: &str, rows: &[(&str, String)], link: Option<(&str, &str)>) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<html><body style=\"font-family: Arial, sans-serif; line-height: 1.6; color: #333;\">\
         <h2 style=\"color: {accent};\">{heading}</h2><p>{intro}</p>\
         <div style=\"background-color: #f6f8fa; padding: 15px; border-radius: 5px; margin: 20px 0;\">"
    );
    for (label, value) in rows {
        let _ = write!(html, "<p><strong>{label}:</strong> {value}</p>");
    }
    html.push_str("</div>");
    if let Some((text, url)) = link {
        let _ = write!(
            html,
            "<p><a href=\"{}\" style=\"background-color: #0366d6; color: white; padding: 10px 20px; \
             text-decoration: none; border-radius: 5px; display: inline-block;\">{text}</a></p>",
            escape_html(url)
        );
    }
    let _ = write!(
        html,
        "<hr style=\"margin: 30px 0; border: none; border-top: 1px solid #e1e4e8;\">\
         <p style=\"color: #586069; font-size: 12px;\">{FOOTER}</p></body></html>"
    );
    html
}

fn text_page(heading: &str, rows: &[(&str, String)], link: Option<(&str, &str)>) -> String {
    let mut text = format!("{heading}\n\n");
    for (label, value) in rows {
        let _ = writeln!(text, "{label}: {value}");
    }
    if let Some((label, url)) = link {
        let _ = writeln!(text, "\n{label}: {url}");
    }
    let _ = write!(text, "\n---\n{FOOTER}\n");
    text
}

/// Issue assignment decided by arbitration.
pub fn issue_assignment(
    repo: &RepoId,
    issue: IssueNumber,
    title: &str,
    assignee: &str,
    declined: &[String],
    url: &str,
    at: DateTime<Utc>,
) -> Notification {
    let declined_text = if declined.is_empty() {
        "none".to_string()
    } else {
        declined
            .iter()
            .map(|u| format!("@{u}"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    let html_rows = [
        ("Repository", escape_html(&repo.to_string())),
        ("Issue", format!("{issue} - {}", escape_html(title))),
        ("Assigned to", format!("@{}", escape_html(assignee))),
        ("Other candidates", escape_html(&declined_text)),
        ("Time", timestamp(at)),
    ];
    let text_rows = [
        ("Repository", repo.to_string()),
        ("Issue", format!("{issue} - {title}")),
        ("Assigned to", format!("@{assignee}")),
        ("Other candidates", declined_text.clone()),
        ("Time", timestamp(at)),
    ];

    Notification {
        subject: format!("Issue {issue} assigned to {assignee}"),
        html: html_page(
            "Issue Assignment Notification",
            "#0366d6",
            "An issue has been automatically assigned in your repository.",
            &html_rows,
            Some(("View Issue", url)),
        ),
        text: Some(text_page(
            "Issue Assignment Notification",
            &text_rows,
            Some(("View issue", url)),
        )),
    }
}

/// Pull request activity (opened, review requested, merged, question asked).
pub fn pull_request_activity(
    repo: &RepoId,
    pr: IssueNumber,
    title: &str,
    activity: &str,
    details: &str,
    url: &str,
    at: DateTime<Utc>,
) -> Notification {
    let html_rows = [
        ("Repository", escape_html(&repo.to_string())),
        ("Pull Request", format!("{pr} - {}", escape_html(title))),
        ("Activity", escape_html(activity)),
        ("Details", escape_html(details)),
        ("Time", timestamp(at)),
    ];
    let text_rows = [
        ("Repository", repo.to_string()),
        ("Pull Request", format!("{pr} - {title}")),
        ("Activity", activity.to_string()),
        ("Details", details.to_string()),
        ("Time", timestamp(at)),
    ];

    Notification {
        subject: format!("PR {pr}: {activity}"),
        html: html_page(
            "Pull Request Activity",
            "#0366d6",
            "New activity detected on a pull request in your repository.",
            &html_rows,
            Some(("View Pull Request", url)),
        ),
        text: Some(text_page(
            "Pull Request Activity",
            &text_rows,
            Some(("View pull request", url)),
        )),
    }
}

/// An unhandled failure while processing a delivery.
pub fn error_report(error_type: &str, details: &str, at: DateTime<Utc>) -> Notification {
    let html_rows = [
        ("Error Type", escape_html(error_type)),
        (
            "Details",
            format!(
                "<pre style=\"background-color: #fff; padding: 10px; border-radius: 3px;\">{}</pre>",
                escape_html(details)
            ),
        ),
        ("Time", timestamp(at)),
    ];
    let text_rows = [
        ("Error Type", error_type.to_string()),
        ("Details", details.to_string()),
        ("Time", timestamp(at)),
    ];

    Notification {
        subject: format!("repo-steward error: {error_type}"),
        html: html_page(
            "Error Notification",
            "#d73a49",
            "An error occurred while processing a webhook delivery.",
            &html_rows,
            None,
        ),
        text: Some(text_page("Error Notification", &text_rows, None)),
    }
}
