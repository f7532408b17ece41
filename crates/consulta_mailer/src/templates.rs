//! Plain-text and HTML bodies for the three reminder emails.

use consulta_common::services::ReminderMessage;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

fn lead_phrase(tag: &str) -> &'static str {
    match tag {
        "72h" => "in three days",
        "24h" => "tomorrow",
        "1h" => "in one hour",
        _ => "soon",
    }
}

/// Minimal escaping for values interpolated into the HTML body.
fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn render_reminder(message: &ReminderMessage) -> RenderedEmail {
    let when = lead_phrase(&message.lead_time_tag);
    let greeting = match &message.to_name {
        Some(name) if !name.trim().is_empty() => format!("Hello {}", name.trim()),
        _ => "Hello".to_string(),
    };

    let subject = format!(
        "Reminder: your {} session {} ({} {})",
        message.plan_name, when, message.date, message.time
    );

    let mut text = format!(
        "{},\n\nyour {} session starts {}: {} at {} ({}), {} minutes.\n",
        greeting,
        message.plan_name,
        when,
        message.date,
        message.time,
        message.time_zone,
        message.duration_minutes
    );
    if let Some(url) = &message.join_url {
        text.push_str(&format!("\nJoin the meeting: {}\n", url));
    }

    let mut html = format!(
        "<p>{},</p><p>your <strong>{}</strong> session starts {}: {} at {} ({}), {} minutes.</p>",
        escape_html(&greeting),
        escape_html(&message.plan_name),
        when,
        escape_html(&message.date),
        escape_html(&message.time),
        escape_html(&message.time_zone),
        message.duration_minutes
    );
    if let Some(url) = &message.join_url {
        let url = escape_html(url);
        html.push_str(&format!("<p><a href=\"{url}\">Join the meeting</a></p>"));
    }

    RenderedEmail {
        subject,
        text,
        html,
    }
}
