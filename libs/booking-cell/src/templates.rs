//! HTML bodies for booking emails.

const STYLE: &str = "body { font-family: Arial, sans-serif; background-color: #f2f4f7; margin: 0; padding: 30px; } \
.card { max-width: 480px; margin: 0 auto; background: #ffffff; border-radius: 12px; padding: 30px 20px; } \
p { color: #555; line-height: 1.6; }";

fn wrap(title: &str, content: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"UTF-8\" />\n<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<div class=\"card\">\n<h2>{title}</h2>\n{content}\n</div>\n</body>\n</html>\n"
    )
}

/// Minimal escaping for user-supplied values placed into the templates.
fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub fn booking_email(patient: &str, day: &str, slot: &str) -> String {
    wrap(
        "New Booking",
        &format!(
            "<p><strong>{}</strong> booked an appointment with you.</p>\n<p>Date: <strong>{}</strong><br/>Time: <strong>{}</strong></p>",
            escape(patient),
            escape(day),
            escape(slot)
        ),
    )
}

pub fn refund_confirmation_email(patient: &str, amount: i64, currency: &str, refund_id: &str) -> String {
    wrap(
        "Refund Confirmation",
        &format!(
            "<p>Hi {}, your booking was cancelled and a refund has been issued.</p>\n<p>Amount: <strong>{:.2} {}</strong><br/>Refund ID: {}</p>",
            escape(patient),
            amount as f64 / 100.0,
            escape(&currency.to_uppercase()),
            escape(refund_id)
        ),
    )
}

pub fn cancel_booking_email(patient: &str, day: &str, slot: &str) -> String {
    wrap(
        "Booking Cancelled",
        &format!(
            "<p><strong>{}</strong> cancelled the appointment on <strong>{}</strong> at <strong>{}</strong>.</p>\n<p>The slot is open again.</p>",
            escape(patient),
            escape(day),
            escape(slot)
        ),
    )
}
