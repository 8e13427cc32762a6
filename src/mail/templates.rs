//! HTML bodies for the handful of transactional emails the association sends.

pub fn password_reset(full_name: &str, reset_url: &str) -> String {
    format!(
        r#"<div style="display:flex; flex-direction:column; gap:10px;">
<p>Dear <span style="color:blue;">{full_name}</span>,</p>
<p>We received a request to reset the password for your account.</p>
<p style="margin-bottom:20px;">If you made this request, please click the link below to create a new password:</p>
<p>{reset_url}</p>
<p style="margin-top:20px;">If you did not request a password reset, you can safely ignore this email. Your account is still secure and no changes have been made.</p>
<p>Thank you,</p>
<p>UDASS</p>
</div>"#
    )
}

pub fn payment_request_received(full_name: &str, phone_used: &str) -> String {
    format!(
        r#"<div>
<h2>Request Received</h2>
<p>Dear {full_name},</p>
<p>We have received your payment details (Phone: {phone_used}).</p>
<p>An admin will verify it shortly.</p>
</div>"#
    )
}

pub fn admin_payment_notification(
    full_name: &str,
    reg_number: &str,
    phone_used: &str,
    transaction_id: &str,
) -> String {
    format!(
        r#"<div>
<h3>New Membership Payment</h3>
<p>User: {full_name} ({reg_number})</p>
<p>Phone: {phone_used}</p>
<p>Transaction ID: {transaction_id}</p>
<p>Please login to dashboard to approve.</p>
</div>"#
    )
}

pub fn membership_activated(full_name: &str, dashboard_url: &str) -> String {
    format!(
        r#"<div style="padding: 20px; text-align: center;">
<h1 style="color: green;">Membership Approved!</h1>
<p>Dear {full_name},</p>
<p>Your payment has been verified and your account is now <strong>ACTIVE</strong>.</p>
<p>You can now access the Dashboard, Announcements, and Events.</p>
<a href="{dashboard_url}" style="background: blue; color: white; padding: 10px 20px; text-decoration: none; border-radius: 5px;">Go to Dashboard</a>
</div>"#
    )
}
