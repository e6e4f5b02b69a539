//! Outlook on the web.

use mailhands_protocols::Field;

use super::ProviderInfo;

pub(super) const INFO: ProviderInfo = ProviderInfo {
    name: "outlook",
    display_name: "Outlook Web",
    base_url: "https://outlook.live.com",
    authenticated_host: "outlook.live.com",
    login_markers: &["login.live.com", "signin"],
    blocked_markers: &["unusual activity"],
};

pub(super) const LOCATORS: &[(Field, &[&str])] = &[
    (
        Field::Compose,
        &[
            "testid:new-mail-button",
            "css:button[aria-label*='New mail']",
            "css:button[aria-label*='New message']",
            "css:[data-app-section='ComposeButton']",
            "css:.o365button[title*='mail']",
            "css:.ms-Button--primary",
        ],
    ),
    (
        Field::Recipient,
        &[
            "css:input[aria-label*='To']",
            "css:input[placeholder*='To']",
            "testid:to-input",
            "css:.ms-BasePicker-input",
            "css:div[data-testid='to-picker'] input",
        ],
    ),
    (
        Field::Subject,
        &[
            "css:input[aria-label*='Subject']",
            "css:input[placeholder*='Subject']",
            "testid:subject-input",
            "css:.ms-TextField-field[aria-label*='Subject']",
        ],
    ),
    (
        Field::Body,
        &[
            "css:div[role='textbox'][aria-label*='Message body']",
            "css:div[role='textbox'][aria-label*='message body']",
            "css:div[contenteditable='true'][aria-label*='body']",
            "css:.ms-Editor-editor",
            "testid:message-body",
        ],
    ),
    (
        Field::Send,
        &[
            "testid:send-button",
            "css:button[aria-label*='Send']",
            "css:button[title*='Send']",
            "css:.ms-Button--primary",
        ],
    ),
];

/// Containers holding accepted recipient chips in the compose form.
pub(super) const RECIPIENT_READBACK: &[&str] = &[
    "css:div[aria-label='To']",
    "testid:to-picker",
    "css:.ms-BasePicker-text",
];
