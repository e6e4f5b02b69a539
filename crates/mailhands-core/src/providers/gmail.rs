//! Gmail web client.

use mailhands_protocols::Field;

use super::ProviderInfo;

pub(super) const INFO: ProviderInfo = ProviderInfo {
    name: "gmail",
    display_name: "Gmail Web",
    base_url: "https://mail.google.com",
    authenticated_host: "mail.google.com",
    login_markers: &["accounts.google.com", "signin"],
    blocked_markers: &["this browser or app may not be secure"],
};

pub(super) const LOCATORS: &[(Field, &[&str])] = &[
    (
        Field::Compose,
        &[
            "css:div[gh='cm']",
            "css:div[role='button'][gh='cm']",
            "css:.T-I.T-I-KE.L3",
            "css:[data-tooltip='Compose']",
            "css:.z0>.L3",
        ],
    ),
    (
        Field::Recipient,
        &[
            "css:input[peoplekit-id*='to']",
            "css:input[name='to']",
            "css:textarea[name='to']",
            "css:div[data-hovercard-id*='to'] input",
            "css:.wO.nr input",
        ],
    ),
    (
        Field::Subject,
        &[
            "css:input[name='subjectbox']",
            "css:input[placeholder*='Subject']",
            "css:.aoT input",
        ],
    ),
    (
        Field::Body,
        &[
            "css:div[role='textbox'][aria-label*='Message Body']",
            "css:div[role='textbox'][aria-label*='Message body']",
            "css:div[contenteditable='true'][role='textbox']",
            "css:.Am.Al.editable",
        ],
    ),
    (
        Field::Send,
        &[
            "css:div[role='button'][data-tooltip='Send']",
            "css:div[role='button'][aria-label*='Send']",
            "css:.T-I.J-J5-Ji.aoO.v7.T-I-atl.L3",
            "label:Send",
            "css:div[data-tooltip='Send']",
        ],
    ),
];

/// Containers holding accepted recipient chips in the compose form.
pub(super) const RECIPIENT_READBACK: &[&str] = &[
    "css:div[name='to']",
    "css:div[aria-label^='To'][role='listbox']",
    "css:.wO.nr",
];
