use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::model::MeetingInfo;


const JOIN_LINK_ANCHOR: &str = r#"a[id="meet_invite_block.action.join_link"]"#;
const MEETING_ID_LABEL: &str = "Meeting ID:";
const PASSCODE_LABEL: &str = "Passcode:";

static THREAD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("19%3ameeting_([^%]+)")
        .expect("failed to compile thread pattern")
});
static TENANT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"context=%7b%22Tid%22%3a%22([^%"]+)%22"#)
        .expect("failed to compile tenant pattern")
});
static ORGANIZER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"%22Oid%22%3a%22([^%"]+)%22"#)
        .expect("failed to compile organizer pattern")
});
static DECODED_MEETING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("19:meeting_([^@]+)")
        .expect("failed to compile meeting pattern")
});


/// A Teams invitation as rendered by Outlook, with placeholder identifiers.
pub const SAMPLE_INVITATION_HTML: &str = r##"<html>
<head>
<meta http-equiv="Content-Type" content="text/html; charset=utf-8">
</head>
<body>
Dear User, You have been invited to a Microsoft Teams meeting. Please join using the link below.
<br>
<div class="me-email-text" lang="en-US" style="max-width:1024px; color:#242424; font-family:'Segoe UI','Helvetica Neue',Helvetica,Arial,sans-serif">
<div aria-hidden="true" style="margin-bottom:24px; overflow:hidden; white-space:nowrap">
________________________________________________________________________________</div>
<div style="margin-bottom:12px"><span class="me-email-text" style="font-size:24px; font-weight:700; margin-right:12px">Microsoft Teams</span>
<a href="https://aka.ms/JoinTeamsMeeting?omkt=en-US" id="meet_invite_block.action.help" class="me-email-link" style="font-size:14px; text-decoration:underline; color:#5B5FC7">
Need help?</a> </div>
<div style="margin-bottom:6px"><a href="https://teams.microsoft.com/l/meetup-join/19%3ameeting_EXAMPLE_MEETING_ID%40thread.v2/0?context=%7b%22Tid%22%3a%22YOUR_TENANT_ID%22%2c%22Oid%22%3a%22YOUR_ORGANIZER_ID%22%7d" id="meet_invite_block.action.join_link" title="Meeting join link" class="me-email-headline" style="font-size:20px; font-weight:600; text-decoration:underline; color:#5B5FC7">Join
 the meeting now</a> </div>
<div style="margin-bottom:6px"><span class="me-email-text-secondary" style="font-size:14px; color:#616161">Meeting ID:
</span><span class="me-email-text" style="font-size:14px; color:#242424">123 456 789 012 34</span>
</div>
<div style="margin-bottom:32px"><span class="me-email-text-secondary" style="font-size:14px; color:#616161">Passcode:
</span><span class="me-email-text" style="font-size:14px; color:#242424">EXAMPLE</span>
</div>
<div style="margin-bottom:12px; max-width:1024px">
<hr style="border:0; background:#616161; height:1px">
</div>
<div><span class="me-email-text-secondary" style="font-size:14px; color:#616161">For organizers:
</span><a href="https://teams.microsoft.com/meetingOptions/?organizerId=YOUR_ORGANIZER_ID&amp;tenantId=YOUR_TENANT_ID&amp;threadId=19_meeting_EXAMPLE_MEETING_ID@thread.v2&amp;messageId=0&amp;language=en-US" id="meet_invite_block.action.organizer_meet_options" class="me-email-link" style="font-size:14px; text-decoration:underline; color:#5B5FC7">Meeting
 options</a> </div>
<div style="margin-top:24px; margin-bottom:6px"></div>
<div style="margin-bottom:24px"></div>
<div aria-hidden="true" style="margin-bottom:24px; overflow:hidden; white-space:nowrap">
________________________________________________________________________________</div>
</div>
</body>
</html>"##;


/// Identifiers carried by a still-encoded join link.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct JoinLinkIds {
    pub thread_id: Option<String>,
    pub tenant_id: Option<String>,
    pub organizer_id: Option<String>,
}


fn gimme_selector(css: &str) -> Selector {
    Selector::parse(css)
        .expect("failed to parse CSS selector")
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect()
}

fn own_text_contains(element: &ElementRef<'_>, needle: &str) -> bool {
    element.children()
        .filter_map(|child| child.value().as_text())
        .any(|text| text.contains(needle))
}

/// Finds the first `span` whose own text contains `label` and returns the
/// text of the next sibling `span`.
fn labelled_span_text(document: &Html, label: &str) -> Option<String> {
    let span_selector = gimme_selector("span");
    let label_span = document.select(&span_selector)
        .find(|span| own_text_contains(span, label))?;
    label_span.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| sibling.value().name() == "span")
        .map(|value_span| element_text(&value_span))
}

fn first_capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_owned())
}


/// Pulls thread, tenant and organizer identifiers out of a join link.
///
/// Matching happens against the link exactly as it appears in the email, i.e.
/// still percent-encoded.
pub fn parse_join_link(join_link: &str) -> JoinLinkIds {
    JoinLinkIds {
        thread_id: first_capture(&THREAD_RE, join_link)
            .map(|opaque| format!("19:meeting_{}", opaque)),
        tenant_id: first_capture(&TENANT_RE, join_link),
        organizer_id: first_capture(&ORGANIZER_RE, join_link),
    }
}


/// Extracts meeting details from the HTML body of a Teams invitation.
///
/// Never fails; anything that cannot be found stays `None`.
pub fn extract_meeting_info(html_body: &str) -> MeetingInfo {
    let document = Html::parse_document(html_body);
    let mut info = MeetingInfo::default();

    info.meeting_id = labelled_span_text(&document, MEETING_ID_LABEL)
        .map(|text| text.chars().filter(|c| !c.is_whitespace()).collect());
    info.passcode = labelled_span_text(&document, PASSCODE_LABEL)
        .map(|text| text.trim().to_owned());

    let anchor_selector = gimme_selector(JOIN_LINK_ANCHOR);
    info.join_link = document.select(&anchor_selector)
        .next()
        .and_then(|anchor| anchor.value().attr("href"))
        .map(|href| href.to_owned());

    if let Some(join_link) = info.join_link.as_deref() {
        let ids = parse_join_link(join_link);
        info.thread_id = ids.thread_id;
        info.tenant_id = ids.tenant_id;
        info.organizer_id = ids.organizer_id;
    }

    info
}


/// Percent-decodes a join URL and returns the `19:meeting_...` identifier up
/// to the `@` that starts the thread suffix.
pub fn extract_meeting_id_from_url(join_url: &str) -> Option<String> {
    let decoded_bytes = urlencoding::decode_binary(join_url.as_bytes());
    let decoded = String::from_utf8_lossy(&decoded_bytes);
    first_capture(&DECODED_MEETING_RE, &decoded)
        .map(|opaque| format!("19:meeting_{}", opaque))
}
