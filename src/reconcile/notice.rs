//! Failure notices sent to the PMF requestor.

use std::fmt;

use crate::ports::Notification;

/// Why a new draft could not be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The snapshot is no longer the approved head and the head has no PMF.
    DraftMayExist,
    /// A required artwork field is empty on the approved version.
    MissingRequiredFields,
    /// The vault refused the new version, with its message when it gave one.
    Unknown(Option<String>),
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DraftMayExist => {
                f.write_str("A new Draft version may already have been created.")
            }
            Self::MissingRequiredFields => {
                f.write_str("Possible missing required fields in Approved version.")
            }
            Self::Unknown(None) => f.write_str("Unknown."),
            Self::Unknown(Some(message)) => write!(f, "Unknown. {message}"),
        }
    }
}

/// Everything a failure notice says about one artwork document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureNotice {
    /// Artwork document number.
    pub document_number: String,
    /// Vault UI link to the snapshot version.
    pub document_url: String,
    /// Display name of the PMF.
    pub pmf_name: String,
    /// What went wrong.
    pub reason: FailureReason,
}

impl FailureNotice {
    /// Subject line of the notice.
    #[must_use]
    pub fn subject(&self) -> String {
        format!("Failed to create new draft version of Artwork Document {}", self.document_number)
    }

    /// HTML body of the notice.
    #[must_use]
    pub fn html_body(&self) -> String {
        format!(
            "The PMF application was unable to create a new Draft version of {} for <b>{}</b>.\
             <br /><br /><b>Reason: </b>{}\
             <br /><br />Contact the system administrator for assistance.",
            anchor_blank(&self.document_url, &escape(&self.document_number)),
            escape(&self.pmf_name),
            escape(&self.reason.to_string()),
        )
    }

    /// The notice addressed to `recipients`.
    #[must_use]
    pub fn to_notification(&self, recipients: Vec<String>) -> Notification {
        Notification { recipients, subject: self.subject(), html_body: self.html_body() }
    }
}

/// An anchor opening `url` in a new tab.
#[must_use]
pub fn anchor_blank(url: &str, text: &str) -> String {
    format!("<a href=\"{}\" target=\"_blank\">{text}</a>", escape(url))
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notice(reason: FailureReason) -> FailureNotice {
        FailureNotice {
            document_number: "ART-0042".into(),
            document_url: "https://acme.veevavault.com/ui/#doc_info/D1/2/0".into(),
            pmf_name: "PMF-0007".into(),
            reason,
        }
    }

    #[test]
    fn subject_names_the_document() {
        assert_eq!(
            notice(FailureReason::Unknown(None)).subject(),
            "Failed to create new draft version of Artwork Document ART-0042"
        );
    }

    #[test]
    fn body_links_document_and_states_reason() {
        let body = notice(FailureReason::MissingRequiredFields).html_body();
        assert!(body.contains(
            "<a href=\"https://acme.veevavault.com/ui/#doc_info/D1/2/0\" \
             target=\"_blank\">ART-0042</a>"
        ));
        assert!(body.contains("<b>PMF-0007</b>"));
        assert!(body
            .contains("<b>Reason: </b>Possible missing required fields in Approved version."));
        assert!(body.ends_with("Contact the system administrator for assistance."));
    }

    #[test]
    fn unknown_reason_carries_vault_message() {
        assert_eq!(FailureReason::Unknown(None).to_string(), "Unknown.");
        assert_eq!(
            FailureReason::Unknown(Some("INVALID_DATA: barcode".into())).to_string(),
            "Unknown. INVALID_DATA: barcode"
        );
        assert_eq!(
            FailureReason::DraftMayExist.to_string(),
            "A new Draft version may already have been created."
        );
    }

    #[test]
    fn markup_in_names_is_escaped() {
        let mut n = notice(FailureReason::Unknown(None));
        n.pmf_name = "<script>".into();
        assert!(n.html_body().contains("<b>&lt;script&gt;</b>"));
    }
}
