//! Admin notification for new sign-ups.

use chrono::{DateTime, Utc};
use tracing::{debug, instrument, warn};

/// Posts a form to an inbox endpoint whenever someone registers.
///
/// Delivery is best effort: a failure is logged and never reaches the user,
/// whose sign-up already succeeded.
#[derive(Clone)]
pub struct SignUpNotifier {
    http: reqwest::Client,
    endpoint: String,
}

impl SignUpNotifier {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
        }
    }

    fn form(name: &str, email: &str, at: DateTime<Utc>) -> [(&'static str, String); 4] {
        let message = format!(
            "New Client Hub registration:\n\n\
             Name: {name}\nEmail: {email}\nTime: {}\n\n\
             This user needs approval before they can submit tickets.",
            at.format("%Y-%m-%d %H:%M UTC")
        );
        [
            ("name", "[Client Hub] New Sign-Up".to_string()),
            ("email", email.to_string()),
            ("message", message),
            ("_subject", format!("New Client Hub Sign-Up: {name}")),
        ]
    }

    #[instrument(skip(self))]
    pub async fn notify(&self, name: &str, email: &str) {
        let form = Self::form(name, email, Utc::now());
        match self.http.post(&self.endpoint).form(&form).send().await {
            Ok(response) if response.status().is_success() => {
                debug!("sign-up notification delivered");
            }
            Ok(response) => {
                warn!(status = %response.status(), "sign-up notification rejected");
            }
            Err(e) => warn!(error = %e, "sign-up notification failed"),
        }
    }
}
