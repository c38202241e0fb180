//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dialoguer::Password;
use luminarch_ticket::{Priority, TicketDraft};

#[derive(Parser, Debug)]
#[command(name = "luminarch-hub", version, about = "Luminarch client hub")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in with email and password.
    ///
    /// The password is prompted for, without echo, when `--password` is omitted.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
    },

    /// Email a one-time sign-in link.
    #[command(name = "magic-link")]
    MagicLink {
        #[arg(long)]
        email: String,
    },

    /// Create an account. New accounts wait for approval.
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
    },

    /// Sign out and forget the stored session.
    Logout,

    /// Show the dashboard.
    Dashboard {
        /// Keep running and follow session changes until Ctrl-C.
        #[arg(long)]
        follow: bool,
    },

    /// Submit a new request, optionally with attachments.
    Submit {
        /// content_update, design_change, bug_report or other
        #[arg(long = "type")]
        request_type: String,
        #[arg(long)]
        subject: String,
        #[arg(long)]
        description: String,
        /// Page the request is about.
        #[arg(long, default_value = "")]
        url: String,
        #[arg(long)]
        urgent: bool,
        /// File to attach; repeat for several.
        #[arg(long = "file")]
        files: Vec<PathBuf>,
    },

    /// Print a short-lived download link for an attachment.
    Download {
        /// Attachment id as shown on the dashboard.
        attachment_id: String,
    },
}

impl Command {
    /// The draft a `submit` invocation describes.
    #[must_use]
    pub fn draft(&self) -> Option<TicketDraft> {
        match self {
            Self::Submit {
                request_type,
                subject,
                description,
                url,
                urgent,
                ..
            } => Some(TicketDraft {
                request_type: request_type.clone(),
                subject: subject.clone(),
                description: description.clone(),
                website_url: url.clone(),
                priority: if *urgent {
                    Priority::Urgent
                } else {
                    Priority::Normal
                },
            }),
            _ => None,
        }
    }
}

/// Returns the given password, or prompts for one on the terminal.
///
/// With `confirm`, the prompt asks twice and repeats until both entries match.
///
/// # Errors
///
/// Returns the prompt's error if the terminal cannot be read.
pub fn password_or_prompt(
    password: Option<String>,
    confirm: bool,
) -> Result<String, dialoguer::Error> {
    if let Some(password) = password {
        return Ok(password);
    }
    let prompt = Password::new().with_prompt("Password");
    if confirm {
        prompt
            .with_confirmation("Password (again)", "Passwords do not match")
            .interact()
    } else {
        prompt.interact()
    }
}
