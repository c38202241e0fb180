use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use luminarch_core::Notifier;
use luminarch_hub::auth::{AuthApi, ProviderClient, SessionFile};
use luminarch_hub::cli::{Cli, Command, password_or_prompt};
use luminarch_hub::config::HubConfig;
use luminarch_hub::console::{ConsoleNotifier, ConsolePresenter};
use luminarch_hub::db::{self, PgApprovalStore, PgTicketStore};
use luminarch_hub::signup::SignUpNotifier;
use luminarch_hub::storage::BucketStorage;
use luminarch_platform_access::{Authenticator, SessionStore, SignUpOutcome, SignUpRequest};
use luminarch_portal::{DashboardController, DashboardState, PortalServices, SubmitOutcome};
use luminarch_ticket::PendingFile;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,luminarch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Load configuration from environment
    let config = HubConfig::from_env().expect("failed to load configuration");
    tracing::debug!("Loaded configuration");

    let http = reqwest::Client::builder()
        .timeout(config.http_timeout())
        .build()
        .expect("failed to build HTTP client");

    let client = Arc::new(ProviderClient::new(
        AuthApi::new(http.clone(), config.auth.clone()),
        SessionFile::new(&config.session_file),
    ));
    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier::stderr());

    match cli.command {
        Command::Login { email, password } => {
            let Some(password) = prompt_password(notifier.as_ref(), password, false) else {
                return ExitCode::FAILURE;
            };
            match client.sign_in_with_password(&email, &password).await {
                Ok(identity) => {
                    notifier.success(&format!("Signed in as {}.", identity.display_name()));
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::debug!(error = %e, "sign-in failed");
                    notifier.error(&e.current_context().user_message());
                    ExitCode::FAILURE
                }
            }
        }
        Command::MagicLink { email } => match client.send_magic_link(&email).await {
            Ok(()) => {
                notifier.success("Check your email for a sign-in link.");
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::debug!(error = %e, "magic link failed");
                notifier.error(&e.current_context().user_message());
                ExitCode::FAILURE
            }
        },
        Command::Signup {
            name,
            email,
            password,
        } => {
            let Some(password) = prompt_password(notifier.as_ref(), password, true) else {
                return ExitCode::FAILURE;
            };
            let request = SignUpRequest::new(&name, &email, password);
            match client.sign_up(&request).await {
                Ok(outcome) => {
                    if let Some(endpoint) = &config.signup_webhook_url {
                        SignUpNotifier::new(http.clone(), endpoint)
                            .notify(&request.full_name, &request.email)
                            .await;
                    }
                    match outcome {
                        SignUpOutcome::SignedIn(_) => notifier.success(
                            "Account created. An administrator will approve it shortly.",
                        ),
                        SignUpOutcome::ConfirmationRequired => notifier
                            .success("Account created! Check your email to confirm, then sign in."),
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::debug!(error = %e, "sign-up failed");
                    notifier.error(&e.current_context().user_message());
                    ExitCode::FAILURE
                }
            }
        }
        Command::Logout => match client.sign_out().await {
            Ok(()) => {
                notifier.success("Signed out.");
                ExitCode::SUCCESS
            }
            Err(e) => {
                tracing::warn!(error = %e, "sign-out failed");
                notifier.error(&e.current_context().user_message());
                ExitCode::FAILURE
            }
        },
        command => {
            let pool = db::connect(&config.database_url)
                .await
                .expect("failed to connect to database");

            let storage = Arc::new(BucketStorage::new(
                http.clone(),
                config.auth.url(),
                config.auth.anon_key(),
                &config.storage.bucket,
                client.clone(),
            ));
            let tickets = Arc::new(PgTicketStore::new(pool.clone()));
            let controller = DashboardController::new(PortalServices {
                sessions: client.clone(),
                approvals: Arc::new(PgApprovalStore::new(pool)),
                tickets,
                storage,
                notifier: notifier.clone(),
                presenter: Arc::new(ConsolePresenter::stdout()),
            })
            .with_signed_url_ttl(config.storage.signed_url_ttl());

            run_dashboard(&controller, client.as_ref(), notifier.as_ref(), command).await
        }
    }
}

/// Runs a command that needs the dashboard.
async fn run_dashboard(
    controller: &DashboardController,
    sessions: &dyn SessionStore,
    notifier: &dyn Notifier,
    command: Command,
) -> ExitCode {
    let draft = command.draft();
    match command {
        Command::Dashboard { follow: true } => {
            tokio::select! {
                () = controller.run(sessions.subscribe()) => {}
                _ = tokio::signal::ctrl_c() => tracing::debug!("interrupted"),
            }
            return ExitCode::SUCCESS;
        }
        Command::Dashboard { follow: false } => {
            controller.start().await;
            return exit_for(controller.state() != DashboardState::Unauthenticated);
        }
        _ => controller.start().await,
    }

    if controller.state() != DashboardState::Active {
        return ExitCode::FAILURE;
    }

    match command {
        Command::Submit { files, .. } => {
            let Some(staged) = stage_files(&files, notifier).await else {
                return ExitCode::FAILURE;
            };
            // Oversized files are reported by the controller and left out;
            // the ticket is still submitted with the rest.
            controller.add_files(staged);
            let all_staged = controller.pending_files().len() == files.len();

            let Some(draft) = draft else {
                return ExitCode::FAILURE;
            };
            match controller.submit_ticket(&draft).await {
                SubmitOutcome::Submitted { uploads, .. } => {
                    exit_for(all_staged && uploads.failures() == 0)
                }
                _ => ExitCode::FAILURE,
            }
        }
        Command::Download { attachment_id } => {
            let Some(attachment) = controller
                .feed()
                .and_then(|feed| feed.attachment(&attachment_id).cloned())
            else {
                notifier.error(&format!("No attachment {attachment_id} on your requests."));
                return ExitCode::FAILURE;
            };
            match controller.download_link(&attachment).await {
                Some(url) => {
                    println!("{url}");
                    ExitCode::SUCCESS
                }
                None => ExitCode::FAILURE,
            }
        }
        _ => ExitCode::SUCCESS,
    }
}

/// Stages files from disk, reporting the first one that cannot be read.
async fn stage_files(paths: &[PathBuf], notifier: &dyn Notifier) -> Option<Vec<PendingFile>> {
    let mut staged = Vec::with_capacity(paths.len());
    for path in paths {
        match PendingFile::from_path(path).await {
            Ok(file) => staged.push(file),
            Err(e) => {
                notifier.error(&format!(
                    "Could not read {}: {}",
                    path.display(),
                    e.current_context()
                ));
                return None;
            }
        }
    }
    Some(staged)
}

fn exit_for(ok: bool) -> ExitCode {
    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn prompt_password(
    notifier: &dyn Notifier,
    password: Option<String>,
    confirm: bool,
) -> Option<String> {
    match password_or_prompt(password, confirm) {
        Ok(password) => Some(password),
        Err(e) => {
            tracing::debug!(error = %e, "password prompt failed");
            notifier.error("Could not read password.");
            None
        }
    }
}
