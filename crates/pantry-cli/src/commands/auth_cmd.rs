use pantry_core::auth::AuthEvent;

use crate::app::{App, Cloud};
use crate::cli::AuthCommands;
use crate::commands::prompts::resolve_pending_prompt;
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, app: &App) -> Result<(), CliError> {
    let cloud = app.cloud()?;

    match command {
        AuthCommands::Login {
            email,
            password,
            answer,
        } => {
            let session = cloud.auth_client.sign_in(&email, &password).await?;
            let email_label = session.user.email.clone();
            let events = cloud.tracker.sign_in(session);
            println!(
                "Signed in as {}",
                email_label.as_deref().unwrap_or("(no email)")
            );
            handle_transitions(cloud, &events, app, answer.preset()).await
        }
        AuthCommands::Status => {
            match cloud.tracker.current_session() {
                Some(session) => {
                    let email_label = session.user.email.as_deref().unwrap_or("(no email)");
                    println!(
                        "Signed in as {} (expires_at={})",
                        email_label, session.expires_at
                    );
                }
                None => println!("Not signed in."),
            }
            println!("{} item(s) on this device", app.store.len());
            Ok(())
        }
        AuthCommands::Logout { answer } => {
            let Some(session) = cloud.tracker.current_session() else {
                println!("Not signed in.");
                return Ok(());
            };
            cloud.auth_client.sign_out(&session.access_token).await?;
            let events = cloud.tracker.sign_out();
            println!("Signed out");
            handle_transitions(cloud, &events, app, answer.preset()).await
        }
    }
}

/// Feed auth transitions to the coordinator, then settle any prompt it raised.
async fn handle_transitions(
    cloud: &Cloud,
    events: &[AuthEvent],
    app: &App,
    preset: Option<bool>,
) -> Result<(), CliError> {
    for event in events {
        cloud
            .coordinator
            .handle_auth_event(event)
            .await
            .into_result()?;
    }

    if events.iter().any(|event| matches!(event, AuthEvent::LoggedIn(_)))
        && cloud.coordinator.pending_prompt().is_none()
    {
        println!("{} item(s) pulled from the cloud", app.store.len());
    }

    resolve_pending_prompt(&cloud.coordinator, app.store.len(), preset).await
}
