use crate::app::App;
use crate::commands::prompts::ask_yes_no;
use crate::error::CliError;

pub async fn run_sync(app: &App) -> Result<(), CliError> {
    let cloud = app.cloud()?;
    if !cloud.tracker.is_authenticated() {
        return Err(CliError::NotSignedIn);
    }

    cloud
        .coordinator
        .request_manual_sync()
        .await
        .into_result()?;
    println!("Sync completed ({} item(s))", app.store.len());
    Ok(())
}

pub async fn run_wipe_remote(assume_yes: bool, app: &App) -> Result<(), CliError> {
    let cloud = app.cloud()?;
    if !cloud.tracker.is_authenticated() {
        return Err(CliError::NotSignedIn);
    }

    let confirmed = ask_yes_no(
        "Delete every item stored in your cloud account? Items on this device are kept.",
        assume_yes.then_some(true),
    )?;
    if !confirmed {
        println!("Nothing deleted");
        return Ok(());
    }

    let count = cloud.remote.delete_all().await?;
    println!("Deleted {count} cloud item(s)");
    Ok(())
}
