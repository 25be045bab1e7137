use std::{path::PathBuf, time::Duration};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, AppController, AuthError, ClientSettings, FormKind, SettingsOverrides,
};
use serde::Serialize;
use shared::{
    domain::{AccountId, ApiLayout},
    protocol::{NewAccount, NewCourse},
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod shell;

#[derive(Parser, Debug)]
#[command(name = "plagcheck", about = "Account client for the plagiarism checker")]
struct Cli {
    /// Settings file; `plagcheck.toml` in the working directory is used when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// `professors` or `instructors`.
    #[arg(long, global = true)]
    layout: Option<ApiLayout>,
    #[arg(long, global = true)]
    logout_delay_ms: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    ListAccounts,
    CreateAccount {
        username: String,
        password: String,
        first_name: String,
        last_name: String,
        #[arg(long)]
        email: Option<String>,
    },
    DeleteAccount {
        username: String,
    },
    ShowProfile {
        username: String,
    },
    ListCourses,
    CreateCourse {
        code: String,
        name: String,
        professor_id: i64,
    },
    CoursesFor {
        professor_id: i64,
    },
    SignIn {
        username: String,
        password: String,
    },
    SignUp {
        username: String,
        password: String,
        first_name: String,
        last_name: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Signs in, changes the password and waits for the forced sign-out.
    ChangePassword {
        username: String,
        old_password: String,
        new_password: String,
        /// Defaults to the new password.
        #[arg(long)]
        confirm: Option<String>,
    },
    /// Line-oriented front end over the full screen state.
    Shell,
}

impl Cli {
    fn settings(&self) -> Result<ClientSettings> {
        let flags = SettingsOverrides {
            base_url: self.base_url.clone(),
            layout: self.layout,
            request_timeout_secs: None,
            logout_delay_ms: self.logout_delay_ms,
        };
        let layered = load_settings(self.config.as_deref())
            .context("failed to load settings")?
            .merge(flags);
        layered.resolve().context("invalid settings")
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let settings = cli.settings()?;
    info!(base_url = %settings.base_url, layout = ?settings.layout, "settings resolved");

    let mut app = AppController::from_settings(&settings)
        .with_context(|| format!("failed to set up client for {}", settings.base_url))?;

    match cli.command {
        Command::ListAccounts => {
            let accounts = app.list_accounts().await.map_err(report)?;
            print_json(&accounts)?;
        }
        Command::CreateAccount {
            username,
            password,
            first_name,
            last_name,
            email,
        } => {
            let record = app
                .create_account(NewAccount {
                    username,
                    password,
                    first_name,
                    last_name,
                    email,
                })
                .await
                .map_err(report)?;
            print_status(&app);
            print_json(&record)?;
        }
        Command::DeleteAccount { username } => {
            app.delete_account(&username).await.map_err(report)?;
            print_status(&app);
        }
        Command::ShowProfile { username } => {
            let noun = settings.layout.account_noun();
            app.navigate(&format!("/{noun}/{username}"))
                .map_err(report)?;
            app.load_route().await;
            println!("{}", shell::describe_view(&app.view().await));
            if let Some(status) = &app.ui().status {
                return Err(anyhow!("{status}"));
            }
        }
        Command::ListCourses => {
            let courses = app.list_courses().await.map_err(report)?;
            print_json(&courses)?;
        }
        Command::CreateCourse {
            code,
            name,
            professor_id,
        } => {
            let record = app
                .create_course(NewCourse {
                    code,
                    name,
                    professor_id: AccountId(professor_id),
                })
                .await
                .map_err(report)?;
            print_status(&app);
            print_json(&record)?;
        }
        Command::CoursesFor { professor_id } => {
            let courses = app
                .courses_for_professor(AccountId(professor_id))
                .await
                .map_err(report)?;
            print_json(&courses)?;
        }
        Command::SignIn { username, password } => {
            sign_in(&mut app, &username, &password).await?;
            print_status(&app);
            println!("{}", shell::describe_view(&app.view().await));
        }
        Command::SignUp {
            username,
            password,
            first_name,
            last_name,
            email,
        } => {
            let fields = [
                ("username", username),
                ("password", password),
                ("firstName", first_name),
                ("lastName", last_name),
                ("email", email.unwrap_or_default()),
            ];
            for (name, value) in fields {
                app.update_field(FormKind::SignUp, name, value)
                    .map_err(report)?;
            }
            app.submit_sign_up().await.map_err(report)?;
            print_status(&app);
        }
        Command::ChangePassword {
            username,
            old_password,
            new_password,
            confirm,
        } => {
            sign_in(&mut app, &username, &old_password).await?;
            let confirm = confirm.unwrap_or_else(|| new_password.clone());
            app.update_field(FormKind::PasswordChange, "oldPassword", old_password)
                .map_err(report)?;
            app.update_field(FormKind::PasswordChange, "newPassword", new_password)
                .map_err(report)?;
            app.update_field(FormKind::PasswordChange, "confirmPassword", confirm)
                .map_err(report)?;
            app.submit_password_change().await.map_err(report)?;
            print_status(&app);

            let delay = app.session_controller().logout_delay();
            tokio::time::sleep(delay + Duration::from_millis(50)).await;
            app.sync_session_events();
            print_status(&app);
        }
        Command::Shell => shell::run(app).await?,
    }

    Ok(())
}

async fn sign_in(app: &mut AppController, username: &str, password: &str) -> Result<()> {
    app.update_field(FormKind::SignIn, "username", username)
        .map_err(report)?;
    app.update_field(FormKind::SignIn, "password", password)
        .map_err(report)?;
    app.submit_sign_in().await.map_err(report)?;
    Ok(())
}

fn report(err: AuthError) -> anyhow::Error {
    anyhow!("{}", err.status_message())
}

fn print_status(app: &AppController) {
    if let Some(status) = &app.ui().status {
        println!("{status}");
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
