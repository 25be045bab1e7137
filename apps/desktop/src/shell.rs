use anyhow::Result;
use client_core::{ActiveModal, AppController, FormKind, View};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

const HELP: &str = "\
commands:
  open signin|signup|settings   show a form
  set <field> <value>           fill a field of the open form
  submit                        send the open form
  cancel                        close the open form
  menu                          toggle the profile menu
  go <path>                     open / or /<professor|instructor>/<username>
  logout
  view                          print the current screen
  quit";

#[derive(Debug, PartialEq, Eq)]
enum ShellCommand {
    Help,
    Open(ActiveModal),
    Set { field: String, value: String },
    Submit,
    Cancel,
    Menu,
    Go(String),
    Logout,
    View,
    Quit,
}

fn is_secret_field(field: &str) -> bool {
    field.to_ascii_lowercase().contains("password")
}

/// `set <field> <value>`. Everything after the single space that follows the
/// field name is the value; passwords keep their surrounding spaces.
fn parse_set(raw: &str) -> Result<ShellCommand, String> {
    let raw = raw.trim_start();
    let (field, value) = raw.split_once(' ').unwrap_or((raw, ""));
    if field.is_empty() {
        return Err("usage: set <field> <value>".to_string());
    }
    let value = if is_secret_field(field) {
        value
    } else {
        value.trim()
    };
    Ok(ShellCommand::Set {
        field: field.to_string(),
        value: value.to_string(),
    })
}

fn parse_command(line: &str) -> Result<ShellCommand, String> {
    let line = line.trim_start();
    let (word, raw_rest) = line.split_once(' ').unwrap_or((line.trim_end(), ""));
    let rest = raw_rest.trim();
    match word {
        "help" | "?" => Ok(ShellCommand::Help),
        "open" => match rest {
            "signin" | "sign-in" => Ok(ShellCommand::Open(ActiveModal::SignIn)),
            "signup" | "sign-up" => Ok(ShellCommand::Open(ActiveModal::SignUp)),
            "settings" => Ok(ShellCommand::Open(ActiveModal::Settings)),
            other => Err(format!("unknown form '{other}'")),
        },
        "set" => parse_set(raw_rest),
        "submit" => Ok(ShellCommand::Submit),
        "cancel" => Ok(ShellCommand::Cancel),
        "menu" => Ok(ShellCommand::Menu),
        "go" if !rest.is_empty() => Ok(ShellCommand::Go(rest.to_string())),
        "go" => Err("usage: go <path>".to_string()),
        "logout" => Ok(ShellCommand::Logout),
        "view" => Ok(ShellCommand::View),
        "quit" | "exit" => Ok(ShellCommand::Quit),
        other => Err(format!("unknown command '{other}', try 'help'")),
    }
}

fn open_form(modal: ActiveModal) -> Option<FormKind> {
    match modal {
        ActiveModal::SignIn => Some(FormKind::SignIn),
        ActiveModal::SignUp => Some(FormKind::SignUp),
        ActiveModal::Settings => Some(FormKind::PasswordChange),
        ActiveModal::None => None,
    }
}

pub fn describe_view(view: &View) -> String {
    match view {
        View::Landing => "[landing] sign in or create an account".to_string(),
        View::Dashboard(profile) => format!(
            "[dashboard] {} ({})",
            profile.display_name(),
            profile.username
        ),
        View::Loading => "[loading]".to_string(),
        View::ProfileDetail(record) => {
            let mut line = format!("[profile] {} ({})", record.display_name(), record.username);
            if let Some(email) = &record.email {
                line.push_str(&format!(" <{email}>"));
            }
            line
        }
    }
}

/// Applies one command; returns `false` once the user asked to quit.
/// Failures are already written to the status line by the controller.
async fn apply(app: &mut AppController, command: ShellCommand) -> bool {
    match command {
        ShellCommand::Help => println!("{HELP}"),
        ShellCommand::Open(modal) => {
            let _ = app.open_modal(modal).await;
        }
        ShellCommand::Set { field, value } => match open_form(app.ui().active_modal) {
            Some(form) => {
                let _ = app.update_field(form, &field, value);
            }
            None => println!("open a form first"),
        },
        ShellCommand::Submit => match open_form(app.ui().active_modal) {
            Some(FormKind::SignIn) => {
                let _ = app.submit_sign_in().await;
            }
            Some(FormKind::SignUp) => {
                let _ = app.submit_sign_up().await;
            }
            Some(FormKind::PasswordChange) => {
                let _ = app.submit_password_change().await;
            }
            None => println!("nothing to submit"),
        },
        ShellCommand::Cancel => app.cancel_modal(),
        ShellCommand::Menu => {
            let _ = app.toggle_profile_menu().await;
        }
        ShellCommand::Go(path) => {
            if app.navigate(&path).is_ok() {
                app.load_route().await;
            }
        }
        ShellCommand::Logout => app.logout().await,
        ShellCommand::View => {}
        ShellCommand::Quit => return false,
    }
    true
}

async fn render(app: &mut AppController) {
    let view = app.view().await;
    println!("{}", describe_view(&view));
    let ui = app.ui();
    match ui.active_modal {
        ActiveModal::None => {}
        modal => println!("  form open: {modal:?}"),
    }
    if ui.profile_menu_open {
        println!("  profile menu: settings | logout");
    }
    if ui.success_toast {
        println!("  [ok]");
    }
    if let Some(status) = &ui.status {
        println!("  {status}");
    }
}

pub async fn run(mut app: AppController) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    println!("{HELP}");
    render(&mut app).await;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        match parse_command(&line) {
            Ok(command) => {
                if !apply(&mut app, command).await {
                    break;
                }
                render(&mut app).await;
            }
            Err(message) => println!("{message}"),
        }
    }

    app.logout().await;
    Ok(())
}
