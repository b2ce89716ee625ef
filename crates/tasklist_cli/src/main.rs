use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::io::{self, BufRead};
use tasklist_cli::cli::{Cli, Command, collect_overrides};
use tasklist_cli::view::{screen_json, screen_text};
use tasklist_core::config::{Config, Palette, load_config_with_fallback, merge_overrides};
use tasklist_core::controller::{Feedback, SleepDelay, TaskController};
use tasklist_core::error::AppError;
use tasklist_core::storage::FileStore;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "TASKLIST_LOG";

type Controller = TaskController<FileStore>;

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(raw_overrides: &[String]) -> Result<Config, AppError> {
    let loaded = load_config_with_fallback();
    let overrides = collect_overrides(raw_overrides)?;
    Ok(merge_overrides(&loaded.config, &overrides))
}

fn open_controller(config: &Config) -> Result<Controller, AppError> {
    let store = FileStore::open_default()?;
    tracing::debug!(path = %store.path().display(), "opened task storage");
    Ok(TaskController::load(store).with_removal_delay(SleepDelay(config.removal_delay())))
}

fn print_screen(controller: &Controller, json: bool, palette: &Palette) {
    let view = controller.view();
    if json {
        println!("{}", screen_json(&view, controller.status()));
    } else {
        print!("{}", screen_text(&view, controller.status(), palette));
    }
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(current.clone());
                current.clear();
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
    println!("While editing: an empty line saves, `esc` cancels.");
}

fn resolve_id(controller: &Controller, raw: &str) -> Result<String, AppError> {
    controller
        .resolve(raw)
        .ok_or_else(|| AppError::invalid_input(format!("no task matches '{}'", raw.trim())))
}

fn require_editing(controller: &Controller) -> Result<(), AppError> {
    if controller.is_editing() {
        Ok(())
    } else {
        Err(AppError::invalid_input("no edit in progress"))
    }
}

/// Runs one gesture against the controller. Rejections come back as
/// feedback so the caller decides whether they end the program.
fn run_gesture(controller: &mut Controller, command: Command) -> Result<Feedback, AppError> {
    match command {
        Command::Add { text } => controller.submit(&text.join(" ")),
        Command::List => Ok(Feedback::Ignored),
        Command::Toggle { id } => {
            let id = resolve_id(controller, &id)?;
            controller.toggle(&id)
        }
        Command::Edit { id, text } => {
            let id = resolve_id(controller, &id)?;
            controller.start_edit(&id);
            if text.is_empty() {
                return Ok(Feedback::Applied);
            }
            controller.set_draft(&text.join(" "));
            controller.confirm_edit()
        }
        Command::Delete { id } => {
            let id = resolve_id(controller, &id)?;
            controller.delete(&id)
        }
        Command::ClearCompleted => controller.clear_completed(),
        Command::Draft { text } => {
            require_editing(controller)?;
            Ok(controller.set_draft(&text.join(" ")))
        }
        Command::Save { text } => {
            require_editing(controller)?;
            if !text.is_empty() {
                controller.set_draft(&text.join(" "));
            }
            controller.confirm_edit()
        }
        Command::Cancel => {
            require_editing(controller)?;
            Ok(controller.cancel_edit())
        }
    }
}

fn run_command(cli: Cli) -> Result<(), AppError> {
    if let Some(name) = cli.command.session_only() {
        return Err(AppError::invalid_input(format!(
            "`{name}` works on the inline editor; run tasklist without arguments to start a session"
        )));
    }

    if let Command::Edit { text, .. } = &cli.command
        && text.is_empty()
    {
        return Err(AppError::invalid_input("new text is required"));
    }

    let config = load_config(&cli.config_override)?;
    let mut controller = open_controller(&config)?;

    if let Feedback::Rejected(rejection) = run_gesture(&mut controller, cli.command)? {
        return Err(rejection.into());
    }

    print_screen(&controller, cli.json, &config.palette());
    Ok(())
}

fn session_gesture(controller: &mut Controller, cli: Cli, palette: &Palette) -> Result<(), AppError> {
    if !cli.config_override.is_empty() {
        return Err(AppError::invalid_input(
            "config overrides are only accepted when starting tasklist",
        ));
    }

    if cli.command.blurs_editor()
        && let Some(id) = controller.edit_state().editing_id().map(str::to_string)
    {
        controller.blur_edit(&id)?;
    }

    run_gesture(controller, cli.command)?;
    print_screen(controller, cli.json, palette);
    Ok(())
}

fn run_interactive() -> Result<(), AppError> {
    let config = load_config(&[])?;
    let palette = config.palette();
    let mut controller = open_controller(&config)?;
    print_screen(&controller, false, &palette);

    let mut input = Vec::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock.read_until(b'\n', &mut input)?;

        if bytes == 0 {
            break;
        }

        let text = String::from_utf8_lossy(&input);
        let line = text.trim();
        if line.is_empty() {
            if controller.is_editing() {
                match controller.confirm_edit() {
                    Ok(_) => print_screen(&controller, false, &palette),
                    Err(err) => eprintln!("ERROR: {}", err),
                }
            }
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        if line.eq_ignore_ascii_case("esc") {
            if controller.cancel_edit() == Feedback::Applied {
                print_screen(&controller, false, &palette);
            }
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("tasklist".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = session_gesture(&mut controller, cli, &palette) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn main() {
    init_tracing();

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        if let Err(err) = run_interactive() {
            eprintln!("ERROR: {}", err);
            std::process::exit(1);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run_command(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
