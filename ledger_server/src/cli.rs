use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // CLS_TELEGRAM_BOT_TOKEN is left out on purpose
    const DISPLAY_ENVS: [&str; 9] = [
        "RUST_LOG",
        "CLS_HOST",
        "CLS_PORT",
        "CLS_DATABASE_URL",
        "CLS_USE_X_FORWARDED_FOR",
        "CLS_USE_FORWARDED",
        "CLS_SESSION_IDLE_TIMEOUT",
        "CLS_SESSION_SWEEP_INTERVAL",
        "CLS_TELEGRAM_CHANNEL_ID",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
