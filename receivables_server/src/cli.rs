use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // Any argument at all gets the help text
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
    const DISPLAY_ENVS: [&str; 10] = [
        "RUST_LOG",
        "RCV_HOST",
        "RCV_PORT",
        "RCV_DATABASE_URL",
        "RCV_DB_MAX_CONNECTIONS",
        "RCV_DB_BUSY_TIMEOUT_MS",
        "RCV_RUN_MIGRATIONS",
        "RCV_OVERPAYMENT_POLICY",
        "RCV_PAYMENT_HISTORY_LIMIT",
        "RCV_CONFLICT_RETRIES",
    ];

    println!("Current environment values:");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
