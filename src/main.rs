use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use rpassword::read_password;
use std::io::{self, BufRead};
use zeroize::Zeroizing;

/// Store, fetch and delete secrets in the OS credential store
#[derive(Parser)]
#[command(name = "credstore", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Store a secret (prompts without echo unless --stdin is given)
    Set {
        service: String,
        account: String,
        /// Read one line from stdin instead of prompting
        #[arg(long)]
        stdin: bool,
    },
    /// Print a secret
    Get { service: String, account: String },
    /// Delete a secret
    Delete { service: String, account: String },
    /// Delete every secret of a service
    DeleteAll { service: String },
    /// Print the name of the active backend
    Backend,
    /// Print shell completions
    Completions { shell: Shell },
}

fn read_secret(prompt: &str, from_stdin: bool) -> Result<Zeroizing<String>, String> {
    if from_stdin {
        let mut buf = Zeroizing::new(String::new());
        io::stdin()
            .lock()
            .read_line(&mut buf)
            .map_err(|e| format!("Failed to read line: {e}"))?;
        let trimmed = buf.trim_end_matches(['\n', '\r']).len();
        buf.truncate(trimmed);
        return Ok(buf);
    }
    eprint!("{prompt} (noecho):");
    read_password()
        .map(Zeroizing::new)
        .map_err(|e| format!("Failed to read password: {e}"))
}

fn describe(err: credstore::Error, service: &str, account: &str) -> String {
    if err.is_not_found() {
        format!("{err}: {service}/{account}")
    } else {
        err.to_string()
    }
}

fn run(command: Command) -> Result<(), String> {
    match command {
        Command::Set {
            service,
            account,
            stdin,
        } => {
            let secret = read_secret(&format!("{service}.{account}"), stdin)?;
            credstore::set(&service, &account, &secret).map_err(|e| e.to_string())
        }
        Command::Get { service, account } => {
            let secret = Zeroizing::new(
                credstore::get(&service, &account).map_err(|e| describe(e, &service, &account))?,
            );
            println!("{}", secret.as_str());
            Ok(())
        }
        Command::Delete { service, account } => {
            credstore::delete(&service, &account).map_err(|e| describe(e, &service, &account))
        }
        Command::DeleteAll { service } => credstore::delete_all(&service).map_err(|e| e.to_string()),
        Command::Backend => {
            println!("{}", credstore::backend_name());
            Ok(())
        }
        Command::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "credstore", &mut io::stdout());
            Ok(())
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
