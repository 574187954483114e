use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use dialoguer::{Input, Password};

use mazovia_confirm::api::{ApiClient, LoginOutcome};
use mazovia_confirm::auth::CredentialStore;
use mazovia_confirm::config::{CliArgs, Command, Config};
use mazovia_confirm::models::verification::{VerificationDetail, VerificationListResponse};
use mazovia_confirm::outcome::Outcome;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    let args = CliArgs::parse();
    let config = Config::from_args(&args)?;
    config.validate()?;

    // Initialize logging with the configured level
    let log_level = config.log_level.to_lowercase();
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Backend: {}", config.base_url);
    tracing::debug!("Credentials: {}", config.credentials_file.display());

    let store = CredentialStore::open(&config.credentials_file)?;
    let client = ApiClient::new(
        config.base_url.clone(),
        store,
        config.expiry_margin_secs,
        config.http_connect_timeout,
        config.http_request_timeout,
    )?;

    let code = match args.command {
        Command::Login { username } => login(&client, username).await?,
        Command::Logout => report(client.logout().await, |response| {
            if response.success {
                println!("Logged out.");
            } else {
                println!("Backend did not confirm the logout; local tokens cleared anyway.");
            }
        }),
        Command::Whoami => report(client.user_info().await, |info| {
            println!("{}", info.name.unwrap_or_else(|| "(no name)".to_string()));
        }),
        Command::List {
            page,
            page_size,
            sort,
            all,
            status,
            kind,
        } => {
            let outcome = if all {
                client
                    .all_verifications(page, page_size, &sort, status.as_deref(), kind.as_deref())
                    .await
            } else {
                client.pending_verifications(page, page_size, &sort).await
            };
            report(outcome, print_list)
        }
        Command::Verify {
            token,
            kind,
            answer,
        } => report(
            client
                .verify_verification(&kind, &token, answer.as_deref())
                .await,
            |response| {
                println!("{}", response.message);
                if let Some(data) = response.data {
                    print_detail(&data.verification);
                }
            },
        ),
        Command::Status { token } => report(client.verification_status(&token).await, |response| {
            match response.data {
                Some(data) => print_detail(&data.verification),
                None => println!("No verification found for that token."),
            }
        }),
        Command::Cancel { token } => report(client.cancel_verification(&token).await, |response| {
            println!("{}", response.message);
        }),
    };

    Ok(code)
}

async fn login(client: &ApiClient, username: Option<String>) -> Result<ExitCode> {
    let username = match username {
        Some(username) => username,
        None => Input::<String>::new()
            .with_prompt("Username")
            .interact_text()?,
    };
    let password = Password::new().with_prompt("Password").interact()?;

    Ok(report(
        client.login(&username, &password).await,
        |outcome| match outcome {
            LoginOutcome::Authenticated { name } => match name {
                Some(name) => println!("Logged in as {}.", name),
                None => println!("Logged in."),
            },
            LoginOutcome::ServerCodeChallenge { message, .. } => {
                println!(
                    "{}",
                    message.unwrap_or_else(
                        || "Server code received; run login again to continue.".to_string()
                    )
                );
            }
        },
    ))
}

/// Map an outcome to terminal output and an exit code. Each error kind gets
/// a distinct user-facing message; a connectivity problem must not read like
/// a rejection.
fn report<T>(outcome: Outcome<T>, on_success: impl FnOnce(T)) -> ExitCode {
    match outcome {
        Outcome::Success(value) => {
            on_success(value);
            ExitCode::SUCCESS
        }
        Outcome::NetworkError { message, .. } => {
            eprintln!(
                "Network error: {}. Check your connection and try again.",
                message.unwrap_or_else(|| "connection failed".to_string())
            );
            ExitCode::FAILURE
        }
        Outcome::ClientError { code, message, .. } => {
            eprintln!(
                "Request rejected ({}): {}",
                code,
                message.unwrap_or_else(|| "no details".to_string())
            );
            ExitCode::FAILURE
        }
        Outcome::ServerError { code, message, .. } => {
            eprintln!(
                "Server error ({}): {}. Try again later.",
                code,
                message.unwrap_or_else(|| "no details".to_string())
            );
            ExitCode::FAILURE
        }
        Outcome::GenericError { message, .. } => {
            eprintln!(
                "Error: {}",
                message.unwrap_or_else(|| "unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn print_list(response: VerificationListResponse) {
    let records = response.data.unwrap_or_default();
    if records.is_empty() {
        println!("No verification requests.");
        return;
    }

    for record in &records {
        print_detail(record);
        println!();
    }

    if let Some(meta) = response.meta {
        let p = meta.pagination;
        println!("Page {}/{} ({} total)", p.page, p.page_count, p.total);
    }
}

fn print_detail(detail: &VerificationDetail) {
    println!("{} [{:?}] {}", detail.token, detail.status, detail.type_name);
    println!("  {}: {}", detail.context.title, detail.context.description);
    println!("  code: {}  created: {}", detail.code, detail.created_at);
    if let Some(template) = detail.choice_template() {
        let options: Vec<&str> = template
            .options
            .iter()
            .map(|option| option.text.as_str())
            .collect();
        println!("  {}: {}", template.title, options.join(" / "));
    }
}
