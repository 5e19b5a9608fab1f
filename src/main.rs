use clap::Parser;
use fundledger::application::access::Caller;
use fundledger::cli::commands::{Cli, Commands};
use fundledger::config::LedgerConfig;
use fundledger::domain::entities::startup::StartupProfile;
use fundledger::domain::entities::user::User;
use fundledger::domain::values::amount::Amount;
use fundledger::domain::values::entity_id::Collection;
use fundledger::domain::values::role::Role;
use fundledger::FundLedger;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let ledger = match LedgerConfig::from_env().and_then(|c| FundLedger::new(&c)) {
        Ok(ledger) => ledger,
        Err(e) => {
            eprintln!("Error initializing ledger: {e}");
            std::process::exit(1);
        }
    };

    let result = run_command(&ledger, cli.caller.as_deref(), cli.command).await;
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Users are printed without their credential.
fn print_users(users: &[User]) -> CliResult<()> {
    let mut values = Vec::with_capacity(users.len());
    for user in users {
        let mut v = serde_json::to_value(user)?;
        if let Some(obj) = v.as_object_mut() {
            obj.remove("password");
        }
        values.push(v);
    }
    print_json(&values)
}

fn caller(ledger: &FundLedger, raw: Option<&str>) -> CliResult<Caller> {
    let raw = raw.ok_or("this command needs --as <user>")?;
    Ok(ledger.caller_for(raw)?)
}

fn required<'a>(data: &'a serde_json::Value, field: &str) -> CliResult<&'a str> {
    Ok(data[field]
        .as_str()
        .ok_or_else(|| format!("Missing required field: {field}"))?)
}

async fn run_command(ledger: &FundLedger, as_user: Option<&str>, cmd: Commands) -> CliResult<()> {
    match cmd {
        Commands::UserAdd { json } => {
            let data: serde_json::Value = serde_json::from_str(&json)?;
            let role: Role = required(&data, "role")?.parse().map_err(|e: String| e)?;
            let user = ledger.register_user(
                required(&data, "username")?,
                required(&data, "password")?,
                required(&data, "email")?,
                data["wallet_address"].as_str(),
                role,
            )?;
            print_users(&[user])?;
        }
        Commands::Users { id } => match id {
            Some(id) => {
                let user = ledger.user(&id)?.ok_or_else(|| format!("No user {id}"))?;
                print_users(&[user])?;
            }
            None => print_users(&ledger.users()?)?,
        },
        Commands::WalletSet { user, address } => {
            let c = caller(ledger, as_user)?;
            print_users(&[ledger.set_wallet(&c, &user, &address)?])?;
        }
        Commands::WalletConfirm { user, address } => {
            let c = caller(ledger, as_user)?;
            print_users(&[ledger.confirm_wallet(&c, &user, &address)?])?;
        }
        Commands::UserDelete { user } => {
            let c = caller(ledger, as_user)?;
            print_json(&ledger.delete_user(&c, &user)?)?;
        }
        Commands::StartupAdd { json } => {
            let c = caller(ledger, as_user)?;
            let profile: StartupProfile = serde_json::from_str(&json)?;
            print_json(&ledger.create_startup(&c, profile)?)?;
        }
        Commands::Startups { id, owner } => match (id, owner) {
            (Some(id), _) => print_json(&ledger.startup(&id)?)?,
            (None, Some(owner)) => print_json(&ledger.startup_for_user(&owner)?)?,
            (None, None) => print_json(&ledger.startups()?)?,
        },
        Commands::Invest { startup, amount, tx } => {
            let c = caller(ledger, as_user)?;
            let amount = Amount::parse_positive(&amount)?;
            print_json(&ledger.record_investment(&c, &startup, amount, &tx)?)?;
        }
        Commands::Fund { startup, amount } => {
            let c = caller(ledger, as_user)?;
            ledger.wallet().connect().await?;
            print_json(&ledger.invest_with_wallet(&c, &startup, &amount).await?)?;
        }
        Commands::Investments { startup, investor } => {
            let investments = match (startup, investor) {
                (Some(s), _) => ledger.investments_for_startup(&s)?,
                (None, Some(i)) => ledger.investments_by_investor(&i)?,
                (None, None) => ledger.investments()?,
            };
            print_json(&investments)?;
        }
        Commands::Reconcile { startup } => {
            print_json(&ledger.reconcile(&startup)?)?;
        }
        Commands::Progress { startup } => {
            let progress = ledger
                .progress(&startup)?
                .ok_or_else(|| format!("No startup {startup}"))?;
            print_json(&progress)?;
        }
        Commands::UpdateAdd { startup, json } => {
            let c = caller(ledger, as_user)?;
            let data: serde_json::Value = serde_json::from_str(&json)?;
            let update = ledger.post_update(
                &c,
                &startup,
                required(&data, "title")?.to_string(),
                data["content"].as_str().unwrap_or_default().to_string(),
            )?;
            print_json(&update)?;
        }
        Commands::Updates { startup } => {
            print_json(&ledger.updates(startup.as_deref())?)?;
        }
        Commands::MilestoneAdd { startup, json } => {
            let c = caller(ledger, as_user)?;
            let data: serde_json::Value = serde_json::from_str(&json)?;
            let target_date = data["target_date"]
                .as_str()
                .map(|s| chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d"))
                .transpose()
                .map_err(|e| format!("Invalid target_date: {e}. Use YYYY-MM-DD"))?;
            let milestone = ledger.add_milestone(
                &c,
                &startup,
                required(&data, "title")?.to_string(),
                data["description"].as_str().map(String::from),
                target_date,
            )?;
            print_json(&milestone)?;
        }
        Commands::Milestones { startup } => {
            print_json(&ledger.milestones(startup.as_deref())?)?;
        }
        Commands::MilestoneDone { id, undo } => {
            let c = caller(ledger, as_user)?;
            print_json(&ledger.set_milestone_status(&c, &id, !undo)?)?;
        }
        Commands::ResolveId { collection, id } => {
            let collection: Collection = collection.parse().map_err(|e: String| e)?;
            println!("{}", ledger.resolve_id(collection, &id)?);
        }
        Commands::MinorUnits { amount } => {
            let amount = Amount::parse_positive(&amount)?;
            println!("{amount}");
            println!("{}", amount.minor_units());
            println!("{}", amount.to_hex());
        }
        Commands::Transfer { to, amount, no_wait } => {
            let wallet = ledger.wallet();
            let from = wallet.connect().await?;
            eprintln!("Connected as {from}");
            let watch = wallet.submit_transfer(&to, &amount).await?;
            println!("{}", watch.reference());
            if no_wait {
                watch.stop_watching();
            } else {
                print_json(&watch.wait().await?)?;
            }
        }
    }
    Ok(())
}
