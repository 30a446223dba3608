use chrono::{Datelike, Local, Months, NaiveDate};
use clap::{Args, Parser, Subcommand};
use engine::{
    AccountType, AddPaymentCmd, CategoryKind, Engine, EngineError, EntryCmd, EntryFilter,
    EntryTag, HolderKind, Money, MoneyFlowFilter, MoneyFlowKind, NewCategoryCmd, NewHolderCmd,
    NewMoneyFlowCmd, TenantScope, TransferCmd,
};
use migration::{Migrator, MigratorTrait};
use serde_json::{Value, json};
use uuid::Uuid;

use settings::{Database, Settings};

mod settings;

#[derive(Parser, Debug)]
#[command(name = "tallybook")]
#[command(about = "Personal finance ledger: holders, entries, transfers and money flows")]
struct Cli {
    /// Settings file, without extension.
    #[arg(long, default_value = "tallybook")]
    config: String,

    /// `memory` or a SQLite file path. Overrides the settings file.
    #[arg(long)]
    database: Option<String>,

    #[arg(long, env = "TALLYBOOK_TENANT")]
    tenant: Uuid,

    #[arg(long, env = "TALLYBOOK_OWNER")]
    owner: Uuid,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending migrations and exit.
    Migrate,
    Holder(HolderArgs),
    Category(CategoryArgs),
    Entry(EntryArgs),
    Transfer(TransferArgs),
    Flow(FlowArgs),
    Balances(BalancesArgs),
    Report(ReportArgs),
}

#[derive(Args, Debug)]
struct HolderArgs {
    #[command(subcommand)]
    command: HolderCommand,
}

#[derive(Subcommand, Debug)]
enum HolderCommand {
    New {
        #[arg(long, value_parser = parse_holder_kind)]
        kind: HolderKind,
        #[arg(long)]
        name: String,
        #[arg(long, value_parser = parse_account_type)]
        account_type: Option<AccountType>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long, default_value = "0")]
        initial: Money,
    },
    List {
        #[arg(long, value_parser = parse_holder_kind)]
        kind: Option<HolderKind>,
    },
    Delete {
        id: Uuid,
    },
}

#[derive(Args, Debug)]
struct CategoryArgs {
    #[command(subcommand)]
    command: CategoryCommand,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    New {
        #[arg(long, value_parser = parse_category_kind)]
        kind: CategoryKind,
        #[arg(long)]
        name: String,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        icon: Option<String>,
    },
    List {
        #[arg(long, value_parser = parse_category_kind)]
        kind: Option<CategoryKind>,
    },
    Delete {
        id: Uuid,
    },
}

#[derive(Args, Debug)]
struct EntryArgs {
    #[command(subcommand)]
    command: EntryCommand,
}

#[derive(Subcommand, Debug)]
enum EntryCommand {
    Record {
        #[arg(long)]
        holder: Uuid,
        #[arg(long, value_parser = parse_entry_tag)]
        kind: EntryTag,
        #[arg(long)]
        amount: Money,
        /// Defaults to today.
        #[arg(long)]
        on: Option<NaiveDate>,
        #[arg(long)]
        category: Option<Uuid>,
        /// Wallet funding a give or receiving a receive.
        #[arg(long)]
        wallet: Option<Uuid>,
        #[arg(long)]
        note: Option<String>,
    },
    Delete {
        id: Uuid,
    },
    List {
        #[arg(long)]
        holder: Option<Uuid>,
        #[arg(long, value_parser = parse_entry_tag)]
        kind: Option<EntryTag>,
        #[arg(long)]
        limit: Option<u64>,
    },
}

#[derive(Args, Debug)]
struct TransferArgs {
    #[command(subcommand)]
    command: TransferCommand,
}

#[derive(Subcommand, Debug)]
enum TransferCommand {
    New {
        #[arg(long)]
        from: Uuid,
        #[arg(long)]
        to: Uuid,
        #[arg(long)]
        amount: Money,
        #[arg(long)]
        on: Option<NaiveDate>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        pair_id: Uuid,
    },
}

#[derive(Args, Debug)]
struct FlowArgs {
    #[command(subcommand)]
    command: FlowCommand,
}

#[derive(Subcommand, Debug)]
enum FlowCommand {
    New {
        #[arg(long)]
        person: String,
        #[arg(long, value_parser = parse_flow_kind)]
        kind: MoneyFlowKind,
        #[arg(long)]
        amount: Money,
        #[arg(long)]
        on: Option<NaiveDate>,
        #[arg(long)]
        due: Option<NaiveDate>,
        #[arg(long)]
        note: Option<String>,
    },
    Pay {
        id: Uuid,
        #[arg(long)]
        amount: Money,
        #[arg(long)]
        on: Option<NaiveDate>,
        #[arg(long)]
        method: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    List {
        #[arg(long)]
        open: bool,
    },
    Summary {
        #[arg(long)]
        as_of: Option<NaiveDate>,
    },
}

#[derive(Args, Debug)]
struct BalancesArgs {
    #[command(subcommand)]
    command: BalancesCommand,
}

#[derive(Subcommand, Debug)]
enum BalancesCommand {
    /// Rebuild cached balances from the entries.
    Recompute,
    /// Report cached balances that disagree with the entries.
    Audit,
}

#[derive(Args, Debug)]
struct ReportArgs {
    #[command(subcommand)]
    command: ReportCommand,
}

#[derive(Subcommand, Debug)]
enum ReportCommand {
    /// Income and expense statistics, current month by default.
    Stats {
        #[arg(long)]
        from: Option<NaiveDate>,
        #[arg(long)]
        to: Option<NaiveDate>,
    },
    Trend {
        #[arg(long, default_value_t = 12)]
        months: usize,
    },
}

fn parse_holder_kind(value: &str) -> Result<HolderKind, EngineError> {
    HolderKind::try_from(value)
}

fn parse_account_type(value: &str) -> Result<AccountType, EngineError> {
    AccountType::try_from(value)
}

fn parse_category_kind(value: &str) -> Result<CategoryKind, EngineError> {
    CategoryKind::try_from(value)
}

fn parse_entry_tag(value: &str) -> Result<EntryTag, EngineError> {
    EntryTag::try_from(value)
}

fn parse_flow_kind(value: &str) -> Result<MoneyFlowKind, EngineError> {
    MoneyFlowKind::try_from(value)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn current_month(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
    let end = start
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(today);
    (start, end)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();
    let mut settings = Settings::new(&cli.config)?;
    if let Some(database) = cli.database.as_deref() {
        settings.database = Database::from_arg(database);
    }

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tallybook={level},engine={level}",
            level = settings.app.level
        ))
        .with_writer(std::io::stderr)
        .init();

    let db = parse_database(&settings.database).await?;
    if matches!(cli.command, Command::Migrate) {
        tracing::info!("migrations applied");
        return Ok(());
    }

    let engine = Engine::builder()
        .database(db)
        .reconcile_mode(settings.ledger.reconcile_mode)
        .build()
        .await?;
    let scope = TenantScope::new(cli.tenant, cli.owner);

    match execute(&engine, &scope, cli.command).await {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(err) => {
            tracing::debug!(class = ?err.class(), "command failed: {err}");
            eprintln!("error: {}", err.user_message());
            std::process::exit(1);
        }
    }
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let database = sea_orm::Database::connect(config.url()).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, EngineError> {
    serde_json::to_value(value)
        .map_err(|err| EngineError::Validation(format!("cannot render output: {err}")))
}

async fn execute(engine: &Engine, scope: &TenantScope, command: Command) -> Result<Value, EngineError> {
    match command {
        Command::Migrate => Ok(json!({ "migrated": true })),
        Command::Holder(args) => match args.command {
            HolderCommand::New {
                kind,
                name,
                account_type,
                phone,
                email,
                address,
                notes,
                initial,
            } => {
                let mut cmd = NewHolderCmd::new(kind, name).initial_balance(initial.minor());
                cmd.account_type = account_type;
                cmd.phone = phone;
                cmd.email = email;
                cmd.address = address;
                cmd.notes = notes;
                to_json(&engine.new_holder(scope, cmd).await?)
            }
            HolderCommand::List { kind } => to_json(&engine.list_holders(scope, kind).await?),
            HolderCommand::Delete { id } => {
                engine.delete_holder(scope, id).await?;
                Ok(json!({ "deleted": id }))
            }
        },
        Command::Category(args) => match args.command {
            CategoryCommand::New {
                kind,
                name,
                color,
                icon,
            } => {
                let mut cmd = NewCategoryCmd::new(kind, name);
                cmd.color = color;
                cmd.icon = icon;
                to_json(&engine.new_category(scope, cmd).await?)
            }
            CategoryCommand::List { kind } => {
                to_json(&engine.list_categories(scope, kind).await?)
            }
            CategoryCommand::Delete { id } => {
                engine.delete_category(scope, id).await?;
                Ok(json!({ "deleted": id }))
            }
        },
        Command::Entry(args) => match args.command {
            EntryCommand::Record {
                holder,
                kind,
                amount,
                on,
                category,
                wallet,
                note,
            } => {
                let mut cmd = EntryCmd::new(holder, kind, amount.minor(), on.unwrap_or_else(today));
                cmd.category_id = category;
                cmd.wallet_id = wallet;
                cmd.note = note;
                to_json(&engine.record_entry(scope, cmd).await?)
            }
            EntryCommand::Delete { id } => {
                engine.delete_entry(scope, id).await?;
                Ok(json!({ "deleted": id }))
            }
            EntryCommand::List {
                holder,
                kind,
                limit,
            } => {
                let filter = EntryFilter {
                    holder_id: holder,
                    kind,
                    limit,
                    ..EntryFilter::default()
                };
                to_json(&engine.list_entries(scope, &filter).await?)
            }
        },
        Command::Transfer(args) => match args.command {
            TransferCommand::New {
                from,
                to,
                amount,
                on,
                description,
            } => {
                let mut cmd = TransferCmd::new(from, to, amount.minor(), on.unwrap_or_else(today));
                cmd.description = description;
                to_json(&engine.transfer(scope, cmd).await?)
            }
            TransferCommand::Delete { pair_id } => {
                engine.delete_transfer(scope, pair_id).await?;
                Ok(json!({ "deleted": pair_id }))
            }
        },
        Command::Flow(args) => match args.command {
            FlowCommand::New {
                person,
                kind,
                amount,
                on,
                due,
                note,
            } => {
                let mut cmd =
                    NewMoneyFlowCmd::new(person, kind, amount.minor(), on.unwrap_or_else(today));
                cmd.due_on = due;
                cmd.note = note;
                to_json(&engine.new_money_flow(scope, cmd).await?)
            }
            FlowCommand::Pay {
                id,
                amount,
                on,
                method,
                note,
            } => {
                let mut cmd = AddPaymentCmd::new(id, amount.minor(), on.unwrap_or_else(today));
                cmd.payment_method = method;
                cmd.note = note;
                to_json(&engine.add_payment(scope, cmd).await?)
            }
            FlowCommand::List { open } => {
                let mut filter = MoneyFlowFilter::new();
                filter.open_only = open;
                to_json(&engine.list_money_flows(scope, &filter).await?)
            }
            FlowCommand::Summary { as_of } => to_json(
                &engine
                    .money_flow_summary(scope, as_of.unwrap_or_else(today))
                    .await?,
            ),
        },
        Command::Balances(args) => match args.command {
            BalancesCommand::Recompute => {
                let changed = engine.recompute_balances(scope).await?;
                Ok(json!({ "changed": changed }))
            }
            BalancesCommand::Audit => to_json(&engine.audit_balances(scope).await?),
        },
        Command::Report(args) => match args.command {
            ReportCommand::Stats { from, to } => {
                let (month_start, month_end) = current_month(today());
                let from = from.unwrap_or(month_start);
                let to = to.unwrap_or(month_end);
                to_json(&engine.statistics(scope, from, to).await?)
            }
            ReportCommand::Trend { months } => to_json(&engine.monthly_trend(scope, months).await?),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_month_spans_first_to_last_day() {
        let day = NaiveDate::from_ymd_opt(2024, 2, 14).unwrap();
        let (start, end) = current_month(day);
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn cli_parses_entry_record() {
        let tenant = Uuid::new_v4();
        let owner = Uuid::new_v4();
        let holder = Uuid::new_v4();
        let cli = Cli::try_parse_from([
            "tallybook",
            "--tenant",
            &tenant.to_string(),
            "--owner",
            &owner.to_string(),
            "entry",
            "record",
            "--holder",
            &holder.to_string(),
            "--kind",
            "expense",
            "--amount",
            "12,50",
            "--on",
            "2025-03-01",
        ])
        .unwrap();
        match cli.command {
            Command::Entry(EntryArgs {
                command: EntryCommand::Record { kind, amount, .. },
            }) => {
                assert_eq!(kind, EntryTag::Expense);
                assert_eq!(amount.minor(), 1250);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
