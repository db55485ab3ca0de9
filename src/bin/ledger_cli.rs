use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;

use machining_ledger::{
    config,
    dashboard::{Dashboard, LoadState, Notification, SubmitOutcome},
    errors::describe_validation_errors,
    models::{ProductionRecord, WageRecord, YearMonth},
    reports::{round_for_display, GroupedTotals, GroupingMode},
    services::LedgerService,
    store,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut dashboard = initialize().await?;

    match cli.command {
        Commands::Records(command) => handle_records_command(&mut dashboard, command, cli.json).await,
        Commands::Wages(command) => handle_wages_command(&mut dashboard, command, cli.json).await,
        Commands::Persons => handle_persons(&mut dashboard, cli.json).await,
        Commands::Report(command) => handle_report_command(&mut dashboard, command, cli.json).await,
    }
}

#[derive(Parser)]
#[command(
    name = "ledger-cli",
    about = "Record production, set wages and report machine time and labor cost",
    version
)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(subcommand)]
    Records(RecordsCommands),
    #[command(subcommand)]
    Wages(WagesCommands),
    /// List people named in production records
    Persons,
    #[command(subcommand)]
    Report(ReportCommands),
}

#[derive(Subcommand)]
enum RecordsCommands {
    /// Submit a production record
    Add(AddRecordArgs),
    /// List production records, newest first
    List,
}

#[derive(Args)]
struct AddRecordArgs {
    #[arg(long, help = "Production date (YYYY-MM-DD); defaults to today")]
    date: Option<String>,
    #[arg(long, help = "Operator name")]
    person: String,
    #[arg(long = "order", help = "Production order id, e.g. OP-1024")]
    order_id: String,
    #[arg(long, help = "Pieces produced")]
    quantity: String,
    #[arg(long, help = "Part or item produced")]
    item: String,
    #[arg(long, help = "Machine time in minutes")]
    minutes: String,
    #[arg(long, help = "Part size")]
    size: String,
    #[arg(long, help = "Machine used")]
    machine: String,
    #[arg(long, help = "Free-text notes")]
    notes: Option<String>,
}

#[derive(Subcommand)]
enum WagesCommands {
    /// Create or replace a person's hourly rate
    Set(SetWageArgs),
    /// List hourly rates
    List,
}

#[derive(Args)]
struct SetWageArgs {
    #[arg(long, help = "Person the rate applies to")]
    person: String,
    #[arg(long, help = "Hourly rate, e.g. 12.50")]
    rate: String,
}

#[derive(Subcommand)]
enum ReportCommands {
    /// Machine minutes grouped by order or month
    MachineTime(MachineTimeArgs),
    /// Labor cost per production order
    Costs,
}

#[derive(Clone, Copy, ValueEnum)]
enum GroupByArg {
    Order,
    Month,
}

impl From<GroupByArg> for GroupingMode {
    fn from(value: GroupByArg) -> Self {
        match value {
            GroupByArg::Order => GroupingMode::ByOrder,
            GroupByArg::Month => GroupingMode::ByMonth,
        }
    }
}

#[derive(Args)]
struct MachineTimeArgs {
    #[arg(long = "by", value_enum, default_value = "order", help = "Grouping")]
    group_by: GroupByArg,
    #[arg(long = "order", help = "Only this production order (order grouping)")]
    order_id: Option<String>,
    #[arg(
        long,
        help = "Only this month, YYYY-MM (month grouping); defaults to the current month"
    )]
    month: Option<YearMonth>,
    #[arg(
        long = "all-months",
        action = ArgAction::SetTrue,
        conflicts_with = "month",
        help = "Show every month instead of only the current one"
    )]
    all_months: bool,
}

async fn initialize() -> Result<Dashboard> {
    let config = config::load_config().context("failed to load application config")?;
    config::init_tracing(config.log_level(), config.log_json);

    let record_store = store::from_config(&config)
        .await
        .context("failed to initialize record store")?;
    let ledger = LedgerService::new(record_store, config.report_locale);
    Ok(Dashboard::new(ledger))
}

async fn handle_records_command(
    dashboard: &mut Dashboard,
    command: RecordsCommands,
    json: bool,
) -> Result<()> {
    match command {
        RecordsCommands::Add(args) => {
            {
                let draft = dashboard.record_draft_mut();
                if let Some(date) = args.date {
                    draft.date = date;
                }
                draft.person = args.person;
                draft.order_id = args.order_id;
                draft.quantity = args.quantity;
                draft.item = args.item;
                draft.machine_minutes = args.minutes;
                draft.size = args.size;
                draft.machine = args.machine;
                draft.notes = args.notes.unwrap_or_default();
            }
            let outcome = dashboard.submit_record().await;
            finish_submit(dashboard, outcome, json)
        }
        RecordsCommands::List => {
            dashboard.refresh_records().await;
            let records = loaded(dashboard, |d| d.records().state())?;
            if json {
                print_json(&*records)?;
            } else if records.is_empty() {
                println!("No production records yet.");
            } else {
                println!("Production records ({} total):", records.len());
                for record in records.iter() {
                    render_record(record);
                }
            }
            Ok(())
        }
    }
}

async fn handle_wages_command(
    dashboard: &mut Dashboard,
    command: WagesCommands,
    json: bool,
) -> Result<()> {
    match command {
        WagesCommands::Set(args) => {
            {
                let draft = dashboard.wage_draft_mut();
                draft.person = args.person;
                draft.hourly_rate = args.rate;
            }
            let outcome = dashboard.submit_wage().await;
            finish_submit(dashboard, outcome, json)
        }
        WagesCommands::List => {
            dashboard.refresh_wages().await;
            let wages = loaded(dashboard, |d| d.wages().state())?;
            if json {
                print_json(&*wages)?;
            } else if wages.is_empty() {
                println!("No wages recorded.");
            } else {
                for wage in wages.iter() {
                    render_wage(wage);
                }
            }
            Ok(())
        }
    }
}

async fn handle_persons(dashboard: &mut Dashboard, json: bool) -> Result<()> {
    dashboard.refresh_persons().await;
    let persons = loaded(dashboard, |d| d.persons().state())?;
    if json {
        print_json(&*persons)?;
    } else {
        for person in persons.iter() {
            println!("- {}", person);
        }
    }
    Ok(())
}

async fn handle_report_command(
    dashboard: &mut Dashboard,
    command: ReportCommands,
    json: bool,
) -> Result<()> {
    match command {
        ReportCommands::MachineTime(args) => {
            dashboard.refresh_records().await;
            loaded(dashboard, |d| d.records().state())?;

            dashboard.set_grouping(args.group_by.into());
            dashboard.set_order_filter(args.order_id);
            if args.all_months {
                dashboard.set_month_filter(None);
            } else if let Some(month) = args.month {
                dashboard.set_month_filter(Some(month));
            }

            let totals = dashboard.grouped();
            if json {
                print_json(&serde_json::json!({
                    "totals": totals,
                    "chart": dashboard.chart(),
                }))?;
            } else {
                render_totals(&totals);
            }
            Ok(())
        }
        ReportCommands::Costs => {
            // Wages first so every record is costed at a known rate
            dashboard.refresh_wages().await;
            loaded(dashboard, |d| d.wages().state())?;
            dashboard.refresh_records().await;
            loaded(dashboard, |d| d.records().state())?;

            let summary = dashboard
                .cost_table()
                .context("failed to cost production orders")?
                .display_rounded();
            if json {
                print_json(&summary)?;
            } else if summary.orders.is_empty() {
                println!("No production records to cost.");
            } else {
                for order in &summary.orders {
                    println!(
                        "- {} • {} min • cost {}",
                        order.order_id, order.total_minutes, order.total_cost
                    );
                }
                let total = summary
                    .total_cost()
                    .ok_or_else(|| anyhow!("total labor cost overflows"))?;
                println!("Total: {}", round_for_display(total));
            }
            Ok(())
        }
    }
}

/// Returns the loaded list, or the fetch failure as an error.
fn loaded<T, F>(dashboard: &Dashboard, state: F) -> Result<std::sync::Arc<Vec<T>>>
where
    F: Fn(&Dashboard) -> &LoadState<T>,
{
    match state(dashboard) {
        LoadState::Ready(items) => Ok(items.clone()),
        LoadState::Failed(reason) => Err(anyhow!("{}", reason)),
        LoadState::Idle | LoadState::Loading(_) => bail!("data was not loaded"),
    }
}

fn finish_submit(dashboard: &mut Dashboard, outcome: SubmitOutcome, json: bool) -> Result<()> {
    let notifications = dashboard.drain_notifications();
    if json {
        print_json(&notifications)?;
    } else {
        notifications.iter().for_each(render_notification);
    }

    match outcome {
        SubmitOutcome::Saved => Ok(()),
        SubmitOutcome::Invalid(errors) => {
            bail!("invalid input: {}", describe_validation_errors(&errors))
        }
        SubmitOutcome::StoreFailed(e) => Err(anyhow!(e).context("submit failed")),
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_notification(notification: &Notification) {
    if notification.is_error() {
        eprintln!("{}: {}", notification.title, notification.description);
    } else {
        println!("{}: {}", notification.title, notification.description);
    }
}

fn render_record(record: &ProductionRecord) {
    println!(
        "- {} • {} • {} • {} x {} ({}) • {} min on {}{}",
        record.date,
        record.person,
        record.order_id,
        record.quantity,
        record.item,
        record.size,
        record.machine_minutes,
        record.machine,
        record
            .notes
            .as_deref()
            .map(|n| format!(" • {}", n))
            .unwrap_or_default()
    );
}

fn render_wage(wage: &WageRecord) {
    println!("- {} • {} / h", wage.person, wage.hourly_rate);
}

fn render_totals(totals: &GroupedTotals) {
    if totals.is_empty() {
        println!("No machine time for the selected filters.");
        return;
    }
    for group in &totals.groups {
        println!("{} • {} min", group.label, group.total_minutes);
        for entry in &group.breakdown {
            println!("  • {} {} min", entry.key, entry.minutes);
        }
    }
}
