use anyhow::{Context, Result};
use chrono::NaiveDate;
use cin7_fetch::config::{ClientConfig, SessionOptions};
use cin7_fetch::http::Record;
use cin7_fetch::query::filters::{self, PurchaseFilter, SaleFilter, StatusFilter};
use cin7_fetch::query::{Cin7Client, CountGroup};
use cin7_fetch::runtime::RealRuntime;
use clap::{ArgAction, Parser, ValueEnum};
use log::info;
use serde_json::{Map, Value};
use std::time::Duration;

/// cin7-fetch - Cin7 Core inventory API reader
///
/// Credentials are read from CLIENT_{n}_ACCOUNT_ID and CLIENT_{n}_API_KEY
/// (and optionally CLIENT_{n}_NAME), from the environment or a .env file in
/// the current directory. Every call is paced to the API's per-minute budget
/// and transient failures are retried.
///
/// Examples:
///   cin7-fetch check                       # Verify credentials
///   cin7-fetch counts sales                # Sale status counts
///   cin7-fetch list sales --since 2024-01-01
///   cin7-fetch --client 2 detail sale <ID>
#[derive(Parser, Debug)]
#[command(author, version = env!("CIN7_FETCH_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Client number whose CLIENT_{n}_* credentials are used
    #[arg(
        long,
        short = 'c',
        env = "CIN7_CLIENT",
        default_value_t = 1,
        value_name = "N",
        global = true
    )]
    client: u32,

    /// API root URL (defaults to the production endpoint; also via CIN7_API_URL)
    #[arg(long = "api-url", value_name = "URL", global = true)]
    api_url: Option<String>,

    /// Call budget per minute
    #[arg(
        long = "calls-per-minute",
        value_name = "N",
        default_value_t = cin7_fetch::http::governor::DEFAULT_CALLS_PER_MINUTE,
        global = true
    )]
    calls_per_minute: u32,

    /// Per-request timeout in seconds
    #[arg(
        long,
        value_name = "SECS",
        default_value_t = cin7_fetch::config::REQUEST_TIMEOUT.as_secs(),
        value_parser = clap::value_parser!(u64).range(1..),
        global = true
    )]
    timeout: u64,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Verify the credentials by fetching the location list
    Check,

    /// List the configured client numbers
    Clients,

    /// Print a batch of status counts as JSON
    Counts {
        #[arg(value_enum)]
        group: CountsArg,
    },

    /// Print every record of a list endpoint as a JSON array
    List(ListArgs),

    /// Print a single record as a JSON object
    Detail {
        #[arg(value_enum)]
        kind: DetailKind,

        /// Record ID (TaskID for stock tasks and assemblies)
        id: String,
    },
}

#[derive(clap::Args, Debug)]
struct ListArgs {
    #[arg(value_enum)]
    resource: Resource,

    /// Only records modified on or after this date (YYYY-MM-DD)
    #[arg(long, value_name = "DATE", conflicts_with = "days")]
    since: Option<NaiveDate>,

    /// Only records modified in the last N days
    #[arg(long, value_name = "N")]
    days: Option<u32>,

    /// SKU filter (products, availability)
    #[arg(long)]
    sku: Option<String>,

    /// Name filter (products, customers, suppliers)
    #[arg(long)]
    name: Option<String>,

    /// Location filter (availability)
    #[arg(long)]
    location: Option<String>,
}

impl ListArgs {
    fn modified_since(&self) -> Option<NaiveDate> {
        self.since.or_else(|| self.days.map(filters::since_days_ago))
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum CountsArg {
    Sales,
    Purchases,
    Assemblies,
    Production,
    Transfers,
    All,
}

impl CountsArg {
    fn groups(self) -> Vec<CountGroup> {
        match self {
            CountsArg::Sales => vec![CountGroup::Sales],
            CountsArg::Purchases => vec![CountGroup::Purchases],
            CountsArg::Assemblies => vec![CountGroup::Assemblies],
            CountsArg::Production => vec![CountGroup::Production],
            CountsArg::Transfers => vec![CountGroup::Transfers],
            CountsArg::All => CountGroup::ALL.to_vec(),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Resource {
    Sales,
    SaleCreditNotes,
    Purchases,
    PurchaseCreditNotes,
    StockAdjustments,
    StockTakes,
    StockTransfers,
    Assemblies,
    ProductionOrders,
    Products,
    Availability,
    Customers,
    Suppliers,
    Locations,
    PaymentTerms,
    TaxRules,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum DetailKind {
    Sale,
    SaleCreditNote,
    Purchase,
    StockAdjustment,
    StockTake,
    StockTransfer,
    Assembly,
    ProductionOrder,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let default_filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let runtime = RealRuntime;

    if let Commands::Clients = cli.command {
        let clients = ClientConfig::discover(&runtime);
        if clients.is_empty() {
            println!("No clients configured. Set CLIENT_1_ACCOUNT_ID and CLIENT_1_API_KEY.");
        }
        for (index, name) in clients {
            println!("{}\t{}", index, name);
        }
        return Ok(());
    }

    let mut config = ClientConfig::from_env(&runtime, cli.client)?;
    if let Some(url) = &cli.api_url {
        config = config.with_base_url(url);
    }
    let options = SessionOptions::per_minute(cli.calls_per_minute)
        .with_request_timeout(Duration::from_secs(cli.timeout));
    let client = Cin7Client::new(config, options)?;
    info!("Using client {} ({})", cli.client, client.name());

    let token = client.session().cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    match cli.command {
        Commands::Check => {
            let locations = client
                .locations()
                .await
                .context("Connection check failed")?;
            println!(
                "Connected to {}: {} locations found",
                client.name(),
                locations.len()
            );
        }
        Commands::Clients => {}
        Commands::Counts { group } => {
            let mut out = Map::new();
            for group in group.groups() {
                let counts = client.status_counts(group).await?;
                let counts: Map<String, Value> = counts
                    .into_iter()
                    .map(|c| (c.name.to_string(), Value::from(c.count)))
                    .collect();
                out.insert(group.to_string(), Value::Object(counts));
            }
            print_json(&Value::Object(out))?;
        }
        Commands::List(args) => {
            let records = list(&client, &args).await?;
            info!("{} records", records.len());
            let records: Vec<Value> = records.into_iter().map(Value::Object).collect();
            print_json(&Value::Array(records))?;
        }
        Commands::Detail { kind, id } => {
            let record = detail(&client, kind, &id).await?;
            print_json(&Value::Object(record))?;
        }
    }
    Ok(())
}

async fn list(client: &Cin7Client, args: &ListArgs) -> Result<Vec<Record>> {
    let since = args.modified_since();
    let sku = args.sku.as_deref();
    let name = args.name.as_deref();

    match args.resource {
        Resource::Sales => {
            let filter = SaleFilter {
                modified_since: since,
                ..Default::default()
            };
            client.sale_list(&filter).await
        }
        Resource::SaleCreditNotes => client.sale_credit_notes(since).await,
        Resource::Purchases => {
            let filter = PurchaseFilter {
                modified_since: since,
                ..Default::default()
            };
            client.purchase_list(&filter).await
        }
        Resource::PurchaseCreditNotes => client.purchase_credit_notes(since).await,
        Resource::StockAdjustments => client.stock_adjustments(&since_filter(since)).await,
        Resource::StockTakes => client.stock_takes(&since_filter(since)).await,
        Resource::StockTransfers => client.stock_transfers(&since_filter(since)).await,
        Resource::Assemblies => client.finished_goods(&since_filter(since)).await,
        Resource::ProductionOrders => client.production_orders(&since_filter(since)).await,
        Resource::Products => client.products(sku, name, since).await,
        Resource::Availability => {
            client
                .product_availability(sku, args.location.as_deref())
                .await
        }
        Resource::Customers => client.customers(name, since).await,
        Resource::Suppliers => client.suppliers(name, since).await,
        Resource::Locations => client.locations().await,
        Resource::PaymentTerms => client.payment_terms().await,
        Resource::TaxRules => client.tax_rules().await,
    }
}

fn since_filter<S>(since: Option<NaiveDate>) -> StatusFilter<S> {
    StatusFilter {
        status: None,
        modified_since: since,
    }
}

async fn detail(client: &Cin7Client, kind: DetailKind, id: &str) -> Result<Record> {
    match kind {
        DetailKind::Sale => client.sale_detail(id).await,
        DetailKind::SaleCreditNote => client.sale_credit_note_detail(id).await,
        DetailKind::Purchase => client.purchase_detail(id).await,
        DetailKind::StockAdjustment => client.stock_adjustment_detail(id).await,
        DetailKind::StockTake => client.stock_take_detail(id).await,
        DetailKind::StockTransfer => client.stock_transfer_detail(id).await,
        DetailKind::Assembly => client.finished_goods_detail(id).await,
        DetailKind::ProductionOrder => client.production_order_detail(id).await,
    }
}

fn print_json(value: &Value) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", text);
    Ok(())
}
