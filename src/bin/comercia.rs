use std::io::{self, Write};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use comercia_fulfillment::cart::CartStore;
use comercia_fulfillment::config::AppConfig;
use comercia_fulfillment::invoice::render::render_receipt;
use comercia_fulfillment::invoice::{InvoiceParty, PaymentReceipt};
use comercia_fulfillment::logging::{setup_logger, LoggerConfig};
use comercia_fulfillment::models::cart::{finalize_quantity_input, parse_quantity_input};
use comercia_fulfillment::models::order::{OrderStatus, PaymentMethod};
use comercia_fulfillment::services::submission::{OrderSubmission, PaymentInstruction};
use comercia_fulfillment::FulfillmentClient;
use rust_decimal::Decimal;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "comercia", about = "Comercia fulfillment CLI", version)]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON when available"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(subcommand)]
    Cart(CartCommands),
    /// Submit the current cart as an order
    Checkout(CheckoutArgs),
    #[command(subcommand)]
    Orders(OrdersCommands),
    #[command(subcommand)]
    Invoice(InvoiceCommands),
}

#[derive(Subcommand)]
enum CartCommands {
    /// Show the cart contents
    Show,
    /// Search the catalog and add the first matching product
    Add(CartAddArgs),
    /// Change a line's quantity (0 removes it)
    SetQuantity(CartSetQuantityArgs),
    /// Remove a line
    Remove(CartRemoveArgs),
    /// Empty the cart
    Clear,
}

#[derive(Args)]
struct CartAddArgs {
    /// Name or SKU fragment to search for
    term: String,
    /// Quantity; an empty value counts as 1
    #[arg(long, default_value = "1")]
    quantity: String,
}

#[derive(Args)]
struct CartSetQuantityArgs {
    product_id: Uuid,
    quantity: i32,
}

#[derive(Args)]
struct CartRemoveArgs {
    product_id: Uuid,
}

#[derive(Args)]
struct CheckoutArgs {
    #[arg(long, help = "Customer to bill the order to")]
    customer_id: Option<Uuid>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long, help = "Payment received now; 0 registers the order as debt")]
    amount: Option<Decimal>,
    #[arg(long, help = "cash, card or transfer")]
    method: Option<String>,
    #[arg(long, action = ArgAction::SetTrue, help = "Mark the order as sent after saving")]
    send: bool,
}

#[derive(Subcommand)]
enum OrdersCommands {
    List(OrdersListArgs),
    Show(OrdersShowArgs),
    /// Transition an order's status
    SetStatus(OrdersSetStatusArgs),
}

#[derive(Args)]
struct OrdersListArgs {
    #[arg(long, default_value_t = 1)]
    page: u64,
    #[arg(long)]
    search: Option<String>,
}

#[derive(Args)]
struct OrdersShowArgs {
    id: Uuid,
}

#[derive(Args)]
struct OrdersSetStatusArgs {
    id: Uuid,
    /// received, in_process or sent
    status: String,
}

#[derive(Subcommand)]
enum InvoiceCommands {
    /// Rebuild and replace the invoice attached to an order
    Regenerate(InvoiceOrderArgs),
    /// Remove the invoice attachment (asks for confirmation)
    Delete(InvoiceDeleteArgs),
    /// Render a payment receipt for an order to a local PDF
    Receipt(InvoiceReceiptArgs),
}

#[derive(Args)]
struct InvoiceOrderArgs {
    order_id: Uuid,
}

#[derive(Args)]
struct InvoiceDeleteArgs {
    order_id: Uuid,
    #[arg(long, action = ArgAction::SetTrue, help = "Skip the confirmation prompt")]
    yes: bool,
}

#[derive(Args)]
struct InvoiceReceiptArgs {
    order_id: Uuid,
    /// Amount received for this (possibly partial) payment
    #[arg(long)]
    amount: Decimal,
    #[arg(long, help = "cash, card or transfer")]
    method: Option<String>,
    #[arg(long, default_value = "recibo.pdf")]
    out: std::path::PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::load().context("failed to load configuration")?;
    setup_logger(LoggerConfig::with_level(&config.log_level));

    let client = FulfillmentClient::new(&config)?;
    let cart = client.open_cart(&config)?;

    match cli.command {
        Commands::Cart(command) => handle_cart_command(&client, &cart, command).await?,
        Commands::Checkout(args) => handle_checkout(&client, &cart, args, cli.json).await?,
        Commands::Orders(command) => handle_orders_command(&client, command, cli.json).await?,
        Commands::Invoice(command) => handle_invoice_command(&client, command).await?,
    }

    Ok(())
}

async fn handle_cart_command(
    client: &FulfillmentClient,
    cart: &CartStore,
    command: CartCommands,
) -> Result<()> {
    match command {
        CartCommands::Show => {
            let state = cart.snapshot();
            if state.is_empty() {
                println!("cart is empty");
                return Ok(());
            }
            for item in &state.items {
                println!(
                    "{}  x{}  {:.2}  ({})",
                    item.name,
                    item.quantity,
                    item.subtotal(),
                    item.product_id
                );
            }
            println!("total: {:.2}", state.total());
        }
        CartCommands::Add(args) => {
            let quantity = finalize_quantity_input(parse_quantity_input(&args.quantity));
            let found = client.products.search(&args.term).await?;
            let product = found
                .first()
                .ok_or_else(|| anyhow!("no product matches \"{}\"", args.term))?;
            cart.add_item(product, quantity)?;
            println!("added {} x{quantity}", product.name);
        }
        CartCommands::SetQuantity(args) => {
            cart.update_quantity(args.product_id, args.quantity)?;
            println!("updated");
        }
        CartCommands::Remove(args) => {
            cart.remove_item(args.product_id)?;
            println!("removed");
        }
        CartCommands::Clear => {
            cart.clear()?;
            println!("cart cleared");
        }
    }
    Ok(())
}

async fn handle_checkout(
    client: &FulfillmentClient,
    cart: &CartStore,
    args: CheckoutArgs,
    json: bool,
) -> Result<()> {
    let payment = match args.amount {
        Some(amount) => Some(PaymentInstruction {
            amount,
            method: args
                .method
                .as_deref()
                .map(PaymentMethod::from_str)
                .transpose()
                .map_err(|_| anyhow!("unknown payment method"))?,
        }),
        None => None,
    };

    // Best-effort: company detail enriches the invoice issuer block but is
    // never allowed to block checkout.
    let session_company = match cart.company_id() {
        Some(company_id) => client.parties.company(company_id).await.ok(),
        None => None,
    };

    let submission = OrderSubmission {
        company_id: cart.company_id(),
        customer_id: args.customer_id,
        items: cart.selection(),
        description: args.description,
        payment,
        mark_as_sent: args.send,
        existing_order_id: None,
        session_company,
    };

    let report = client.submission.submit(submission).await?;
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "orderId": report.order_id,
                "orderCode": report.order_code,
                "warnings": report.warnings.iter().map(|w| w.to_string()).collect::<Vec<_>>(),
            }))?
        );
    } else {
        println!("{}", report.summary());
    }

    // The basket's job is done once the order is committed.
    cart.clear()?;
    Ok(())
}

async fn handle_orders_command(
    client: &FulfillmentClient,
    command: OrdersCommands,
    json: bool,
) -> Result<()> {
    match command {
        OrdersCommands::List(args) => {
            let page = client
                .orders
                .list(&comercia_fulfillment::api::orders::OrderListQuery {
                    page: Some(args.page),
                    search: args.search,
                    ..Default::default()
                })
                .await?;
            for order in &page.data {
                println!(
                    "{}  {}  {:.2}",
                    order.reference().unwrap_or_else(|| "-".into()),
                    order.status,
                    order.total()
                );
            }
        }
        OrdersCommands::Show(args) => {
            let order = client.orders.get(args.id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&order)?);
            } else {
                println!(
                    "{}  {}  items: {}  invoice: {}",
                    order.reference().unwrap_or_else(|| "-".into()),
                    order.status,
                    order.items.len(),
                    order.invoice_filename.as_deref().unwrap_or("none")
                );
            }
        }
        OrdersCommands::SetStatus(args) => {
            let status = OrderStatus::from_str(&args.status)
                .map_err(|_| anyhow!("unknown status \"{}\"", args.status))?;
            let order = client.orders.get(args.id).await?;
            let change = client.status.set_status(&order, status).await?;
            println!("status: {} -> {}", change.previous, change.order.status);
            if let Some(invoice) = &change.invoice {
                println!("invoice generated: {}", invoice.filename);
            }
            if let Some(warning) = &change.invoice_warning {
                println!("warning: {warning}");
            }
        }
    }
    Ok(())
}

async fn handle_invoice_command(
    client: &FulfillmentClient,
    command: InvoiceCommands,
) -> Result<()> {
    match command {
        InvoiceCommands::Regenerate(args) => {
            let attachment = client.attachments.regenerate(args.order_id).await?;
            println!("invoice replaced: {}", attachment.filename);
        }
        InvoiceCommands::Delete(args) => {
            if !args.yes && !confirm("Delete the invoice attachment? This cannot be undone.")? {
                println!("aborted");
                return Ok(());
            }
            client.attachments.delete(args.order_id).await?;
            println!("invoice deleted");
        }
        InvoiceCommands::Receipt(args) => {
            let order = client.orders.get(args.order_id).await?;
            let receipt = PaymentReceipt {
                order_code: order.reference(),
                amount: args.amount,
                method: args
                    .method
                    .as_deref()
                    .map(PaymentMethod::from_str)
                    .transpose()
                    .map_err(|_| anyhow!("unknown payment method"))?,
                received_at: Some(chrono::Utc::now()),
                payer: InvoiceParty::default(),
            };
            let document = render_receipt(&receipt)?;
            std::fs::write(&args.out, document)?;
            println!("receipt written to {}", args.out.display());
        }
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
