use clap::{Parser, Subcommand};
use log::LevelFilter;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use reportkit::config::{Key, CONFIG_FILE_NAME, CONFIG_TEMPLATE};
use reportkit::document::{
    available_templates, create_invoice, create_quote, BaseDocument, Document, InvoiceRequest,
    LineItem, Party, QuoteRequest,
};
use reportkit::error::{ReportError, Result};
use reportkit::section::{Footer, Header, Kpi, KpiChange, Kpis, Section, Table as TableSection};
use reportkit::{viewer, RenderContext, Report, Settings};

#[derive(Parser)]
#[command(name = "reportkit")]
#[command(version, about = "HTML and PDF documents and reports from templates", long_about = None)]
struct Cli {
    /// Log what is resolved and rendered
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// View and manage configuration (defaults to `show`)
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },

    /// Generate a two-page demo sales report
    Demo {
        /// Format to render with
        #[arg(short, long, default_value = "default")]
        format: String,

        /// Output file name without extension (default: demo_report)
        #[arg(short, long)]
        output: Option<String>,

        /// Also export a PDF
        #[arg(long)]
        pdf: bool,

        /// Open the HTML in a browser afterwards
        #[arg(long)]
        open: bool,
    },

    /// List available formats
    Formats {
        /// Show the files each format provides
        #[arg(long)]
        details: bool,
    },

    /// List available document templates
    Templates,

    /// Generate an invoice
    Invoice {
        #[command(flatten)]
        doc: DocArgs,

        /// VAT rate applied to items without their own rate
        #[arg(long, default_value_t = reportkit::document::DEFAULT_TAX_RATE)]
        tax_rate: f64,

        /// Open the result afterwards
        #[arg(long)]
        open: bool,
    },

    /// Generate a quote
    Quote {
        #[command(flatten)]
        doc: DocArgs,

        /// VAT rate
        #[arg(long, default_value_t = reportkit::document::DEFAULT_TAX_RATE)]
        tax_rate: f64,

        /// Discount percentage
        #[arg(long, default_value_t = 0.0)]
        discount: f64,

        /// Days the quote stays valid
        #[arg(long, default_value_t = 30)]
        validity_days: u64,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the resolved configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a value and save it to the config file
    Set { key: String, value: String },

    /// Remove the config file so defaults apply again
    Reset,

    /// Create reportkit.toml in the current directory
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(clap::Args)]
struct DocArgs {
    /// Document number
    #[arg(short, long)]
    number: String,

    /// Issuer name
    #[arg(long, default_value = "My Company Ltd.")]
    company: String,

    /// Recipient name
    #[arg(long, default_value = "Client Corp.")]
    client: String,

    /// Line items as "description:quantity:unit_price" (can be repeated)
    #[arg(short, long, value_name = "DESC:QTY:PRICE")]
    item: Vec<String>,

    /// Output file name without extension
    #[arg(short, long)]
    output: Option<String>,

    /// Export as PDF, falling back to HTML when no PDF renderer is installed
    #[arg(long)]
    pdf: bool,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

fn run(command: Commands) -> Result<()> {
    let settings = Settings::new();
    match command {
        Commands::Config { action } => match action.unwrap_or(ConfigAction::Show { json: false }) {
            ConfigAction::Show { json } => cmd_config_show(&settings, json),
            ConfigAction::Set { key, value } => cmd_config_set(settings, &key, &value),
            ConfigAction::Reset => cmd_config_reset(settings),
            ConfigAction::Init { force } => cmd_config_init(force),
        },
        Commands::Demo {
            format,
            output,
            pdf,
            open,
        } => cmd_demo(settings, &format, output, pdf, open),
        Commands::Formats { details } => cmd_formats(&settings, details),
        Commands::Templates => cmd_templates(&settings),
        Commands::Invoice {
            doc,
            tax_rate,
            open,
        } => cmd_invoice(settings, doc, tax_rate, open),
        Commands::Quote {
            doc,
            tax_rate,
            discount,
            validity_days,
        } => cmd_quote(settings, doc, tax_rate, discount, validity_days),
    }
}

#[derive(Tabled)]
struct SettingRow {
    #[tabled(rename = "KEY")]
    key: String,
    #[tabled(rename = "VALUE")]
    value: String,
    #[tabled(rename = "ENV")]
    env: String,
}

#[derive(Tabled)]
struct FormatRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "DEFAULT")]
    default: String,
    #[tabled(rename = "FILES")]
    files: String,
}

#[derive(Tabled)]
struct TemplateRow {
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "FILE")]
    file: String,
}

fn cmd_config_show(settings: &Settings, json: bool) -> Result<()> {
    let snapshot = settings.snapshot();
    if json {
        let out = serde_json::to_string_pretty(&snapshot).map_err(|e| {
            ReportError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                e.to_string(),
            ))
        })?;
        println!("{out}");
        return Ok(());
    }

    let rows: Vec<SettingRow> = Key::ALL
        .into_iter()
        .map(|key| SettingRow {
            key: key.name().to_string(),
            value: snapshot.values.get(key.name()).cloned().unwrap_or_default(),
            env: if snapshot.env_overrides.contains_key(&key.env_var()) {
                key.env_var()
            } else {
                String::new()
            },
        })
        .collect();

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    let marker = if snapshot.config_file.exists() {
        ""
    } else {
        " (not found)"
    };
    println!("Config file: {}{marker}", snapshot.config_file.display());
    Ok(())
}

fn cmd_config_set(mut settings: Settings, key: &str, value: &str) -> Result<()> {
    let path = settings.persist(key, value)?;
    println!("Set {key} = {}", settings.get(key)?);
    println!("Saved to {}", path.display());
    Ok(())
}

fn cmd_config_reset(mut settings: Settings) -> Result<()> {
    let path = settings.config_file_path();
    if path.exists() {
        fs::remove_file(&path)?;
        println!("Removed {}", path.display());
    }
    settings.reset();
    println!("Configuration reset to defaults");
    Ok(())
}

fn cmd_config_init(force: bool) -> Result<()> {
    let path = std::env::current_dir()?.join(CONFIG_FILE_NAME);
    if path.exists() && !force {
        return Err(ReportError::AlreadyExists(path));
    }
    fs::write(&path, CONFIG_TEMPLATE)?;

    println!("Created config file: {}", path.display());
    println!();
    println!("Point reportkit at it with:");
    println!("  export REPORTKIT_CONFIG_FILE={}", path.display());
    Ok(())
}

fn demo_report() -> Report {
    let mut report = Report::new("Demo Sales Report Q4 2025");

    let page = report.add_page();
    page.set_header(Header::new("Sales Report").subtitle("Q4 2025"))
        .set_footer(Footer::new("Generated with reportkit", "", "Page 1"))
        .add_section(Section::kpis(
            "kpis",
            Kpis::new(vec![
                Kpi::new("Total Sales", "€ 125,430").change(KpiChange::Percent(15.0)),
                Kpi::new("New Customers", "48").change(KpiChange::Percent(8.0)),
                Kpi::new("Avg Order", "€ 2,613").change(KpiChange::Percent(-3.0)),
            ])
            .title("Key Metrics"),
        ))
        .add_section(Section::table(
            "products",
            TableSection::new(
                strings(&["Product", "Units", "Unit Price", "Total"]),
                vec![
                    cells(&["Product A", "150", "€ 29.99", "€ 4,498.50"]),
                    cells(&["Product B", "320", "€ 49.99", "€ 15,996.80"]),
                    cells(&["Product C", "85", "€ 199.99", "€ 16,999.15"]),
                ],
            )
            .title("Sales by Product")
            .footer_row(cells(&["Total", "555", "", "€ 37,494.45"])),
        ));

    let page = report.add_page();
    page.set_header(Header::new("Regional Breakdown").subtitle("Q4 2025"))
        .set_footer(Footer::new("Confidential", "", "Page 2"))
        .add_section(Section::table(
            "regions",
            TableSection::new(
                strings(&["Region", "Sales", "% of Total", "Growth"]),
                vec![
                    cells(&["North", "€ 45,200", "36%", "+18%"]),
                    cells(&["South", "€ 32,100", "26%", "+12%"]),
                    cells(&["East", "€ 28,500", "23%", "+8%"]),
                    cells(&["West", "€ 19,630", "15%", "+5%"]),
                ],
            )
            .title("Sales by Region"),
        ))
        .add_section(
            Section::new(
                "notes",
                json!({ "content": "Figures cover all regions. Pending final audit." })
                    .as_object()
                    .cloned()
                    .unwrap_or_default(),
            )
            .template(
                "<div class=\"info-box\">\n    <strong>Notes:</strong><br>\n    {{ content }}\n</div>",
            )
            .css(".info-box { border-left: 4px solid var(--primary-color); padding: 10px 15px; margin-top: 20px; }"),
        );

    report
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn cells(values: &[&str]) -> Vec<serde_json::Value> {
    values.iter().map(|s| json!(s)).collect()
}

fn cmd_demo(
    settings: Settings,
    format: &str,
    output: Option<String>,
    pdf: bool,
    open: bool,
) -> Result<()> {
    let mut ctx = RenderContext::new(settings);
    ctx.set_default_format(format)?;
    println!("Using format: {format}");

    let report = demo_report();
    let name = output.unwrap_or_else(|| "demo_report".to_string());

    let html_path = report.export_html(&ctx, None, &format!("{name}.html"))?;
    println!("HTML saved: {}", html_path.display());

    if pdf {
        match report.export_pdf(&ctx, None, &format!("{name}.pdf")) {
            Ok(path) => println!("PDF saved: {}", path.display()),
            Err(e) => println!("PDF not available: {e}"),
        }
    }

    if open {
        viewer::open_path(&html_path, None)?;
        println!("Opened in browser");
    }
    Ok(())
}

fn cmd_formats(settings: &Settings, details: bool) -> Result<()> {
    let ctx = RenderContext::new(settings.clone());
    let formats = ctx.formats();
    let names = formats.available_formats();

    println!("Formats directory: {}", formats.formats_dir().display());
    if names.is_empty() {
        println!("No formats found.");
        return Ok(());
    }

    let mut rows = Vec::with_capacity(names.len());
    for name in names {
        let files = formats.format_files(&name)?;
        rows.push(FormatRow {
            default: if name == formats.active() { "*" } else { "" }.to_string(),
            files: if details {
                files.join(", ")
            } else {
                files.len().to_string()
            },
            name,
        });
    }

    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

fn cmd_templates(settings: &Settings) -> Result<()> {
    let dir = settings.templates_dir();
    println!("Templates directory: {}", dir.display());

    let names = available_templates(&dir);
    if names.is_empty() {
        println!("No templates found.");
        return Ok(());
    }

    let rows: Vec<TemplateRow> = names
        .into_iter()
        .map(|name| TemplateRow {
            file: format!("{name}.html"),
            name,
        })
        .collect();
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{table}");
    Ok(())
}

/// Parse "description:quantity:unit_price". Quantity and price are optional
/// and default to 1 and 0.
fn parse_item(input: &str) -> Result<LineItem> {
    let mut parts = input.rsplitn(3, ':').collect::<Vec<_>>();
    parts.reverse();
    let invalid = || {
        ReportError::InvalidValue {
            key: "item".to_string(),
            value: input.to_string(),
            expected: "DESC:QTY:PRICE".to_string(),
        }
    };
    let number = |s: &str| s.trim().parse::<f64>().map_err(|_| invalid());
    match parts.as_slice() {
        [desc, qty, price] => Ok(LineItem::new(*desc, number(qty)?, number(price)?)),
        [desc, qty] => Ok(LineItem::new(*desc, number(qty)?, 0.0)),
        [desc] if !desc.trim().is_empty() => Ok(LineItem::new(*desc, 1.0, 0.0)),
        _ => Err(invalid()),
    }
}

fn line_items(inputs: &[String]) -> Result<Vec<LineItem>> {
    if inputs.is_empty() {
        return Ok(vec![LineItem::new("Service / Product", 1.0, 100.0)]);
    }
    inputs.iter().map(|s| parse_item(s)).collect()
}

fn file_stem(prefix: &str, doc: &DocArgs) -> String {
    doc.output
        .clone()
        .unwrap_or_else(|| format!("{prefix}_{}", doc.number.replace(['-', '/'], "_")))
}

/// Export as PDF when asked, degrading to HTML if the renderer is missing.
fn export(ctx: &RenderContext, document: &Document, stem: &str, pdf: bool) -> Result<PathBuf> {
    if pdf {
        match document.export_pdf(ctx, None, &format!("{stem}.pdf")) {
            Ok(path) => {
                println!("PDF saved: {}", path.display());
                return Ok(path);
            }
            Err(e @ ReportError::PdfUnavailable { .. }) => println!("PDF not available: {e}"),
            Err(e) => return Err(e),
        }
    }
    let path = document.export_html(ctx, None, &format!("{stem}.html"))?;
    println!("HTML saved: {}", path.display());
    Ok(path)
}

fn cmd_invoice(settings: Settings, doc: DocArgs, tax_rate: f64, open: bool) -> Result<()> {
    println!("Creating invoice {}...", doc.number);
    let ctx = RenderContext::new(settings);

    let mut request = InvoiceRequest::new(
        doc.number.clone(),
        Party::new(&doc.company),
        Party::new(&doc.client),
        line_items(&doc.item)?,
    );
    request.tax_rate = tax_rate;
    let invoice = create_invoice(request);

    let path = export(&ctx, &invoice, &file_stem("invoice", &doc), doc.pdf)?;
    if open {
        open_output(&path)?;
    }
    Ok(())
}

fn cmd_quote(
    settings: Settings,
    doc: DocArgs,
    tax_rate: f64,
    discount: f64,
    validity_days: u64,
) -> Result<()> {
    println!("Creating quote {}...", doc.number);
    let ctx = RenderContext::new(settings);

    let mut request = QuoteRequest::new(
        doc.number.clone(),
        Party::new(&doc.company),
        Party::new(&doc.client),
        line_items(&doc.item)?,
    );
    request.tax_rate = tax_rate;
    request.discount = discount;
    request.validity_days = validity_days;
    let quote = create_quote(request);

    export(&ctx, &quote, &file_stem("quote", &doc), doc.pdf)?;
    Ok(())
}

fn open_output(path: &Path) -> Result<()> {
    viewer::open_path(path, None)?;
    println!("Opened {}", path.display());
    Ok(())
}
