use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing::debug;

use expense_statement_lib::config::{init_tracing, GlobalArgs};
use expense_statement_lib::format::{now_local, MoneyFormat};
use expense_statement_lib::profile::{
    load_company_settings, load_employee_details, save_company_settings, save_employee_details,
};
use expense_statement_lib::statement::{build_statement, deliver, Delivery, OutputMode, StatementRequest};
use expense_statement_lib::{Config, EmployeeDetails, ExpenseRegistry, FormController, ListView, Store, Submission};

#[derive(Parser, Debug)]
#[command(name = "expenses", about = "Track expenses and print monthly expense statements")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record a new expense
    Add {
        #[arg(long)]
        date: String,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long)]
        amount: String,
        #[arg(long, default_value = "")]
        details: String,
        /// Receipt file to embed
        #[arg(long)]
        attachment: Option<PathBuf>,
    },

    /// Change the expense at position <N>; omitted fields keep their value
    Edit {
        position: usize,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        amount: Option<String>,
        #[arg(long)]
        details: Option<String>,
        /// Replacement receipt file
        #[arg(long)]
        attachment: Option<PathBuf>,
    },

    /// Drop the receipt of the expense at position <N>
    RemoveAttachment { position: usize },

    /// Delete the expense at position <N>
    Delete { position: usize },

    /// Print the expense table
    List,

    /// Print the receipt gallery
    Gallery,

    /// Receipt file operations
    Attachment {
        #[command(subcommand)]
        action: AttachmentAction,
    },

    /// Set the company name and logo
    Company {
        #[arg(long)]
        name: String,
        /// Logo image; the current logo is kept when omitted
        #[arg(long)]
        logo: Option<PathBuf>,
    },

    /// Set the employee details printed on statements
    Employee {
        #[arg(long, default_value = "")]
        code: String,
        #[arg(long, default_value = "")]
        name: String,
        #[arg(long, default_value = "")]
        department: String,
        #[arg(long, default_value = "")]
        designation: String,
        #[arg(long, default_value = "")]
        location: String,
        #[arg(long, default_value = "")]
        reporting_head: String,
    },

    /// Company and employee profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },

    /// Generate this month's expense statement
    Statement {
        /// Open in the system PDF viewer instead of saving
        #[arg(long)]
        preview: bool,
        /// Directory to save into (overrides config file)
        #[arg(long, conflicts_with = "preview")]
        out_dir: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum AttachmentAction {
    /// Write the receipt of the expense at position <N> to <PATH>
    Save { position: usize, path: PathBuf },
}

#[derive(Subcommand, Debug)]
enum ProfileAction {
    Show,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.global)?;
    init_tracing(&config.logging);
    debug!(db = %config.storage.db_path.display(), "configuration loaded");

    let store = Store::open(&config.storage.db_path)
        .with_context(|| format!("failed to open {}", config.storage.db_path.display()))?;
    let money = config.money_format();

    match cli.command {
        Command::Add {
            date,
            category,
            amount,
            details,
            attachment,
        } => {
            let mut registry = open_registry(&store, &money)?;
            let mut form = FormController::new();
            form.fields.date = date;
            form.fields.category = category;
            form.fields.amount = amount;
            form.fields.details = details;
            form.fields.attachment_file = attachment;
            report(form.submit(&mut registry)?, &registry, &money);
        }
        Command::Edit {
            position,
            date,
            category,
            amount,
            details,
            attachment,
        } => {
            let mut registry = open_registry(&store, &money)?;
            let id = registry.id_at(position)?;
            let mut form = FormController::new();
            form.begin_edit(&registry, id)?;
            if let Some(v) = date {
                form.fields.date = v;
            }
            if let Some(v) = category {
                form.fields.category = v;
            }
            if let Some(v) = amount {
                form.fields.amount = v;
            }
            if let Some(v) = details {
                form.fields.details = v;
            }
            form.fields.attachment_file = attachment;
            report(form.submit(&mut registry)?, &registry, &money);
        }
        Command::RemoveAttachment { position } => {
            let mut registry = open_registry(&store, &money)?;
            let id = registry.id_at(position)?;
            let mut form = FormController::new();
            form.begin_edit(&registry, id)?;
            if form.remove_attachment(&mut registry)? {
                println!("Removed attachment from expense {position}.");
            }
            form.cancel();
        }
        Command::Delete { position } => {
            let mut registry = open_registry(&store, &money)?;
            let id = registry.id_at(position)?;
            let removed = registry.remove(&id)?;
            println!("Deleted expense {position} ({}).", removed.details);
        }
        Command::List => {
            let registry = ExpenseRegistry::load(&store)?;
            let view = ListView::project(registry.expenses(), &money);
            println!("{}", view.render_table());
            println!("Total: {}", money.format(registry.total()));
        }
        Command::Gallery => {
            let registry = ExpenseRegistry::load(&store)?;
            let view = ListView::project(registry.expenses(), &money);
            if view.gallery.is_empty() {
                println!("No receipts attached.");
            } else {
                println!("{}", view.render_gallery());
            }
        }
        Command::Attachment {
            action: AttachmentAction::Save { position, path },
        } => {
            let registry = ExpenseRegistry::load(&store)?;
            let id = registry.id_at(position)?;
            let attachment = registry
                .get(&id)
                .and_then(|e| e.attachment.as_ref())
                .with_context(|| format!("expense {position} has no attachment"))?;
            attachment.save_to(&path)?;
            println!("Saved {} to {}.", attachment.mime(), path.display());
        }
        Command::Company { name, logo } => {
            let settings = save_company_settings(&store, &name, logo.as_deref())?;
            println!(
                "Company settings saved: {} ({}).",
                settings.name,
                if settings.logo.is_some() { "with logo" } else { "no logo" }
            );
        }
        Command::Employee {
            code,
            name,
            department,
            designation,
            location,
            reporting_head,
        } => {
            let details = EmployeeDetails {
                emp_code: code,
                emp_name: name,
                department,
                designation,
                location,
                reporting_head,
            };
            save_employee_details(&store, &details)?;
            println!("Employee details saved.");
        }
        Command::Profile {
            action: ProfileAction::Show,
        } => {
            let company = load_company_settings(&store)?;
            let emp = load_employee_details(&store)?;
            let logo = company.logo.as_ref().map(|l| l.mime()).unwrap_or_else(|| "none".to_string());
            println!("Company:        {}", company.name);
            println!("Logo:           {logo}");
            println!("Employee Code:  {}", emp.emp_code);
            println!("Employee Name:  {}", emp.emp_name);
            println!("Department:     {}", emp.department);
            println!("Designation:    {}", emp.designation);
            println!("Location:       {}", emp.location);
            println!("Reporting Head: {}", emp.reporting_head);
        }
        Command::Statement { preview, out_dir } => {
            let registry = ExpenseRegistry::load(&store)?;
            let company = load_company_settings(&store)?;
            let employee = load_employee_details(&store)?;
            let statement = build_statement(&StatementRequest {
                company: &company,
                employee: &employee,
                expenses: registry.expenses(),
                generated_at: now_local(),
                money: &money,
            })?;
            let mode = if preview {
                OutputMode::Preview
            } else {
                OutputMode::Download {
                    dir: out_dir.unwrap_or_else(|| config.statement.output_dir.clone()),
                }
            };
            match deliver(&statement, &mode)? {
                Delivery::Saved(path) => println!("Statement saved to {}.", path.display()),
                Delivery::Previewed(path) => println!("Statement opened from {}.", path.display()),
            }
        }
    }

    Ok(())
}

/// Registry whose change listener reprints the table after each mutation.
fn open_registry<'s>(store: &'s Store, money: &MoneyFormat) -> anyhow::Result<ExpenseRegistry<'s>> {
    let mut registry = ExpenseRegistry::load(store)?;
    let money = money.clone();
    registry.set_on_change(move |expenses| {
        println!("{}", ListView::project(expenses, &money).render_table());
    });
    Ok(registry)
}

fn report(submission: Submission, registry: &ExpenseRegistry<'_>, money: &MoneyFormat) {
    if let Some(message) = submission_message(submission, registry, money) {
        println!("{message}");
    }
}

/// Confirmation line naming the 1-based position used by `edit`/`delete`.
fn submission_message(submission: Submission, registry: &ExpenseRegistry<'_>, money: &MoneyFormat) -> Option<String> {
    let (verb, id) = match submission {
        Submission::Created(id) => ("Added", id),
        Submission::Updated(id) => ("Updated", id),
    };
    let position = registry.position_of(&id)? + 1;
    Some(format!("{verb} expense {position}. Total: {}", money.format(registry.total())))
}
