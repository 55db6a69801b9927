use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use formset_core::{
    render_container, ContainerMarkup, FormsetController, RenderOptions, TemplateBuilder,
};
use shared::{
    domain::RowIndex,
    error::{ErrorReport, FormsetError},
};
use tracing_subscriber::EnvFilter;

mod config;
mod script;

use config::{load_settings, Settings};
use script::Op;

#[derive(Parser, Debug)]
#[command(name = "formset", about = "Replay add/remove events against a dynamic formset")]
struct Cli {
    /// Settings file; defaults to ./formset.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply operations and print the rendered container.
    Render {
        #[arg(long)]
        tabular: bool,
        #[arg(long)]
        add_text: Option<String>,
        ops: Vec<Op>,
    },
    /// Apply operations and print the submitted form data as JSON.
    Submit { ops: Vec<Op> },
    /// Apply operations and verify the formset invariants.
    Check { ops: Vec<Op> },
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Command::Render {
            tabular,
            add_text,
            ops,
        } => {
            let tabular = tabular || settings.tabular;
            let (builder, mut controller) = build_controller(&settings, tabular)?;
            script::apply(&mut controller, &ops);
            let options = RenderOptions {
                tabular,
                add_button_text: add_text.or_else(|| settings.add_button_text.clone()),
                header: tabular.then(|| builder.header()),
            };
            println!("{}", render_container(&controller, &options));
        }
        Command::Submit { ops } => {
            let (_, mut controller) = build_controller(&settings, settings.tabular)?;
            script::apply(&mut controller, &ops);
            println!(
                "{}",
                serde_json::to_string_pretty(&controller.submission().form_data())?
            );
        }
        Command::Check { ops } => {
            let (_, mut controller) = build_controller(&settings, settings.tabular)?;
            script::apply(&mut controller, &ops);
            if let Err(err) = controller.verify() {
                let err = FormsetError::from(err);
                println!("{}", serde_json::to_string_pretty(&ErrorReport::from(&err))?);
                return Err(err).context("formset invariants violated");
            }
            println!(
                "ok: {} rows under prefix '{}'",
                controller.len(),
                controller.prefix()
            );
        }
    }

    Ok(())
}

fn build_controller(
    settings: &Settings,
    tabular: bool,
) -> Result<(TemplateBuilder, FormsetController)> {
    let config = settings.formset_config();
    let builder = TemplateBuilder::new(&config)
        .fields(settings.fields.iter().cloned())
        .tabular(tabular);

    let mut container = ContainerMarkup::new(builder.empty_form())
        .with_initial_forms(settings.initial_forms);
    for index in 0..settings.initial_rows {
        container = container.with_row(builder.form(RowIndex(index)));
    }

    let controller =
        FormsetController::new(config, container).context("failed to build formset controller")?;
    Ok((builder, controller))
}
