//! Driftline - declarative project configuration
//!
//! Usage:
//!   driftline plan              # Show what apply would change
//!   driftline apply             # Converge declared configuration and hooks
//!   driftline show              # Tracked remote values and drift
//!   driftline hook import <id>  # Print a hook as a manifest entry
//!   driftline hook delete <id>  # Remove a hook

mod render;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use driftline_core::client::{ClientHandle, HttpProjectApi, ProjectApi};
use driftline_core::config::DeclaredConfig;
use driftline_core::hooks::{HookDeclaration, HookId};
use driftline_core::manifest::{Manifest, resolve_manifest_path};
use driftline_core::reconcile::{ReadOutcome, Reconciler};

use crate::render::HookState;

#[derive(Parser)]
#[command(name = "driftline")]
#[command(about = "Declarative project configuration and webhooks", long_about = None)]
struct Cli {
    /// Manifest path (defaults to ./driftline.toml, then the user config dir)
    #[arg(long, global = true, env = "DRIFTLINE_MANIFEST")]
    manifest: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the patches and hook changes apply would make
    Plan(ProjectFilter),

    /// Converge declared configuration and hooks
    Apply(ProjectFilter),

    /// Show tracked remote values and drift from the manifest
    Show(ProjectFilter),

    /// Manage individual hooks by identifier
    Hook(HookArgs),
}

#[derive(Args)]
struct ProjectFilter {
    /// Only this project
    #[arg(long)]
    project: Option<String>,
}

#[derive(Args)]
struct HookArgs {
    #[command(subcommand)]
    command: HookSubcommand,
}

#[derive(Subcommand)]
enum HookSubcommand {
    /// Print an existing hook as a manifest entry
    ///
    /// Identifier shape: project_id:flow:timing:auth_method:method:url
    Import { id: String },

    /// Remove a hook (no-op when already gone)
    #[command(alias = "rm")]
    Delete { id: String },
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub(crate) enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "driftline=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let manifest_path = resolve_manifest_path(cli.manifest.as_deref())?;
    let manifest = Manifest::load(&manifest_path)?;
    tracing::debug!(path = %manifest_path.display(), "Loaded manifest");

    let handle = ClientHandle::<HttpProjectApi>::new(manifest.client_config()?)
        .context("Failed to create API client")?;
    let reconciler = Reconciler::new(handle.api());

    match cli.command {
        Commands::Plan(filter) => run_plan(&reconciler, &manifest, &filter, cli.format),
        Commands::Apply(filter) => run_apply(&reconciler, &manifest, &filter, cli.format),
        Commands::Show(filter) => run_show(&reconciler, &manifest, &filter, cli.format),
        Commands::Hook(args) => match args.command {
            HookSubcommand::Import { id } => run_hook_import(&reconciler, &id, cli.format),
            HookSubcommand::Delete { id } => run_hook_delete(&reconciler, &id, cli.format),
        },
    }
}

impl ProjectFilter {
    fn configs<'a>(
        &'a self,
        manifest: &'a Manifest,
    ) -> impl Iterator<Item = (&'a str, DeclaredConfig)> + 'a {
        manifest
            .declared_configs()
            .filter(move |(id, _)| self.matches(id))
    }

    fn hooks<'a>(&'a self, manifest: &'a Manifest) -> impl Iterator<Item = &'a HookDeclaration> + 'a {
        manifest
            .hooks
            .iter()
            .filter(move |hook| self.matches(&hook.project_id))
    }

    fn matches(&self, project_id: &str) -> bool {
        self.project.as_deref().is_none_or(|wanted| wanted == project_id)
    }
}

fn hook_state<A: ProjectApi>(
    reconciler: &Reconciler<A>,
    declaration: &HookDeclaration,
) -> Result<HookState> {
    let id = declaration.id()?;
    Ok(match reconciler.read_hook(&id)? {
        ReadOutcome::NotFound => HookState::Missing,
        ReadOutcome::Found(observed) if observed.entry == declaration.to_entry() => {
            HookState::Converged
        }
        ReadOutcome::Found(_) => HookState::Changed,
    })
}

fn run_plan<A: ProjectApi>(
    reconciler: &Reconciler<A>,
    manifest: &Manifest,
    filter: &ProjectFilter,
    format: OutputFormat,
) -> Result<()> {
    let mut projects = Vec::new();
    for (project_id, declared) in filter.configs(manifest) {
        let ops = reconciler.plan_config(project_id, &declared)?;
        projects.push((project_id.to_string(), ops));
    }
    let mut hooks = Vec::new();
    for declaration in filter.hooks(manifest) {
        declaration.validate()?;
        hooks.push((declaration.id()?, hook_state(reconciler, declaration)?));
    }
    render::plan(&projects, &hooks, format)
}

fn run_apply<A: ProjectApi>(
    reconciler: &Reconciler<A>,
    manifest: &Manifest,
    filter: &ProjectFilter,
    format: OutputFormat,
) -> Result<()> {
    let mut projects = Vec::new();
    for (project_id, declared) in filter.configs(manifest) {
        let result = reconciler
            .update_config(project_id, &declared)
            .with_context(|| format!("Failed to apply configuration to project {}", project_id))?;
        projects.push((project_id.to_string(), result));
    }

    let mut hooks = Vec::new();
    for declaration in filter.hooks(manifest) {
        let id = declaration.id()?;
        let changed = match hook_state(reconciler, declaration)? {
            HookState::Missing => !reconciler.create_hook(declaration)?.result.is_noop(),
            HookState::Changed => !reconciler.update_hook(&id, declaration)?.result.is_noop(),
            HookState::Converged => false,
        };
        hooks.push((id, changed));
    }
    render::apply(&projects, &hooks, format)
}

fn run_show<A: ProjectApi>(
    reconciler: &Reconciler<A>,
    manifest: &Manifest,
    filter: &ProjectFilter,
    format: OutputFormat,
) -> Result<()> {
    let mut projects = Vec::new();
    for (project_id, declared) in filter.configs(manifest) {
        let outcome = reconciler.read_config(project_id, &declared.tracked_fields(), Some(&declared))?;
        projects.push((project_id.to_string(), outcome));
    }
    let mut hooks = Vec::new();
    for declaration in filter.hooks(manifest) {
        hooks.push((declaration.id()?, hook_state(reconciler, declaration)?));
    }
    render::show(&projects, &hooks, format)
}

fn run_hook_import<A: ProjectApi>(
    reconciler: &Reconciler<A>,
    id: &str,
    format: OutputFormat,
) -> Result<()> {
    match reconciler.import_hook(id)? {
        ReadOutcome::Found(declaration) => render::imported_hook(declaration, format),
        ReadOutcome::NotFound => anyhow::bail!("No hook found for '{}'", id),
    }
}

fn run_hook_delete<A: ProjectApi>(
    reconciler: &Reconciler<A>,
    id: &str,
    format: OutputFormat,
) -> Result<()> {
    let id: HookId = id.parse()?;
    let result = reconciler.delete_hook(&id)?;
    render::deleted_hook(&id, result.is_some(), format)
}
