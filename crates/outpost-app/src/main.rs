use anyhow::Result;
use async_trait::async_trait;
use outpost_app::{
    generate_and_export, issue_and_copy, mutations, Console, ConfirmPrompt, DirectoryExporter,
    DispatchOutcome, InstallerGeneration, KeyIssue, ListPage, MutationDispatcher, MutationRequest,
    Notification, NotificationLevel, Notifier, PageHandle, StaticConfirm,
};
use outpost_config::OutpostConfig;
use outpost_core::{ozql, Choice, CoreError, DerivedStats, DetailPresentation, StatsScope};
use outpost_domain::{
    ApiKey, ApiKeyDraft, Endpoint, EntityRecord, Installer, InstallerDraft, MetricKey, RecordId,
    SavedQuery, SavedQueryDraft, SdkIntegration, StatusKey, ValidationError,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = parse_cli_flags()?;
    let config = outpost_config::load_from_env()?;
    init_file_logging(&config)?;

    let confirm: Arc<dyn ConfirmPrompt> = if cli.assume_yes {
        Arc::new(StaticConfirm::accept())
    } else {
        Arc::new(StdinConfirm)
    };
    let console = Console::new(config, Arc::new(TerminalNotifier), confirm);

    if let Some(text) = cli.run_query.as_deref() {
        return run_query(&console, text, cli.save_as.as_deref(), cli.json).await;
    }

    match cli.page {
        PageKind::Endpoints => run_page::<Endpoint>(&console, &cli).await,
        PageKind::ApiKeys => run_page::<ApiKey>(&console, &cli).await,
        PageKind::Sdks => run_page::<SdkIntegration>(&console, &cli).await,
        PageKind::Installers => run_page::<Installer>(&console, &cli).await,
        PageKind::Queries => run_page::<SavedQuery>(&console, &cli).await,
    }
}

fn init_file_logging(config: &OutpostConfig) -> Result<(), CoreError> {
    let log_path = config.log_file_path();
    if let Some(parent) = log_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|error| {
                CoreError::Configuration(format!(
                    "failed to create outpost log directory '{}': {error}",
                    parent.display()
                ))
            })?;
        }
    }

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .map_err(|error| {
            CoreError::Configuration(format!(
                "failed to open outpost log file '{}': {error}",
                log_path.display()
            ))
        })?;

    let default_filter = config.logging.filter.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file))
        .init();

    Ok(())
}

/// Prints toasts to stderr and keeps a copy in the log.
struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        let tag = match notification.level {
            NotificationLevel::Success => "ok",
            NotificationLevel::Error => "error",
            NotificationLevel::Info => "info",
        };
        tracing::info!(level = tag, text = %notification.message, "notification");
        eprintln!("[{tag}] {}", notification.message);
    }
}

struct StdinConfirm;

#[async_trait]
impl ConfirmPrompt for StdinConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        let prompt = prompt.to_owned();
        tokio::task::spawn_blocking(move || {
            eprint!("{prompt} [y/N] ");
            let _ = std::io::stderr().flush();
            let mut answer = String::new();
            if std::io::stdin().lock().read_line(&mut answer).is_err() {
                return false;
            }
            matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
        })
        .await
        .unwrap_or(false)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum PageKind {
    #[default]
    Endpoints,
    ApiKeys,
    Sdks,
    Installers,
    Queries,
}

impl PageKind {
    fn parse(raw: &str) -> Option<Self> {
        match raw {
            "endpoints" => Some(Self::Endpoints),
            "api-keys" | "keys" => Some(Self::ApiKeys),
            "sdks" => Some(Self::Sdks),
            "installers" => Some(Self::Installers),
            "queries" => Some(Self::Queries),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct CliFlags {
    page: PageKind,
    search: Option<String>,
    status: Option<String>,
    category: Option<String>,
    width: Option<u32>,
    select: Option<String>,
    action: Option<String>,
    target: Option<String>,
    create: Option<String>,
    run_query: Option<String>,
    save_as: Option<String>,
    assume_yes: bool,
    json: bool,
}

fn parse_cli_flags() -> Result<CliFlags, CoreError> {
    parse_cli_args(std::env::args().skip(1))
}

fn parse_cli_args(args: impl IntoIterator<Item = String>) -> Result<CliFlags, CoreError> {
    let mut flags = CliFlags::default();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--page" => {
                let value = read_cli_value(&arg, args.next())?.to_ascii_lowercase();
                flags.page = PageKind::parse(&value).ok_or_else(|| {
                    CoreError::Configuration(format!(
                        "Unknown page '{value}'. Use --page <endpoints|api-keys|sdks|installers|queries>."
                    ))
                })?;
            }
            "--search" => flags.search = Some(args.next().unwrap_or_default()),
            "--status" => flags.status = Some(read_cli_value(&arg, args.next())?),
            "--category" => flags.category = Some(read_cli_value(&arg, args.next())?),
            "--width" => {
                let value = read_cli_value(&arg, args.next())?;
                flags.width = Some(value.parse().map_err(|_| {
                    CoreError::Configuration(format!(
                        "Flag '--width' expects a pixel count, got '{value}'."
                    ))
                })?);
            }
            "--select" => flags.select = Some(read_cli_value(&arg, args.next())?),
            "--action" => {
                flags.action = Some(read_cli_value(&arg, args.next())?.to_ascii_lowercase())
            }
            "--target" => flags.target = Some(read_cli_value(&arg, args.next())?),
            "--create" => flags.create = Some(read_cli_value(&arg, args.next())?),
            "--run-query" => flags.run_query = Some(read_cli_value(&arg, args.next())?),
            "--save-as" => flags.save_as = Some(read_cli_value(&arg, args.next())?),
            "--yes" | "-y" => flags.assume_yes = true,
            "--json" => flags.json = true,
            "--help" | "-h" => {
                print_cli_help();
                std::process::exit(0);
            }
            value if value.starts_with("--") => {
                return Err(CoreError::Configuration(format!(
                    "Unknown flag '{value}'. Run with --help for valid flags."
                )));
            }
            unknown => {
                return Err(CoreError::Configuration(format!(
                    "Unexpected argument '{unknown}'. Run with --help for valid flags."
                )));
            }
        }
    }

    if flags.action.is_some() && flags.target.is_none() {
        return Err(CoreError::Configuration(
            "Flag '--action' requires '--target <id>'.".to_owned(),
        ));
    }
    if flags.save_as.is_some() && flags.run_query.is_none() {
        return Err(CoreError::Configuration(
            "Flag '--save-as' requires '--run-query <ozql>'.".to_owned(),
        ));
    }

    Ok(flags)
}

fn print_cli_help() {
    println!("Usage: outpost [--page <name>] [filters] [--action <name> --target <id>] [--create <json>]");
    println!("       outpost --run-query <ozql> [--save-as <name>]");
    println!();
    println!("  --page <name>          endpoints, api-keys, sdks, installers or queries (default endpoints)");
    println!("  --search <text>        Case-insensitive search over the page's search fields");
    println!("  --status <value>       Only rows with this status ('all' disables)");
    println!("  --category <value>     Only rows in this category ('all' disables)");
    println!("  --width <px>           Viewport width used to place the detail view");
    println!("  --select <id>          Open the detail view for a record");
    println!("  --action <name>        isolate, wipe, revoke, install or archive");
    println!("  --target <id>          Record the action applies to");
    println!("  --create <json>        Draft for a new API key, installer or saved query");
    println!("  --run-query <ozql>     Run an OZQL query against the event lake");
    println!("  --save-as <name>       Save the query run with --run-query");
    println!("  --yes, -y              Skip confirmation prompts for destructive actions");
    println!("  --json                 Print the page report as JSON");
    println!("  --help                 Show this help message");
}

fn read_cli_value(flag: &str, value: Option<String>) -> Result<String, CoreError> {
    let value = value
        .ok_or_else(|| CoreError::Configuration(format!("Missing value after {flag}.")))?;
    let value = value.trim().to_owned();
    if value.is_empty() {
        return Err(CoreError::Configuration(format!(
            "Flag '{flag}' requires a non-empty value."
        )));
    }
    Ok(value)
}

/// Per-page hooks for the actions the CLI exposes.
#[async_trait]
trait ConsolePage: EntityRecord {
    fn row(&self) -> String;

    fn action(record: &Self, action: &str) -> Result<MutationRequest<Self>, CoreError>;

    fn create_request(raw: &str) -> Result<MutationRequest<Self>, CoreError>;

    async fn create(
        page: &mut ListPage<Self>,
        dispatcher: &MutationDispatcher<Self>,
        _console: &Console,
        raw: &str,
    ) -> Result<(), CoreError> {
        let request = Self::create_request(raw)?;
        page.dispatch(dispatcher, request).await;
        Ok(())
    }
}

fn parse_draft<D: DeserializeOwned>(raw: &str) -> Result<D, CoreError> {
    serde_json::from_str(raw).map_err(|error| {
        ValidationError::Invalid {
            field: "draft",
            reason: error.to_string(),
        }
        .into()
    })
}

fn unsupported<R: EntityRecord>(what: &str) -> CoreError {
    CoreError::Configuration(format!("{} page does not support {what}", R::ENTITY))
}

#[async_trait]
impl ConsolePage for Endpoint {
    fn row(&self) -> String {
        format!(
            "{:<8} {:<16} {:<12} {:<9} {:<8} risk {:>3}  alerts {}",
            self.id.as_str(),
            self.hostname,
            self.ip_address,
            self.status.as_str(),
            self.platform,
            self.risk_score,
            self.open_alerts
        )
    }

    fn action(record: &Self, action: &str) -> Result<MutationRequest<Self>, CoreError> {
        match action {
            "isolate" => Ok(mutations::isolate_endpoint(record)),
            "wipe" => Ok(mutations::wipe_endpoint(record)),
            other => Err(unsupported::<Self>(&format!("action '{other}'"))),
        }
    }

    fn create_request(_raw: &str) -> Result<MutationRequest<Self>, CoreError> {
        Err(unsupported::<Self>("--create; endpoints enroll through installers"))
    }
}

#[async_trait]
impl ConsolePage for ApiKey {
    fn row(&self) -> String {
        format!(
            "{:<9} {:<24} {:<20} {:<8} {:<6} requests {}",
            self.id.as_str(),
            self.name,
            self.key_prefix,
            self.status.as_str(),
            self.scope,
            self.request_count
        )
    }

    fn action(record: &Self, action: &str) -> Result<MutationRequest<Self>, CoreError> {
        match action {
            "revoke" => Ok(mutations::revoke_api_key(record)),
            other => Err(unsupported::<Self>(&format!("action '{other}'"))),
        }
    }

    fn create_request(raw: &str) -> Result<MutationRequest<Self>, CoreError> {
        Ok(mutations::issue_api_key(parse_draft::<ApiKeyDraft>(raw)?))
    }

    async fn create(
        page: &mut ListPage<Self>,
        dispatcher: &MutationDispatcher<Self>,
        console: &Console,
        raw: &str,
    ) -> Result<(), CoreError> {
        let draft = parse_draft::<ApiKeyDraft>(raw)?;
        let exporter = DirectoryExporter::new(console.config().export_dir());
        match issue_and_copy(page, dispatcher, &exporter, draft).await {
            KeyIssue::Copied { clipboard_path, .. } => {
                println!("api key copied to: {}", clipboard_path.display());
            }
            KeyIssue::CopyFailed { error, .. } => return Err(error),
            KeyIssue::NotIssued(_) => {}
        }
        Ok(())
    }
}

#[async_trait]
impl ConsolePage for SdkIntegration {
    fn row(&self) -> String {
        format!(
            "{:<9} {:<22} {:<10} {:<8} {:<10} installs {}",
            self.id.as_str(),
            self.name,
            self.language,
            self.version,
            self.status.as_str(),
            self.install_count
        )
    }

    fn action(record: &Self, action: &str) -> Result<MutationRequest<Self>, CoreError> {
        match action {
            "install" => Ok(mutations::install_sdk(record)),
            other => Err(unsupported::<Self>(&format!("action '{other}'"))),
        }
    }

    fn create_request(_raw: &str) -> Result<MutationRequest<Self>, CoreError> {
        Err(unsupported::<Self>("--create"))
    }
}

#[async_trait]
impl ConsolePage for Installer {
    fn row(&self) -> String {
        format!(
            "{:<10} {:<22} {:<8} {:<8} {:<8} downloads {}",
            self.id.as_str(),
            self.name,
            self.platform,
            self.version,
            self.status.as_str(),
            self.download_count
        )
    }

    fn action(_record: &Self, action: &str) -> Result<MutationRequest<Self>, CoreError> {
        Err(unsupported::<Self>(&format!("action '{action}'")))
    }

    fn create_request(raw: &str) -> Result<MutationRequest<Self>, CoreError> {
        Ok(mutations::generate_installer(parse_draft::<InstallerDraft>(raw)?))
    }

    async fn create(
        page: &mut ListPage<Self>,
        dispatcher: &MutationDispatcher<Self>,
        console: &Console,
        raw: &str,
    ) -> Result<(), CoreError> {
        let draft = parse_draft::<InstallerDraft>(raw)?;
        let exporter = DirectoryExporter::new(console.config().export_dir());
        let server_url = console.config().export.installer_server_url.clone();
        match generate_and_export(page, dispatcher, &exporter, draft, &server_url).await {
            InstallerGeneration::Exported { script_path, .. } => {
                println!("installer script: {}", script_path.display());
            }
            InstallerGeneration::ExportFailed { error, .. } => return Err(error),
            InstallerGeneration::NotCreated(_) => {}
        }
        Ok(())
    }
}

#[async_trait]
impl ConsolePage for SavedQuery {
    fn row(&self) -> String {
        format!(
            "{:<7} {:<24} {:<9} {:<12} runs {:<4} {}",
            self.id.as_str(),
            self.name,
            self.status.as_str(),
            self.folder.as_deref().unwrap_or("-"),
            self.run_count,
            self.query
        )
    }

    fn action(record: &Self, action: &str) -> Result<MutationRequest<Self>, CoreError> {
        match action {
            "archive" => Ok(mutations::archive_query(record)),
            other => Err(unsupported::<Self>(&format!("action '{other}'"))),
        }
    }

    fn create_request(raw: &str) -> Result<MutationRequest<Self>, CoreError> {
        Ok(mutations::save_query(parse_draft::<SavedQueryDraft>(raw)?))
    }
}

#[derive(Debug, Serialize)]
struct MetricReport {
    sum: f64,
    count: usize,
    average: f64,
}

#[derive(Debug, Serialize)]
struct StatsReport {
    total: usize,
    by_status: BTreeMap<&'static str, usize>,
    by_category: BTreeMap<String, usize>,
    metrics: BTreeMap<&'static str, MetricReport>,
}

impl StatsReport {
    fn from_stats<S: StatusKey, M: MetricKey>(stats: &DerivedStats<S, M>) -> Self {
        Self {
            total: stats.total,
            by_status: stats
                .by_status
                .iter()
                .map(|(status, count)| (status.as_str(), *count))
                .collect(),
            by_category: stats.by_category.clone(),
            metrics: stats
                .metrics
                .iter()
                .map(|(metric, aggregate)| {
                    (
                        metric.as_str(),
                        MetricReport {
                            sum: aggregate.sum,
                            count: aggregate.count,
                            average: aggregate.average,
                        },
                    )
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PageReport<R> {
    entity: &'static str,
    source: String,
    summary: StatsReport,
    filtered: StatsReport,
    detail: Option<String>,
    rows: Vec<R>,
}

async fn run_page<R: ConsolePage>(console: &Console, cli: &CliFlags) -> Result<()> {
    let PageHandle {
        mut page,
        dispatcher,
    } = console.page::<R>()?;
    page.load_now().await;

    if let Some(width) = cli.width {
        page.set_viewport_width(width);
    }
    if let Some(search) = cli.search.as_deref() {
        page.set_search(search);
    }
    if let Some(raw) = cli.status.as_deref() {
        page.set_status(Choice::parse_with(raw, |value| {
            R::Status::parse(value).ok_or_else(|| {
                CoreError::Configuration(format!(
                    "Unknown {} status '{value}'. Expected one of: {}.",
                    R::ENTITY,
                    R::Status::ALL
                        .iter()
                        .map(|status| status.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
        })?);
    }
    if let Some(raw) = cli.category.as_deref() {
        page.set_category(Choice::parse_with(raw, |value| {
            Ok::<_, CoreError>(value.to_ascii_lowercase())
        })?);
    }

    if let (Some(action), Some(target)) = (cli.action.as_deref(), cli.target.as_deref()) {
        let id = RecordId::from(target);
        let record = page.find(&id).cloned().ok_or_else(|| CoreError::NotFound {
            entity: R::ENTITY,
            id: id.clone(),
        })?;
        let request = R::action(&record, action)?;
        if let DispatchOutcome::Applied(updated) = page.dispatch(&dispatcher, request).await {
            page.select(updated.id().clone());
        }
    }
    if let Some(raw) = cli.create.as_deref() {
        R::create(&mut page, &dispatcher, console, raw).await?;
    }
    if let Some(id) = cli.select.as_deref() {
        page.select(RecordId::from(id));
    }

    let detail = match page.presentation() {
        DetailPresentation::Hidden => None,
        DetailPresentation::SidePanel(id) => Some(format!("side panel: {id}")),
        DetailPresentation::Drawer(id) => Some(format!("drawer: {id}")),
    };
    let report = PageReport {
        entity: R::ENTITY,
        source: match page.source() {
            Some(source) if source.is_fixture() => "fixtures".to_owned(),
            Some(_) => "store".to_owned(),
            None => "none".to_owned(),
        },
        summary: StatsReport::from_stats(&page.stats(StatsScope::Global, R::Metric::ALL)),
        filtered: StatsReport::from_stats(&page.stats(StatsScope::Filtered, R::Metric::ALL)),
        detail,
        rows: page.visible(),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!(
        "{} ({} of {} shown, source: {})",
        report.entity, report.filtered.total, report.summary.total, report.source
    );
    for (status, count) in &report.summary.by_status {
        println!("  {status:<10} {count}");
    }
    for (metric, aggregate) in &report.filtered.metrics {
        println!(
            "  {metric:<14} sum {:.0}  avg {:.1}",
            aggregate.sum, aggregate.average
        );
    }
    println!();
    for row in &report.rows {
        println!("{}", row.row());
    }
    if let Some(detail) = &report.detail {
        println!();
        println!("{detail}");
        if let Some(selected) = page.selected() {
            println!("{}", serde_json::to_string_pretty(selected)?);
        }
    }

    Ok(())
}

async fn run_query(console: &Console, text: &str, save_as: Option<&str>, json: bool) -> Result<()> {
    let result = ozql::execute(text)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "{} rows from {} in {}",
            result.row_count(),
            result.source,
            result.elapsed
        );
        println!("{}", result.columns.join(" | "));
        for row in &result.rows {
            println!("{}", row.join(" | "));
        }
    }

    if let Some(name) = save_as {
        let PageHandle {
            mut page,
            dispatcher,
        } = console.page::<SavedQuery>()?;
        page.load_now().await;
        let request = mutations::save_query(SavedQueryDraft {
            name: name.to_owned(),
            query: text.to_owned(),
            folder: None,
        });
        page.dispatch(&dispatcher, request).await;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliFlags, CoreError> {
        parse_cli_args(args.iter().map(|arg| (*arg).to_owned()))
    }

    #[test]
    fn save_as_requires_run_query() {
        let error = parse(&["--save-as", "Failed logins"]).expect_err("orphan --save-as");
        assert!(matches!(error, CoreError::Configuration(message) if message.contains("--run-query")));

        let flags = parse(&["--run-query", "login failed", "--save-as", "Failed logins"])
            .expect("query with save");
        assert_eq!(flags.save_as.as_deref(), Some("Failed logins"));
    }

    #[test]
    fn action_requires_target() {
        assert!(parse(&["--page", "endpoints", "--action", "wipe"]).is_err());
        let flags = parse(&["--page", "endpoints", "--action", "Wipe", "--target", "ep-0003"])
            .expect("action with target");
        assert_eq!(flags.action.as_deref(), Some("wipe"));
    }
}
