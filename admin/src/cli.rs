//! Command line front end.

use clap::{Args, Parser, Subcommand};
use jiff::Timestamp;
use payloads::requests::LoginCredentials;
use payloads::{DEFAULT_PAGE_LIMIT, ListQuery, SortOrder, Storage};
use secrecy::{ExposeSecret, SecretBox};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::components::DataTable;
use crate::config::AdminConfig;
use crate::models::{AccidentStatistics, Record, Severity};
use crate::pages::{self, ListPage, columns};
use crate::routes::Route;
use crate::services::{
    AccidentsService, AlertsService, AuthorizationService,
    MovementHistoryService, PurchaseOrdersService, RecordsService,
    UsersService,
};
use crate::state::SessionStore;

#[derive(Parser, Debug)]
#[command(name = "ayniline-admin")]
#[command(about = "Administración de líneas de vida AyniLine")]
#[command(version)]
pub struct Cli {
    /// Backend base URL
    #[arg(long, env = "AYNILINE_API_URL", global = true)]
    pub api_url: Option<String>,

    /// File holding the session between runs
    #[arg(long, env = "AYNILINE_STORAGE_PATH", global = true)]
    pub storage: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn apply_overrides(&self, config: &mut AdminConfig) {
        if let Some(api_url) = &self.api_url {
            config.api_url = api_url.clone();
        }
        if let Some(storage) = &self.storage {
            config.storage_path = storage.clone();
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a session
    Login {
        username: String,
        #[arg(long, env = "AYNILINE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the current session
    Logout,
    /// Show the logged-in user
    Whoami {
        #[arg(long)]
        json: bool,
    },
    /// Líneas de vida
    #[command(subcommand)]
    Records(RecordsCommand),
    #[command(subcommand)]
    Users(UsersCommand),
    #[command(subcommand)]
    Accidents(AccidentsCommand),
    /// Movement history of líneas de vida
    #[command(subcommand)]
    History(HistoryCommand),
    /// Authorization requests
    #[command(subcommand)]
    Requests(RequestsCommand),
    /// Purchase orders
    #[command(subcommand)]
    Orders(OrdersCommand),
    Alerts {
        /// Mark every alert as read before listing
        #[arg(long)]
        mark_all_read: bool,
        #[command(flatten)]
        list: ListArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long, default_value_t = DEFAULT_PAGE_LIMIT)]
    pub limit: u32,
    #[arg(long)]
    pub search: Option<String>,
    /// Column to sort by
    #[arg(long)]
    pub sort: Option<String>,
    /// Sort descending
    #[arg(long, requires = "sort")]
    pub desc: bool,
}

impl ListArgs {
    pub fn to_query(&self) -> ListQuery {
        ListQuery {
            search: self.search.clone().filter(|s| !s.trim().is_empty()),
            sort_by: self.sort.clone(),
            sort_order: self.sort.as_ref().map(|_| {
                if self.desc { SortOrder::Desc } else { SortOrder::Asc }
            }),
            ..ListQuery::page(self.page.max(1), self.limit)
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum RecordsCommand {
    List(ListArgs),
    Show { id: String },
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum UsersCommand {
    List(ListArgs),
}

#[derive(Subcommand, Debug)]
pub enum AccidentsCommand {
    List {
        #[command(flatten)]
        list: ListArgs,
        /// Only accidents of this severity (LEVE, MODERADO, GRAVE, FATAL)
        #[arg(long)]
        severity: Option<String>,
    },
    Stats,
}

#[derive(Subcommand, Debug)]
pub enum HistoryCommand {
    List {
        #[command(flatten)]
        list: ListArgs,
        #[arg(long)]
        action: Option<String>,
        #[arg(long)]
        username: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum RequestsCommand {
    Pending,
    Approve {
        id: String,
    },
    Reject {
        id: String,
        #[arg(long)]
        reason: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum OrdersCommand {
    List(ListArgs),
}

impl Command {
    /// The admin section a command belongs to.
    pub fn route(&self) -> Route {
        match self {
            Command::Login { .. } | Command::Logout => Route::Login,
            Command::Whoami { .. } | Command::Alerts { .. } => Route::Dashboard,
            Command::Records(_) | Command::Orders(_) => Route::Records,
            Command::Users(_) => Route::Users,
            Command::Accidents(_) => Route::Accidents,
            Command::History(_) => Route::History,
            Command::Requests(_) => Route::Requests,
        }
    }
}

#[derive(Serialize)]
struct WhoAmI<'a> {
    id: &'a str,
    username: &'a str,
    nombre: &'a str,
    email: &'a str,
    role: String,
    needs_password_change: bool,
}

/// Run one command against the backend described by `config`.
pub async fn run(
    command: Command,
    config: &AdminConfig,
    storage: Arc<dyn Storage>,
) -> anyhow::Result<()> {
    let client = crate::build_client(config, storage);
    let session = SessionStore::init(client, config.session_config());
    let result = dispatch(command, &session).await;
    session.dispose();
    result
}

async fn dispatch(
    command: Command,
    session: &SessionStore,
) -> anyhow::Result<()> {
    let command = match command {
        Command::Login { username, password } => {
            let password = SecretBox::new(Box::new(password));
            return login(session, username, password).await;
        }
        command => command,
    };

    session.initialize_auth().await;
    if matches!(command, Command::Logout) {
        session.logout().await;
        println!("Sesión cerrada");
        return Ok(());
    }

    command.route().guard(&session.snapshot())?;
    remind_password_change(session);

    let client = session.client().clone();
    match command {
        Command::Login { .. } | Command::Logout => Ok(()),
        Command::Whoami { json } => whoami(session, json),
        Command::Records(command) => {
            records(RecordsService::new(client), command).await
        }
        Command::Users(UsersCommand::List(list)) => {
            let service = UsersService::new(client);
            show(pages::users(service, list.to_query())).await
        }
        Command::Accidents(command) => {
            accidents(AccidentsService::new(client), command).await
        }
        Command::History(HistoryCommand::List {
            list,
            action,
            username,
        }) => {
            let mut query = list.to_query();
            if let Some(action) = action {
                query = query.with_param("action", action);
            }
            if let Some(username) = username {
                query = query.with_param("username", username);
            }
            let service = MovementHistoryService::new(client);
            show(pages::movements(service, query)).await
        }
        Command::Requests(command) => {
            requests(AuthorizationService::new(client), command).await
        }
        Command::Orders(OrdersCommand::List(list)) => {
            let service = PurchaseOrdersService::new(client);
            show(pages::purchase_orders(service, list.to_query())).await
        }
        Command::Alerts {
            mark_all_read,
            list,
        } => alerts(AlertsService::new(client), mark_all_read, list).await,
    }
}

async fn login(
    session: &SessionStore,
    username: String,
    password: SecretBox<String>,
) -> anyhow::Result<()> {
    let credentials = LoginCredentials {
        username,
        password: password.expose_secret().clone(),
    };
    let user = session.login(&credentials).await?;
    println!("Sesión iniciada como {} ({})", user.nombre, user.role.label());
    remind_password_change(session);
    Ok(())
}

fn remind_password_change(session: &SessionStore) {
    let now = Timestamp::now();
    if session.should_prompt_password_change_at(now) {
        eprintln!(
            "Por seguridad, cambie su contraseña temporal lo antes posible."
        );
        session.mark_password_prompt_shown_at(now);
    }
}

fn whoami(session: &SessionStore, json: bool) -> anyhow::Result<()> {
    let snapshot = session.snapshot();
    let Some(user) = snapshot.user.as_ref() else {
        anyhow::bail!("No hay una sesión activa");
    };
    if json {
        let whoami = WhoAmI {
            id: &user.id,
            username: &user.username,
            nombre: &user.nombre,
            email: &user.email,
            role: user.role.to_string(),
            needs_password_change: snapshot.needs_password_change,
        };
        println!("{}", serde_json::to_string_pretty(&whoami)?);
    } else {
        println!("{} <{}>", user.nombre, user.email);
        println!("Usuario: {}", user.username);
        println!("Rol: {}", user.role.label());
    }
    Ok(())
}

async fn show<T>(mut page: ListPage<T>) -> anyhow::Result<()>
where
    T: Clone + Send + Sync + 'static,
{
    page.load().await.map_err(anyhow::Error::msg)?;
    println!("{}", page.render());
    Ok(())
}

fn print_table<T>(table: &DataTable<T>) {
    println!("{}", table.render());
}

async fn records(
    service: RecordsService,
    command: RecordsCommand,
) -> anyhow::Result<()> {
    match command {
        RecordsCommand::List(list) => {
            show(pages::records(service, list.to_query())).await
        }
        RecordsCommand::Show { id } => {
            let record = service.get(&id).await?;
            print_record(&record);
            Ok(())
        }
        RecordsCommand::Delete { id } => {
            service.delete(&id).await?;
            println!("Línea de vida {id} eliminada");
            Ok(())
        }
    }
}

fn print_record(record: &Record) {
    let optional = |value: &Option<String>| {
        value.clone().unwrap_or_else(|| "-".to_string())
    };
    println!("Código:        {}", record.codigo);
    println!("Cliente:       {}", record.cliente);
    println!("Equipo:        {}", record.equipo);
    println!("Ubicación:     {}", record.ubicacion);
    println!("Tipo:          {}", record.tipo_linea);
    println!("Estado:        {}", record.estado);
    println!("Instalación:   {}", record.fecha_instalacion);
    println!(
        "Caducidad:     {}",
        record
            .fecha_caducidad
            .map(|fecha| fecha.to_string())
            .unwrap_or_else(|| "-".to_string())
    );
    println!("Vida útil:     {}", record.vida_util());
    println!("SEEC:          {}", optional(&record.seec));
    println!("Anclaje:       {}", optional(&record.anclaje_equipos));
}

async fn accidents(
    service: AccidentsService,
    command: AccidentsCommand,
) -> anyhow::Result<()> {
    match command {
        AccidentsCommand::List {
            list,
            severity: None,
        } => show(pages::accidents(service, list.to_query())).await,
        AccidentsCommand::List {
            severity: Some(severity),
            ..
        } => {
            let severity = Severity::from_backend(&severity);
            let rows = service.by_severity(&severity).await?;
            let mut table = DataTable::new(columns::accidents())
                .with_empty_message("No hay accidentes con esa severidad");
            table.set_data(rows);
            print_table(&table);
            Ok(())
        }
        AccidentsCommand::Stats => {
            print_accident_statistics(&service.statistics().await?);
            Ok(())
        }
    }
}

fn print_accident_statistics(stats: &AccidentStatistics) {
    println!("Total: {}", stats.total);
    println!("Último mes: {}", stats.ultimo_mes);
    println!("Por estado:");
    for (estado, count) in &stats.por_estado {
        println!("  {estado}: {count}");
    }
    println!("Por severidad:");
    for (severidad, count) in &stats.por_severidad {
        println!("  {severidad}: {count}");
    }
}

async fn requests(
    service: AuthorizationService,
    command: RequestsCommand,
) -> anyhow::Result<()> {
    match command {
        RequestsCommand::Pending => {
            let now = Timestamp::now();
            let pending: Vec<_> = service
                .pending()
                .await?
                .into_iter()
                .filter(|request| request.is_actionable_at(now))
                .collect();
            let mut table = DataTable::new(columns::authorization_requests())
                .with_empty_message("No hay solicitudes pendientes");
            table.set_data(pending);
            print_table(&table);
            Ok(())
        }
        RequestsCommand::Approve { id } => {
            let request = service.approve(&id).await?;
            println!("Solicitud {} aprobada", request.code);
            Ok(())
        }
        RequestsCommand::Reject { id, reason } => {
            let request = service.reject(&id, &reason).await?;
            println!("Solicitud {} rechazada", request.code);
            Ok(())
        }
    }
}

async fn alerts(
    service: AlertsService,
    mark_all_read: bool,
    list: ListArgs,
) -> anyhow::Result<()> {
    if mark_all_read {
        println!("{}", service.mark_all_read().await?);
    }
    let unread = service.unread_count().await?;
    println!("Alertas sin leer: {unread}");
    show(pages::alerts(service, list.to_query())).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_args_build_the_query() {
        let cli = Cli::parse_from([
            "ayniline-admin",
            "records",
            "list",
            "--page",
            "3",
            "--sort",
            "codigo",
            "--desc",
            "--search",
            "LV-0",
        ]);
        let Command::Records(RecordsCommand::List(list)) = cli.command else {
            panic!("expected records list");
        };
        let query = list.to_query();
        assert_eq!(query.page, 3);
        assert_eq!(query.limit, DEFAULT_PAGE_LIMIT);
        assert_eq!(query.sort_by.as_deref(), Some("codigo"));
        assert_eq!(query.sort_order, Some(SortOrder::Desc));
        assert_eq!(query.search.as_deref(), Some("LV-0"));
    }

    #[test]
    fn commands_resolve_to_their_section() {
        let cli = Cli::parse_from(["ayniline-admin", "orders", "list"]);
        assert_eq!(cli.command.route(), Route::Records);
        let cli = Cli::parse_from(["ayniline-admin", "history", "list"]);
        assert_eq!(cli.command.route(), Route::History);
    }

    #[test]
    fn global_flags_override_config() {
        let cli = Cli::parse_from([
            "ayniline-admin",
            "--api-url",
            "http://api.test",
            "logout",
        ]);
        let mut config = AdminConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.api_url, "http://api.test");
    }
}
