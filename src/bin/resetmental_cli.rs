//!
//! resetmental CLI
//! ---------------
//! Command-line client for the ResetMental platform. The session (tokens and
//! cached profile) is kept in a JSON file so consecutive invocations stay logged in.

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};

use resetmental::api::ApiClient;
use resetmental::cli::{exit_code, print_records, render_psychologists};
use resetmental::directory::{format_cop, DirectoryFilter};
use resetmental::navigation::directory_link;
use resetmental::validation::{BookingForm, PqrsForm, RegistrationForm};
use resetmental::{AppError, ClientConfig, FileStorage, SessionStore};

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} <command> [flags]\n\nCommands:\n  login <username> <password>        obtain tokens and store the session\n  logout                             forget the stored session\n  status                             show who is logged in and their role\n  register --first-name <n> --last-name <n> --email <e> --password <p> --document-type <id>\n           --document-number <n> [--phone <n>] --user-type <usuario|psicologo> [--reason <text>]\n  psychologists [--search <s>] [--specialty <s>] [--location <s>] [--price <min-max>] [--page <n>]\n  doc-types                          list document types\n  book <psychologist_id> --date <YYYY-MM-DD> --time <HH:MM> --modality <VIRTUAL|PRESENCIAL>\n  pending                            pending appointments (psychologists only)\n  pqrs --type <peticion|queja|reclamo|sugerencia> --subject <s> --description <s>\n\nEnvironment:\n  RESETMENTAL_API_BASE_URL      backend base URL (default http://localhost:8000)\n  RESETMENTAL_SESSION_FILE      session file (default .resetmental/session.json)\n  RESETMENTAL_HTTP_TIMEOUT_MS   request timeout in milliseconds (default 30000)\n  RESETMENTAL_REFRESH_MODE      independent | single_flight\n  RESETMENTAL_OUTPUT=json       print raw JSON instead of tables\n  RUST_LOG                      log filter (default info)"
    );
}

/// Collects `--flag value` pairs and bare positionals.
struct Args {
    positional: Vec<String>,
    flags: Vec<(String, String)>,
}

impl Args {
    fn parse(program: &str, raw: &[String]) -> Self {
        let mut positional = Vec::new();
        let mut flags = Vec::new();
        let mut i = 0;
        while i < raw.len() {
            let a = &raw[i];
            if let Some(name) = a.strip_prefix("--") {
                if i + 1 >= raw.len() {
                    eprintln!("--{} requires a value", name);
                    print_usage(program);
                    std::process::exit(2);
                }
                flags.push((name.to_string(), raw[i + 1].clone()));
                i += 2;
                continue;
            }
            positional.push(a.clone());
            i += 1;
        }
        Args { positional, flags }
    }

    fn flag(&self, name: &str) -> Option<&str> {
        self.flags.iter().rev().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }

    fn flag_or_empty(&self, name: &str) -> String { self.flag(name).unwrap_or("").to_string() }
}

/// Entry point: initialize logging, load config and session file, dispatch the command.
#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let mut raw: Vec<String> = env::args().collect();
    let program = raw.remove(0);
    if raw.is_empty() || matches!(raw[0].as_str(), "-h" | "--help" | "help") {
        print_usage(&program);
        return Ok(());
    }
    let command = raw.remove(0);
    let args = Args::parse(&program, &raw);

    let config = ClientConfig::from_env().context("invalid configuration")?;
    let session = SessionStore::new(Arc::new(FileStorage::open(&config.session_file)));
    let api = ApiClient::from_config(config, session).context("cannot build HTTP client")?;

    if let Err(e) = run(&api, &command, &args).await {
        eprintln!("{}", e.user_message());
        std::process::exit(exit_code(&e));
    }
    Ok(())
}

async fn run(api: &ApiClient, command: &str, args: &Args) -> Result<(), AppError> {
    match command {
        "login" => {
            let (user, pass) = match args.positional.as_slice() {
                [u, p, ..] => (u.as_str(), p.as_str()),
                _ => return Err(AppError::validation("email", "login requiere <username> <password>")),
            };
            api.auth().login(user, pass).await?;
            let s = api.session().get();
            println!("Sesión iniciada ({})", s.role_tag.as_deref().unwrap_or("sin rol"));
        }
        "logout" => {
            api.auth().logout();
            println!("Sesión cerrada");
        }
        "status" => {
            let s = api.session().get();
            if s.is_anonymous() {
                println!("Sin sesión");
            } else {
                let who = s.user.as_ref().and_then(|u| u.username()).unwrap_or("desconocido");
                let link = directory_link(&s);
                println!("usuario: {}\nrol: {}\nmenú: {} ({})", who, s.role_tag.as_deref().unwrap_or("-"), link.label, link.href);
            }
        }
        "register" => {
            let form = RegistrationForm {
                first_name: args.flag_or_empty("first-name"),
                last_name: args.flag_or_empty("last-name"),
                email: args.flag_or_empty("email"),
                password: args.flag_or_empty("password"),
                confirm_password: args.flag("confirm-password").or(args.flag("password")).unwrap_or("").to_string(),
                document_type: args.flag_or_empty("document-type"),
                document_number: args.flag_or_empty("document-number"),
                phone: args.flag("phone").map(str::to_string),
                user_type: args.flag_or_empty("user-type"),
                registration_reason: args.flag("reason").map(str::to_string),
            };
            api.auth().register(&form).await?;
            println!("Registro exitoso");
        }
        "psychologists" => {
            let mut dir = api.psychologists().directory().await?;
            dir.set_filter(DirectoryFilter {
                search: args.flag_or_empty("search"),
                specialty: args.flag_or_empty("specialty"),
                location: args.flag_or_empty("location"),
                price: args.flag_or_empty("price"),
            });
            let pages: usize = args.flag("page").and_then(|p| p.parse().ok()).unwrap_or(1);
            for _ in 1..pages {
                if !dir.load_more() { break; }
            }
            print!("{}", render_psychologists(dir.visible()));
            if dir.has_more() {
                println!("(hay más resultados: --page {})", dir.page() + 1);
            }
        }
        "doc-types" => {
            let types = api.document_types().list().await?;
            let v = serde_json::to_value(&types).map_err(|e| AppError::internal("encode", e.to_string()))?;
            if !print_records(&v) { println!("{}", v); }
        }
        "book" => {
            let id: i64 = args
                .positional
                .first()
                .and_then(|s| s.parse().ok())
                .ok_or_else(|| AppError::validation("psychologist", "book requiere <psychologist_id>"))?;
            let dir = api.psychologists().directory().await?;
            let psychologist = dir
                .find(id)
                .ok_or_else(|| AppError::validation("psychologist", format!("No existe el psicólogo {}", id)))?;
            let form = BookingForm { date: args.flag_or_empty("date"), time: args.flag_or_empty("time"), modality: args.flag_or_empty("modality") };
            let now = chrono::Local::now().naive_local();
            api.appointments().book(psychologist, &form, now).await?;
            println!("Cita agendada con {} ({})", psychologist.name, format_cop(psychologist.price));
        }
        "pending" => {
            let pending = api.appointments().pending_for_provider().await?;
            let rows: Vec<serde_json::Value> = pending
                .iter()
                .map(|r| serde_json::json!({
                    "cita": r.id(),
                    "fecha": r.cita_fecha,
                    "hora": r.cita_hora,
                    "modalidad": r.cita_modalidad,
                    "cliente": r.customer_id(),
                }))
                .collect();
            if rows.is_empty() {
                println!("No tienes citas pendientes");
            } else if !print_records(&serde_json::Value::Array(rows.clone())) {
                println!("{}", serde_json::Value::Array(rows));
            }
        }
        "pqrs" => {
            let form = PqrsForm { kind: args.flag_or_empty("type"), subject: args.flag_or_empty("subject"), description: args.flag_or_empty("description") };
            api.pqrs().submit(&form).await?;
            println!("PQRS enviada");
        }
        other => {
            return Err(AppError::validation("command", format!("comando desconocido: {}", other)));
        }
    }
    Ok(())
}

