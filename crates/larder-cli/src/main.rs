//! larder - command line client for the grocery inventory service.
//!
//! Each command activates one screen, runs it to completion and drops it,
//! which closes the screen's request coordinator on the way out.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use base64::Engine;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use larder_core::api::{ApiClient, PantryApi};
use larder_core::auth::CredentialStore;
use larder_core::cache::CacheManager;
use larder_core::config::Config;
use larder_core::models::{DietaryFlag, ExpiryStatus, NewItem, UserId};
use larder_core::request::RequestCoordinator;
use larder_core::screens::{
    AccountScreen, CameraScreen, InventoryScreen, Loaded, PreferencesScreen, ScreenError,
    SignUpForm,
};
use larder_core::utils::{parse_day_month_year, truncate_string};

// ============================================================================
// Constants
// ============================================================================

const EMAIL_ENV: &str = "LARDER_EMAIL";
const PASSWORD_ENV: &str = "LARDER_PASSWORD";

/// Column width for item names in the inventory listing
const NAME_COLUMN_WIDTH: usize = 28;

const USAGE: &str = "\
Usage: larder <command> [args]

Commands:
  login [email]                       Sign in and remember the session
  signup <email>                      Create an account
  verify <code>                       Confirm the emailed verification code
  resend                              Send the verification email again
  logout [--all]                      Sign out (--all signs out every device)
  inventory                           List pantry items
  names                               List known item names
  add <name> [qty] [dd/mm/yyyy]       Add an item
  edit <id> <name> [qty] [dd/mm/yyyy] Change an item
  delete <id> [--yes]                 Remove an item
  prefs                               Show dietary preferences
  prefs set <flag> on|off             Change a preference
  prefs custom <text>|off             Set or clear the custom preference
  analyse <image-file> [--add]        Recognise groceries in a photo";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=larder_core=trace)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Everything a command needs: configuration, the shared cache and the
/// account screen holding the session.
struct App {
    config: Config,
    client: ApiClient,
    cache: Arc<CacheManager>,
    account: AccountScreen,
}

impl App {
    fn new() -> Result<Self> {
        let config = Config::load()?;
        let client = ApiClient::from_config(&config)?;
        let cache = Arc::new(CacheManager::from_config(&config));
        let account = AccountScreen::new(Arc::new(client.clone()), cache.clone());

        let mut ctx = Self {
            config,
            client,
            cache,
            account,
        };
        ctx.resume_session();
        Ok(ctx)
    }

    /// Pick up the session stored for the last email, if it is still valid.
    fn resume_session(&mut self) {
        let Some(email) = self.config.last_email.clone() else {
            return;
        };
        match CredentialStore::load_session(&email) {
            Ok(Some(data)) => {
                let token = data.token.clone();
                if self.account.restore(data) {
                    self.use_token(token);
                    debug!(email = %email, "Resumed stored session");
                }
            }
            Ok(None) => {}
            Err(e) => debug!(error = %e, "Could not read stored session"),
        }
    }

    fn use_token(&mut self, token: String) {
        self.client.set_token(token);
        let api = self.api();
        self.account.set_api(api);
    }

    fn api(&self) -> Arc<dyn PantryApi> {
        Arc::new(self.client.clone())
    }

    fn coordinator(&self) -> RequestCoordinator {
        match self.config.request_deadline() {
            Some(limit) => RequestCoordinator::new().with_timeout(limit),
            None => RequestCoordinator::new(),
        }
    }

    fn user(&self) -> Result<UserId> {
        self.account
            .session()
            .user_id()
            .ok_or_else(|| anyhow!("Not signed in. Run `larder login` first."))
    }

    fn inventory_screen(&self) -> Result<InventoryScreen> {
        Ok(InventoryScreen::new(self.api(), self.cache.clone(), self.user()?)
            .with_coordinator(self.coordinator()))
    }

    fn preferences_screen(&self) -> Result<PreferencesScreen> {
        Ok(PreferencesScreen::new(self.api(), self.cache.clone(), self.user()?)
            .with_coordinator(self.coordinator()))
    }

    fn camera_screen(&self) -> Result<CameraScreen> {
        Ok(CameraScreen::new(self.api(), self.cache.clone(), self.user()?)
            .with_coordinator(self.coordinator()))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        println!("{}", USAGE);
        return Ok(());
    };
    let rest = &args[1..];

    let mut ctx = App::new()?;
    info!(command = %command, "larder starting");

    let result = match command.as_str() {
        "login" => login(&mut ctx, rest.first().map(String::as_str)).await,
        "signup" => signup(&mut ctx, rest).await,
        "verify" => verify(&mut ctx, rest).await,
        "resend" => resend(&ctx).await,
        "logout" => logout(&mut ctx, rest.iter().any(|a| a == "--all")).await,
        "inventory" => show_inventory(&ctx).await,
        "names" => show_names(&ctx).await,
        "add" => add_item(&ctx, rest).await,
        "edit" => edit_item(&ctx, rest).await,
        "delete" => delete_item(&ctx, rest).await,
        "prefs" => preferences(&ctx, rest).await,
        "analyse" | "analyze" => analyse(&ctx, rest).await,
        "help" | "--help" | "-h" => {
            println!("{}", USAGE);
            Ok(())
        }
        other => bail!("Unknown command '{}'\n\n{}", other, USAGE),
    };

    if let Err(ref e) = result {
        if command != "login" && e.downcast_ref::<ScreenError>().is_some_and(ScreenError::requires_login) {
            eprintln!("Your session has expired or you are not signed in. Run `larder login`.");
        }
    }
    result
}

// ============================================================================
// Account
// ============================================================================

async fn login(ctx: &mut App, email_arg: Option<&str>) -> Result<()> {
    let email = match email_arg {
        Some(email) => email.to_string(),
        None => match std::env::var(EMAIL_ENV).ok().or_else(|| ctx.config.last_email.clone()) {
            Some(email) => email,
            None => prompt("Email: ")?,
        },
    };
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(password) => password,
        Err(_) => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };

    let data = ctx.account.sign_in(&email, &password).await?;
    ctx.use_token(data.token.clone());

    let email = data.user.email.clone();
    CredentialStore::store_session(&email, &data)?;
    ctx.config.last_email = Some(email.clone());
    ctx.config.save()?;

    println!("Signed in as {}", email);
    if !data.user.email_verified {
        println!("Your email is not verified yet. Run `larder verify <code>`.");
    }
    Ok(())
}

async fn signup(ctx: &mut App, args: &[String]) -> Result<()> {
    let email = match args.first() {
        Some(email) => email.clone(),
        None => prompt("Email: ")?,
    };
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;
    let confirm_password =
        rpassword::prompt_password("Confirm password: ").context("Failed to read password")?;

    let form = SignUpForm {
        email,
        password,
        confirm_password,
    };
    ctx.account.sign_up(&form).await?;
    println!("Account created. Check your email, then run `larder login`.");
    Ok(())
}

async fn verify(ctx: &mut App, args: &[String]) -> Result<()> {
    let code = args.first().ok_or_else(|| anyhow!("Usage: larder verify <code>"))?;
    ctx.account.verify_email(code).await?;
    println!("Email verified");
    Ok(())
}

async fn resend(ctx: &App) -> Result<()> {
    ctx.account.resend_verification().await?;
    println!("Verification email sent");
    Ok(())
}

async fn logout(ctx: &mut App, all_devices: bool) -> Result<()> {
    let email = ctx.account.user().map(|u| u.email.clone()).or_else(|| ctx.config.last_email.clone());
    let result = ctx.account.logout(all_devices).await;

    // Local credentials go regardless of what the server said.
    if let Some(email) = email {
        CredentialStore::delete(&email)?;
    }
    ctx.client.clear_token();

    result?;
    println!("{}", if all_devices { "Signed out on all devices" } else { "Signed out" });
    Ok(())
}

// ============================================================================
// Inventory
// ============================================================================

async fn show_inventory(ctx: &App) -> Result<()> {
    let mut screen = ctx.inventory_screen()?;
    let _active = screen.activate();

    if screen.load().await? == Loaded::Cancelled {
        bail!("Timed out loading inventory");
    }
    print_inventory(&screen);
    Ok(())
}

fn print_inventory(screen: &InventoryScreen) {
    let items = screen.items();
    if items.is_empty() {
        println!("Your pantry is empty");
        return;
    }

    for item in items {
        let marker = match item.expiry_status() {
            ExpiryStatus::Expired => "!",
            ExpiryStatus::ExpiresSoon => "~",
            ExpiryStatus::Fresh => " ",
        };
        let expiry = item.formatted_expiry_date.as_deref().unwrap_or("-");
        let stored = item
            .days_stored()
            .map(|days| format!("{}d", days))
            .unwrap_or_default();
        println!(
            "{} {:>6}  {:<width$} x{:<5} {:<10} {}",
            marker,
            item.id,
            truncate_string(&item.display_name(), NAME_COLUMN_WIDTH),
            item.quantity,
            expiry,
            stored,
            width = NAME_COLUMN_WIDTH,
        );
    }
}

/// Print the list after a change. The change itself is already saved.
fn show_refreshed(screen: &InventoryScreen, loaded: Loaded) {
    match loaded {
        Loaded::RefreshFailed | Loaded::Cancelled => {
            eprintln!("Failed to load inventory; run `larder inventory` to refresh")
        }
        _ => print_inventory(screen),
    }
}

async fn show_names(ctx: &App) -> Result<()> {
    let mut screen = ctx.inventory_screen()?;
    let _active = screen.activate();

    let Some(names) = screen.item_names().await? else {
        bail!("Timed out loading item names");
    };
    for name in names {
        println!("{}", name);
    }
    Ok(())
}

/// Parse `<name> [qty] [dd/mm/yyyy]` into an item form.
fn parse_item_args(args: &[String]) -> Result<NewItem> {
    let name = args.first().ok_or_else(|| anyhow!("Item name is required"))?;
    let mut item = NewItem::named(name.as_str());
    if let Some(quantity) = args.get(1) {
        item = item.with_quantity(quantity.as_str());
    }
    if let Some(date) = args.get(2) {
        let date = parse_day_month_year(date)
            .ok_or_else(|| anyhow!("Invalid expiry date '{}', expected dd/mm/yyyy", date))?;
        item = item.with_expiry(date);
    }
    Ok(item)
}

fn parse_item_id(arg: Option<&String>) -> Result<i64> {
    let arg = arg.ok_or_else(|| anyhow!("Item id is required"))?;
    arg.parse().with_context(|| format!("Invalid item id '{}'", arg))
}

async fn add_item(ctx: &App, args: &[String]) -> Result<()> {
    let item = parse_item_args(args)?;
    let mut screen = ctx.inventory_screen()?;
    let _active = screen.activate();

    let loaded = screen.add(&item).await?;
    println!("Added {}", item.name.trim());
    show_refreshed(&screen, loaded);
    Ok(())
}

async fn edit_item(ctx: &App, args: &[String]) -> Result<()> {
    let id = parse_item_id(args.first())?;
    let item = parse_item_args(&args[1..])?;
    let mut screen = ctx.inventory_screen()?;
    let _active = screen.activate();

    let loaded = screen.edit(id, &item).await?;
    println!("Updated item {}", id);
    show_refreshed(&screen, loaded);
    Ok(())
}

async fn delete_item(ctx: &App, args: &[String]) -> Result<()> {
    let id = parse_item_id(args.first())?;
    let confirmed = args.iter().any(|a| a == "--yes");

    let mut screen = ctx.inventory_screen()?;
    let _active = screen.activate();
    screen.load().await?;

    let item = screen
        .item(id)
        .ok_or_else(|| anyhow!("No item with id {}", id))?
        .clone();
    if !confirmed && InventoryScreen::requires_delete_confirmation(&item) {
        let answer = prompt(&format!("Delete {} ({})? [y/N] ", item.display_name(), item.quantity))?;
        if !answer.eq_ignore_ascii_case("y") {
            println!("Kept {}", item.display_name());
            return Ok(());
        }
    }

    let loaded = screen.delete(id).await?;
    println!("Deleted {}", item.display_name());
    if loaded == Loaded::RefreshFailed {
        eprintln!("Failed to load inventory; run `larder inventory` to refresh");
    }
    Ok(())
}

// ============================================================================
// Preferences
// ============================================================================

fn parse_flag(name: &str) -> Result<DietaryFlag> {
    let wanted = name.to_lowercase().replace(['-', '_'], " ");
    DietaryFlag::ALL
        .into_iter()
        .find(|flag| flag.label().to_lowercase() == wanted)
        .ok_or_else(|| anyhow!("Unknown preference '{}'", name))
}

fn parse_switch(value: &str) -> Result<bool> {
    match value {
        "on" | "true" | "yes" => Ok(true),
        "off" | "false" | "no" => Ok(false),
        other => bail!("Expected on or off, got '{}'", other),
    }
}

async fn preferences(ctx: &App, args: &[String]) -> Result<()> {
    let mut screen = ctx.preferences_screen()?;
    let _active = screen.activate();

    match screen.load().await? {
        Loaded::Cancelled => bail!("Timed out loading preferences"),
        Loaded::Fallback => eprintln!("Could not load saved preferences, showing defaults"),
        Loaded::FromCache | Loaded::FromNetwork | Loaded::RefreshFailed => {}
    }

    match args.first().map(String::as_str) {
        None => {}
        Some("set") => {
            let flag = parse_flag(args.get(1).ok_or_else(|| anyhow!("Preference name is required"))?)?;
            let value = parse_switch(args.get(2).map(String::as_str).unwrap_or("on"))?;
            screen.set(flag, value);
            screen.save().await?;
        }
        Some("custom") => {
            let text = args[1..].join(" ");
            let enable = !text.is_empty() && text != "off";
            if screen.preferences().is_custom != enable {
                screen.toggle_custom();
            }
            if enable {
                screen.set_custom_text(text);
            }
            screen.save().await?;
        }
        Some(other) => bail!("Unknown prefs subcommand '{}'", other),
    }

    let prefs = screen.preferences();
    for flag in DietaryFlag::ALL {
        println!("[{}] {}", if prefs.get(flag) { "x" } else { " " }, flag.label());
    }
    if prefs.is_custom {
        println!("[x] Custom: {}", prefs.custom_text);
    }
    Ok(())
}

// ============================================================================
// Camera
// ============================================================================

async fn analyse(ctx: &App, args: &[String]) -> Result<()> {
    let path = args.first().ok_or_else(|| anyhow!("Usage: larder analyse <image-file> [--add]"))?;
    let add = args.iter().any(|a| a == "--add");
    let image = encode_image(Path::new(path))?;

    let mut screen = ctx.camera_screen()?;
    let _active = screen.activate();

    let Some(items) = screen.analyse(&image).await? else {
        bail!("Timed out analysing image");
    };
    if items.is_empty() {
        println!("No groceries recognised");
        return Ok(());
    }
    for item in &items {
        match item.prob {
            Some(prob) => println!("{} ({:.0}%)", item.name, prob * 100.0),
            None => println!("{}", item.name),
        }
    }

    if add {
        let added = screen.add_detected(&items).await?;
        println!("Added {} item(s) to your pantry", added);
    }
    Ok(())
}

fn encode_image(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(base64::engine::general_purpose::STANDARD.encode(bytes))
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
