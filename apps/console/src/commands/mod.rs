//! # Console Commands
//!
//! Every operator command, parsed from one prompt line.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs        ◄─── You are here (parsing, guard, dispatch)
//! ├── auth.rs       ◄─── login, logout, whoami, go
//! ├── sale.rs       ◄─── search, top, browse, checkout, preview
//! ├── cart.rs       ◄─── add, qty, rm, cart, customer, credit
//! ├── account.rs    ◄─── account, interest, settle, pay
//! ├── alerts.rs     ◄─── alerts, filter, find, resolve
//! ├── reports.rs    ◄─── report, export
//! ├── catalog.rs    ◄─── products, services (+ save / delete)
//! ├── customers.rs  ◄─── customers, history, sale
//! └── config.rs     ◄─── config
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Command Flow                                         │
//! │                                                                         │
//! │  > pay 12 "1500.50"                                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  split_args ──► ["pay", "12", "1500.50"]                               │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Command::parse ──► Pay { sale_id: 12, amount: Some("1500.50") }       │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  guard: command.route() vs session ──► login required / admin only     │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  account::pay(state, 12, Some("1500.50"))                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod account;
pub mod alerts;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod customers;
pub mod reports;
pub mod sale;

use std::path::PathBuf;

use crate::error::{CommandResult, ConsoleError, ErrorCode};
use crate::state::AppState;
use vetdesk_client::{check_access, Access, Route, SearchScope};
use vetdesk_core::alerts::AlertFilter;
use vetdesk_core::reports::ReportKind;
use vetdesk_core::ItemKind;

/// What the prompt loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Admin forms are typed as `field=value` pairs.
pub type Fields = Vec<(String, String)>;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Quit,
    Go(Route),
    Login { user: String, pass: String, remember: bool },
    Logout,
    WhoAmI,
    Config { save: bool },

    // point of sale
    Search(String),
    Scope(SearchScope),
    Top,
    Browse { kind: ItemKind, query: String },
    Next,
    Prev,
    Add { index: usize, qty: i64 },
    Qty { key: String, raw: String },
    Remove(String),
    Cart,
    ClearCart,
    Customer(String),
    Credit(bool),
    Preview,
    Checkout,

    // customer account
    Account(i64),
    Interest(String),
    Settle,
    Pay { sale_id: i64, amount: Option<String> },

    // alerts
    Alerts,
    Filter(AlertFilter),
    Find(String),
    Resolve(i64),

    // reports
    Report { from: Option<String>, to: Option<String> },
    Export { kind: ReportKind, dir: Option<PathBuf> },

    // administration
    Products(String),
    SaveProduct { id: Option<i64>, fields: Fields },
    DeleteProduct(i64),
    Services(String),
    SaveService { id: Option<i64>, fields: Fields },
    DeleteService(i64),
    Customers(String),
    SaveCustomer { id: Option<i64>, fields: Fields },
    DeleteCustomer(i64),
    History(String),
    SaleDetail(i64),
    Refresh,
}

pub const HELP: &str = "\
screens      / /venta /historialVenta /alert /reports /servicios /cuentas /customer/<id> /Almacen /AdminPage
navigation   go <path> | login <user> <pass> [--remember] | logout | whoami | config [save] | quit
sale         search <text> | scope products|services|both | top | browse products|services [text]
             next | prev | add <n> [qty] | qty <key> <n> | rm <key> | cart | clear
             customer <id|-> | credit on|off | preview | checkout
account      account <customer id> | interest <pct> | settle | pay <sale id> [amount]
alerts       alerts | filter all|expiring|expired|low_stock | find <text> | resolve <id>
reports      report [<from> <to>] | export sales|profit [dir]
admin        products [text] | product new|<id> field=value... | product rm <id>
             services [text] | service new|<id> field=value... | service rm <id>
             customers [text] | customer-save new|<id> field=value... | customer-rm <id>
             history [text] | sale <id> | refresh";

// =============================================================================
// Tokenizer
// =============================================================================

/// Splits a prompt line on whitespace. Double quotes group words and `\"`
/// is a literal quote.
pub fn split_args(line: &str) -> CommandResult<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut started = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if in_quotes => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            '"' => {
                in_quotes = !in_quotes;
                started = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if started {
                    args.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            c => {
                current.push(c);
                started = true;
            }
        }
    }

    if in_quotes {
        return Err(ConsoleError::usage("unterminated quote"));
    }
    if started {
        args.push(current);
    }
    Ok(args)
}

fn parse_id(raw: Option<&String>, usage: &str) -> CommandResult<i64> {
    raw.and_then(|s| s.parse().ok())
        .ok_or_else(|| ConsoleError::usage(format!("expected: {}", usage)))
}

fn parse_fields(args: &[String]) -> CommandResult<Fields> {
    args.iter()
        .map(|arg| {
            arg.split_once('=')
                .map(|(k, v)| (k.trim().to_string(), v.to_string()))
                .ok_or_else(|| ConsoleError::usage(format!("expected field=value, got '{}'", arg)))
        })
        .collect()
}

/// `new` or an id, then the fields.
fn parse_save(args: &[String], usage: &str) -> CommandResult<(Option<i64>, Fields)> {
    let id = match args.first().map(String::as_str) {
        Some("new") => None,
        Some(_) => Some(parse_id(args.first(), usage)?),
        None => return Err(ConsoleError::usage(format!("expected: {}", usage))),
    };
    Ok((id, parse_fields(&args[1..])?))
}

impl Command {
    /// Parses one line. `Ok(None)` for a blank line.
    pub fn parse(line: &str) -> CommandResult<Option<Command>> {
        let args = split_args(line)?;
        let Some((name, rest)) = args.split_first() else {
            return Ok(None);
        };
        let joined = rest.join(" ");

        let command = match name.as_str() {
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            "go" => {
                let path = rest.first().map(String::as_str).unwrap_or("/");
                Command::Go(
                    Route::parse(path)
                        .ok_or_else(|| ConsoleError::usage(format!("unknown path: {}", path)))?,
                )
            }
            "login" => {
                let (Some(user), Some(pass)) = (rest.first(), rest.get(1)) else {
                    return Err(ConsoleError::usage("expected: login <user> <pass> [--remember]"));
                };
                Command::Login {
                    user: user.clone(),
                    pass: pass.clone(),
                    remember: rest.iter().skip(2).any(|a| a == "--remember"),
                }
            }
            "logout" => Command::Logout,
            "whoami" => Command::WhoAmI,
            "config" => Command::Config {
                save: rest.first().map(String::as_str) == Some("save"),
            },

            "search" => Command::Search(joined),
            "scope" => Command::Scope(
                joined
                    .parse()
                    .map_err(|e: vetdesk_client::ClientError| ConsoleError::usage(e.to_string()))?,
            ),
            "top" => Command::Top,
            "browse" => {
                let kind = match rest.first().map(String::as_str) {
                    Some("products") | Some("product") => ItemKind::Product,
                    Some("services") | Some("service") => ItemKind::Service,
                    _ => return Err(ConsoleError::usage("expected: browse products|services [text]")),
                };
                Command::Browse {
                    kind,
                    query: rest[1..].join(" "),
                }
            }
            "next" => Command::Next,
            "prev" => Command::Prev,
            "add" => {
                let index = rest
                    .first()
                    .and_then(|s| s.parse::<usize>().ok())
                    .filter(|n| *n >= 1)
                    .ok_or_else(|| ConsoleError::usage("expected: add <n> [qty]"))?;
                let qty = match rest.get(1) {
                    Some(raw) => raw
                        .parse()
                        .map_err(|_| ConsoleError::usage("quantity must be a whole number"))?,
                    None => 1,
                };
                Command::Add { index, qty }
            }
            "qty" => {
                let (Some(key), Some(raw)) = (rest.first(), rest.get(1)) else {
                    return Err(ConsoleError::usage("expected: qty <key> <n>"));
                };
                Command::Qty {
                    key: key.clone(),
                    raw: raw.clone(),
                }
            }
            "rm" => Command::Remove(
                rest.first()
                    .cloned()
                    .ok_or_else(|| ConsoleError::usage("expected: rm <key>"))?,
            ),
            "cart" => Command::Cart,
            "clear" => Command::ClearCart,
            "customer" => match rest.first().map(String::as_str) {
                None | Some("-") | Some("none") => Command::Customer(String::new()),
                Some(id) => Command::Customer(id.to_string()),
            },
            "credit" => match rest.first().map(String::as_str) {
                Some("on") | Some("yes") => Command::Credit(true),
                Some("off") | Some("no") => Command::Credit(false),
                _ => return Err(ConsoleError::usage("expected: credit on|off")),
            },
            "preview" => Command::Preview,
            "checkout" => Command::Checkout,

            "account" => Command::Account(parse_id(rest.first(), "account <customer id>")?),
            "interest" => Command::Interest(joined),
            "settle" => Command::Settle,
            "pay" => Command::Pay {
                sale_id: parse_id(rest.first(), "pay <sale id> [amount]")?,
                amount: rest.get(1).cloned(),
            },

            "alerts" => Command::Alerts,
            "filter" => Command::Filter(joined.parse().map_err(|e: String| ConsoleError::usage(e))?),
            "find" => Command::Find(joined),
            "resolve" => Command::Resolve(parse_id(rest.first(), "resolve <alert id>")?),

            "report" => match rest {
                [] => Command::Report { from: None, to: None },
                [from, to] => Command::Report {
                    from: Some(from.clone()),
                    to: Some(to.clone()),
                },
                _ => return Err(ConsoleError::usage("expected: report [<from> <to>]")),
            },
            "export" => {
                let kind = match rest.first().map(String::as_str) {
                    Some("sales") => ReportKind::Sales,
                    Some("profit") => ReportKind::Profit,
                    _ => return Err(ConsoleError::usage("expected: export sales|profit [dir]")),
                };
                Command::Export {
                    kind,
                    dir: rest.get(1).map(PathBuf::from),
                }
            }

            "products" => Command::Products(joined),
            "product" => match rest.first().map(String::as_str) {
                Some("rm") => Command::DeleteProduct(parse_id(rest.get(1), "product rm <id>")?),
                _ => {
                    let (id, fields) = parse_save(rest, "product new|<id> field=value...")?;
                    Command::SaveProduct { id, fields }
                }
            },
            "services" => Command::Services(joined),
            "service" => match rest.first().map(String::as_str) {
                Some("rm") => Command::DeleteService(parse_id(rest.get(1), "service rm <id>")?),
                _ => {
                    let (id, fields) = parse_save(rest, "service new|<id> field=value...")?;
                    Command::SaveService { id, fields }
                }
            },
            "customers" => Command::Customers(joined),
            "customer-save" => {
                let (id, fields) = parse_save(rest, "customer-save new|<id> field=value...")?;
                Command::SaveCustomer { id, fields }
            }
            "customer-rm" => Command::DeleteCustomer(parse_id(rest.first(), "customer-rm <id>")?),
            "history" => Command::History(joined),
            "sale" => Command::SaleDetail(parse_id(rest.first(), "sale <id>")?),
            "refresh" => Command::Refresh,

            other => {
                return Err(ConsoleError::usage(format!(
                    "unknown command '{}', try 'help'",
                    other
                )))
            }
        };
        Ok(Some(command))
    }

    /// Screen a command belongs to, for the access check. `None` means it
    /// runs anywhere, logged in or not. `Refresh` uses the current screen.
    pub fn route(&self, current: Route) -> Option<Route> {
        use Command::*;
        match self {
            Help | Quit | Go(_) | Login { .. } | Logout | WhoAmI | Config { .. } => None,
            Search(_) | Scope(_) | Top | Browse { .. } | Next | Prev | Add { .. } | Qty { .. }
            | Remove(_) | Cart | ClearCart | Customer(_) | Credit(_) | Preview | Checkout => {
                Some(Route::Sales)
            }
            Account(id) => Some(Route::CustomerAccount(*id)),
            Interest(_) | Settle | Pay { .. } => Some(current),
            Alerts | Filter(_) | Find(_) | Resolve(_) => Some(Route::Alerts),
            Report { .. } | Export { .. } => Some(Route::Reports),
            Products(_) | DeleteProduct(_) => Some(Route::Warehouse),
            SaveProduct { .. } => Some(Route::Admin),
            Services(_) | SaveService { .. } | DeleteService(_) => Some(Route::Services),
            Customers(_) | SaveCustomer { .. } | DeleteCustomer(_) => Some(Route::Accounts),
            History(_) | SaleDetail(_) => Some(Route::SalesHistory),
            Refresh => Some(current),
        }
    }
}

// =============================================================================
// Guard & Dispatch
// =============================================================================

/// Applies the route guard for `route`.
pub async fn require(state: &mut AppState, route: Route) -> CommandResult<()> {
    let session = state.session.current().await;
    match check_access(route, &session) {
        Access::Allow => Ok(()),
        Access::RedirectLogin { from } => {
            state.pending = Some(from);
            state.route = Route::Login;
            Err(ConsoleError::new(
                ErrorCode::Unauthenticated,
                format!("Login required for {}: login <user> <pass>", from.path()),
            ))
        }
        Access::RedirectHome => {
            state.route = Route::Home;
            Err(ConsoleError::new(ErrorCode::Forbidden, "Admin access required"))
        }
    }
}

/// Runs one parsed command.
pub async fn dispatch(state: &mut AppState, command: Command) -> CommandResult<Flow> {
    if let Some(route) = command.route(state.route) {
        require(state, route).await?;
    }

    match command {
        Command::Help => println!("{}", HELP),
        Command::Quit => {
            auth::leave(state).await;
            return Ok(Flow::Quit);
        }
        Command::Go(route) => auth::go(state, route).await?,
        Command::Login { user, pass, remember } => auth::login(state, &user, &pass, remember).await?,
        Command::Logout => auth::logout(state).await?,
        Command::WhoAmI => auth::whoami(state).await,
        Command::Config { save } => config::show(state, save)?,

        Command::Search(query) => sale::search(state, &query).await?,
        Command::Scope(scope) => sale::set_scope(state, scope),
        Command::Top => sale::top(state).await?,
        Command::Browse { kind, query } => sale::browse(state, kind, &query).await?,
        Command::Next => sale::page(state, true).await?,
        Command::Prev => sale::page(state, false).await?,
        Command::Preview => sale::preview(state)?,
        Command::Checkout => sale::checkout(state).await?,

        Command::Add { index, qty } => cart::add(state, index, qty)?,
        Command::Qty { key, raw } => cart::set_quantity(state, &key, &raw)?,
        Command::Remove(key) => cart::remove(state, &key)?,
        Command::Cart => cart::show(state),
        Command::ClearCart => cart::clear(state),
        Command::Customer(raw) => cart::select_customer(state, &raw),
        Command::Credit(on) => cart::set_credit(state, on),

        Command::Account(id) => auth::go(state, Route::CustomerAccount(id)).await?,
        Command::Interest(raw) => account::interest(state, &raw)?,
        Command::Settle => account::settle(state).await?,
        Command::Pay { sale_id, amount } => account::pay(state, sale_id, amount.as_deref()).await?,

        Command::Alerts => alerts::show(state),
        Command::Filter(filter) => alerts::filter(state, filter),
        Command::Find(query) => alerts::find(state, &query),
        Command::Resolve(id) => alerts::resolve(state, id).await?,

        Command::Report { from, to } => reports::load(state, from.as_deref(), to.as_deref()).await?,
        Command::Export { kind, dir } => reports::export(state, kind, dir)?,

        Command::Products(query) => catalog::products(state, &query).await?,
        Command::SaveProduct { id, fields } => catalog::save_product(state, id, &fields).await?,
        Command::DeleteProduct(id) => catalog::delete_product(state, id).await?,
        Command::Services(query) => catalog::services(state, &query).await?,
        Command::SaveService { id, fields } => catalog::save_service(state, id, &fields).await?,
        Command::DeleteService(id) => catalog::delete_service(state, id).await?,
        Command::Customers(query) => customers::list(state, &query).await?,
        Command::SaveCustomer { id, fields } => customers::save(state, id, &fields).await?,
        Command::DeleteCustomer(id) => customers::delete(state, id).await?,
        Command::History(query) => customers::history(state, &query).await?,
        Command::SaleDetail(id) => customers::sale_detail(state, id).await?,
        Command::Refresh => {
            let route = state.route;
            auth::enter(state, route).await?
        }
    }
    Ok(Flow::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        Command::parse(line).unwrap().unwrap()
    }

    #[test]
    fn test_split_args_quotes() {
        assert_eq!(
            split_args(r#"product new nombre="Alimento 15kg" precio=1500"#).unwrap(),
            vec!["product", "new", "nombre=Alimento 15kg", "precio=1500"]
        );
        assert_eq!(split_args(r#"find "say \"hi\"""#).unwrap(), vec!["find", r#"say "hi""#]);
        assert_eq!(split_args(r#"interest """#).unwrap(), vec!["interest", ""]);
        assert!(split_args(r#"find "open"#).is_err());
        assert!(split_args("   ").unwrap().is_empty());
    }

    #[test]
    fn test_blank_line_is_no_command() {
        assert_eq!(Command::parse("  ").unwrap(), None);
    }

    #[test]
    fn test_parse_navigation() {
        assert_eq!(parse("go /alert"), Command::Go(Route::Alerts));
        assert_eq!(parse("go /customer/7"), Command::Go(Route::CustomerAccount(7)));
        assert!(Command::parse("go /nowhere").is_err());
        assert_eq!(
            parse("login ana secreto --remember"),
            Command::Login {
                user: "ana".into(),
                pass: "secreto".into(),
                remember: true
            }
        );
    }

    #[test]
    fn test_parse_sale_commands() {
        assert_eq!(parse("add 3"), Command::Add { index: 3, qty: 1 });
        assert_eq!(parse("add 2 5"), Command::Add { index: 2, qty: 5 });
        assert!(Command::parse("add 0").is_err());
        assert_eq!(parse("customer -"), Command::Customer(String::new()));
        assert_eq!(parse("customer 12"), Command::Customer("12".into()));
        assert_eq!(parse("scope services"), Command::Scope(SearchScope::Services));
        assert_eq!(parse("search pipeta perro"), Command::Search("pipeta perro".into()));
    }

    #[test]
    fn test_parse_account_and_reports() {
        assert_eq!(
            parse("pay 12 1500.50"),
            Command::Pay {
                sale_id: 12,
                amount: Some("1500.50".into())
            }
        );
        assert_eq!(parse("pay 12"), Command::Pay { sale_id: 12, amount: None });
        assert_eq!(
            parse("report 2024-01-01 2024-06-30"),
            Command::Report {
                from: Some("2024-01-01".into()),
                to: Some("2024-06-30".into())
            }
        );
        assert!(Command::parse("report 2024-01-01").is_err());
        assert_eq!(parse("filter expired"), Command::Filter(AlertFilter::Expired));
    }

    #[test]
    fn test_parse_admin_forms() {
        assert_eq!(
            parse("product 4 precio=900 stock=3"),
            Command::SaveProduct {
                id: Some(4),
                fields: vec![("precio".into(), "900".into()), ("stock".into(), "3".into())]
            }
        );
        assert_eq!(parse("service rm 8"), Command::DeleteService(8));
        assert!(Command::parse("customer-save new Ana").is_err());
    }

    #[test]
    fn test_command_routes() {
        assert_eq!(parse("checkout").route(Route::Home), Some(Route::Sales));
        assert_eq!(parse("product new nombre=X").route(Route::Home), Some(Route::Admin));
        assert_eq!(
            parse("settle").route(Route::CustomerAccount(3)),
            Some(Route::CustomerAccount(3))
        );
        assert_eq!(parse("help").route(Route::Sales), None);
    }
}
