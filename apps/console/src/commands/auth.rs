//! # Session & Navigation Commands
//!
//! ```text
//!   login ──► SessionStore::login ──► go(pending or Home)
//!   go    ──► guard ──► leave(current) ──► enter(target) ──► render
//! ```
//!
//! Entering a screen loads what it shows. Leaving the alert board stops
//! its poller.

use tracing::{debug, info, warn};

use super::{account, alerts, catalog, customers, reports, require, sale};
use crate::error::{CommandResult, ConsoleError};
use crate::state::AppState;
use vetdesk_client::{AccountView, AlertPoller, ClientError, Route, TopItems};

/// Logs in, then opens the screen that asked for it.
pub async fn login(state: &mut AppState, user: &str, pass: &str, remember: bool) -> CommandResult<()> {
    debug!(user = %user, remember, "login command");

    if let Err(e) = state
        .session
        .login(state.apis.auth.as_ref(), user, pass, remember)
        .await
    {
        warn!(error = %e, "Login failed");
        let message = match &e {
            ClientError::Core(core) => core.to_string(),
            other => other.user_message("Invalid credentials"),
        };
        state.notifier.error(&message);
        return Err(e.into());
    }

    state.notifier.success("Logged in");
    let target = state.pending.take().unwrap_or(Route::Home);
    go(state, target).await
}

pub async fn logout(state: &mut AppState) -> CommandResult<()> {
    debug!("logout command");

    leave(state).await;
    state.views.account = None;
    state.pending = None;
    state.route = Route::Login;
    state.session.logout().await?;

    state.notifier.info("Logged out");
    Ok(())
}

pub async fn whoami(state: &AppState) {
    let session = state.session.current().await;
    if session.is_authenticated() {
        println!(
            "logged in{} on {}",
            if session.is_admin { " (admin)" } else { "" },
            state.route.path()
        );
    } else {
        match session.remembered_user {
            Some(user) => println!("not logged in (last user: {})", user),
            None => println!("not logged in"),
        }
    }
}

/// Moves to `route` if the guard allows it.
pub async fn go(state: &mut AppState, route: Route) -> CommandResult<()> {
    require(state, route).await?;

    if state.route != route {
        leave(state).await;
    }
    state.route = route;
    info!(route = %route.path(), "Navigated");

    enter(state, route).await
}

/// Stops work tied to the current screen.
pub async fn leave(state: &mut AppState) {
    if let Some(poller) = state.views.poller.take() {
        if let Err(e) = poller.shutdown().await {
            warn!(error = %e, "Alert poller did not stop cleanly");
        }
    }
}

/// Loads and renders a screen. Also backs `refresh`.
pub async fn enter(state: &mut AppState, route: Route) -> CommandResult<()> {
    match route {
        Route::Home => println!("{}", super::HELP),
        Route::Login => println!("login <user> <pass> [--remember]"),
        Route::Sales => {
            // both feed the screen; one failing must not hide the other
            let (top, customers) = tokio::join!(
                TopItems::load(
                    state.apis.catalog.as_ref(),
                    state.config.client.search.top_items_limit
                ),
                state.views.customers.refresh()
            );
            if let Err(e) = customers {
                debug!(error = %e, "Customer list unavailable on the sales screen");
            }
            match top {
                Ok(top) => state.views.sales.top_items = Some(top),
                Err(e) => {
                    warn!(error = %e, "Failed to load top items");
                    state.notifier.error(&e.user_message("Error loading items"));
                }
            }
            sale::render(state);
        }
        Route::Alerts => {
            state.views.alerts.refresh().await?;
            if state.views.poller.is_none() {
                if let Some(period) = state.config.client.alert_refresh_interval() {
                    state.views.poller = Some(AlertPoller::spawn(state.views.alerts.clone(), period));
                }
            }
            alerts::show(state);
        }
        Route::Reports => {
            state.views.reports.reload().await?;
            reports::render(state);
        }
        Route::Services => {
            state.views.services.refresh().await?;
            catalog::render_services(state);
        }
        Route::Warehouse | Route::Admin => {
            state.views.products.refresh().await?;
            catalog::render_products(state);
        }
        Route::Accounts => {
            state.views.customers.refresh().await?;
            customers::render(state);
        }
        Route::SalesHistory => {
            state.views.history.refresh().await?;
            customers::render_history(state);
        }
        Route::CustomerAccount(id) => {
            let keep = state
                .views
                .account
                .as_ref()
                .is_some_and(|view| view.customer_id() == id);
            if !keep {
                state.views.account = Some(AccountView::new(
                    state.apis.customers.clone(),
                    state.apis.sales.clone(),
                    state.notifier.clone(),
                    state.confirmer.clone(),
                    id,
                ));
            }
            if let Some(view) = state.views.account.as_mut() {
                view.refresh().await?;
            }
            account::render(state);
        }
    }
    Ok(())
}

/// The open account view, or a usage error when none is open.
pub fn open_account(state: &mut AppState) -> CommandResult<&mut AccountView> {
    match state.route {
        Route::CustomerAccount(_) => state
            .views
            .account
            .as_mut()
            .ok_or_else(|| ConsoleError::usage("no account open: account <customer id>")),
        _ => Err(ConsoleError::usage("no account open: account <customer id>")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{dispatch, Command, Flow};
    use crate::error::ErrorCode;
    use crate::testing::harness;

    #[tokio::test]
    async fn test_guard_remembers_target_and_login_returns_there() {
        let mut h = harness(false).await;

        let err = dispatch(&mut h.state, Command::Go(Route::Reports)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthenticated);
        assert_eq!(h.state.pending, Some(Route::Reports));
        assert_eq!(h.state.route, Route::Login);

        login(&mut h.state, "ana", "secreto", false).await.unwrap();
        assert_eq!(h.state.route, Route::Reports);
        assert!(h.state.pending.is_none());
    }

    #[tokio::test]
    async fn test_failed_login_notifies_and_stays() {
        let mut h = harness(false).await;
        h.api.fail_on("login", 401, Some("Credenciales inválidas"));

        let err = login(&mut h.state, "ana", "wrong", false).await.unwrap_err();
        assert!(err.already_notified());
        assert_eq!(h.errors(), vec!["Credenciales inválidas".to_string()]);
        assert!(!h.state.session.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_commands_behind_login() {
        let mut h = harness(false).await;

        let err = dispatch(&mut h.state, Command::Checkout).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Unauthenticated);
        assert_eq!(h.state.pending, Some(Route::Sales));

        let flow = dispatch(&mut h.state, Command::Help).await.unwrap();
        assert_eq!(flow, Flow::Continue);
    }

    #[tokio::test]
    async fn test_logout_drops_session() {
        let mut h = harness(true).await;
        go(&mut h.state, Route::Accounts).await.unwrap();

        logout(&mut h.state).await.unwrap();
        assert_eq!(h.state.route, Route::Login);
        assert!(!h.state.session.is_authenticated().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaving_alerts_stops_poller() {
        let mut h = harness(true).await;

        go(&mut h.state, Route::Alerts).await.unwrap();
        assert!(h.state.views.poller.is_some());

        go(&mut h.state, Route::Home).await.unwrap();
        assert!(h.state.views.poller.is_none());
    }

    #[tokio::test]
    async fn test_account_commands_need_open_account() {
        let mut h = harness(true).await;
        let err = dispatch(&mut h.state, Command::Settle).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Usage);
    }
}
