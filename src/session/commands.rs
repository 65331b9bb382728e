//! Base command handlers
//!
//! The server's own behavior for each verb, run between the ftplet chain's
//! before and after phases. File-system commands are accepted by the chain
//! but have no base implementation here.

use log::{info, warn};

use crate::auth::evaluate;
use crate::error::AuthError;
use crate::protocol::{FtpReply, FtpRequest, responses};
use crate::session::{FtpSession, SessionServices};

const SUPPORTED_COMMANDS: [&str; 8] = ["USER", "PASS", "QUIT", "NOOP", "SYST", "PWD", "HELP", "FEAT"];

/// Commands allowed before login.
const PRE_LOGIN_COMMANDS: [&str; 7] = ["USER", "PASS", "QUIT", "NOOP", "SYST", "HELP", "FEAT"];

/// Represents the outcome status of executing a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Struct encapsulating the full result of a command execution.
#[derive(Debug, Clone)]
pub struct CommandResult {
    pub status: CommandStatus,
    pub reply: FtpReply,
}

impl CommandResult {
    fn success(reply: FtpReply) -> Self {
        Self {
            status: CommandStatus::Success,
            reply,
        }
    }

    fn failure(reason: impl Into<String>, reply: FtpReply) -> Self {
        Self {
            status: CommandStatus::Failure(reason.into()),
            reply,
        }
    }
}

/// Dispatches a request to its base handler.
pub fn execute(
    session: &mut FtpSession,
    request: &FtpRequest,
    services: &SessionServices,
) -> CommandResult {
    let verb = request.verb();

    if !session.is_logged_in() && !PRE_LOGIN_COMMANDS.contains(&verb) {
        return CommandResult::failure(
            "Not logged in",
            FtpReply::new(responses::NOT_LOGGED_IN, "Not logged in."),
        );
    }

    match verb {
        "USER" => handle_cmd_user(session, request, services),
        "PASS" => handle_cmd_pass(session, request, services),
        "QUIT" => handle_cmd_quit(),
        "NOOP" => CommandResult::success(FtpReply::new(responses::OK, "Command okay.")),
        "SYST" => CommandResult::success(FtpReply::new(responses::SYSTEM_TYPE, "UNIX Type: L8")),
        "PWD" => CommandResult::success(FtpReply::new(
            responses::PATHNAME_CREATED,
            "\"/\" is current directory.",
        )),
        "HELP" => handle_cmd_help(),
        "FEAT" => handle_cmd_feat(),
        _ => CommandResult::failure(
            format!("Unsupported command {}", verb),
            FtpReply::new(responses::NOT_IMPLEMENTED, "Command not implemented."),
        ),
    }
}

/// Handles the USER command: records the user name and drops any previous login.
fn handle_cmd_user(
    session: &mut FtpSession,
    request: &FtpRequest,
    services: &SessionServices,
) -> CommandResult {
    let Some(username) = request.argument() else {
        return CommandResult::failure(
            "Missing user name",
            FtpReply::new(responses::SYNTAX_ERROR_ARGS, "Syntax error in parameters or arguments."),
        );
    };

    if session.logout() {
        services
            .statistics()
            .release_login(session.peer_addr().ip());
    }

    match crate::auth::users::validate_username(username) {
        Ok(()) => {
            session.set_username(Some(username.to_string()));
            CommandResult::success(FtpReply::new(
                responses::PASSWORD_REQUIRED,
                format!("User name okay, need password for {}.", username),
            ))
        }
        Err(e) => {
            let code = match e {
                AuthError::MalformedInput(_) => responses::SYNTAX_ERROR_ARGS,
                _ => responses::NOT_LOGGED_IN,
            };
            CommandResult::failure(e.to_string(), FtpReply::new(code, "Invalid user name."))
        }
    }
}

/// Handles the PASS command: authenticates, then applies the concurrent-login rule.
fn handle_cmd_pass(
    session: &mut FtpSession,
    request: &FtpRequest,
    services: &SessionServices,
) -> CommandResult {
    if session.is_logged_in() {
        return CommandResult::success(FtpReply::new(
            responses::LOGIN_SUCCESS,
            "Already logged in.",
        ));
    }

    let Some(username) = session.username().map(str::to_string) else {
        return CommandResult::failure(
            "Username not provided",
            FtpReply::new(responses::BAD_SEQUENCE, "Login with USER first."),
        );
    };
    let password = request.argument().unwrap_or("");
    let stats = services.statistics();

    let user = match services.user_manager().authenticate(&username, password) {
        Ok(user) => user,
        Err(e) => {
            stats.login_failed();
            warn!("Login failed for {} from {}: {}", username, session.peer_addr(), e);
            return CommandResult::failure(
                e.to_string(),
                FtpReply::new(responses::NOT_LOGGED_IN, "Authentication failed."),
            );
        }
    };

    let ip = session.peer_addr().ip();
    let login = stats.reserve_login(ip);
    match evaluate(services.login_permission(), &login) {
        Some(_permit) => {
            session.set_logged_in(true);
            stats.login_succeeded();
            info!(
                "User {} logged in from {} ({} concurrent logins)",
                user.name(),
                session.peer_addr(),
                login.concurrent_logins()
            );
            CommandResult::success(FtpReply::new(
                responses::LOGIN_SUCCESS,
                format!("User {} logged in.", user.name()),
            ))
        }
        None => {
            stats.release_login(ip);
            warn!(
                "Login limit reached for {} from {} ({} total, {} from address)",
                user.name(),
                ip,
                login.concurrent_logins(),
                login.concurrent_logins_from_ip()
            );
            CommandResult::failure(
                "Login limit reached",
                FtpReply::new(responses::NOT_LOGGED_IN, "Maximum login limit reached."),
            )
        }
    }
}

/// Handles the QUIT command: signals connection close.
fn handle_cmd_quit() -> CommandResult {
    CommandResult {
        status: CommandStatus::CloseConnection,
        reply: FtpReply::new(responses::CLOSING, "Goodbye."),
    }
}

fn handle_cmd_help() -> CommandResult {
    let mut lines = vec!["The following commands are recognized:".to_string()];
    lines.push(format!(" {}", SUPPORTED_COMMANDS.join(" ")));
    lines.push("Help OK.".to_string());
    CommandResult::success(FtpReply::lines(responses::HELP, lines))
}

fn handle_cmd_feat() -> CommandResult {
    CommandResult::success(FtpReply::lines(
        responses::SYSTEM_STATUS,
        ["Extensions supported:", " UTF8", "End"],
    ))
}
