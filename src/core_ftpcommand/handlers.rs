use crate::config::Config;
use crate::core_ftpcommand::ftpcommand::FtpCommand;
use crate::core_ftpcommand::{cwd, list, nlst, pass, pwd, quit, retr, stor, type_, user};
use crate::core_network::pasv;
use crate::helpers::{send_response, ControlWriter};
use crate::session::Session;
use log::{debug, warn};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Mutex as TokioMutex;

/// What the control loop does after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFlow {
    Continue,
    Terminate,
}

pub type HandlerResult = Result<SessionFlow, std::io::Error>;

type CommandHandler = Box<
    dyn Fn(
            ControlWriter,
            Arc<Config>,
            Arc<TokioMutex<Session>>,
            String, // Argument, empty when absent
        ) -> Pin<Box<dyn Future<Output = HandlerResult> + Send>>
        + Send
        + Sync,
>;

/// Splits one control line into an upper-cased verb and its argument.
///
/// The argument is everything after the first run of whitespace, minus the
/// line terminator. Returns `None` for blank lines.
pub fn parse_command_line(line: &str) -> Option<(String, String)> {
    let line = line.trim_end_matches(['\r', '\n']).trim_start();
    if line.trim().is_empty() {
        return None;
    }

    match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => Some((verb.to_ascii_uppercase(), rest.trim_start().to_string())),
        None => Some((line.to_ascii_uppercase(), String::new())),
    }
}

/// Verb to handler mapping, built once at startup and only read afterwards.
pub struct CommandTable {
    handlers: HashMap<FtpCommand, CommandHandler>,
}

impl CommandTable {
    pub fn new() -> Self {
        let mut table = Self {
            handlers: HashMap::new(),
        };

        table.register(FtpCommand::USER, user::handle_user_command);
        table.register(FtpCommand::PASS, pass::handle_pass_command);
        table.register(FtpCommand::PWD, pwd::handle_pwd_command);
        table.register(FtpCommand::CWD, cwd::handle_cwd_command);
        table.register(FtpCommand::TYPE, type_::handle_type_command);
        table.register(FtpCommand::PASV, pasv::handle_pasv_command);
        table.register(FtpCommand::NLST, nlst::handle_nlst_command);
        table.register(FtpCommand::LIST, list::handle_list_command);
        table.register(FtpCommand::RETR, retr::handle_retr_command);
        table.register(FtpCommand::STOR, stor::handle_stor_command);
        table.register(FtpCommand::QUIT, quit::handle_quit_command);

        table
    }

    fn register<F, Fut>(&mut self, command: FtpCommand, handler: F)
    where
        F: Fn(ControlWriter, Arc<Config>, Arc<TokioMutex<Session>>, String) -> Fut
            + Send
            + Sync
            + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.handlers.insert(
            command,
            Box::new(move |writer, config, session, arg| {
                Box::pin(handler(writer, config, session, arg))
            }),
        );
    }

    #[cfg(test)]
    pub fn contains(&self, command: FtpCommand) -> bool {
        self.handlers.contains_key(&command)
    }

    /// Parses `line` and runs the matching handler.
    pub async fn dispatch(
        &self,
        line: &str,
        writer: ControlWriter,
        config: Arc<Config>,
        session: Arc<TokioMutex<Session>>,
    ) -> HandlerResult {
        let Some((verb, arg)) = parse_command_line(line) else {
            warn!("Unparsable command line: {:?}", line);
            send_response(&writer, b"500 Syntax error, command unrecognized\r\n").await?;
            return Ok(SessionFlow::Continue);
        };

        let handler = FtpCommand::parse(&verb).and_then(|command| self.handlers.get(&command));
        match handler {
            Some(handler) => {
                debug!("Dispatching {} with argument {:?}", verb, arg);
                handler(writer, config, session, arg).await
            }
            None => {
                debug!("Command not implemented: {}", verb);
                send_response(&writer, b"502 Command not implemented\r\n").await?;
                Ok(SessionFlow::Continue)
            }
        }
    }
}

impl Default for CommandTable {
    fn default() -> Self {
        Self::new()
    }
}
