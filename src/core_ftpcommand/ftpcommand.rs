/// Verbs understood on the control channel.
#[derive(Eq, Hash, PartialEq, Debug, Clone, Copy)]
pub enum FtpCommand {
    USER,
    PASS,
    PWD,
    CWD,
    TYPE,
    PASV,
    NLST,
    LIST,
    RETR,
    STOR,
    QUIT,
}

impl FtpCommand {
    /// Case-insensitive lookup of a verb token.
    pub fn parse(cmd: &str) -> Option<FtpCommand> {
        match cmd.to_ascii_uppercase().as_str() {
            "USER" => Some(FtpCommand::USER),
            "PASS" => Some(FtpCommand::PASS),
            "PWD" => Some(FtpCommand::PWD),
            "CWD" => Some(FtpCommand::CWD),
            "TYPE" => Some(FtpCommand::TYPE),
            "PASV" => Some(FtpCommand::PASV),
            "NLST" => Some(FtpCommand::NLST),
            "LIST" => Some(FtpCommand::LIST),
            "RETR" => Some(FtpCommand::RETR),
            "STOR" => Some(FtpCommand::STOR),
            "QUIT" => Some(FtpCommand::QUIT),
            _ => None,
        }
    }

    pub fn all() -> [FtpCommand; 11] {
        [
            FtpCommand::USER,
            FtpCommand::PASS,
            FtpCommand::PWD,
            FtpCommand::CWD,
            FtpCommand::TYPE,
            FtpCommand::PASV,
            FtpCommand::NLST,
            FtpCommand::LIST,
            FtpCommand::RETR,
            FtpCommand::STOR,
            FtpCommand::QUIT,
        ]
    }
}
