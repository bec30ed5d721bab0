use std::io::IsTerminal;
use std::path::PathBuf;

use argh::FromArgs;
use exitcode::ExitCode;
use flowtrace::input;
use flowtrace::netflow::{Config, Decoder, Error};
use tracing::{debug, error, info};

#[derive(FromArgs)]
#[argh(
    description = "Flowtrace ploughs through NetFlow v9 files, plain or gzipped",
    help_triggers("-h", "--help")
)]
pub struct RootCommand {
    #[argh(switch, short = 'v', description = "show version")]
    version: bool,

    #[argh(
        option,
        short = 'f',
        long = "file",
        description = "input file, `-` reads from stdin"
    )]
    file: Option<PathBuf>,

    #[argh(
        switch,
        short = 'd',
        description = "dump raw bytes of every header and set"
    )]
    debug: bool,

    #[argh(
        option,
        short = 'l',
        default = "\"info\".to_string()",
        description = "log level"
    )]
    log_level: String,

    #[argh(switch, description = "write logs as JSON")]
    json: bool,
}

impl RootCommand {
    #![allow(clippy::print_stdout)]
    fn show_version(&self) {
        println!("Flowtrace {}", env!("CARGO_PKG_VERSION"));
    }

    fn levels(&self) -> String {
        if let Ok(levels) = std::env::var("FLOWTRACE_LOG") {
            return levels;
        }

        if self.debug && self.log_level == "info" {
            "debug".to_string()
        } else {
            self.log_level.clone()
        }
    }

    pub fn run(&self) -> Result<(), ExitCode> {
        if self.version {
            self.show_version();
            return Ok(());
        }

        let Some(path) = &self.file else {
            eprintln!("Required option not provided: --file, see --help");
            return Err(exitcode::USAGE);
        };

        let color = std::io::stdout().is_terminal();
        flowtrace::trace::init(color, self.json, &self.levels());

        if self.debug {
            debug!(message = "enabled debug");
        }

        let reader = input::open(path).map_err(|err| {
            error!(
                message = "could not open file",
                path = %path.display(),
                %err
            );

            exitcode::NOINPUT
        })?;

        let config = Config {
            debug: self.debug,
            ..Default::default()
        };
        let mut decoder = Decoder::new(reader, config);

        match decoder.run() {
            Ok(messages) => {
                info!(
                    message = "end of stream",
                    messages,
                    offset = decoder.position(),
                    templates = decoder.templates().len()
                );

                Ok(())
            }
            Err(Error::HeaderNotFound { attempts }) => {
                error!(
                    message = "failed to find NetFlow v9 header",
                    attempts,
                    offset = decoder.position()
                );

                Err(exitcode::DATAERR)
            }
            Err(err) => {
                error!(
                    message = "read failed",
                    %err,
                    offset = decoder.position()
                );

                Err(exitcode::IOERR)
            }
        }
    }
}
