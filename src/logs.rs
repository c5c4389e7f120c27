use std::path::Path;

use anyhow::Result;
use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    {ContentLimit, FileRotate},
};
use log::Log;
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode, WriteLogger};

pub struct MainLogger {
    write_logger: Box<WriteLogger<FileRotate<AppendTimestamp>>>,
    echo_level: LevelFilter,
}

impl MainLogger {
    fn new(
        write_logger: Box<WriteLogger<FileRotate<AppendTimestamp>>>,
        echo_level: LevelFilter,
    ) -> Self {
        Self {
            write_logger,
            echo_level,
        }
    }
}

impl Log for MainLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.write_logger.enabled(metadata) || metadata.level() <= self.echo_level
    }

    fn log(&self, record: &log::Record) {
        // the rolling file keeps everything at `Info` and above
        self.write_logger.log(record);

        if record.level() <= self.echo_level {
            eprintln!(
                "{}:{} -- {}",
                record.level(),
                record.target(),
                record.args()
            );
        }
    }

    fn flush(&self) {
        self.write_logger.flush();
    }
}

fn level_filter(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Logs to `<log_dir>/main.log` (rotated, 3 files of 1000 lines) and echoes
/// to stderr.
pub fn init(log_dir: &Path, verbose: bool) -> Result<()> {
    let path = log_dir.join("main.log");
    let log = FileRotate::new(
        path,
        AppendTimestamp::default(FileLimit::MaxFiles(3)),
        ContentLimit::Lines(1000),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    let config = ConfigBuilder::new().set_time_format_rfc3339().build();
    let write_logger = WriteLogger::new(LevelFilter::Info, config, log);
    let echo_level = level_filter(verbose);
    let main_logger = MainLogger::new(write_logger, echo_level);
    log::set_boxed_logger(Box::new(main_logger))?;
    log::set_max_level(echo_level.max(LevelFilter::Info));
    Ok(())
}

pub fn init_terminal(verbose: bool) -> Result<()> {
    TermLogger::init(
        level_filter(verbose),
        ConfigBuilder::new().set_time_format_rfc3339().build(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )?;
    Ok(())
}
