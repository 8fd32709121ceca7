use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use innledger::{
    DatasetKind, IntegrityMonitor, Ledger, LedgerError, Tenant, Vault, VaultConfig, check_all,
    read_entries, repair_all,
};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_TAIL: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    data_dir: Option<PathBuf>,
    config_path: Option<PathBuf>,
    show_help: bool,
    command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Init,
    Check,
    Repair,
    ArchiveCreate,
    ArchiveList,
    ArchiveRestore { name: String },
    Show { dataset: String, tenant: String },
    Log { count: usize },
    Monitor,
}

fn main() {
    init_tracing();
    let mut stdout = io::stdout();
    let mut stderr = io::stderr();

    let exit_code = run(std::env::args_os(), &mut stdout, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}

fn run<I, W, E>(args: I, out: &mut W, err: &mut E) -> i32
where
    I: IntoIterator<Item = OsString>,
    W: Write,
    E: Write,
{
    let options = match parse_args(args) {
        Ok(options) => options,
        Err(message) => {
            let _ = writeln!(err, "error: {message}");
            let _ = write_usage(err);
            return 2;
        }
    };

    if options.show_help {
        return if write_usage(out).is_ok() { 0 } else { 1 };
    }

    let Some(command) = options.command.as_ref() else {
        let _ = writeln!(err, "error: missing command");
        let _ = write_usage(err);
        return 2;
    };

    let config = match load_config(&options) {
        Ok(config) => config,
        Err(message) => {
            let _ = writeln!(err, "error: {message}");
            return 1;
        }
    };

    match dispatch(command, config, out) {
        Ok(code) => code,
        Err(error) => {
            let _ = writeln!(err, "error: {error}");
            1
        }
    }
}

fn parse_args<I>(args: I) -> Result<CliOptions, String>
where
    I: IntoIterator<Item = OsString>,
{
    let mut iter = args.into_iter();
    let _argv0 = iter.next();

    let mut data_dir: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;
    let mut show_help = false;
    let mut positionals: Vec<String> = Vec::new();

    while let Some(argument) = iter.next() {
        let arg = argument.to_string_lossy();
        let arg_str = arg.as_ref();

        match arg_str {
            "-h" | "--help" => {
                show_help = true;
            }
            "--data-dir" => {
                let next = iter
                    .next()
                    .ok_or_else(|| String::from("missing directory for `--data-dir`"))?;
                data_dir = Some(PathBuf::from(next));
            }
            "--config" => {
                let next = iter
                    .next()
                    .ok_or_else(|| String::from("missing file for `--config`"))?;
                config_path = Some(PathBuf::from(next));
            }
            _ => {
                if let Some(value) = arg_str.strip_prefix("--data-dir=") {
                    data_dir = Some(PathBuf::from(value));
                    continue;
                }

                if let Some(value) = arg_str.strip_prefix("--config=") {
                    config_path = Some(PathBuf::from(value));
                    continue;
                }

                if arg_str.starts_with('-') {
                    return Err(format!("unknown option `{arg_str}`"));
                }

                positionals.push(arg_str.to_owned());
            }
        }
    }

    let command = if positionals.is_empty() {
        None
    } else {
        Some(parse_command(&positionals)?)
    };

    Ok(CliOptions {
        data_dir,
        config_path,
        show_help,
        command,
    })
}

fn parse_command(words: &[String]) -> Result<Command, String> {
    let expect_len = |n: usize, usage: &str| -> Result<(), String> {
        if words.len() == n {
            Ok(())
        } else {
            Err(format!("usage: innledger {usage}"))
        }
    };

    match words[0].as_str() {
        "init" => {
            expect_len(1, "init")?;
            Ok(Command::Init)
        }
        "check" => {
            expect_len(1, "check")?;
            Ok(Command::Check)
        }
        "repair" => {
            expect_len(1, "repair")?;
            Ok(Command::Repair)
        }
        "archive" => match words.get(1).map(String::as_str) {
            Some("create") => {
                expect_len(2, "archive create")?;
                Ok(Command::ArchiveCreate)
            }
            Some("list") => {
                expect_len(2, "archive list")?;
                Ok(Command::ArchiveList)
            }
            Some("restore") => {
                expect_len(3, "archive restore <name>")?;
                Ok(Command::ArchiveRestore {
                    name: words[2].clone(),
                })
            }
            _ => Err(String::from(
                "usage: innledger archive <create|list|restore <name>>",
            )),
        },
        "show" => {
            expect_len(3, "show <dataset> <tenant>")?;
            Ok(Command::Show {
                dataset: words[1].clone(),
                tenant: words[2].clone(),
            })
        }
        "log" => match words.len() {
            1 => Ok(Command::Log {
                count: DEFAULT_LOG_TAIL,
            }),
            2 => {
                let count = words[1]
                    .parse::<usize>()
                    .map_err(|_| format!("`{}` is not an entry count", words[1]))?;
                Ok(Command::Log { count })
            }
            _ => Err(String::from("usage: innledger log [n]")),
        },
        "monitor" => {
            expect_len(1, "monitor")?;
            Ok(Command::Monitor)
        }
        other => Err(format!("unknown command `{other}`")),
    }
}

fn load_config(options: &CliOptions) -> Result<VaultConfig, String> {
    let mut config = match &options.config_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|error| format!("cannot read {}: {error}", path.display()))?;
            toml::from_str(&text)
                .map_err(|error| format!("cannot parse {}: {error}", path.display()))?
        }
        None => VaultConfig::default(),
    };

    if let Some(dir) = &options.data_dir {
        config.data_dir.clone_from(dir);
    }

    Ok(config)
}

fn dispatch<W>(command: &Command, config: VaultConfig, out: &mut W) -> innledger::Result<i32>
where
    W: Write,
{
    match command {
        Command::Init => cmd_init(config, out),
        Command::Check => cmd_check(config, out),
        Command::Repair => cmd_repair(config, out),
        Command::ArchiveCreate => cmd_archive_create(config, out),
        Command::ArchiveList => cmd_archive_list(config, out),
        Command::ArchiveRestore { name } => cmd_archive_restore(config, name, out),
        Command::Show { dataset, tenant } => cmd_show(config, dataset, tenant, out),
        Command::Log { count } => cmd_log(config, *count, out),
        Command::Monitor => cmd_monitor(config, out),
    }
}

fn cmd_init<W: Write>(config: VaultConfig, out: &mut W) -> innledger::Result<i32> {
    let ledger = Ledger::open(config)?;
    let summary = ledger.bootstrap()?;
    let _ = writeln!(
        out,
        "seeded {} dataset(s), repaired {}, unrecoverable {}",
        summary.seeded, summary.repaired, summary.unrecoverable,
    );
    Ok(if summary.unrecoverable == 0 { 0 } else { 1 })
}

fn cmd_check<W: Write>(config: VaultConfig, out: &mut W) -> innledger::Result<i32> {
    let vault = Vault::open(config)?;
    let issues = check_all(&vault);
    if issues.is_empty() {
        let _ = writeln!(out, "all datasets clean");
        return Ok(0);
    }
    for issue in &issues {
        let _ = writeln!(out, "{issue}");
    }
    let _ = writeln!(out, "{} issue(s) found", issues.len());
    Ok(1)
}

fn cmd_repair<W: Write>(config: VaultConfig, out: &mut W) -> innledger::Result<i32> {
    let vault = Vault::open(config)?;
    let report = repair_all(&vault);
    if report.actions.is_empty() {
        let _ = writeln!(out, "nothing to repair");
        return Ok(0);
    }
    for action in &report.actions {
        let _ = writeln!(out, "{action}");
    }
    Ok(if report.success() { 0 } else { 1 })
}

fn cmd_archive_create<W: Write>(config: VaultConfig, out: &mut W) -> innledger::Result<i32> {
    let vault = Vault::open(config)?;
    let name = vault.create_archive()?;
    let _ = writeln!(out, "created {name}");
    Ok(0)
}

fn cmd_archive_list<W: Write>(config: VaultConfig, out: &mut W) -> innledger::Result<i32> {
    let vault = Vault::open(config)?;
    let archives = vault.list_archives()?;
    if archives.is_empty() {
        let _ = writeln!(out, "no archives");
        return Ok(0);
    }
    for entry in &archives {
        let _ = writeln!(out, "{}  {}", entry.name, entry.created);
    }
    Ok(0)
}

fn cmd_archive_restore<W: Write>(
    config: VaultConfig,
    name: &str,
    out: &mut W,
) -> innledger::Result<i32> {
    let vault = Vault::open(config)?;
    vault.restore_archive(name)?;
    let _ = writeln!(out, "restored {name}");
    Ok(0)
}

fn cmd_show<W: Write>(
    config: VaultConfig,
    dataset: &str,
    tenant: &str,
    out: &mut W,
) -> innledger::Result<i32> {
    let kind = DatasetKind::from_name(dataset)?;
    let tenant = Tenant::new(tenant)?;
    let ledger = Ledger::open(config)?;
    let data = ledger.load(kind, &tenant);
    let text = serde_json::to_string_pretty(&data).map_err(LedgerError::encode)?;
    let _ = writeln!(out, "{text}");
    Ok(0)
}

fn cmd_log<W: Write>(config: VaultConfig, count: usize, out: &mut W) -> innledger::Result<i32> {
    let vault = Vault::open(config)?;
    let entries = read_entries(vault.layout())?;
    if entries.is_empty() {
        let _ = writeln!(out, "access log is empty");
        return Ok(0);
    }
    let start = entries.len().saturating_sub(count);
    for entry in &entries[start..] {
        let _ = writeln!(
            out,
            "{}  {}  {}/{}",
            entry.timestamp, entry.operation, entry.tenant, entry.dataset,
        );
    }
    Ok(0)
}

fn cmd_monitor<W: Write>(config: VaultConfig, out: &mut W) -> innledger::Result<i32> {
    let interval = config.monitor_interval();
    let vault = Arc::new(Vault::open(config)?);
    let monitor = IntegrityMonitor::new(vault);
    monitor.start();
    let _ = writeln!(
        out,
        "checking every {}s; Ctrl-C exits",
        interval.as_secs(),
    );
    loop {
        // The monitor thread does the work; this thread only keeps the
        // process (and the monitor guard) alive until the user kills it.
        std::thread::park();
    }
}

fn write_usage<W: Write>(out: &mut W) -> io::Result<()> {
    writeln!(
        out,
        "Usage: innledger [--data-dir DIR] [--config FILE] <command>\n\
         \n\
         Commands:\n\
         \n\
         init                      Seed missing datasets, then repair broken ones\n\
         check                     Report dataset integrity issues\n\
         repair                    Restore broken datasets from redundant copies\n\
         archive create            Snapshot the whole data directory\n\
         archive list              List snapshots, newest first\n\
         archive restore <name>    Overlay a snapshot onto the live store\n\
         show <dataset> <tenant>   Print a dataset as JSON\n\
         log [n]                   Tail the access log (default {DEFAULT_LOG_TAIL} entries)\n\
         monitor                   Run the integrity check loop in the foreground\n",
    )
}
