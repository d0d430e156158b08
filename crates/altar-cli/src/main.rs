use altar_core::AltarConfig;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

mod commands;

fn build_cli() -> Command {
    Command::new("altar")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Create Día de Muertos altars from a photo and a food description")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Path to a TOML configuration file"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Increase log verbosity (-v debug, -vv trace)"),
        )
        .subcommand(
            Command::new("create")
                .about("Upload a photo, generate the altar and save it")
                .arg(
                    Arg::new("photo")
                        .long("photo")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JPEG, PNG or WEBP photo of the food"),
                )
                .arg(
                    Arg::new("description")
                        .long("description")
                        .required(true)
                        .help("Description of the food (10 to 500 characters)"),
                ),
        )
        .subcommand(
            Command::new("list").about("List saved altars, newest first").arg(
                Arg::new("json")
                    .long("json")
                    .action(ArgAction::SetTrue)
                    .help("Output as JSON"),
            ),
        )
        .subcommand(
            Command::new("show")
                .about("Show one saved altar")
                .arg(Arg::new("id").required(true).help("Altar id")),
        )
        .subcommand(
            Command::new("delete")
                .about("Delete a saved altar")
                .arg(Arg::new("id").required(true).help("Altar id")),
        )
        .subcommand(Command::new("clear").about("Delete every saved altar"))
        .subcommand(
            Command::new("validate")
                .about("Check that a photo can be used to create an altar")
                .arg(
                    Arg::new("photo")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Photo to check"),
                ),
        )
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("tracing subscriber already set; skipping re-initialization");
    }
}

async fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let config_path = matches.get_one::<PathBuf>("config");
    let config = AltarConfig::load(config_path.map(PathBuf::as_path))?;
    tracing::debug!(base_url = %config.api.base_url, dir = %config.storage.dir.display(), "configuration loaded");

    match matches.subcommand() {
        Some(("create", args)) => {
            let photo = args
                .get_one::<PathBuf>("photo")
                .ok_or_else(|| anyhow::anyhow!("--photo is required"))?;
            let description = args
                .get_one::<String>("description")
                .ok_or_else(|| anyhow::anyhow!("--description is required"))?;
            commands::create(&config, photo, description).await
        }
        Some(("list", args)) => commands::list(&config, args.get_flag("json")),
        Some(("show", args)) => commands::show(&config, required_id(args)?),
        Some(("delete", args)) => commands::delete(&config, required_id(args)?),
        Some(("clear", _)) => commands::clear(&config),
        Some(("validate", args)) => {
            let photo = args
                .get_one::<PathBuf>("photo")
                .ok_or_else(|| anyhow::anyhow!("a photo path is required"))?;
            commands::validate(photo)
        }
        _ => Ok(()),
    }
}

fn required_id(args: &ArgMatches) -> anyhow::Result<&str> {
    args.get_one::<String>("id")
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("an altar id is required"))
}

#[tokio::main]
async fn main() {
    let matches = build_cli().get_matches();
    init_tracing(matches.get_count("verbose"));

    if let Err(err) = run(&matches).await {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}
