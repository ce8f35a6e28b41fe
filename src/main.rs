use clap::{Arg, ArgMatches, Command};
use product_queue::{Config, QueueDrainer, QueueError, QueueResult, RedisStore};
use std::time::Duration;

fn cli() -> Command {
    let name_arg = Arg::new("name")
        .help("Base queue name (`:product_info` is appended); defaults to QUEUE_BASE_NAME");

    Command::new("product-queue")
        .about("Drain and publish product info records on a Redis list")
        .arg(
            Arg::new("host")
                .long("host")
                .global(true)
                .help("Redis host, overrides REDIS_HOST"),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .global(true)
                .value_parser(clap::value_parser!(u16))
                .help("Redis port, overrides REDIS_PORT"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("drain")
                .about("Pop and print every record until the queue is empty")
                .arg(name_arg.clone()),
        )
        .subcommand(
            Command::new("publish")
                .about("Push a JSON record onto the queue")
                .arg(Arg::new("name").required(true))
                .arg(Arg::new("json").required(true).help("Record as a JSON document")),
        )
        .subcommand(
            Command::new("len")
                .about("Print the queue length")
                .arg(name_arg.clone()),
        )
        .subcommand(
            Command::new("wait")
                .about("Block until one record arrives or the timeout expires")
                .arg(name_arg)
                .arg(
                    Arg::new("timeout")
                        .long("timeout")
                        .value_parser(clap::value_parser!(u64))
                        .help("Seconds to wait, overrides QUEUE_WAIT_TIMEOUT"),
                ),
        )
}

fn queue_name(matches: &ArgMatches, config: &Config) -> QueueResult<String> {
    matches
        .get_one::<String>("name")
        .cloned()
        .or_else(|| config.queue_base_name.clone())
        .ok_or_else(|| QueueError::invalid_argument("no queue name given and QUEUE_BASE_NAME unset"))
}

async fn run(matches: ArgMatches, config: Config) -> QueueResult<()> {
    let mut redis = config.redis();
    if let Some(host) = matches.get_one::<String>("host") {
        redis.host = host.clone();
    }
    if let Some(port) = matches.get_one::<u16>("port") {
        redis.port = *port;
    }

    let mut drainer: QueueDrainer<RedisStore> = QueueDrainer::connect_with(&redis).await?;

    let result = match matches.subcommand() {
        Some(("drain", sub)) => {
            let name = queue_name(sub, &config)?;
            let mut drain = drainer.drain(&name)?;
            while let Some(item) = drain.next().await? {
                println!("{}", item);
            }
            tracing::info!(queue = %drain.key(), count = drain.yielded(), "Queue drained");
            Ok(())
        }
        Some(("publish", sub)) => {
            let name = queue_name(sub, &config)?;
            let raw = sub.get_one::<String>("json").map(String::as_str).unwrap_or_default();
            let value: serde_json::Value = serde_json::from_str(raw)?;
            let len = drainer.publish(&value, &name).await?;
            tracing::info!(queue = %name, len = len, "Record published");
            Ok(())
        }
        Some(("len", sub)) => {
            let name = queue_name(sub, &config)?;
            println!("{}", drainer.len(&name).await?);
            Ok(())
        }
        Some(("wait", sub)) => {
            let name = queue_name(sub, &config)?;
            let timeout = sub
                .get_one::<u64>("timeout")
                .map(|secs| Duration::from_secs(*secs))
                .unwrap_or_else(|| config.wait_timeout());
            match drainer.pop_wait(&name, timeout).await? {
                Some(item) => println!("{}", item),
                None => tracing::info!(queue = %name, "No record before timeout"),
            }
            Ok(())
        }
        _ => Err(QueueError::invalid_argument("unknown command")),
    };

    drainer.close();
    result
}

#[tokio::main]
async fn main() {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };
    product_queue::init_tracing(&config);

    if let Err(e) = run(cli().get_matches(), config).await {
        tracing::error!(error = %e, "Command failed");
        std::process::exit(1);
    }
}
