//! sgcloud-ctl: inspect and scale SGCloud node groups from the command line.
//!
//! Usage:
//!   sgcloud-ctl groups                       List configured node groups
//!   sgcloud-ctl size <group>                 Show live instance count
//!   sgcloud-ctl nodes <group>                List instance provider ids
//!   sgcloud-ctl increase <group> <delta>     Add instances
//!   sgcloud-ctl delete <instance-id>...      Remove instances (same group)
//!   sgcloud-ctl elastic <elastic-group-id>   Describe an elastic group

use anyhow::{bail, Context};
use sgcloud_autoscaler::client::ElasticGroupClient;
use sgcloud_autoscaler::cloud::{CloudConfig, SgcloudProvider};

struct Options {
    config: Option<String>,
    node_groups: Vec<String>,
    command: Vec<String>,
}

fn parse_args(args: &[String]) -> anyhow::Result<Options> {
    let mut opts = Options {
        config: std::env::var("SGCLOUD_CLOUD_CONFIG").ok(),
        node_groups: Vec::new(),
        command: Vec::new(),
    };
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                opts.config = Some(iter.next().context("--config needs a path")?.clone());
            }
            "--nodes" => {
                opts.node_groups
                    .push(iter.next().context("--nodes needs <min>:<max>:<name>")?.clone());
            }
            _ => opts.command.push(arg.clone()),
        }
    }
    Ok(opts)
}

fn print_usage() {
    println!(
        r#"sgcloud-ctl: SGCloud node group tool

USAGE:
    sgcloud-ctl [--config <path>] [--nodes <min:max:name>]... <COMMAND>

COMMANDS:
    groups                      List configured node groups
    size <group>                Show live instance count of a group
    nodes <group>               List instance provider ids of a group
    increase <group> <delta>    Add instances to a group
    delete <instance-id>...     Remove instances (all from one group)
    elastic <group-id>          Describe an elastic group
    help                        Show this help message

ENVIRONMENT:
    SGCLOUD_CLOUD_CONFIG        Cloud config path (overridden by --config)
    RUST_LOG                    Log filter, e.g. sgcloud_autoscaler=debug"#
    );
}

fn load_config(opts: &Options) -> anyhow::Result<CloudConfig> {
    let config = match &opts.config {
        Some(path) => CloudConfig::from_path(path)?,
        None => CloudConfig::from_reader(None::<std::fs::File>)?,
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let opts = parse_args(&args)?;
    let Some(command) = opts.command.first() else {
        print_usage();
        std::process::exit(1);
    };
    let rest = &opts.command[1..];

    match command.as_str() {
        "help" | "--help" | "-h" => {
            print_usage();
            return Ok(());
        }
        "elastic" => {
            let id = rest.first().context("elastic needs a group id")?;
            let config = load_config(&opts)?;
            let client = ElasticGroupClient::new(config.elastic_client_config())?;
            let group = client.describe_elastic_group(id).await?;
            println!(
                "{} name={} cluster={} res_type={} items={}",
                group.elastic_group_id,
                group.name,
                group.ccid,
                group.res_type,
                group.elastic_instances.len()
            );
            return Ok(());
        }
        _ => {}
    }

    let config = load_config(&opts)?;
    let provider = SgcloudProvider::build(config, &opts.node_groups)?;

    match command.as_str() {
        "groups" => {
            for group in provider.node_groups() {
                println!("{}", group.debug_string());
            }
        }
        "size" => {
            let group = rest.first().context("size needs a group id")?;
            println!("{}", provider.current_size(group).await?);
        }
        "nodes" => {
            let group = rest.first().context("nodes needs a group id")?;
            for id in provider.list_instances(group).await? {
                println!("{}", id);
            }
        }
        "increase" => {
            let (group, delta) = match rest {
                [group, delta] => (group, delta),
                _ => bail!("increase needs <group> <delta>"),
            };
            let delta: i64 = delta.parse().context("delta must be an integer")?;
            provider.increase(group, delta).await?;
            println!("requested {} more instance(s) for {}", delta, group);
        }
        "delete" => {
            if rest.is_empty() {
                bail!("delete needs at least one instance id");
            }
            provider.controller().delete(rest).await?;
            println!("removed {} instance(s)", rest.len());
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    }
    Ok(())
}
