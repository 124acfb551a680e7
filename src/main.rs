use clap::Parser;
use futures::future;
use std::process;
use std::time::Duration;
use tokio::task;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info};
use upcheck::conf::{self, Conf};
use upcheck::{HostTarget, LivenessChecker, ProbeMethod, ProbeResult};

const LOG_LEVEL: tracing::Level = tracing::Level::WARN;

const DEFAULT_TIMEOUT_MS: u64 = 1000;
const DEFAULT_INTERVAL_MS: u64 = 1000;

/// Simple program that tells you whether hosts are up.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Hosts to probe, hostname or IP literal
    hosts: Vec<String>,

    /// Read hosts and probe settings from a toml file
    #[clap(short, long)]
    conf: Option<String>,

    /// Per-probe timeout in milliseconds
    #[clap(long)]
    timeout_ms: Option<u64>,

    /// Probe with a tcp connect to this port instead of icmp echo
    #[clap(long, value_name = "PORT")]
    tcp: Option<u16>,

    /// Rounds to run, 0 means run until interrupted
    #[clap(long)]
    count: Option<u32>,

    /// Pause between rounds in milliseconds
    #[clap(long)]
    interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_max_level(LOG_LEVEL).init();

    let args = Args::parse();
    let conf = match &args.conf {
        Some(path) => match conf::read_conf(path).await {
            Ok(c) => c,
            Err(e) => {
                error!("Read conf {} fail, {}", path, e);
                process::exit(exitcode::CONFIG);
            }
        },
        None => Conf::default(),
    };

    let hosts = if args.hosts.is_empty() {
        conf.hosts.iter().map(|h| h.address.clone()).collect()
    } else {
        args.hosts.clone()
    };
    if hosts.is_empty() {
        error!("No hosts to probe, pass them as arguments or via --conf");
        process::exit(exitcode::USAGE);
    }

    let timeout = Duration::from_millis(
        args.timeout_ms
            .or(conf.probe.timeout_ms)
            .unwrap_or(DEFAULT_TIMEOUT_MS),
    );
    let interval = Duration::from_millis(
        args.interval_ms
            .or(conf.probe.interval_ms)
            .unwrap_or(DEFAULT_INTERVAL_MS),
    );
    let count = args.count.or(conf.probe.count).unwrap_or(1);
    let checker = match args.tcp.or(conf.probe.tcp_port) {
        Some(port) => LivenessChecker::tcp(port),
        None => LivenessChecker::icmp(),
    };

    // tokio interval panics on a zero period
    let interval = interval.max(Duration::from_millis(1));
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut round = 0_u32;
    loop {
        ticker.tick().await;
        round += 1;
        info!("Round {} probe {} hosts", round, hosts.len());

        let mut handles = Vec::with_capacity(hosts.len());
        for host in &hosts {
            let target = HostTarget::new(host.clone());
            handles.push(task::spawn(async move {
                let report = checker.run(target, timeout).await;
                match &report.result {
                    ProbeResult::Reachable { rtt } => {
                        debug!("{} replied in {:?} at {}", report.target, rtt, report.send_at);
                        println!("{} is UP", report.target);
                    }
                    ProbeResult::Unreachable => println!("{} is DOWN", report.target),
                    ProbeResult::Error(reason) => {
                        eprintln!("{} check failed: {}", report.target, reason)
                    }
                }
            }));
        }
        future::join_all(handles).await;

        if count != 0 && round >= count {
            break;
        }
    }

    process::exit(exitcode::OK);
}
