use std::env;
use std::process;
use std::thread;

use log::{error, info, LevelFilter};
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Root};
use log4rs::encode::pattern::PatternEncoder;

use tree_exerciser::{Config, Exerciser, MetricsExporter, TreeMetrics};

fn main() {
    init_logging();

    let config = match Config::from_args(env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("bad arguments: {}", e);
            eprintln!("usage: tree-exerciser [port] [pace_ms] [min] [max]");
            process::exit(2);
        }
    };
    info!("starting tree exerciser: {:?}", config);

    let metrics = match TreeMetrics::new() {
        Ok(metrics) => metrics,
        Err(e) => {
            error!("failed to register metrics: {}", e);
            process::exit(1);
        }
    };

    let mut exerciser = Exerciser::new(metrics.clone(), &config);
    thread::Builder::new()
        .name("exerciser".to_string())
        .spawn(move || exerciser.run())
        .unwrap_or_else(|e| {
            error!("failed to spawn the exerciser thread: {}", e);
            process::exit(1);
        });

    // Exposition failure is not fatal to the exerciser: log it and keep the
    // driver thread running.
    match MetricsExporter::bind(metrics, config.port) {
        Ok(exporter) => exporter.serve(),
        Err(e) => {
            error!("metrics exporter was unable to start: {}", e);
            loop {
                thread::park();
            }
        }
    }
}

fn init_logging() {
    if log4rs::init_file("config/log4rs.yaml", Default::default()).is_ok() {
        return;
    }
    // No config tree next to the binary; fall back to a console appender.
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(
            "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}",
        )))
        .build();
    let fallback = log4rs::config::Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(LevelFilter::Info));
    match fallback {
        Ok(config) => {
            let _ = log4rs::init_config(config);
        }
        Err(e) => eprintln!("failed to configure logging: {}", e),
    }
}
