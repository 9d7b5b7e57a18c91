use shardscan_core::{
    error, info,
    signals::{Shutdown, bind_signals},
    warn,
};
use shardscand_lib::{
    args::parse_args,
    daemon::{Runtime, run_scanner, validate_args},
};
use std::process::exit;

pub fn main() {
    let args = parse_args();
    if let Err(err) = validate_args(&args) {
        println!("{err}");
        exit(1);
    }

    let shutdown = Shutdown::new();
    let _runtime = match Runtime::from_args(&args, &shutdown) {
        Ok(runtime) => runtime,
        Err(err) => {
            println!("{err}");
            exit(1);
        }
    };

    if let Err(err) = bind_signals(&shutdown) {
        warn!("Unable to install the signal handler: {err}");
    }

    let rt = match tokio::runtime::Builder::new_multi_thread().worker_threads(args.async_threads).enable_all().build() {
        Ok(rt) => rt,
        Err(err) => {
            error!("Failed building the async runtime: {err}");
            exit(1);
        }
    };

    match rt.block_on(run_scanner(&args, shutdown)) {
        Ok(report) => {
            info!("Scanned {} master blocks, {} shard blocks, {} records", report.master_blocks, report.shard_blocks, report.records)
        }
        Err(err) => {
            error!("Scan aborted: {err}");
            exit(1);
        }
    }
    info!("Shardscand has stopped...");
}
