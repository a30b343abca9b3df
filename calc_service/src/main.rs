use calc_service::{handler, run_console, Config, Logger, Server};
use std::env;
use std::error::Error;
use std::io;
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type BoxError = Box<dyn Error + Send + Sync>;

fn serve(config: &Config, logger: Logger) -> Result<(), BoxError> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    let shutdown_logger = logger.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
        shutdown_logger.log("Shutdown signal received. Shutting down...");
    })?;

    let server = Server::bind(config.addr(), logger.with_prefix("HTTP"))?;
    logger.log(&format!(
        "Starting server on {} ({})",
        server.local_addr()?,
        handler::CALCULATE_PATH
    ));
    logger.log("Press Ctrl+C to stop");

    server.run(&running);

    logger.log(&format!("Final statistics: {}", server.stats().summary()));
    logger.log("Server stopped gracefully.");
    Ok(())
}

fn console(logger: Logger) -> Result<(), BoxError> {
    let stdin = io::stdin();
    run_console(&mut stdin.lock(), &logger);
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let mode = args.get(1).map(String::as_str).unwrap_or("serve");

    let config = Config::from_env().unwrap_or_else(|err| {
        eprintln!("[APP] ✗ Configuration error: {}", err);
        process::exit(1);
    });

    let logger = Logger::from_config(&config, "APP").unwrap_or_else(|err| {
        eprintln!("[APP] ✗ Cannot open log file: {}", err);
        process::exit(1);
    });

    let result = match mode {
        "serve" => serve(&config, logger),
        "console" => console(logger),
        _ => {
            let program = args.first().map(String::as_str).unwrap_or("calc_service");
            eprintln!("Usage: {} [serve|console]", program);
            process::exit(2);
        }
    };

    if let Err(err) = result {
        eprintln!("[APP] ✗ {}", err);
        process::exit(1);
    }
}
