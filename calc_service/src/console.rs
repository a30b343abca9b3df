use std::io::BufRead;

use crate::handler::format_result;
use crate::logger::Logger;

pub const EXIT_COMMAND: &str = "exit";

/// Reads one expression per line and logs its value or error. Stops on
/// `exit`, end of input, or an I/O failure; a line that is not UTF-8 is
/// evaluated like any other and fails as an invalid expression. Returns how
/// many expressions were evaluated.
pub fn run_console<R: BufRead>(input: &mut R, logger: &Logger) -> usize {
    let mut evaluated = 0;
    let mut line = Vec::new();

    loop {
        logger.log("Input expression:");
        line.clear();
        match input.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                logger.log(&format!("Failed to read expression from console: {}", e));
                break;
            }
        }

        let decoded = String::from_utf8_lossy(&line);
        let text = decoded.trim();
        if text == EXIT_COMMAND {
            break;
        }

        match calculator::evaluate(text) {
            Ok(value) => logger.log(&format!("{} = {}", text, format_result(value))),
            Err(e) => logger.log(&format!("{} calculation failed with error: {}", text, e)),
        }
        evaluated += 1;
    }

    logger.log("Application was successfully closed");
    evaluated
}
