use std::io::{self, BufRead, Write};

use tracing::error;

use silt_engine::Engine;

/// Read newline-terminated commands from stdin until `exit` or EOF.
///
/// Commands: `get <k>`, `put <k> <v>`, `delete <k>`, `exit`. Engine errors
/// (missing key, duplicate put, I/O) are fatal to the current command only:
/// they are logged and the loop continues.
pub fn run(engine: &mut Engine) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = line?;
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["get", key] => match engine.get(key.as_bytes()) {
                Some(value) => writeln!(stdout, "{}", String::from_utf8_lossy(value))?,
                None => error!(key = %key, "key not found"),
            },
            ["put", key, value] => {
                if let Err(e) = engine.put(key.as_bytes(), value.as_bytes()) {
                    error!(key = %key, error = %e, "put failed");
                }
            }
            ["delete", key] => {
                if let Err(e) = engine.remove(key.as_bytes()) {
                    error!(key = %key, error = %e, "delete failed");
                }
            }
            ["exit"] => {
                writeln!(stdout, "bye ;)")?;
                break;
            }
            [] => {}
            _ => writeln!(stdout, "invalid command")?,
        }
    }
    Ok(())
}
