use std::process::ExitCode;

fn main() -> ExitCode {
    match twixt::cli::run() {
        Ok(code) => ExitCode::from(code as u8),
        Err(err) => {
            eprintln!("twixt: {err:#}");
            ExitCode::from(2)
        }
    }
}
