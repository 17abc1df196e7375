use std::process;

fn main() {
    if let Err(e) = scaff::cli::run() {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
