use std::process;

fn main() {
    if let Err(err) = snemo_trigger::app::run() {
        eprintln!("fatal: {err:#}");
        process::exit(1);
    }
}
